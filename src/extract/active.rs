//! Sections the student is enrolled in, with their participants page

use crate::extract::cards::{read_student_cards, read_teacher_cards};
use crate::extract::text::{cell_text, extract_times, find_term, parse_seat_pair, parse_section_heading};
use crate::models::{ActiveSection, ActiveStudent, ActiveTeacher, Course};
use crate::portal::ActiveSectionProfile;
use crate::query::{Fragment, Page};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRow {
    pub course: Course,
    pub location: String,
    pub time_code: String,
    pub href: Option<String>,
    pub onclick: Option<String>,
}

/// Participants page of one class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveDetail {
    pub heading: String,
    pub number_classes: u32,
    pub total_classes: u32,
    pub teachers: Vec<ActiveTeacher>,
    pub students: Vec<ActiveStudent>,
}

/// Class rows have at least three cells and no spanning first cell
pub fn is_active_row(row: &Fragment<'_>) -> bool {
    let cells = row.query("td");
    cells.count() >= 3 && cells.at(0).is_some_and(|td| td.attribute("colspan").is_none())
}

pub fn read_active_row(row: Fragment<'_>, profile: &ActiveSectionProfile) -> ActiveRow {
    let cells = row.query("td");
    let (course, _) = parse_section_heading(&cell_text(&cells, 0));
    let link = row.query(profile.detail_link).first();

    ActiveRow {
        course,
        location: cell_text(&cells, 1),
        time_code: cell_text(&cells, 2),
        href: link.and_then(|a| a.attribute("href")).map(str::to_string),
        onclick: link.and_then(|a| a.attribute("onclick")).map(str::to_string),
    }
}

/// Reads the participants page; `page_url` resolves card photos
pub fn read_active_detail(page: &Page, profile: &ActiveSectionProfile, page_url: &Url) -> ActiveDetail {
    let (number_classes, total_classes) = page
        .first_text(profile.classes_counter)
        .map(|text| parse_seat_pair(&text))
        .unwrap_or((0, 0));

    ActiveDetail {
        heading: page.first_text(profile.detail_container).unwrap_or_default(),
        number_classes,
        total_classes,
        teachers: page
            .query(profile.teacher_cards)
            .first()
            .map(|table| read_teacher_cards(table, page_url))
            .unwrap_or_default(),
        students: page
            .query(profile.student_cards)
            .first()
            .map(|table| read_student_cards(table, page_url))
            .unwrap_or_default(),
    }
}

/// Merges the portal row with its participants page
///
/// The class heading supplies the term and class code; without it both are
/// empty and the roster lists stay empty.
pub fn assemble_active_section(row: ActiveRow, detail: Option<ActiveDetail>) -> ActiveSection {
    let detail = detail.unwrap_or_default();
    let (heading_course, class_code) = parse_section_heading(&detail.heading);
    let course = if row.course.code.is_empty() {
        heading_course
    } else {
        row.course
    };

    ActiveSection {
        time_codes: extract_times(&row.time_code),
        term: find_term(&detail.heading).unwrap_or_default(),
        course,
        location_table: row.location,
        class_code: class_code.unwrap_or_default(),
        teachers: detail.teachers,
        students: detail.students,
        total_classes: detail.total_classes,
        number_classes: detail.number_classes,
    }
}
