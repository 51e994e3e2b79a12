//! Program listing rows and curriculum pages

use crate::extract::text::{cell_text, component_ref_id};
use crate::models::{AnchoredCourse, DetailedProgram, Program};
use crate::portal::ProgramProfile;
use crate::query::{Fragment, Page};
use url::Url;

/// Owned fields of one program row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramRow {
    pub program: Program,
    /// Link to the program portal, as written in the row
    pub href: Option<String>,
}

/// Curriculum header and components
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramDetail {
    pub code: String,
    pub title: String,
    pub courses: Vec<AnchoredCourse>,
}

/// Reads a listing row; rows without a title are layout rows
pub fn read_program_row(row: Fragment<'_>, profile: &ProgramProfile) -> Option<ProgramRow> {
    let cells = row.query("td");
    let title = cell_text(&cells, 0);
    if title.is_empty() {
        return None;
    }

    let href = row
        .query(profile.detail_link)
        .first()
        .and_then(|a| a.attribute("href"))
        .map(str::to_string);

    Some(ProgramRow {
        program: Program {
            title,
            location: cell_text(&cells, 1),
            program_type: cell_text(&cells, 2),
            mode: cell_text(&cells, 3),
            time_code: cell_text(&cells, 4),
        },
        href,
    })
}

/// Program reference id: the `id` query parameter of its portal URL
pub fn program_ref_id(url: &Url) -> String {
    url.query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

/// Reads the curriculum page of a program
///
/// Every tab of the curriculum panel is one level; its first `span` names
/// the level. Rows need at least code, name and mode cells; a missing type
/// cell means the component is mandatory.
pub fn read_curriculum(page: &Page, profile: &ProgramProfile) -> ProgramDetail {
    let code = page.first_text(profile.code).unwrap_or_default();
    let title = page.first_text(profile.title).unwrap_or_default();

    let mut courses = Vec::new();
    if let Some(panel) = page.query(profile.tab_panel).first() {
        for content in panel.query(profile.tab_contents).iter() {
            let level = content
                .query("span")
                .first()
                .map(|span| span.text())
                .unwrap_or_default();

            for row in content.query(profile.course_rows).iter() {
                let cells = row.query("td");
                if cells.count() < 3 {
                    continue;
                }

                let label = cells.at(0).and_then(|td| td.query("label").first());
                let id_ref = label
                    .and_then(|l| l.attribute("onclick"))
                    .and_then(component_ref_id)
                    .unwrap_or_default();
                let course_code = label
                    .map(|l| l.text())
                    .unwrap_or_else(|| cell_text(&cells, 0));

                let kind = match cells.at(3) {
                    Some(cell) => cell.text(),
                    None => profile.default_course_type.to_string(),
                };

                courses.push(AnchoredCourse {
                    code: course_code,
                    name: cell_text(&cells, 1),
                    mode: cell_text(&cells, 2),
                    id_ref,
                    program_code: code.clone(),
                    level: level.clone(),
                    kind,
                });
            }
        }
    }

    ProgramDetail {
        code,
        title,
        courses,
    }
}

/// Builds the program record; a program is only kept with its curriculum
pub fn assemble_program(row: ProgramRow, id_ref: String, detail: Option<ProgramDetail>) -> Option<DetailedProgram> {
    let detail = detail?;
    if detail.code.is_empty() {
        return None;
    }
    Some(DetailedProgram::from_parts(
        row.program,
        id_ref,
        detail.code,
        detail.courses,
    ))
}
