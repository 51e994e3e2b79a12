use crate::models::Activity;
use crate::portal::ActivityProfile;
use crate::query::{Fragment, Page};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Parses `dd/mm/yy[yy] [hh:mm]`
///
/// Two-digit years are in the 2000s and a missing time is midnight.
/// Anything else yields `None`.
pub fn parse_activity_date(text: &str) -> Option<NaiveDateTime> {
    let mut parts = text.split_whitespace();
    let dmy = parts.next()?;
    let hm = parts.next().unwrap_or("00:00");

    let mut fields = dmy.split('/');
    let day: u32 = fields.next()?.parse().ok()?;
    let month: u32 = fields.next()?.parse().ok()?;
    let year_text = fields.next()?;
    if fields.next().is_some() {
        return None;
    }
    let year: i32 = match year_text.len() {
        2 => 2000 + year_text.parse::<i32>().ok()?,
        4 => year_text.parse().ok()?,
        _ => return None,
    };

    let (hour, minute) = hm.split_once(':')?;
    let time = NaiveTime::from_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    Some(NaiveDateTime::new(date, time))
}

/// Reads the upcoming activities table of the portal home
///
/// Rows with fewer than three cells are layout rows and are skipped.
pub fn read_activities(page: &Page, profile: &ActivityProfile) -> Vec<Activity> {
    let Some(container) = page.query(profile.container).first() else {
        return Vec::new();
    };

    container
        .query(profile.rows)
        .iter()
        .filter_map(|row| read_activity_row(row, profile))
        .collect()
}

fn read_activity_row(row: Fragment<'_>, profile: &ActivityProfile) -> Option<Activity> {
    let cells = row.query("td");
    if cells.count() < 3 {
        return None;
    }

    let date = cells.at(1).and_then(|cell| parse_activity_date(&cell.text()));

    let done = cells
        .at(0)
        .and_then(|cell| cell.query("img").first())
        .and_then(|img| img.attribute("src"))
        .is_some_and(|src| src.contains(profile.done_icon));

    let lines = cells
        .at(2)
        .and_then(|cell| cell.query("small").first())
        .map(|small| small.text_lines())
        .unwrap_or_default();

    let (course_title, kind, title) = if lines.len() >= 2 {
        let (kind, title) = match lines[1].split_once(": ") {
            Some((kind, title)) => (kind.trim().to_string(), title.trim().to_string()),
            None => (profile.default_type.to_string(), lines[1].clone()),
        };
        (lines[0].clone(), kind, title)
    } else {
        (
            profile.default_course.to_string(),
            profile.default_type.to_string(),
            profile.default_title.to_string(),
        )
    };

    Some(Activity {
        course_title,
        kind,
        title,
        date,
        done,
    })
}
