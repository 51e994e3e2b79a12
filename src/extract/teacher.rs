//! Public teacher search

use crate::models::{Campus, TeacherResult};
use crate::portal::TeacherSearchProfile;
use crate::query::Page;
use url::Url;

/// Campus options of the search form, in page order
pub fn read_campuses(page: &Page, profile: &TeacherSearchProfile) -> Vec<Campus> {
    page.query(profile.campus_options)
        .iter()
        .map(|option| Campus {
            name: option.text(),
            value: option.attribute("value").unwrap_or_default().trim().to_string(),
        })
        .collect()
}

/// Search result rows
///
/// Profile links resolve against `page_url`, which is also used when a
/// row has no link. The placeholder photo counts as no photo.
pub fn read_teacher_results(page: &Page, profile: &TeacherSearchProfile, page_url: &Url) -> Vec<TeacherResult> {
    let resolve = |href: &str| page_url.join(href).map(|u| u.to_string()).ok();

    page.query(profile.result_rows)
        .iter()
        .map(|row| {
            let text_of = |selector: &str| row.query(selector).first().map(|f| f.text()).unwrap_or_default();

            let link = row
                .query(profile.result_page_link)
                .first()
                .and_then(|a| a.attribute("href"))
                .filter(|href| !href.is_empty())
                .and_then(resolve)
                .unwrap_or_else(|| page_url.to_string());

            let profile_picture_url = row
                .query("img")
                .first()
                .and_then(|img| img.attribute("src"))
                .filter(|src| !src.is_empty() && !src.contains(profile.no_picture_marker))
                .and_then(resolve);

            TeacherResult {
                name: text_of(profile.result_name),
                department: text_of(profile.result_department),
                page_url: link,
                profile_picture_url,
            }
        })
        .collect()
}

/// E-mail from a teacher's public page, `None` when not informed
pub fn read_teacher_email(page: &Page, profile: &TeacherSearchProfile) -> Option<String> {
    page.query(profile.contact_items).iter().find_map(|item| {
        let label = item.query("dt").first().map(|dt| dt.text()).unwrap_or_default();
        if label != profile.email_label {
            return None;
        }
        let value = item.query("dd").first().map(|dd| dd.text()).unwrap_or_default();
        if value.is_empty() || value == profile.email_missing {
            None
        } else {
            Some(value)
        }
    })
}
