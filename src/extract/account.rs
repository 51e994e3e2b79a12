use crate::extract::text::{cell_text, find_term};
use crate::models::Account;
use crate::portal::HomeProfile;
use crate::query::Page;
use url::Url;

/// Reads the student account from the portal home
///
/// # Arguments
///
/// * `page` - Parsed portal home
/// * `home` - Home selectors for the institution
/// * `provider` - Institution key stored on the record
/// * `page_url` - URL the page was loaded from, for resolving the picture
///
/// # Returns
///
/// `None` when the registration number is missing; every other field is
/// optional and left empty when its element is absent.
pub fn read_account(page: &Page, home: &HomeProfile, provider: &str, page_url: &Url) -> Option<Account> {
    let registration = page.first_text(home.registration)?;

    let rows = page.query(home.info_table_rows);
    let row_value = |labels: &[&str]| -> Option<String> {
        rows.iter().find_map(|row| {
            let cells = row.query("td");
            let label = cell_text(&cells, 0).to_lowercase();
            if labels.iter().any(|l| label == *l) {
                Some(cell_text(&cells, 1)).filter(|v| !v.is_empty())
            } else {
                None
            }
        })
    };

    let email = row_value(&home.email_labels);
    let program = row_value(&["curso:", "curso"]);

    let current_term = page
        .first_text(home.current_term)
        .map(|text| find_term(&text).unwrap_or(text));

    let profile_picture_url = page
        .query(home.picture)
        .first()
        .and_then(|img| img.attribute("src"))
        .and_then(|src| page_url.join(src).ok())
        .map(|url| url.to_string());

    Some(Account {
        provider: provider.to_string(),
        registration,
        program,
        name: page.first_text(home.name),
        email,
        profile_picture_url,
        current_term,
    })
}
