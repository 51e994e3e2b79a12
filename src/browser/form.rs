//! Reading HTML forms out of a loaded document

use crate::query::{Fragment, Page};

/// JSF keeps server-side view state in this hidden field
pub const VIEW_STATE_FIELD: &str = "javax.faces.ViewState";

/// The successful controls of one form, ready to be re-submitted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    /// Raw `action` attribute, `None` when absent or empty
    pub action: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl FormFields {
    /// Reads the first form matching `selector`
    pub fn read(page: &Page, selector: &str) -> Option<Self> {
        page.query(selector).first().map(Self::from_form)
    }

    /// Collects the fields a browser would submit without clicking anything
    ///
    /// Buttons and image inputs are skipped; radios and checkboxes only count
    /// when checked; selects contribute their selected option, or the first
    /// one.
    pub fn from_form(form: Fragment<'_>) -> Self {
        let action = form
            .attribute("action")
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        let mut fields = Vec::new();

        for control in form.query("input, select, textarea").iter() {
            let Some(name) = control.attribute("name").filter(|n| !n.is_empty()) else {
                continue;
            };
            if control.attribute("disabled").is_some() {
                continue;
            }

            match control.tag() {
                "select" => {
                    let options = control.query("option");
                    let chosen = options
                        .iter()
                        .find(|o| o.attribute("selected").is_some())
                        .or_else(|| options.first());
                    if let Some(option) = chosen {
                        let value = option
                            .attribute("value")
                            .map(str::to_string)
                            .unwrap_or_else(|| option.text());
                        fields.push((name.to_string(), value));
                    }
                }
                "textarea" => fields.push((name.to_string(), control.text())),
                _ => {
                    let input_type = control
                        .attribute("type")
                        .unwrap_or("text")
                        .to_ascii_lowercase();

                    // Only sent when clicked
                    if matches!(input_type.as_str(), "submit" | "image" | "button" | "reset") {
                        continue;
                    }

                    if matches!(input_type.as_str(), "radio" | "checkbox")
                        && control.attribute("checked").is_none()
                    {
                        continue;
                    }

                    let value = control.attribute("value").unwrap_or_default();
                    fields.push((name.to_string(), value.to_string()));
                }
            }
        }

        if !fields.iter().any(|(n, _)| n == VIEW_STATE_FIELD) {
            tracing::debug!("Form has no {} field", VIEW_STATE_FIELD);
        }

        Self { action, fields }
    }

    /// Replaces a field value, appending the field when missing
    pub fn set(&mut self, name: &str, value: &str) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(field) => field.1 = value.to_string(),
            None => self.fields.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}
