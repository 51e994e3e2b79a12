use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The authenticated student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Institution key the account belongs to
    pub provider: String,
    pub registration: String,
    pub program: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub profile_picture_url: Option<String>,
    pub current_term: Option<String>,
}

/// An assignment, quiz or exam listed on the portal home
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub course_title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub date: Option<NaiveDateTime>,
    pub done: bool,
}
