use serde::{Deserialize, Serialize};

/// Teacher card from a class participants page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTeacher {
    pub name: String,
    pub email: String,
    pub education: String,
    pub department: String,
    pub image_url: String,
}

/// Student card from a class participants page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveStudent {
    pub email: String,
    pub name: String,
    pub registration: String,
    pub course_label: String,
    pub image_url: String,
}

/// One hit of the public teacher search
///
/// A plain value: fetching the e-mail or the photo goes through the client,
/// keyed by `page_url` and `profile_picture_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherResult {
    pub name: String,
    pub department: String,
    pub page_url: String,
    pub profile_picture_url: Option<String>,
}

/// Option of the teacher search campus/department filter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Campus {
    pub name: String,
    pub value: String,
}
