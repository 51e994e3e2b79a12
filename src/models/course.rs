use serde::{Deserialize, Serialize};

/// A curricular component, as referenced from sections
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedCourse {
    pub code: String,
    pub name: String,
    pub mode: String,
    pub id_ref: String,
}

/// A component looked up by reference id, with its requisites
///
/// Requisites are in disjunctive normal form: the outer list is "any of",
/// each inner list is "all of".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedCourse {
    pub code: String,
    pub name: String,
    pub mode: String,
    pub id_ref: String,
    pub location: String,
    pub department: String,
    pub prerequisites: Vec<Vec<String>>,
    pub corequisites: Vec<Vec<String>>,
    pub equivalences: Vec<Vec<String>>,
}

/// A component as it appears inside a program curriculum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchoredCourse {
    pub code: String,
    pub name: String,
    pub mode: String,
    pub id_ref: String,
    pub program_code: String,
    /// Curriculum level (semester) label
    pub level: String,
    /// Mandatory or elective category
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<&AnchoredCourse> for DetailedCourse {
    /// Drops the curriculum placement
    fn from(course: &AnchoredCourse) -> Self {
        Self {
            code: course.code.clone(),
            name: course.name.clone(),
            mode: course.mode.clone(),
            id_ref: course.id_ref.clone(),
        }
    }
}
