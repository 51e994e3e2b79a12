use crate::models::{ActiveStudent, ActiveTeacher, Course};
use serde::{Deserialize, Serialize};

/// Seats reserved for one program inside a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedSpot {
    pub program: String,
    pub seats_count: u32,
    pub seats_accepted: u32,
}

/// A section from the public search, with its detail panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedSection {
    pub course: Course,
    pub term: String,
    pub time_codes: Vec<String>,
    pub location_table: String,
    pub mode: String,
    pub id_ref: String,
    pub teachers: Vec<String>,
    pub seats_count: u32,
    pub seats_accepted: u32,
    pub seats_requested: u32,
    pub seats_rerequested: u32,
    pub spots_reserved: Vec<ReservedSpot>,
}

/// A section the student is enrolled in this term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSection {
    pub course: Course,
    pub term: String,
    pub time_codes: Vec<String>,
    pub location_table: String,
    pub class_code: String,
    pub teachers: Vec<ActiveTeacher>,
    pub students: Vec<ActiveStudent>,
    pub total_classes: u32,
    pub number_classes: u32,
}
