use crate::models::AnchoredCourse;
use serde::{Deserialize, Serialize};

/// A degree program as listed publicly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub title: String,
    pub location: String,
    pub program_type: String,
    pub mode: String,
    pub time_code: String,
}

/// A program with its curriculum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedProgram {
    pub title: String,
    pub location: String,
    pub program_type: String,
    pub mode: String,
    pub time_code: String,
    pub id_ref: String,
    pub code: String,
    pub courses: Vec<AnchoredCourse>,
}

impl DetailedProgram {
    pub fn from_parts(program: Program, id_ref: String, code: String, courses: Vec<AnchoredCourse>) -> Self {
        Self {
            title: program.title,
            location: program.location,
            program_type: program.program_type,
            mode: program.mode,
            time_code: program.time_code,
            id_ref,
            code,
            courses,
        }
    }
}
