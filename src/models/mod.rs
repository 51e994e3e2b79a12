//! Typed records produced by extraction
//!
//! Records are plain values: every field is owned, primitive or another
//! record. The ones that are persisted implement [`Record`], which names
//! their table and the natural key used for idempotent upserts.

mod account;
mod course;
mod people;
mod program;
mod section;

pub use account::{Account, Activity};
pub use course::{AnchoredCourse, Course, DetailedCourse, RequestedCourse};
pub use people::{ActiveStudent, ActiveTeacher, Campus, TeacherResult};
pub use program::{DetailedProgram, Program};
pub use section::{ActiveSection, DetailedSection, ReservedSpot};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Durable tables, one per persisted record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Account,
    Program,
    Section,
    Course,
}

impl RecordKind {
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Account => "accounts",
            Self::Program => "programs",
            Self::Section => "sections",
            Self::Course => "courses",
        }
    }

    pub fn all() -> [Self; 4] {
        [Self::Account, Self::Program, Self::Section, Self::Course]
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

/// A record with a stable business identity
///
/// Two records with the same natural key are the same entity; the later
/// capture replaces the earlier one.
pub trait Record: Serialize + DeserializeOwned {
    const KIND: RecordKind;

    fn natural_key(&self) -> String;
}

impl Record for Account {
    const KIND: RecordKind = RecordKind::Account;

    fn natural_key(&self) -> String {
        self.registration.clone()
    }
}

impl Record for DetailedProgram {
    const KIND: RecordKind = RecordKind::Program;

    fn natural_key(&self) -> String {
        self.code.clone()
    }
}

impl Record for DetailedSection {
    const KIND: RecordKind = RecordKind::Section;

    fn natural_key(&self) -> String {
        self.id_ref.clone()
    }
}

impl Record for RequestedCourse {
    const KIND: RecordKind = RecordKind::Course;

    fn natural_key(&self) -> String {
        self.id_ref.clone()
    }
}
