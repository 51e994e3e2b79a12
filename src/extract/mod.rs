//! Extraction rules
//!
//! Pure functions from parsed pages (or fragments of them) to owned values.
//! Nothing here touches the network; the navigator decides which page is
//! loaded and hands it over. Absent elements turn into empty fields, never
//! into errors.

pub mod account;
pub mod active;
pub mod activity;
pub mod cards;
pub mod course;
pub mod program;
pub mod requisites;
pub mod section;
pub mod teacher;
pub mod text;

pub use account::read_account;
pub use active::{assemble_active_section, read_active_detail, read_active_row, ActiveDetail, ActiveRow};
pub use activity::{parse_activity_date, read_activities};
pub use cards::{chunk_after, chunk_cards, read_student_cards, read_teacher_cards};
pub use course::read_course;
pub use program::{assemble_program, read_curriculum, read_program_row, ProgramDetail, ProgramRow};
pub use requisites::{requisites_or_empty, to_dnf, RequisiteError};
pub use section::{assemble_section, read_departments, read_section_detail, read_section_row, SectionDetail, SectionRow};
pub use teacher::{read_campuses, read_teacher_email, read_teacher_results};
