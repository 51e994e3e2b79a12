use crate::extract::requisites::requisites_or_empty;
use crate::extract::text::labeled_value;
use crate::models::RequestedCourse;
use crate::portal::CourseProfile;
use crate::query::Page;

/// Reads a component detail panel
///
/// Returns `None` when the panel carries no component code (an empty or
/// error panel). Requisite fields are compiled to disjunctive normal form;
/// a requisite text that does not parse is treated as no requisite.
pub fn read_course(page: &Page, profile: &CourseProfile, id_ref: &str) -> Option<RequestedCourse> {
    let labels = page.query(profile.labels);
    let value = |label: &str| labeled_value(&labels, label);

    let code = value("código:");
    if code.is_empty() {
        return None;
    }

    let location = Some(value("local")).filter(|v| !v.is_empty()).unwrap_or_else(|| value("sede"));

    Some(RequestedCourse {
        code,
        name: value("nome:"),
        mode: value("modalidade"),
        id_ref: id_ref.to_string(),
        location,
        department: value("unidade responsável:"),
        prerequisites: requisites_or_empty(&value("pré-requisitos:")),
        corequisites: requisites_or_empty(&value("co-requisitos:")),
        equivalences: requisites_or_empty(&value("equivalências:")),
    })
}
