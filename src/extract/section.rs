//! Public section search rows and section detail panels

use crate::extract::text::{
    cell_text, extract_sequence, extract_times, labeled_cell, labeled_value, parse_course_heading,
    parse_seat_pair, section_ref_id, strip_trailing_parenthesised,
};
use crate::models::{Course, DetailedSection, ReservedSpot};
use crate::portal::SectionProfile;
use crate::query::{Fragment, Page};

/// Owned fields of one section row in the search listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRow {
    pub course: Course,
    pub term: String,
    pub mode: String,
    pub time_id: String,
    pub location: String,
    /// Empty when the row has no detail panel link
    pub ref_id: String,
}

/// Owned fields of a section detail panel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionDetail {
    pub capacity: u32,
    pub requested: u32,
    pub rerequested: u32,
    pub accepted: u32,
    pub teachers: Vec<String>,
    pub spots: Vec<ReservedSpot>,
}

/// True for rows that describe a section (header rows carry the course)
pub fn is_section_row(row: &Fragment<'_>, profile: &SectionProfile) -> bool {
    !row.has_class(profile.header_class) && row.query("td").count() > 1
}

/// Reads a listing row
///
/// The course comes from the nearest preceding header row. Missing cells
/// read as empty strings.
pub fn read_section_row(row: Fragment<'_>, profile: &SectionProfile) -> SectionRow {
    let cells = row.query("td");

    let course = row
        .preceding_sibling(|sibling| sibling.tag() == "tr" && sibling.has_class(profile.header_class))
        .and_then(|header| header.query("td").first())
        .map(|td| parse_course_heading(&td.text()))
        .unwrap_or(Course {
            code: String::new(),
            name: String::new(),
        });

    let ref_id = row
        .query(profile.ref_link)
        .first()
        .and_then(|a| a.attribute("onclick"))
        .and_then(section_ref_id)
        .unwrap_or_default();

    SectionRow {
        course,
        term: cell_text(&cells, 0),
        mode: cell_text(&cells, 4),
        time_id: strip_trailing_parenthesised(&cell_text(&cells, 6)),
        location: cell_text(&cells, 7),
        ref_id,
    }
}

/// Reads the detail panel of a section
pub fn read_section_detail(page: &Page, profile: &SectionProfile) -> SectionDetail {
    let labels = page.query(profile.detail_labels);

    let totals = labeled_cell(&labels, "totais:")
        .map(|cell| cell.text_lines())
        .unwrap_or_default();
    let total_at = |i: usize| totals.get(i).map(|t| extract_sequence(t)).unwrap_or(0);

    let mut detail = SectionDetail {
        capacity: extract_sequence(&labeled_value(&labels, "capacidade:")),
        requested: total_at(0),
        rerequested: total_at(1),
        accepted: total_at(2),
        ..SectionDetail::default()
    };

    for table in page.query(profile.nested_tables).iter() {
        let header = table
            .query(profile.nested_header)
            .first()
            .map(|td| td.text())
            .unwrap_or_default();

        let body_rows = table
            .query("tr")
            .iter()
            .filter(|tr| !tr.has_class("secao"))
            .collect::<Vec<_>>();

        if header.starts_with("Professores") {
            detail.teachers.extend(
                body_rows
                    .iter()
                    .map(|tr| cell_text(&tr.query("td"), 0))
                    .filter(|name| !name.is_empty()),
            );
        } else if header.starts_with("Vagas Reservadas") {
            detail.spots.extend(body_rows.iter().filter_map(|tr| {
                let cells = tr.query("td");
                let program = cell_text(&cells, 0);
                let count = cell_text(&cells, 1);
                if program.is_empty() || count.is_empty() {
                    return None;
                }
                let (seats_count, seats_accepted) = parse_seat_pair(&count);
                Some(ReservedSpot {
                    program,
                    seats_count,
                    seats_accepted,
                })
            }));
        }
    }

    detail
}

/// Merges a listing row with its detail panel
pub fn assemble_section(row: SectionRow, detail: SectionDetail) -> DetailedSection {
    DetailedSection {
        time_codes: extract_times(&row.time_id),
        course: row.course,
        term: row.term,
        location_table: row.location,
        mode: row.mode,
        id_ref: row.ref_id,
        teachers: detail.teachers,
        seats_count: detail.capacity,
        seats_accepted: detail.accepted,
        seats_requested: detail.requested,
        seats_rerequested: detail.rerequested,
        spots_reserved: detail.spots,
    }
}

/// Department option values of the search form, placeholder excluded
pub fn read_departments(page: &Page, profile: &SectionProfile) -> Vec<(String, String)> {
    page.query(profile.department_options)
        .iter()
        .filter_map(|option| {
            let value = option.attribute("value")?.trim().to_string();
            if value.is_empty() || value == "0" {
                return None;
            }
            Some((value, option.text()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::PortalProfile;

    const LISTING: &str = r##"
        <form id="formTurma"></form>
        <table id="lista-turmas"><tbody>
          <tr class="destaque"><td colspan="8">MATA01 - CÁLCULO A</td></tr>
          <tr class="linhaPar">
            <td>2024.1</td>
            <td><a href="#" onclick="PainelTurma.show(111)">T01</a></td>
            <td>ANA SOUZA (60h)</td>
            <td>Aberta</td>
            <td>Presencial</td>
            <td>45</td>
            <td>35M12 (04/03/2024 - 13/07/2024)</td>
            <td>PAF I - 101</td>
          </tr>
          <tr class="destaque"><td colspan="8">MATA02 - ÁLGEBRA - LINEAR</td></tr>
          <tr class="linhaImpar">
            <td>2024.1</td>
            <td><a href="#" onclick="return false;">T02</a></td>
            <td>BRUNO LIMA</td>
            <td>Aberta</td>
            <td>Presencial</td>
            <td>30</td>
            <td>24N12 6T34</td>
          </tr>
        </tbody></table>
    "##;

    const DETAIL: &str = r#"
        <div id="resumo">
          <table><tbody>
            <tr><th>Capacidade:</th><td>45 alunos</td></tr>
            <tr><th>Totais:</th><td>50<br/>3<br/>44</td></tr>
            <tr><td>
              <table><tbody><tr><td>
                <table><tbody>
                  <tr class="secao"><td>Professores</td></tr>
                  <tr><td>ANA SOUZA</td></tr>
                  <tr><td>CARLOS REIS</td></tr>
                </tbody></table>
                <table><tbody>
                  <tr class="secao"><td>Vagas Reservadas</td></tr>
                  <tr><td>CIÊNCIA DA COMPUTAÇÃO</td><td>20/18</td></tr>
                  <tr><td>MATEMÁTICA</td><td>10</td></tr>
                  <tr><td></td><td>5/5</td></tr>
                </tbody></table>
              </td></tr></tbody></table>
            </td></tr>
          </tbody></table>
        </div>
    "#;

    #[test]
    fn test_read_section_rows() {
        let profile = PortalProfile::ufba();
        let page = Page::parse(LISTING);
        let rows: Vec<SectionRow> = page
            .query(profile.sections.rows)
            .iter()
            .filter(|row| is_section_row(row, &profile.sections))
            .map(|row| read_section_row(row, &profile.sections))
            .collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].course.code, "MATA01");
        assert_eq!(rows[0].course.name, "CÁLCULO A");
        assert_eq!(rows[0].term, "2024.1");
        assert_eq!(rows[0].mode, "Presencial");
        assert_eq!(rows[0].time_id, "35M12");
        assert_eq!(rows[0].location, "PAF I - 101");
        assert_eq!(rows[0].ref_id, "111");

        assert_eq!(rows[1].course.code, "MATA02");
        assert_eq!(rows[1].course.name, "ÁLGEBRA - LINEAR");
        assert_eq!(rows[1].location, "");
        assert_eq!(rows[1].ref_id, "");
    }

    #[test]
    fn test_read_section_detail() {
        let profile = PortalProfile::ufba();
        let detail = read_section_detail(&Page::parse(DETAIL), &profile.sections);

        assert_eq!(detail.capacity, 45);
        assert_eq!((detail.requested, detail.rerequested, detail.accepted), (50, 3, 44));
        assert_eq!(detail.teachers, vec!["ANA SOUZA", "CARLOS REIS"]);
        assert_eq!(
            detail.spots,
            vec![
                ReservedSpot {
                    program: "CIÊNCIA DA COMPUTAÇÃO".to_string(),
                    seats_count: 20,
                    seats_accepted: 18,
                },
                ReservedSpot {
                    program: "MATEMÁTICA".to_string(),
                    seats_count: 10,
                    seats_accepted: 0,
                },
            ]
        );
    }

    #[test]
    fn test_assemble_section() {
        let row = SectionRow {
            course: Course {
                code: "MATA01".to_string(),
                name: "CÁLCULO A".to_string(),
            },
            term: "2024.1".to_string(),
            mode: "Presencial".to_string(),
            time_id: "35M12 6T34".to_string(),
            location: "PAF I".to_string(),
            ref_id: "111".to_string(),
        };
        let detail = SectionDetail {
            capacity: 45,
            accepted: 40,
            teachers: vec!["ANA SOUZA".to_string()],
            ..SectionDetail::default()
        };
        let section = assemble_section(row, detail);

        assert_eq!(section.time_codes, vec!["35M12", "6T34"]);
        assert_eq!(section.id_ref, "111");
        assert_eq!(section.course.code, "MATA01");
        assert_eq!(section.seats_count, 45);
        assert_eq!(section.seats_accepted, 40);
        assert_eq!(section.seats_requested, 0);
        assert_eq!(section.teachers, vec!["ANA SOUZA"]);
    }

    #[test]
    fn test_read_departments_skips_placeholder() {
        let profile = PortalProfile::ufba();
        let page = Page::parse(
            r#"<select id="formTurma:inputDepto">
                 <option value="0">-- SELECIONE --</option>
                 <option value="1101">DEPTO DE MATEMÁTICA</option>
                 <option value="1102">DEPTO DE CIÊNCIA DA COMPUTAÇÃO</option>
               </select>"#,
        );
        let departments = read_departments(&page, &profile.sections);
        assert_eq!(
            departments,
            vec![
                ("1101".to_string(), "DEPTO DE MATEMÁTICA".to_string()),
                ("1102".to_string(), "DEPTO DE CIÊNCIA DA COMPUTAÇÃO".to_string()),
            ]
        );
    }
}
