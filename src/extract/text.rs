//! Text helpers shared by the extraction rules
//!
//! Portal cells pack several values into one string ("MATA01 - CÁLCULO A",
//! "35MT12 (10/03/2024 - 13/07/2024)", "40/38"). These helpers pull them
//! apart without ever failing: unparseable input yields an empty or zero
//! value.

use crate::models::Course;
use crate::query::{Fragment, Matches};
use regex::Regex;
use std::sync::LazyLock;

/// Separator between code, name and class code in headings
pub const HEADING_DELIMITER: &str = " - ";

static TIME_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)([MTN]+)(\d+)\b").expect("valid regex"));

static PARENTHESISED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^()]*\)\s*").expect("valid regex"));

static TRAILING_PARENTHESISED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(.*\)\s*$").expect("valid regex"));

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

static SEAT_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:/|\bde\b)\s*(\d+)").expect("valid regex")
});

static CLASS_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:turma\s+)?([a-z]{0,2}\d{1,7}[a-z]?)$").expect("valid regex"));

static TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}\.\d\b").expect("valid regex"));

static ONCLICK_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'(/[^']+)'").expect("valid regex"));

static SECTION_PANEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PainelTurma\.show\((\d+)\)").expect("valid regex"));

static COMPONENT_PANEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PainelComponente\.show\((\d+),").expect("valid regex"));

/// Splits on the first occurrence of `delimiter`
///
/// Both halves are trimmed; the tail is `None` when the delimiter is absent.
pub fn split_first(text: &str, delimiter: &str) -> (String, Option<String>) {
    match text.split_once(delimiter) {
        Some((head, tail)) => (head.trim().to_string(), Some(tail.trim().to_string())),
        None => (text.trim().to_string(), None),
    }
}

/// `"MATA01 - CÁLCULO A"` → code `MATA01`, name `CÁLCULO A`
///
/// Only the first delimiter splits, so names that contain " - " stay whole.
pub fn parse_course_heading(text: &str) -> Course {
    let text = strip_parentheses_terms(text);
    match split_first(&text, HEADING_DELIMITER) {
        (code, Some(name)) => Course { code, name },
        (name, None) => Course {
            code: String::new(),
            name,
        },
    }
}

/// `"MATA01 - CÁLCULO I - T01"` → course plus class code `T01`
///
/// The class code is taken from the end, and only when it looks like one;
/// otherwise the whole tail is the course name.
pub fn parse_section_heading(text: &str) -> (Course, Option<String>) {
    let course = parse_course_heading(text);

    if let Some((name, tail)) = course.name.rsplit_once(HEADING_DELIMITER) {
        if let Some(c) = CLASS_CODE.captures(tail.trim()) {
            if !name.trim().is_empty() {
                return (
                    Course {
                        code: course.code.clone(),
                        name: name.trim().to_string(),
                    },
                    Some(c[1].to_string()),
                );
            }
        }
    }

    (course, None)
}

/// Removes every `(...)` group and squeezes the remaining spaces
pub fn strip_parentheses_terms(text: &str) -> String {
    let stripped = PARENTHESISED.replace_all(text, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drops a trailing parenthesised suffix (e.g. a date range after a schedule)
pub fn strip_trailing_parenthesised(text: &str) -> String {
    TRAILING_PARENTHESISED.replace(text, "").trim().to_string()
}

/// All schedule codes in `text`, e.g. `"35M12 6T34"` → `["35M12", "6T34"]`
pub fn extract_times(text: &str) -> Vec<String> {
    TIME_CODE
        .captures_iter(text)
        .map(|c| format!("{}{}{}", &c[1], &c[2], &c[3]))
        .collect()
}

/// First run of digits as a number, `0` when there is none
pub fn extract_sequence(text: &str) -> u32 {
    FIRST_NUMBER
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Parses a two-part count such as `"40/38"` or `"38 de 40"`
///
/// The value is split on the delimiter and each side read as a number.
/// A lone number is returned as `(n, 0)`; no number at all as `(0, 0)`.
pub fn parse_seat_pair(text: &str) -> (u32, u32) {
    if let Some(c) = SEAT_PAIR.captures(text) {
        let first = c[1].parse().unwrap_or(0);
        let second = c[2].parse().unwrap_or(0);
        return (first, second);
    }
    (extract_sequence(text), 0)
}

/// Academic term such as `2024.1` found anywhere in `text`
pub fn find_term(text: &str) -> Option<String> {
    TERM.find(text).map(|m| m.as_str().to_string())
}

/// First quoted absolute path in an onclick handler
pub fn onclick_path(onclick: &str) -> Option<String> {
    ONCLICK_PATH.captures(onclick).map(|c| c[1].to_string())
}

/// Section reference id from `PainelTurma.show(N)`
pub fn section_ref_id(onclick: &str) -> Option<String> {
    SECTION_PANEL.captures(onclick).map(|c| c[1].to_string())
}

/// Component reference id from `PainelComponente.show(N, ...)`
pub fn component_ref_id(onclick: &str) -> Option<String> {
    COMPONENT_PANEL.captures(onclick).map(|c| c[1].to_string())
}

/// Cell next to the first label whose text contains `label`
///
/// Labels are compared case-insensitively, so `"capacidade:"` matches a
/// `<th>Capacidade:</th>`.
pub fn labeled_cell<'a>(labels: &Matches<'a>, label: &str) -> Option<Fragment<'a>> {
    let label = label.to_lowercase();
    labels
        .iter()
        .find(|l| l.text().to_lowercase().contains(&label))
        .and_then(|l| l.next_sibling_element())
}

/// Text of [`labeled_cell`], empty when absent
pub fn labeled_value(labels: &Matches<'_>, label: &str) -> String {
    labeled_cell(labels, label)
        .map(|cell| cell.text())
        .unwrap_or_default()
}

/// Text of the cell at `index`, empty when out of range
pub fn cell_text(cells: &Matches<'_>, index: usize) -> String {
    cells.at(index).map(|c| c.text()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Page;

    #[test]
    fn test_split_first_only_splits_once() {
        assert_eq!(
            split_first("MATA01 - CÁLCULO A - T01", " - "),
            ("MATA01".to_string(), Some("CÁLCULO A - T01".to_string()))
        );
        assert_eq!(split_first("SEM DELIMITADOR", " - "), ("SEM DELIMITADOR".to_string(), None));
    }

    #[test]
    fn test_parse_section_heading() {
        let (course, class_code) = parse_section_heading("MATA01 - Cálculo I - T01");
        assert_eq!(course.code, "MATA01");
        assert_eq!(course.name, "Cálculo I");
        assert_eq!(class_code.as_deref(), Some("T01"));
    }

    #[test]
    fn test_parse_section_heading_keeps_free_text_delimiters() {
        // Trailing part is not a class code, so it stays in the name
        let (course, class_code) =
            parse_section_heading("MATA68 - TÓPICOS EM COMPUTAÇÃO - INTELIGÊNCIA ARTIFICIAL");
        assert_eq!(course.code, "MATA68");
        assert_eq!(course.name, "TÓPICOS EM COMPUTAÇÃO - INTELIGÊNCIA ARTIFICIAL");
        assert!(class_code.is_none());

        let (course, class_code) = parse_section_heading("MATA68 - TÓPICOS - IA - T02");
        assert_eq!(course.name, "TÓPICOS - IA");
        assert_eq!(class_code.as_deref(), Some("T02"));
    }

    #[test]
    fn test_parse_course_heading_without_code() {
        let course = parse_course_heading("CÁLCULO A (60h)");
        assert_eq!(course.code, "");
        assert_eq!(course.name, "CÁLCULO A");
    }

    #[test]
    fn test_strip_parentheses_terms() {
        assert_eq!(
            strip_parentheses_terms("MATA01 (OBRIGATÓRIA)  - CÁLCULO (60h) A"),
            "MATA01 - CÁLCULO A"
        );
    }

    #[test]
    fn test_strip_trailing_parenthesised() {
        assert_eq!(
            strip_trailing_parenthesised("35M12 6T34 (04/03/2024 - 13/07/2024)"),
            "35M12 6T34"
        );
        assert_eq!(strip_trailing_parenthesised("24N12"), "24N12");
    }

    #[test]
    fn test_extract_times() {
        assert_eq!(extract_times("35M12 6T34"), vec!["35M12", "6T34"]);
        assert_eq!(extract_times("246MT1234 ou 7N12"), vec!["246MT1234", "7N12"]);
        assert!(extract_times("A DEFINIR").is_empty());
    }

    #[test]
    fn test_extract_sequence() {
        assert_eq!(extract_sequence("Nível 3"), 3);
        assert_eq!(extract_sequence("sem número"), 0);
    }

    #[test]
    fn test_parse_seat_pair() {
        assert_eq!(parse_seat_pair("40/38"), (40, 38));
        assert_eq!(parse_seat_pair(" 45 / 0 "), (45, 0));
        assert_eq!(parse_seat_pair("12 de 60"), (12, 60));
        assert_eq!(parse_seat_pair("45 vagas"), (45, 0));
        assert_eq!(parse_seat_pair("-"), (0, 0));
    }

    #[test]
    fn test_find_term() {
        assert_eq!(find_term("Semestre atual: 2024.1").as_deref(), Some("2024.1"));
        assert_eq!(find_term("sem período"), None);
    }

    #[test]
    fn test_onclick_patterns() {
        assert_eq!(
            onclick_path("window.open('/sigaa/public/curso/portal.jsf?id=123','_self')").as_deref(),
            Some("/sigaa/public/curso/portal.jsf?id=123")
        );
        assert_eq!(section_ref_id("PainelTurma.show(98765)").as_deref(), Some("98765"));
        assert_eq!(
            component_ref_id("PainelComponente.show(4321, '#nivel1')").as_deref(),
            Some("4321")
        );
        assert_eq!(section_ref_id("return false;"), None);
    }

    #[test]
    fn test_labeled_value() {
        let page = Page::parse(
            r#"<div id="resumo"><table>
                 <tr><th>Capacidade:</th><td>45 alunos</td></tr>
                 <tr><th>Totais:</th><td>30<br>2<br>28</td></tr>
               </table></div>"#,
        );
        let labels = page.query("#resumo th");
        assert_eq!(labeled_value(&labels, "capacidade:"), "45 alunos");
        assert_eq!(
            labeled_cell(&labels, "totais:").unwrap().text_lines(),
            vec!["30", "2", "28"]
        );
        assert_eq!(labeled_value(&labels, "horário:"), "");
    }
}
