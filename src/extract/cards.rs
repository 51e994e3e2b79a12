//! Roster cards
//!
//! Participant pages lay people out as runs of table cells: a photo cell,
//! one or two info cells and sometimes an action cell (send message). Cards
//! are not aligned to rows, so cells are flattened and regrouped.

use crate::extract::text::split_first;
use crate::models::{ActiveStudent, ActiveTeacher};
use crate::query::Fragment;
use url::Url;

/// Groups items into chunks, closing a chunk right after `pred` matches
///
/// A trailing run without a terminator becomes the last chunk.
pub fn chunk_after<T, P>(items: impl IntoIterator<Item = T>, mut pred: P) -> Vec<Vec<T>>
where
    P: FnMut(&T) -> bool,
{
    let mut out = Vec::new();
    let mut current = Vec::new();
    for item in items {
        let done = pred(&item);
        current.push(item);
        if done {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Photo,
    Info,
    Action,
    Empty,
}

fn classify(cell: &Fragment<'_>) -> CellKind {
    if cell.query("input, button").count() > 0 || cell.has_class("acao") {
        return CellKind::Action;
    }
    let has_text = !cell.text().is_empty();
    if cell.query("img").count() > 0 && !has_text {
        return CellKind::Photo;
    }
    if has_text {
        CellKind::Info
    } else {
        CellKind::Empty
    }
}

/// Regroups the cells of a roster table into one chunk per person
///
/// A card ends at an action cell, or at an info cell immediately followed by
/// a photo cell (the next person's). Empty cells are dropped.
pub fn chunk_cards<'a>(cells: Vec<Fragment<'a>>) -> Vec<Vec<Fragment<'a>>> {
    let kinds: Vec<CellKind> = cells.iter().map(classify).collect();

    let indexed: Vec<(usize, Fragment<'a>)> = cells
        .into_iter()
        .enumerate()
        .filter(|(i, _)| kinds[*i] != CellKind::Empty)
        .collect();
    let next_kind: Vec<Option<CellKind>> = (0..indexed.len())
        .map(|pos| indexed.get(pos + 1).map(|(j, _)| kinds[*j]))
        .collect();

    let mut position = 0;
    chunk_after(indexed, |(i, _)| {
        let ends = match kinds[*i] {
            CellKind::Action => true,
            CellKind::Info => next_kind[position] == Some(CellKind::Photo),
            _ => false,
        };
        position += 1;
        ends
    })
    .into_iter()
    .map(|chunk| chunk.into_iter().map(|(_, cell)| cell).collect())
    .filter(|chunk: &Vec<Fragment<'a>>| chunk.iter().any(|c| classify(c) == CellKind::Info))
    .collect()
}

/// Name plus `label: value` pairs read from a card's info cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFields {
    pub name: String,
    pub image_url: String,
    pairs: Vec<(String, String)>,
}

impl CardFields {
    /// Reads a card; `base` resolves relative photo URLs
    pub fn read(card: &[Fragment<'_>], base: &Url) -> Self {
        let mut fields = Self::default();

        for cell in card {
            if let Some(src) = cell.query("img").first().and_then(|img| img.attribute("src")) {
                if fields.image_url.is_empty() && classify(cell) == CellKind::Photo {
                    fields.image_url = base
                        .join(src)
                        .map(|u| u.to_string())
                        .unwrap_or_else(|_| src.to_string());
                }
            }
            if classify(cell) != CellKind::Info {
                continue;
            }
            fields.absorb_lines(cell.text_lines());
        }

        fields
    }

    fn absorb_lines(&mut self, lines: Vec<String>) {
        let mut pending_label: Option<String> = None;

        for line in lines {
            if let Some(label) = pending_label.take() {
                self.pairs.push((label, line));
                continue;
            }
            match split_first(&line, ":") {
                (label, Some(value)) if !value.is_empty() => {
                    self.pairs.push((normalize_label(&label), value));
                }
                (label, Some(_)) => pending_label = Some(normalize_label(&label)),
                (text, None) => {
                    if self.name.is_empty() {
                        self.name = text;
                    }
                }
            }
        }
    }

    /// First value whose label starts with any of `labels`
    pub fn get(&self, labels: &[&str]) -> String {
        self.pairs
            .iter()
            .find(|(label, _)| labels.iter().any(|l| label.starts_with(l)))
            .map(|(_, value)| value.clone())
            .unwrap_or_default()
    }
}

fn normalize_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .replace(['á', 'ã', 'â'], "a")
        .replace('ç', "c")
        .replace('í', "i")
}

/// Teacher cards of a roster table
pub fn read_teacher_cards(table: Fragment<'_>, base: &Url) -> Vec<ActiveTeacher> {
    chunk_cards(table.query("td").all())
        .iter()
        .map(|card| CardFields::read(card, base))
        .filter(|fields| !fields.name.is_empty())
        .map(|fields| ActiveTeacher {
            email: fields.get(&["e-mail", "email"]),
            education: fields.get(&["formacao"]),
            department: fields.get(&["departamento", "unidade"]),
            image_url: fields.image_url.clone(),
            name: fields.name,
        })
        .collect()
}

/// Student cards of a roster table
pub fn read_student_cards(table: Fragment<'_>, base: &Url) -> Vec<ActiveStudent> {
    chunk_cards(table.query("td").all())
        .iter()
        .map(|card| CardFields::read(card, base))
        .filter(|fields| !fields.name.is_empty())
        .map(|fields| ActiveStudent {
            email: fields.get(&["e-mail", "email"]),
            registration: fields.get(&["matricula"]),
            course_label: fields.get(&["curso"]),
            image_url: fields.image_url.clone(),
            name: fields.name,
        })
        .collect()
}
