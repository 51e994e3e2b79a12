//! Read-only handles into one element of a parsed page

use crate::query::{compile, Matches};
use scraper::{ElementRef, Node};

/// A borrowed element of a parsed [`Page`](crate::query::Page)
///
/// The lifetime ties the fragment to the page it was found in, so a
/// fragment can never be used after the document it points into has been
/// replaced by a navigation.
#[derive(Debug, Clone, Copy)]
pub struct Fragment<'a> {
    element: ElementRef<'a>,
}

impl<'a> Fragment<'a> {
    pub(crate) fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// Tag name of the element (lowercase)
    pub fn tag(&self) -> &'a str {
        self.element.value().name()
    }

    /// Visible text with whitespace collapsed and entities decoded
    ///
    /// Script and style contents are skipped.
    pub fn text(&self) -> String {
        let mut raw = String::new();
        collect_text(self.element, &mut |chunk| raw.push_str(chunk));
        collapse_whitespace(&raw)
    }

    /// Visible text split into one line per text run
    ///
    /// Markup that separates values with `<br>` or sibling elements yields
    /// one entry per value. Empty runs are dropped.
    pub fn text_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        collect_text(self.element, &mut |chunk| {
            let line = collapse_whitespace(chunk);
            if !line.is_empty() {
                lines.push(line);
            }
        });
        lines
    }

    /// Inner markup of the element
    pub fn html(&self) -> String {
        self.element.inner_html()
    }

    /// Attribute value, `None` when absent
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// True when the element carries the given class
    pub fn has_class(&self, class: &str) -> bool {
        self.element.value().classes().any(|c| c == class)
    }

    /// Descendants matching `selector`, in document order
    ///
    /// The fragment itself is never part of its own result.
    pub fn query(&self, selector: &str) -> Matches<'a> {
        let Some(selector) = compile(selector) else {
            return Matches::empty();
        };
        let own_id = self.element.id();
        Matches::collect_from(
            self.element
                .select(&selector)
                .filter(|el| el.id() != own_id)
                .map(Fragment::new),
        )
    }

    /// Nearest preceding sibling element satisfying `pred`
    pub fn preceding_sibling<P>(&self, pred: P) -> Option<Fragment<'a>>
    where
        P: Fn(&Fragment<'a>) -> bool,
    {
        self.element
            .prev_siblings()
            .filter_map(ElementRef::wrap)
            .map(Fragment::new)
            .find(|f| pred(f))
    }

    /// Next sibling that is an element
    pub fn next_sibling_element(&self) -> Option<Fragment<'a>> {
        self.element
            .next_siblings()
            .find_map(ElementRef::wrap)
            .map(Fragment::new)
    }
}

fn collect_text<'a, F>(element: ElementRef<'a>, sink: &mut F)
where
    F: FnMut(&str),
{
    for child in element.children() {
        match child.value() {
            Node::Text(text) => sink(text),
            Node::Element(el) if matches!(el.name(), "script" | "style") => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, sink);
                }
            }
            _ => {}
        }
    }
}

/// Collapses runs of whitespace (including non-breaking spaces) to one space
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
