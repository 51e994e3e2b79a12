//! Query layer over parsed portal pages
//!
//! Every lookup answers "zero or more" and never fails: a selector that
//! matches nothing, an out-of-range index and a missing attribute all come
//! back as empty results or `None`. Extraction code decides what absence
//! means for its field.

mod fragment;

pub use fragment::{collapse_whitespace, Fragment};

use scraper::{Html, Selector};

/// A parsed snapshot of one document
///
/// `Page` is not `Send`; parse it, read what you need into owned values and
/// drop it before the next `.await`.
pub struct Page {
    html: Html,
}

impl Page {
    /// Parses a full HTML document
    pub fn parse(content: &str) -> Self {
        Self {
            html: Html::parse_document(content),
        }
    }

    /// All elements matching `selector`, in document order
    pub fn query(&self, selector: &str) -> Matches<'_> {
        let Some(selector) = compile(selector) else {
            return Matches::empty();
        };
        Matches::collect_from(self.html.select(&selector).map(Fragment::new))
    }

    /// True when at least one element matches `selector`
    pub fn has(&self, selector: &str) -> bool {
        self.query(selector).count() > 0
    }

    /// Text of the first match, `None` when absent or blank
    pub fn first_text(&self, selector: &str) -> Option<String> {
        self.query(selector)
            .first()
            .map(|f| f.text())
            .filter(|t| !t.is_empty())
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page").finish_non_exhaustive()
    }
}

/// Ordered result of a query
#[derive(Debug, Clone, Default)]
pub struct Matches<'a> {
    items: Vec<Fragment<'a>>,
}

impl<'a> Matches<'a> {
    pub(crate) fn empty() -> Self {
        Self { items: Vec::new() }
    }

    pub(crate) fn collect_from<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Fragment<'a>>,
    {
        Self {
            items: iter.into_iter().collect(),
        }
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Element at `index`, `None` when out of range
    pub fn at(&self, index: usize) -> Option<Fragment<'a>> {
        self.items.get(index).copied()
    }

    pub fn first(&self) -> Option<Fragment<'a>> {
        self.at(0)
    }

    pub fn last(&self) -> Option<Fragment<'a>> {
        self.items.last().copied()
    }

    pub fn all(&self) -> Vec<Fragment<'a>> {
        self.items.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = Fragment<'a>> + '_ {
        self.items.iter().copied()
    }
}

impl<'a> IntoIterator for Matches<'a> {
    type Item = Fragment<'a>;
    type IntoIter = std::vec::IntoIter<Fragment<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

pub(crate) fn compile(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::debug!("Ignoring invalid selector '{}': {:?}", selector, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = r#"
        <html><body>
          <table id="turmas">
            <tr><td>MATA01</td><td>T01</td></tr>
            <tr><td>MATA02</td><td>T02</td></tr>
            <tr><td>MATA03</td><td>T03</td></tr>
          </table>
        </body></html>
    "#;

    #[test]
    fn test_query_preserves_document_order() {
        let page = Page::parse(LIST);
        let rows = page.query("#turmas tr");
        assert_eq!(rows.count(), 3);

        let codes: Vec<String> = rows
            .iter()
            .filter_map(|r| r.query("td").first())
            .map(|td| td.text())
            .collect();
        assert_eq!(codes, vec!["MATA01", "MATA02", "MATA03"]);
    }

    #[test]
    fn test_absent_selector_is_empty() {
        let page = Page::parse(LIST);
        let matches = page.query("#nao-existe td");
        assert!(matches.is_empty());
        assert!(matches.first().is_none());
        assert!(!page.has("#nao-existe"));
    }

    #[test]
    fn test_out_of_range_index_is_none() {
        let page = Page::parse(LIST);
        let rows = page.query("#turmas tr");
        assert!(rows.at(2).is_some());
        assert!(rows.at(3).is_none());
    }

    #[test]
    fn test_invalid_selector_is_empty() {
        let page = Page::parse(LIST);
        assert_eq!(page.query("td[[").count(), 0);
        assert!(page.first_text(">>>").is_none());
    }

    #[test]
    fn test_escaped_jsf_id_selector() {
        let page = Page::parse(r#"<div id="formulario:tab_painel"><span>Nível 1</span></div>"#);
        assert_eq!(
            page.first_text(r"#formulario\:tab_painel span").as_deref(),
            Some("Nível 1")
        );
    }

    #[test]
    fn test_first_text_blank_is_none() {
        let page = Page::parse("<p id='a'>   </p><p id='b'>x</p>");
        assert!(page.first_text("#a").is_none());
        assert_eq!(page.first_text("#b").as_deref(), Some("x"));
    }
}
