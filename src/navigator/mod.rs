//! Traversal engine
//!
//! Walks a list page row by row, optionally visiting each row's detail
//! page(s) and backtracking to the list through the document history. Each
//! entity type plugs in through [`Traversal`]; the engine owns navigation,
//! backtracking, failure isolation and bookkeeping.
//!
//! A parsed [`Page`](crate::query::Page) is never kept across a fetch:
//! rows are read into owned values first, then visited one by one.

mod report;
mod traversals;

pub use report::{SkipDiagnostic, SkipReason, TraversalReport};
pub use traversals::{ActiveSectionTraversal, ProgramTraversal, SectionTraversal};

use crate::browser::{DocumentClient, Fetcher};
use crate::extract::text::onclick_path;
use crate::query::{Fragment, Page};
use crate::{Result, SigaaError};
use url::Url;

/// Where a row's detail lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailTarget {
    /// The row is complete on its own
    NotRequired,
    Url(Url),
    /// A detail exists but no usable link was found
    Unresolved,
}

/// Resolves the target of a link element
///
/// A real `href` wins; `#` and `javascript:` links fall back to the first
/// quoted path in `onclick`.
pub fn link_target(href: Option<&str>, onclick: Option<&str>, base: &Url) -> DetailTarget {
    let usable_href = href
        .map(str::trim)
        .filter(|h| !h.is_empty() && !h.starts_with('#') && !h.starts_with("javascript:"));

    let candidate = usable_href
        .map(str::to_string)
        .or_else(|| onclick.and_then(onclick_path));

    match candidate.and_then(|c| base.join(&c).ok()) {
        Some(url) => DetailTarget::Url(url),
        None => DetailTarget::Unresolved,
    }
}

/// Reads a `Fragment`'s link target (see [`link_target`])
pub fn fragment_target(link: Option<Fragment<'_>>, base: &Url) -> DetailTarget {
    match link {
        Some(a) => link_target(a.attribute("href"), a.attribute("onclick"), base),
        None => DetailTarget::Unresolved,
    }
}

/// Entity-specific half of a list traversal
pub trait Traversal {
    /// Owned fields read from a list row
    type Row;
    /// Owned fields read from the detail page
    type Detail;
    type Record;

    /// Page to load first; `None` traverses the current document
    fn list_url(&self) -> Option<String> {
        None
    }

    fn list_container(&self) -> &str;

    /// Row selector, evaluated inside the list container
    fn row_selector(&self) -> &str;

    fn qualifies(&self, _row: &Fragment<'_>) -> bool {
        true
    }

    /// `list_url` is the URL of the list page, for resolving links
    fn read_row(&self, row: Fragment<'_>, list_url: &Url) -> Option<Self::Row>;

    fn detail_target(&self, row: &Self::Row, list_url: &Url) -> DetailTarget;

    /// Link selectors followed after the first hop, in order
    fn follow_links(&self) -> &[&str] {
        &[]
    }

    /// Element that must exist on the final detail page
    fn detail_container(&self) -> &str;

    fn read_detail(&self, page: &Page, url: &Url) -> Self::Detail;

    /// Combines row and detail; `None` skips the row
    fn assemble(&self, row: Self::Row, detail: Option<Self::Detail>) -> Option<Self::Record>;

    /// Previously captured record for this row, skipping navigation
    fn reuse(&self, _row: &Self::Row) -> Option<Self::Record> {
        None
    }

    /// Short label for logs and diagnostics
    fn describe(&self, row: &Self::Row) -> String;
}

/// One step of a multi-step form selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormStep {
    pub form_selector: String,
    pub overrides: Vec<(String, String)>,
}

/// A category reached by loading `entry` and replaying `steps`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySelection {
    pub label: String,
    pub entry: String,
    pub steps: Vec<FormStep>,
}

/// Drives traversals over a borrowed document client
pub struct Navigator<'c, F> {
    doc: &'c mut DocumentClient<F>,
}

struct Rows<R> {
    rows: Vec<R>,
    seen: usize,
    filtered: usize,
}

impl<'c, F: Fetcher> Navigator<'c, F> {
    pub fn new(doc: &'c mut DocumentClient<F>) -> Self {
        Self { doc }
    }

    /// Runs one list traversal
    ///
    /// # Errors
    ///
    /// `StructuralExtraction` when the list container is missing,
    /// `HttpStatus` when the list page itself cannot be loaded and
    /// `Transport` on connection failures. Row-level failures are recorded
    /// in the report instead.
    pub async fn traverse<T: Traversal>(&mut self, traversal: &T) -> Result<TraversalReport<T::Record>> {
        if let Some(url) = traversal.list_url() {
            self.doc.navigate(&url).await?;
        }
        self.traverse_current(traversal).await
    }

    /// Runs the traversal once per category
    ///
    /// A category whose selection fails or whose list never shows up is
    /// recorded in `categories_skipped`; connection failures still abort.
    pub async fn traverse_categories<T: Traversal>(
        &mut self,
        categories: &[CategorySelection],
        traversal: &T,
    ) -> Result<TraversalReport<T::Record>> {
        let mut report = TraversalReport::default();

        for category in categories {
            tracing::info!("Traversing category {}", category.label);
            match self.select_category(category, traversal).await {
                Ok(part) => report.merge(part),
                Err(e) if e.is_row_local() => {
                    tracing::warn!("Skipping category {}: {}", category.label, e);
                    report.categories_skipped.push(category.label.clone());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    async fn select_category<T: Traversal>(
        &mut self,
        category: &CategorySelection,
        traversal: &T,
    ) -> Result<TraversalReport<T::Record>> {
        self.doc.navigate(&category.entry).await?;
        for step in &category.steps {
            self.doc
                .submit_page_form(&step.form_selector, &step.overrides)
                .await?;
        }
        self.traverse_current(traversal).await
    }

    async fn traverse_current<T: Traversal>(&mut self, traversal: &T) -> Result<TraversalReport<T::Record>> {
        let list_url = self
            .doc
            .current_url()
            .cloned()
            .ok_or_else(|| self.missing(traversal.list_container()))?;

        let collected = {
            let page = self.doc.page();
            collect_rows(&page, traversal, &list_url)
        };
        let Some(Rows { rows, seen, filtered }) = collected else {
            return Err(self.missing(traversal.list_container()));
        };

        let mut report = TraversalReport {
            rows_seen: seen,
            rows_filtered: filtered,
            ..TraversalReport::default()
        };
        if seen > 0 && rows.is_empty() {
            tracing::warn!(
                "{} rows loaded from {} but none qualified",
                seen,
                list_url
            );
        }

        let list_depth = self.doc.depth();
        let total = rows.len();

        for (index, row) in rows.into_iter().enumerate() {
            let label = traversal.describe(&row);

            if let Some(record) = traversal.reuse(&row) {
                tracing::debug!("Reusing stored record for {}", label);
                report.reused += 1;
                report.records.push(record);
                continue;
            }

            let (detail, failure) = match traversal.detail_target(&row, &list_url) {
                DetailTarget::NotRequired => (None, None),
                DetailTarget::Unresolved => (None, Some(SkipReason::TargetUnresolved)),
                DetailTarget::Url(url) => match self.visit_detail(traversal, &url).await {
                    Ok(detail) => (Some(detail), None),
                    Err(e) if e.is_row_local() => {
                        tracing::warn!("Detail for {} unavailable: {}", label, e);
                        (None, Some(SkipReason::DetailFailed(e.to_string())))
                    }
                    Err(e) => return Err(e),
                },
            };

            match (traversal.assemble(row, detail), failure) {
                (Some(record), None) => report.records.push(record),
                (Some(record), Some(_)) => {
                    report.degraded += 1;
                    report.records.push(record);
                }
                (None, reason) => {
                    let reason = reason.unwrap_or(SkipReason::Incomplete);
                    tracing::warn!("Skipping {}: {}", label, reason);
                    report.skipped.push(SkipDiagnostic { row: label, reason });
                }
            }

            if self.doc.depth() != list_depth || !self.doc.has(traversal.list_container()) {
                tracing::warn!(
                    "Lost the list page {} (depth {} vs {}); abandoning {} remaining rows",
                    list_url,
                    self.doc.depth(),
                    list_depth,
                    total - index - 1
                );
                report.aborted = true;
                break;
            }
        }

        tracing::info!(
            "Traversed {}: {} records, {} skipped",
            list_url,
            report.records.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Visits the detail page(s) of one row and backtracks
    ///
    /// Exactly one `back()` is issued per successful hop, whatever the
    /// outcome of the extraction.
    async fn visit_detail<T: Traversal>(&mut self, traversal: &T, url: &Url) -> Result<T::Detail> {
        let mut hops = 0;
        let outcome = self.walk_detail(traversal, url, &mut hops).await;
        for _ in 0..hops {
            if !self.doc.back() {
                tracing::warn!("History exhausted while returning from {}", url);
                break;
            }
        }
        outcome
    }

    async fn walk_detail<T: Traversal>(&mut self, traversal: &T, url: &Url, hops: &mut usize) -> Result<T::Detail> {
        self.doc.navigate_url(url).await?;
        *hops += 1;

        for link in traversal.follow_links() {
            let target = {
                let current = self.doc.current_url().cloned().unwrap_or_else(|| url.clone());
                let page = self.doc.page();
                fragment_target(page.query(link).first(), &current)
            };
            let DetailTarget::Url(next) = target else {
                return Err(self.missing(link));
            };
            self.doc.navigate_url(&next).await?;
            *hops += 1;
        }

        let current = self.doc.current_url().cloned().unwrap_or_else(|| url.clone());
        let page = self.doc.page();
        if !page.has(traversal.detail_container()) {
            return Err(self.missing(traversal.detail_container()));
        }
        Ok(traversal.read_detail(&page, &current))
    }

    fn missing(&self, container: &str) -> SigaaError {
        SigaaError::StructuralExtraction {
            url: self
                .doc
                .current_url()
                .map(Url::to_string)
                .unwrap_or_default(),
            container: container.to_string(),
        }
    }
}

fn collect_rows<T: Traversal>(page: &Page, traversal: &T, list_url: &Url) -> Option<Rows<T::Row>> {
    let container = page.query(traversal.list_container()).first()?;
    let matches = container.query(traversal.row_selector());

    let mut rows = Vec::new();
    let mut filtered = 0;
    for row in matches.iter() {
        match traversal.qualifies(&row).then(|| traversal.read_row(row, list_url)).flatten() {
            Some(owned) => rows.push(owned),
            None => filtered += 1,
        }
    }

    Some(Rows {
        rows,
        seen: matches.count(),
        filtered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::MapFetcher;

    /// Rows link to `/item/N`; the detail carries `<p id="value">`
    struct ItemTraversal {
        list: Option<&'static str>,
    }

    const LISTED: ItemTraversal = ItemTraversal { list: Some("/list") };

    impl Traversal for ItemTraversal {
        type Row = (String, DetailTarget);
        type Detail = String;
        type Record = (String, String);

        fn list_url(&self) -> Option<String> {
            self.list.map(str::to_string)
        }

        fn list_container(&self) -> &str {
            "#items"
        }

        fn row_selector(&self) -> &str {
            "li"
        }

        fn qualifies(&self, row: &Fragment<'_>) -> bool {
            !row.has_class("header")
        }

        fn read_row(&self, row: Fragment<'_>, list_url: &Url) -> Option<Self::Row> {
            let link = row.query("a").first();
            Some((row.text(), fragment_target(link, list_url)))
        }

        fn detail_target(&self, row: &Self::Row, _list_url: &Url) -> DetailTarget {
            row.1.clone()
        }

        fn detail_container(&self) -> &str {
            "#value"
        }

        fn read_detail(&self, page: &Page, _url: &Url) -> String {
            page.first_text("#value").unwrap_or_default()
        }

        fn assemble(&self, row: Self::Row, detail: Option<String>) -> Option<Self::Record> {
            detail.map(|d| (row.0, d))
        }

        fn describe(&self, row: &Self::Row) -> String {
            row.0.clone()
        }
    }

    const LIST: &str = r#"<ul id="items">
        <li class="header">Itens</li>
        <li><a href="/item/1">one</a></li>
        <li><a href="/item/2">two</a></li>
        <li><a href="/item/3">three</a></li>
        <li><a href="/item/4">four</a></li>
        <li><a href="/item/5">five</a></li>
    </ul>"#;

    fn detail(value: &str) -> String {
        format!(r#"<p id="value">{}</p>"#, value)
    }

    fn doc(fetcher: MapFetcher) -> DocumentClient<MapFetcher> {
        DocumentClient::new(fetcher, Url::parse("https://sigaa.test").unwrap(), 16)
    }

    #[tokio::test]
    async fn test_failing_row_is_isolated() {
        let fetcher = MapFetcher::new()
            .page("/list", LIST)
            .page("/item/1", &detail("v1"))
            .page("/item/2", &detail("v2"))
            .status("/item/3", 500, "erro")
            .page("/item/4", &detail("v4"))
            .page("/item/5", &detail("v5"));
        let mut doc = doc(fetcher);

        let report = Navigator::new(&mut doc).traverse(&LISTED).await.unwrap();

        assert_eq!(report.records.len(), 4);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].row, "three");
        assert!(matches!(report.skipped[0].reason, SkipReason::DetailFailed(_)));
        assert_eq!(report.rows_seen, 6);
        assert_eq!(report.rows_filtered, 1);
        assert!(!report.aborted);
        assert_eq!(doc.current_url().unwrap().path(), "/list");
        assert_eq!(doc.depth(), 1);
        assert_eq!(
            report.records.iter().map(|r| r.1.as_str()).collect::<Vec<_>>(),
            vec!["v1", "v2", "v4", "v5"]
        );
    }

    #[tokio::test]
    async fn test_missing_detail_container_is_skipped() {
        let fetcher = MapFetcher::new()
            .page("/list", r#"<ul id="items"><li><a href="/item/1">one</a></li></ul>"#)
            .page("/item/1", "<p>sessão expirada</p>");
        let mut doc = doc(fetcher);

        let report = Navigator::new(&mut doc).traverse(&LISTED).await.unwrap();

        assert!(report.records.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(doc.depth(), 1);
    }

    #[tokio::test]
    async fn test_detail_without_container_keeps_list_position() {
        let fetcher = MapFetcher::new()
            .page("/list", LIST)
            .page("/item/1", &detail("v1"))
            .page("/item/2", &detail("v2"))
            .page("/item/3", "<p>Nenhum registro encontrado</p>")
            .page("/item/4", &detail("v4"))
            .page("/item/5", &detail("v5"));
        let mut doc = doc(fetcher);
        doc.navigate("/list").await.unwrap();
        let list_depth = doc.depth();
        let list_url = doc.current_url().cloned().unwrap();

        let report = Navigator::new(&mut doc)
            .traverse(&ItemTraversal { list: None })
            .await
            .unwrap();

        assert_eq!(report.records.len(), 4);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].row, "three");
        assert!(matches!(
            &report.skipped[0].reason,
            SkipReason::DetailFailed(msg) if msg.contains("#value")
        ));
        assert!(!report.aborted);
        assert_eq!(doc.current_url(), Some(&list_url));
        assert_eq!(doc.depth(), list_depth);
        assert_eq!(
            report.records.iter().map(|r| r.1.as_str()).collect::<Vec<_>>(),
            vec!["v1", "v2", "v4", "v5"]
        );
    }

    #[tokio::test]
    async fn test_missing_list_container_is_structural() {
        let fetcher = MapFetcher::new().page("/list", "<p>manutenção</p>");
        let mut doc = doc(fetcher);

        let err = Navigator::new(&mut doc).traverse(&LISTED).await.unwrap_err();
        assert!(matches!(err, SigaaError::StructuralExtraction { .. }));
    }

    #[tokio::test]
    async fn test_unresolved_target_is_skipped_without_requests() {
        let fetcher = MapFetcher::new().page(
            "/list",
            r##"<ul id="items"><li><a href="#" onclick="return false;">one</a></li></ul>"##,
        );
        let mut doc = doc(fetcher);

        let report = Navigator::new(&mut doc).traverse(&LISTED).await.unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::TargetUnresolved);
        assert_eq!(doc.fetcher().requests(), 1);
    }

    #[tokio::test]
    async fn test_all_rows_filtered() {
        let fetcher = MapFetcher::new().page(
            "/list",
            r#"<ul id="items"><li class="header">a</li><li class="header">b</li></ul>"#,
        );
        let mut doc = doc(fetcher);

        let report = Navigator::new(&mut doc).traverse(&LISTED).await.unwrap();
        assert_eq!(report.rows_seen, 2);
        assert_eq!(report.rows_filtered, 2);
        assert!(report.records.is_empty());
    }

    #[tokio::test]
    async fn test_lost_list_aborts_remaining_rows() {
        // History of two: list + detail; a two-hop detail evicts the list
        struct TwoHop;
        impl Traversal for TwoHop {
            type Row = String;
            type Detail = String;
            type Record = String;
            fn list_url(&self) -> Option<String> {
                Some("/list".to_string())
            }
            fn list_container(&self) -> &str {
                "#items"
            }
            fn row_selector(&self) -> &str {
                "li"
            }
            fn read_row(&self, row: Fragment<'_>, _: &Url) -> Option<String> {
                row.query("a").first().and_then(|a| a.attribute("href")).map(str::to_string)
            }
            fn detail_target(&self, row: &String, list_url: &Url) -> DetailTarget {
                DetailTarget::Url(list_url.join(row).unwrap())
            }
            fn follow_links(&self) -> &[&str] {
                &["a.next"]
            }
            fn detail_container(&self) -> &str {
                "#value"
            }
            fn read_detail(&self, page: &Page, _: &Url) -> String {
                page.first_text("#value").unwrap_or_default()
            }
            fn assemble(&self, _: String, detail: Option<String>) -> Option<String> {
                detail
            }
            fn describe(&self, row: &String) -> String {
                row.clone()
            }
        }

        let fetcher = MapFetcher::new()
            .page("/list", r#"<ul id="items"><li><a href="/a">a</a></li><li><a href="/b">b</a></li></ul>"#)
            .page("/a", r#"<a class="next" href="/a/2">mais</a>"#)
            .page("/a/2", &detail("va"));
        let mut doc = DocumentClient::new(fetcher, Url::parse("https://sigaa.test").unwrap(), 2);

        let report = Navigator::new(&mut doc).traverse(&TwoHop).await.unwrap();

        assert_eq!(report.records, vec!["va".to_string()]);
        assert!(report.aborted);
        assert!(!doc.fetcher().requested().contains(&"GET /b".to_string()));
    }

    #[tokio::test]
    async fn test_traverse_categories_skips_broken_category() {
        let form = r#"<form id="busca" action="/busca" method="post">
                        <input type="hidden" name="javax.faces.ViewState" value="j_id1"/>
                        <select name="depto"><option value="0">--</option></select>
                      </form>"#;
        let fetcher = MapFetcher::new()
            .page("/busca", form)
            .post("/busca", LIST)
            .page("/item/1", &detail("v1"))
            .page("/item/2", &detail("v2"))
            .page("/item/3", &detail("v3"))
            .page("/item/4", &detail("v4"))
            .page("/item/5", &detail("v5"));
        let mut doc = doc(fetcher);

        let categories = vec![
            CategorySelection {
                label: "MAT".to_string(),
                entry: "/busca".to_string(),
                steps: vec![FormStep {
                    form_selector: "form#busca".to_string(),
                    overrides: vec![("depto".to_string(), "11".to_string())],
                }],
            },
            CategorySelection {
                label: "FIS".to_string(),
                entry: "/busca".to_string(),
                steps: vec![FormStep {
                    form_selector: "form#inexistente".to_string(),
                    overrides: Vec::new(),
                }],
            },
        ];

        let report = Navigator::new(&mut doc)
            .traverse_categories(&categories, &ItemTraversal { list: None })
            .await
            .unwrap();

        assert_eq!(report.records.len(), 5);
        assert_eq!(report.categories_skipped, vec!["FIS".to_string()]);
        let forms = doc.fetcher().submitted_forms();
        assert_eq!(forms.len(), 1);
        assert!(forms[0].contains(&("depto".to_string(), "11".to_string())));
        assert!(forms[0].contains(&("javax.faces.ViewState".to_string(), "j_id1".to_string())));
    }

    #[test]
    fn test_link_target_fallbacks() {
        let base = Url::parse("https://sigaa.test/sigaa/lista.jsf").unwrap();
        assert_eq!(
            link_target(Some("detalhe.jsf?id=1"), None, &base),
            DetailTarget::Url(Url::parse("https://sigaa.test/sigaa/detalhe.jsf?id=1").unwrap())
        );
        assert_eq!(
            link_target(Some("#"), Some("window.open('/sigaa/x.jsf','_self')"), &base),
            DetailTarget::Url(Url::parse("https://sigaa.test/sigaa/x.jsf").unwrap())
        );
        assert_eq!(
            link_target(Some("javascript:void(0)"), Some("return false;"), &base),
            DetailTarget::Unresolved
        );
        assert_eq!(link_target(None, None, &base), DetailTarget::Unresolved);
    }
}
