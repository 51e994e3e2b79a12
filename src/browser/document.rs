//! Stateful document client
//!
//! Wraps a [`Fetcher`] with the notion of a "current document" and a bounded
//! history stack, which is what lets the navigator walk from a list page into
//! detail pages and back without re-fetching the list.

use crate::browser::fetcher::{Fetcher, Response};
use crate::browser::form::FormFields;
use crate::query::Page;
use crate::{Result, SigaaError};
use url::Url;

/// One loaded document
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub url: Url,
    pub content: String,
}

/// Current document plus back-navigation history
pub struct DocumentClient<F> {
    fetcher: F,
    base: Url,
    history: Vec<Snapshot>,
    history_limit: usize,
    depth: usize,
    requests: usize,
}

impl<F: Fetcher> DocumentClient<F> {
    /// Creates a client rooted at `base` (scheme and host of the portal)
    pub fn new(fetcher: F, base: Url, history_limit: usize) -> Self {
        Self {
            fetcher,
            base,
            history: Vec::new(),
            history_limit: history_limit.max(1),
            depth: 0,
            requests: 0,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Loads `target` and makes it the current document
    ///
    /// Relative targets resolve against the base origin, absolute URLs are
    /// used as-is. A non-2xx answer leaves the current document untouched.
    pub async fn navigate(&mut self, target: &str) -> Result<()> {
        let url = self.base.join(target)?;
        self.navigate_url(&url).await
    }

    pub async fn navigate_url(&mut self, url: &Url) -> Result<()> {
        tracing::debug!("Navigating to {}", url);
        self.requests += 1;
        let response = self.fetcher.get(url).await?;
        self.accept(url, response)
    }

    /// Posts form fields to `target`; the answer becomes the current document
    pub async fn submit_form(&mut self, target: &str, fields: &[(String, String)]) -> Result<()> {
        let url = self.resolve(target)?;
        tracing::debug!("Submitting {} fields to {}", fields.len(), url);
        self.requests += 1;
        let response = self.fetcher.post_form(&url, fields).await?;
        self.accept(&url, response)
    }

    /// Re-submits a form of the current document with some fields replaced
    ///
    /// Hidden state such as the JSF view state is carried over, which is
    /// what makes multi-step selections work against the portal.
    pub async fn submit_page_form(
        &mut self,
        form_selector: &str,
        overrides: &[(String, String)],
    ) -> Result<()> {
        let form = {
            let page = self.page();
            FormFields::read(&page, form_selector)
        };

        let Some(mut form) = form else {
            return Err(SigaaError::StructuralExtraction {
                url: self.current_url().map(Url::to_string).unwrap_or_default(),
                container: form_selector.to_string(),
            });
        };

        for (name, value) in overrides {
            form.set(name, value);
        }

        let target = match &form.action {
            Some(action) => action.clone(),
            None => self
                .current_url()
                .map(Url::to_string)
                .unwrap_or_else(|| self.base.to_string()),
        };

        self.submit_form(&target, &form.fields).await
    }

    fn accept(&mut self, requested: &Url, response: Response) -> Result<()> {
        if !response.is_success() {
            tracing::debug!("{} answered {}", requested, response.status);
            return Err(SigaaError::HttpStatus {
                url: requested.to_string(),
                status: response.status,
            });
        }

        self.history.push(Snapshot {
            url: response.url,
            content: response.body,
        });
        if self.history.len() > self.history_limit {
            self.history.remove(0);
        }
        self.depth += 1;
        Ok(())
    }

    /// Returns to the previous document; `false` when there is none
    pub fn back(&mut self) -> bool {
        if self.history.len() < 2 {
            return false;
        }
        self.history.pop();
        self.depth = self.depth.saturating_sub(1);
        true
    }

    /// Number of documents loaded and not yet undone by `back()`
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn current_url(&self) -> Option<&Url> {
        self.history.last().map(|s| &s.url)
    }

    /// Raw markup of the current document (empty before the first load)
    pub fn content(&self) -> &str {
        self.history
            .last()
            .map(|s| s.content.as_str())
            .unwrap_or_default()
    }

    /// Parses the current document
    pub fn page(&self) -> Page {
        Page::parse(self.content())
    }

    /// True when the current document contains `selector`
    pub fn has(&self, selector: &str) -> bool {
        self.page().has(selector)
    }

    /// Resolves an href against the current document
    pub fn resolve(&self, href: &str) -> Result<Url> {
        let base = self.current_url().unwrap_or(&self.base);
        Ok(base.join(href)?)
    }

    /// Fetches `path` and reports its status without touching history
    pub async fn probe(&mut self, path: &str) -> Result<u16> {
        let url = self.base.join(path)?;
        self.requests += 1;
        let response = self.fetcher.get(&url).await?;
        Ok(response.status)
    }

    /// Downloads binary content relative to the current document
    pub async fn fetch_bytes(&mut self, target: &str) -> Result<Vec<u8>> {
        let url = self.resolve(target)?;
        self.requests += 1;
        self.fetcher.get_bytes(&url).await
    }

    /// Requests issued through this client so far
    pub fn requests_issued(&self) -> usize {
        self.requests
    }

    /// Drops history and releases the transport
    ///
    /// Never fails; secondary errors are only logged.
    pub async fn close(&mut self) {
        self.history.clear();
        self.depth = 0;
        if let Err(e) = self.fetcher.close().await {
            tracing::warn!("Error while closing transport: {}", e);
        }
    }
}
