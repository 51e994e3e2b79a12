//! In-memory fetcher used by unit tests

use crate::browser::fetcher::{Fetcher, Response};
use crate::{Result, SigaaError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

/// Serves canned documents keyed by method and path (plus query)
#[derive(Debug, Default)]
pub struct MapFetcher {
    routes: HashMap<String, (u16, String)>,
    log: Mutex<Vec<String>>,
    forms: Mutex<Vec<Vec<(String, String)>>>,
}

impl MapFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, path: &str, body: &str) -> Self {
        self.routes
            .insert(format!("GET {}", path), (200, body.to_string()));
        self
    }

    pub fn status(mut self, path: &str, status: u16, body: &str) -> Self {
        self.routes
            .insert(format!("GET {}", path), (status, body.to_string()));
        self
    }

    pub fn post(mut self, path: &str, body: &str) -> Self {
        self.routes
            .insert(format!("POST {}", path), (200, body.to_string()));
        self
    }

    /// Number of requests served so far
    pub fn requests(&self) -> usize {
        self.log.lock().map(|log| log.len()).unwrap_or(0)
    }

    /// Requests in the order they were served, as `METHOD path`
    pub fn requested(&self) -> Vec<String> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Bodies of every submitted form
    pub fn submitted_forms(&self) -> Vec<Vec<(String, String)>> {
        self.forms.lock().map(|f| f.clone()).unwrap_or_default()
    }

    fn serve(&self, method: &str, url: &Url) -> Response {
        let key = format!("{} {}", method, path_and_query(url));
        if let Ok(mut log) = self.log.lock() {
            log.push(key.clone());
        }
        let (status, body) = self
            .routes
            .get(&key)
            .cloned()
            .unwrap_or((404, String::new()));
        Response {
            url: url.clone(),
            status,
            body,
        }
    }
}

fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

#[async_trait]
impl Fetcher for MapFetcher {
    async fn get(&self, url: &Url) -> Result<Response> {
        Ok(self.serve("GET", url))
    }

    async fn post_form(&self, url: &Url, fields: &[(String, String)]) -> Result<Response> {
        if let Ok(mut forms) = self.forms.lock() {
            forms.push(fields.to_vec());
        }
        Ok(self.serve("POST", url))
    }

    async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self.serve("GET", url);
        if !response.is_success() {
            return Err(SigaaError::HttpStatus {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(response.body.into_bytes())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
