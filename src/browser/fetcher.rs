//! HTTP fetcher implementation
//!
//! This module handles all HTTP traffic for the portal client, including:
//! - Building the HTTP client with a cookie store and the configured user agent
//! - GET requests for documents and binary attachments
//! - Form-urlencoded POST submissions
//! - Error classification into transport and status failures

use crate::config::TransportConfig;
use crate::{Result, SigaaError};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// A fetched document
#[derive(Debug, Clone)]
pub struct Response {
    /// Final URL after redirects
    pub url: Url,
    /// HTTP status code
    pub status: u16,
    /// Decoded body
    pub body: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport seam under the document client
///
/// Implementations keep whatever cookie state the portal hands out, so a
/// login performed through one call is visible to every later call.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches a document; non-2xx responses are returned, not raised
    async fn get(&self, url: &Url) -> Result<Response>;

    /// Submits form-urlencoded fields
    async fn post_form(&self, url: &Url, fields: &[(String, String)]) -> Result<Response>;

    /// Downloads raw bytes; non-2xx is an error
    async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>>;

    /// Releases transport resources
    async fn close(&self) -> Result<()>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The transport configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sigaa_crawler::config::TransportConfig;
/// use sigaa_crawler::browser::build_http_client;
///
/// let client = build_http_client(&TransportConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &TransportConfig) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        // JSF navigation relies on post/redirect/get
        .redirect(Policy::limited(10))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// `Fetcher` backed by a cookie-keeping `reqwest::Client`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    async fn read(url: &Url, response: reqwest::Response) -> Result<Response> {
        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| transport(url, e))?;

        tracing::debug!("{} {} ({} bytes)", status, final_url, body.len());

        Ok(Response {
            url: final_url,
            status,
            body,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &Url) -> Result<Response> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport(url, e))?;
        Self::read(url, response).await
    }

    async fn post_form(&self, url: &Url, fields: &[(String, String)]) -> Result<Response> {
        let response = self
            .client
            .post(url.clone())
            .form(fields)
            .send()
            .await
            .map_err(|e| transport(url, e))?;
        Self::read(url, response).await
    }

    async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SigaaError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| transport(url, e))?;
        Ok(bytes.to_vec())
    }

    async fn close(&self) -> Result<()> {
        // Connections are pooled inside the client and released on drop
        Ok(())
    }
}

fn transport(url: &Url, source: reqwest::Error) -> SigaaError {
    if source.is_timeout() {
        tracing::warn!("Request timeout: {}", url);
    } else if source.is_connect() {
        tracing::warn!("Connection failed: {}", url);
    }
    SigaaError::Transport {
        url: url.to_string(),
        source,
    }
}
