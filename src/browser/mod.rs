//! Structured document client
//!
//! This module handles everything between the portal and the query layer:
//! - The `Fetcher` transport seam and its cookie-keeping HTTP implementation
//! - The stateful `DocumentClient` (current document, history, back)
//! - Reading and re-submitting HTML forms, including JSF view state

mod document;
mod fetcher;
mod form;

#[cfg(test)]
pub(crate) mod testing;

pub use document::{DocumentClient, Snapshot};
pub use fetcher::{build_http_client, Fetcher, HttpFetcher, Response};
pub use form::{FormFields, VIEW_STATE_FIELD};
