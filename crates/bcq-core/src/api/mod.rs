//! Access to the Basecamp REST API.
//!
//! Commands talk to [`BasecampApi`] only, so the HTTP client can be swapped
//! for an in-memory fake in tests.

mod client;

pub use client::{HttpClient, USER_AGENT};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

use crate::error::Result;
use crate::pagination::ListOptions;

/// Items collected from a (possibly multi-page) listing.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub items: Vec<Value>,
    /// More items exist beyond what was collected.
    pub has_more: bool,
}

/// Operations against one Basecamp account.
///
/// Paths are account-relative (`/projects.json`); absolute URLs are used as-is.
#[async_trait]
pub trait BasecampApi: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value>;

    /// GET a listing, following pagination as `options` allows.
    async fn get_all(&self, path: &str, options: &ListOptions) -> Result<Listing>;

    async fn post(&self, path: &str, body: &Value) -> Result<Value>;

    async fn put(&self, path: &str, body: &Value) -> Result<Value>;

    async fn delete(&self, path: &str) -> Result<()>;

    /// Stream a file to `dest`, returning the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Decode a raw API value into a model.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

/// Decode every item of a listing.
pub fn decode_all<T: DeserializeOwned>(items: Vec<Value>) -> Result<Vec<T>> {
    items.into_iter().map(decode).collect()
}

/// Append URL-encoded query parameters to a path.
pub fn with_query(path: &str, params: &[(&str, &str)]) -> String {
    let query: Vec<String> = params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect();
    if query.is_empty() {
        path.to_string()
    } else {
        let sep = if path.contains('?') { '&' } else { '?' };
        format!("{}{}{}", path, sep, query.join("&"))
    }
}
