//! In-memory [`BasecampApi`] for tests.
//!
//! Routes are registered up front; every request is recorded so tests can
//! assert exactly which calls a command made (or that it made none).

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::api::{BasecampApi, Listing};
use crate::error::{BcqError, Result};
use crate::pagination::ListOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

/// One recorded request.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub verb: Verb,
    pub path: String,
    pub body: Option<Value>,
}

/// Canned failure for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    NotFound,
    Forbidden,
    Unauthorized,
    ServerError,
}

impl Failure {
    fn to_error(self, path: &str) -> BcqError {
        match self {
            Failure::NotFound => BcqError::not_found("Resource", path),
            Failure::Forbidden => BcqError::Forbidden {
                message: "Access denied".to_string(),
                hint: None,
            },
            Failure::Unauthorized => BcqError::auth("Authentication failed"),
            Failure::ServerError => BcqError::Api {
                status: 500,
                message: "Server error (500)".to_string(),
                retryable: false,
            },
        }
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Json(Value),
    Fail(Failure),
}

/// Recording fake. Unregistered routes answer like a 404.
#[derive(Debug, Default)]
pub struct FakeApi {
    routes: HashMap<(Verb, String), Reply>,
    calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, verb: Verb, path: &str, value: Value) -> Self {
        self.routes.insert((verb, path.to_string()), Reply::Json(value));
        self
    }

    pub fn on_get(self, path: &str, value: Value) -> Self {
        self.on(Verb::Get, path, value)
    }

    pub fn on_post(self, path: &str, value: Value) -> Self {
        self.on(Verb::Post, path, value)
    }

    pub fn on_put(self, path: &str, value: Value) -> Self {
        self.on(Verb::Put, path, value)
    }

    pub fn on_delete(self, path: &str) -> Self {
        self.on(Verb::Delete, path, Value::Null)
    }

    pub fn fail(mut self, verb: Verb, path: &str, failure: Failure) -> Self {
        self.routes
            .insert((verb, path.to_string()), Reply::Fail(failure));
        self
    }

    fn log(&self) -> MutexGuard<'_, Vec<Call>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log().clone()
    }

    /// Calls other than GET.
    pub fn mutations(&self) -> Vec<Call> {
        self.log()
            .iter()
            .filter(|c| c.verb != Verb::Get)
            .cloned()
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.log().len()
    }

    fn respond(&self, verb: Verb, path: &str, body: Option<&Value>) -> Result<Value> {
        self.log().push(Call {
            verb,
            path: path.to_string(),
            body: body.cloned(),
        });
        match self.routes.get(&(verb, path.to_string())) {
            Some(Reply::Json(v)) => Ok(v.clone()),
            Some(Reply::Fail(f)) => Err(f.to_error(path)),
            None => Err(Failure::NotFound.to_error(path)),
        }
    }
}

#[async_trait]
impl BasecampApi for FakeApi {
    async fn get(&self, path: &str) -> Result<Value> {
        self.respond(Verb::Get, path, None)
    }

    async fn get_all(&self, path: &str, options: &ListOptions) -> Result<Listing> {
        let value = self.respond(Verb::Get, path, None)?;
        let mut items = match value {
            Value::Array(items) => items,
            other => {
                return Err(BcqError::Api {
                    status: 200,
                    message: format!("Expected a JSON array from {}, got {}", path, other),
                    retryable: false,
                });
            }
        };
        let mut has_more = false;
        if let Some(max) = options.max_items() {
            has_more = items.len() > max;
            items.truncate(max);
        }
        Ok(Listing { items, has_more })
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.respond(Verb::Post, path, Some(body))
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.respond(Verb::Put, path, Some(body))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.respond(Verb::Delete, path, None).map(|_| ())
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let content = self.respond(Verb::Get, url, None)?;
        let bytes = content.as_str().unwrap_or_default().as_bytes().to_vec();
        tokio::fs::write(dest, &bytes).await?;
        Ok(bytes.len() as u64)
    }
}
