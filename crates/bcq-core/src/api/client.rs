//! reqwest-backed Basecamp client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, LINK, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use super::{BasecampApi, Listing};
use crate::error::{BcqError, Result};
use crate::pagination::ListOptions;

pub const USER_AGENT: &str = concat!("bcq/", env!("CARGO_PKG_VERSION"));

/// Hard stop for runaway pagination.
const MAX_PAGES: usize = 10_000;

/// HTTP client for one Basecamp account.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
    account_id: Option<String>,
    token: Option<SecretString>,
}

/// Error body returned by the API.
#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl HttpClient {
    pub fn new(
        base_url: impl Into<String>,
        account_id: Option<String>,
        token: Option<SecretString>,
    ) -> Result<Self> {
        let inner = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            inner,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            account_id,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the full URL for an account-relative path.
    fn url(&self, path: &str) -> Result<String> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(path.to_string());
        }
        let account = self.account_id.as_deref().ok_or_else(|| {
            BcqError::usage_hint(
                "Account ID required",
                "Pass --account, set BASECAMP_ACCOUNT_ID, or add account_id to your profile",
            )
        })?;
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        Ok(format!("{}/{}{}", self.base_url, account, path))
    }

    /// Adds the bearer token. Requests without one never leave the process.
    fn with_auth(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| BcqError::auth("Not authenticated"))?;
        Ok(builder.bearer_auth(token.expose_secret()))
    }

    async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<reqwest::Response> {
        tracing::debug!(%method, %url, "basecamp request");

        let mut request = self.with_auth(self.inner.request(method.clone(), url))?;
        if let Some(body) = body.filter(|b| !b.is_null()) {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(%status, %url, "basecamp response");

        if status.is_success() {
            return Ok(response);
        }

        let headers = response.headers().clone();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(%status, %url, error = %e, "failed to read error body");
                String::new()
            }
        };
        Err(translate_status(status, &method, url, &headers, &text))
    }

    async fn request_json(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = self.url(path)?;
        let response = self.send(method, &url, body).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl BasecampApi for HttpClient {
    async fn get(&self, path: &str) -> Result<Value> {
        self.request_json(Method::GET, path, None).await
    }

    async fn get_all(&self, path: &str, options: &ListOptions) -> Result<Listing> {
        let max_items = options.max_items();
        let mut listing = Listing::default();
        let mut next = Some(self.url(path)?);
        let mut pages = 0;

        while let Some(url) = next.take() {
            let response = self.send(Method::GET, &url, None).await?;
            let link = next_link(response.headers());
            let page: Vec<Value> = response.json().await?;
            listing.items.extend(page);
            pages += 1;

            if let Some(max) = max_items {
                if listing.items.len() >= max {
                    listing.has_more = listing.items.len() > max || link.is_some();
                    listing.items.truncate(max);
                    break;
                }
            }
            if options.single_page() || pages >= MAX_PAGES {
                listing.has_more = link.is_some();
                break;
            }
            next = link;
        }

        tracing::debug!(path, pages, items = listing.items.len(), "listing fetched");
        Ok(listing)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.request_json(Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.request_json(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.request_json(Method::DELETE, path, None).await?;
        Ok(())
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let url = self.url(url)?;
        let mut response = self.send(Method::GET, &url, None).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::debug!(bytes = written, dest = %dest.display(), "download complete");
        Ok(written)
    }
}

/// Extract the `rel="next"` target from a `Link` header.
pub(crate) fn next_link(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(LINK)?.to_str().ok()?;
    value.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        if !params.split(';').any(|p| p.trim() == r#"rel="next""#) {
            return None;
        }
        let target = target.trim();
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

/// Map a failed response onto the error taxonomy.
pub(crate) fn translate_status(
    status: StatusCode,
    method: &Method,
    url: &str,
    headers: &HeaderMap,
    body: &str,
) -> BcqError {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message));

    match status {
        StatusCode::UNAUTHORIZED => BcqError::Auth {
            message: detail.unwrap_or_else(|| "Authentication failed".to_string()),
            hint: Some("Your token may be expired; set a fresh BASECAMP_TOKEN".to_string()),
        },
        StatusCode::FORBIDDEN => BcqError::Forbidden {
            message: detail.unwrap_or_else(|| "Access denied".to_string()),
            hint: (*method != Method::GET)
                .then(|| "Your token may lack write access to this resource".to_string()),
        },
        StatusCode::NOT_FOUND => BcqError::not_found("Resource", resource_path(url)),
        StatusCode::TOO_MANY_REQUESTS => BcqError::RateLimited {
            retry_after: headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok()),
        },
        s if s.is_server_error() => BcqError::Api {
            status: s.as_u16(),
            message: detail.unwrap_or_else(|| format!("Server error ({})", s.as_u16())),
            retryable: matches!(s.as_u16(), 502..=504),
        },
        s => BcqError::Api {
            status: s.as_u16(),
            message: detail.unwrap_or_else(|| format!("Request failed ({})", s)),
            retryable: false,
        },
    }
}

fn resource_path(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn client(account: Option<&str>) -> HttpClient {
        HttpClient::new(
            "https://3.basecampapi.com/",
            account.map(str::to_string),
            Some(SecretString::from("t0ken".to_string())),
        )
        .unwrap()
    }

    #[test]
    fn url_prefixes_account() {
        let c = client(Some("999"));
        assert_eq!(
            c.url("/projects.json").unwrap(),
            "https://3.basecampapi.com/999/projects.json"
        );
        assert_eq!(
            c.url("buckets/1/todos/2.json").unwrap(),
            "https://3.basecampapi.com/999/buckets/1/todos/2.json"
        );
    }

    #[test]
    fn absolute_urls_pass_through() {
        let c = client(None);
        assert_eq!(
            c.url("https://storage.example.com/blob").unwrap(),
            "https://storage.example.com/blob"
        );
    }

    #[test]
    fn missing_account_is_usage_error() {
        let err = client(None).url("/projects.json").unwrap_err();
        assert_eq!(err.code().as_str(), "usage");
    }

    #[test]
    fn link_header_next() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static(
                r#"<https://x/1/projects.json?page=1>; rel="prev", <https://x/1/projects.json?page=3>; rel="next""#,
            ),
        );
        assert_eq!(
            next_link(&headers).as_deref(),
            Some("https://x/1/projects.json?page=3")
        );
        assert!(next_link(&HeaderMap::new()).is_none());
    }

    #[test]
    fn status_translation() {
        let h = HeaderMap::new();
        let url = "https://x/1/buckets/2/todos/3.json";

        let err = translate_status(StatusCode::NOT_FOUND, &Method::GET, url, &h, "");
        assert_eq!(err.to_string(), "Resource not found: /1/buckets/2/todos/3.json");

        let err = translate_status(StatusCode::FORBIDDEN, &Method::POST, url, &h, "");
        assert!(err.hint().is_some());
        let err = translate_status(StatusCode::FORBIDDEN, &Method::GET, url, &h, "");
        assert!(err.hint().is_none());

        let err = translate_status(StatusCode::BAD_GATEWAY, &Method::GET, url, &h, "");
        assert!(err.is_retryable());
        let err = translate_status(StatusCode::INTERNAL_SERVER_ERROR, &Method::GET, url, &h, "");
        assert!(!err.is_retryable());

        let err = translate_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            &Method::POST,
            url,
            &h,
            r#"{"error": "Content can't be blank"}"#,
        );
        assert_eq!(err.to_string(), "Content can't be blank");
    }

    #[test]
    fn rate_limit_reads_retry_after() {
        let mut h = HeaderMap::new();
        h.insert(RETRY_AFTER, HeaderValue::from_static("12"));
        let err = translate_status(StatusCode::TOO_MANY_REQUESTS, &Method::GET, "u", &h, "");
        assert!(matches!(err, BcqError::RateLimited { retry_after: Some(12) }));
    }
}
