//! Basecamp web URLs accepted wherever an ID is expected.
//!
//! Users can paste a URL straight from the browser:
//!
//! - `https://3.basecamp.com/{account}/buckets/{bucket}/{type}/{id}`
//! - `https://3.basecamp.com/{account}/buckets/{bucket}/{type}/{id}#__recording_{comment}`
//! - `https://3.basecamp.com/{account}/buckets/{bucket}/card_tables/cards/{id}`
//! - `https://3.basecamp.com/{account}/buckets/{bucket}/chats/{chat}/lines/{id}`
//! - `https://3.basecamp.com/{account}/projects/{project}`

use regex_lite::Regex;
use std::sync::LazyLock;
use url::Url;

static BUCKET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(\d+)/buckets/(\d+)/([a-z_]+(?:/[a-z_]+)?)/(\d+)$").expect("valid bucket regex")
});
static NESTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(\d+)/buckets/(\d+)/([a-z_]+)/(\d+)/([a-z_]+)/(\d+)$").expect("valid nested regex")
});
static PROJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(\d+)/projects/(\d+)$").expect("valid project regex"));
static ACCOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(\d+)$").expect("valid account regex"));

/// Components extracted from a Basecamp URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedUrl {
    pub account_id: String,
    /// Bucket ID in API terms.
    pub project_id: Option<String>,
    /// Recording type path, e.g. `todos`, `messages`, `card_tables/cards`,
    /// `chats/lines`.
    pub kind: Option<String>,
    /// Container of a nested recording, e.g. the chat a line belongs to.
    pub parent_id: Option<String>,
    pub recording_id: Option<String>,
    pub comment_id: Option<String>,
}

/// Parse a Basecamp URL. Returns `None` for anything else, including bare IDs.
pub fn parse(input: &str) -> Option<ParsedUrl> {
    let url = Url::parse(input.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let comment_id = url
        .fragment()
        .and_then(|f| f.strip_prefix("__recording_"))
        .filter(|id| crate::ids::is_numeric_id(id))
        .map(str::to_string);

    let path = url.path().trim_end_matches('/');

    if let Some(caps) = BUCKET_RE.captures(path) {
        return Some(ParsedUrl {
            account_id: caps[1].to_string(),
            project_id: Some(caps[2].to_string()),
            kind: Some(caps[3].to_string()),
            recording_id: Some(caps[4].to_string()),
            comment_id,
            ..Default::default()
        });
    }

    if let Some(caps) = NESTED_RE.captures(path) {
        return Some(ParsedUrl {
            account_id: caps[1].to_string(),
            project_id: Some(caps[2].to_string()),
            kind: Some(format!("{}/{}", &caps[3], &caps[5])),
            parent_id: Some(caps[4].to_string()),
            recording_id: Some(caps[6].to_string()),
            comment_id,
        });
    }

    if let Some(caps) = PROJECT_RE.captures(path) {
        return Some(ParsedUrl {
            account_id: caps[1].to_string(),
            project_id: Some(caps[2].to_string()),
            ..Default::default()
        });
    }

    ACCOUNT_RE.captures(path).map(|caps| ParsedUrl {
        account_id: caps[1].to_string(),
        ..Default::default()
    })
}

/// Primary ID of an argument: recording, then project, then account.
/// Non-URL arguments are returned unchanged.
pub fn extract_id(arg: &str) -> String {
    match parse(arg) {
        Some(parsed) => parsed
            .recording_id
            .or(parsed.project_id)
            .unwrap_or(parsed.account_id),
        None => arg.to_string(),
    }
}

/// Project (bucket) ID of an argument, or the argument itself.
pub fn extract_project_id(arg: &str) -> String {
    parse(arg)
        .and_then(|p| p.project_id)
        .unwrap_or_else(|| arg.to_string())
}

/// Recording ID plus the project it lives in, when the argument is a URL.
pub fn extract_with_project(arg: &str) -> (String, Option<String>) {
    match parse(arg) {
        Some(parsed) => {
            let id = parsed
                .recording_id
                .clone()
                .unwrap_or_else(|| arg.to_string());
            (id, parsed.project_id)
        }
        None => (arg.to_string(), None),
    }
}

/// Like [`extract_with_project`], but prefers the `#__recording_N` comment ID.
pub fn extract_comment_with_project(arg: &str) -> (String, Option<String>) {
    match parse(arg) {
        Some(ParsedUrl {
            comment_id: Some(comment),
            project_id,
            ..
        }) => (comment, project_id),
        _ => extract_with_project(arg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recording_url() {
        let p = parse("https://3.basecamp.com/999/buckets/123/todos/456").unwrap();
        assert_eq!(p.account_id, "999");
        assert_eq!(p.project_id.as_deref(), Some("123"));
        assert_eq!(p.kind.as_deref(), Some("todos"));
        assert_eq!(p.recording_id.as_deref(), Some("456"));
        assert!(p.comment_id.is_none());
    }

    #[test]
    fn parses_comment_fragment() {
        let p = parse("https://3.basecamp.com/999/buckets/123/messages/456#__recording_789")
            .unwrap();
        assert_eq!(p.comment_id.as_deref(), Some("789"));
        assert_eq!(
            extract_comment_with_project(
                "https://3.basecamp.com/999/buckets/123/messages/456#__recording_789"
            ),
            ("789".to_string(), Some("123".to_string()))
        );
    }

    #[test]
    fn parses_card_url() {
        let p = parse("https://3.basecamp.com/999/buckets/123/card_tables/cards/42").unwrap();
        assert_eq!(p.kind.as_deref(), Some("card_tables/cards"));
        assert_eq!(p.recording_id.as_deref(), Some("42"));
    }

    #[test]
    fn parses_campfire_line_url() {
        let p = parse("https://3.basecamp.com/999/buckets/123/chats/77/lines/456").unwrap();
        assert_eq!(p.project_id.as_deref(), Some("123"));
        assert_eq!(p.kind.as_deref(), Some("chats/lines"));
        assert_eq!(p.parent_id.as_deref(), Some("77"));
        assert_eq!(p.recording_id.as_deref(), Some("456"));
        assert_eq!(
            extract_with_project("https://3.basecamp.com/999/buckets/123/chats/77/lines/456"),
            ("456".to_string(), Some("123".to_string()))
        );
    }

    #[test]
    fn parses_project_url() {
        let url = "https://3.basecamp.com/999/projects/123";
        assert_eq!(extract_project_id(url), "123");
        assert_eq!(extract_id(url), "123");
    }

    #[test]
    fn plain_arguments_pass_through() {
        assert!(parse("456").is_none());
        assert!(parse("ftp://3.basecamp.com/1/projects/2").is_none());
        assert_eq!(extract_id("456"), "456");
        assert_eq!(extract_with_project("456"), ("456".to_string(), None));
    }

    #[test]
    fn extract_with_project_from_url() {
        assert_eq!(
            extract_with_project("https://3.basecamp.com/999/buckets/123/uploads/5/"),
            ("5".to_string(), Some("123".to_string()))
        );
    }
}
