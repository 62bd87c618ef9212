//! CLI command implementations.
//!
//! Each handler follows the same path: check local flags, resolve the
//! project and any named IDs, call the API, then shape an [`Envelope`].
//!
//! [`Envelope`]: crate::output::Envelope

pub mod auth;
pub mod campfire;
pub mod cards;
pub mod config;
pub mod events;
pub mod files;
pub mod lineup;
pub mod messagetypes;
pub mod profile;
pub mod projects;
pub mod timeline;
pub mod todos;

use bcq_core::api::Listing;
use clap::Args;
use serde_json::Value;

/// `--all`, `--limit` and `--page`, shared by list commands.
#[derive(Args, Debug, Clone, Default)]
pub struct PaginationArgs {
    /// Fetch every page
    #[arg(long)]
    pub all: bool,

    /// Maximum number of items to fetch
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Fetch a single page (only 1 is supported)
    #[arg(long)]
    pub page: Option<u32>,
}

/// Notice attached to listings that were cut short.
pub(crate) fn truncation_notice(listing: &Listing) -> Option<String> {
    listing.has_more.then(|| {
        format!(
            "Showing the first {} results; use --all to fetch everything",
            listing.items.len()
        )
    })
}

/// String field of a JSON object, or an empty string.
pub(crate) fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// `id` of a JSON object rendered for summaries.
pub(crate) fn id_of(value: &Value) -> String {
    match value.get("id") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => "?".to_string(),
    }
}

pub(crate) fn plural(n: usize, singular: &str) -> String {
    if n == 1 {
        format!("{} {}", n, singular)
    } else {
        format!("{} {}s", n, singular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn notice_only_when_truncated() {
        let full = Listing {
            items: vec![json!({})],
            has_more: false,
        };
        assert!(truncation_notice(&full).is_none());

        let cut = Listing {
            items: vec![json!({}), json!({})],
            has_more: true,
        };
        assert!(truncation_notice(&cut).unwrap().contains("first 2"));
    }

    #[test]
    fn ids_and_plurals() {
        assert_eq!(id_of(&json!({"id": 42})), "42");
        assert_eq!(id_of(&json!({"id": "7"})), "7");
        assert_eq!(id_of(&json!({})), "?");
        assert_eq!(plural(1, "todo"), "1 todo");
        assert_eq!(plural(3, "todo"), "3 todos");
    }
}
