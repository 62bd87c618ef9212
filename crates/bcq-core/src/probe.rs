//! Finding out what kind of Docs & Files item an ID refers to.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::api::BasecampApi;
use crate::error::{BcqError, Result};

/// Items stored in a project's Docs & Files vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Vault,
    Upload,
    Document,
}

impl ItemKind {
    /// Order in which kinds are tried when the type is unknown.
    pub const PROBE_ORDER: [ItemKind; 3] = [ItemKind::Vault, ItemKind::Upload, ItemKind::Document];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Vault => "vault",
            ItemKind::Upload => "upload",
            ItemKind::Document => "document",
        }
    }

    /// Collection segment in API paths.
    pub fn collection(&self) -> &'static str {
        match self {
            ItemKind::Vault => "vaults",
            ItemKind::Upload => "uploads",
            ItemKind::Document => "documents",
        }
    }

    pub fn path(&self, project_id: &str, id: &str) -> String {
        format!("/buckets/{}/{}/{}.json", project_id, self.collection(), id)
    }

    /// Field carrying the item's display title.
    pub fn title_field(&self) -> &'static str {
        match self {
            ItemKind::Upload => "filename",
            ItemKind::Vault | ItemKind::Document => "title",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = BcqError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "vault" | "folder" => Ok(ItemKind::Vault),
            "upload" | "file" => Ok(ItemKind::Upload),
            "document" | "doc" => Ok(ItemKind::Document),
            _ => Err(BcqError::usage_hint(
                format!("Invalid type: {}", s),
                "Use vault, upload or document",
            )),
        }
    }
}

/// Try each kind in order and return the first that exists.
///
/// When every probe fails, the first probe's error wins unless it was a
/// not-found, so auth and permission failures are not hidden behind a 404.
pub async fn probe(
    api: &dyn BasecampApi,
    project_id: &str,
    id: &str,
    kinds: &[ItemKind],
) -> Result<(ItemKind, Value)> {
    let mut first_error: Option<BcqError> = None;

    for kind in kinds {
        tracing::debug!(%kind, id, "probing item");
        match api.get(&kind.path(project_id, id)).await {
            Ok(value) => return Ok((*kind, value)),
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }

    match first_error {
        Some(err) if !err.is_not_found() => Err(err),
        _ => Err(BcqError::not_found_hint(
            "Item",
            id,
            "Specify --type if needed",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_aliases() {
        assert_eq!("folder".parse::<ItemKind>().unwrap(), ItemKind::Vault);
        assert_eq!("File".parse::<ItemKind>().unwrap(), ItemKind::Upload);
        assert_eq!("doc".parse::<ItemKind>().unwrap(), ItemKind::Document);
        assert!("image".parse::<ItemKind>().is_err());
    }

    #[test]
    fn paths() {
        assert_eq!(ItemKind::Upload.path("1", "2"), "/buckets/1/uploads/2.json");
        assert_eq!(ItemKind::PROBE_ORDER[0], ItemKind::Vault);
    }
}
