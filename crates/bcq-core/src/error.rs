//! Error taxonomy for bcq.

use thiserror::Error;

/// Core error type for bcq.
#[derive(Error, Debug)]
pub enum BcqError {
    #[error("{message}")]
    Usage {
        message: String,
        hint: Option<String>,
    },

    #[error("{resource} not found: {identifier}")]
    NotFound {
        resource: String,
        identifier: String,
        hint: Option<String>,
    },

    #[error("{message}")]
    Ambiguous {
        message: String,
        candidates: Vec<String>,
        hint: String,
    },

    #[error("{message}")]
    Auth {
        message: String,
        hint: Option<String>,
    },

    #[error("{message}")]
    Forbidden {
        message: String,
        hint: Option<String>,
    },

    #[error("Rate limited")]
    RateLimited { retry_after: Option<u64> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        retryable: bool,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Machine-readable error classification, carried in the error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Usage,
    NotFound,
    Auth,
    Forbidden,
    RateLimit,
    Network,
    Api,
    Ambiguous,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Usage => "usage",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Auth => "auth_required",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::RateLimit => "rate_limit",
            ErrorCode::Network => "network",
            ErrorCode::Api => "api_error",
            ErrorCode::Ambiguous => "ambiguous",
        }
    }

    /// Process exit status for this class of failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCode::Usage => 1,
            ErrorCode::NotFound => 2,
            ErrorCode::Auth => 3,
            ErrorCode::Forbidden => 4,
            ErrorCode::RateLimit => 5,
            ErrorCode::Network => 6,
            ErrorCode::Api => 7,
            ErrorCode::Ambiguous => 8,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BcqError {
    pub fn usage(message: impl Into<String>) -> Self {
        BcqError::Usage {
            message: message.into(),
            hint: None,
        }
    }

    pub fn usage_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        BcqError::Usage {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn not_found(resource: impl Into<String>, identifier: impl Into<String>) -> Self {
        BcqError::NotFound {
            resource: resource.into(),
            identifier: identifier.into(),
            hint: None,
        }
    }

    pub fn not_found_hint(
        resource: impl Into<String>,
        identifier: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        BcqError::NotFound {
            resource: resource.into(),
            identifier: identifier.into(),
            hint: Some(hint.into()),
        }
    }

    /// Name matched several candidates. Short lists are echoed back as suggestions.
    pub fn ambiguous(resource: &str, candidates: Vec<String>) -> Self {
        let hint = if !candidates.is_empty() && candidates.len() <= 5 {
            format!(
                "Did you mean: {}? Use the numeric ID to pick one",
                candidates.join(", ")
            )
        } else {
            format!(
                "Be more specific, or use the numeric ID of one of: {}",
                candidates.join(", ")
            )
        };
        BcqError::Ambiguous {
            message: format!("Ambiguous {}", resource),
            candidates,
            hint,
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        BcqError::Auth {
            message: message.into(),
            hint: Some("Set BASECAMP_TOKEN or add a token to your bcq profile".to_string()),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            BcqError::Usage { .. } => ErrorCode::Usage,
            BcqError::NotFound { .. } => ErrorCode::NotFound,
            BcqError::Ambiguous { .. } => ErrorCode::Ambiguous,
            BcqError::Auth { .. } => ErrorCode::Auth,
            BcqError::Forbidden { .. } => ErrorCode::Forbidden,
            BcqError::RateLimited { .. } => ErrorCode::RateLimit,
            BcqError::Network(_) => ErrorCode::Network,
            BcqError::Api { .. }
            | BcqError::Json(_)
            | BcqError::Io(_)
            | BcqError::Configuration(_) => ErrorCode::Api,
        }
    }

    pub fn hint(&self) -> Option<String> {
        match self {
            BcqError::Usage { hint, .. }
            | BcqError::NotFound { hint, .. }
            | BcqError::Auth { hint, .. }
            | BcqError::Forbidden { hint, .. } => hint.clone(),
            BcqError::Ambiguous { hint, .. } => Some(hint.clone()),
            BcqError::RateLimited {
                retry_after: Some(secs),
            } => Some(format!("Try again in {} seconds", secs)),
            BcqError::RateLimited { retry_after: None } => {
                Some("Try again in a moment".to_string())
            }
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            BcqError::RateLimited { .. } | BcqError::Network(_) => true,
            BcqError::Api { retryable, .. } => *retryable,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BcqError::NotFound { .. })
    }
}

/// Result type alias for bcq operations.
pub type Result<T> = std::result::Result<T, BcqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_classification() {
        assert_eq!(BcqError::usage("x").code().exit_code(), 1);
        assert_eq!(BcqError::not_found("Project", "x").code().exit_code(), 2);
        assert_eq!(BcqError::auth("x").code().exit_code(), 3);
        assert_eq!(
            BcqError::ambiguous("project", vec!["a".into()]).code().exit_code(),
            8
        );
        assert_eq!(BcqError::Configuration("x".into()).code(), ErrorCode::Api);
    }

    #[test]
    fn not_found_message() {
        let err = BcqError::not_found("Project", "Widgets");
        assert_eq!(err.to_string(), "Project not found: Widgets");
        assert!(err.is_not_found());
    }

    #[test]
    fn ambiguous_hint_lists_short_candidate_sets() {
        let err = BcqError::ambiguous("project", vec!["1: Alpha".into(), "2: Alpine".into()]);
        assert_eq!(err.to_string(), "Ambiguous project");
        assert!(err.hint().unwrap().starts_with("Did you mean: 1: Alpha, 2: Alpine?"));
    }

    #[test]
    fn ambiguous_hint_for_long_candidate_sets() {
        let candidates = (0..6).map(|i| format!("P{}", i)).collect();
        let err = BcqError::ambiguous("project", candidates);
        assert!(err.hint().unwrap().starts_with("Be more specific"));
    }

    #[test]
    fn retryable_classification() {
        assert!(BcqError::RateLimited { retry_after: Some(3) }.is_retryable());
        assert!(
            BcqError::Api {
                status: 503,
                message: "down".into(),
                retryable: true
            }
            .is_retryable()
        );
        assert!(!BcqError::usage("bad").is_retryable());
    }
}
