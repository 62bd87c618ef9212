//! Pagination flag validation.
//!
//! `--all`, `--limit` and `--page` are checked here before any request is made.

use crate::error::{BcqError, Result};

/// Items fetched by a list command when no pagination flag is given.
pub const DEFAULT_LIMIT: usize = 100;

/// What the user asked for, after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationIntent {
    /// No flag: capped at [`DEFAULT_LIMIT`].
    Default,
    /// `--all`: follow every page.
    All,
    /// `--limit N`.
    Limit(usize),
    /// `--page 1`: the first page only.
    FirstPage,
}

/// List options in the shape the API client consumes.
///
/// `limit == -1` fetches everything, `limit > 0` caps the item count, and
/// `page == 1` stops after the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListOptions {
    pub limit: i64,
    pub page: u32,
}

impl ListOptions {
    pub const ALL: i64 = -1;

    pub fn all() -> Self {
        Self {
            limit: Self::ALL,
            page: 0,
        }
    }

    pub fn limit(n: usize) -> Self {
        Self {
            limit: n as i64,
            page: 0,
        }
    }

    pub fn first_page() -> Self {
        Self { limit: 0, page: 1 }
    }

    pub fn fetches_all(&self) -> bool {
        self.limit == Self::ALL
    }

    /// Maximum number of items to collect, `None` meaning unbounded.
    pub fn max_items(&self) -> Option<usize> {
        match self.limit {
            Self::ALL => None,
            n if n > 0 => Some(n as usize),
            _ if self.page == 1 => None,
            _ => Some(DEFAULT_LIMIT),
        }
    }

    pub fn single_page(&self) -> bool {
        self.page == 1
    }
}

/// Validate the raw flag values. Pure: no I/O, no state.
pub fn validate_pagination(
    all: bool,
    limit: Option<usize>,
    page: Option<u32>,
) -> Result<PaginationIntent> {
    let limit = limit.filter(|n| *n > 0);
    let page = page.filter(|p| *p > 0);

    if all && limit.is_some() {
        return Err(BcqError::usage("--all and --limit are mutually exclusive"));
    }
    if page.is_some() && (all || limit.is_some()) {
        return Err(BcqError::usage(
            "--page cannot be combined with --all or --limit",
        ));
    }
    if let Some(p) = page.filter(|p| *p > 1) {
        return Err(BcqError::usage_hint(
            format!("--page {} is not supported", p),
            "Only the first page can be requested; use --all to fetch everything",
        ));
    }

    Ok(match (all, limit, page) {
        (true, _, _) => PaginationIntent::All,
        (_, Some(n), _) => PaginationIntent::Limit(n),
        (_, _, Some(_)) => PaginationIntent::FirstPage,
        _ => PaginationIntent::Default,
    })
}

impl PaginationIntent {
    pub fn to_list_options(self) -> ListOptions {
        match self {
            PaginationIntent::Default => ListOptions::default(),
            PaginationIntent::All => ListOptions::all(),
            PaginationIntent::Limit(n) => ListOptions::limit(n),
            PaginationIntent::FirstPage => ListOptions::first_page(),
        }
    }
}
