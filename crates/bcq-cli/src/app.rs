//! Per-invocation application context.
//!
//! Built once in `main` and passed by reference to every command handler.

use chrono::{Local, NaiveDate};
use std::sync::Arc;

use bcq_core::api::{BasecampApi, HttpClient};
use bcq_core::completion::CompletionCache;
use bcq_core::dock;
use bcq_core::ids::is_numeric_id;
use bcq_core::models::ToolKind;
use bcq_core::names::{parse_id, Resolved, Resolver};
use bcq_core::pagination::{validate_pagination, ListOptions};
use bcq_core::{BcqError, Result};

use crate::commands::PaginationArgs;
use crate::config::ResolvedConfig;

pub struct App {
    pub config: ResolvedConfig,
    pub api: Arc<dyn BasecampApi>,
    pub names: Resolver,
    pub completion: Option<CompletionCache>,
    /// Global `--project/--in` value, unresolved.
    pub project: Option<String>,
    /// Reference day for overdue checks and relative dates.
    pub today: NaiveDate,
}

impl App {
    pub fn new(
        config: ResolvedConfig,
        project: Option<String>,
        api: Arc<dyn BasecampApi>,
        completion: Option<CompletionCache>,
    ) -> Self {
        let names = Resolver::new(api.clone(), completion.clone());
        Self {
            config,
            api,
            names,
            completion,
            project,
            today: Local::now().date_naive(),
        }
    }

    /// Context backed by the real HTTP client and the user's completion cache.
    pub fn connect(config: ResolvedConfig, project: Option<String>) -> Result<Self> {
        let client = HttpClient::new(
            &config.base_url,
            config.account_id.clone(),
            config.token.clone(),
        )?;
        Ok(Self::new(
            config,
            project,
            Arc::new(client),
            CompletionCache::default_location(),
        ))
    }

    /// Project for a command: an ID taken from the command's own argument
    /// (usually a URL) first, then `--project`, then the configured default.
    pub async fn resolve_project(&self, local: Option<&str>) -> Result<Resolved> {
        let token = local
            .or(self.project.as_deref())
            .or(self.config.project_id.as_deref())
            .filter(|t| !t.trim().is_empty());

        match token {
            Some(token) => self.names.resolve_project(token).await,
            None => Err(BcqError::usage_hint(
                "Project required",
                "Use --in <project> or set project_id in .bcq/config.huml",
            )),
        }
    }

    /// Dock tool ID. A numeric `explicit` value is used as-is without
    /// fetching the project.
    pub async fn tool_id(
        &self,
        project_id: &str,
        kind: ToolKind,
        explicit: Option<&str>,
    ) -> Result<String> {
        if let Some(id) = explicit.filter(|e| is_numeric_id(e)) {
            return Ok(id.to_string());
        }
        let id = dock::find_tool_id(self.api.as_ref(), project_id, kind, explicit).await?;
        Ok(id.to_string())
    }

    /// Todolist for a command: the flag, then the configured default.
    pub async fn resolve_todolist(
        &self,
        flag: Option<&str>,
        project_id: &str,
    ) -> Result<Option<Resolved>> {
        let token = flag.or(self.config.todolist_id.as_deref());
        match token {
            Some(token) => Ok(Some(self.names.resolve_todolist(token, project_id).await?)),
            None => Ok(None),
        }
    }

    /// Person IDs for `--assignee` values.
    pub async fn assignee_ids(&self, tokens: &[String]) -> Result<Vec<i64>> {
        self.names.resolve_people(tokens).await
    }

    pub fn today_str(&self) -> String {
        self.today.format("%Y-%m-%d").to_string()
    }
}

/// Validate pagination flags and translate them, with `default` items
/// fetched when no flag is given.
pub fn list_options(args: &PaginationArgs, default: Option<usize>) -> Result<ListOptions> {
    let intent = validate_pagination(args.all, args.limit, args.page)?;
    let options = intent.to_list_options();
    Ok(match default {
        Some(n) if options == ListOptions::default() => ListOptions::limit(n),
        _ => options,
    })
}

/// Numeric ID for paths and request bodies, with a usage error naming what
/// was expected. Signs and surrounding text are rejected.
pub fn numeric(value: &str, what: &str) -> Result<i64> {
    let invalid = || BcqError::usage(format!("Invalid {}: {}", what, value));
    if !is_numeric_id(value) {
        return Err(invalid());
    }
    parse_id(value).map_err(|_| invalid())
}
