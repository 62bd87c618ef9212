//! Output envelope and rendering.
//!
//! Every command returns an [`Envelope`]. It is printed as JSON for scripts
//! and agents, or styled for a terminal. Errors go through [`ErrorEnvelope`]
//! so consumers only ever parse one shape.

use bcq_core::{BcqError, ErrorCode};
use console::{style, Term};
use serde::Serialize;
use serde_json::Value;

/// A suggested follow-up command.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Breadcrumb {
    pub action: String,
    pub cmd: String,
    pub description: String,
}

/// Successful command result.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub ok: bool,
    pub data: Value,
    pub summary: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl Envelope {
    pub fn new(data: Value, summary: impl Into<String>) -> Self {
        Self {
            ok: true,
            data,
            summary: summary.into(),
            breadcrumbs: Vec::new(),
            notice: None,
        }
    }

    pub fn breadcrumb(
        mut self,
        action: impl Into<String>,
        cmd: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.breadcrumbs.push(Breadcrumb {
            action: action.into(),
            cmd: cmd.into(),
            description: description.into(),
        });
        self
    }

    pub fn notice(mut self, notice: Option<String>) -> Self {
        self.notice = notice;
        self
    }
}

/// Failed command result.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

impl ErrorEnvelope {
    /// Classify any error. Anything that is not a [`BcqError`] is an API error.
    pub fn from_error(err: &anyhow::Error) -> (Self, i32) {
        match err.downcast_ref::<BcqError>() {
            Some(bcq) => {
                let code = bcq.code();
                (
                    Self {
                        ok: false,
                        error: bcq.to_string(),
                        code: code.as_str(),
                        hint: bcq.hint(),
                        retryable: bcq.is_retryable(),
                    },
                    code.exit_code(),
                )
            }
            None => (
                Self {
                    ok: false,
                    error: format!("{:#}", err),
                    code: ErrorCode::Api.as_str(),
                    hint: None,
                    retryable: false,
                },
                ErrorCode::Api.exit_code(),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Json,
    Styled,
}

impl OutputMode {
    /// JSON when forced or when stdout is not a terminal.
    pub fn detect(force_json: bool) -> Self {
        if force_json || !Term::stdout().is_term() {
            OutputMode::Json
        } else {
            OutputMode::Styled
        }
    }
}

pub fn render(envelope: &Envelope, mode: OutputMode) {
    match mode {
        OutputMode::Json => print_json(envelope),
        OutputMode::Styled => render_styled(envelope),
    }
}

/// Print the error and return the process exit code.
pub fn render_error(err: &anyhow::Error, mode: OutputMode) -> i32 {
    let (envelope, exit_code) = ErrorEnvelope::from_error(err);
    match mode {
        OutputMode::Json => print_json(&envelope),
        OutputMode::Styled => {
            print_error(&envelope.error);
            if let Some(hint) = &envelope.hint {
                eprintln!("  {}", style(hint).dim());
            }
        }
    }
    exit_code
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output: {}", e),
    }
}

fn render_styled(envelope: &Envelope) {
    print_success(&envelope.summary);

    match &envelope.data {
        Value::Array(items) if !items.is_empty() => print_items(items),
        Value::Object(map) => {
            print_empty();
            for (key, value) in map {
                print_key_value(key, &scalar(value));
            }
        }
        _ => {}
    }

    if let Some(notice) = &envelope.notice {
        print_empty();
        print_warning(notice);
    }

    if !envelope.breadcrumbs.is_empty() {
        print_section("Next");
        for crumb in &envelope.breadcrumbs {
            println!("  {:<36} {}", style(&crumb.cmd).cyan(), style(&crumb.description).dim());
        }
    }
}

fn print_items(items: &[Value]) {
    print_empty();
    print_table_header(&[("ID", 12), ("TITLE", 60)]);
    for item in items {
        let id = item.get("id").map(scalar).unwrap_or_default();
        let title = ["title", "name", "content", "filename", "summary", "action"]
            .iter()
            .find_map(|k| item.get(*k).and_then(Value::as_str))
            .unwrap_or("-");
        print_table_row(&[(&id, 12), (title, 60)]);
    }
}

/// One-line rendering of a JSON value.
fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(a) => format!("[{} items]", a.len()),
        Value::Object(o) => o
            .get("name")
            .or_else(|| o.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| "{…}".to_string()),
        other => other.to_string(),
    }
}

/// Prints a table header with the given columns.
pub fn print_table_header(columns: &[(&str, usize)]) {
    let header: String = columns
        .iter()
        .map(|(name, width)| format!("{:<width$}", name, width = width))
        .collect::<Vec<_>>()
        .join(" ");
    println!("{}", style(header).bold());

    let total_width: usize = columns.iter().map(|(_, w)| w + 1).sum();
    println!("{}", "-".repeat(total_width.saturating_sub(1)));
}

/// Prints a table row, truncating long values on a character boundary.
pub fn print_table_row(values: &[(&str, usize)]) {
    let row: String = values
        .iter()
        .map(|(val, width)| {
            if val.chars().count() > *width {
                let cut: String = val.chars().take(width.saturating_sub(3)).collect();
                format!("{}...", cut)
            } else {
                format!("{:<width$}", val, width = width)
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    println!("{}", row);
}

/// Prints a key-value pair with consistent formatting.
pub fn print_key_value(key: &str, value: &str) {
    println!("{:<20}{}", format!("{}:", key), value);
}

/// Prints a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", style(title).bold().underlined());
}

pub fn print_empty() {
    println!();
}

pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", style("⚠").yellow(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", style("✗").red(), message);
}
