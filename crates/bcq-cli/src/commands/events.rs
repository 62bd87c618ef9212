//! Recording audit trail.

use clap::Args;
use serde_json::Value;

use bcq_core::urlarg::extract_with_project;
use bcq_core::{BcqError, Result};

use super::{truncation_notice, PaginationArgs};
use crate::app::{list_options, App};
use crate::output::Envelope;

#[derive(Args, Debug)]
pub struct EventsArgs {
    /// Recording ID or URL (todo, message, card, ...)
    pub recording: Option<String>,

    #[command(flatten)]
    pub pagination: PaginationArgs,
}

pub async fn handle_events_command(app: &App, args: EventsArgs) -> Result<Envelope> {
    let arg = args
        .recording
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| BcqError::usage_hint("Recording ID required", "bcq events <id|url>"))?;
    let options = list_options(&args.pagination, None)?;

    let (recording_id, url_project) = extract_with_project(arg);
    let project = app.resolve_project(url_project.as_deref()).await?;

    let listing = app
        .api
        .get_all(
            &format!(
                "/buckets/{}/recordings/{}/events.json",
                project.id, recording_id
            ),
            &options,
        )
        .await?;
    let notice = truncation_notice(&listing);
    let summary = format!(
        "{} events for recording #{}",
        listing.items.len(),
        recording_id
    );

    Ok(Envelope::new(Value::Array(listing.items), summary)
        .breadcrumb(
            "timeline",
            format!("bcq timeline --in {}", project.id),
            "View project timeline",
        )
        .notice(notice))
}
