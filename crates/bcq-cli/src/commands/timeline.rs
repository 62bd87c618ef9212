//! Activity timelines: account-wide, per project or per person.

use clap::Args;
use serde_json::Value;

use bcq_core::pagination::ListOptions;
use bcq_core::{BcqError, Result};

use super::text;
use crate::app::App;
use crate::output::Envelope;

#[derive(Args, Debug)]
pub struct TimelineArgs {
    /// "me" for your own activity
    pub who: Option<String>,

    /// Person ID, name or email
    #[arg(long)]
    pub person: Option<String>,
}

pub async fn handle_timeline_command(app: &App, args: TimelineArgs) -> Result<Envelope> {
    if let Some(who) = args.who.as_deref().filter(|w| *w != "me") {
        return Err(BcqError::usage_hint(
            format!("Invalid argument \"{}\"", who),
            "Only \"me\" is supported as a positional argument. Use --person <name> for other people.",
        ));
    }
    if args.person.is_some() && app.project.is_some() {
        return Err(BcqError::usage(
            "--person and --project are mutually exclusive",
        ));
    }

    if args.who.is_some() {
        return person_timeline(app, "me").await;
    }
    if let Some(person) = &args.person {
        return person_timeline(app, person).await;
    }
    if app.project.is_some() {
        return project_timeline(app).await;
    }
    account_timeline(app).await
}

async fn account_timeline(app: &App) -> Result<Envelope> {
    let listing = app
        .api
        .get_all("/reports/progress.json", &ListOptions::default())
        .await?;

    let summary = format!("{} recent events", listing.items.len());
    Ok(Envelope::new(Value::Array(listing.items), summary)
        .breadcrumb(
            "project",
            "bcq timeline --in <project>",
            "View project timeline",
        )
        .breadcrumb("person", "bcq timeline me", "View your activity"))
}

async fn project_timeline(app: &App) -> Result<Envelope> {
    let project = app.resolve_project(None).await?;
    let listing = app
        .api
        .get_all(
            &format!("/buckets/{}/timeline.json", project.id),
            &ListOptions::default(),
        )
        .await?;

    let summary = match &project.name {
        Some(name) => format!("{} events in {}", listing.items.len(), name),
        None => format!("{} events in project #{}", listing.items.len(), project.id),
    };
    Ok(Envelope::new(Value::Array(listing.items), summary)
        .breadcrumb("account", "bcq timeline", "View account-wide timeline")
        .breadcrumb(
            "project",
            format!("bcq projects show {}", project.id),
            "View project details",
        ))
}

async fn person_timeline(app: &App, token: &str) -> Result<Envelope> {
    let person = app.names.resolve_person(token).await?;
    let report = app
        .api
        .get(&format!("/reports/users/progress/{}.json", person.id))
        .await?;

    let display = report
        .get("person")
        .map(|p| text(p, "name").to_string())
        .filter(|n| !n.is_empty())
        .or_else(|| person.name.clone());
    let events = match report.get("events") {
        Some(Value::Array(events)) => events.clone(),
        _ => Vec::new(),
    };

    let summary = match display {
        Some(name) => format!("{} events for {}", events.len(), name),
        None => format!("{} events for person #{}", events.len(), person.id),
    };
    Ok(Envelope::new(Value::Array(events), summary)
        .breadcrumb("account", "bcq timeline", "View account-wide timeline"))
}
