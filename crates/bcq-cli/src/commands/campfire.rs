//! Campfire (chat) commands.

use clap::{Args, Subcommand};
use serde_json::{json, Value};

use bcq_core::dock;
use bcq_core::models::ToolKind;
use bcq_core::pagination::ListOptions;
use bcq_core::ids::is_numeric_id;
use bcq_core::urlarg::{self, ParsedUrl};
use bcq_core::{BcqError, Result};

use super::{id_of, plural, text, truncation_notice, PaginationArgs};
use crate::app::{list_options, App};
use crate::output::Envelope;

/// Messages shown by `campfire messages` without pagination flags.
const DEFAULT_MESSAGES: usize = 25;

/// `bcq campfire` with an action, or the `<id> [messages|post <text>]`
/// shorthand. No arguments lists the project's campfires.
#[derive(Args, Debug)]
pub struct CampfireArgs {
    #[command(subcommand)]
    pub command: Option<CampfireCommands>,

    /// Campfire ID followed by `messages` or `post <text>`
    #[arg(value_name = "CAMPFIRE_ID")]
    pub shorthand: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum CampfireCommands {
    /// List campfires in a project
    List {
        /// List every campfire in the account
        #[arg(long)]
        all: bool,
    },

    /// Show recent messages
    Messages {
        /// Campfire ID or title, when the project has several
        #[arg(long)]
        campfire: Option<String>,

        #[command(flatten)]
        pagination: PaginationArgs,
    },

    /// Post a message
    Post {
        /// Message text (sent as-is)
        content: Option<String>,

        /// Campfire ID or title, when the project has several
        #[arg(long)]
        campfire: Option<String>,
    },

    /// Show a single line
    Line {
        /// Line ID or URL
        id: String,

        #[arg(long)]
        campfire: Option<String>,
    },

    /// Delete a line
    Delete {
        /// Line ID or URL
        id: String,

        #[arg(long)]
        campfire: Option<String>,
    },
}

pub async fn handle_campfire_command(app: &App, args: CampfireArgs) -> Result<Envelope> {
    match args.command {
        Some(cmd) => run_action(app, cmd).await,
        None => run_shorthand(app, &args.shorthand).await,
    }
}

async fn run_shorthand(app: &App, args: &[String]) -> Result<Envelope> {
    let Some((id, rest)) = args.split_first() else {
        return list_campfires(app, false).await;
    };
    if !is_numeric_id(id) {
        return Err(BcqError::usage_hint(
            format!("Unknown campfire command \"{}\"", id),
            "bcq campfire <id> messages | bcq campfire <id> post \"message\"",
        ));
    }

    match rest {
        [action, content @ ..] if action == "post" => {
            post_message(app, content.first().map(String::as_str), Some(id)).await
        }
        _ => list_messages(app, Some(id), &PaginationArgs::default()).await,
    }
}

async fn run_action(app: &App, cmd: CampfireCommands) -> Result<Envelope> {
    match cmd {
        CampfireCommands::List { all } => list_campfires(app, all).await,
        CampfireCommands::Messages {
            campfire,
            pagination,
        } => list_messages(app, campfire.as_deref(), &pagination).await,
        CampfireCommands::Post { content, campfire } => {
            post_message(app, content.as_deref(), campfire.as_deref()).await
        }
        CampfireCommands::Line { id, campfire } => show_line(app, &id, campfire.as_deref()).await,
        CampfireCommands::Delete { id, campfire } => {
            delete_line(app, &id, campfire.as_deref()).await
        }
    }
}

async fn list_campfires(app: &App, all: bool) -> Result<Envelope> {
    if all {
        let listing = app.api.get_all("/chats.json", &ListOptions::all()).await?;
        let summary = plural(listing.items.len(), "campfire");
        return Ok(Envelope::new(Value::Array(listing.items), summary).breadcrumb(
            "messages",
            "bcq campfire messages --campfire <id> --in <project>",
            "View messages",
        ));
    }

    let project = app.resolve_project(None).await?;
    let details = dock::fetch_project(app.api.as_ref(), &project.id).await?;
    let campfires: Vec<Value> = details
        .dock
        .iter()
        .filter(|e| e.enabled && e.name == ToolKind::Chat.as_str())
        .map(|e| json!({"id": e.id, "title": e.title}))
        .collect();

    let summary = plural(campfires.len(), "campfire");
    Ok(Envelope::new(Value::Array(campfires), summary)
        .breadcrumb(
            "messages",
            format!("bcq campfire messages --in {}", project.id),
            "View messages",
        )
        .breadcrumb(
            "post",
            format!("bcq campfire post \"message\" --in {}", project.id),
            "Post message",
        ))
}

async fn list_messages(
    app: &App,
    campfire: Option<&str>,
    pagination: &PaginationArgs,
) -> Result<Envelope> {
    let options = list_options(pagination, Some(DEFAULT_MESSAGES))?;
    let project = app.resolve_project(None).await?;
    let campfire_id = app.tool_id(&project.id, ToolKind::Chat, campfire).await?;

    let listing = app
        .api
        .get_all(
            &format!("/buckets/{}/chats/{}/lines.json", project.id, campfire_id),
            &options,
        )
        .await?;
    let notice = truncation_notice(&listing);
    let summary = plural(listing.items.len(), "message");

    Ok(Envelope::new(Value::Array(listing.items), summary)
        .breadcrumb(
            "post",
            format!(
                "bcq campfire post \"message\" --campfire {} --in {}",
                campfire_id, project.id
            ),
            "Post message",
        )
        .breadcrumb(
            "more",
            format!(
                "bcq campfire messages --limit 50 --campfire {} --in {}",
                campfire_id, project.id
            ),
            "Load more",
        )
        .notice(notice))
}

async fn post_message(app: &App, content: Option<&str>, campfire: Option<&str>) -> Result<Envelope> {
    let content = content.filter(|c| !c.trim().is_empty()).ok_or_else(|| {
        BcqError::usage_hint("Message content required", "bcq campfire post \"message\"")
    })?;

    let project = app.resolve_project(None).await?;
    let campfire_id = app.tool_id(&project.id, ToolKind::Chat, campfire).await?;

    let line = app
        .api
        .post(
            &format!("/buckets/{}/chats/{}/lines.json", project.id, campfire_id),
            &json!({ "content": content }),
        )
        .await?;

    let summary = format!("Posted message #{}", id_of(&line));
    Ok(Envelope::new(line, summary)
        .breadcrumb(
            "messages",
            format!(
                "bcq campfire messages --campfire {} --in {}",
                campfire_id, project.id
            ),
            "View messages",
        )
        .breadcrumb(
            "post",
            format!(
                "bcq campfire post \"reply\" --campfire {} --in {}",
                campfire_id, project.id
            ),
            "Post another",
        ))
}

/// Line ID, plus the campfire and project when `arg` is a line URL.
fn line_target(arg: &str) -> (String, Option<String>, Option<String>) {
    match urlarg::parse(arg) {
        Some(ParsedUrl {
            recording_id: Some(id),
            parent_id,
            project_id,
            ..
        }) => (id, parent_id, project_id),
        _ => (arg.to_string(), None, None),
    }
}

async fn show_line(app: &App, arg: &str, campfire: Option<&str>) -> Result<Envelope> {
    let (line_id, url_campfire, url_project) = line_target(arg);
    let project = app.resolve_project(url_project.as_deref()).await?;
    let campfire = campfire.or(url_campfire.as_deref());
    let campfire_id = app.tool_id(&project.id, ToolKind::Chat, campfire).await?;

    let line = app
        .api
        .get(&format!(
            "/buckets/{}/chats/{}/lines/{}.json",
            project.id, campfire_id, line_id
        ))
        .await?;

    let author = line
        .get("creator")
        .map(|c| text(c, "name"))
        .filter(|n| !n.is_empty())
        .unwrap_or("unknown");
    let summary = format!("Line #{} by {}", line_id, author);

    Ok(Envelope::new(line, summary)
        .breadcrumb(
            "delete",
            format!(
                "bcq campfire delete {} --campfire {} --in {}",
                line_id, campfire_id, project.id
            ),
            "Delete line",
        )
        .breadcrumb(
            "messages",
            format!(
                "bcq campfire messages --campfire {} --in {}",
                campfire_id, project.id
            ),
            "Back to messages",
        ))
}

async fn delete_line(app: &App, arg: &str, campfire: Option<&str>) -> Result<Envelope> {
    let (line_id, url_campfire, url_project) = line_target(arg);
    let project = app.resolve_project(url_project.as_deref()).await?;
    let campfire = campfire.or(url_campfire.as_deref());
    let campfire_id = app.tool_id(&project.id, ToolKind::Chat, campfire).await?;

    app.api
        .delete(&format!(
            "/buckets/{}/chats/{}/lines/{}.json",
            project.id, campfire_id, line_id
        ))
        .await?;

    Ok(Envelope::new(
        json!({ "id": line_id, "deleted": true }),
        format!("Deleted line #{}", line_id),
    )
    .breadcrumb(
        "messages",
        format!(
            "bcq campfire messages --campfire {} --in {}",
            campfire_id, project.id
        ),
        "Back to messages",
    ))
}
