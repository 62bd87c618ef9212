//! Message board categories ("message types").

use clap::Subcommand;
use serde_json::{json, Map, Value};

use bcq_core::pagination::ListOptions;
use bcq_core::{BcqError, Result};

use super::{id_of, plural, text};
use crate::app::{numeric, App};
use crate::output::Envelope;

#[derive(Subcommand, Debug)]
pub enum MessagetypesCommands {
    /// List message types in a project
    List,

    /// Show a message type
    Show { id: String },

    /// Create a message type
    Create {
        /// Type name
        name: Option<String>,

        /// Emoji icon
        #[arg(long)]
        icon: Option<String>,
    },

    /// Rename a message type or change its icon
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        icon: Option<String>,
    },

    /// Delete a message type
    Delete { id: String },
}

pub async fn handle_messagetypes_command(
    app: &App,
    cmd: MessagetypesCommands,
) -> Result<Envelope> {
    match cmd {
        MessagetypesCommands::List => list_types(app).await,
        MessagetypesCommands::Show { id } => show_type(app, &id).await,
        MessagetypesCommands::Create { name, icon } => {
            create_type(app, name.as_deref(), icon.as_deref()).await
        }
        MessagetypesCommands::Update { id, name, icon } => {
            update_type(app, &id, name.as_deref(), icon.as_deref()).await
        }
        MessagetypesCommands::Delete { id } => delete_type(app, &id).await,
    }
}

fn category_path(project_id: &str, id: i64) -> String {
    format!("/buckets/{}/categories/{}.json", project_id, id)
}

async fn list_types(app: &App) -> Result<Envelope> {
    let project = app.resolve_project(None).await?;
    let listing = app
        .api
        .get_all(
            &format!("/buckets/{}/categories.json", project.id),
            &ListOptions::all(),
        )
        .await?;

    let summary = plural(listing.items.len(), "message type");
    Ok(
        Envelope::new(Value::Array(listing.items), summary).breadcrumb(
            "create",
            format!("bcq messagetypes create \"Name\" --icon 📢 --in {}", project.id),
            "Create message type",
        ),
    )
}

async fn show_type(app: &App, id: &str) -> Result<Envelope> {
    let id = numeric(id, "message type ID")?;
    let project = app.resolve_project(None).await?;
    let category = app.api.get(&category_path(&project.id, id)).await?;
    let summary = format!("{} {}", text(&category, "icon"), text(&category, "name"));

    Ok(Envelope::new(category, summary.trim().to_string()).breadcrumb(
        "update",
        format!("bcq messagetypes update {} --name <name> --in {}", id, project.id),
        "Update message type",
    ))
}

async fn create_type(app: &App, name: Option<&str>, icon: Option<&str>) -> Result<Envelope> {
    let name = name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| BcqError::usage("Name is required"))?;
    let icon = icon
        .filter(|i| !i.trim().is_empty())
        .ok_or_else(|| BcqError::usage("--icon is required"))?;
    let project = app.resolve_project(None).await?;

    let category = app
        .api
        .post(
            &format!("/buckets/{}/categories.json", project.id),
            &json!({ "name": name, "icon": icon }),
        )
        .await?;
    let summary = format!("Created message type #{}: {} {}", id_of(&category), icon, name);

    Ok(Envelope::new(category, summary).breadcrumb(
        "list",
        format!("bcq messagetypes list --in {}", project.id),
        "List message types",
    ))
}

async fn update_type(
    app: &App,
    id: &str,
    name: Option<&str>,
    icon: Option<&str>,
) -> Result<Envelope> {
    let id = numeric(id, "message type ID")?;
    if name.is_none() && icon.is_none() {
        return Err(BcqError::usage("Use --name or --icon to update"));
    }
    let project = app.resolve_project(None).await?;

    let mut body = Map::new();
    if let Some(name) = name {
        body.insert("name".into(), json!(name));
    }
    if let Some(icon) = icon {
        body.insert("icon".into(), json!(icon));
    }

    let category = app
        .api
        .put(&category_path(&project.id, id), &Value::Object(body))
        .await?;
    Ok(Envelope::new(category, format!("Updated message type #{}", id)))
}

async fn delete_type(app: &App, id: &str) -> Result<Envelope> {
    let id = numeric(id, "message type ID")?;
    let project = app.resolve_project(None).await?;
    app.api.delete(&category_path(&project.id, id)).await?;
    Ok(Envelope::new(
        json!({ "id": id, "deleted": true }),
        format!("Deleted message type #{}", id),
    ))
}
