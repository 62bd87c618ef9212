//! Lineup markers. These are account-wide, so no project is needed.

use clap::Subcommand;
use serde_json::{json, Map, Value};

use bcq_core::dateparse;
use bcq_core::{BcqError, Result};

use super::{id_of, text};
use crate::app::{numeric, App};
use crate::output::Envelope;

#[derive(Subcommand, Debug)]
pub enum LineupCommands {
    /// Create a marker
    Create {
        /// Marker name
        name: Option<String>,

        /// Marker date (YYYY-MM-DD, "next friday", "+7", ...)
        date: Option<String>,
    },

    /// Rename or move a marker
    Update {
        /// Marker ID
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        date: Option<String>,
    },

    /// Delete a marker
    Delete {
        /// Marker ID
        id: String,
    },
}

pub async fn handle_lineup_command(app: &App, cmd: LineupCommands) -> Result<Envelope> {
    match cmd {
        LineupCommands::Create { name, date } => {
            create_marker(app, name.as_deref(), date.as_deref()).await
        }
        LineupCommands::Update { id, name, date } => {
            update_marker(app, &id, name.as_deref(), date.as_deref()).await
        }
        LineupCommands::Delete { id } => delete_marker(app, &id).await,
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

async fn create_marker(app: &App, name: Option<&str>, date: Option<&str>) -> Result<Envelope> {
    let name = present(name).ok_or_else(|| BcqError::usage("Marker name is required"))?;
    let date = present(date).ok_or_else(|| BcqError::usage("Marker date is required"))?;
    let date = dateparse::parse_from(date, app.today);

    let marker = app
        .api
        .post("/lineup/markers.json", &json!({ "name": name, "date": date }))
        .await?;
    let marker_id = id_of(&marker);
    let summary = format!("Created lineup marker #{}: {} on {}", marker_id, name, date);

    Ok(Envelope::new(marker, summary)
        .breadcrumb(
            "update",
            format!("bcq lineup update {} --date <date>", marker_id),
            "Move marker",
        )
        .breadcrumb(
            "delete",
            format!("bcq lineup delete {}", marker_id),
            "Delete marker",
        ))
}

async fn update_marker(
    app: &App,
    id: &str,
    name: Option<&str>,
    date: Option<&str>,
) -> Result<Envelope> {
    let id = numeric(id, "marker ID")?;
    let name = present(name);
    let date = present(date);
    if name.is_none() && date.is_none() {
        return Err(BcqError::usage("Provide --name and/or --date to update"));
    }

    let mut body = Map::new();
    if let Some(name) = name {
        body.insert("name".into(), json!(name));
    }
    if let Some(date) = date {
        body.insert("date".into(), json!(dateparse::parse_from(date, app.today)));
    }

    let marker = app
        .api
        .put(&format!("/lineup/markers/{}.json", id), &Value::Object(body))
        .await?;
    let label = match text(&marker, "name") {
        "" => name.unwrap_or_default().to_string(),
        n => n.to_string(),
    };
    let summary = format!("Updated lineup marker #{}: {}", id, label);

    Ok(Envelope::new(marker, summary).breadcrumb(
        "delete",
        format!("bcq lineup delete {}", id),
        "Delete marker",
    ))
}

async fn delete_marker(app: &App, id: &str) -> Result<Envelope> {
    let id = numeric(id, "marker ID")?;
    app.api
        .delete(&format!("/lineup/markers/{}.json", id))
        .await?;
    Ok(Envelope::new(
        json!({ "id": id, "deleted": true }),
        format!("Deleted lineup marker #{}", id),
    ))
}
