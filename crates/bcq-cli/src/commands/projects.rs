//! Project commands.

use clap::{Subcommand, ValueEnum};
use serde_json::{json, Map, Value};

use bcq_core::api::{decode_all, with_query};
use bcq_core::models::Project;
use bcq_core::urlarg::extract_project_id;
use bcq_core::{BcqError, Result};

use super::{id_of, plural, text, truncation_notice, PaginationArgs};
use crate::app::{list_options, App};
use crate::output::Envelope;

#[derive(Subcommand, Debug)]
pub enum ProjectsCommands {
    /// List projects
    List {
        /// List archived or trashed projects instead of active ones
        #[arg(long, value_enum)]
        status: Option<ProjectStatus>,

        #[command(flatten)]
        pagination: PaginationArgs,
    },

    /// Show a project and its tools
    Show {
        /// Project ID, name or URL
        project: String,
    },

    /// Create a project
    Create {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Rename a project or change its description
    Update {
        /// Project ID, name or URL
        project: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Move a project to the trash
    Delete {
        /// Project ID, name or URL
        project: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStatus {
    Archived,
    Trashed,
}

impl ProjectStatus {
    fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Archived => "archived",
            ProjectStatus::Trashed => "trashed",
        }
    }
}

pub async fn handle_projects_command(app: &App, cmd: ProjectsCommands) -> Result<Envelope> {
    match cmd {
        ProjectsCommands::List { status, pagination } => {
            list_projects(app, status, &pagination).await
        }
        ProjectsCommands::Show { project } => show_project(app, &project).await,
        ProjectsCommands::Create { name, description } => {
            create_project(app, name.as_deref(), description.as_deref()).await
        }
        ProjectsCommands::Update {
            project,
            name,
            description,
        } => update_project(app, &project, name, description).await,
        ProjectsCommands::Delete { project } => delete_project(app, &project).await,
    }
}

async fn list_projects(
    app: &App,
    status: Option<ProjectStatus>,
    pagination: &PaginationArgs,
) -> Result<Envelope> {
    let options = list_options(pagination, None)?;
    let path = match status {
        Some(s) => with_query("/projects.json", &[("status", s.as_str())]),
        None => "/projects.json".to_string(),
    };
    let listing = app.api.get_all(&path, &options).await?;

    // Only a complete listing of active projects is worth caching
    if status.is_none() && !listing.has_more {
        if let Some(cache) = &app.completion {
            match decode_all::<Project>(listing.items.clone()) {
                Ok(projects) => cache.refresh_projects(&projects),
                Err(e) => tracing::debug!(error = %e, "not caching projects"),
            }
        }
    }

    let notice = truncation_notice(&listing);
    let summary = match status {
        Some(s) => format!("{} ({})", plural(listing.items.len(), "project"), s.as_str()),
        None => plural(listing.items.len(), "project"),
    };
    Ok(Envelope::new(Value::Array(listing.items), summary)
        .breadcrumb("show", "bcq projects show <id>", "Show project details")
        .breadcrumb(
            "todos",
            "bcq todos list --in <project>",
            "List todos in a project",
        )
        .notice(notice))
}

async fn resolve(app: &App, arg: &str) -> Result<String> {
    let token = extract_project_id(arg);
    Ok(app.names.resolve_project(&token).await?.id)
}

async fn show_project(app: &App, arg: &str) -> Result<Envelope> {
    let project_id = resolve(app, arg).await?;
    let project = app
        .api
        .get(&format!("/projects/{}.json", project_id))
        .await?;

    let summary = match text(&project, "name") {
        "" => format!("Project #{}", project_id),
        name => name.to_string(),
    };
    Ok(Envelope::new(project, summary)
        .breadcrumb(
            "todos",
            format!("bcq todos list --in {}", project_id),
            "List todos",
        )
        .breadcrumb(
            "timeline",
            format!("bcq timeline --in {}", project_id),
            "Recent activity",
        ))
}

async fn create_project(
    app: &App,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<Envelope> {
    let name = name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| BcqError::usage("--name is required"))?;

    let mut body = Map::new();
    body.insert("name".into(), json!(name));
    if let Some(description) = description {
        body.insert("description".into(), json!(description));
    }

    let project = app.api.post("/projects.json", &Value::Object(body)).await?;
    let project_id = id_of(&project);

    Ok(
        Envelope::new(project, format!("Created project: {}", name)).breadcrumb(
            "show",
            format!("bcq projects show {}", project_id),
            "Show project",
        ),
    )
}

async fn update_project(
    app: &App,
    arg: &str,
    name: Option<String>,
    description: Option<String>,
) -> Result<Envelope> {
    if name.is_none() && description.is_none() {
        return Err(BcqError::usage(
            "At least one of --name or --description is required",
        ));
    }
    let project_id = resolve(app, arg).await?;
    let path = format!("/projects/{}.json", project_id);

    // The API wants a name on every update
    let name = match name {
        Some(n) => n,
        None => text(&app.api.get(&path).await?, "name").to_string(),
    };
    let mut body = Map::new();
    body.insert("name".into(), json!(name));
    if let Some(description) = description {
        body.insert("description".into(), json!(description));
    }

    let project = app.api.put(&path, &Value::Object(body)).await?;
    Ok(
        Envelope::new(project, format!("Updated project #{}", project_id)).breadcrumb(
            "show",
            format!("bcq projects show {}", project_id),
            "Show project",
        ),
    )
}

async fn delete_project(app: &App, arg: &str) -> Result<Envelope> {
    let project_id = resolve(app, arg).await?;
    app.api
        .delete(&format!("/projects/{}.json", project_id))
        .await?;

    Ok(Envelope::new(
        json!({ "id": project_id, "status": "trashed" }),
        format!("Trashed project #{}", project_id),
    )
    .notice(Some(
        "Trashed projects can be restored from the Basecamp web UI".to_string(),
    )))
}
