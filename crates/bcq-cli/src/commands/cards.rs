//! Card table commands.

use clap::Subcommand;
use serde_json::{json, Map, Value};

use bcq_core::api::decode;
use bcq_core::dateparse;
use bcq_core::ids::is_numeric_id;
use bcq_core::models::{CardTable, ToolKind};
use bcq_core::pagination::ListOptions;
use bcq_core::urlarg::extract_with_project;
use bcq_core::{BcqError, Result};

use super::{id_of, plural, text, truncation_notice, PaginationArgs};
use crate::app::{list_options, numeric, App};
use crate::output::Envelope;

#[derive(Subcommand, Debug)]
pub enum CardsCommands {
    /// List cards in a card table or a single column
    List {
        /// Card table ID or title, when the project has several
        #[arg(long)]
        card_table: Option<String>,

        /// Column ID or exact name
        #[arg(long)]
        column: Option<String>,

        #[command(flatten)]
        pagination: PaginationArgs,
    },

    /// Show a card
    Show {
        /// Card ID or URL
        id: String,
    },

    /// Create a card
    Create {
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        /// Column ID or exact name (defaults to the first column)
        #[arg(long)]
        column: Option<String>,

        #[arg(long)]
        card_table: Option<String>,

        /// Due date (YYYY-MM-DD, "tomorrow", "friday", ...)
        #[arg(long)]
        due: Option<String>,

        /// Assignee: "me", ID, name or email (repeatable)
        #[arg(long)]
        assignee: Vec<String>,
    },

    /// Update a card
    Update {
        /// Card ID or URL
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[arg(long)]
        due: Option<String>,

        #[arg(long)]
        assignee: Vec<String>,
    },

    /// Move a card to another column
    Move {
        /// Card ID or URL
        id: String,

        /// Target column ID or exact name
        #[arg(long)]
        to: Option<String>,

        #[arg(long)]
        card_table: Option<String>,
    },

    /// List columns with their IDs
    Columns {
        #[arg(long)]
        card_table: Option<String>,
    },
}

pub async fn handle_cards_command(app: &App, cmd: CardsCommands) -> Result<Envelope> {
    match cmd {
        CardsCommands::List {
            card_table,
            column,
            pagination,
        } => list_cards(app, card_table.as_deref(), column.as_deref(), &pagination).await,
        CardsCommands::Show { id } => show_card(app, &id).await,
        CardsCommands::Create {
            title,
            content,
            column,
            card_table,
            due,
            assignee,
        } => {
            let fields = CardFields {
                title,
                content,
                due,
                assignees: assignee,
            };
            create_card(app, fields, column.as_deref(), card_table.as_deref()).await
        }
        CardsCommands::Update {
            id,
            title,
            content,
            due,
            assignee,
        } => {
            let fields = CardFields {
                title,
                content,
                due,
                assignees: assignee,
            };
            update_card(app, &id, fields).await
        }
        CardsCommands::Move { id, to, card_table } => {
            move_card(app, &id, to.as_deref(), card_table.as_deref()).await
        }
        CardsCommands::Columns { card_table } => list_columns(app, card_table.as_deref()).await,
    }
}

/// Editable card attributes.
struct CardFields {
    title: Option<String>,
    content: Option<String>,
    due: Option<String>,
    assignees: Vec<String>,
}

impl CardFields {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.due.is_none()
            && self.assignees.is_empty()
    }

    async fn to_body(&self, app: &App) -> Result<Value> {
        let mut body = Map::new();
        if let Some(title) = &self.title {
            body.insert("title".into(), json!(title));
        }
        if let Some(content) = &self.content {
            body.insert("content".into(), json!(content));
        }
        if let Some(due) = &self.due {
            body.insert(
                "due_on".into(),
                json!(dateparse::parse_from(due, app.today)),
            );
        }
        if !self.assignees.is_empty() {
            body.insert(
                "assignee_ids".into(),
                json!(app.assignee_ids(&self.assignees).await?),
            );
        }
        Ok(Value::Object(body))
    }
}

/// A name (not an ID) can only be matched once the card table is known.
fn require_table_for_name(
    token: Option<&str>,
    card_table: Option<&str>,
    message: &str,
) -> Result<()> {
    match token {
        Some(t) if !is_numeric_id(t) && card_table.is_none() => Err(BcqError::usage(message)),
        _ => Ok(()),
    }
}

async fn load_table(
    app: &App,
    project_id: &str,
    card_table: Option<&str>,
) -> Result<CardTable> {
    let table_id = app
        .tool_id(project_id, ToolKind::KanbanBoard, card_table)
        .await?;
    let table = app
        .api
        .get(&format!("/buckets/{}/card_tables/{}.json", project_id, table_id))
        .await?;
    decode(table)
}

fn find_column(table: &CardTable, token: &str) -> Result<i64> {
    table.column(token).map(|c| c.id).ok_or_else(|| {
        BcqError::usage_hint(
            format!("Column '{}' not found", token),
            "Use column ID or exact name",
        )
    })
}

fn cards_path(project_id: &str, column_id: impl std::fmt::Display) -> String {
    format!(
        "/buckets/{}/card_tables/lists/{}/cards.json",
        project_id, column_id
    )
}

async fn list_cards(
    app: &App,
    card_table: Option<&str>,
    column: Option<&str>,
    pagination: &PaginationArgs,
) -> Result<Envelope> {
    require_table_for_name(
        column,
        card_table,
        "--card-table is required when using --column with a name",
    )?;
    let options = list_options(pagination, None)?;
    let project = app.resolve_project(None).await?;

    let (cards, notice) = match column {
        // Column IDs go straight to the column endpoint
        Some(col) if is_numeric_id(col) => {
            let listing = app.api.get_all(&cards_path(&project.id, col), &options).await?;
            let notice = truncation_notice(&listing);
            (listing.items, notice)
        }
        Some(col) => {
            let table = load_table(app, &project.id, card_table).await?;
            let column_id = find_column(&table, col)?;
            let listing = app
                .api
                .get_all(&cards_path(&project.id, column_id), &options)
                .await?;
            let notice = truncation_notice(&listing);
            (listing.items, notice)
        }
        None => {
            let table = load_table(app, &project.id, card_table).await?;
            collect_columns(app, &project.id, &table, &options).await
        }
    };

    let summary = plural(cards.len(), "card");
    Ok(Envelope::new(Value::Array(cards), summary)
        .breadcrumb(
            "create",
            format!("bcq cards create --title <title> --in {}", project.id),
            "Create card",
        )
        .breadcrumb("show", "bcq cards show <id>", "Show card details")
        .breadcrumb(
            "columns",
            format!("bcq cards columns --in {}", project.id),
            "List columns with IDs",
        )
        .notice(notice))
}

/// Cards from every column. Columns that fail to load are skipped.
async fn collect_columns(
    app: &App,
    project_id: &str,
    table: &CardTable,
    options: &ListOptions,
) -> (Vec<Value>, Option<String>) {
    let mut cards = Vec::new();
    for column in &table.lists {
        match app
            .api
            .get_all(&cards_path(project_id, column.id), &ListOptions::all())
            .await
        {
            Ok(listing) => cards.extend(listing.items),
            Err(e) => tracing::warn!(column = column.id, error = %e, "skipping column"),
        }
    }

    let mut notice = None;
    if let Some(max) = options.max_items().filter(|max| cards.len() > *max) {
        notice = Some(format!(
            "Showing the first {} of {} cards; use --all to fetch everything",
            max,
            cards.len()
        ));
        cards.truncate(max);
    }
    (cards, notice)
}

async fn show_card(app: &App, arg: &str) -> Result<Envelope> {
    let (card_id, url_project) = extract_with_project(arg);
    let project = app.resolve_project(url_project.as_deref()).await?;
    let card = app
        .api
        .get(&format!(
            "/buckets/{}/card_tables/cards/{}.json",
            project.id, card_id
        ))
        .await?;

    let summary = format!("Card #{}: {}", card_id, text(&card, "title"));
    Ok(Envelope::new(card, summary)
        .breadcrumb(
            "move",
            format!("bcq cards move {} --to <column-id> --in {}", card_id, project.id),
            "Move card",
        )
        .breadcrumb(
            "list",
            format!("bcq cards list --in {}", project.id),
            "List cards",
        ))
}

async fn create_card(
    app: &App,
    fields: CardFields,
    column: Option<&str>,
    card_table: Option<&str>,
) -> Result<Envelope> {
    if fields.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
        return Err(BcqError::usage("--title is required"));
    }
    require_table_for_name(
        column,
        card_table,
        "--card-table is required when using --column with a name",
    )?;
    let project = app.resolve_project(None).await?;

    let column_id = match column {
        Some(col) if is_numeric_id(col) => col.to_string(),
        Some(col) => {
            let table = load_table(app, &project.id, card_table).await?;
            find_column(&table, col)?.to_string()
        }
        None => {
            let table = load_table(app, &project.id, card_table).await?;
            table
                .lists
                .first()
                .map(|c| c.id.to_string())
                .ok_or_else(|| BcqError::not_found("Columns", format!("card table {}", table.id)))?
        }
    };

    let body = fields.to_body(app).await?;
    let card = app
        .api
        .post(&cards_path(&project.id, &column_id), &body)
        .await?;
    let card_id = id_of(&card);

    Ok(Envelope::new(card, format!("Created card #{}", card_id))
        .breadcrumb(
            "show",
            format!("bcq cards show {} --in {}", card_id, project.id),
            "View card",
        )
        .breadcrumb(
            "move",
            format!("bcq cards move {} --to <column-id> --in {}", card_id, project.id),
            "Move card",
        ))
}

async fn update_card(app: &App, arg: &str, fields: CardFields) -> Result<Envelope> {
    if fields.is_empty() {
        return Err(BcqError::usage_hint(
            "At least one field required",
            "Use --title, --content, --due or --assignee",
        ));
    }
    let (card_id, url_project) = extract_with_project(arg);
    let project = app.resolve_project(url_project.as_deref()).await?;

    let body = fields.to_body(app).await?;
    let card = app
        .api
        .put(
            &format!("/buckets/{}/card_tables/cards/{}.json", project.id, card_id),
            &body,
        )
        .await?;

    Ok(Envelope::new(card, format!("Updated card #{}", card_id))
        .breadcrumb(
            "show",
            format!("bcq cards show {} --in {}", card_id, project.id),
            "View card",
        )
        .breadcrumb(
            "list",
            format!("bcq cards list --in {}", project.id),
            "List cards",
        ))
}

async fn move_card(
    app: &App,
    arg: &str,
    to: Option<&str>,
    card_table: Option<&str>,
) -> Result<Envelope> {
    let to = to
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| BcqError::usage("--to is required"))?;
    require_table_for_name(
        Some(to),
        card_table,
        "--card-table is required when --to is a column name",
    )?;
    let (card_id, url_project) = extract_with_project(arg);
    let project = app.resolve_project(url_project.as_deref()).await?;

    let column_id = if is_numeric_id(to) {
        numeric(to, "column ID")?
    } else {
        let table = load_table(app, &project.id, card_table).await?;
        find_column(&table, to)?
    };

    app.api
        .post(
            &format!(
                "/buckets/{}/card_tables/cards/{}/moves.json",
                project.id, card_id
            ),
            &json!({ "column_id": column_id }),
        )
        .await?;

    Ok(Envelope::new(
        json!({ "id": card_id, "column_id": column_id }),
        format!("Moved card #{} to '{}'", card_id, to),
    )
    .breadcrumb(
        "show",
        format!("bcq cards show {} --in {}", card_id, project.id),
        "View card",
    )
    .breadcrumb(
        "column",
        format!("bcq cards list --column {} --in {}", column_id, project.id),
        "View column",
    ))
}

async fn list_columns(app: &App, card_table: Option<&str>) -> Result<Envelope> {
    let project = app.resolve_project(None).await?;
    let table = load_table(app, &project.id, card_table).await?;

    let summary = plural(table.lists.len(), "column");
    let columns = serde_json::to_value(&table.lists)?;
    Ok(Envelope::new(columns, summary)
        .breadcrumb(
            "cards",
            format!("bcq cards list --column <id> --in {}", project.id),
            "List cards in a column",
        )
        .breadcrumb(
            "create",
            format!(
                "bcq cards create --title <title> --column <id> --in {}",
                project.id
            ),
            "Create card",
        ))
}
