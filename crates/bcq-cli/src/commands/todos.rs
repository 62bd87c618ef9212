//! Todo commands, including the `todo`, `done` and `reopen` shortcuts.

use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{json, Map, Value};

use bcq_core::api::with_query;
use bcq_core::dateparse;
use bcq_core::models::Todo;
use bcq_core::names::{parse_id, Resolved};
use bcq_core::pagination::ListOptions;
use bcq_core::urlarg::extract_with_project;
use bcq_core::{BcqError, Result};

use super::{id_of, plural, text, PaginationArgs};
use crate::app::{list_options, App};
use crate::output::Envelope;

#[derive(Subcommand, Debug)]
pub enum TodosCommands {
    /// List todos in a project or a single todolist
    List(ListArgs),

    /// Show a todo
    Show {
        /// Todo ID or URL
        id: String,
    },

    /// Create a todo
    Create(CreateArgs),

    /// Mark todos as complete
    Complete {
        /// Todo IDs or URLs
        ids: Vec<String>,
    },

    /// Mark completed todos as incomplete
    Reopen {
        /// Todo IDs or URLs
        ids: Vec<String>,
    },

    /// Change a todo's position in its list
    Position {
        /// Todo ID or URL
        id: String,

        /// New position (1 = top)
        #[arg(long)]
        to: Option<u32>,
    },

    /// Comment on and/or complete every todo matching a filter
    Sweep(SweepArgs),
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Todolist ID or name
    #[arg(long)]
    pub list: Option<String>,

    /// Only todos assigned to this person ("me", ID, name or email)
    #[arg(long)]
    pub assignee: Option<String>,

    #[arg(long, short = 's', value_enum)]
    pub status: Option<Status>,

    /// Only incomplete todos past their due date
    #[arg(long)]
    pub overdue: bool,

    #[command(flatten)]
    pub pagination: PaginationArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Completed,
    #[value(alias = "pending")]
    Incomplete,
}

#[derive(Args, Debug, Default)]
pub struct CreateArgs {
    /// Todo text
    pub content: Option<String>,

    /// Todolist ID or name (defaults to the configured or first list)
    #[arg(long)]
    pub list: Option<String>,

    /// Due date (YYYY-MM-DD, "tomorrow", "friday", "+3", ...)
    #[arg(long)]
    pub due: Option<String>,

    /// Assignee: "me", ID, name or email (repeatable)
    #[arg(long)]
    pub assignee: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub struct SweepArgs {
    /// Select todos past their due date
    #[arg(long)]
    pub overdue: bool,

    /// Select todos assigned to this person
    #[arg(long)]
    pub assignee: Option<String>,

    /// Comment to add to each matching todo
    #[arg(long, short = 'c')]
    pub comment: Option<String>,

    /// Mark matching todos as complete
    #[arg(long, alias = "done")]
    pub complete: bool,

    /// Show what would be swept without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn handle_todos_command(app: &App, cmd: TodosCommands) -> Result<Envelope> {
    match cmd {
        TodosCommands::List(args) => list_todos(app, &args).await,
        TodosCommands::Show { id } => show_todo(app, &id).await,
        TodosCommands::Create(args) => create_todo(app, &args).await,
        TodosCommands::Complete { ids } => complete_todos(app, &ids).await,
        TodosCommands::Reopen { ids } => reopen_todos(app, &ids).await,
        TodosCommands::Position { id, to } => reposition_todo(app, &id, to).await,
        TodosCommands::Sweep(args) => sweep_todos(app, &args).await,
    }
}

/// A todo kept alongside the raw API value it was decoded from.
struct Fetched {
    todo: Todo,
    raw: Value,
}

/// Filters applied after fetching.
#[derive(Default)]
struct Filter {
    status: Option<Status>,
    assignee: Option<i64>,
    overdue_before: Option<String>,
}

impl Filter {
    fn matches(&self, todo: &Todo) -> bool {
        let status_ok = match self.status {
            Some(Status::Completed) => todo.completed,
            Some(Status::Incomplete) => !todo.completed,
            None => true,
        };
        status_ok
            && self.assignee.is_none_or(|id| todo.is_assigned_to(id))
            && self
                .overdue_before
                .as_deref()
                .is_none_or(|today| todo.is_overdue(today))
    }
}

fn todos_path(project_id: &str, list_id: &str, status: Option<Status>) -> String {
    let path = format!("/buckets/{}/todolists/{}/todos.json", project_id, list_id);
    match status {
        Some(Status::Completed) => with_query(&path, &[("completed", "true")]),
        _ => path,
    }
}

fn decode_todos(items: Vec<Value>) -> Vec<Fetched> {
    items
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<Todo>(raw.clone()) {
            Ok(todo) => Some(Fetched { todo, raw }),
            Err(e) => {
                tracing::debug!(error = %e, "skipping undecodable todo");
                None
            }
        })
        .collect()
}

/// Todos from every list in the project. Lists that fail to load are skipped.
async fn fetch_all_lists(app: &App, project_id: &str, status: Option<Status>) -> Result<Vec<Fetched>> {
    let lists = app.names.todolists(project_id).await?;
    let mut todos = Vec::new();
    for list in &lists {
        let path = todos_path(project_id, &list.id.to_string(), status);
        match app.api.get_all(&path, &ListOptions::all()).await {
            Ok(listing) => todos.extend(decode_todos(listing.items)),
            Err(e) => tracing::warn!(todolist = list.id, error = %e, "skipping todolist"),
        }
    }
    Ok(todos)
}

async fn list_todos(app: &App, args: &ListArgs) -> Result<Envelope> {
    let options = list_options(&args.pagination, None)?;
    let project = app.resolve_project(None).await?;

    let filter = Filter {
        status: args.status,
        assignee: match &args.assignee {
            Some(token) => Some(parse_id(&app.names.resolve_person(token).await?.id)?),
            None => None,
        },
        overdue_before: args.overdue.then(|| app.today_str()),
    };

    let todolist = app.resolve_todolist(args.list.as_deref(), &project.id).await?;
    let fetched = match &todolist {
        Some(list) => {
            let listing = app
                .api
                .get_all(&todos_path(&project.id, &list.id, args.status), &ListOptions::all())
                .await?;
            decode_todos(listing.items)
        }
        None => fetch_all_lists(app, &project.id, args.status).await?,
    };

    let mut todos: Vec<Value> = fetched
        .into_iter()
        .filter(|f| filter.matches(&f.todo))
        .map(|f| f.raw)
        .collect();

    let mut notice = None;
    if let Some(max) = options.max_items().filter(|max| todos.len() > *max) {
        notice = Some(format!(
            "Showing the first {} of {} todos; use --all to fetch everything",
            max,
            todos.len()
        ));
        todos.truncate(max);
    }

    let scope = todolist.as_ref().map(Resolved::label).unwrap_or_else(|| project.label());
    let summary = format!("{} in {}", plural(todos.len(), "todo"), scope);
    Ok(Envelope::new(Value::Array(todos), summary)
        .breadcrumb(
            "create",
            format!("bcq todo \"content\" --in {}", project.id),
            "Create todo",
        )
        .breadcrumb("complete", "bcq done <id>", "Complete todo")
        .notice(notice))
}

async fn show_todo(app: &App, arg: &str) -> Result<Envelope> {
    let (todo_id, url_project) = extract_with_project(arg);
    let project = app.resolve_project(url_project.as_deref()).await?;
    let todo = app
        .api
        .get(&format!("/buckets/{}/todos/{}.json", project.id, todo_id))
        .await?;

    let summary = format!("Todo #{}: {}", todo_id, text(&todo, "content"));
    Ok(Envelope::new(todo, summary)
        .breadcrumb(
            "complete",
            format!("bcq done {} --in {}", todo_id, project.id),
            "Complete todo",
        )
        .breadcrumb(
            "list",
            format!("bcq todos list --in {}", project.id),
            "List todos",
        ))
}

pub async fn create_todo(app: &App, args: &CreateArgs) -> Result<Envelope> {
    let content = args
        .content
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| BcqError::usage_hint("Todo content required", "bcq todo \"content\""))?;
    let project = app.resolve_project(None).await?;

    let list_id = match app.resolve_todolist(args.list.as_deref(), &project.id).await? {
        Some(list) => list.id,
        None => app
            .names
            .todolists(&project.id)
            .await?
            .first()
            .map(|l| l.id.to_string())
            .ok_or_else(|| BcqError::usage("--list is required (no default todolist found)"))?,
    };

    let mut body = Map::new();
    body.insert("content".into(), json!(content));
    if let Some(due) = &args.due {
        body.insert("due_on".into(), json!(dateparse::parse_from(due, app.today)));
    }
    if !args.assignee.is_empty() {
        body.insert(
            "assignee_ids".into(),
            json!(app.assignee_ids(&args.assignee).await?),
        );
    }

    let todo = app
        .api
        .post(
            &format!("/buckets/{}/todolists/{}/todos.json", project.id, list_id),
            &Value::Object(body),
        )
        .await?;
    let todo_id = id_of(&todo);

    Ok(Envelope::new(todo, format!("Created todo #{}", todo_id))
        .breadcrumb(
            "complete",
            format!("bcq done {} --in {}", todo_id, project.id),
            "Complete todo",
        )
        .breadcrumb(
            "list",
            format!("bcq todos list --list {} --in {}", list_id, project.id),
            "List todos",
        ))
}

/// Project and todo IDs for a batch; a URL in the first argument supplies
/// the project.
async fn batch_targets(app: &App, args: &[String], usage: &str) -> Result<(Resolved, Vec<String>)> {
    if args.is_empty() {
        return Err(BcqError::usage_hint("Todo ID required", usage));
    }
    let extracted: Vec<(String, Option<String>)> =
        args.iter().map(|a| extract_with_project(a)).collect();
    let url_project = extracted.iter().find_map(|(_, p)| p.clone());
    let project = app.resolve_project(url_project.as_deref()).await?;
    Ok((project, extracted.into_iter().map(|(id, _)| id).collect()))
}

fn failure_notice(failed: &[String]) -> Option<String> {
    (!failed.is_empty()).then(|| format!("Failed: {}", failed.join(", ")))
}

pub async fn complete_todos(app: &App, ids: &[String]) -> Result<Envelope> {
    let (project, ids) = batch_targets(app, ids, "bcq done <id>...").await?;

    let mut completed = Vec::new();
    let mut failed = Vec::new();
    for id in ids {
        let path = format!("/buckets/{}/todos/{}/completion.json", project.id, id);
        match app.api.post(&path, &Value::Null).await {
            Ok(_) => completed.push(id),
            Err(e) => {
                tracing::warn!(todo = %id, error = %e, "completion failed");
                failed.push(id);
            }
        }
    }

    let summary = if failed.is_empty() {
        format!("Completed {} todo(s)", completed.len())
    } else {
        format!("Completed {}, failed {}", completed.len(), failed.len())
    };
    let notice = failure_notice(&failed);
    let reopen = completed.first().or(failed.first()).cloned().unwrap_or_default();

    Ok(
        Envelope::new(json!({ "completed": completed, "failed": failed }), summary)
            .breadcrumb(
                "list",
                format!("bcq todos list --in {}", project.id),
                "List remaining todos",
            )
            .breadcrumb("reopen", format!("bcq reopen {}", reopen), "Reopen a todo")
            .notice(notice),
    )
}

pub async fn reopen_todos(app: &App, ids: &[String]) -> Result<Envelope> {
    let (project, ids) = batch_targets(app, ids, "bcq reopen <id>...").await?;

    let mut reopened = Vec::new();
    let mut failed = Vec::new();
    for id in ids {
        let path = format!("/buckets/{}/todos/{}/completion.json", project.id, id);
        match app.api.delete(&path).await {
            Ok(()) => reopened.push(id),
            Err(e) => {
                tracing::warn!(todo = %id, error = %e, "reopen failed");
                failed.push(id);
            }
        }
    }

    let summary = if failed.is_empty() {
        format!("Reopened {} todo(s)", reopened.len())
    } else {
        format!("Reopened {}, failed {}", reopened.len(), failed.len())
    };
    let notice = failure_notice(&failed);

    Ok(
        Envelope::new(json!({ "reopened": reopened, "failed": failed }), summary)
            .breadcrumb(
                "list",
                format!("bcq todos list --in {}", project.id),
                "List todos",
            )
            .notice(notice),
    )
}

async fn reposition_todo(app: &App, arg: &str, to: Option<u32>) -> Result<Envelope> {
    let position = to
        .filter(|p| *p > 0)
        .ok_or_else(|| BcqError::usage("--to is required (1 = top)"))?;
    let (todo_id, url_project) = extract_with_project(arg);
    let project = app.resolve_project(url_project.as_deref()).await?;

    app.api
        .put(
            &format!("/buckets/{}/todos/{}/position.json", project.id, todo_id),
            &json!({ "position": position }),
        )
        .await?;

    Ok(Envelope::new(
        json!({ "id": todo_id, "position": position }),
        format!("Moved todo #{} to position {}", todo_id, position),
    )
    .breadcrumb(
        "show",
        format!("bcq todos show {} --in {}", todo_id, project.id),
        "View todo",
    ))
}

/// Outcome of a sweep, dry or real.
#[derive(Debug, Default, Serialize)]
struct SweepResult {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    dry_run: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    would_sweep: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    swept: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    commented: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    completed: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    comment_failed: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    complete_failed: Vec<i64>,
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    complete: bool,
}

async fn sweep_todos(app: &App, args: &SweepArgs) -> Result<Envelope> {
    if !args.overdue && args.assignee.is_none() {
        return Err(BcqError::usage_hint(
            "Sweep requires a filter",
            "Use --overdue or --assignee to select todos",
        ));
    }
    let comment = args.comment.clone().filter(|c| !c.trim().is_empty());
    if comment.is_none() && !args.complete {
        return Err(BcqError::usage_hint(
            "Sweep requires an action",
            "Use --comment and/or --complete",
        ));
    }

    let project = app.resolve_project(None).await?;
    let filter = Filter {
        status: Some(Status::Incomplete),
        assignee: match &args.assignee {
            Some(token) => Some(parse_id(&app.names.resolve_person(token).await?.id)?),
            None => None,
        },
        overdue_before: args.overdue.then(|| app.today_str()),
    };

    let ids: Vec<i64> = fetch_all_lists(app, &project.id, None)
        .await?
        .into_iter()
        .filter(|f| filter.matches(&f.todo))
        .map(|f| f.todo.id)
        .collect();

    if ids.is_empty() {
        return Ok(Envelope::new(
            serde_json::to_value(SweepResult::default())?,
            "No todos match the filter",
        ));
    }

    if args.dry_run {
        let result = SweepResult {
            dry_run: true,
            count: ids.len(),
            would_sweep: ids,
            comment,
            complete: args.complete,
            ..Default::default()
        };
        let summary = format!("Would sweep {} todo(s)", result.count);
        return Ok(Envelope::new(serde_json::to_value(result)?, summary));
    }

    let mut result = SweepResult {
        count: ids.len(),
        comment: comment.clone(),
        complete: args.complete,
        ..Default::default()
    };
    for id in ids {
        result.swept.push(id);

        if let Some(comment) = &comment {
            let path = format!("/buckets/{}/recordings/{}/comments.json", project.id, id);
            match app.api.post(&path, &json!({ "content": comment })).await {
                Ok(_) => result.commented.push(id),
                Err(e) => {
                    tracing::warn!(todo = id, error = %e, "sweep comment failed");
                    result.comment_failed.push(id);
                }
            }
        }

        if args.complete {
            let path = format!("/buckets/{}/todos/{}/completion.json", project.id, id);
            match app.api.post(&path, &Value::Null).await {
                Ok(_) => result.completed.push(id),
                Err(e) => {
                    tracing::warn!(todo = id, error = %e, "sweep completion failed");
                    result.complete_failed.push(id);
                }
            }
        }
    }

    let mut summary = format!("Swept {} todo(s)", result.swept.len());
    if !result.commented.is_empty() {
        summary.push_str(&format!(", commented {}", result.commented.len()));
    }
    if !result.completed.is_empty() {
        summary.push_str(&format!(", completed {}", result.completed.len()));
    }

    Ok(Envelope::new(serde_json::to_value(result)?, summary).breadcrumb(
        "list",
        format!("bcq todos list --in {}", project.id),
        "List todos",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcq_core::models::Person;

    fn todo(completed: bool, due: Option<&str>, assignee: Option<i64>) -> Todo {
        Todo {
            id: 1,
            content: "x".into(),
            completed,
            due_on: due.map(str::to_string),
            assignees: assignee
                .map(|id| {
                    vec![Person {
                        id,
                        name: "A".into(),
                        email_address: None,
                    }]
                })
                .unwrap_or_default(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let f = Filter::default();
        assert!(f.matches(&todo(true, None, None)));
        assert!(f.matches(&todo(false, Some("2000-01-01"), Some(3))));
    }

    #[test]
    fn filters_combine() {
        let f = Filter {
            status: Some(Status::Incomplete),
            assignee: Some(7),
            overdue_before: Some("2024-06-01".into()),
        };
        assert!(f.matches(&todo(false, Some("2024-05-31"), Some(7))));
        assert!(!f.matches(&todo(false, Some("2024-06-01"), Some(7))));
        assert!(!f.matches(&todo(false, Some("2024-05-31"), Some(8))));
        assert!(!f.matches(&todo(true, Some("2024-05-31"), Some(7))));
    }

    #[test]
    fn completed_status_asks_the_api() {
        assert_eq!(
            todos_path("1", "2", Some(Status::Completed)),
            "/buckets/1/todolists/2/todos.json?completed=true"
        );
        assert_eq!(todos_path("1", "2", None), "/buckets/1/todolists/2/todos.json");
    }
}
