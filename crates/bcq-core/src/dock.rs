//! Locating a project's tools (campfire, vault, card table, todoset).

use crate::api::{decode, BasecampApi};
use crate::error::{BcqError, Result};
use crate::ids::is_numeric_id;
use crate::models::{DockEntry, Project, ToolKind};
use crate::names::capitalize;

/// Fetch a project including its dock.
pub async fn fetch_project(api: &dyn BasecampApi, project_id: &str) -> Result<Project> {
    let value = api.get(&format!("/projects/{}.json", project_id)).await?;
    decode(value)
}

/// Find the single dock tool of `kind`, or validate `explicit` (an ID or a
/// title) against the dock.
pub async fn find_tool_id(
    api: &dyn BasecampApi,
    project_id: &str,
    kind: ToolKind,
    explicit: Option<&str>,
) -> Result<i64> {
    let project = fetch_project(api, project_id).await?;
    select_tool(&project.dock, project_id, kind, explicit).map(|entry| entry.id)
}

/// Pure selection over an already-fetched dock.
pub fn select_tool<'a>(
    dock: &'a [DockEntry],
    project_id: &str,
    kind: ToolKind,
    explicit: Option<&str>,
) -> Result<&'a DockEntry> {
    let matches: Vec<&DockEntry> = dock
        .iter()
        .filter(|e| e.enabled && e.name == kind.as_str())
        .collect();

    tracing::debug!(tool = %kind, project_id, matches = matches.len(), "dock lookup");

    if let Some(explicit) = explicit.filter(|e| !e.is_empty()) {
        let by_id = is_numeric_id(explicit)
            .then(|| explicit.parse::<i64>().ok())
            .flatten();
        let found = matches
            .iter()
            .find(|e| match by_id {
                Some(id) => e.id == id,
                None => e
                    .title
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case(explicit)),
            })
            .copied();
        return match found {
            Some(entry) => Ok(entry),
            None if matches.is_empty() => Err(no_tool(kind, project_id)),
            None => Err(BcqError::not_found_hint(
                capitalize(kind.friendly_name()),
                explicit,
                format!("Available: {}", describe(&matches).join(", ")),
            )),
        };
    }

    match matches.as_slice() {
        [] => Err(no_tool(kind, project_id)),
        [only] => Ok(*only),
        many => {
            let candidates = describe(many);
            Err(BcqError::Ambiguous {
                message: format!(
                    "Project has {} {}s ({})",
                    many.len(),
                    kind.friendly_name(),
                    candidates.join(", ")
                ),
                candidates,
                hint: format!("Use {} <id> to specify", kind.flag()),
            })
        }
    }
}

fn no_tool(kind: ToolKind, project_id: &str) -> BcqError {
    BcqError::not_found_hint(
        capitalize(kind.friendly_name()),
        format!("project {}", project_id),
        format!("Project has no {}", kind.friendly_name()),
    )
}

/// `id: title` pairs, falling back to the bare ID.
fn describe(entries: &[&DockEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| match e.title.as_deref().filter(|t| !t.is_empty()) {
            Some(title) => format!("{}: {}", e.id, title),
            None => e.id.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, name: &str, title: &str) -> DockEntry {
        DockEntry {
            id,
            name: name.to_string(),
            title: Some(title.to_string()),
            enabled: true,
        }
    }

    #[test]
    fn zero_matches_is_not_found() {
        let dock = vec![entry(1, "vault", "Docs")];
        let err = select_tool(&dock, "42", ToolKind::Chat, None).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.hint().unwrap(), "Project has no campfire");
        assert_eq!(err.to_string(), "Campfire not found: project 42");
    }

    #[test]
    fn single_match_wins() {
        let dock = vec![entry(1, "vault", "Docs"), entry(2, "chat", "Campfire")];
        assert_eq!(select_tool(&dock, "42", ToolKind::Chat, None).unwrap().id, 2);
    }

    #[test]
    fn multiple_matches_are_ambiguous() {
        let dock = vec![
            entry(10, "kanban_board", "Sprint"),
            entry(11, "kanban_board", "Backlog"),
        ];
        let err = select_tool(&dock, "42", ToolKind::KanbanBoard, None).unwrap_err();
        match err {
            BcqError::Ambiguous {
                message,
                candidates,
                hint,
            } => {
                assert_eq!(candidates, vec!["10: Sprint", "11: Backlog"]);
                assert!(message.contains("10: Sprint"));
                assert!(hint.contains("--card-table"));
            }
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn explicit_id_is_validated() {
        let dock = vec![
            entry(10, "kanban_board", "Sprint"),
            entry(11, "kanban_board", "Backlog"),
        ];
        let picked = select_tool(&dock, "42", ToolKind::KanbanBoard, Some("11")).unwrap();
        assert_eq!(picked.id, 11);

        let err = select_tool(&dock, "42", ToolKind::KanbanBoard, Some("99")).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.hint().unwrap().contains("10: Sprint"));
    }

    #[test]
    fn explicit_title_is_accepted() {
        let dock = vec![
            entry(10, "kanban_board", "Sprint"),
            entry(11, "kanban_board", "Backlog"),
        ];
        let picked = select_tool(&dock, "42", ToolKind::KanbanBoard, Some("backlog")).unwrap();
        assert_eq!(picked.id, 11);
    }

    #[test]
    fn disabled_tools_are_ignored() {
        let mut chat = entry(5, "chat", "Campfire");
        chat.enabled = false;
        let err = select_tool(&[chat], "42", ToolKind::Chat, None).unwrap_err();
        assert!(err.is_not_found());
    }
}
