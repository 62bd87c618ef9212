//! Todolists and todos.

use serde::{Deserialize, Serialize};

/// A todolist inside a project's todoset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todolist {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl Todolist {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.title.as_deref().unwrap_or_default()
        } else {
            &self.name
        }
    }
}

/// A single todo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_on: Option<String>,
    #[serde(default)]
    pub assignees: Vec<crate::models::Person>,
}

impl Todo {
    /// Overdue when incomplete and due strictly before `today` (`YYYY-MM-DD`).
    pub fn is_overdue(&self, today: &str) -> bool {
        !self.completed
            && self
                .due_on
                .as_deref()
                .is_some_and(|due| !due.is_empty() && due < today)
    }

    pub fn is_assigned_to(&self, person_id: i64) -> bool {
        self.assignees.iter().any(|p| p.id == person_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(due: Option<&str>, completed: bool) -> Todo {
        Todo {
            id: 1,
            content: "x".into(),
            completed,
            due_on: due.map(str::to_string),
            assignees: vec![],
        }
    }

    #[test]
    fn overdue_compares_dates_lexically() {
        assert!(todo(Some("2024-01-01"), false).is_overdue("2024-01-02"));
        assert!(!todo(Some("2024-01-02"), false).is_overdue("2024-01-02"));
        assert!(!todo(Some("2024-01-01"), true).is_overdue("2024-01-02"));
        assert!(!todo(None, false).is_overdue("2024-01-02"));
    }
}
