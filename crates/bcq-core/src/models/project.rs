//! Projects and their dock of tools.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BcqError;

/// A project ("bucket").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub bookmarked: bool,
    #[serde(default)]
    pub dock: Vec<DockEntry>,
}

/// One tool enabled on a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockEntry {
    pub id: i64,
    /// Tool-type tag, e.g. `chat` or `kanban_board`.
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Dock tool types bcq looks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Chat,
    Vault,
    KanbanBoard,
    Todoset,
    MessageBoard,
    Schedule,
}

impl ToolKind {
    /// The `name` tag used in the dock array.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::Chat => "chat",
            ToolKind::Vault => "vault",
            ToolKind::KanbanBoard => "kanban_board",
            ToolKind::Todoset => "todoset",
            ToolKind::MessageBoard => "message_board",
            ToolKind::Schedule => "schedule",
        }
    }

    /// Human name used in messages.
    pub fn friendly_name(&self) -> &'static str {
        match self {
            ToolKind::Chat => "campfire",
            ToolKind::Vault => "docs & files vault",
            ToolKind::KanbanBoard => "card table",
            ToolKind::Todoset => "todoset",
            ToolKind::MessageBoard => "message board",
            ToolKind::Schedule => "schedule",
        }
    }

    /// Flag that disambiguates between several tools of this kind.
    pub fn flag(&self) -> &'static str {
        match self {
            ToolKind::Chat => "--campfire",
            ToolKind::Vault => "--vault",
            ToolKind::KanbanBoard => "--card-table",
            ToolKind::Todoset => "--todoset",
            ToolKind::MessageBoard => "--message-board",
            ToolKind::Schedule => "--schedule",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ToolKind {
    type Err = BcqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(ToolKind::Chat),
            "vault" => Ok(ToolKind::Vault),
            "kanban_board" => Ok(ToolKind::KanbanBoard),
            "todoset" => Ok(ToolKind::Todoset),
            "message_board" => Ok(ToolKind::MessageBoard),
            "schedule" => Ok(ToolKind::Schedule),
            _ => Err(BcqError::usage(format!("Unknown dock tool: {}", s))),
        }
    }
}
