use serde::{Deserialize, Serialize};

/// A card table with its columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardTable {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub lists: Vec<CardColumn>,
}

/// A column ("list") on a card table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardColumn {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cards_count: Option<i64>,
}

impl CardTable {
    /// Find a column by numeric ID or exact title.
    pub fn column(&self, token: &str) -> Option<&CardColumn> {
        if crate::ids::is_numeric_id(token) {
            let id: i64 = token.parse().ok()?;
            return self.lists.iter().find(|c| c.id == id);
        }
        self.lists.iter().find(|c| c.title == token)
    }
}
