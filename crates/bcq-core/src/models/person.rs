use serde::{Deserialize, Serialize};

/// A person in the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email_address: Option<String>,
}
