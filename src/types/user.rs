use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse availability flag shown next to a user in lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Online,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub presence: Presence,
    pub last_seen: Option<DateTime<Utc>>,
    /// While set, location writes are still recorded but excluded from
    /// friends' reads.
    pub ghost_mode: bool,
}

impl User {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            id: id.into(),
            display_name: username.clone(),
            username,
            avatar: None,
            presence: Presence::Offline,
            last_seen: None,
            ghost_mode: false,
        }
    }
}
