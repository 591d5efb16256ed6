use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentVisibility {
    Friends,
    Selected,
    Public,
}

/// At most one reaction per user per moment; a newer reaction replaces the
/// older one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub user_id: String,
    pub emoji: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentComment {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// One entry of the photo feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Moment {
    pub id: String,
    pub user_id: String,
    pub image_url: String,
    pub caption: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub visibility: MomentVisibility,
    pub reactions: Vec<Reaction>,
    pub comments: Vec<MomentComment>,
}
