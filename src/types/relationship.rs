use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    Stranger,
    Friend,
    Couple,
}

impl std::fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RelationshipStatus::Stranger => "stranger",
            RelationshipStatus::Friend => "friend",
            RelationshipStatus::Couple => "couple",
        };
        write!(f, "{s}")
    }
}

/// Directed edge from `user_id` to `related_user_id`. Accepting a request
/// writes the edge in both directions; symmetry is by convention, not
/// enforced by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub user_id: String,
    pub related_user_id: String,
    pub status: RelationshipStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

/// One-directional friend request. Rows are kept after resolution; only
/// `Pending` rows block a re-send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequest {
    pub id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}
