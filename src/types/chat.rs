use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::message::Message;
use crate::types::relationship::RelationshipStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    /// Two-participant conversation backed by a relationship edge.
    Direct,
    Group,
}

/// Chat-level metadata shared by every participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMeta {
    pub id: String,
    pub chat_type: ChatType,
    pub participant_ids: Vec<String>,
    pub group_name: Option<String>,
    pub group_avatar: Option<String>,
}

impl ChatMeta {
    /// The counterpart in a direct chat, if there is one.
    pub fn other_participant(&self, user_id: &str) -> Option<&str> {
        if self.chat_type != ChatType::Direct {
            return None;
        }
        self.participant_ids
            .iter()
            .map(String::as_str)
            .find(|p| *p != user_id)
    }
}

/// Per-member chat state: pin/mute flags and the read watermark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMembership {
    pub chat_id: String,
    pub user_id: String,
    pub is_pinned: bool,
    pub is_muted: bool,
    /// Messages at or before this instant count as read. `None` means the
    /// member has never read the chat.
    pub last_read_at: Option<DateTime<Utc>>,
}

impl ChatMembership {
    pub fn new(chat_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            user_id: user_id.into(),
            is_pinned: false,
            is_muted: false,
            last_read_at: None,
        }
    }
}

/// One display-ready row of the chat list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    pub chat_type: ChatType,
    pub participant_ids: Vec<String>,
    pub group_name: Option<String>,
    pub group_avatar: Option<String>,
    pub last_message: Option<Message>,
    pub unread_count: u64,
    pub is_pinned: bool,
    pub is_muted: bool,
    /// Only meaningful for direct chats; groups carry `Friend`.
    pub relationship: RelationshipStatus,
}
