//! Chat list aggregation, read watermarks, and message state.

use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use log::{debug, info};
use uuid::Uuid;

use crate::client::Client;
use crate::error::{CoreError, Result};
use crate::types::chat::{ChatMembership, ChatSummary};
use crate::types::message::{Message, MessageKind, MessageStatus};
use crate::types::relationship::RelationshipStatus;

impl Client {
    /// Derive the caller's chat list: one enriched summary per membership,
    /// sorted most-important first (couple, then pinned, then recency).
    ///
    /// The per-membership reads are independent and fan out in parallel; the
    /// merge preserves membership order, so equal sort keys keep their input
    /// order across runs. Dropping the returned future abandons the in-flight
    /// reads without leaving partial state anywhere.
    pub async fn list_chats(&self, user_id: &str) -> Result<Vec<ChatSummary>> {
        self.require_user(user_id).await?;

        let memberships = self.backend.memberships_for_user(user_id).await?;
        debug!(
            "aggregating {} chat memberships for {user_id}",
            memberships.len()
        );

        let loads = memberships
            .iter()
            .map(|membership| self.load_summary(user_id, membership));
        let mut summaries = try_join_all(loads).await?;

        sort_chat_summaries(&mut summaries);
        Ok(summaries)
    }

    async fn load_summary(
        &self,
        user_id: &str,
        membership: &ChatMembership,
    ) -> Result<ChatSummary> {
        let meta = self
            .backend
            .get_chat(&membership.chat_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("chat {}", membership.chat_id)))?;

        let relationship = match meta.other_participant(user_id) {
            Some(other) => {
                self.backend
                    .get_relationship(user_id, other)
                    .await?
                    .map(|r| r.status)
                    // A direct chat only exists once a friend request was
                    // accepted, so a missing edge resolves to Friend rather
                    // than Stranger.
                    .unwrap_or(RelationshipStatus::Friend)
            }
            // Groups (and degenerate self-chats) never rank as couples.
            None => RelationshipStatus::Friend,
        };

        let last_message = self.backend.last_message(&membership.chat_id).await?;
        let since = membership.last_read_at.unwrap_or(DateTime::UNIX_EPOCH);
        let unread_count = self.backend.unread_count(&membership.chat_id, since).await?;

        Ok(ChatSummary {
            id: meta.id,
            chat_type: meta.chat_type,
            participant_ids: meta.participant_ids,
            group_name: meta.group_name,
            group_avatar: meta.group_avatar,
            last_message,
            unread_count,
            is_pinned: membership.is_pinned,
            is_muted: membership.is_muted,
            relationship,
        })
    }

    /// Advance the caller's read watermark for the chat to now. Idempotent in
    /// effect and private to the caller's membership.
    pub async fn mark_read(&self, chat_id: &str, user_id: &str) -> Result<()> {
        self.require_user(user_id).await?;
        self.backend
            .get_membership(chat_id, user_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("chat {chat_id}")))?;
        self.backend
            .set_last_read(chat_id, user_id, Utc::now())
            .await?;
        Ok(())
    }

    /// Pin/mute are per-member flags, so this only touches the caller's row.
    pub async fn set_chat_flags(
        &self,
        chat_id: &str,
        user_id: &str,
        pinned: bool,
        muted: bool,
    ) -> Result<()> {
        self.require_user(user_id).await?;
        let mut membership = self
            .backend
            .get_membership(chat_id, user_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("chat {chat_id}")))?;
        membership.is_pinned = pinned;
        membership.is_muted = muted;
        self.backend.put_membership(&membership).await?;
        Ok(())
    }

    pub async fn send_message(
        &self,
        chat_id: &str,
        sender_id: &str,
        kind: MessageKind,
        content: impl Into<String>,
        media_url: Option<String>,
    ) -> Result<Message> {
        self.require_user(sender_id).await?;
        self.backend
            .get_membership(chat_id, sender_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("chat {chat_id}")))?;

        let message = Message {
            id: Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            sender_id: sender_id.to_string(),
            kind,
            content: content.into(),
            media_url,
            timestamp: Utc::now(),
            status: MessageStatus::Sent,
        };
        self.backend.put_message(&message).await?;
        info!("message {} sent to chat {chat_id}", message.id);
        Ok(message)
    }

    pub async fn messages(&self, chat_id: &str, user_id: &str) -> Result<Vec<Message>> {
        self.require_user(user_id).await?;
        self.backend
            .get_membership(chat_id, user_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("chat {chat_id}")))?;
        Ok(self.backend.messages_for_chat(chat_id).await?)
    }

    /// Apply a delivery transition. Status only moves forward
    /// (`Sending → Sent → Delivered → Seen`); a stale update is dropped.
    pub async fn advance_message_status(
        &self,
        chat_id: &str,
        message_id: &str,
        status: MessageStatus,
    ) -> Result<()> {
        let message = self
            .backend
            .get_message(chat_id, message_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("message {message_id}")))?;
        if status <= message.status {
            debug!(
                "dropping stale status {status:?} for message {message_id} (already {:?})",
                message.status
            );
            return Ok(());
        }
        self.backend
            .set_message_status(chat_id, message_id, status)
            .await?;
        Ok(())
    }
}

/// Stable three-key order for the chat list: couples first, pinned next,
/// then last-message recency with message-less chats ranking at the epoch.
pub fn sort_chat_summaries(chats: &mut [ChatSummary]) {
    chats.sort_by(|a, b| {
        let couple_a = a.relationship == RelationshipStatus::Couple;
        let couple_b = b.relationship == RelationshipStatus::Couple;
        couple_b
            .cmp(&couple_a)
            .then_with(|| b.is_pinned.cmp(&a.is_pinned))
            .then_with(|| last_activity(b).cmp(&last_activity(a)))
    });
}

fn last_activity(chat: &ChatSummary) -> DateTime<Utc> {
    chat.last_message
        .as_ref()
        .map(|m| m.timestamp)
        .unwrap_or(DateTime::UNIX_EPOCH)
}
