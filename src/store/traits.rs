use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::store::error::Result;
use crate::types::chat::{ChatMembership, ChatMeta};
use crate::types::location::{Geofence, Location};
use crate::types::message::{Message, MessageStatus};
use crate::types::moment::Moment;
use crate::types::relationship::{FriendRequest, Relationship};
use crate::types::user::User;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;
    /// Upsert by `user.id`.
    async fn put_user(&self, user: &User) -> Result<()>;
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Every membership the user holds, in a deterministic order.
    async fn memberships_for_user(&self, user_id: &str) -> Result<Vec<ChatMembership>>;
    async fn get_membership(&self, chat_id: &str, user_id: &str)
    -> Result<Option<ChatMembership>>;
    async fn put_membership(&self, membership: &ChatMembership) -> Result<()>;
    async fn set_last_read(&self, chat_id: &str, user_id: &str, at: DateTime<Utc>) -> Result<()>;

    async fn get_chat(&self, chat_id: &str) -> Result<Option<ChatMeta>>;
    async fn create_chat(&self, meta: &ChatMeta) -> Result<()>;
    /// The direct chat both users participate in, if one exists.
    async fn find_direct_chat(&self, user_id: &str, other_user_id: &str)
    -> Result<Option<ChatMeta>>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append to the chat's message log.
    async fn put_message(&self, message: &Message) -> Result<()>;
    async fn get_message(&self, chat_id: &str, message_id: &str) -> Result<Option<Message>>;
    async fn set_message_status(
        &self,
        chat_id: &str,
        message_id: &str,
        status: MessageStatus,
    ) -> Result<()>;
    async fn last_message(&self, chat_id: &str) -> Result<Option<Message>>;
    /// Count of messages strictly newer than `since`.
    async fn unread_count(&self, chat_id: &str, since: DateTime<Utc>) -> Result<u64>;
    async fn messages_for_chat(&self, chat_id: &str) -> Result<Vec<Message>>;
}

#[async_trait]
pub trait RelationshipStore: Send + Sync {
    async fn get_relationship(
        &self,
        user_id: &str,
        other_user_id: &str,
    ) -> Result<Option<Relationship>>;
    /// Upsert by `(user_id, related_user_id)`.
    async fn put_relationship(&self, relationship: &Relationship) -> Result<()>;
    async fn delete_relationship(&self, user_id: &str, other_user_id: &str) -> Result<()>;
    /// Outgoing edges of the user, in a deterministic order.
    async fn relationships_for_user(&self, user_id: &str) -> Result<Vec<Relationship>>;

    async fn get_request(&self, request_id: &str) -> Result<Option<FriendRequest>>;
    /// Upsert by `request.id`.
    async fn put_request(&self, request: &FriendRequest) -> Result<()>;
    async fn pending_request(
        &self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> Result<Option<FriendRequest>>;
    async fn pending_requests_for(&self, to_user_id: &str) -> Result<Vec<FriendRequest>>;
}

#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Append one history row; rows are never updated in place.
    async fn append_location(&self, location: &Location) -> Result<()>;
    async fn locations_for_user(&self, user_id: &str) -> Result<Vec<Location>>;

    /// Upsert by `geofence.id`.
    async fn put_geofence(&self, geofence: &Geofence) -> Result<()>;
    async fn get_geofence(&self, geofence_id: &str) -> Result<Option<Geofence>>;
    async fn delete_geofence(&self, geofence_id: &str) -> Result<()>;
    async fn geofences_for_owner(&self, owner_id: &str) -> Result<Vec<Geofence>>;
}

#[async_trait]
pub trait MomentStore: Send + Sync {
    /// Upsert by `moment.id`; reaction and comment edits re-put the row.
    async fn put_moment(&self, moment: &Moment) -> Result<()>;
    async fn get_moment(&self, moment_id: &str) -> Result<Option<Moment>>;
    async fn delete_moment(&self, moment_id: &str) -> Result<()>;
    async fn all_moments(&self) -> Result<Vec<Moment>>;
}

/// The full persistence collaborator the client is built over.
pub trait Backend:
    UserStore + ChatStore + MessageStore + RelationshipStore + LocationStore + MomentStore
{
}

// Blanket implementation for any type that implements every store trait
impl<T> Backend for T where
    T: UserStore + ChatStore + MessageStore + RelationshipStore + LocationStore + MomentStore
{
}
