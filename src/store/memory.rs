use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::store::error::{Result, StoreError};
use crate::store::generic::GenericMemoryStore;
use crate::store::traits::*;
use crate::types::chat::{ChatMembership, ChatMeta, ChatType};
use crate::types::location::{Geofence, Location};
use crate::types::message::{Message, MessageStatus};
use crate::types::moment::Moment;
use crate::types::relationship::{FriendRequest, Relationship, RequestStatus};
use crate::types::user::User;

type UserMap = GenericMemoryStore<String, User>;
type ChatMap = GenericMemoryStore<String, ChatMeta>;
type MembershipMap = GenericMemoryStore<(String, String), ChatMembership>; // (chat_id, user_id)
type MessageLog = GenericMemoryStore<String, Vec<Message>>; // chat_id -> append-ordered log
type RelationshipMap = GenericMemoryStore<(String, String), Relationship>; // (user_id, related_user_id)
type RequestMap = GenericMemoryStore<String, FriendRequest>;
type LocationLog = GenericMemoryStore<String, Vec<Location>>; // user_id -> append-ordered history
type GeofenceMap = GenericMemoryStore<String, Geofence>;
type MomentMap = GenericMemoryStore<String, Moment>;

/// In-memory reference backend. Scan results are sorted so aggregation input
/// order is reproducible across runs.
pub struct MemoryStore {
    users: UserMap,
    chats: ChatMap,
    memberships: MembershipMap,
    messages: MessageLog,
    relationships: RelationshipMap,
    requests: RequestMap,
    locations: LocationLog,
    geofences: GeofenceMap,
    moments: MomentMap,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: UserMap::new(),
            chats: ChatMap::new(),
            memberships: MembershipMap::new(),
            messages: MessageLog::new(),
            relationships: RelationshipMap::new(),
            requests: RequestMap::new(),
            locations: LocationLog::new(),
            geofences: GeofenceMap::new(),
            moments: MomentMap::new(),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.users.get(&user_id.to_string()).await)
    }

    async fn put_user(&self, user: &User) -> Result<()> {
        self.users.put(user.id.clone(), user.clone()).await;
        Ok(())
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn memberships_for_user(&self, user_id: &str) -> Result<Vec<ChatMembership>> {
        let mut rows: Vec<ChatMembership> = self
            .memberships
            .entries()
            .await
            .into_iter()
            .filter(|((_, member), _)| member == user_id)
            .map(|(_, m)| m)
            .collect();
        rows.sort_by(|a, b| a.chat_id.cmp(&b.chat_id));
        Ok(rows)
    }

    async fn get_membership(
        &self,
        chat_id: &str,
        user_id: &str,
    ) -> Result<Option<ChatMembership>> {
        Ok(self
            .memberships
            .get(&(chat_id.to_string(), user_id.to_string()))
            .await)
    }

    async fn put_membership(&self, membership: &ChatMembership) -> Result<()> {
        self.memberships
            .put(
                (membership.chat_id.clone(), membership.user_id.clone()),
                membership.clone(),
            )
            .await;
        Ok(())
    }

    async fn set_last_read(&self, chat_id: &str, user_id: &str, at: DateTime<Utc>) -> Result<()> {
        let key = (chat_id.to_string(), user_id.to_string());
        let mut membership = self
            .memberships
            .get(&key)
            .await
            .ok_or_else(|| StoreError::NotFound(format!("membership {chat_id}/{user_id}")))?;
        membership.last_read_at = Some(at);
        self.memberships.put(key, membership).await;
        Ok(())
    }

    async fn get_chat(&self, chat_id: &str) -> Result<Option<ChatMeta>> {
        Ok(self.chats.get(&chat_id.to_string()).await)
    }

    async fn create_chat(&self, meta: &ChatMeta) -> Result<()> {
        self.chats.put(meta.id.clone(), meta.clone()).await;
        Ok(())
    }

    async fn find_direct_chat(
        &self,
        user_id: &str,
        other_user_id: &str,
    ) -> Result<Option<ChatMeta>> {
        let mut candidates: Vec<ChatMeta> = self
            .chats
            .values()
            .await
            .into_iter()
            .filter(|c| {
                c.chat_type == ChatType::Direct
                    && c.participant_ids.iter().any(|p| p == user_id)
                    && c.participant_ids.iter().any(|p| p == other_user_id)
            })
            .collect();
        candidates.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(candidates.into_iter().next())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn put_message(&self, message: &Message) -> Result<()> {
        self.messages
            .update_with(message.chat_id.clone(), |log| log.push(message.clone()))
            .await;
        Ok(())
    }

    async fn get_message(&self, chat_id: &str, message_id: &str) -> Result<Option<Message>> {
        let log = self.messages.get(&chat_id.to_string()).await.unwrap_or_default();
        Ok(log.into_iter().find(|m| m.id == message_id))
    }

    async fn set_message_status(
        &self,
        chat_id: &str,
        message_id: &str,
        status: MessageStatus,
    ) -> Result<()> {
        let key = chat_id.to_string();
        let mut log = self
            .messages
            .get(&key)
            .await
            .ok_or_else(|| StoreError::NotFound(format!("chat log {chat_id}")))?;
        let message = log
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| StoreError::NotFound(format!("message {message_id}")))?;
        message.status = status;
        self.messages.put(key, log).await;
        Ok(())
    }

    async fn last_message(&self, chat_id: &str) -> Result<Option<Message>> {
        let log = self.messages.get(&chat_id.to_string()).await.unwrap_or_default();
        Ok(log.into_iter().max_by_key(|m| m.timestamp))
    }

    async fn unread_count(&self, chat_id: &str, since: DateTime<Utc>) -> Result<u64> {
        let log = self.messages.get(&chat_id.to_string()).await.unwrap_or_default();
        Ok(log.iter().filter(|m| m.timestamp > since).count() as u64)
    }

    async fn messages_for_chat(&self, chat_id: &str) -> Result<Vec<Message>> {
        Ok(self.messages.get(&chat_id.to_string()).await.unwrap_or_default())
    }
}

#[async_trait]
impl RelationshipStore for MemoryStore {
    async fn get_relationship(
        &self,
        user_id: &str,
        other_user_id: &str,
    ) -> Result<Option<Relationship>> {
        Ok(self
            .relationships
            .get(&(user_id.to_string(), other_user_id.to_string()))
            .await)
    }

    async fn put_relationship(&self, relationship: &Relationship) -> Result<()> {
        self.relationships
            .put(
                (
                    relationship.user_id.clone(),
                    relationship.related_user_id.clone(),
                ),
                relationship.clone(),
            )
            .await;
        Ok(())
    }

    async fn delete_relationship(&self, user_id: &str, other_user_id: &str) -> Result<()> {
        self.relationships
            .remove(&(user_id.to_string(), other_user_id.to_string()))
            .await;
        Ok(())
    }

    async fn relationships_for_user(&self, user_id: &str) -> Result<Vec<Relationship>> {
        let mut rows: Vec<Relationship> = self
            .relationships
            .entries()
            .await
            .into_iter()
            .filter(|((owner, _), _)| owner == user_id)
            .map(|(_, r)| r)
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.related_user_id.cmp(&b.related_user_id))
        });
        Ok(rows)
    }

    async fn get_request(&self, request_id: &str) -> Result<Option<FriendRequest>> {
        Ok(self.requests.get(&request_id.to_string()).await)
    }

    async fn put_request(&self, request: &FriendRequest) -> Result<()> {
        self.requests.put(request.id.clone(), request.clone()).await;
        Ok(())
    }

    async fn pending_request(
        &self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> Result<Option<FriendRequest>> {
        Ok(self
            .requests
            .values()
            .await
            .into_iter()
            .filter(|r| {
                r.status == RequestStatus::Pending
                    && r.from_user_id == from_user_id
                    && r.to_user_id == to_user_id
            })
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))))
    }

    async fn pending_requests_for(&self, to_user_id: &str) -> Result<Vec<FriendRequest>> {
        let mut rows: Vec<FriendRequest> = self
            .requests
            .values()
            .await
            .into_iter()
            .filter(|r| r.status == RequestStatus::Pending && r.to_user_id == to_user_id)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    async fn append_location(&self, location: &Location) -> Result<()> {
        self.locations
            .update_with(location.user_id.clone(), |log| log.push(location.clone()))
            .await;
        Ok(())
    }

    async fn locations_for_user(&self, user_id: &str) -> Result<Vec<Location>> {
        Ok(self.locations.get(&user_id.to_string()).await.unwrap_or_default())
    }

    async fn put_geofence(&self, geofence: &Geofence) -> Result<()> {
        self.geofences
            .put(geofence.id.clone(), geofence.clone())
            .await;
        Ok(())
    }

    async fn get_geofence(&self, geofence_id: &str) -> Result<Option<Geofence>> {
        Ok(self.geofences.get(&geofence_id.to_string()).await)
    }

    async fn delete_geofence(&self, geofence_id: &str) -> Result<()> {
        self.geofences.remove(&geofence_id.to_string()).await;
        Ok(())
    }

    async fn geofences_for_owner(&self, owner_id: &str) -> Result<Vec<Geofence>> {
        let mut rows: Vec<Geofence> = self
            .geofences
            .values()
            .await
            .into_iter()
            .filter(|g| g.owner_id == owner_id)
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }
}

#[async_trait]
impl MomentStore for MemoryStore {
    async fn put_moment(&self, moment: &Moment) -> Result<()> {
        self.moments.put(moment.id.clone(), moment.clone()).await;
        Ok(())
    }

    async fn get_moment(&self, moment_id: &str) -> Result<Option<Moment>> {
        Ok(self.moments.get(&moment_id.to_string()).await)
    }

    async fn delete_moment(&self, moment_id: &str) -> Result<()> {
        self.moments.remove(&moment_id.to_string()).await;
        Ok(())
    }

    async fn all_moments(&self) -> Result<Vec<Moment>> {
        let mut rows = self.moments.values().await;
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rows)
    }
}
