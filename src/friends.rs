//! Friend request workflow and relationship edge lifecycle.

use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;

use crate::client::Client;
use crate::error::{CoreError, Result};
use crate::store::error::StoreError;
use crate::types::chat::{ChatMembership, ChatMeta, ChatType};
use crate::types::relationship::{
    FriendRequest, Relationship, RelationshipStatus, RequestStatus,
};

/// Classify a store failure inside a multi-step mutation: before anything
/// committed it is a plain read/write failure, afterwards the caller must
/// learn which steps already took effect.
fn partial(step: &'static str, completed: &[&'static str], source: StoreError) -> CoreError {
    if completed.is_empty() {
        CoreError::DataUnavailable(source)
    } else {
        warn!("step '{step}' failed after {completed:?}; state needs reconciliation");
        CoreError::PartialFailure {
            step,
            completed: completed.to_vec(),
            source,
        }
    }
}

impl Client {
    /// Create a pending, one-directional request. Re-sending while one is
    /// still pending in the same direction fails `DuplicateRequest`.
    pub async fn send_friend_request(
        &self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> Result<FriendRequest> {
        self.require_user(from_user_id).await?;
        if from_user_id == to_user_id {
            return Err(CoreError::not_found(format!("user {to_user_id}")));
        }
        self.backend
            .get_user(to_user_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("user {to_user_id}")))?;

        if self
            .backend
            .pending_request(from_user_id, to_user_id)
            .await?
            .is_some()
        {
            return Err(CoreError::DuplicateRequest);
        }

        let request = FriendRequest {
            id: Uuid::new_v4().to_string(),
            from_user_id: from_user_id.to_string(),
            to_user_id: to_user_id.to_string(),
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        };
        self.backend.put_request(&request).await?;
        info!("friend request {} sent {from_user_id} -> {to_user_id}", request.id);
        Ok(request)
    }

    /// Accept a request addressed to the caller. As a unit of work this marks
    /// the request accepted, writes both directional `Friend` edges, and
    /// ensures exactly one direct chat with both memberships.
    ///
    /// The backend gives no multi-statement transaction, so a failure after
    /// the first committed step surfaces as [`CoreError::PartialFailure`].
    /// Every step is an upsert or a reuse, which makes the whole operation
    /// safe to re-run after such a failure.
    pub async fn accept_friend_request(&self, request_id: &str, user_id: &str) -> Result<ChatMeta> {
        self.require_user(user_id).await?;
        let request = self
            .backend
            .get_request(request_id)
            .await?
            .filter(|r| r.to_user_id == user_id)
            .ok_or_else(|| CoreError::not_found(format!("friend request {request_id}")))?;
        if request.status == RequestStatus::Rejected {
            return Err(CoreError::not_found(format!("friend request {request_id}")));
        }
        let from = request.from_user_id.as_str();

        let mut completed: Vec<&'static str> = Vec::new();

        if request.status != RequestStatus::Accepted {
            let mut accepted = request.clone();
            accepted.status = RequestStatus::Accepted;
            self.backend
                .put_request(&accepted)
                .await
                .map_err(|e| partial("mark request accepted", &completed, e))?;
        }
        completed.push("mark request accepted");

        self.write_edge(user_id, from, RelationshipStatus::Friend, true)
            .await
            .map_err(|e| partial("create relationship edge", &completed, e))?;
        completed.push("create relationship edge");

        self.write_edge(from, user_id, RelationshipStatus::Friend, true)
            .await
            .map_err(|e| partial("create reverse relationship edge", &completed, e))?;
        completed.push("create reverse relationship edge");

        let chat = match self
            .backend
            .find_direct_chat(user_id, from)
            .await
            .map_err(|e| partial("create direct chat", &completed, e))?
        {
            Some(existing) => existing,
            None => {
                let meta = ChatMeta {
                    id: Uuid::new_v4().to_string(),
                    chat_type: ChatType::Direct,
                    participant_ids: vec![user_id.to_string(), from.to_string()],
                    group_name: None,
                    group_avatar: None,
                };
                self.backend
                    .create_chat(&meta)
                    .await
                    .map_err(|e| partial("create direct chat", &completed, e))?;
                meta
            }
        };
        completed.push("create direct chat");

        for member in [user_id, from] {
            let existing = self
                .backend
                .get_membership(&chat.id, member)
                .await
                .map_err(|e| partial("create chat memberships", &completed, e))?;
            if existing.is_none() {
                self.backend
                    .put_membership(&ChatMembership::new(chat.id.as_str(), member))
                    .await
                    .map_err(|e| partial("create chat memberships", &completed, e))?;
            }
        }

        info!(
            "request {request_id} accepted: {user_id} <-> {from}, chat {}",
            chat.id
        );
        Ok(chat)
    }

    /// Mark a request addressed to the caller rejected. Writes no edges and
    /// no chat; the row is kept so the sender can see the outcome.
    pub async fn reject_friend_request(&self, request_id: &str, user_id: &str) -> Result<()> {
        self.require_user(user_id).await?;
        let request = self
            .backend
            .get_request(request_id)
            .await?
            .filter(|r| r.to_user_id == user_id)
            .ok_or_else(|| CoreError::not_found(format!("friend request {request_id}")))?;

        let mut rejected = request;
        rejected.status = RequestStatus::Rejected;
        self.backend.put_request(&rejected).await?;
        Ok(())
    }

    /// Upgrade an existing friendship to couple status, both directions. The
    /// reverse edge is created if symmetry had drifted. Fails
    /// `RelationshipNotFound` (with no side effects) when the caller has no
    /// edge toward `friend_id`.
    pub async fn upgrade_to_couple(&self, user_id: &str, friend_id: &str) -> Result<()> {
        self.set_couple_status(user_id, friend_id, RelationshipStatus::Couple)
            .await
    }

    /// Downgrade a couple back to friends, both directions.
    pub async fn break_couple(&self, user_id: &str, partner_id: &str) -> Result<()> {
        self.set_couple_status(user_id, partner_id, RelationshipStatus::Friend)
            .await
    }

    async fn set_couple_status(
        &self,
        user_id: &str,
        other_user_id: &str,
        status: RelationshipStatus,
    ) -> Result<()> {
        self.require_user(user_id).await?;
        self.backend
            .get_relationship(user_id, other_user_id)
            .await?
            .ok_or_else(|| CoreError::RelationshipNotFound(other_user_id.to_string()))?;

        let mut completed: Vec<&'static str> = Vec::new();
        self.write_edge(user_id, other_user_id, status, false)
            .await
            .map_err(|e| partial("update caller edge", &completed, e))?;
        completed.push("update caller edge");

        self.write_edge(other_user_id, user_id, status, false)
            .await
            .map_err(|e| partial("update reverse edge", &completed, e))?;

        info!("relationship {user_id} <-> {other_user_id} set to {status}");
        Ok(())
    }

    /// Delete both directional edges. The direct chat row stays behind, as
    /// the app has always left it.
    pub async fn remove_friend(&self, user_id: &str, friend_id: &str) -> Result<()> {
        self.require_user(user_id).await?;
        self.backend
            .get_relationship(user_id, friend_id)
            .await?
            .ok_or_else(|| CoreError::RelationshipNotFound(friend_id.to_string()))?;

        let mut completed: Vec<&'static str> = Vec::new();
        self.backend
            .delete_relationship(user_id, friend_id)
            .await
            .map_err(|e| partial("delete caller edge", &completed, e))?;
        completed.push("delete caller edge");

        self.backend
            .delete_relationship(friend_id, user_id)
            .await
            .map_err(|e| partial("delete reverse edge", &completed, e))?;
        Ok(())
    }

    /// The caller's outgoing edges, newest first.
    pub async fn friends(&self, user_id: &str) -> Result<Vec<Relationship>> {
        self.require_user(user_id).await?;
        let mut edges = self.backend.relationships_for_user(user_id).await?;
        edges.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(edges)
    }

    /// Incoming pending requests, newest first.
    pub async fn pending_requests(&self, user_id: &str) -> Result<Vec<FriendRequest>> {
        self.require_user(user_id).await?;
        let mut requests = self.backend.pending_requests_for(user_id).await?;
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    /// Upsert one directional edge. With `keep_existing` an already-present
    /// edge is left untouched (accept must not downgrade a couple);
    /// otherwise the status is overwritten and `created_at` preserved.
    async fn write_edge(
        &self,
        user_id: &str,
        other_user_id: &str,
        status: RelationshipStatus,
        keep_existing: bool,
    ) -> crate::store::error::Result<()> {
        match self.backend.get_relationship(user_id, other_user_id).await? {
            Some(_) if keep_existing => Ok(()),
            Some(mut existing) => {
                existing.status = status;
                self.backend.put_relationship(&existing).await
            }
            None => {
                self.backend
                    .put_relationship(&Relationship {
                        user_id: user_id.to_string(),
                        related_user_id: other_user_id.to_string(),
                        status,
                        created_at: Utc::now(),
                    })
                    .await
            }
        }
    }
}
