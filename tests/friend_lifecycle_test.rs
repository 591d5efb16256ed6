// Integration tests for the friend request workflow: duplicate detection,
// the accept unit of work, couple upgrades, and partial-failure surfacing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tandem::store::error::{Result as StoreResult, StoreError};
use tandem::store::memory::MemoryStore;
use tandem::store::traits::*;
use tandem::types::*;
use tandem::{Client, CoreError};

fn test_client() -> Client {
    let _ = env_logger::builder().is_test(true).try_init();
    Client::new(Arc::new(MemoryStore::new()))
}

async fn seed_user(client: &Client, id: &str) {
    client.backend().put_user(&User::new(id, id)).await.unwrap();
}

async fn befriend(client: &Client, a: &str, b: &str) -> ChatMeta {
    let request = client.send_friend_request(a, b).await.unwrap();
    client.accept_friend_request(&request.id, b).await.unwrap()
}

#[tokio::test]
async fn resend_while_pending_is_a_duplicate() {
    let client = test_client();
    seed_user(&client, "u1").await;
    seed_user(&client, "u2").await;

    client.send_friend_request("u1", "u2").await.unwrap();
    assert!(matches!(
        client.send_friend_request("u1", "u2").await,
        Err(CoreError::DuplicateRequest)
    ));

    // The opposite direction is a different request, not a duplicate.
    client.send_friend_request("u2", "u1").await.unwrap();
}

#[tokio::test]
async fn request_to_unknown_or_self_is_not_found() {
    let client = test_client();
    seed_user(&client, "u1").await;

    assert!(matches!(
        client.send_friend_request("u1", "ghost").await,
        Err(CoreError::NotFound(_))
    ));
    assert!(matches!(
        client.send_friend_request("u1", "u1").await,
        Err(CoreError::NotFound(_))
    ));
    assert!(matches!(
        client.send_friend_request("ghost", "u1").await,
        Err(CoreError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn accept_creates_edges_chat_and_memberships() {
    let client = test_client();
    seed_user(&client, "u1").await;
    seed_user(&client, "u2").await;

    let request = client.send_friend_request("u1", "u2").await.unwrap();
    let chat = client.accept_friend_request(&request.id, "u2").await.unwrap();

    let backend = client.backend();
    let stored = backend.get_request(&request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Accepted);

    for (a, b) in [("u1", "u2"), ("u2", "u1")] {
        let edge = backend.get_relationship(a, b).await.unwrap().unwrap();
        assert_eq!(edge.status, RelationshipStatus::Friend);
    }

    assert_eq!(chat.chat_type, ChatType::Direct);
    assert_eq!(chat.participant_ids.len(), 2);
    for member in ["u1", "u2"] {
        assert!(chat.participant_ids.iter().any(|p| p == member));
        let memberships = backend.memberships_for_user(member).await.unwrap();
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].chat_id, chat.id);
    }
}

#[tokio::test]
async fn accept_is_recipient_only() {
    let client = test_client();
    seed_user(&client, "u1").await;
    seed_user(&client, "u2").await;

    let request = client.send_friend_request("u1", "u2").await.unwrap();
    // Neither the sender nor a bystander can accept.
    assert!(matches!(
        client.accept_friend_request(&request.id, "u1").await,
        Err(CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn accepting_twice_leaves_one_chat() {
    let client = test_client();
    seed_user(&client, "u1").await;
    seed_user(&client, "u2").await;

    let request = client.send_friend_request("u1", "u2").await.unwrap();
    let first = client.accept_friend_request(&request.id, "u2").await.unwrap();
    let second = client.accept_friend_request(&request.id, "u2").await.unwrap();

    assert_eq!(first.id, second.id);
    let memberships = client.backend().memberships_for_user("u1").await.unwrap();
    assert_eq!(memberships.len(), 1);
}

#[tokio::test]
async fn reject_writes_nothing_but_the_status() {
    let client = test_client();
    seed_user(&client, "u1").await;
    seed_user(&client, "u2").await;

    let request = client.send_friend_request("u1", "u2").await.unwrap();
    client.reject_friend_request(&request.id, "u2").await.unwrap();

    let backend = client.backend();
    let stored = backend.get_request(&request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Rejected);
    assert!(backend.get_relationship("u2", "u1").await.unwrap().is_none());
    assert!(backend.find_direct_chat("u1", "u2").await.unwrap().is_none());

    // A rejected request cannot be accepted later.
    assert!(matches!(
        client.accept_friend_request(&request.id, "u2").await,
        Err(CoreError::NotFound(_))
    ));

    // But the sender may try again.
    client.send_friend_request("u1", "u2").await.unwrap();
}

#[tokio::test]
async fn upgrade_without_edge_fails_and_leaves_no_side_effects() {
    let client = test_client();
    seed_user(&client, "u1").await;
    seed_user(&client, "u2").await;

    assert!(matches!(
        client.upgrade_to_couple("u1", "u2").await,
        Err(CoreError::RelationshipNotFound(_))
    ));
    let backend = client.backend();
    assert!(backend.get_relationship("u1", "u2").await.unwrap().is_none());
    assert!(backend.get_relationship("u2", "u1").await.unwrap().is_none());
}

#[tokio::test]
async fn upgrade_and_break_write_both_directions() {
    let client = test_client();
    seed_user(&client, "u1").await;
    seed_user(&client, "u2").await;
    befriend(&client, "u1", "u2").await;

    client.upgrade_to_couple("u1", "u2").await.unwrap();
    let backend = client.backend();
    for (a, b) in [("u1", "u2"), ("u2", "u1")] {
        let edge = backend.get_relationship(a, b).await.unwrap().unwrap();
        assert_eq!(edge.status, RelationshipStatus::Couple);
    }

    client.break_couple("u2", "u1").await.unwrap();
    for (a, b) in [("u1", "u2"), ("u2", "u1")] {
        let edge = backend.get_relationship(a, b).await.unwrap().unwrap();
        assert_eq!(edge.status, RelationshipStatus::Friend);
    }
}

#[tokio::test]
async fn upgrade_repairs_a_missing_reverse_edge() {
    let client = test_client();
    seed_user(&client, "u1").await;
    seed_user(&client, "u2").await;
    befriend(&client, "u1", "u2").await;

    let backend = client.backend();
    backend.delete_relationship("u2", "u1").await.unwrap();

    client.upgrade_to_couple("u1", "u2").await.unwrap();
    let reverse = backend.get_relationship("u2", "u1").await.unwrap().unwrap();
    assert_eq!(reverse.status, RelationshipStatus::Couple);
}

#[tokio::test]
async fn remove_friend_deletes_edges_but_keeps_the_chat() {
    let client = test_client();
    seed_user(&client, "u1").await;
    seed_user(&client, "u2").await;
    let chat = befriend(&client, "u1", "u2").await;

    client.remove_friend("u1", "u2").await.unwrap();

    let backend = client.backend();
    assert!(backend.get_relationship("u1", "u2").await.unwrap().is_none());
    assert!(backend.get_relationship("u2", "u1").await.unwrap().is_none());
    assert!(backend.get_chat(&chat.id).await.unwrap().is_some());
}

#[tokio::test]
async fn friends_listing_is_newest_first() {
    let client = test_client();
    for id in ["u1", "u2", "u3"] {
        seed_user(&client, id).await;
    }
    befriend(&client, "u1", "u2").await;
    befriend(&client, "u1", "u3").await;

    let friends = client.friends("u1").await.unwrap();
    let order: Vec<&str> = friends.iter().map(|f| f.related_user_id.as_str()).collect();
    assert_eq!(order, ["u3", "u2"]);
}

// ---------------------------------------------------------------------------
// Partial failure: a backend whose chat creation can be switched off, so the
// accept sequence commits its relationship edges and then trips.

struct FlakyBackend {
    inner: MemoryStore,
    fail_create_chat: AtomicBool,
}

impl FlakyBackend {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_create_chat: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl UserStore for FlakyBackend {
    async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        self.inner.get_user(user_id).await
    }
    async fn put_user(&self, user: &User) -> StoreResult<()> {
        self.inner.put_user(user).await
    }
}

#[async_trait]
impl ChatStore for FlakyBackend {
    async fn memberships_for_user(&self, user_id: &str) -> StoreResult<Vec<ChatMembership>> {
        self.inner.memberships_for_user(user_id).await
    }
    async fn get_membership(
        &self,
        chat_id: &str,
        user_id: &str,
    ) -> StoreResult<Option<ChatMembership>> {
        self.inner.get_membership(chat_id, user_id).await
    }
    async fn put_membership(&self, membership: &ChatMembership) -> StoreResult<()> {
        self.inner.put_membership(membership).await
    }
    async fn set_last_read(
        &self,
        chat_id: &str,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.inner.set_last_read(chat_id, user_id, at).await
    }
    async fn get_chat(&self, chat_id: &str) -> StoreResult<Option<ChatMeta>> {
        self.inner.get_chat(chat_id).await
    }
    async fn create_chat(&self, meta: &ChatMeta) -> StoreResult<()> {
        if self.fail_create_chat.load(Ordering::SeqCst) {
            return Err(StoreError::Database("simulated write failure".to_string()));
        }
        self.inner.create_chat(meta).await
    }
    async fn find_direct_chat(
        &self,
        user_id: &str,
        other_user_id: &str,
    ) -> StoreResult<Option<ChatMeta>> {
        self.inner.find_direct_chat(user_id, other_user_id).await
    }
}

#[async_trait]
impl MessageStore for FlakyBackend {
    async fn put_message(&self, message: &Message) -> StoreResult<()> {
        self.inner.put_message(message).await
    }
    async fn get_message(&self, chat_id: &str, message_id: &str) -> StoreResult<Option<Message>> {
        self.inner.get_message(chat_id, message_id).await
    }
    async fn set_message_status(
        &self,
        chat_id: &str,
        message_id: &str,
        status: MessageStatus,
    ) -> StoreResult<()> {
        self.inner.set_message_status(chat_id, message_id, status).await
    }
    async fn last_message(&self, chat_id: &str) -> StoreResult<Option<Message>> {
        self.inner.last_message(chat_id).await
    }
    async fn unread_count(&self, chat_id: &str, since: DateTime<Utc>) -> StoreResult<u64> {
        self.inner.unread_count(chat_id, since).await
    }
    async fn messages_for_chat(&self, chat_id: &str) -> StoreResult<Vec<Message>> {
        self.inner.messages_for_chat(chat_id).await
    }
}

#[async_trait]
impl RelationshipStore for FlakyBackend {
    async fn get_relationship(
        &self,
        user_id: &str,
        other_user_id: &str,
    ) -> StoreResult<Option<Relationship>> {
        self.inner.get_relationship(user_id, other_user_id).await
    }
    async fn put_relationship(&self, relationship: &Relationship) -> StoreResult<()> {
        self.inner.put_relationship(relationship).await
    }
    async fn delete_relationship(&self, user_id: &str, other_user_id: &str) -> StoreResult<()> {
        self.inner.delete_relationship(user_id, other_user_id).await
    }
    async fn relationships_for_user(&self, user_id: &str) -> StoreResult<Vec<Relationship>> {
        self.inner.relationships_for_user(user_id).await
    }
    async fn get_request(&self, request_id: &str) -> StoreResult<Option<FriendRequest>> {
        self.inner.get_request(request_id).await
    }
    async fn put_request(&self, request: &FriendRequest) -> StoreResult<()> {
        self.inner.put_request(request).await
    }
    async fn pending_request(
        &self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> StoreResult<Option<FriendRequest>> {
        self.inner.pending_request(from_user_id, to_user_id).await
    }
    async fn pending_requests_for(&self, to_user_id: &str) -> StoreResult<Vec<FriendRequest>> {
        self.inner.pending_requests_for(to_user_id).await
    }
}

#[async_trait]
impl LocationStore for FlakyBackend {
    async fn append_location(&self, location: &Location) -> StoreResult<()> {
        self.inner.append_location(location).await
    }
    async fn locations_for_user(&self, user_id: &str) -> StoreResult<Vec<Location>> {
        self.inner.locations_for_user(user_id).await
    }
    async fn put_geofence(&self, geofence: &Geofence) -> StoreResult<()> {
        self.inner.put_geofence(geofence).await
    }
    async fn get_geofence(&self, geofence_id: &str) -> StoreResult<Option<Geofence>> {
        self.inner.get_geofence(geofence_id).await
    }
    async fn delete_geofence(&self, geofence_id: &str) -> StoreResult<()> {
        self.inner.delete_geofence(geofence_id).await
    }
    async fn geofences_for_owner(&self, owner_id: &str) -> StoreResult<Vec<Geofence>> {
        self.inner.geofences_for_owner(owner_id).await
    }
}

#[async_trait]
impl MomentStore for FlakyBackend {
    async fn put_moment(&self, moment: &Moment) -> StoreResult<()> {
        self.inner.put_moment(moment).await
    }
    async fn get_moment(&self, moment_id: &str) -> StoreResult<Option<Moment>> {
        self.inner.get_moment(moment_id).await
    }
    async fn delete_moment(&self, moment_id: &str) -> StoreResult<()> {
        self.inner.delete_moment(moment_id).await
    }
    async fn all_moments(&self) -> StoreResult<Vec<Moment>> {
        self.inner.all_moments().await
    }
}

#[tokio::test]
async fn accept_surfaces_partial_failure_and_retries_cleanly() {
    let _ = env_logger::builder().is_test(true).try_init();
    let backend = Arc::new(FlakyBackend::new());
    let client = Client::new(backend.clone());
    seed_user(&client, "u1").await;
    seed_user(&client, "u2").await;

    let request = client.send_friend_request("u1", "u2").await.unwrap();

    backend.fail_create_chat.store(true, Ordering::SeqCst);
    let err = client
        .accept_friend_request(&request.id, "u2")
        .await
        .unwrap_err();
    match err {
        CoreError::PartialFailure { step, completed, .. } => {
            assert_eq!(step, "create direct chat");
            assert!(completed.contains(&"create relationship edge"));
            assert!(completed.contains(&"create reverse relationship edge"));
        }
        other => panic!("expected PartialFailure, got {other:?}"),
    }

    // The edges landed even though the chat did not.
    assert!(
        client
            .backend()
            .get_relationship("u1", "u2")
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        client
            .backend()
            .find_direct_chat("u1", "u2")
            .await
            .unwrap()
            .is_none()
    );

    // Retry after the backend recovers: the accepted request and existing
    // edges are re-applied as no-ops, and exactly one chat appears.
    backend.fail_create_chat.store(false, Ordering::SeqCst);
    let chat = client.accept_friend_request(&request.id, "u2").await.unwrap();
    assert!(chat.participant_ids.iter().any(|p| p == "u1"));
    let memberships = client.backend().memberships_for_user("u2").await.unwrap();
    assert_eq!(memberships.len(), 1);
}
