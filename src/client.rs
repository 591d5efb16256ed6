use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::store::traits::Backend;
use crate::types::user::User;

/// Service facade over the persistence collaborator. All state lives behind
/// the backend; the client itself is freely cloneable and shareable.
#[derive(Clone)]
pub struct Client {
    pub(crate) backend: Arc<dyn Backend>,
}

impl Client {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        self.backend.clone()
    }

    /// Resolve the calling user, failing `NotAuthenticated` before any other
    /// read or write happens on their behalf.
    pub(crate) async fn require_user(&self, user_id: &str) -> Result<User> {
        self.backend
            .get_user(user_id)
            .await?
            .ok_or(CoreError::NotAuthenticated)
    }
}
