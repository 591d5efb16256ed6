use chrono::Utc;
use log::debug;

use crate::client::Client;
use crate::error::Result;
use crate::types::user::Presence;

impl Client {
    /// Flip the caller's presence flag. Going offline stamps `last_seen`.
    pub async fn set_presence(&self, user_id: &str, presence: Presence) -> Result<()> {
        let mut user = self.require_user(user_id).await?;
        user.presence = presence;
        if presence == Presence::Offline {
            user.last_seen = Some(Utc::now());
        }
        self.backend.put_user(&user).await?;
        debug!("presence for {user_id} set to {presence:?}");
        Ok(())
    }
}
