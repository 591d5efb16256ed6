//! The moments photo feed: posts, reactions, comments, visibility.

use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::client::Client;
use crate::error::{CoreError, Result};
use crate::types::moment::{Moment, MomentComment, MomentVisibility, Reaction};

impl Client {
    /// Every moment visible to the caller, newest first. Own and `Public`
    /// moments always show; `Friends` requires a relationship edge from the
    /// viewer; `Selected` shows to the owner only (the data model carries no
    /// audience list).
    pub async fn moments_feed(&self, user_id: &str) -> Result<Vec<Moment>> {
        self.require_user(user_id).await?;

        let mut feed = Vec::new();
        for moment in self.backend.all_moments().await? {
            if self.can_view_moment(user_id, &moment).await? {
                feed.push(moment);
            }
        }
        feed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(feed)
    }

    async fn can_view_moment(&self, viewer_id: &str, moment: &Moment) -> Result<bool> {
        if moment.user_id == viewer_id {
            return Ok(true);
        }
        match moment.visibility {
            MomentVisibility::Public => Ok(true),
            MomentVisibility::Selected => Ok(false),
            MomentVisibility::Friends => Ok(self
                .backend
                .get_relationship(viewer_id, &moment.user_id)
                .await?
                .is_some()),
        }
    }

    pub async fn post_moment(
        &self,
        user_id: &str,
        image_url: impl Into<String>,
        caption: Option<String>,
    ) -> Result<Moment> {
        self.require_user(user_id).await?;
        let moment = Moment {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            image_url: image_url.into(),
            caption,
            timestamp: Utc::now(),
            visibility: MomentVisibility::Friends,
            reactions: Vec::new(),
            comments: Vec::new(),
        };
        self.backend.put_moment(&moment).await?;
        info!("moment {} posted by {user_id}", moment.id);
        Ok(moment)
    }

    pub async fn delete_moment(&self, user_id: &str, moment_id: &str) -> Result<()> {
        self.require_user(user_id).await?;
        self.owned_moment(user_id, moment_id).await?;
        self.backend.delete_moment(moment_id).await?;
        Ok(())
    }

    /// One reaction per user per moment; a new emoji replaces the old one.
    pub async fn react_to_moment(
        &self,
        user_id: &str,
        moment_id: &str,
        emoji: impl Into<String>,
    ) -> Result<()> {
        self.require_user(user_id).await?;
        let mut moment = self.visible_moment(user_id, moment_id).await?;
        moment.reactions.retain(|r| r.user_id != user_id);
        moment.reactions.push(Reaction {
            user_id: user_id.to_string(),
            emoji: emoji.into(),
            timestamp: Utc::now(),
        });
        self.backend.put_moment(&moment).await?;
        Ok(())
    }

    pub async fn remove_reaction(&self, user_id: &str, moment_id: &str) -> Result<()> {
        self.require_user(user_id).await?;
        let mut moment = self.visible_moment(user_id, moment_id).await?;
        moment.reactions.retain(|r| r.user_id != user_id);
        self.backend.put_moment(&moment).await?;
        Ok(())
    }

    pub async fn comment_on_moment(
        &self,
        user_id: &str,
        moment_id: &str,
        content: impl Into<String>,
    ) -> Result<MomentComment> {
        self.require_user(user_id).await?;
        let mut moment = self.visible_moment(user_id, moment_id).await?;
        let comment = MomentComment {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            content: content.into(),
            timestamp: Utc::now(),
        };
        moment.comments.push(comment.clone());
        self.backend.put_moment(&moment).await?;
        Ok(comment)
    }

    async fn owned_moment(&self, user_id: &str, moment_id: &str) -> Result<Moment> {
        self.backend
            .get_moment(moment_id)
            .await?
            .filter(|m| m.user_id == user_id)
            .ok_or_else(|| CoreError::not_found(format!("moment {moment_id}")))
    }

    /// A moment the caller is allowed to interact with; invisible moments
    /// behave as missing.
    async fn visible_moment(&self, user_id: &str, moment_id: &str) -> Result<Moment> {
        let moment = self
            .backend
            .get_moment(moment_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("moment {moment_id}")))?;
        if !self.can_view_moment(user_id, &moment).await? {
            return Err(CoreError::not_found(format!("moment {moment_id}")));
        }
        Ok(moment)
    }
}
