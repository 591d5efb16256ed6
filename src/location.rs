//! Live location sharing and geofences.

use chrono::Utc;
use futures_util::future::try_join_all;
use log::{debug, info};
use uuid::Uuid;

use crate::client::Client;
use crate::error::{CoreError, Result};
use crate::geo;
use crate::types::location::{Geofence, Location};

fn require_finite_pair(latitude: f64, longitude: f64) -> Result<()> {
    for v in [latitude, longitude] {
        if !v.is_finite() {
            return Err(CoreError::InvalidCoordinate(v));
        }
    }
    Ok(())
}

impl Client {
    /// Append one location history row. Rows written while the caller is in
    /// ghost mode are recorded but flagged, so reads skip them.
    pub async fn update_location(
        &self,
        user_id: &str,
        latitude: f64,
        longitude: f64,
        accuracy: Option<f64>,
        address: Option<String>,
    ) -> Result<Location> {
        let user = self.require_user(user_id).await?;
        require_finite_pair(latitude, longitude)?;

        let location = Location {
            user_id: user_id.to_string(),
            latitude,
            longitude,
            timestamp: Utc::now(),
            accuracy,
            address,
            ghost: user.ghost_mode,
        };
        self.backend.append_location(&location).await?;
        if location.ghost {
            debug!("recorded ghosted location row for {user_id}");
        }
        Ok(location)
    }

    /// The newest non-ghost history row, derived at read time. Rows written
    /// while ghosted stay invisible even after ghost mode is turned off.
    pub async fn current_location(&self, user_id: &str) -> Result<Option<Location>> {
        let history = self.backend.locations_for_user(user_id).await?;
        Ok(history
            .into_iter()
            .filter(|l| !l.ghost)
            .max_by_key(|l| l.timestamp))
    }

    /// Current location of each of the caller's friends, fetched in
    /// parallel. Friends without a visible location are omitted.
    pub async fn friend_locations(&self, user_id: &str) -> Result<Vec<Location>> {
        self.require_user(user_id).await?;
        let edges = self.backend.relationships_for_user(user_id).await?;
        let fetches = edges
            .iter()
            .map(|edge| self.current_location(&edge.related_user_id));
        let located = try_join_all(fetches).await?;
        Ok(located.into_iter().flatten().collect())
    }

    /// Location writes keep flowing while ghosted; only reads change.
    pub async fn set_ghost_mode(&self, user_id: &str, enabled: bool) -> Result<()> {
        let mut user = self.require_user(user_id).await?;
        user.ghost_mode = enabled;
        self.backend.put_user(&user).await?;
        info!("ghost mode for {user_id}: {enabled}");
        Ok(())
    }

    pub async fn create_geofence(
        &self,
        owner_id: &str,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        radius_m: f64,
    ) -> Result<Geofence> {
        self.require_user(owner_id).await?;
        require_finite_pair(latitude, longitude)?;
        if !radius_m.is_finite() {
            return Err(CoreError::InvalidCoordinate(radius_m));
        }

        let geofence = Geofence {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name: name.into(),
            latitude,
            longitude,
            radius_m,
            enabled: true,
        };
        self.backend.put_geofence(&geofence).await?;
        info!("geofence {} created for {owner_id}", geofence.id);
        Ok(geofence)
    }

    /// Geofences are owner-private; a non-owner id behaves as if the fence
    /// did not exist.
    pub async fn delete_geofence(&self, owner_id: &str, geofence_id: &str) -> Result<()> {
        self.require_user(owner_id).await?;
        self.owned_geofence(owner_id, geofence_id).await?;
        self.backend.delete_geofence(geofence_id).await?;
        Ok(())
    }

    pub async fn set_geofence_enabled(
        &self,
        owner_id: &str,
        geofence_id: &str,
        enabled: bool,
    ) -> Result<()> {
        self.require_user(owner_id).await?;
        let mut geofence = self.owned_geofence(owner_id, geofence_id).await?;
        geofence.enabled = enabled;
        self.backend.put_geofence(&geofence).await?;
        Ok(())
    }

    pub async fn geofences(&self, owner_id: &str) -> Result<Vec<Geofence>> {
        self.require_user(owner_id).await?;
        Ok(self.backend.geofences_for_owner(owner_id).await?)
    }

    /// The owner's enabled fences containing the point: the containment side
    /// of presence-based notifications (delivery happens elsewhere).
    pub async fn geofence_hits(
        &self,
        owner_id: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<Geofence>> {
        self.require_user(owner_id).await?;
        require_finite_pair(latitude, longitude)?;

        let mut hits = Vec::new();
        for fence in self.backend.geofences_for_owner(owner_id).await? {
            if fence.enabled && geo::within_geofence(latitude, longitude, &fence)? {
                hits.push(fence);
            }
        }
        Ok(hits)
    }

    async fn owned_geofence(&self, owner_id: &str, geofence_id: &str) -> Result<Geofence> {
        self.backend
            .get_geofence(geofence_id)
            .await?
            .filter(|g| g.owner_id == owner_id)
            .ok_or_else(|| CoreError::not_found(format!("geofence {geofence_id}")))
    }
}
