use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of a user's location history. Rows are append-only; "current
/// location" is a read-time derivation, never an in-place update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    /// Reported GPS accuracy in meters.
    pub accuracy: Option<f64>,
    /// Reverse-geocoded street address, when the device supplied one.
    pub address: Option<String>,
    /// Stamped from the owner's ghost-mode setting at write time. Ghost rows
    /// are recorded but never surfaced to readers.
    pub ghost: bool,
}

/// Named circular region owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geofence {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
    pub enabled: bool,
}
