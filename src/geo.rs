//! Pure geodesic arithmetic for the map and geofencing features.

use crate::error::{CoreError, Result};
use crate::types::location::Geofence;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

fn require_finite(value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoreError::InvalidCoordinate(value))
    }
}

/// Great-circle distance in meters between two points given in degrees,
/// via the Haversine formula.
///
/// Symmetric in its arguments and exactly zero for identical inputs. The
/// intermediate term is clamped to [0, 1] so antipodal and near-pole points
/// cannot push the inverse trig out of domain through float overshoot.
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<f64> {
    for v in [lat1, lon1, lat2, lon2] {
        require_finite(v)?;
    }

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    Ok(EARTH_RADIUS_METERS * c)
}

/// Whether the point lies inside the fence, boundary inclusive. Ignores the
/// fence's `enabled` flag; that gates notification triggering, not geometry.
pub fn within_geofence(lat: f64, lon: f64, geofence: &Geofence) -> Result<bool> {
    let d = distance(lat, lon, geofence.latitude, geofence.longitude)?;
    Ok(d <= geofence.radius_m)
}
