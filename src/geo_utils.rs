//! Geographic utilities.
//!
//! Great-circle distance between coordinates, used by the movement summary
//! to accumulate track length and per-segment speed.

use crate::LatLng;

/// Mean Earth radius in meters used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two latitude/longitude pairs.
///
/// # Example
/// ```
/// use tracklog_import::geo_utils::distance;
///
/// // One degree of latitude is roughly 111 km
/// let d = distance(0.0, 0.0, 1.0, 0.0);
/// assert!((d - 111_195.0).abs() < 1.0);
/// ```
pub fn distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lng2 - lng1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Haversine distance in meters between two points.
pub fn haversine_distance(p1: &LatLng, p2: &LatLng) -> f64 {
    distance(p1.lat, p1.lng, p2.lat, p2.lng)
}
