//! Great-circle distance and delivery estimates.
//!
//! Coordinates are decimal degrees. Distances are kilometres on a sphere of
//! radius [`EARTH_RADIUS_KM`].

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by [`haversine_km`].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance a supplier is assumed to cover per delivery day.
pub const DELIVERY_KM_PER_DAY: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns `true` when the point is finite and inside the
    /// `[-90, 90]` x `[-180, 180]` coordinate box.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Haversine great-circle distance between two points, in kilometres.
///
/// ```text
/// a = sin²(Δlat/2) + cos(lat1)·cos(lat2)·sin²(Δlng/2)
/// d = 2·R·atan2(√a, √(1−a))
/// ```
#[must_use]
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let half_lat = (d_lat / 2.0).sin();
    let half_lng = (d_lng / 2.0).sin();
    let a = half_lat * half_lat
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * half_lng * half_lng;

    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Whole days needed to cover `distance_km`, never less than one.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn estimate_delivery_days(distance_km: f64) -> u32 {
    let days = (distance_km / DELIVERY_KM_PER_DAY).ceil();
    if days.is_nan() || days < 1.0 {
        1
    } else if days >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        days as u32
    }
}
