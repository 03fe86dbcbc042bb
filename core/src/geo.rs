//! Great-circle geometry over geographic coordinates.
//!
//! Every distance in the simulation is derived from [`haversine_km`], so a
//! malformed coordinate would silently skew train travel times for the rest of
//! a session. Coordinates are therefore validated on construction and the
//! math helpers assert their inputs in debug builds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in kilometres (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6_371.008_8;

/// Geographic coordinate pair expressed in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint", into = "RawGeoPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Creates a validated coordinate pair.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(GeoError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Creates a coordinate pair from trusted compile-time data.
    ///
    /// Callers must supply finite, in-range degrees; the geo helpers assert
    /// this in debug builds.
    #[must_use]
    pub const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Reports whether the coordinate is finite and within range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        Self::new(self.latitude, self.longitude).is_ok()
    }

    /// Great-circle distance to `other` in kilometres.
    #[must_use]
    pub fn distance_km(self, other: GeoPoint) -> f64 {
        haversine_km(self, other)
    }
}

/// Reasons a coordinate pair may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum GeoError {
    /// One of the components was NaN or infinite.
    #[error("coordinate components must be finite")]
    NotFinite,
    /// Latitude fell outside `-90..=90`.
    #[error("latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(f64),
    /// Longitude fell outside `-180..=180`.
    #[error("longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),
}

#[derive(Clone, Copy, Serialize, Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.latitude, raw.longitude)
    }
}

impl From<GeoPoint> for RawGeoPoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
        }
    }
}

/// Great-circle distance between two points in kilometres.
#[must_use]
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    debug_assert!(from.is_valid(), "malformed coordinate {from:?}");
    debug_assert!(to.is_valid(), "malformed coordinate {to:?}");

    let lat_from = from.latitude.to_radians();
    let lat_to = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let half_chord = (delta_lat / 2.0).sin().powi(2)
        + lat_from.cos() * lat_to.cos() * (delta_lng / 2.0).sin().powi(2);
    let angle = 2.0 * half_chord.sqrt().min(1.0).asin();
    EARTH_RADIUS_KM * angle
}

/// Linear interpolation between two coordinates.
///
/// `fraction` is clamped to `0.0..=1.0`; `0.0` yields `from` and `1.0`
/// yields `to`. Map layers draw route edges as straight segments in degree
/// space, so trains are interpolated the same way.
#[must_use]
pub fn interpolate(from: GeoPoint, to: GeoPoint, fraction: f64) -> GeoPoint {
    debug_assert!(fraction.is_finite(), "interpolation fraction must be finite");
    let t = fraction.clamp(0.0, 1.0);
    GeoPoint {
        latitude: from.latitude + (to.latitude - from.latitude) * t,
        longitude: from.longitude + (to.longitude - from.longitude) * t,
    }
}
