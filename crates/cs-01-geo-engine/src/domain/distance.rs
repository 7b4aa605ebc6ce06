//! Great-circle distance and coordinate validation.

use crate::domain::errors::GeoError;
pub use shared_types::round2;
use shared_types::Coordinates;

/// Mean Earth radius used for all distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// True for finite coordinates inside `[-90, 90]` × `[-180, 180]`.
pub fn is_valid_coordinate(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
}

/// Validate a raw pair into [`Coordinates`].
pub fn validate(lat: f64, lng: f64) -> Result<Coordinates, GeoError> {
    if is_valid_coordinate(lat, lng) {
        Ok(Coordinates::new(lat, lng))
    } else {
        Err(GeoError::InvalidCoordinate { lat, lng })
    }
}

/// Haversine distance in kilometres, rounded to two decimals.
///
/// Deltas enter only through their absolute value, so the result is
/// bit-for-bit symmetric in its arguments.
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let dlat = (lat2 - lat1).abs().to_radians();
    let dlng = (lng2 - lng1).abs().to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    // Guard against a drifting a hair above 1.0 for antipodal points.
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();
    round2(EARTH_RADIUS_KM * c)
}

pub(crate) fn distance_between(a: Coordinates, b: Coordinates) -> f64 {
    distance_km(a.lat, a.lng, b.lat, b.lng)
}
