//! Geo Engine error types.

use shared_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeoError {
    /// Latitude or longitude is non-finite or out of range.
    #[error("invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    /// Radius is negative or non-finite.
    #[error("invalid radius: {0} km")]
    InvalidRadius(f64),
}

impl GeoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeoError::InvalidCoordinate { .. } => ErrorKind::InvalidCoordinate,
            GeoError::InvalidRadius(_) => ErrorKind::InvalidRequest,
        }
    }
}
