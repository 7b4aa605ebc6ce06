//! Location Broadcaster error types.

use cs_01_geo_engine::GeoError;
use shared_types::{ErrorKind, Identity, VendorId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BroadcastError {
    #[error(transparent)]
    InvalidCoordinate(#[from] GeoError),

    /// The acting identity is not the vendor whose record is being mutated.
    #[error("{actor} may not update vendor {vendor_id}")]
    Unauthorized { actor: Identity, vendor_id: VendorId },

    #[error("location store failure: {0}")]
    Persistence(String),
}

impl BroadcastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BroadcastError::InvalidCoordinate(err) => err.kind(),
            BroadcastError::Unauthorized { .. } => ErrorKind::UnauthorizedMutation,
            BroadcastError::Persistence(_) => ErrorKind::PersistenceFailure,
        }
    }
}
