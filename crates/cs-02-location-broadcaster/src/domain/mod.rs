//! Domain layer for the Location Broadcaster.

pub mod entities;
pub mod errors;

pub use entities::{LocationUpdate, TrackedVendor};
pub use errors::BroadcastError;
