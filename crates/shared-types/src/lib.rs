//! # Shared Types Crate
//!
//! This crate contains the marketplace data model, the identities that
//! connections act as, the broadcast channel names and the wire events
//! exchanged with connected clients.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Identity from the session**: Mutating operations take an [`Identity`]
//!   resolved by the authentication collaborator, never an id copied out of a
//!   client payload.
//! - **Stable wire names**: Event names (`vendor_moved`, `new_order`, ...)
//!   and field names (`vendorId`, `currentStop`, ...) are fixed by the
//!   client contract and must not drift.

pub mod channel;
pub mod entities;
pub mod errors;
pub mod events;

pub use channel::{Channel, ChannelParseError};
pub use entities::*;
pub use errors::ErrorKind;
pub use events::*;
