//! # Location Broadcaster Subsystem
//!
//! **Subsystem ID:** 2
//!
//! Owns the last-known location of every vendor and pushes movement and
//! online-status changes to the rooms that track them.
//!
//! ## Architecture
//!
//! - **Domain** (`domain/`): `LocationUpdate`, `TrackedVendor`, `BroadcastError`
//! - **Ports** (`ports/`): `LocationApi` (inbound), `LocationStore` (outbound)
//! - **Adapters** (`adapters/`): `InMemoryLocationStore`
//! - **Service** (`service.rs`): `LocationBroadcaster`
//!
//! ## Flow
//!
//! ```text
//! update_location(actor, update)
//!   ├─ actor must be Identity::Vendor(update.vendor_id)
//!   ├─ coordinate validated by the geo engine
//!   ├─ per-vendor lock acquired
//!   ├─ store.save(record)            ── failure: error, nothing published
//!   └─ publish vendor_moved ──→ vendor-feed:global
//!                           └─→ vendor:<id>
//! ```
//!
//! Going offline publishes `vendor_status_changed` and keeps the record, so
//! customers see where the vendor was last seen.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::InMemoryLocationStore;
pub use domain::{BroadcastError, LocationUpdate, TrackedVendor};
pub use ports::{LocationApi, LocationStore};
pub use service::LocationBroadcaster;
