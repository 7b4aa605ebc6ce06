//! # Order Synchronizer Subsystem
//!
//! **Subsystem ID:** 3
//!
//! Owns every order record. Places new orders, walks them through the
//! status graph and tells the other party what changed.
//!
//! ## Architecture
//!
//! - **Domain** (`domain/`): state graph, placement validation, `OrderError`
//! - **Ports** (`ports/`): `OrderApi` (inbound), `OrderStore` (outbound)
//! - **Adapters** (`adapters/`): `InMemoryOrderStore`, `FailingOrderStore`
//! - **Service** (`service.rs`): `OrderSynchronizer`
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Only graph edges are taken | `domain/state.rs` - `is_valid_transition()` |
//! | Only the owning vendor changes status (customer may cancel while pending) | `service.rs` - `authorize()` |
//! | Nothing is published unless the store accepted the write | `service.rs` - save before publish |
//! | Transitions on one order are serialized | `service.rs` - per-order lock |
//!
//! ## Degraded creation
//!
//! If the store rejects a new order, `create` still succeeds with
//! `OrderPlacement::Local(order)`. The vendor is not notified, since there
//! is no record it could act on.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{FailingOrderStore, InMemoryOrderStore};
pub use domain::{allowed_transitions, is_valid_transition, NewOrder, OrderError, OrderPlacement};
pub use ports::{OrderApi, OrderStore};
pub use service::OrderSynchronizer;
