//! # Shared Bus - Room Router and Presence Registry
//!
//! Fans marketplace events out to the live connections subscribed to a
//! channel, and tracks which identities are currently connected.
//!
//! ## Routing Pattern
//!
//! ```text
//! ┌──────────────────┐                       ┌──────────────────┐
//! │ Broadcaster /    │      publish()        │ Connection A     │
//! │ Order Sync       │ ──────┐          ┌──→ │ (mailbox)        │
//! └──────────────────┘       │          │    └──────────────────┘
//!                            ▼          │    ┌──────────────────┐
//!                     ┌──────────────┐  ├──→ │ Connection B     │
//!                     │ Room Router  │ ─┤    └──────────────────┘
//!                     │ channel →    │  │    ┌──────────────────┐
//!                     │ subscribers  │  └──→ │ Connection C     │
//!                     └──────────────┘       └──────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **Exhaustive unsubscription:** `unsubscribe_all` removes a connection
//!   from every channel under one write lock.
//! - **Bounded delivery:** each subscriber gets the event within the
//!   delivery timeout or is dropped from the channel; the publish still
//!   succeeds for everyone else.
//! - **FIFO per publisher and channel:** deliveries for one publish complete
//!   (or time out) before `publish` returns, and each mailbox is a FIFO queue.
//!
//! The router is an explicit instance handed to its users; there is no
//! process-wide room state.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod connection;
pub mod errors;
pub mod locks;
pub mod presence;
pub mod publisher;
pub mod router;

// Re-export main types
pub use connection::{connection_channel, ConnectionHandle, ConnectionPhase, Mailbox};
pub use errors::{DeliveryError, RouterError};
pub use locks::{KeyedGuard, KeyedLocks};
pub use presence::{Detached, PresenceEntry, PresenceRegistry};
pub use publisher::{EventPublisher, PublishReport};
pub use router::{RoomRouter, RouterStats, RouterStatsSnapshot};

use std::time::Duration;

/// Events buffered per connection mailbox before delivery starts to wait.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

/// How long a single subscriber may take to accept an event.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_millis(250);
