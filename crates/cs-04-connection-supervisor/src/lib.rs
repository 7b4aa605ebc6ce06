//! CS-04 Connection Supervisor - live client connections and the HTTP edge.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                   CONNECTION SUPERVISOR (cs-04)                  │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   GET /ws ──→ WebSocketHandler ──┐        REST handlers          │
//! │                reader │ writer   │      (/orders, /vendor/...)   │
//! │                       ▼     ▲    ▼               │               │
//! │              ConnectionSupervisor ◄──────────────┘               │
//! │        identity · room joins · dispatch · cleanup                │
//! └──────┬──────────────┬───────────────┬──────────────┬─────────────┘
//!        ▼              ▼               ▼              ▼
//!   Room Router   Presence Registry  Location       Order
//!   (mailboxes)                      Broadcaster    Synchronizer
//! ```
//!
//! # Connection lifecycle
//!
//! 1. `open` assigns a connection id and registers its mailbox.
//! 2. The credential (upgrade header, `token` query or `authenticate`
//!    event) resolves to an identity; the connection joins the rooms its
//!    role implies.
//! 3. Inbound events are dispatched; failures come back as `error` events.
//! 4. On any exit path `close` unsubscribes the connection from every room
//!    and detaches its presence, exactly once.
//!
//! # Usage
//!
//! ```ignore
//! use cs_04_connection_supervisor::{ConnectionSupervisor, SupervisorDeps, SupervisorService};
//!
//! let supervisor = Arc::new(ConnectionSupervisor::new(deps, config)?);
//! let service = SupervisorService::new(supervisor);
//! let listener = service.bind().await?;
//! service.run(listener, shutdown_signal).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod http;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod supervisor;
pub mod ws;

// Re-export main types
pub use adapters::HmacTokenResolver;
pub use domain::{
    ApiError, ConfigError, DeliveryConfig, DiscoveryConfig, HttpConfig, PresenceConfig,
    SecurityConfig, Session, SupervisorConfig, SupervisorError, WebSocketConfig,
    INSECURE_DEFAULT_SECRET,
};
pub use http::{router, AppState, Caller};
pub use metrics::{MetricsSnapshot, SupervisorMetrics};
pub use ports::IdentityResolver;
pub use service::SupervisorService;
pub use supervisor::{ConnectionSupervisor, SupervisorDeps, SupervisorStats};
pub use ws::WebSocketHandler;
