//! Ports Layer
//!
//! - Driving port (inbound): [`OrderApi`]
//! - Driven port (outbound): [`OrderStore`]

pub mod inbound;
pub mod outbound;

pub use inbound::OrderApi;
pub use outbound::OrderStore;
