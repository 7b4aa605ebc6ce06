//! Ports Layer
//!
//! - Driving port (inbound): [`LocationApi`], used by the connection supervisor
//! - Driven port (outbound): [`LocationStore`], the persistence collaborator

pub mod inbound;
pub mod outbound;

pub use inbound::LocationApi;
pub use outbound::LocationStore;
