//! Cross-subsystem integration scenarios.

pub mod connection_flow;
pub mod fanout;
pub mod location_flow;
pub mod order_flow;
