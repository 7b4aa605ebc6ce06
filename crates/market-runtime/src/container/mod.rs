//! # Market Container
//!
//! Configuration loading and the dependency-injected subsystem instances.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, MarketConfig};
pub use subsystems::MarketContainer;
