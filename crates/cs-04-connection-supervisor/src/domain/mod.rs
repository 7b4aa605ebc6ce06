//! Domain layer for the Connection Supervisor.

pub mod config;
pub mod error;
pub mod session;

pub use config::{
    ConfigError, DeliveryConfig, DiscoveryConfig, HttpConfig, PresenceConfig, SecurityConfig,
    SupervisorConfig, WebSocketConfig, INSECURE_DEFAULT_SECRET,
};
pub use error::{ApiError, SupervisorError};
pub use session::{message_limiter, MessageLimiter, Session};
