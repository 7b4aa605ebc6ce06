//! Supervisor configuration with validation.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

/// Placeholder secret shipped in the defaults. Refused outside development.
pub const INSECURE_DEFAULT_SECRET: &str = "curbside-dev-secret-change-me";

/// Main supervisor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// HTTP listener (REST endpoints and the WebSocket upgrade)
    pub http: HttpConfig,
    /// Per-connection WebSocket limits
    pub websocket: WebSocketConfig,
    /// Fan-out delivery policy
    pub delivery: DeliveryConfig,
    /// Nearby-vendor discovery
    pub discovery: DiscoveryConfig,
    /// Credential verification
    pub security: SecurityConfig,
    /// Presence side effects
    pub presence: PresenceConfig,
}

impl SupervisorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.max_body_size == 0 {
            return Err(ConfigError::InvalidLimit("http.max_body_size cannot be 0".into()));
        }
        if self.http.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "http.request_timeout cannot be 0".into(),
            ));
        }

        let ws = &self.websocket;
        if ws.buffer_size == 0 {
            return Err(ConfigError::InvalidLimit("websocket.buffer_size cannot be 0".into()));
        }
        if ws.max_message_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "websocket.max_message_size cannot be 0".into(),
            ));
        }
        if ws.rate_limit == 0 {
            return Err(ConfigError::InvalidLimit("websocket.rate_limit cannot be 0".into()));
        }
        if ws.ping_interval.is_zero() || ws.auth_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "websocket ping_interval and auth_timeout must be positive".into(),
            ));
        }
        if ws.idle_timeout <= ws.ping_interval {
            return Err(ConfigError::InvalidTimeout(format!(
                "websocket.idle_timeout ({:?}) must exceed ping_interval ({:?})",
                ws.idle_timeout, ws.ping_interval
            )));
        }

        if self.delivery.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("delivery.timeout cannot be 0".into()));
        }

        let discovery = &self.discovery;
        if !(discovery.default_radius_km.is_finite() && discovery.default_radius_km > 0.0) {
            return Err(ConfigError::InvalidRadius(format!(
                "default_radius_km must be positive, got {}",
                discovery.default_radius_km
            )));
        }
        if !(discovery.max_radius_km.is_finite()
            && discovery.max_radius_km >= discovery.default_radius_km)
        {
            return Err(ConfigError::InvalidRadius(format!(
                "max_radius_km ({}) must be at least default_radius_km ({})",
                discovery.max_radius_km, discovery.default_radius_km
            )));
        }

        if self.security.token_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }

    /// Whether the token secret is still the shipped placeholder.
    pub fn uses_insecure_secret(&self) -> bool {
        self.security.token_secret == INSECURE_DEFAULT_SECRET
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: IpAddr,
    /// Port (default: 4000)
    pub port: u16,
    /// Max request body size in bytes
    pub max_body_size: usize,
    /// Timeout for plain HTTP requests (not WebSocket sessions)
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 4000,
            max_body_size: 64 * 1024,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// WebSocket session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Outbound events buffered per connection
    pub buffer_size: usize,
    /// Server ping interval
    #[serde(with = "humantime_serde")]
    pub ping_interval: Duration,
    /// Close the connection after this long without any inbound frame
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,
    /// How long an unauthenticated connection may stay open
    #[serde(with = "humantime_serde")]
    pub auth_timeout: Duration,
    /// Maximum inbound message size in bytes
    pub max_message_size: usize,
    /// Inbound messages per second per connection
    pub rate_limit: u32,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            buffer_size: shared_bus::DEFAULT_MAILBOX_CAPACITY,
            ping_interval: Duration::from_secs(25),
            idle_timeout: Duration::from_secs(60),
            auth_timeout: Duration::from_secs(10),
            max_message_size: 16 * 1024,
            rate_limit: 20,
        }
    }
}

/// Fan-out delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Time one subscriber gets to accept an event before it is dropped
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout: shared_bus::DEFAULT_DELIVERY_TIMEOUT,
        }
    }
}

/// Discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub default_radius_km: f64,
    /// Requested radii are clamped to this
    pub max_radius_km: f64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            default_radius_km: 10.0,
            max_radius_km: 50.0,
        }
    }
}

impl DiscoveryConfig {
    /// The radius to search with, given an optional caller request.
    pub fn effective_radius(&self, requested: Option<f64>) -> f64 {
        requested
            .unwrap_or(self.default_radius_km)
            .min(self.max_radius_km)
    }
}

/// Security configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HMAC key for bearer tokens
    pub token_secret: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            token_secret: INSECURE_DEFAULT_SECRET.to_string(),
        }
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

/// Presence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Mark a vendor offline when its last connection closes
    pub auto_offline: bool,
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Invalid discovery radius
    #[error("invalid radius: {0}")]
    InvalidRadius(String),
    /// No token secret configured
    #[error("security.token_secret is empty")]
    MissingSecret,
}
