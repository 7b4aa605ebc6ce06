//! # Market Configuration
//!
//! Loaded in three steps:
//!
//! 1. Defaults, or the TOML file named by `CS_CONFIG`
//! 2. Environment overrides
//! 3. Validation
//!
//! ## Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CS_HTTP_HOST` | `http.host` |
//! | `CS_HTTP_PORT` | `http.port` |
//! | `CS_TOKEN_SECRET` | `security.token_secret` |
//! | `CS_DELIVERY_TIMEOUT_MS` | `delivery.timeout` |
//! | `CS_DEFAULT_RADIUS_KM` | `discovery.default_radius_km` |
//! | `CS_ALLOW_INSECURE_SECRET` | `allow_insecure_secret` |
//!
//! ## Security Requirements
//!
//! The shipped placeholder token secret is refused unless
//! `allow_insecure_secret` is set (development only).

use cs_04_connection_supervisor::{ConfigError as SupervisorConfigError, SupervisorConfig};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Complete process configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Connection Supervisor, discovery and delivery settings.
    #[serde(flatten)]
    pub supervisor: SupervisorConfig,
    /// Accept the placeholder token secret.
    pub allow_insecure_secret: bool,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {var}")]
    InvalidOverride { var: &'static str, value: String },

    #[error(transparent)]
    Invalid(#[from] SupervisorConfigError),

    #[error(
        "SECURITY VIOLATION: token secret is the shipped placeholder. \
         Set CS_TOKEN_SECRET or security.token_secret, or CS_ALLOW_INSECURE_SECRET=1 for development."
    )]
    InsecureSecret,
}

impl MarketConfig {
    /// Load from `CS_CONFIG` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| env::var(key).ok())
    }

    /// Load with an explicit variable source.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup("CS_CONFIG") {
            Some(path) => {
                info!(path = %path, "Loading configuration file");
                Self::from_file(Path::new(&path))?
            }
            None => Self::default(),
        };
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `CS_*` environment overrides.
    pub fn apply_overrides(
        &mut self,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let config = &mut self.supervisor;

        if let Some(host) = lookup("CS_HTTP_HOST") {
            config.http.host = parse("CS_HTTP_HOST", host)?;
        }
        if let Some(port) = lookup("CS_HTTP_PORT") {
            config.http.port = parse("CS_HTTP_PORT", port)?;
        }
        if let Some(secret) = lookup("CS_TOKEN_SECRET") {
            config.security.token_secret = secret;
            info!("Loaded token secret from environment");
        }
        if let Some(ms) = lookup("CS_DELIVERY_TIMEOUT_MS") {
            config.delivery.timeout = Duration::from_millis(parse("CS_DELIVERY_TIMEOUT_MS", ms)?);
        }
        if let Some(radius) = lookup("CS_DEFAULT_RADIUS_KM") {
            config.discovery.default_radius_km = parse("CS_DEFAULT_RADIUS_KM", radius)?;
        }
        if let Some(flag) = lookup("CS_ALLOW_INSECURE_SECRET") {
            self.allow_insecure_secret = flag == "1" || flag.eq_ignore_ascii_case("true");
        }
        Ok(())
    }

    /// Validate limits and refuse the placeholder secret.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.supervisor.validate()?;
        if self.supervisor.uses_insecure_secret() {
            if !self.allow_insecure_secret {
                return Err(ConfigError::InsecureSecret);
            }
            warn!("Running with the placeholder token secret; do not use in production");
        }
        Ok(())
    }
}

fn parse<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidOverride { var, value })
}
