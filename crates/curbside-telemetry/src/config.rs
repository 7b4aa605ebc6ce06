//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for process logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to the startup record
    pub service_name: String,

    /// Filter directive (`info`, `cs_04_connection_supervisor=debug,info`, ...)
    pub log_level: String,

    /// Emit one JSON object per line instead of human-readable output
    pub json_logs: bool,

    /// Colorize human-readable output
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "curbside".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CS_SERVICE_NAME`: Service name (default: curbside)
    /// - `CS_LOG_LEVEL` or `RUST_LOG`: Filter directive (default: info)
    /// - `CS_JSON_LOGS`: JSON output (default: false in dev, true in containers)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        let json_logs = lookup("CS_JSON_LOGS")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(is_container);

        Self {
            service_name: lookup("CS_SERVICE_NAME").unwrap_or_else(|| "curbside".to_string()),
            log_level: lookup("CS_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| "info".to_string()),
            json_logs,
            ansi: !json_logs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> TelemetryConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TelemetryConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config, TelemetryConfig::default());
    }

    #[test]
    fn test_level_precedence() {
        let config = config_from(&[("RUST_LOG", "warn")]);
        assert_eq!(config.log_level, "warn");

        let config = config_from(&[("RUST_LOG", "warn"), ("CS_LOG_LEVEL", "debug")]);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_json_in_containers() {
        let config = config_from(&[("KUBERNETES_SERVICE_HOST", "10.0.0.1")]);
        assert!(config.json_logs);
        assert!(!config.ansi);

        let config = config_from(&[("DOCKER_CONTAINER", "1"), ("CS_JSON_LOGS", "false")]);
        assert!(!config.json_logs);

        let config = config_from(&[("CS_JSON_LOGS", "1")]);
        assert!(config.json_logs);
    }
}
