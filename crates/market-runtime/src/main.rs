//! # Curbside
//!
//! Entry point of the Curbside server.
//!
//! Environment:
//! - `CS_CONFIG`: optional TOML configuration file
//! - `CS_HTTP_HOST`, `CS_HTTP_PORT`: listener address (default `0.0.0.0:4000`)
//! - `CS_TOKEN_SECRET`: HMAC secret for bearer tokens
//! - `CS_LOG_LEVEL` / `RUST_LOG`, `CS_JSON_LOGS`: logging

use anyhow::{Context, Result};
use curbside_telemetry::{init_telemetry, TelemetryConfig};
use market_runtime::{MarketConfig, MarketRuntime};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    let config = MarketConfig::load().context("Failed to load configuration")?;
    let runtime = MarketRuntime::new(config)?;
    let listener = runtime.bind().await?;
    info!(addr = %listener.local_addr()?, "Curbside is running. Press Ctrl+C to stop.");

    runtime.run_until_ctrl_c(listener).await
}
