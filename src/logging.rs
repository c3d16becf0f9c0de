//! Structured logging setup
//!
//! Logs go to stderr so stdout stays reserved for response envelopes.
//! `RUST_LOG` directives take precedence over the configured level.

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` does not say otherwise
pub fn default_level(config: &LoggingConfig, verbose: bool) -> Result<Level> {
    if verbose {
        return Ok(Level::DEBUG);
    }
    config
        .level
        .to_lowercase()
        .parse()
        .with_context(|| format!("Invalid log level: {}", config.level))
}

/// Install the global subscriber
///
/// # Errors
///
/// Fails on an unknown level or if a global subscriber is already set.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = default_level(config, verbose)?;
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match config.format.to_lowercase().as_str() {
        "json" => builder.json().try_init(),
        "pretty" => builder.pretty().try_init(),
        _ => builder.compact().try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}
