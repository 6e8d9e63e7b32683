//! Tracing bootstrap

use crate::config::LogConfig;
use crate::error::ConfigError;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` if set, the configured directives otherwise
///
/// # Errors
/// - `ConfigError::LogFilter` if the configured directives do not parse
pub fn env_filter(config: &LogConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter).map_err(|e| ConfigError::LogFilter {
        filter: config.filter.clone(),
        detail: e.to_string(),
    })
}

/// Install the global subscriber, writing to stderr
///
/// Returns `Ok(false)` if a subscriber was already installed.
///
/// # Errors
/// - `ConfigError::LogFilter` if the configured directives do not parse
pub fn init_tracing(config: &LogConfig) -> Result<bool, ConfigError> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    Ok(installed.is_ok())
}
