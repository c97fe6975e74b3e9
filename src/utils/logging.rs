//! Logging initialization
//!
//! Filter precedence: `RUST_LOG`, then the configured filter, then `info`.
//! Initialization is idempotent; only the first call installs a subscriber.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

fn build_filter(filter: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn ansi_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Install a human-readable subscriber
pub fn init_logging(filter: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(filter))
        .with_ansi(ansi_enabled())
        .with_target(true)
        .try_init();
}

/// Install a JSON subscriber for log aggregation
#[cfg(feature = "json-logging")]
pub fn init_json_logging(filter: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(build_filter(filter))
        .with_target(true)
        .try_init();
}

/// Initialize from the `[logging]` section; defaults when absent
pub fn init_logging_from_config(config: Option<&LoggingConfig>) {
    let filter = config.and_then(|c| c.filter.as_deref());
    match config {
        #[cfg(feature = "json-logging")]
        Some(c) if c.json_format => init_json_logging(filter),
        #[cfg(not(feature = "json-logging"))]
        Some(c) if c.json_format => {
            init_logging(filter);
            tracing::warn!("JSON logging requested but the json-logging feature is disabled");
        }
        _ => init_logging(filter),
    }
}
