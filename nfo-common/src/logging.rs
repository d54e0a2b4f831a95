//! Tracing subscriber initialization

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Build the env filter: `RUST_LOG` wins, otherwise the configured level
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global fmt subscriber
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(config: &LoggingConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(config))
        .with_target(true)
        .try_init();
}
