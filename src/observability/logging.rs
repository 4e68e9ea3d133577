//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from config and environment
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for machine consumption, pretty format for terminals
//! - `RUST_LOG` wins over the configured level
//! - Logs go to stderr; stdout carries command output

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Build the level filter: `RUST_LOG` if set, else `banter_uploader=<log_level>`.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("banter_uploader={}", config.log_level)))
}

/// Install the global subscriber. Safe to call more than once.
pub fn init_logging(config: &ObservabilityConfig) {
    let json_layer = config.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!config.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    let result = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(json_layer)
        .with(text_layer)
        .try_init();

    if result.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}
