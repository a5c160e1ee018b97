//! Process-wide `tracing` subscriber.

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` wins over `cfg.level`.
///
/// # Errors
/// Fails when the level is not a valid filter directive or a global
/// subscriber is already installed.
pub fn init(cfg: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&cfg.level)
            .with_context(|| format!("invalid log level '{}'", cfg.level))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = if cfg.json {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    result.context("logging already initialised")
}
