//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` overrides the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ServerConfig};

/// Resolve the output format for this deployment.
pub fn effective_format(config: &ServerConfig) -> LogFormat {
    match config.observability.log_format {
        LogFormat::Auto if config.is_production() => LogFormat::Json,
        LogFormat::Auto => LogFormat::Pretty,
        other => other,
    }
}

/// Default filter directive when `RUST_LOG` is unset.
pub fn default_directive(level: &str) -> String {
    format!("route_host={level},tower_http={level}")
}

/// Initialize the global tracing subscriber.
pub fn init_logging(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(&config.observability.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match effective_format(config) {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
