//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the server and its workers
//! - Configure log level from config, overridable with `RUST_LOG`
//!
//! # Design Decisions
//! - JSON format for production, pretty format for development
//! - Workers log to stderr; their stdout carries the hashing protocol

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(level: &str) -> String {
    format!("forum_server={level},hash_worker={level},tower_http={level}")
}

/// Initialize logging for the server process.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&config.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

/// Initialize logging for a hash worker process.
///
/// Quiet unless the supervisor is being debugged.
pub fn init_worker_logging(debug_port: Option<u16>) {
    let level = if debug_port.is_some() { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
