//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that redirection domains are absolute URLs
//! - Validate value ranges (timeouts > 0, pool size, bcrypt cost)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ForumConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::ForumConfig;

/// bcrypt accepts costs in this range.
pub const MIN_BCRYPT_ROUNDS: u32 = 4;
pub const MAX_BCRYPT_ROUNDS: u32 = 31;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ForumConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    let relative_path = &config.redirections.relative_path;
    if !relative_path.is_empty() && (!relative_path.starts_with('/') || relative_path.ends_with('/')) {
        errors.push(ValidationError::new(
            "redirections.relative_path",
            "must start with '/' and must not end with '/'",
        ));
    }

    // Sorted so error order is stable across runs.
    let mut domains: Vec<_> = config.domains.iter().collect();
    domains.sort();
    for (name, base) in domains {
        match Url::parse(base) {
            Ok(url) if url.has_host() => {}
            _ => errors.push(ValidationError::new(
                format!("domains.{}", name),
                format!("'{}' is not an absolute URL", base),
            )),
        }
    }

    let hashing = &config.hashing;
    if hashing.pool_size == 0 {
        errors.push(ValidationError::new("hashing.pool_size", "must be greater than 0"));
    }
    if hashing.timeout_ms == 0 {
        errors.push(ValidationError::new("hashing.timeout_ms", "must be greater than 0"));
    }
    if !(MIN_BCRYPT_ROUNDS..=MAX_BCRYPT_ROUNDS).contains(&hashing.bcrypt_rounds) {
        errors.push(ValidationError::new(
            "hashing.bcrypt_rounds",
            format!("must be between {} and {}", MIN_BCRYPT_ROUNDS, MAX_BCRYPT_ROUNDS),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
