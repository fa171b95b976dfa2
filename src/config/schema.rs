//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the forum
//! server. All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the forum server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ForumConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Legacy path redirection settings.
    pub redirections: RedirectionConfig,

    /// Named sites that redirection rules may point at
    /// (e.g. `forum = "https://forum.example.org"`).
    pub domains: HashMap<String, String>,

    /// Password hashing worker pool.
    pub hashing: HashingConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:4567").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4567".to_string(),
        }
    }
}

/// Timeout configuration for HTTP requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human readable or JSON lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Redirection rule source.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectionConfig {
    /// File carrying the `redirections` front matter. No file means no rules.
    #[serde(alias = "redirections_file")]
    pub file: Option<PathBuf>,

    /// Prefix for same-host redirect targets (forum mounted under a sub-path).
    pub relative_path: String,

    /// Reload the rules whenever the file changes on disk.
    pub watch: bool,
}

impl Default for RedirectionConfig {
    fn default() -> Self {
        Self {
            file: None,
            relative_path: String::new(),
            watch: true,
        }
    }
}

/// Password hashing worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HashingConfig {
    /// Worker executable. Defaults to `hash-worker` next to the running binary.
    pub worker_program: Option<PathBuf>,

    /// Extra arguments passed to every worker.
    pub worker_args: Vec<String>,

    /// Maximum number of worker processes (and concurrent hashing calls).
    pub pool_size: usize,

    /// Calls allowed to wait for a worker before new calls are rejected.
    pub queue_depth: usize,

    /// Default per-call timeout in milliseconds.
    pub timeout_ms: u64,

    /// bcrypt cost used when hashing new passwords.
    pub bcrypt_rounds: u32,

    /// Debug port of this process; workers are told to use the next one.
    pub debug_port: Option<u16>,

    /// Start `pool_size` workers at boot instead of on first use.
    pub prespawn: bool,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            worker_program: None,
            worker_args: Vec::new(),
            pool_size: 4,
            queue_depth: 64,
            timeout_ms: 10_000,
            bcrypt_rounds: 12,
            debug_port: None,
            prespawn: false,
        }
    }
}
