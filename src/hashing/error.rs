//! Errors surfaced by the hashing bridge.

use std::time::Duration;
use thiserror::Error;

/// Hashing bridge errors.
#[derive(Debug, Error)]
pub enum HashingError {
    /// The worker process could not be started.
    #[error("failed to spawn hash worker '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The worker went away before answering.
    #[error("hash worker exited before replying")]
    Exited,

    /// The worker computed the task and reported a failure.
    #[error("hash worker failed: {0}")]
    WorkerReported(String),

    /// The worker answered with something that is not a valid reply.
    #[error("malformed reply from hash worker: {0}")]
    MalformedReply(String),

    /// No reply within the call's deadline. The worker has been killed.
    #[error("hash worker did not reply within {0:?}")]
    Timeout(Duration),

    /// No worker became free within the call's deadline. No worker was touched.
    #[error("no hash worker became free within {0:?}")]
    QueueTimeout(Duration),

    /// Too many calls are already waiting for a worker.
    #[error("hashing queue is full ({0} calls pending)")]
    Saturated(usize),

    #[error("hashing pool is closed")]
    Closed,

    #[error("hash worker I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HashingError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            HashingError::Spawn { .. } => "spawn",
            HashingError::Exited => "exited",
            HashingError::WorkerReported(_) => "worker_error",
            HashingError::MalformedReply(_) => "malformed",
            HashingError::Timeout(_) => "timeout",
            HashingError::QueueTimeout(_) => "queue_timeout",
            HashingError::Saturated(_) => "saturated",
            HashingError::Closed => "closed",
            HashingError::Io(_) => "io",
        }
    }
}

/// Result type for hashing operations.
pub type HashingResult<T> = Result<T, HashingError>;
