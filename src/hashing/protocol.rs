//! Wire format between the supervisor and hash workers.
//!
//! One JSON object per line in each direction:
//!
//! ```text
//! → {"type":"hash","rounds":12,"password":"..."}
//! → {"type":"compare","password":"...","hash":"$2b$..."}
//! ← {"result":"$2b$12$..."}   {"result":true}   {"err":"..."}
//! ```

use serde::{Deserialize, Serialize};

/// A unit of work for a worker.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Task {
    Hash { rounds: u32, password: String },
    Compare { password: String, hash: String },
}

impl Task {
    /// Operation name used in logs and metric labels.
    pub fn op(&self) -> &'static str {
        match self {
            Task::Hash { .. } => "hash",
            Task::Compare { .. } => "compare",
        }
    }
}

// Passwords must never reach the logs.
impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Task::Hash { rounds, .. } => f
                .debug_struct("Hash")
                .field("rounds", rounds)
                .field("password", &"<redacted>")
                .finish(),
            Task::Compare { .. } => f
                .debug_struct("Compare")
                .field("password", &"<redacted>")
                .field("hash", &"<redacted>")
                .finish(),
        }
    }
}

/// Successful value of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Hash(String),
    Matched(bool),
}

/// A worker's answer to exactly one task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(default, alias = "error", skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Outcome>,
}

impl Reply {
    pub fn ok(outcome: Outcome) -> Self {
        Self {
            err: None,
            result: Some(outcome),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            err: Some(message.into()),
            result: None,
        }
    }
}
