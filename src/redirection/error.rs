//! Redirection rule loading errors.
//!
//! None of these reach the request path: the store logs them and publishes
//! an empty table instead.

use std::path::PathBuf;
use thiserror::Error;

use crate::redirection::front_matter::FrontMatterError;

#[derive(Debug, Error)]
pub enum RedirectionError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    FrontMatter(#[from] FrontMatterError),

    #[error("invalid front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("front matter has no 'redirections' list")]
    MissingRules,

    #[error("rule {index}: invalid origin pattern '{origin}': {source}")]
    Pattern {
        index: usize,
        origin: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule {index}: unknown destination '{destination}'")]
    UnknownDestination { index: usize, destination: String },

    #[error("domain '{name}' is not a valid URL: {source}")]
    Domain {
        name: String,
        #[source]
        source: url::ParseError,
    },
}

impl RedirectionError {
    /// Failures of the file itself, as opposed to its `redirections` content.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            RedirectionError::Read { .. } | RedirectionError::FrontMatter(_) | RedirectionError::Yaml(_)
        )
    }
}
