//! Redirection rule compilation and matching.
//!
//! # Design Decisions
//! - Origins are anchored at the start of the path only (prefix match)
//!   and are case-insensitive
//! - The origin is wrapped in a group before anchoring so an alternation
//!   like `a|b` is anchored as a whole
//! - Only the first occurrence is rewritten; `$1` / `${name}` in the
//!   replacement expand capture groups

use std::borrow::Cow;
use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use url::Url;

use crate::redirection::error::RedirectionError;

/// A rule as written in the front matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawRule {
    /// Regex source matched against the request path.
    pub origin: String,

    /// Key into the `domains` map. Empty or absent means same host.
    #[serde(default)]
    pub destination: Option<String>,

    /// Replacement for the matched part of the path.
    #[serde(default)]
    pub path: Option<String>,
}

/// A compiled, ready-to-match rule.
#[derive(Debug, Clone)]
pub struct RedirectRule {
    origin: Regex,
    path: String,
    site: Option<Url>,
}

impl RedirectRule {
    /// Compile `raw`, the `index`-th rule of its file.
    pub fn compile(index: usize, raw: &RawRule, domains: &HashMap<String, Url>) -> Result<Self, RedirectionError> {
        let origin = RegexBuilder::new(&format!("^(?:{})", raw.origin))
            .case_insensitive(true)
            .build()
            .map_err(|source| RedirectionError::Pattern {
                index,
                origin: raw.origin.clone(),
                source,
            })?;

        let site = match raw.destination.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) => Some(domains.get(name).cloned().ok_or_else(|| {
                RedirectionError::UnknownDestination {
                    index,
                    destination: name.to_string(),
                }
            })?),
        };

        Ok(Self {
            origin,
            path: raw.path.clone().unwrap_or_default(),
            site,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.origin.is_match(path)
    }

    /// The path with its matched prefix replaced, or `None` if it does not match.
    pub fn rewrite<'p>(&self, path: &'p str) -> Option<Cow<'p, str>> {
        if !self.matches(path) {
            return None;
        }
        Some(self.origin.replace(path, self.path.as_str()))
    }

    /// Site the redirect points at, if it leaves this host.
    pub fn site(&self) -> Option<&Url> {
        self.site.as_ref()
    }

    pub fn origin(&self) -> &str {
        self.origin.as_str()
    }
}
