//! Immutable, ordered rule table.
//!
//! A table is built completely (file read, front matter parsed, every rule
//! compiled) before anyone can see it, and is never modified afterwards.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::RedirectionConfig;
use crate::redirection::error::RedirectionError;
use crate::redirection::front_matter;
use crate::redirection::rule::{RawRule, RedirectRule};

/// Where rules come from and how targets are built.
#[derive(Debug, Clone, Default)]
pub struct RuleSource {
    /// Rule file. `None` means there are no rules.
    pub file: Option<PathBuf>,
    /// Prefix for same-host targets.
    pub relative_path: String,
    /// Destination name → base URL.
    pub domains: HashMap<String, String>,
}

impl RuleSource {
    pub fn new(config: &RedirectionConfig, domains: &HashMap<String, String>) -> Self {
        Self {
            file: config.file.clone(),
            relative_path: config.relative_path.clone(),
            domains: domains.clone(),
        }
    }

    fn parsed_domains(&self) -> Result<HashMap<String, Url>, RedirectionError> {
        self.domains
            .iter()
            .map(|(name, base)| {
                Url::parse(base)
                    .map(|url| (name.clone(), url))
                    .map_err(|source| RedirectionError::Domain {
                        name: name.clone(),
                        source,
                    })
            })
            .collect()
    }
}

/// Shape of the front matter.
#[derive(Debug, Deserialize)]
struct RedirectDocument {
    #[serde(default)]
    redirections: Option<Vec<RawRule>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// Nothing loaded yet.
    Uninitialized,
    Loaded,
    /// The last load failed; the table is empty.
    Failed,
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Uninitialized => "uninitialized",
            LoadState::Loaded => "loaded",
            LoadState::Failed => "failed",
        }
    }
}

/// A snapshot of the redirection rules, in priority (file) order.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<RedirectRule>,
    relative_path: String,
    state: LoadState,
    source: Option<PathBuf>,
    loaded_at: Option<SystemTime>,
}

impl RuleTable {
    fn empty(state: LoadState, source: &RuleSource) -> Self {
        Self {
            rules: Vec::new(),
            relative_path: source.relative_path.clone(),
            state,
            source: source.file.clone(),
            loaded_at: None,
        }
    }

    /// The table before the first load.
    pub fn uninitialized(source: &RuleSource) -> Self {
        Self::empty(LoadState::Uninitialized, source)
    }

    /// The table after a failed load: no rules, every request passes through.
    pub fn failed(source: &RuleSource) -> Self {
        Self {
            loaded_at: Some(SystemTime::now()),
            ..Self::empty(LoadState::Failed, source)
        }
    }

    /// Read and compile the rule file named by `source`.
    pub fn load(source: &RuleSource) -> Result<Self, RedirectionError> {
        let rules = match &source.file {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| RedirectionError::Read {
                    path: path.clone(),
                    source: e,
                })?;
                compile_document(&content, &source.parsed_domains()?)?
            }
            None => Vec::new(),
        };

        Ok(Self {
            rules,
            relative_path: source.relative_path.clone(),
            state: LoadState::Loaded,
            source: source.file.clone(),
            loaded_at: Some(SystemTime::now()),
        })
    }

    /// Target for `path` under the first matching rule.
    ///
    /// Off-site rules give an absolute URL; same-host rules give
    /// `relative_path` + rewritten path. Either way the rewritten path is
    /// rooted with exactly one `/`, so a request path can never turn the
    /// target into a protocol-relative URL for another host.
    pub fn resolve(&self, path: &str) -> Option<String> {
        let (rule, rewritten) = self
            .rules
            .iter()
            .find_map(|rule| rule.rewrite(path).map(|rewritten| (rule, rewritten)))?;
        let rewritten = rooted(&rewritten);

        match rule.site() {
            Some(site) => match site.join(&rewritten) {
                Ok(url) => Some(url.to_string()),
                Err(e) => {
                    tracing::warn!(path = %path, origin = rule.origin(), error = %e, "Cannot build redirect URL");
                    None
                }
            },
            None => Some(format!("{}{}", self.relative_path, rewritten)),
        }
    }

    pub fn rules(&self) -> &[RedirectRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn loaded_at(&self) -> Option<SystemTime> {
        self.loaded_at
    }
}

/// `path` with any leading run of `/` or `\` replaced by a single `/`.
fn rooted(path: &str) -> String {
    format!("/{}", path.trim_start_matches(|c: char| c == '/' || c == '\\'))
}

/// Parse a rule file's text into compiled rules, preserving order.
pub fn compile_document(content: &str, domains: &HashMap<String, Url>) -> Result<Vec<RedirectRule>, RedirectionError> {
    let (matter, _body) = front_matter::split(content)?;

    let value: serde_yaml::Value = serde_yaml::from_str(matter)?;
    if value.is_null() {
        return Err(RedirectionError::MissingRules);
    }
    let document: RedirectDocument = serde_yaml::from_value(value)?;
    let raw_rules = document.redirections.ok_or(RedirectionError::MissingRules)?;

    raw_rules
        .iter()
        .enumerate()
        .map(|(index, raw)| RedirectRule::compile(index, raw, domains))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(relative_path: &str) -> RuleSource {
        let mut domains = HashMap::new();
        domains.insert("blog".to_string(), "https://blog.example.org/".to_string());
        RuleSource {
            file: None,
            relative_path: relative_path.to_string(),
            domains,
        }
    }

    fn table(document: &str, relative_path: &str) -> RuleTable {
        let source = source(relative_path);
        let rules = compile_document(document, &source.parsed_domains().unwrap()).unwrap();
        RuleTable {
            rules,
            relative_path: relative_path.to_string(),
            state: LoadState::Loaded,
            source: None,
            loaded_at: None,
        }
    }

    const RULES: &str = r#"---
redirections:
  - origin: /old/a
    path: /new/a
  - origin: /old
    path: /fallback
  - origin: /articles/
    destination: blog
    path: /posts/
---
Legacy URLs from the previous forum.
"#;

    #[test]
    fn test_first_match_wins() {
        let table = table(RULES, "");
        assert_eq!(table.len(), 3);
        assert_eq!(table.resolve("/old/a/extra").as_deref(), Some("/new/a/extra"));
        assert_eq!(table.resolve("/old/b").as_deref(), Some("/fallback/b"));
    }

    #[test]
    fn test_off_site_destination() {
        let table = table(RULES, "/forum");
        assert_eq!(
            table.resolve("/articles/hello").as_deref(),
            Some("https://blog.example.org/posts/hello")
        );
    }

    #[test]
    fn test_same_host_gets_relative_path() {
        let table = table(RULES, "/forum");
        assert_eq!(table.resolve("/OLD/A").as_deref(), Some("/forum/new/a"));
    }

    #[test]
    fn test_whole_path_match_redirects_to_root() {
        let document = "---\nredirections:\n  - origin: /forum\n---\n";

        let bare = table(document, "");
        assert_eq!(bare.resolve("/forum").as_deref(), Some("/"));

        let prefixed = table(document, "/community");
        assert_eq!(prefixed.resolve("/FORUM").as_deref(), Some("/community/"));
    }

    #[test]
    fn test_unrooted_replacement_is_rooted() {
        let table = table("---\nredirections:\n  - origin: /old/\n    path: new/\n---\n", "");
        assert_eq!(table.resolve("/old/page").as_deref(), Some("/new/page"));
    }

    #[test]
    fn test_leading_slashes_cannot_leave_the_host() {
        let document = r#"---
redirections:
  - origin: /forum/
    path: /
  - origin: /articles/
    destination: blog
    path: /
---
"#;
        let table = table(document, "");
        assert_eq!(table.resolve("/forum//evil.example/x").as_deref(), Some("/evil.example/x"));
        assert_eq!(table.resolve("/forum/\\\\evil.example/x").as_deref(), Some("/evil.example/x"));

        let off_site = table.resolve("/articles//evil.example/x").unwrap();
        assert_eq!(off_site, "https://blog.example.org/evil.example/x");
        assert_eq!(
            Url::parse(&off_site).unwrap().host_str(),
            Some("blog.example.org")
        );
    }

    #[test]
    fn test_no_match() {
        let table = table(RULES, "");
        assert_eq!(table.resolve("/recent"), None);
        assert_eq!(table.resolve("/x/old"), None);
    }

    #[test]
    fn test_empty_list_is_valid() {
        let table = table("---\nredirections: []\n---\n", "");
        assert!(table.is_empty());
    }

    #[test]
    fn test_missing_or_malformed_rules_field() {
        let domains = HashMap::new();
        assert!(matches!(
            compile_document("---\ntitle: nope\n---\n", &domains),
            Err(RedirectionError::MissingRules)
        ));
        assert!(matches!(
            compile_document("---\n---\n", &domains),
            Err(RedirectionError::MissingRules)
        ));
        assert!(matches!(
            compile_document("---\nredirections: 5\n---\n", &domains),
            Err(RedirectionError::Yaml(_))
        ));
        assert!(matches!(
            compile_document("---\nredirections: [\n---\n", &domains),
            Err(RedirectionError::Yaml(_))
        ));
        assert!(matches!(
            compile_document("redirections: []\n", &domains),
            Err(RedirectionError::FrontMatter(_))
        ));
    }

    #[test]
    fn test_load_without_file_is_empty() {
        let table = RuleTable::load(&source("")).unwrap();
        assert_eq!(table.state(), LoadState::Loaded);
        assert!(table.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let mut source = source("");
        source.file = Some(PathBuf::from("/definitely/not/here.md"));
        let err = RuleTable::load(&source).unwrap_err();
        assert!(err.is_load_failure());
    }
}
