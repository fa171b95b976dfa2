//! Shared, hot-swappable holder of the current rule table.
//!
//! # Responsibilities
//! - Load the table lazily on first use
//! - Reload on demand (file watcher, SIGHUP)
//! - Hand out immutable snapshots to request handlers
//!
//! # Design Decisions
//! - Readers never lock: `ArcSwap` publishes a fully built table
//! - Reloads are serialized so a slower, older read cannot overwrite a newer one
//! - A failed load publishes an empty table; it never propagates

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

use arc_swap::ArcSwap;

use crate::config::RedirectionConfig;
use crate::observability::metrics;
use crate::redirection::table::{LoadState, RuleSource, RuleTable};

pub struct RedirectStore {
    source: RuleSource,
    table: ArcSwap<RuleTable>,
    init: Once,
    reload_lock: Mutex<()>,
}

impl RedirectStore {
    pub fn new(config: &RedirectionConfig, domains: &HashMap<String, String>) -> Self {
        Self::from_source(RuleSource::new(config, domains))
    }

    pub fn from_source(source: RuleSource) -> Self {
        let table = ArcSwap::from_pointee(RuleTable::uninitialized(&source));
        Self {
            source,
            table,
            init: Once::new(),
            reload_lock: Mutex::new(()),
        }
    }

    /// Current table, loading it first if nothing has been loaded yet.
    pub fn snapshot(&self) -> Arc<RuleTable> {
        self.init.call_once(|| {
            self.reload();
        });
        self.table.load_full()
    }

    /// Run the initial load on the blocking pool.
    ///
    /// Call before serving so no request task waits on file I/O or
    /// pattern compilation inside [`snapshot`](RedirectStore::snapshot).
    pub async fn preload(self: Arc<Self>) -> Result<Arc<RuleTable>, tokio::task::JoinError> {
        tokio::task::spawn_blocking(move || self.snapshot()).await
    }

    /// Current table without triggering the initial load.
    pub fn peek(&self) -> Arc<RuleTable> {
        self.table.load_full()
    }

    /// Re-read the rule file and publish the result.
    pub fn reload(&self) -> LoadState {
        let _guard = self.reload_lock.lock().expect("redirect reload mutex poisoned");

        let table = match RuleTable::load(&self.source) {
            Ok(table) => {
                tracing::info!(
                    rules = table.len(),
                    path = ?self.source.file,
                    "Loaded redirection rules"
                );
                table
            }
            Err(e) => {
                tracing::error!(
                    path = ?self.source.file,
                    error = %e,
                    load_failure = e.is_load_failure(),
                    "Failed to load redirection rules, all requests pass through"
                );
                RuleTable::failed(&self.source)
            }
        };

        let state = table.state();
        self.table.store(Arc::new(table));
        metrics::record_redirect_reload(state.as_str());
        state
    }

    /// Redirect target for `path`, if any rule matches.
    pub fn resolve(&self, path: &str) -> Option<String> {
        self.snapshot().resolve(path)
    }

    pub fn source(&self) -> &RuleSource {
        &self.source
    }
}

impl std::fmt::Debug for RedirectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.peek();
        f.debug_struct("RedirectStore")
            .field("file", &self.source.file)
            .field("state", &table.state())
            .field("rules", &table.len())
            .finish()
    }
}
