//! Rule file watcher for hot reload.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::redirection::store::RedirectStore;

/// Watches the redirection file and reloads the store when it changes.
///
/// The parent directory is watched rather than the file itself: editors
/// and deploy tools often replace the file by renaming a new one over it,
/// which a watch on the old inode would miss.
pub struct RuleWatcher {
    store: Arc<RedirectStore>,
    dir: PathBuf,
    file_name: OsString,
}

impl RuleWatcher {
    /// `None` when the store has no file to watch.
    pub fn new(store: Arc<RedirectStore>) -> Option<Self> {
        let path = store.source().file.clone()?;
        let file_name = path.file_name()?.to_os_string();
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Some(Self { store, dir, file_name })
    }

    fn concerns(&self, event: &Event) -> bool {
        (event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove())
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(self.file_name.as_os_str()))
    }

    /// Start watching. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = self.dir.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if self.concerns(&event) {
                        tracing::info!(kind = ?event.kind, "Redirection file change detected, reloading...");
                        self.store.reload();
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(Path::new(&dir), RecursiveMode::NonRecursive)?;

        tracing::info!(dir = ?dir, "Redirection watcher started");
        Ok(watcher)
    }
}
