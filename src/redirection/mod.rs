//! Legacy path redirection.
//!
//! # Data Flow
//! ```text
//! redirections file (front matter)
//!     → front_matter.rs (split YAML block from body)
//!     → table.rs (parse, compile rules, keep file order)
//!     → store.rs (atomic swap of Arc<RuleTable>)
//!     → http middleware: snapshot → first matching rule → 301
//!
//! On change:
//!     watcher.rs (notify) or SIGHUP
//!     → store.reload()
//! ```
//!
//! # Design Decisions
//! - First match wins, in file order
//! - Prefix-anchored, case-insensitive origins
//! - Any load failure leaves an empty table: requests pass through

pub mod error;
pub mod front_matter;
pub mod rule;
pub mod store;
pub mod table;
pub mod watcher;

pub use error::RedirectionError;
pub use rule::{RawRule, RedirectRule};
pub use store::RedirectStore;
pub use table::{LoadState, RuleSource, RuleTable};
pub use watcher::RuleWatcher;
