//! Blocklist store and matcher for HostGuard.
//!
//! This crate decides, for any candidate hostname, whether it is blocked.
//! Rules are persisted in the shared SQLite database and expressed in one of
//! three dialects:
//!
//! - **Exact** — case-insensitive whole-string equality
//! - **Glob** — `*` and `?` wildcards, anchored full-string match
//! - **Regex** — arbitrary pattern, unanchored contains-semantics
//!
//! # Example
//!
//! ```rust,no_run
//! use hostguard_blocklist::{BlocklistStore, Dialect};
//! use hostguard_storage::Database;
//!
//! let db = Database::open("/var/lib/hostguard").unwrap();
//! let blocklist = BlocklistStore::new(db);
//!
//! blocklist.add_rule("*.tracker.net", Dialect::Glob);
//! assert!(blocklist.is_blocked("ads.tracker.net"));
//! assert!(!blocklist.is_blocked("tracker.net"));
//! ```
//!
//! The interception layer calls [`BlocklistStore::is_blocked`] on every
//! connection attempt; the dashboard uses the `list_*` methods. Operations
//! run synchronously on the caller and serialize on the shared database
//! handle.

pub mod matcher;
pub mod rule;
pub mod store;

pub use rule::{BlockRule, Dialect};
pub use store::BlocklistStore;
