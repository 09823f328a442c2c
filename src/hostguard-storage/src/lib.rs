//! HostGuard Storage - shared SQLite engine.
//!
//! One database file holds both the blocklist (`blocked_domains`) and the
//! request log (`requests`). The [`Database`] handle is cloneable and safe to
//! share across threads; writers serialize on an internal mutex and the
//! connection runs in WAL mode so readers do not block them.
//!
//! # Usage
//!
//! ```rust,no_run
//! use hostguard_storage::Database;
//!
//! fn main() -> hostguard_storage::Result<()> {
//!     let db = Database::open("/var/lib/hostguard")?;
//!     let n: i64 = db.with_conn(|conn| {
//!         conn.query_row("SELECT COUNT(*) FROM blocked_domains", [], |row| row.get(0))
//!     })?;
//!     println!("{n} rules");
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
pub mod schema;

// Re-export main types at crate root
pub use db::{Database, DB_FILE_NAME};
pub use error::{Result, StorageError};
