//! Database handle shared by the blocklist store and the request log.
//!
//! SQLite is used in WAL mode with a single serialized writer. The handle is
//! cheap to clone; all clones share one connection guarded by a mutex, so
//! concurrent callers serialize on the lock rather than on SQLITE_BUSY.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;
use crate::schema;

/// File name of the database inside the data directory.
pub const DB_FILE_NAME: &str = "hostguard.db";

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Shared handle to the HostGuard SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the database under `base_dir`.
    ///
    /// Creates the directory if it does not exist, applies the connection
    /// pragmas and runs the schema migration.
    pub fn open(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        std::fs::create_dir_all(base_dir)?;

        let path = base_dir.join(DB_FILE_NAME);
        let conn = Connection::open(&path)?;
        configure(&conn)?;
        schema::migrate(&conn)?;

        debug!(path = %path.display(), "database opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// Open an in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        configure(&conn)?;
        schema::migrate(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run a closure against the connection, serializing with other callers.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&conn)?)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn configure(conn: &Connection) -> Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();

        let path = dir.path().join(DB_FILE_NAME);
        assert!(path.exists());
        assert_eq!(db.path(), Some(path.as_path()));
    }

    #[test]
    fn test_open_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data").join("hostguard");

        let db = Database::open(&nested).unwrap();
        assert!(db.path().unwrap().exists());
    }

    #[test]
    fn test_open_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        drop(Database::open(dir.path()).unwrap());
        // Re-opening runs the migration again against existing tables.
        Database::open(dir.path()).unwrap();
    }

    #[test]
    fn test_clones_share_data() {
        let db = Database::open_in_memory().unwrap();
        let other = db.clone();

        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO blocked_domains (domain, filter_type) VALUES ('example.com', 'exact')",
                [],
            )
        })
        .unwrap();

        let count: i64 = other
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM blocked_domains", [], |row| row.get(0))
            })
            .unwrap();
        assert_eq!(count, 1);
    }
}
