//! Table and index definitions.
//!
//! Both tables live in one database file so the blocklist and the request
//! log share a single serialized writer.

use rusqlite::Connection;

/// Create tables and indexes if they do not exist.
pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS blocked_domains (
            domain TEXT PRIMARY KEY,
            filter_type TEXT DEFAULT 'exact' CHECK(filter_type IN ('exact', 'glob', 'regex')),
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp INTEGER NOT NULL,
            host TEXT NOT NULL,
            method TEXT NOT NULL,
            path TEXT NOT NULL,
            port INTEGER NOT NULL,
            decision TEXT NOT NULL,
            duration REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_requests_timestamp ON requests(timestamp);
        CREATE INDEX IF NOT EXISTS idx_requests_decision ON requests(decision);
        CREATE INDEX IF NOT EXISTS idx_requests_host ON requests(host);",
    )
}
