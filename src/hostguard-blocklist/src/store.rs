//! Durable blocklist store.
//!
//! Rules live in the shared `blocked_domains` table. The public API follows
//! the embedder contract: booleans out, never panics, never partial writes.
//! Validation failures and storage failures both surface as `false`; the
//! `try_*` variants return the underlying error for embedders that need to
//! tell "not blocked" apart from "store unavailable".

use chrono::Utc;
use rusqlite::params;
use tracing::warn;

use hostguard_storage::{Database, Result};

use crate::matcher;
use crate::rule::{parse_created_at, BlockRule, Dialect};

/// Handle to the block rule table.
#[derive(Debug, Clone)]
pub struct BlocklistStore {
    db: Database,
}

impl BlocklistStore {
    /// Create a store over an opened database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Add a block rule. Idempotent: re-adding an existing pattern succeeds.
    ///
    /// Returns `false` for an empty pattern, an invalid regex, or a storage
    /// failure; nothing is written in any of those cases.
    pub fn add_rule(&self, pattern: &str, dialect: Dialect) -> bool {
        match self.try_add_rule(pattern, dialect) {
            Ok(added) => added,
            Err(err) => {
                warn!(%pattern, %dialect, error = %err, "failed to add block rule");
                false
            }
        }
    }

    /// Add an exact-match rule.
    pub fn add_exact(&self, pattern: &str) -> bool {
        self.add_rule(pattern, Dialect::Exact)
    }

    /// Add a glob rule.
    pub fn add_glob(&self, pattern: &str) -> bool {
        self.add_rule(pattern, Dialect::Glob)
    }

    /// Add a regex rule.
    pub fn add_regex(&self, pattern: &str) -> bool {
        self.add_rule(pattern, Dialect::Regex)
    }

    /// Fallible variant of [`add_rule`](Self::add_rule).
    pub fn try_add_rule(&self, pattern: &str, dialect: Dialect) -> Result<bool> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }

        // Exact and glob patterns match case-insensitively, so they are
        // folded at write time. Regex patterns are stored verbatim.
        let stored = match dialect {
            Dialect::Exact | Dialect::Glob => trimmed.to_lowercase(),
            Dialect::Regex => trimmed.to_string(),
        };

        if dialect == Dialect::Regex {
            if let Err(err) = regex::Regex::new(&stored) {
                warn!(pattern = %stored, error = %err, "rejecting invalid regex pattern");
                return Ok(false);
            }
        }

        let created_at = Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO blocked_domains (domain, filter_type, created_at)
                 VALUES (?1, ?2, ?3)",
                params![stored, dialect.as_str(), created_at],
            )
        })?;
        Ok(true)
    }

    /// Remove a rule by pattern. Idempotent: removing an absent pattern
    /// still returns `true`. Empty input returns `false` without a write.
    pub fn remove_rule(&self, pattern: &str) -> bool {
        match self.try_remove_rule(pattern) {
            Ok(removed) => removed,
            Err(err) => {
                warn!(%pattern, error = %err, "failed to remove block rule");
                false
            }
        }
    }

    /// Fallible variant of [`remove_rule`](Self::remove_rule).
    pub fn try_remove_rule(&self, pattern: &str) -> Result<bool> {
        let normalized = pattern.trim().to_lowercase();
        if normalized.is_empty() {
            return Ok(false);
        }

        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM blocked_domains WHERE domain = ?1",
                params![normalized],
            )
        })?;
        Ok(true)
    }

    /// Check whether a candidate hostname is blocked by any stored rule.
    ///
    /// Logical OR across all rules; the scan short-circuits on the first hit
    /// but the result does not depend on scan order. A storage failure is
    /// logged and reported as not blocked.
    pub fn is_blocked(&self, candidate: &str) -> bool {
        match self.try_is_blocked(candidate) {
            Ok(blocked) => blocked,
            Err(err) => {
                warn!(%candidate, error = %err, "blocklist lookup failed");
                false
            }
        }
    }

    /// Fallible variant of [`is_blocked`](Self::is_blocked).
    pub fn try_is_blocked(&self, candidate: &str) -> Result<bool> {
        let candidate = candidate.trim().to_lowercase();
        if candidate.is_empty() {
            return Ok(false);
        }

        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT domain, filter_type FROM blocked_domains")?;
            let mut rows = stmt.query([])?;

            while let Some(row) = rows.next()? {
                let pattern: String = row.get(0)?;
                let filter_type: String = row.get(1)?;

                if matcher::matches(Dialect::parse(&filter_type), &pattern, &candidate) {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    /// List stored patterns, most recently created first.
    pub fn list_rules(&self) -> Vec<String> {
        match self.try_list_rules() {
            Ok(rules) => rules,
            Err(err) => {
                warn!(error = %err, "failed to list block rules");
                Vec::new()
            }
        }
    }

    /// Fallible variant of [`list_rules`](Self::list_rules).
    pub fn try_list_rules(&self) -> Result<Vec<String>> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT domain FROM blocked_domains ORDER BY created_at DESC")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect()
        })
    }

    /// List stored rules with dialect and creation time, most recent first.
    pub fn list_rules_with_metadata(&self) -> Vec<BlockRule> {
        match self.try_list_rules_with_metadata() {
            Ok(rules) => rules,
            Err(err) => {
                warn!(error = %err, "failed to list block rules with metadata");
                Vec::new()
            }
        }
    }

    /// Fallible variant of [`list_rules_with_metadata`](Self::list_rules_with_metadata).
    pub fn try_list_rules_with_metadata(&self) -> Result<Vec<BlockRule>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT domain, filter_type, created_at FROM blocked_domains
                 ORDER BY created_at DESC",
            )?;
            let mut rows = stmt.query([])?;

            let mut rules = Vec::new();
            while let Some(row) = rows.next()? {
                let pattern: String = row.get(0)?;
                let filter_type: String = row.get(1)?;
                let raw_created_at: String = row.get(2)?;

                let Some(created_at) = parse_created_at(&raw_created_at) else {
                    warn!(%pattern, created_at = %raw_created_at, "skipping rule with unparsable timestamp");
                    continue;
                };

                rules.push(BlockRule {
                    pattern,
                    dialect: Dialect::parse(&filter_type),
                    created_at,
                });
            }
            Ok(rules)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    fn store() -> BlocklistStore {
        BlocklistStore::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn test_add_and_match_exact() {
        let store = store();

        assert!(store.add_exact("Example.COM"));
        assert!(store.is_blocked("example.com"));
        assert!(store.is_blocked("EXAMPLE.COM"));
        assert!(store.is_blocked("  example.com  "));
        assert!(!store.is_blocked("example.comx"));
        assert!(!store.is_blocked("sub.example.com"));
    }

    #[test]
    fn test_add_is_idempotent() {
        let store = store();

        assert!(store.add_exact("example.com"));
        assert!(store.add_exact("example.com"));
        assert_eq!(store.list_rules().len(), 1);
    }

    #[test]
    fn test_glob_rules() {
        let store = store();

        assert!(store.add_glob("*.example.com"));
        assert!(store.is_blocked("sub.example.com"));
        assert!(store.is_blocked("api.example.com"));
        assert!(!store.is_blocked("example.com"));
        assert!(!store.is_blocked("other.com"));
    }

    #[test]
    fn test_regex_rules() {
        let store = store();

        assert!(store.add_regex(r".*\.example\.com$"));
        assert!(store.is_blocked("sub.example.com"));
        assert!(!store.is_blocked("example.com"));
        assert!(!store.is_blocked("other.com"));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let store = store();

        assert!(!store.add_regex("invalid-regex["));
        assert!(store.list_rules().is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = store();

        store.add_exact("example.com");
        assert!(store.remove_rule("EXAMPLE.com"));
        assert!(!store.is_blocked("example.com"));

        // Second removal of an absent row still succeeds.
        assert!(store.remove_rule("example.com"));
    }

    #[test]
    fn test_empty_input_is_a_no_op() {
        let store = store();

        assert!(!store.add_rule("", Dialect::Exact));
        assert!(!store.add_rule("   ", Dialect::Glob));
        assert!(!store.remove_rule(""));
        assert!(!store.remove_rule("  "));
        assert!(!store.is_blocked(""));
        assert!(!store.is_blocked("   "));
        assert!(store.list_rules().is_empty());
    }

    #[test]
    fn test_list_rules_newest_first() {
        let store = store();

        for pattern in ["first.com", "second.com", "third.com"] {
            assert!(store.add_exact(pattern));
            // created_at carries sub-second precision; keep inserts apart.
            thread::sleep(Duration::from_millis(2));
        }

        let rules = store.list_rules();
        assert_eq!(rules, vec!["third.com", "second.com", "first.com"]);
    }

    #[test]
    fn test_list_rules_with_metadata() {
        let store = store();

        store.add_exact("exact.com");
        store.add_glob("*.glob.com");
        store.add_regex(r".*\.regex\.com$");

        let rules = store.list_rules_with_metadata();
        assert_eq!(rules.len(), 3);

        let dialect_of = |pattern: &str| {
            rules
                .iter()
                .find(|r| r.pattern == pattern)
                .map(|r| r.dialect)
        };
        assert_eq!(dialect_of("exact.com"), Some(Dialect::Exact));
        assert_eq!(dialect_of("*.glob.com"), Some(Dialect::Glob));
        assert_eq!(dialect_of(r".*\.regex\.com$"), Some(Dialect::Regex));
    }

    #[test]
    fn test_rules_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = BlocklistStore::new(Database::open(dir.path()).unwrap());
            assert!(store.add_exact("example.com"));
        }

        let store = BlocklistStore::new(Database::open(dir.path()).unwrap());
        assert!(store.is_blocked("example.com"));
    }

    #[test]
    fn test_concurrent_adds_all_land() {
        let store = Arc::new(store());

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let pattern = format!("test{i}.com");
                    assert!(store.add_exact(&pattern));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let rules = store.list_rules();
        assert_eq!(rules.len(), 10);
        for i in 0..10 {
            assert!(store.is_blocked(&format!("test{i}.com")));
        }
    }
}
