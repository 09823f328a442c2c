//! Block rule model.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pattern dialect of a block rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Case-insensitive whole-string equality.
    Exact,

    /// Wildcard pattern: `*` matches any sequence, `?` any single character.
    Glob,

    /// Regular expression, unanchored (contains-semantics).
    Regex,
}

impl Dialect {
    /// Parse a dialect name. Unrecognized input coerces to [`Dialect::Exact`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "glob" => Dialect::Glob,
            "regex" => Dialect::Regex,
            _ => Dialect::Exact,
        }
    }

    /// Column value stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Exact => "exact",
            Dialect::Glob => "glob",
            Dialect::Regex => "regex",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored block rule with its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRule {
    /// The stored pattern text (lowercased for Exact/Glob, verbatim for Regex).
    pub pattern: String,

    /// Pattern dialect.
    #[serde(rename = "filterType")]
    pub dialect: Dialect,

    /// Insertion time, immutable.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Parse a `created_at` column value.
///
/// Rows written by this code carry RFC 3339; rows filled by the column's
/// `CURRENT_TIMESTAMP` default carry SQLite's `YYYY-MM-DD HH:MM:SS` form.
pub(crate) fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_parse() {
        assert_eq!(Dialect::parse("exact"), Dialect::Exact);
        assert_eq!(Dialect::parse("glob"), Dialect::Glob);
        assert_eq!(Dialect::parse("REGEX"), Dialect::Regex);
        assert_eq!(Dialect::parse(" glob "), Dialect::Glob);

        // Unrecognized dialects coerce to Exact.
        assert_eq!(Dialect::parse("bogus"), Dialect::Exact);
        assert_eq!(Dialect::parse(""), Dialect::Exact);
    }

    #[test]
    fn test_dialect_round_trip() {
        for dialect in [Dialect::Exact, Dialect::Glob, Dialect::Regex] {
            assert_eq!(Dialect::parse(dialect.as_str()), dialect);
        }
    }

    #[test]
    fn test_parse_created_at_rfc3339() {
        let ts = parse_created_at("2024-05-01T12:30:00.123456789+00:00").unwrap();
        assert_eq!(ts.timestamp(), 1714566600);
    }

    #[test]
    fn test_parse_created_at_sqlite_default() {
        let ts = parse_created_at("2024-05-01 12:30:00").unwrap();
        assert_eq!(ts.timestamp(), 1714566600);
    }

    #[test]
    fn test_parse_created_at_garbage() {
        assert!(parse_created_at("not a timestamp").is_none());
    }
}
