//! Dialect-specific pattern matching.
//!
//! The matcher is a pure function over (candidate, rule). Candidates are
//! normalized (trimmed, lowercased) by the store before they get here.
//!
//! Glob patterns are translated to anchored regexes with every non-wildcard
//! character escaped, so a `.` in a glob matches only a literal dot. Regex
//! patterns are used as-is and unanchored: they match if found anywhere in
//! the candidate, unless the author wrote `^`/`$` themselves.

use regex::Regex;
use tracing::warn;

use crate::rule::Dialect;

/// Evaluate one stored rule against a normalized candidate.
pub fn matches(dialect: Dialect, pattern: &str, candidate: &str) -> bool {
    match dialect {
        Dialect::Exact => candidate == pattern.to_lowercase(),
        Dialect::Glob => match_glob(pattern, candidate),
        Dialect::Regex => match_regex(pattern, candidate),
    }
}

fn match_glob(pattern: &str, candidate: &str) -> bool {
    match glob_to_regex(pattern) {
        Ok(re) => re.is_match(candidate),
        Err(err) => {
            warn!(%pattern, error = %err, "glob pattern failed to compile");
            false
        }
    }
}

fn match_regex(pattern: &str, candidate: &str) -> bool {
    // Stored regex patterns were validated at insertion; a compile failure
    // here means the row predates validation or was edited out of band.
    match Regex::new(pattern) {
        Ok(re) => re.is_match(candidate),
        Err(err) => {
            warn!(%pattern, error = %err, "stored regex failed to compile");
            false
        }
    }
}

/// Translate a glob pattern into an anchored regex.
///
/// `*` becomes `.*`, `?` becomes `.`, everything else is escaped.
pub(crate) fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut translated = String::with_capacity(pattern.len() + 8);
    translated.push('^');

    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '*' => translated.push_str(".*"),
            '?' => translated.push('.'),
            _ => translated.push_str(&regex::escape(ch.encode_utf8(&mut buf))),
        }
    }

    translated.push('$');
    Regex::new(&translated)
}
