//! Connection-decision events.

use serde::{Deserialize, Serialize};

/// Outcome of a connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn from_approved(approved: bool) -> Self {
        if approved {
            Decision::Approved
        } else {
            Decision::Rejected
        }
    }

    /// Column value stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
        }
    }

    pub(crate) fn parse(s: &str) -> Self {
        if s == "approved" {
            Decision::Approved
        } else {
            Decision::Rejected
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One connection attempt waiting to be persisted.
///
/// The row timestamp is assigned by the writer at persistence time, not
/// carried here; `duration_nanos` is the matcher evaluation time captured by
/// the producer before enqueue.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub host: String,
    pub method: String,
    pub path: String,
    pub port: u16,
    pub approved: bool,
    pub duration_nanos: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_round_trip() {
        assert_eq!(Decision::from_approved(true), Decision::Approved);
        assert_eq!(Decision::from_approved(false), Decision::Rejected);
        assert_eq!(Decision::parse("approved"), Decision::Approved);
        assert_eq!(Decision::parse("rejected"), Decision::Rejected);
        // Anything unexpected counts as rejected.
        assert_eq!(Decision::parse("weird"), Decision::Rejected);
    }
}
