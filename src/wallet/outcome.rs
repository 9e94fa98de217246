//! Load outcome
//!
//! Ordered from least to most severe so competing conditions combine with
//! `max`.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadOutcome {
    /// Everything loaded
    Ok,
    /// Scan completed; some non-key records were unreadable
    NoncriticalError,
    /// Loaded, but the file must be rewritten to normalize its schema
    NeedRewrite,
    /// Written by newer software (minversion or unknown flags)
    TooNew,
    /// Key material unreadable or the engine failed
    Corrupt,
}

impl LoadOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadOutcome::Ok => "OK",
            LoadOutcome::NoncriticalError => "NONCRITICAL_ERROR",
            LoadOutcome::NeedRewrite => "NEED_REWRITE",
            LoadOutcome::TooNew => "TOO_NEW",
            LoadOutcome::Corrupt => "CORRUPT",
        }
    }

    /// Combines two outcomes, keeping the more severe one.
    pub fn escalate(self, other: LoadOutcome) -> LoadOutcome {
        self.max(other)
    }

    /// The wallet must not be used or auto-migrated.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LoadOutcome::Corrupt | LoadOutcome::TooNew)
    }

    pub fn is_ok(&self) -> bool {
        *self == LoadOutcome::Ok
    }
}

impl fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(LoadOutcome::Corrupt > LoadOutcome::TooNew);
        assert!(LoadOutcome::TooNew > LoadOutcome::NeedRewrite);
        assert!(LoadOutcome::NeedRewrite > LoadOutcome::NoncriticalError);
        assert!(LoadOutcome::NoncriticalError > LoadOutcome::Ok);
    }

    #[test]
    fn test_escalate_keeps_worst() {
        assert_eq!(
            LoadOutcome::TooNew.escalate(LoadOutcome::Corrupt),
            LoadOutcome::Corrupt
        );
        assert_eq!(
            LoadOutcome::Corrupt.escalate(LoadOutcome::TooNew),
            LoadOutcome::Corrupt
        );
        assert_eq!(
            LoadOutcome::Ok.escalate(LoadOutcome::NoncriticalError),
            LoadOutcome::NoncriticalError
        );
    }

    #[test]
    fn test_serializes_as_code() {
        let json = serde_json::to_string(&LoadOutcome::NoncriticalError).unwrap();
        assert_eq!(json, "\"NONCRITICAL_ERROR\"");
        assert!(LoadOutcome::TooNew.is_fatal());
        assert!(!LoadOutcome::NeedRewrite.is_fatal());
    }
}
