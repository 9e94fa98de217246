//! JSON line logger
//!
//! One event per line on stderr, keys sorted so the same event always
//! prints the same way. stdout is left to command output.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    /// Something was skipped or disabled; the operation went on
    Warn,
    /// The operation failed
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Logger;

impl Logger {
    /// Writes one event line. Write failures are dropped.
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        let line = render(severity, event, fields);
        let _ = io::stderr().lock().write_all(line.as_bytes());
    }
}

/// `event` and `severity` win over fields of the same name.
fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut record: BTreeMap<&str, &str> = fields.iter().copied().collect();
    record.insert("event", event);
    record.insert("severity", severity.as_str());

    let mut line = serde_json::to_string(&record).unwrap_or_default();
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_is_one_json_object() {
        let line = render(Severity::Warn, "WALLET_RECORD_SKIPPED", &[("tag", "name")]);
        assert!(line.ends_with('\n'));

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "WALLET_RECORD_SKIPPED");
        assert_eq!(parsed["severity"], "WARN");
        assert_eq!(parsed["tag"], "name");
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let a = render(Severity::Info, "E", &[("unknown", "1"), ("keys", "2")]);
        let b = render(Severity::Info, "E", &[("keys", "2"), ("unknown", "1")]);
        assert_eq!(a, b);
        assert!(a.find("keys").unwrap() < a.find("unknown").unwrap());
    }

    #[test]
    fn test_reserved_names_are_not_overridden() {
        let line = render(Severity::Error, "E", &[("event", "spoofed")]);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "E");
    }

    #[test]
    fn test_control_characters_stay_on_one_line() {
        let line = render(Severity::Info, "E", &[("message", "bad \"label\"\nline2\u{1}")]);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["message"], "bad \"label\"\nline2\u{1}");
        assert_eq!(line.matches('\n').count(), 1);
    }
}
