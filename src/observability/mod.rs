//! Observability for wallet persistence
//!
//! Structured JSON logging plus a closed set of lifecycle events.
//! Logging never fails the operation it describes.
//!
//! ```ignore
//! use walletdb::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::BackupCreated, &[("path", "/data/backups/wallet.dat.2024-01-01-00-00")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
