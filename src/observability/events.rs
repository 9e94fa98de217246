//! Lifecycle events for wallet persistence
//!
//! Events are explicit and typed. Each carries its own severity so call
//! sites never pick one ad hoc.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file read and validated
    ConfigLoaded,

    // Load pipeline
    /// Load scan begins
    LoadStart,
    /// Load scan finished with a non-fatal outcome
    LoadComplete,
    /// Load stopped with CORRUPT or TOO_NEW
    LoadAborted,
    /// One record failed to decode and was left alone
    RecordSkipped,
    /// A legacy-format transaction was normalized
    TxUpgraded,
    /// Stored schema version bumped to the current one
    VersionUpgraded,
    /// Transactions without an order position were reordered
    TxReordered,
    /// Transactions erased from the store
    TxZapped,
    /// Legacy file rewritten without its key pool
    WalletRewritten,

    // Recovery
    /// Salvage of a damaged store begins
    RecoveryStart,
    /// Record dropped by the recovery filter
    RecoveryRecordSkipped,
    /// Rebuilt store swapped into place
    RecoveryComplete,
    /// Salvage could not produce a usable store
    RecoveryFailed,

    // Backup
    /// Backup file written
    BackupCreated,
    /// Old backup removed by retention
    BackupDeleted,
    /// Backup not taken; the reason is a warning
    BackupSkipped,
    /// Backup or retention sweep failed
    BackupFailed,
    /// Automatic backups are turned off
    BackupsDisabled,

    // Maintenance
    /// Idle wallet compacted by the periodic sweep
    FlushComplete,
    /// Store rewritten on request
    CompactComplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "WALLET_CONFIG_LOADED",

            Event::LoadStart => "WALLET_LOAD_START",
            Event::LoadComplete => "WALLET_LOAD_COMPLETE",
            Event::LoadAborted => "WALLET_LOAD_ABORTED",
            Event::RecordSkipped => "WALLET_RECORD_SKIPPED",
            Event::TxUpgraded => "WALLET_TX_UPGRADED",
            Event::VersionUpgraded => "WALLET_VERSION_UPGRADED",
            Event::TxReordered => "WALLET_TX_REORDERED",
            Event::TxZapped => "WALLET_TX_ZAPPED",
            Event::WalletRewritten => "WALLET_REWRITTEN",

            Event::RecoveryStart => "WALLET_RECOVERY_START",
            Event::RecoveryRecordSkipped => "WALLET_RECOVERY_RECORD_SKIPPED",
            Event::RecoveryComplete => "WALLET_RECOVERY_COMPLETE",
            Event::RecoveryFailed => "WALLET_RECOVERY_FAILED",

            Event::BackupCreated => "WALLET_BACKUP_CREATED",
            Event::BackupDeleted => "WALLET_BACKUP_DELETED",
            Event::BackupSkipped => "WALLET_BACKUP_SKIPPED",
            Event::BackupFailed => "WALLET_BACKUP_FAILED",
            Event::BackupsDisabled => "WALLET_BACKUPS_DISABLED",

            Event::FlushComplete => "WALLET_FLUSH_COMPLETE",
            Event::CompactComplete => "WALLET_COMPACT_COMPLETE",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::RecordSkipped
            | Event::RecoveryRecordSkipped
            | Event::BackupSkipped
            | Event::BackupsDisabled => Severity::Warn,
            Event::LoadAborted | Event::RecoveryFailed | Event::BackupFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
