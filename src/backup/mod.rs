//! Automatic wallet backups
//!
//! Backups are plain copies of the wallet file named
//! `<wallet file><.%Y-%m-%d-%H-%M>` in a dedicated directory. A shared
//! [`BackupPolicy`] holds how many to keep, or why backups are off.
//!
//! Backup never fails the caller: every problem ends up as a warning or
//! an error string in the [`BackupReport`].

mod errors;
mod policy;
mod rotation;

pub use errors::{BackupError, BackupErrorCode, BackupResult, Severity};
pub use policy::{
    BackupPolicy, PolicyState, DISABLED_BY_CONFIG, DISABLED_BY_ERROR, DISABLED_LOCKED,
    MAX_BACKUPS,
};
pub use rotation::{
    backup_file, backup_file_at, backup_file_name, backup_live, backup_live_at, prune_backups,
    BackupReport, BACKUP_SUFFIX_FORMAT,
};
