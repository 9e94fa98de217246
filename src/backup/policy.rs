//! Shared retention counter
//!
//! One counter serves two purposes: a positive value is the number of
//! backups to keep, zero or below means automatic backups are off, and the
//! negative values record why.

use std::sync::atomic::{AtomicI32, Ordering};

use serde::Serialize;

/// Most backups retention will keep.
pub const MAX_BACKUPS: i32 = 10;

/// Turned off in configuration.
pub const DISABLED_BY_CONFIG: i32 = 0;
/// Turned off after a backup failed.
pub const DISABLED_BY_ERROR: i32 = -1;
/// Turned off because the live wallet was locked.
pub const DISABLED_LOCKED: i32 = -2;

/// Decoded counter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "keep")]
pub enum PolicyState {
    Enabled(i32),
    Disabled,
    Failed,
    Locked,
}

#[derive(Debug)]
pub struct BackupPolicy {
    retention: AtomicI32,
}

impl BackupPolicy {
    /// Creates a policy; values above [`MAX_BACKUPS`] are capped.
    pub fn new(keep: i32) -> Self {
        Self {
            retention: AtomicI32::new(keep.clamp(DISABLED_BY_CONFIG, MAX_BACKUPS)),
        }
    }

    /// Raw counter value.
    pub fn retention(&self) -> i32 {
        self.retention.load(Ordering::SeqCst)
    }

    pub fn is_enabled(&self) -> bool {
        self.retention() > 0
    }

    pub fn state(&self) -> PolicyState {
        match self.retention() {
            n if n > 0 => PolicyState::Enabled(n),
            DISABLED_BY_ERROR => PolicyState::Failed,
            DISABLED_LOCKED => PolicyState::Locked,
            _ => PolicyState::Disabled,
        }
    }

    /// Turns backups off after a failure.
    pub fn fail(&self) {
        self.retention.store(DISABLED_BY_ERROR, Ordering::SeqCst);
    }

    /// Turns backups off because the wallet is locked.
    pub fn lock(&self) {
        self.retention.store(DISABLED_LOCKED, Ordering::SeqCst);
    }
}

impl Default for BackupPolicy {
    fn default() -> Self {
        Self::new(MAX_BACKUPS)
    }
}
