//! Salvage and rebuild of a damaged store
//!
//! # Sequence
//!
//! 1. Salvage-read the damaged file (damaged batches are skipped)
//! 2. Run every live pair through the filter
//! 3. Write the kept pairs into `<file>.<uuid>.tmp`
//! 4. Rename the original to `<file>.<unix-seconds>.bak`
//! 5. Rename the temporary file into place
//!
//! The original is never modified in place. Until step 4 a failure leaves
//! it exactly as it was.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::observability::{log_event_with_fields, Event};
use crate::storage::{sibling_path, WalletStore};

use super::errors::{RecoveryError, RecoveryResult};
use super::filter::RecordFilter;

/// What a rebuild kept and where the original went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
    /// The damaged original, renamed aside
    pub backup_path: PathBuf,
    pub kept: u64,
    /// Pairs the filter rejected
    pub filtered: u64,
    /// Store batches lost to checksum or framing damage
    pub damaged_batches: u64,
    pub trailing_bytes: u64,
}

impl RecoveryReport {
    /// Salvage read every batch intact.
    pub fn is_lossless(&self) -> bool {
        self.damaged_batches == 0 && self.trailing_bytes == 0
    }
}

/// Rebuilds the store at `path` from whatever still verifies.
pub fn recover(path: &Path, filter: &mut dyn RecordFilter) -> RecoveryResult<RecoveryReport> {
    let display = path.display().to_string();
    log_event_with_fields(Event::RecoveryStart, &[("path", &display)]);

    let salvaged = WalletStore::salvage(path)
        .map_err(|e| fail(RecoveryError::salvage_failed("Salvage read failed", &e)))?;
    if salvaged.pairs.is_empty() {
        return Err(fail(RecoveryError::no_records(&display)));
    }

    let mut kept = Vec::with_capacity(salvaged.pairs.len());
    let mut filtered = 0u64;
    for (key, value) in salvaged.pairs {
        if filter.keep(&key, &value) {
            kept.push((key, value));
        } else {
            filtered += 1;
        }
    }

    let tmp_path = sibling_path(path, &format!("{}.tmp", Uuid::new_v4()));
    let kept_count = match WalletStore::create_from_pairs(&tmp_path, kept) {
        Ok(count) => count,
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            return Err(fail(RecoveryError::salvage_failed(
                "Writing rebuilt store failed",
                &e,
            )));
        }
    };

    let backup_path = sibling_path(path, &format!("{}.bak", Utc::now().timestamp()));
    if let Err(e) = fs::rename(path, &backup_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(fail(RecoveryError::io(
            format!("Failed to rename {} to {}", display, backup_path.display()),
            e,
        )));
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        return Err(fail(RecoveryError::io(
            format!("Failed to move rebuilt store into {}", display),
            e,
        )));
    }

    let report = RecoveryReport {
        backup_path,
        kept: kept_count,
        filtered,
        damaged_batches: salvaged.skipped_batches,
        trailing_bytes: salvaged.trailing_bytes,
    };
    log_event_with_fields(
        Event::RecoveryComplete,
        &[
            ("path", &display),
            ("backup", &report.backup_path.display().to_string()),
            ("kept", &report.kept.to_string()),
            ("filtered", &report.filtered.to_string()),
            ("damaged_batches", &report.damaged_batches.to_string()),
        ],
    );
    Ok(report)
}

fn fail(err: RecoveryError) -> RecoveryError {
    log_event_with_fields(Event::RecoveryFailed, &[("error", &err.to_string())]);
    err
}
