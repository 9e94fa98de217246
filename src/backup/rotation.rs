//! Automatic backups and retention
//!
//! # Algorithm
//!
//! 1. Stop if the policy is disabled
//! 2. Create the backup directory if needed (failure disables backups)
//! 3. Snapshot: a live wallet must be unlocked and is flushed first; a
//!    wallet file that is not loaded is copied as is
//! 4. Refuse to overwrite a backup with the same timestamped name
//! 5. Retention: keep the newest N backups of this wallet by mtime

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::observability::{log_event_with_fields, Event};
use crate::storage::WalletStore;
use crate::wallet::WalletModel;

use super::errors::{BackupError, BackupErrorCode, BackupResult, Severity};
use super::policy::BackupPolicy;

/// Suffix appended to the wallet file name, UTC.
pub const BACKUP_SUFFIX_FORMAT: &str = ".%Y-%m-%d-%H-%M";

/// Outcome of one backup run.
///
/// `warning` and `error` hold display strings of the last problem seen;
/// a run can create a backup and still warn about retention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackupReport {
    pub created: Option<PathBuf>,
    pub deleted: Vec<PathBuf>,
    pub warning: Option<String>,
    pub error: Option<String>,
}

impl BackupReport {
    /// No warning and no error.
    pub fn succeeded(&self) -> bool {
        self.warning.is_none() && self.error.is_none()
    }

    fn record(&mut self, err: BackupError) {
        let event = match (err.code(), err.severity()) {
            (BackupErrorCode::Disabled, _) => Event::BackupsDisabled,
            (_, Severity::Error) | (BackupErrorCode::DeleteFailed, _) => Event::BackupFailed,
            _ => Event::BackupSkipped,
        };
        let message = err.to_string();
        log_event_with_fields(event, &[("error", &message)]);
        match err.severity() {
            Severity::Warning => self.warning = Some(message),
            Severity::Error => self.error = Some(message),
        }
    }
}

/// Name of the backup of `wallet_name` taken at `at`.
pub fn backup_file_name(wallet_name: &str, at: DateTime<Utc>) -> String {
    format!("{}{}", wallet_name, at.format(BACKUP_SUFFIX_FORMAT))
}

enum Snapshot<'a, M: ?Sized> {
    Live {
        store: &'a mut WalletStore,
        model: &'a mut M,
    },
    File(&'a Path),
}

/// Backs up a loaded wallet.
pub fn backup_live<M: WalletModel + ?Sized>(
    policy: &BackupPolicy,
    store: &mut WalletStore,
    model: &mut M,
    backups_dir: &Path,
) -> BackupReport {
    backup_live_at(policy, store, model, backups_dir, Utc::now())
}

/// [`backup_live`] with an explicit timestamp.
pub fn backup_live_at<M: WalletModel + ?Sized>(
    policy: &BackupPolicy,
    store: &mut WalletStore,
    model: &mut M,
    backups_dir: &Path,
    now: DateTime<Utc>,
) -> BackupReport {
    let name = wallet_name(store.path());
    run(policy, Snapshot::Live { store, model }, &name, backups_dir, now)
}

/// Backs up a wallet file that is not loaded.
pub fn backup_file(policy: &BackupPolicy, wallet_path: &Path, backups_dir: &Path) -> BackupReport {
    backup_file_at(policy, wallet_path, backups_dir, Utc::now())
}

/// [`backup_file`] with an explicit timestamp.
pub fn backup_file_at(
    policy: &BackupPolicy,
    wallet_path: &Path,
    backups_dir: &Path,
    now: DateTime<Utc>,
) -> BackupReport {
    let name = wallet_name(wallet_path);
    run::<dyn WalletModel>(policy, Snapshot::File(wallet_path), &name, backups_dir, now)
}

fn wallet_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn run<M: WalletModel + ?Sized>(
    policy: &BackupPolicy,
    snapshot: Snapshot<'_, M>,
    name: &str,
    backups_dir: &Path,
    now: DateTime<Utc>,
) -> BackupReport {
    let mut report = BackupReport::default();

    match take_snapshot(policy, snapshot, name, backups_dir, now) {
        Ok(created) => report.created = created,
        Err(err) => {
            report.record(err);
            return report;
        }
    }

    let keep = policy.retention().max(1) as usize;
    let (deleted, failure) = prune_backups(backups_dir, name, keep);
    report.deleted = deleted;
    if let Some(err) = failure {
        report.record(err);
    }
    report
}

fn take_snapshot<M: WalletModel + ?Sized>(
    policy: &BackupPolicy,
    snapshot: Snapshot<'_, M>,
    name: &str,
    backups_dir: &Path,
    now: DateTime<Utc>,
) -> BackupResult<Option<PathBuf>> {
    if !policy.is_enabled() {
        return Err(BackupError::disabled());
    }

    if !backups_dir.exists() {
        fs::create_dir_all(backups_dir).map_err(|e| {
            policy.fail();
            BackupError::dir_failed(backups_dir, e)
        })?;
    }

    let backup_path = backups_dir.join(backup_file_name(name, now));

    match snapshot {
        Snapshot::Live { store, model } => {
            // A locked wallet cannot refill its key pool; a backup taken now
            // would run out of keys after restore.
            if model.is_locked() {
                policy.lock();
                return Err(BackupError::locked());
            }
            if backup_path.exists() {
                return Err(BackupError::exists(&backup_path));
            }
            store.compact().map_err(|e| {
                policy.fail();
                BackupError::flush_failed(&backup_path, e)
            })?;
            copy_durably(store.path(), &backup_path).map_err(|e| {
                policy.fail();
                BackupError::copy_failed(&backup_path, e)
            })?;
            let pool = model.key_pool_size();
            model.set_keys_left_since_backup(pool);
        }
        Snapshot::File(source) => {
            if backup_path.exists() {
                return Err(BackupError::exists(&backup_path));
            }
            // Nothing to back up yet.
            if !source.exists() {
                return Ok(None);
            }
            copy_durably(source, &backup_path).map_err(|e| {
                policy.fail();
                BackupError::copy_failed(&backup_path, e)
            })?;
        }
    }

    log_event_with_fields(
        Event::BackupCreated,
        &[("path", &backup_path.display().to_string())],
    );
    Ok(Some(backup_path))
}

/// Copies a file into a new `target` and fsyncs the copy and its directory.
///
/// An existing `target` is never touched. A copy that fails part way is
/// removed so it cannot pass for a backup.
fn copy_durably(source: &Path, target: &Path) -> io::Result<()> {
    let mut reader = File::open(source)?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)?;

    let copied = io::copy(&mut reader, &mut writer)
        .and_then(|_| writer.set_permissions(reader.metadata()?.permissions()))
        .and_then(|_| writer.sync_all());
    if let Err(e) = copied {
        drop(writer);
        let _ = fs::remove_file(target);
        return Err(e);
    }

    if let Some(dir) = target.parent() {
        OpenOptions::new().read(true).open(dir)?.sync_all()?;
    }
    Ok(())
}

/// Deletes all but the `keep` newest backups of `wallet_name`.
///
/// A backup belongs to the wallet when its file stem equals the wallet
/// file name. Failed deletions do not stop the sweep; the last one is
/// returned.
pub fn prune_backups(
    backups_dir: &Path,
    wallet_name: &str,
    keep: usize,
) -> (Vec<PathBuf>, Option<BackupError>) {
    let entries = match fs::read_dir(backups_dir) {
        Ok(entries) => entries,
        Err(e) => return (Vec::new(), Some(BackupError::delete_failed(backups_dir, e))),
    };

    let mut backups: Vec<(SystemTime, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_stem()
                .map_or(false, |stem| stem.to_string_lossy() == wallet_name)
        })
        .filter_map(|path| {
            let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
            Some((modified, path))
        })
        .collect();
    backups.sort();

    let mut deleted = Vec::new();
    let mut last_failure = None;
    for (_, path) in backups.into_iter().rev().skip(keep) {
        match fs::remove_file(&path) {
            Ok(()) => {
                log_event_with_fields(
                    Event::BackupDeleted,
                    &[("path", &path.display().to_string())],
                );
                deleted.push(path);
            }
            Err(e) => last_failure = Some(BackupError::delete_failed(&path, e)),
        }
    }

    (deleted, last_failure)
}
