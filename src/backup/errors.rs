//! Backup error types
//!
//! Error codes:
//! - WALLET_BACKUP_DISABLED (WARNING severity)
//! - WALLET_BACKUP_LOCKED (WARNING severity)
//! - WALLET_BACKUP_EXISTS (WARNING severity)
//! - WALLET_BACKUP_COPY_FAILED (WARNING severity)
//! - WALLET_BACKUP_DELETE_FAILED (WARNING severity)
//! - WALLET_BACKUP_DIR_FAILED (ERROR severity)
//!
//! A warning means the backup was not taken but the wallet is fine. An
//! error means backups cannot work until the operator intervenes.

use std::fmt;
use std::io;
use std::path::Path;

/// Severity levels for backup errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Backup error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupErrorCode {
    /// Retention counter is zero or a sentinel
    Disabled,
    /// Live wallet is locked and cannot refill its key pool
    Locked,
    /// A backup with the same timestamped name exists
    Exists,
    /// Flushing or copying the wallet file failed
    CopyFailed,
    /// Retention could not remove an old backup
    DeleteFailed,
    /// Backup directory could not be created
    DirFailed,
}

impl BackupErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            BackupErrorCode::Disabled => "WALLET_BACKUP_DISABLED",
            BackupErrorCode::Locked => "WALLET_BACKUP_LOCKED",
            BackupErrorCode::Exists => "WALLET_BACKUP_EXISTS",
            BackupErrorCode::CopyFailed => "WALLET_BACKUP_COPY_FAILED",
            BackupErrorCode::DeleteFailed => "WALLET_BACKUP_DELETE_FAILED",
            BackupErrorCode::DirFailed => "WALLET_BACKUP_DIR_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            BackupErrorCode::DirFailed => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for BackupErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Backup error with context
#[derive(Debug)]
pub struct BackupError {
    code: BackupErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl BackupError {
    fn new(code: BackupErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    fn with_path(mut self, path: &Path) -> Self {
        self.details = Some(format!("path: {}", path.display()));
        self
    }

    fn with_source(mut self, source: io::Error) -> Self {
        self.source = Some(source);
        self
    }

    pub fn disabled() -> Self {
        Self::new(BackupErrorCode::Disabled, "Automatic wallet backups are disabled")
    }

    pub fn locked() -> Self {
        Self::new(
            BackupErrorCode::Locked,
            "Wallet is locked, can't replenish keypool; automatic backups are disabled until it is unlocked",
        )
    }

    pub fn exists(path: &Path) -> Self {
        Self::new(
            BackupErrorCode::Exists,
            "Failed to create backup, file already exists",
        )
        .with_path(path)
    }

    pub fn copy_failed(path: &Path, source: io::Error) -> Self {
        Self::new(BackupErrorCode::CopyFailed, format!("Failed to create backup: {}", source))
            .with_path(path)
            .with_source(source)
    }

    /// Flush of the live store failed before the copy.
    pub fn flush_failed(path: &Path, cause: impl fmt::Display) -> Self {
        Self::new(
            BackupErrorCode::CopyFailed,
            format!("Failed to flush wallet before backup: {}", cause),
        )
        .with_path(path)
    }

    pub fn delete_failed(path: &Path, source: io::Error) -> Self {
        Self::new(
            BackupErrorCode::DeleteFailed,
            format!("Failed to delete backup: {}", source),
        )
        .with_path(path)
        .with_source(source)
    }

    pub fn dir_failed(path: &Path, source: io::Error) -> Self {
        Self::new(
            BackupErrorCode::DirFailed,
            "Wasn't able to create wallet backup folder",
        )
        .with_path(path)
        .with_source(source)
    }

    /// Returns the error code
    pub fn code(&self) -> BackupErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for BackupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for backup operations
pub type BackupResult<T> = Result<T, BackupError>;
