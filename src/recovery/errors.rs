//! Recovery error types
//!
//! Error codes:
//! - WALLET_RECOVERY_ENVIRONMENT (ERROR severity)
//! - WALLET_RECOVERY_IO (ERROR severity)
//! - WALLET_RECOVERY_SALVAGE_FAILED (FATAL severity)
//! - WALLET_RECOVERY_NO_RECORDS (FATAL severity)

use std::fmt;
use std::io;

use crate::storage::StoreError;

/// Severity levels for recovery errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Recovery did not run; the original file is untouched
    Error,
    /// The damaged file could not be rebuilt
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Recovery error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryErrorCode {
    /// Data directory missing or unusable
    Environment,
    /// Temporary file, rename or removal failed
    Io,
    /// Salvage read or rebuild of the store failed
    SalvageFailed,
    /// Salvage found nothing to keep
    NoRecords,
}

impl RecoveryErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            RecoveryErrorCode::Environment => "WALLET_RECOVERY_ENVIRONMENT",
            RecoveryErrorCode::Io => "WALLET_RECOVERY_IO",
            RecoveryErrorCode::SalvageFailed => "WALLET_RECOVERY_SALVAGE_FAILED",
            RecoveryErrorCode::NoRecords => "WALLET_RECOVERY_NO_RECORDS",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            RecoveryErrorCode::Environment | RecoveryErrorCode::Io => Severity::Error,
            RecoveryErrorCode::SalvageFailed | RecoveryErrorCode::NoRecords => Severity::Fatal,
        }
    }
}

impl fmt::Display for RecoveryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Recovery error type with full context
#[derive(Debug)]
pub struct RecoveryError {
    code: RecoveryErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl RecoveryError {
    fn new(code: RecoveryErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create an environment error
    pub fn environment(message: impl Into<String>) -> Self {
        Self::new(RecoveryErrorCode::Environment, message)
    }

    /// Create a file operation error
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        let mut err = Self::new(RecoveryErrorCode::Io, message);
        err.source = Some(source);
        err
    }

    /// Create a salvage failure wrapping the store error
    pub fn salvage_failed(message: impl Into<String>, cause: &StoreError) -> Self {
        let mut err = Self::new(RecoveryErrorCode::SalvageFailed, message);
        err.details = Some(cause.to_string());
        err
    }

    /// Create an error for a file with nothing salvageable
    pub fn no_records(path: impl fmt::Display) -> Self {
        let mut err = Self::new(RecoveryErrorCode::NoRecords, "Salvage found no records");
        err.details = Some(format!("path: {}", path));
        err
    }

    /// Returns the error code
    pub fn code(&self) -> RecoveryErrorCode {
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

impl fmt::Display for RecoveryError {
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

impl std::error::Error for RecoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for recovery operations
pub type RecoveryResult<T> = Result<T, RecoveryError>;
