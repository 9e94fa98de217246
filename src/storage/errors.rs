//! Wallet store error types
//!
//! Error codes:
//! - WALLET_STORE_IO_ERROR (ERROR severity)
//! - WALLET_STORE_WRITE_FAILED (ERROR severity)
//! - WALLET_STORE_READ_FAILED (ERROR severity)
//! - WALLET_STORE_KEY_EXISTS (ERROR severity)
//! - WALLET_STORE_TXN (ERROR severity)
//! - WALLET_STORE_BATCH_TOO_LARGE (ERROR severity)
//! - WALLET_STORE_CORRUPTION (FATAL severity)

use std::fmt;
use std::io;

/// Severity levels for store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, the store stays usable
    Error,
    /// The store file cannot be trusted
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

/// Store error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// Disk I/O failure
    IoError,
    /// Batch append or fsync failed
    WriteFailed,
    /// Read from the store file failed
    ReadFailed,
    /// Non-overwriting write hit an existing key
    KeyExists,
    /// Transaction misuse (nested begin, commit without begin)
    Transaction,
    /// A write would produce a frame the reader refuses
    BatchTooLarge,
    /// Checksum or framing failure in the store file
    Corruption,
}

impl StoreErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::IoError => "WALLET_STORE_IO_ERROR",
            StoreErrorCode::WriteFailed => "WALLET_STORE_WRITE_FAILED",
            StoreErrorCode::ReadFailed => "WALLET_STORE_READ_FAILED",
            StoreErrorCode::KeyExists => "WALLET_STORE_KEY_EXISTS",
            StoreErrorCode::Transaction => "WALLET_STORE_TXN",
            StoreErrorCode::BatchTooLarge => "WALLET_STORE_BATCH_TOO_LARGE",
            StoreErrorCode::Corruption => "WALLET_STORE_CORRUPTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StoreErrorCode::Corruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Store error with context
#[derive(Debug)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl StoreError {
    fn new(code: StoreErrorCode, message: impl Into<String>, source: Option<io::Error>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source,
        }
    }

    /// Create a new store I/O error
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StoreErrorCode::IoError, message, Some(source))
    }

    /// Create a new write failed error
    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StoreErrorCode::WriteFailed, message, Some(source))
    }

    /// Create a new read failed error
    pub fn read_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StoreErrorCode::ReadFailed, message, Some(source))
    }

    /// Create a key-exists error for a non-overwriting write
    pub fn key_exists(key: &[u8]) -> Self {
        let mut err = Self::new(StoreErrorCode::KeyExists, "Key already present", None);
        err.details = Some(format!("key_len: {}", key.len()));
        err
    }

    /// Create a transaction misuse error
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Transaction, message, None)
    }

    /// Create an error for a batch over the frame limit
    pub fn batch_too_large(source: io::Error) -> Self {
        let message = source.to_string();
        Self::new(StoreErrorCode::BatchTooLarge, message, Some(source))
    }

    /// Create a new data corruption error (FATAL)
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Corruption, message, None)
    }

    /// Create a data corruption error with byte offset context
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        let mut err = Self::corruption(reason);
        err.details = Some(format!("byte_offset: {}", offset));
        err
    }

    /// Returns the error code
    pub fn code(&self) -> StoreErrorCode {
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

    /// Returns whether the store file itself is damaged
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StoreError {
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

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(StoreErrorCode::IoError.code(), "WALLET_STORE_IO_ERROR");
        assert_eq!(StoreErrorCode::WriteFailed.code(), "WALLET_STORE_WRITE_FAILED");
        assert_eq!(StoreErrorCode::ReadFailed.code(), "WALLET_STORE_READ_FAILED");
        assert_eq!(StoreErrorCode::KeyExists.code(), "WALLET_STORE_KEY_EXISTS");
        assert_eq!(StoreErrorCode::Corruption.code(), "WALLET_STORE_CORRUPTION");
    }

    #[test]
    fn test_only_corruption_is_fatal() {
        assert!(StoreError::corruption("bad crc").is_fatal());
        assert!(!StoreError::key_exists(b"k").is_fatal());
        assert!(!StoreError::transaction("nested").is_fatal());
        assert!(!StoreError::batch_too_large(io::Error::new(
            io::ErrorKind::InvalidInput,
            "too big",
        ))
        .is_fatal());
        assert!(!StoreError::write_failed(
            "disk full",
            io::Error::new(io::ErrorKind::Other, "disk full"),
        )
        .is_fatal());
    }

    #[test]
    fn test_error_display_contains_required_fields() {
        let err = StoreError::corruption_at_offset(1024, "checksum mismatch");
        let display = format!("{}", err);
        assert!(display.contains("WALLET_STORE_CORRUPTION"));
        assert!(display.contains("FATAL"));
        assert!(display.contains("checksum mismatch"));
        assert!(display.contains("byte_offset: 1024"));
    }
}
