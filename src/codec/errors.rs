//! Record codec errors
//!
//! A decode error is a normal outcome during a load scan: the caller
//! classifies it by the tag it failed under.

use thiserror::Error;

/// Result type for field-level decoding
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Field-level decode and validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    // Framing
    #[error("unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("non-canonical compact size encoding")]
    NonCanonicalSize,

    #[error("length {0} exceeds the field limit")]
    Oversized(u64),

    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    // Shape validation
    #[error("public key corrupt")]
    InvalidPubKey,

    #[error("private key corrupt")]
    InvalidPrivKey,

    #[error("public/private key integrity hash mismatch")]
    IntegrityMismatch,

    #[error("unknown non-tolerable wallet flags {0:#018x}")]
    UnknownFlags(u64),

    // Semantic validation against load state
    #[error("duplicate master key id {0}")]
    DuplicateMasterKey(u32),

    #[error("transaction failed structural check: {0}")]
    TxCheckFailed(String),

    #[error("transaction hash {computed} does not match stored key {stored}")]
    TxHashMismatch { stored: String, computed: String },

    #[error("wallet model rejected record: {0}")]
    Rejected(&'static str),
}

/// A decode error tagged with the record type it failed under.
///
/// `tag` is empty when the type string itself could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error reading wallet record '{tag}': {error}")]
pub struct RecordError {
    pub tag: String,
    #[source]
    pub error: DecodeError,
}

impl RecordError {
    pub fn new(tag: impl Into<String>, error: DecodeError) -> Self {
        Self {
            tag: tag.into(),
            error,
        }
    }
}
