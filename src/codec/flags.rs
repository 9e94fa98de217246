//! Wallet feature flags

use serde::Serialize;

use super::errors::{DecodeError, DecodeResult};

/// 64-bit wallet flag set.
///
/// The low 32 bits are tolerable: older software may ignore them. A set
/// bit in the high 32 that this build does not know makes the wallet
/// unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct WalletFlags(pub u64);

impl WalletFlags {
    /// Wallet holds no private keys.
    pub const DISABLE_PRIVATE_KEYS: u64 = 1 << 32;

    pub const KNOWN: u64 = Self::DISABLE_PRIVATE_KEYS;

    pub const TOLERABLE: u64 = 0xFFFF_FFFF;

    /// Validates raw bits read from disk.
    pub fn from_bits(bits: u64) -> DecodeResult<Self> {
        let unknown = bits & !(Self::KNOWN | Self::TOLERABLE);
        if unknown != 0 {
            return Err(DecodeError::UnknownFlags(unknown));
        }
        Ok(Self(bits))
    }

    pub fn bits(&self) -> u64 {
        self.0
    }

    pub fn contains(&self, flag: u64) -> bool {
        self.0 & flag == flag
    }
}
