//! Hashes, keys and scripts as they appear inside wallet records

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use super::errors::{DecodeError, DecodeResult};
use super::stream::{Decodable, Encodable, StreamReader, StreamWriter};

/// Largest DER-encoded private key accepted.
pub const MAX_PRIVKEY_SIZE: usize = 279;

/// Double SHA-256.
pub fn sha256d(data: &[u8]) -> Hash256 {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    Hash256(out)
}

/// 256-bit hash, ordered by its raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

/// Displayed byte-reversed, the way block explorers print them.
impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        f.write_str(&hex::encode(reversed))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self)
    }
}

impl FromStr for Hash256 {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| format!("invalid hash '{}': {}", s, e))?;
        let mut out: [u8; 32] = bytes
            .try_into()
            .map_err(|_| format!("expected 64 hex characters, got '{}'", s))?;
        out.reverse();
        Ok(Hash256(out))
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Encodable for Hash256 {
    fn encode(&self, w: &mut StreamWriter) {
        w.write_raw(&self.0);
    }
}

impl Decodable for Hash256 {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self> {
        Ok(Hash256(r.read_array()?))
    }
}

/// 160-bit script or key id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Hash160(pub [u8; 20]);

impl Encodable for Hash160 {
    fn encode(&self, w: &mut StreamWriter) {
        w.write_raw(&self.0);
    }
}

impl Decodable for Hash160 {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self> {
        Ok(Hash160(r.read_array()?))
    }
}

/// Serialized secp256k1 public key.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct PubKey(pub Vec<u8>);

impl PubKey {
    /// Expected length for a given header byte.
    fn expected_len(header: u8) -> Option<usize> {
        match header {
            0x02 | 0x03 => Some(33),
            0x04 | 0x06 | 0x07 => Some(65),
            _ => None,
        }
    }

    /// Shape check: header byte agrees with the length.
    pub fn is_valid(&self) -> bool {
        match self.0.first() {
            Some(&header) => Self::expected_len(header) == Some(self.0.len()),
            None => false,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Encodable for PubKey {
    fn encode(&self, w: &mut StreamWriter) {
        w.write_bytes(&self.0);
    }
}

impl Decodable for PubKey {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self> {
        Ok(PubKey(r.read_bytes()?))
    }
}

/// DER-encoded private key.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct PrivKey(pub Vec<u8>);

impl PrivKey {
    /// Structural sanity only; no curve arithmetic.
    pub fn is_plausible(&self) -> bool {
        !self.0.is_empty() && self.0.len() <= MAX_PRIVKEY_SIZE
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// Never print key material.
impl fmt::Debug for PrivKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivKey({} bytes)", self.0.len())
    }
}

impl Encodable for PrivKey {
    fn encode(&self, w: &mut StreamWriter) {
        w.write_bytes(&self.0);
    }
}

impl Decodable for PrivKey {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self> {
        Ok(PrivKey(r.read_bytes()?))
    }
}

/// `sha256d(pubkey || privkey)` stored beside plaintext keys.
pub fn key_integrity_hash(pubkey: &PubKey, privkey: &PrivKey) -> Hash256 {
    let mut buf = Vec::with_capacity(pubkey.0.len() + privkey.0.len());
    buf.extend_from_slice(&pubkey.0);
    buf.extend_from_slice(&privkey.0);
    sha256d(&buf)
}

/// Checks a decoded key pair, including the optional integrity hash.
pub fn verify_key_pair(
    pubkey: &PubKey,
    privkey: &PrivKey,
    integrity: Option<&Hash256>,
) -> DecodeResult<()> {
    if !pubkey.is_valid() {
        return Err(DecodeError::InvalidPubKey);
    }
    if let Some(expected) = integrity {
        if key_integrity_hash(pubkey, privkey) != *expected {
            return Err(DecodeError::IntegrityMismatch);
        }
    }
    if !privkey.is_plausible() {
        return Err(DecodeError::InvalidPrivKey);
    }
    Ok(())
}

/// Opaque script bytes.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Script(pub Vec<u8>);

impl Script {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Encodable for Script {
    fn encode(&self, w: &mut StreamWriter) {
        w.write_bytes(&self.0);
    }
}

impl Decodable for Script {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self> {
        Ok(Script(r.read_bytes()?))
    }
}
