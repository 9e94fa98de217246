//! Value types stored inside wallet records

use super::errors::DecodeResult;
use super::primitives::{Hash160, Hash256, PrivKey, PubKey};
use super::stream::{Decodable, Encodable, StreamReader, StreamWriter};

/// Key metadata version that carries HD derivation info.
pub const KEY_METADATA_VERSION_WITH_HDDATA: i32 = 10;

/// HD chain version that carries an internal chain counter.
pub const HD_CHAIN_VERSION_HD_SPLIT: i32 = 2;

/// Creation time and HD origin of a key or watched script.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyMetadata {
    pub version: i32,
    pub create_time: i64,
    pub hd_keypath: String,
    pub hd_seed_id: Hash160,
}

impl KeyMetadata {
    pub fn new(create_time: i64) -> Self {
        Self {
            version: 1,
            create_time,
            ..Default::default()
        }
    }
}

impl Encodable for KeyMetadata {
    fn encode(&self, w: &mut StreamWriter) {
        w.write_i32(self.version);
        w.write_i64(self.create_time);
        if self.version >= KEY_METADATA_VERSION_WITH_HDDATA {
            w.write_str(&self.hd_keypath);
            w.write(&self.hd_seed_id);
        }
    }
}

impl Decodable for KeyMetadata {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self> {
        let version = r.read_i32()?;
        let create_time = r.read_i64()?;
        let (hd_keypath, hd_seed_id) = if version >= KEY_METADATA_VERSION_WITH_HDDATA {
            (r.read_string()?, r.read()?)
        } else {
            (String::new(), Hash160::default())
        };
        Ok(Self {
            version,
            create_time,
            hd_keypath,
            hd_seed_id,
        })
    }
}

/// Passphrase-encrypted master key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MasterKey {
    pub crypted_key: Vec<u8>,
    pub salt: Vec<u8>,
    pub derivation_method: u32,
    pub derive_iterations: u32,
    pub other_params: Vec<u8>,
}

impl Encodable for MasterKey {
    fn encode(&self, w: &mut StreamWriter) {
        w.write_bytes(&self.crypted_key);
        w.write_bytes(&self.salt);
        w.write_u32(self.derivation_method);
        w.write_u32(self.derive_iterations);
        w.write_bytes(&self.other_params);
    }
}

impl Decodable for MasterKey {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            crypted_key: r.read_bytes()?,
            salt: r.read_bytes()?,
            derivation_method: r.read_u32()?,
            derive_iterations: r.read_u32()?,
            other_params: r.read_bytes()?,
        })
    }
}

/// Pre-generated key waiting in the key pool.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyPool {
    pub version: i32,
    pub time: i64,
    pub pubkey: PubKey,
    pub internal: bool,
}

impl Encodable for KeyPool {
    fn encode(&self, w: &mut StreamWriter) {
        w.write_i32(self.version);
        w.write_i64(self.time);
        w.write(&self.pubkey);
        w.write_bool(self.internal);
    }
}

impl Decodable for KeyPool {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self> {
        let version = r.read_i32()?;
        let time = r.read_i64()?;
        let pubkey = r.read()?;
        // Entries written before the internal/external split end here.
        let internal = if r.is_empty() { false } else { r.read_bool()? };
        Ok(Self {
            version,
            time,
            pubkey,
            internal,
        })
    }
}

/// HD derivation chain state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HdChain {
    pub version: i32,
    pub external_counter: u32,
    pub seed_id: Hash160,
    pub internal_counter: u32,
}

impl Encodable for HdChain {
    fn encode(&self, w: &mut StreamWriter) {
        w.write_i32(self.version);
        w.write_u32(self.external_counter);
        w.write(&self.seed_id);
        if self.version >= HD_CHAIN_VERSION_HD_SPLIT {
            w.write_u32(self.internal_counter);
        }
    }
}

impl Decodable for HdChain {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self> {
        let version = r.read_i32()?;
        let external_counter = r.read_u32()?;
        let seed_id = r.read()?;
        let internal_counter = if version >= HD_CHAIN_VERSION_HD_SPLIT {
            r.read_u32()?
        } else {
            0
        };
        Ok(Self {
            version,
            external_counter,
            seed_id,
            internal_counter,
        })
    }
}

/// Known block hashes, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockLocator {
    pub version: i32,
    pub have: Vec<Hash256>,
}

impl BlockLocator {
    pub fn is_null(&self) -> bool {
        self.have.is_empty()
    }
}

impl Encodable for BlockLocator {
    fn encode(&self, w: &mut StreamWriter) {
        w.write_i32(self.version);
        w.write_vec(&self.have);
    }
}

impl Decodable for BlockLocator {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            version: r.read_i32()?,
            have: r.read_vec()?,
        })
    }
}

/// Legacy wrapped private key, superseded by plain `key` rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WalletKey {
    pub version: i32,
    pub privkey: PrivKey,
    pub time_created: i64,
    pub time_expires: i64,
    pub comment: String,
}

impl Encodable for WalletKey {
    fn encode(&self, w: &mut StreamWriter) {
        w.write_i32(self.version);
        w.write(&self.privkey);
        w.write_i64(self.time_created);
        w.write_i64(self.time_expires);
        w.write_str(&self.comment);
    }
}

impl Decodable for WalletKey {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            version: r.read_i32()?,
            privkey: r.read()?,
            time_created: r.read_i64()?,
            time_expires: r.read_i64()?,
            comment: r.read_string()?,
        })
    }
}
