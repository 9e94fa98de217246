//! Tagged wallet records
//!
//! Every store key starts with a compact-size type string. The rest of the
//! key and the whole value are laid out per tag:
//!
//! ```text
//! name             address          -> display name
//! purpose          address          -> purpose
//! tx               tx hash          -> wallet tx
//! key              pubkey           -> privkey [integrity hash]
//! wkey             pubkey           -> wallet key [integrity hash]
//! ckey             pubkey           -> encrypted privkey
//! mkey             u32 id           -> master key
//! cscript          hash160          -> redeem script
//! watchs           script           -> marker byte
//! watchmeta        script           -> key metadata
//! keymeta          pubkey           -> key metadata
//! defaultkey       -                -> pubkey
//! pool             i64 index        -> key pool entry
//! version          -                -> i32
//! orderposnext     -                -> i64
//! destdata         address, key     -> value
//! hdchain          -                -> hd chain
//! flags            -                -> u64
//! bestblock[_nomerkle] -            -> block locator
//! minversion       -                -> i32
//! ```
//!
//! Domain-extension tags (`acentry`, `zcserial`, `zcaccumulator`,
//! `zerocoin`, `unloadedzerocoin`, `calculatedzcblock`) are carried as
//! opaque bytes.

use std::fmt;

use super::errors::{DecodeError, DecodeResult, RecordError};
use super::flags::WalletFlags;
use super::primitives::{verify_key_pair, Hash160, Hash256, PrivKey, PubKey, Script};
use super::stream::{StreamReader, StreamWriter};
use super::transaction::{ChainView, NoChain, StructuralTxCheck, TxCheck, WalletTx};
use super::types::{BlockLocator, HdChain, KeyMetadata, KeyPool, MasterKey, WalletKey};

/// Stored schema versions remapped on read.
const LEGACY_VERSION_SENTINEL: i32 = 10300;
const LEGACY_VERSION_REMAPPED: i32 = 300;

/// `time_received_is_tx_time` values written by a release that appended
/// three extra fields to every tx record.
pub const LEGACY_TX_MARKER_RANGE: std::ops::RangeInclusive<u32> = 31404..=31703;

/// Closed set of record type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    Name,
    Purpose,
    Tx,
    Key,
    WKey,
    CKey,
    MKey,
    CScript,
    WatchS,
    WatchMeta,
    KeyMeta,
    DefaultKey,
    Pool,
    Version,
    OrderPosNext,
    DestData,
    HdChain,
    Flags,
    BestBlock,
    BestBlockNoMerkle,
    MinVersion,
    AcEntry,
    ZcSerial,
    ZcAccumulator,
    Zerocoin,
    UnloadedZerocoin,
    CalculatedZcBlock,
}

impl RecordKind {
    pub const ALL: [RecordKind; 27] = [
        RecordKind::Name,
        RecordKind::Purpose,
        RecordKind::Tx,
        RecordKind::Key,
        RecordKind::WKey,
        RecordKind::CKey,
        RecordKind::MKey,
        RecordKind::CScript,
        RecordKind::WatchS,
        RecordKind::WatchMeta,
        RecordKind::KeyMeta,
        RecordKind::DefaultKey,
        RecordKind::Pool,
        RecordKind::Version,
        RecordKind::OrderPosNext,
        RecordKind::DestData,
        RecordKind::HdChain,
        RecordKind::Flags,
        RecordKind::BestBlock,
        RecordKind::BestBlockNoMerkle,
        RecordKind::MinVersion,
        RecordKind::AcEntry,
        RecordKind::ZcSerial,
        RecordKind::ZcAccumulator,
        RecordKind::Zerocoin,
        RecordKind::UnloadedZerocoin,
        RecordKind::CalculatedZcBlock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Name => "name",
            RecordKind::Purpose => "purpose",
            RecordKind::Tx => "tx",
            RecordKind::Key => "key",
            RecordKind::WKey => "wkey",
            RecordKind::CKey => "ckey",
            RecordKind::MKey => "mkey",
            RecordKind::CScript => "cscript",
            RecordKind::WatchS => "watchs",
            RecordKind::WatchMeta => "watchmeta",
            RecordKind::KeyMeta => "keymeta",
            RecordKind::DefaultKey => "defaultkey",
            RecordKind::Pool => "pool",
            RecordKind::Version => "version",
            RecordKind::OrderPosNext => "orderposnext",
            RecordKind::DestData => "destdata",
            RecordKind::HdChain => "hdchain",
            RecordKind::Flags => "flags",
            RecordKind::BestBlock => "bestblock",
            RecordKind::BestBlockNoMerkle => "bestblock_nomerkle",
            RecordKind::MinVersion => "minversion",
            RecordKind::AcEntry => "acentry",
            RecordKind::ZcSerial => "zcserial",
            RecordKind::ZcAccumulator => "zcaccumulator",
            RecordKind::Zerocoin => "zerocoin",
            RecordKind::UnloadedZerocoin => "unloadedzerocoin",
            RecordKind::CalculatedZcBlock => "calculatedzcblock",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == tag)
    }

    /// Records carrying private key material or its encryption key.
    pub fn is_key_type(&self) -> bool {
        matches!(
            self,
            RecordKind::Key | RecordKind::WKey | RecordKind::MKey | RecordKind::CKey
        )
    }

    /// Domain-extension records carried as opaque bytes.
    pub fn is_extension(&self) -> bool {
        matches!(
            self,
            RecordKind::AcEntry
                | RecordKind::ZcSerial
                | RecordKind::ZcAccumulator
                | RecordKind::Zerocoin
                | RecordKind::UnloadedZerocoin
                | RecordKind::CalculatedZcBlock
        )
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a legacy-format tx record was normalized on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxUpgrade {
    /// The three trailing fields were present; the marker took the first one.
    Upgraded { marker: u32 },
    /// No trailing fields; the marker was reset to 0.
    Repaired { marker: u32 },
}

/// Collaborators consulted while decoding `tx` records.
#[derive(Clone, Copy)]
pub struct DecodeContext<'a> {
    pub tx_check: &'a dyn TxCheck,
    pub chain: &'a dyn ChainView,
}

impl Default for DecodeContext<'static> {
    fn default() -> Self {
        Self {
            tx_check: &StructuralTxCheck,
            chain: &NoChain,
        }
    }
}

/// One decoded wallet record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletRecord {
    Name {
        address: String,
        name: String,
    },
    Purpose {
        address: String,
        purpose: String,
    },
    Tx {
        hash: Hash256,
        wtx: WalletTx,
        /// Set by the decoder only; ignored when encoding.
        upgrade: Option<TxUpgrade>,
    },
    Key {
        pubkey: PubKey,
        privkey: PrivKey,
        integrity: Option<Hash256>,
    },
    WKey {
        pubkey: PubKey,
        wkey: WalletKey,
        integrity: Option<Hash256>,
    },
    CKey {
        pubkey: PubKey,
        crypted: Vec<u8>,
    },
    MKey {
        id: u32,
        master_key: MasterKey,
    },
    CScript {
        hash: Hash160,
        script: Script,
    },
    WatchS {
        script: Script,
        marker: u8,
    },
    WatchMeta {
        script: Script,
        meta: KeyMetadata,
    },
    KeyMeta {
        pubkey: PubKey,
        meta: KeyMetadata,
    },
    DefaultKey(PubKey),
    Pool {
        index: i64,
        entry: KeyPool,
    },
    Version(i32),
    OrderPosNext(i64),
    DestData {
        address: String,
        key: String,
        value: String,
    },
    HdChain(HdChain),
    Flags(WalletFlags),
    BestBlock(BlockLocator),
    BestBlockNoMerkle(BlockLocator),
    MinVersion(i32),
    /// Domain-extension record; `key_fields` follow the tag.
    Extension {
        kind: RecordKind,
        key_fields: Vec<u8>,
        value: Vec<u8>,
    },
    /// Tag not known to this build.
    Unknown {
        tag: String,
        key_fields: Vec<u8>,
        value: Vec<u8>,
    },
}

/// Builds a store key from a tag and its key fields.
pub fn record_key(kind: RecordKind, fields: impl FnOnce(&mut StreamWriter)) -> Vec<u8> {
    let mut w = StreamWriter::new();
    w.write_str(kind.as_str());
    fields(&mut w);
    w.into_bytes()
}

/// Reads only the type tag of a store key.
pub fn read_tag(key: &[u8]) -> DecodeResult<String> {
    StreamReader::new(key).read_string()
}

/// Reads a trailing integrity hash if one is present and non-null.
fn read_optional_hash(r: &mut StreamReader<'_>) -> DecodeResult<Option<Hash256>> {
    if r.remaining() < 32 {
        return Ok(None);
    }
    let hash: Hash256 = r.read()?;
    Ok((!hash.is_null()).then_some(hash))
}

fn read_valid_pubkey(r: &mut StreamReader<'_>) -> DecodeResult<PubKey> {
    let pubkey: PubKey = r.read()?;
    if !pubkey.is_valid() {
        return Err(DecodeError::InvalidPubKey);
    }
    Ok(pubkey)
}

impl WalletRecord {
    pub fn kind(&self) -> Option<RecordKind> {
        Some(match self {
            WalletRecord::Name { .. } => RecordKind::Name,
            WalletRecord::Purpose { .. } => RecordKind::Purpose,
            WalletRecord::Tx { .. } => RecordKind::Tx,
            WalletRecord::Key { .. } => RecordKind::Key,
            WalletRecord::WKey { .. } => RecordKind::WKey,
            WalletRecord::CKey { .. } => RecordKind::CKey,
            WalletRecord::MKey { .. } => RecordKind::MKey,
            WalletRecord::CScript { .. } => RecordKind::CScript,
            WalletRecord::WatchS { .. } => RecordKind::WatchS,
            WalletRecord::WatchMeta { .. } => RecordKind::WatchMeta,
            WalletRecord::KeyMeta { .. } => RecordKind::KeyMeta,
            WalletRecord::DefaultKey(_) => RecordKind::DefaultKey,
            WalletRecord::Pool { .. } => RecordKind::Pool,
            WalletRecord::Version(_) => RecordKind::Version,
            WalletRecord::OrderPosNext(_) => RecordKind::OrderPosNext,
            WalletRecord::DestData { .. } => RecordKind::DestData,
            WalletRecord::HdChain(_) => RecordKind::HdChain,
            WalletRecord::Flags(_) => RecordKind::Flags,
            WalletRecord::BestBlock(_) => RecordKind::BestBlock,
            WalletRecord::BestBlockNoMerkle(_) => RecordKind::BestBlockNoMerkle,
            WalletRecord::MinVersion(_) => RecordKind::MinVersion,
            WalletRecord::Extension { kind, .. } => *kind,
            WalletRecord::Unknown { .. } => return None,
        })
    }

    /// The type tag as stored.
    pub fn tag(&self) -> &str {
        match self {
            WalletRecord::Unknown { tag, .. } => tag.as_str(),
            other => other.kind().map(|k| k.as_str()).unwrap_or_default(),
        }
    }

    /// Serializes into a `(key, value)` pair.
    pub fn encode(&self) -> (Vec<u8>, Vec<u8>) {
        let mut key = StreamWriter::new();
        key.write_str(self.tag());
        let mut value = StreamWriter::new();

        match self {
            WalletRecord::Name { address, name } => {
                key.write_str(address);
                value.write_str(name);
            }
            WalletRecord::Purpose { address, purpose } => {
                key.write_str(address);
                value.write_str(purpose);
            }
            WalletRecord::Tx { hash, wtx, .. } => {
                key.write(hash);
                value.write(wtx);
            }
            WalletRecord::Key {
                pubkey,
                privkey,
                integrity,
            } => {
                key.write(pubkey);
                value.write(privkey);
                if let Some(hash) = integrity {
                    value.write(hash);
                }
            }
            WalletRecord::WKey {
                pubkey,
                wkey,
                integrity,
            } => {
                key.write(pubkey);
                value.write(wkey);
                if let Some(hash) = integrity {
                    value.write(hash);
                }
            }
            WalletRecord::CKey { pubkey, crypted } => {
                key.write(pubkey);
                value.write_bytes(crypted);
            }
            WalletRecord::MKey { id, master_key } => {
                key.write_u32(*id);
                value.write(master_key);
            }
            WalletRecord::CScript { hash, script } => {
                key.write(hash);
                value.write(script);
            }
            WalletRecord::WatchS { script, marker } => {
                key.write(script);
                value.write_u8(*marker);
            }
            WalletRecord::WatchMeta { script, meta } => {
                key.write(script);
                value.write(meta);
            }
            WalletRecord::KeyMeta { pubkey, meta } => {
                key.write(pubkey);
                value.write(meta);
            }
            WalletRecord::DefaultKey(pubkey) => value.write(pubkey),
            WalletRecord::Pool { index, entry } => {
                key.write_i64(*index);
                value.write(entry);
            }
            WalletRecord::Version(v) | WalletRecord::MinVersion(v) => value.write_i32(*v),
            WalletRecord::OrderPosNext(n) => value.write_i64(*n),
            WalletRecord::DestData {
                address,
                key: dest_key,
                value: dest_value,
            } => {
                key.write_str(address);
                key.write_str(dest_key);
                value.write_str(dest_value);
            }
            WalletRecord::HdChain(chain) => value.write(chain),
            WalletRecord::Flags(flags) => value.write_u64(flags.bits()),
            WalletRecord::BestBlock(locator) | WalletRecord::BestBlockNoMerkle(locator) => {
                value.write(locator)
            }
            WalletRecord::Extension {
                key_fields,
                value: raw,
                ..
            }
            | WalletRecord::Unknown {
                key_fields,
                value: raw,
                ..
            } => {
                key.write_raw(key_fields);
                value.write_raw(raw);
            }
        }

        (key.into_bytes(), value.into_bytes())
    }

    /// Decodes with the offline defaults for `tx` validation.
    pub fn decode(key: &[u8], value: &[u8]) -> Result<Self, RecordError> {
        Self::decode_with(key, value, &DecodeContext::default())
    }

    /// Decodes one store pair. The error carries the tag it failed under.
    pub fn decode_with(key: &[u8], value: &[u8], ctx: &DecodeContext<'_>) -> Result<Self, RecordError> {
        let mut k = StreamReader::new(key);
        let tag = k
            .read_string()
            .map_err(|e| RecordError::new(String::new(), e))?;
        let mut v = StreamReader::new(value);

        let decoded = match RecordKind::from_tag(&tag) {
            Some(kind) => decode_known(kind, &mut k, &mut v, ctx),
            None => Ok(WalletRecord::Unknown {
                tag: tag.clone(),
                key_fields: k.rest().to_vec(),
                value: value.to_vec(),
            }),
        };
        decoded.map_err(|e| RecordError::new(tag, e))
    }
}

fn decode_known(
    kind: RecordKind,
    k: &mut StreamReader<'_>,
    v: &mut StreamReader<'_>,
    ctx: &DecodeContext<'_>,
) -> DecodeResult<WalletRecord> {
    let record = match kind {
        RecordKind::Name => WalletRecord::Name {
            address: k.read_string()?,
            name: v.read_string()?,
        },
        RecordKind::Purpose => WalletRecord::Purpose {
            address: k.read_string()?,
            purpose: v.read_string()?,
        },
        RecordKind::Tx => decode_tx(k, v, ctx)?,
        RecordKind::Key => {
            let pubkey = read_valid_pubkey(k)?;
            let privkey: PrivKey = v.read()?;
            let integrity = read_optional_hash(v)?;
            verify_key_pair(&pubkey, &privkey, integrity.as_ref())?;
            WalletRecord::Key {
                pubkey,
                privkey,
                integrity,
            }
        }
        RecordKind::WKey => {
            let pubkey = read_valid_pubkey(k)?;
            let wkey: WalletKey = v.read()?;
            let integrity = read_optional_hash(v)?;
            verify_key_pair(&pubkey, &wkey.privkey, integrity.as_ref())?;
            WalletRecord::WKey {
                pubkey,
                wkey,
                integrity,
            }
        }
        RecordKind::CKey => WalletRecord::CKey {
            pubkey: read_valid_pubkey(k)?,
            crypted: v.read_bytes()?,
        },
        RecordKind::MKey => WalletRecord::MKey {
            id: k.read_u32()?,
            master_key: v.read()?,
        },
        RecordKind::CScript => WalletRecord::CScript {
            hash: k.read()?,
            script: v.read()?,
        },
        RecordKind::WatchS => WalletRecord::WatchS {
            script: k.read()?,
            marker: v.read_u8()?,
        },
        RecordKind::WatchMeta => WalletRecord::WatchMeta {
            script: k.read()?,
            meta: v.read()?,
        },
        RecordKind::KeyMeta => WalletRecord::KeyMeta {
            pubkey: k.read()?,
            meta: v.read()?,
        },
        RecordKind::DefaultKey => WalletRecord::DefaultKey(read_valid_pubkey(v)?),
        RecordKind::Pool => WalletRecord::Pool {
            index: k.read_i64()?,
            entry: v.read()?,
        },
        RecordKind::Version => {
            let version = v.read_i32()?;
            WalletRecord::Version(if version == LEGACY_VERSION_SENTINEL {
                LEGACY_VERSION_REMAPPED
            } else {
                version
            })
        }
        RecordKind::OrderPosNext => WalletRecord::OrderPosNext(v.read_i64()?),
        RecordKind::DestData => WalletRecord::DestData {
            address: k.read_string()?,
            key: k.read_string()?,
            value: v.read_string()?,
        },
        RecordKind::HdChain => WalletRecord::HdChain(v.read()?),
        RecordKind::Flags => WalletRecord::Flags(WalletFlags::from_bits(v.read_u64()?)?),
        RecordKind::BestBlock => WalletRecord::BestBlock(v.read()?),
        RecordKind::BestBlockNoMerkle => WalletRecord::BestBlockNoMerkle(v.read()?),
        RecordKind::MinVersion => WalletRecord::MinVersion(v.read_i32()?),
        RecordKind::AcEntry
        | RecordKind::ZcSerial
        | RecordKind::ZcAccumulator
        | RecordKind::Zerocoin
        | RecordKind::UnloadedZerocoin
        | RecordKind::CalculatedZcBlock => WalletRecord::Extension {
            kind,
            key_fields: k.rest().to_vec(),
            value: v.rest().to_vec(),
        },
    };
    Ok(record)
}

fn decode_tx(
    k: &mut StreamReader<'_>,
    v: &mut StreamReader<'_>,
    ctx: &DecodeContext<'_>,
) -> DecodeResult<WalletRecord> {
    let hash: Hash256 = k.read()?;
    let mut wtx: WalletTx = v.read()?;

    let height = wtx
        .tx()
        .inputs
        .first()
        .and_then(|input| ctx.chain.tx_height(&input.prevout.hash))
        .unwrap_or(i32::MAX);
    ctx.tx_check
        .check(wtx.tx(), height)
        .map_err(DecodeError::TxCheckFailed)?;

    let computed = wtx.hash();
    if computed != hash {
        return Err(DecodeError::TxHashMismatch {
            stored: hash.to_string(),
            computed: computed.to_string(),
        });
    }

    let mut upgrade = None;
    let marker = wtx.time_received_is_tx_time;
    if LEGACY_TX_MARKER_RANGE.contains(&marker) {
        if !v.is_empty() {
            let time_received_is_tx_time = v.read_u8()?;
            let _unused = v.read_u8()?;
            let _from_account = v.read_string()?;
            wtx.time_received_is_tx_time = time_received_is_tx_time as u32;
            upgrade = Some(TxUpgrade::Upgraded { marker });
        } else {
            wtx.time_received_is_tx_time = 0;
            upgrade = Some(TxUpgrade::Repaired { marker });
        }
    }

    Ok(WalletRecord::Tx { hash, wtx, upgrade })
}

#[cfg(test)]
mod tests {
    use super::super::primitives::key_integrity_hash;
    use super::super::primitives::test_keys::{compressed_pubkey, privkey};
    use super::super::transaction::test_txs::wallet_tx;
    use super::*;

    fn tx_record(wtx: WalletTx) -> WalletRecord {
        WalletRecord::Tx {
            hash: wtx.hash(),
            wtx,
            upgrade: None,
        }
    }

    fn sample_records() -> Vec<WalletRecord> {
        let pubkey = compressed_pubkey(1);
        let sk = privkey(2);
        vec![
            WalletRecord::Name {
                address: "addr1".into(),
                name: "Alice".into(),
            },
            WalletRecord::Purpose {
                address: "addr1".into(),
                purpose: "receive".into(),
            },
            tx_record(wallet_tx(4, 0)),
            WalletRecord::Key {
                pubkey: pubkey.clone(),
                privkey: sk.clone(),
                integrity: Some(key_integrity_hash(&pubkey, &sk)),
            },
            WalletRecord::Key {
                pubkey: compressed_pubkey(5),
                privkey: privkey(6),
                integrity: None,
            },
            WalletRecord::WKey {
                pubkey: compressed_pubkey(7),
                wkey: WalletKey {
                    version: 1,
                    privkey: privkey(8),
                    comment: "old".into(),
                    ..Default::default()
                },
                integrity: None,
            },
            WalletRecord::CKey {
                pubkey: compressed_pubkey(9),
                crypted: vec![0xCC; 48],
            },
            WalletRecord::MKey {
                id: 1,
                master_key: MasterKey {
                    crypted_key: vec![1; 48],
                    salt: vec![2; 8],
                    derive_iterations: 25_000,
                    ..Default::default()
                },
            },
            WalletRecord::CScript {
                hash: Hash160([7; 20]),
                script: Script(vec![0x52, 0xae]),
            },
            WalletRecord::WatchS {
                script: Script(vec![0x76]),
                marker: b'1',
            },
            WalletRecord::WatchMeta {
                script: Script(vec![0x76]),
                meta: KeyMetadata::new(10),
            },
            WalletRecord::KeyMeta {
                pubkey: pubkey.clone(),
                meta: KeyMetadata::new(20),
            },
            WalletRecord::DefaultKey(pubkey),
            WalletRecord::Pool {
                index: 3,
                entry: KeyPool {
                    version: 1,
                    time: 5,
                    pubkey: compressed_pubkey(10),
                    internal: true,
                },
            },
            WalletRecord::Version(169_900),
            WalletRecord::OrderPosNext(12),
            WalletRecord::DestData {
                address: "addr1".into(),
                key: "used".into(),
                value: "p".into(),
            },
            WalletRecord::HdChain(HdChain {
                version: 2,
                external_counter: 4,
                seed_id: Hash160([9; 20]),
                internal_counter: 1,
            }),
            WalletRecord::Flags(WalletFlags(WalletFlags::DISABLE_PRIVATE_KEYS)),
            WalletRecord::BestBlock(BlockLocator::default()),
            WalletRecord::BestBlockNoMerkle(BlockLocator {
                version: 1,
                have: vec![Hash256([5; 32])],
            }),
            WalletRecord::MinVersion(60_000),
            WalletRecord::Extension {
                kind: RecordKind::Zerocoin,
                key_fields: vec![0x02, 0x01, 0x00],
                value: vec![1, 2, 3],
            },
            WalletRecord::Unknown {
                tag: "futurething".into(),
                key_fields: vec![9],
                value: vec![],
            },
        ]
    }

    #[test]
    fn test_every_tag_roundtrips() {
        for record in sample_records() {
            let (key, value) = record.encode();
            let decoded = WalletRecord::decode(&key, &value)
                .unwrap_or_else(|e| panic!("{} failed: {}", record.tag(), e));
            assert_eq!(decoded, record, "roundtrip mismatch for {}", record.tag());
        }
    }

    #[test]
    fn test_tag_table_is_consistent() {
        for kind in RecordKind::ALL {
            assert_eq!(RecordKind::from_tag(kind.as_str()), Some(kind));
        }
        assert_eq!(RecordKind::from_tag("nope"), None);

        let key_types: Vec<_> = RecordKind::ALL.iter().filter(|k| k.is_key_type()).collect();
        assert_eq!(key_types.len(), 4);
    }

    #[test]
    fn test_version_sentinel_remapped() {
        let (key, value) = WalletRecord::Version(10300).encode();
        assert_eq!(
            WalletRecord::decode(&key, &value).unwrap(),
            WalletRecord::Version(300)
        );
    }

    #[test]
    fn test_integrity_mismatch_fails_key() {
        let pubkey = compressed_pubkey(1);
        let record = WalletRecord::Key {
            pubkey: pubkey.clone(),
            privkey: privkey(2),
            integrity: Some(key_integrity_hash(&pubkey, &privkey(3))),
        };
        let (key, value) = record.encode();
        let err = WalletRecord::decode(&key, &value).unwrap_err();
        assert_eq!(err.tag, "key");
        assert_eq!(err.error, DecodeError::IntegrityMismatch);
    }

    #[test]
    fn test_null_integrity_hash_treated_as_absent() {
        let (key, mut value) = WalletRecord::Key {
            pubkey: compressed_pubkey(1),
            privkey: privkey(2),
            integrity: None,
        }
        .encode();
        value.extend_from_slice(&[0u8; 32]);

        match WalletRecord::decode(&key, &value).unwrap() {
            WalletRecord::Key { integrity, .. } => assert!(integrity.is_none()),
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_bad_pubkey_fails_ckey() {
        let (key, value) = WalletRecord::CKey {
            pubkey: PubKey(vec![0x02; 10]),
            crypted: vec![1],
        }
        .encode();
        let err = WalletRecord::decode(&key, &value).unwrap_err();
        assert_eq!(err.tag, "ckey");
        assert_eq!(err.error, DecodeError::InvalidPubKey);
    }

    #[test]
    fn test_unknown_flag_fails_flags_record() {
        let (key, _) = WalletRecord::Flags(WalletFlags(0)).encode();
        let value = (1u64 << 40).to_le_bytes();
        let err = WalletRecord::decode(&key, &value).unwrap_err();
        assert_eq!(err.tag, "flags");
        assert!(matches!(err.error, DecodeError::UnknownFlags(_)));
    }

    #[test]
    fn test_tx_hash_mismatch_rejected() {
        let wtx = wallet_tx(1, 0);
        let (key, value) = WalletRecord::Tx {
            hash: Hash256([1; 32]),
            wtx,
            upgrade: None,
        }
        .encode();
        let err = WalletRecord::decode(&key, &value).unwrap_err();
        assert!(matches!(err.error, DecodeError::TxHashMismatch { .. }));
    }

    #[test]
    fn test_legacy_tx_without_trailing_fields_is_repaired() {
        let mut wtx = wallet_tx(1, 0);
        wtx.time_received_is_tx_time = 31500;
        let (key, value) = tx_record(wtx).encode();

        match WalletRecord::decode(&key, &value).unwrap() {
            WalletRecord::Tx { wtx, upgrade, .. } => {
                assert_eq!(wtx.time_received_is_tx_time, 0);
                assert_eq!(upgrade, Some(TxUpgrade::Repaired { marker: 31500 }));
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_legacy_tx_with_trailing_fields_is_upgraded() {
        let mut wtx = wallet_tx(1, 0);
        wtx.time_received_is_tx_time = 31404;
        let (key, mut value) = tx_record(wtx).encode();
        let mut extra = StreamWriter::new();
        extra.write_u8(1);
        extra.write_u8(0);
        extra.write_str("");
        value.extend(extra.into_bytes());

        match WalletRecord::decode(&key, &value).unwrap() {
            WalletRecord::Tx { wtx, upgrade, .. } => {
                assert_eq!(wtx.time_received_is_tx_time, 1);
                assert_eq!(upgrade, Some(TxUpgrade::Upgraded { marker: 31404 }));
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_marker_outside_window_untouched() {
        let mut wtx = wallet_tx(1, 0);
        wtx.time_received_is_tx_time = 31704;
        let (key, value) = tx_record(wtx).encode();

        match WalletRecord::decode(&key, &value).unwrap() {
            WalletRecord::Tx { wtx, upgrade, .. } => {
                assert_eq!(wtx.time_received_is_tx_time, 31704);
                assert!(upgrade.is_none());
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_truncated_name_reports_tag() {
        let (key, value) = WalletRecord::Name {
            address: "a".into(),
            name: "Alice".into(),
        }
        .encode();
        let err = WalletRecord::decode(&key, &value[..2]).unwrap_err();
        assert_eq!(err.tag, "name");
    }

    #[test]
    fn test_unreadable_tag_has_empty_tag() {
        let err = WalletRecord::decode(&[0x05, b'a'], &[]).unwrap_err();
        assert!(err.tag.is_empty());
    }
}
