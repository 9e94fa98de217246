//! Wallet record codec
//!
//! Turns raw store pairs into typed [`WalletRecord`]s and back. Decoding
//! performs every check that needs no wallet state: key shape, integrity
//! hashes, flag bits, the structural transaction check and the historical
//! format fix-ups. Checks against load state (duplicate master keys) belong
//! to the load pipeline.

mod errors;
mod flags;
mod primitives;
mod record;
mod stream;
mod transaction;
mod types;

pub use errors::{DecodeError, DecodeResult, RecordError};
pub use flags::WalletFlags;
pub use primitives::{
    key_integrity_hash, sha256d, verify_key_pair, Hash160, Hash256, PrivKey, PubKey, Script,
    MAX_PRIVKEY_SIZE,
};
pub use record::{
    read_tag, record_key, DecodeContext, RecordKind, TxUpgrade, WalletRecord,
    LEGACY_TX_MARKER_RANGE,
};
pub use stream::{Decodable, Encodable, StreamReader, StreamWriter, MAX_FIELD_SIZE};
pub use transaction::{
    money_range, ChainView, MerkleTx, NoChain, OutPoint, StructuralTxCheck, Transaction, TxCheck,
    TxIn, TxOut, WalletTx, MAX_MONEY, MAX_TX_SIZE,
};
pub use types::{
    BlockLocator, HdChain, KeyMetadata, KeyPool, MasterKey, WalletKey,
    HD_CHAIN_VERSION_HD_SPLIT, KEY_METADATA_VERSION_WITH_HDDATA,
};

#[cfg(test)]
pub(crate) use primitives::test_keys;
#[cfg(test)]
pub(crate) use transaction::test_txs;
