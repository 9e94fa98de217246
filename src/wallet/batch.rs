//! Record-level persistence operations
//!
//! Every write is committed immediately unless the caller opened a
//! transaction with `txn_begin`.

use crate::codec::{
    key_integrity_hash, record_key, BlockLocator, DecodeError, Hash160, Hash256, HdChain,
    KeyMetadata, KeyPool, MasterKey, PrivKey, PubKey, RecordKind, Script, StreamReader,
    WalletFlags, WalletRecord, WalletTx,
};
use crate::observability::{log_event_with_fields, Event};
use crate::storage::{KvStore, StoreError, StoreResult, WalletStore};

use super::extension::{CoinSpendSerial, ZerocoinEntry};
use super::version::CLIENT_VERSION;

/// Persistence operations over one store.
pub struct WalletBatch<'a, S: KvStore> {
    pub(super) store: &'a mut S,
}

fn unreadable(what: &str, e: DecodeError) -> StoreError {
    StoreError::corruption(format!("Unreadable {} record: {}", what, e))
}

impl<'a, S: KvStore> WalletBatch<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &*self.store
    }

    fn write_record(&mut self, record: &WalletRecord, overwrite: bool) -> StoreResult<()> {
        let (key, value) = record.encode();
        self.store.write(&key, &value, overwrite)
    }

    /// Reads and decodes a record expected under `key`.
    fn read_record(&self, key: &[u8]) -> StoreResult<Option<WalletRecord>> {
        match self.store.read(key)? {
            Some(value) => WalletRecord::decode(key, &value)
                .map(Some)
                .map_err(|e| StoreError::corruption(e.to_string())),
            None => Ok(None),
        }
    }

    // ===== Address book

    pub fn write_name(&mut self, address: &str, name: &str) -> StoreResult<()> {
        self.write_record(
            &WalletRecord::Name {
                address: address.to_string(),
                name: name.to_string(),
            },
            true,
        )
    }

    /// Only for sending addresses; receiving addresses always keep an entry.
    pub fn erase_name(&mut self, address: &str) -> StoreResult<()> {
        self.store
            .erase(&record_key(RecordKind::Name, |w| w.write_str(address)))
    }

    pub fn write_purpose(&mut self, address: &str, purpose: &str) -> StoreResult<()> {
        self.write_record(
            &WalletRecord::Purpose {
                address: address.to_string(),
                purpose: purpose.to_string(),
            },
            true,
        )
    }

    pub fn erase_purpose(&mut self, address: &str) -> StoreResult<()> {
        self.store
            .erase(&record_key(RecordKind::Purpose, |w| w.write_str(address)))
    }

    pub fn write_dest_data(&mut self, address: &str, key: &str, value: &str) -> StoreResult<()> {
        self.write_record(
            &WalletRecord::DestData {
                address: address.to_string(),
                key: key.to_string(),
                value: value.to_string(),
            },
            true,
        )
    }

    pub fn erase_dest_data(&mut self, address: &str, key: &str) -> StoreResult<()> {
        self.store.erase(&record_key(RecordKind::DestData, |w| {
            w.write_str(address);
            w.write_str(key);
        }))
    }

    // ===== Transactions

    pub fn write_tx(&mut self, wtx: &WalletTx) -> StoreResult<()> {
        self.write_record(
            &WalletRecord::Tx {
                hash: wtx.hash(),
                wtx: wtx.clone(),
                upgrade: None,
            },
            true,
        )
    }

    pub fn erase_tx(&mut self, hash: &Hash256) -> StoreResult<()> {
        self.store
            .erase(&record_key(RecordKind::Tx, |w| w.write(hash)))
    }

    pub fn write_order_pos_next(&mut self, next: i64) -> StoreResult<()> {
        self.write_record(&WalletRecord::OrderPosNext(next), true)
    }

    // ===== Keys

    /// Writes metadata, then the key with its integrity hash. Neither row
    /// may already exist.
    pub fn write_key(
        &mut self,
        pubkey: &PubKey,
        privkey: &PrivKey,
        meta: &KeyMetadata,
    ) -> StoreResult<()> {
        self.write_record(
            &WalletRecord::KeyMeta {
                pubkey: pubkey.clone(),
                meta: meta.clone(),
            },
            false,
        )?;
        self.write_record(
            &WalletRecord::Key {
                pubkey: pubkey.clone(),
                privkey: privkey.clone(),
                integrity: Some(key_integrity_hash(pubkey, privkey)),
            },
            false,
        )
    }

    /// Writes an encrypted key and drops any plaintext copy of it.
    pub fn write_crypted_key(
        &mut self,
        pubkey: &PubKey,
        crypted: &[u8],
        meta: &KeyMetadata,
    ) -> StoreResult<()> {
        self.write_record(
            &WalletRecord::KeyMeta {
                pubkey: pubkey.clone(),
                meta: meta.clone(),
            },
            true,
        )?;
        self.write_record(
            &WalletRecord::CKey {
                pubkey: pubkey.clone(),
                crypted: crypted.to_vec(),
            },
            false,
        )?;
        self.store
            .erase(&record_key(RecordKind::Key, |w| w.write(pubkey)))?;
        self.store
            .erase(&record_key(RecordKind::WKey, |w| w.write(pubkey)))
    }

    pub fn write_master_key(&mut self, id: u32, master_key: &MasterKey) -> StoreResult<()> {
        self.write_record(
            &WalletRecord::MKey {
                id,
                master_key: master_key.clone(),
            },
            true,
        )
    }

    pub fn write_cscript(&mut self, hash: &Hash160, script: &Script) -> StoreResult<()> {
        self.write_record(
            &WalletRecord::CScript {
                hash: *hash,
                script: script.clone(),
            },
            false,
        )
    }

    pub fn write_watch_only(&mut self, script: &Script, meta: &KeyMetadata) -> StoreResult<()> {
        self.write_record(
            &WalletRecord::WatchMeta {
                script: script.clone(),
                meta: meta.clone(),
            },
            true,
        )?;
        self.write_record(
            &WalletRecord::WatchS {
                script: script.clone(),
                marker: b'1',
            },
            true,
        )
    }

    pub fn erase_watch_only(&mut self, script: &Script) -> StoreResult<()> {
        self.store
            .erase(&record_key(RecordKind::WatchMeta, |w| w.write(script)))?;
        self.store
            .erase(&record_key(RecordKind::WatchS, |w| w.write(script)))
    }

    pub fn write_hd_chain(&mut self, chain: &HdChain) -> StoreResult<()> {
        self.write_record(&WalletRecord::HdChain(chain.clone()), true)
    }

    pub fn write_wallet_flags(&mut self, flags: WalletFlags) -> StoreResult<()> {
        self.write_record(&WalletRecord::Flags(flags), true)
    }

    // ===== Key pool

    pub fn read_pool(&self, index: i64) -> StoreResult<Option<KeyPool>> {
        let key = record_key(RecordKind::Pool, |w| w.write_i64(index));
        match self.read_record(&key)? {
            Some(WalletRecord::Pool { entry, .. }) => Ok(Some(entry)),
            _ => Ok(None),
        }
    }

    pub fn write_pool(&mut self, index: i64, entry: &KeyPool) -> StoreResult<()> {
        self.write_record(
            &WalletRecord::Pool {
                index,
                entry: entry.clone(),
            },
            true,
        )
    }

    pub fn erase_pool(&mut self, index: i64) -> StoreResult<()> {
        self.store
            .erase(&record_key(RecordKind::Pool, |w| w.write_i64(index)))
    }

    // ===== Chain position

    /// Writes an empty `bestblock` so readers that require a merkle branch
    /// rescan, and the real locator under `bestblock_nomerkle`.
    pub fn write_best_block(&mut self, locator: &BlockLocator) -> StoreResult<()> {
        self.write_record(&WalletRecord::BestBlock(BlockLocator::default()), true)?;
        self.write_record(&WalletRecord::BestBlockNoMerkle(locator.clone()), true)
    }

    pub fn read_best_block(&self) -> StoreResult<Option<BlockLocator>> {
        let key = record_key(RecordKind::BestBlock, |_| {});
        if let Ok(Some(WalletRecord::BestBlock(locator))) = self.read_record(&key) {
            if !locator.is_null() {
                return Ok(Some(locator));
            }
        }

        let key = record_key(RecordKind::BestBlockNoMerkle, |_| {});
        match self.read_record(&key)? {
            Some(WalletRecord::BestBlockNoMerkle(locator)) => Ok(Some(locator)),
            _ => Ok(None),
        }
    }

    // ===== Versions

    pub fn read_min_version(&self) -> StoreResult<Option<i32>> {
        let key = record_key(RecordKind::MinVersion, |_| {});
        match self.read_record(&key)? {
            Some(WalletRecord::MinVersion(v)) => Ok(Some(v)),
            _ => Ok(None),
        }
    }

    pub fn write_min_version(&mut self, version: i32) -> StoreResult<()> {
        self.write_record(&WalletRecord::MinVersion(version), true)
    }

    /// Stored schema version, with the legacy remap applied.
    pub fn read_version(&self) -> StoreResult<Option<i32>> {
        let key = record_key(RecordKind::Version, |_| {});
        match self.read_record(&key)? {
            Some(WalletRecord::Version(v)) => Ok(Some(v)),
            _ => Ok(None),
        }
    }

    pub fn write_version(&mut self, version: i32) -> StoreResult<()> {
        self.write_record(&WalletRecord::Version(version), true)
    }

    // ===== Transactions on the store

    pub fn txn_begin(&mut self) -> StoreResult<()> {
        self.store.txn_begin()
    }

    pub fn txn_commit(&mut self) -> StoreResult<()> {
        self.store.txn_commit()
    }

    pub fn txn_abort(&mut self) -> StoreResult<()> {
        self.store.txn_abort()
    }

    // ===== Zerocoin

    fn zerocoin_key(kind: RecordKind, id: &[u8]) -> Vec<u8> {
        record_key(kind, |w| w.write_bytes(id))
    }

    fn accumulator_key(denomination: u32, pubcoin_id: i32) -> Vec<u8> {
        record_key(RecordKind::ZcAccumulator, |w| {
            w.write_u32(denomination);
            w.write_i32(pubcoin_id);
        })
    }

    pub fn write_coin_spend_serial(&mut self, spend: &CoinSpendSerial) -> StoreResult<()> {
        let key = Self::zerocoin_key(RecordKind::ZcSerial, &spend.serial);
        self.store.write(&key, &spend.data, true)
    }

    pub fn erase_coin_spend_serial(&mut self, spend: &CoinSpendSerial) -> StoreResult<()> {
        self.store
            .erase(&Self::zerocoin_key(RecordKind::ZcSerial, &spend.serial))
    }

    pub fn write_zerocoin_accumulator(
        &mut self,
        accumulator: &[u8],
        denomination: u32,
        pubcoin_id: i32,
    ) -> StoreResult<()> {
        let key = Self::accumulator_key(denomination, pubcoin_id);
        self.store.write(&key, accumulator, true)
    }

    pub fn read_zerocoin_accumulator(
        &self,
        denomination: u32,
        pubcoin_id: i32,
    ) -> StoreResult<Option<Vec<u8>>> {
        self.store
            .read(&Self::accumulator_key(denomination, pubcoin_id))
    }

    pub fn write_zerocoin_entry(&mut self, entry: &ZerocoinEntry) -> StoreResult<()> {
        let key = Self::zerocoin_key(RecordKind::Zerocoin, &entry.value);
        self.store.write(&key, &entry.data, true)
    }

    pub fn erase_zerocoin_entry(&mut self, entry: &ZerocoinEntry) -> StoreResult<()> {
        self.store
            .erase(&Self::zerocoin_key(RecordKind::Zerocoin, &entry.value))
    }

    pub fn write_unloaded_zerocoin_entry(&mut self, entry: &ZerocoinEntry) -> StoreResult<()> {
        let key = Self::zerocoin_key(RecordKind::UnloadedZerocoin, &entry.value);
        self.store.write(&key, &entry.data, true)
    }

    pub fn erase_unloaded_zerocoin_entry(&mut self, entry: &ZerocoinEntry) -> StoreResult<()> {
        self.store
            .erase(&Self::zerocoin_key(RecordKind::UnloadedZerocoin, &entry.value))
    }

    /// Last block height scanned for zerocoin state.
    pub fn read_calculated_zc_block(&self) -> StoreResult<Option<i32>> {
        let key = record_key(RecordKind::CalculatedZcBlock, |_| {});
        match self.store.read(&key)? {
            Some(value) => StreamReader::new(&value)
                .read_i32()
                .map(Some)
                .map_err(|e| unreadable(RecordKind::CalculatedZcBlock.as_str(), e)),
            None => Ok(None),
        }
    }

    pub fn write_calculated_zc_block(&mut self, height: i32) -> StoreResult<()> {
        let key = record_key(RecordKind::CalculatedZcBlock, |_| {});
        self.store.write(&key, &height.to_le_bytes(), true)
    }

    pub fn list_pub_coins(&self) -> StoreResult<Vec<ZerocoinEntry>> {
        self.list_prefixed(RecordKind::Zerocoin, |value, data| ZerocoinEntry {
            value,
            data,
        })
    }

    pub fn list_unloaded_pub_coins(&self) -> StoreResult<Vec<ZerocoinEntry>> {
        self.list_prefixed(RecordKind::UnloadedZerocoin, |value, data| ZerocoinEntry {
            value,
            data,
        })
    }

    pub fn list_coin_spend_serials(&self) -> StoreResult<Vec<CoinSpendSerial>> {
        self.list_prefixed(RecordKind::ZcSerial, |serial, data| CoinSpendSerial {
            serial,
            data,
        })
    }

    /// Walks every record of `kind`, starting at the smallest id and
    /// stopping at the first key with another tag.
    fn list_prefixed<T>(
        &self,
        kind: RecordKind,
        build: impl Fn(Vec<u8>, Vec<u8>) -> T,
    ) -> StoreResult<Vec<T>> {
        let start = Self::zerocoin_key(kind, &[]);
        let mut out = Vec::new();

        for item in self.store.cursor_from(&start)? {
            let (key, value) = item?;
            let mut r = StreamReader::new(&key);
            let tag = r.read_string().map_err(|e| unreadable(kind.as_str(), e))?;
            if tag != kind.as_str() {
                break;
            }
            let id = r.read_bytes().map_err(|e| unreadable(kind.as_str(), e))?;
            out.push(build(id, value));
        }

        Ok(out)
    }
}

impl WalletBatch<'_, WalletStore> {
    /// Rewrites the file for a NEED_REWRITE load.
    ///
    /// Drops every key pool entry (the pool is refilled from the keys),
    /// compacts the rest and stamps the current version, so the next load
    /// no longer matches a legacy version. Returns the pool entries dropped.
    pub fn rewrite(&mut self) -> StoreResult<u64> {
        let pool_prefix = record_key(RecordKind::Pool, |_| {});
        let dropped = self
            .store
            .compact_retaining(|key| !key.starts_with(&pool_prefix))?;
        self.write_version(CLIENT_VERSION)?;

        log_event_with_fields(
            Event::WalletRewritten,
            &[
                ("path", &self.store.path().display().to_string()),
                ("pool_dropped", &dropped.to_string()),
            ],
        );
        Ok(dropped)
    }
}
