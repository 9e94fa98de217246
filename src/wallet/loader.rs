//! Load pipeline
//!
//! One pass over the store:
//!
//! ```text
//! Start -> ReadMinVersion -> OpenCursor -> {ReadRecord -> Classify}* -> Finalize
//! ```
//!
//! Per-record failures are classified by tag. Losing key material is
//! CORRUPT, unreadable flags are TOO_NEW, anything else is a warning and
//! the scan continues. A fatal outcome skips every migration step: a
//! damaged store is never modified automatically.

use serde::Serialize;

use crate::codec::{
    read_tag, DecodeContext, DecodeError, Decodable, Hash256, RecordError, RecordKind,
    StreamReader, TxUpgrade, WalletRecord, WalletTx,
};
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::storage::{KvStore, StoreErrorCode};

use super::batch::WalletBatch;
use super::model::WalletModel;
use super::outcome::LoadOutcome;
use super::scan::ScanState;
use super::version::{needs_rewrite, CLIENT_VERSION, FEATURE_LATEST};

/// What a load pass saw and did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub outcome: LoadOutcome,
    pub file_version: i32,
    pub plaintext_keys: u32,
    pub encrypted_keys: u32,
    pub watch_keys: u32,
    pub key_meta: u32,
    pub unknown_records: u32,
    pub skipped_records: u32,
    pub upgraded_txs: u32,
    pub reordered: bool,
    pub version_written: bool,
}

impl LoadReport {
    fn new(outcome: LoadOutcome) -> Self {
        Self {
            outcome,
            file_version: 0,
            plaintext_keys: 0,
            encrypted_keys: 0,
            watch_keys: 0,
            key_meta: 0,
            unknown_records: 0,
            skipped_records: 0,
            upgraded_txs: 0,
            reordered: false,
            version_written: false,
        }
    }

    fn absorb(&mut self, scan: &ScanState) {
        self.file_version = scan.file_version;
        self.plaintext_keys = scan.plaintext_keys;
        self.encrypted_keys = scan.encrypted_keys;
        self.watch_keys = scan.watch_keys;
        self.key_meta = scan.key_meta;
        self.unknown_records = scan.unknown_records;
    }
}

/// Result of a selective transaction erase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZapReport {
    pub outcome: LoadOutcome,
    /// Matching hashes, including any whose erase failed
    pub erased: Vec<Hash256>,
}

/// Bookkeeping tags the load pass skips without counting.
fn ignored_on_load(kind: RecordKind) -> bool {
    matches!(
        kind,
        RecordKind::BestBlock
            | RecordKind::BestBlockNoMerkle
            | RecordKind::MinVersion
            | RecordKind::AcEntry
    )
}

/// Decodes one pair and applies it to the model.
///
/// Returns the record's tag on success. On failure the error names the tag
/// so the caller can classify it.
pub fn read_key_value<M: WalletModel + ?Sized>(
    model: &mut M,
    key: &[u8],
    value: &[u8],
    scan: &mut ScanState,
    ctx: &DecodeContext<'_>,
) -> Result<String, RecordError> {
    let tag = read_tag(key).map_err(|e| RecordError::new(String::new(), e))?;
    match RecordKind::from_tag(&tag) {
        Some(kind) if ignored_on_load(kind) => return Ok(tag),
        // Zerocoin records are not part of the wallet model: unknown here.
        Some(kind) if kind.is_extension() => {
            scan.unknown_records += 1;
            return Ok(tag);
        }
        _ => {}
    }

    let record = WalletRecord::decode_with(key, value, ctx)?;
    let reject = |e: DecodeError| RecordError::new(tag.clone(), e);

    match record {
        WalletRecord::Name { address, name } => model.load_name(&address, name),
        WalletRecord::Purpose { address, purpose } => model.load_purpose(&address, purpose),
        WalletRecord::Tx { hash, wtx, upgrade } => {
            if let Some(upgrade) = upgrade {
                let (action, marker) = match upgrade {
                    TxUpgrade::Upgraded { marker } => ("upgrading", marker),
                    TxUpgrade::Repaired { marker } => ("repairing", marker),
                };
                log_event_with_fields(
                    Event::TxUpgraded,
                    &[
                        ("action", action),
                        ("marker", &marker.to_string()),
                        ("tx", &hash.to_string()),
                    ],
                );
                scan.wallet_upgrade.push(hash);
            }
            if wtx.is_unordered() {
                scan.any_unordered = true;
            }
            model.load_tx(hash, wtx);
        }
        WalletRecord::WatchS { script, marker } => {
            scan.watch_keys += 1;
            if marker == b'1' {
                model.load_watch_only(script);
            }
        }
        WalletRecord::Key {
            pubkey, privkey, ..
        } => {
            scan.plaintext_keys += 1;
            if !model.load_key(pubkey, privkey) {
                return Err(reject(DecodeError::Rejected("LoadKey failed")));
            }
        }
        WalletRecord::WKey { pubkey, wkey, .. } => {
            if !model.load_key(pubkey, wkey.privkey) {
                return Err(reject(DecodeError::Rejected("LoadKey failed")));
            }
        }
        WalletRecord::MKey { id, master_key } => {
            if scan.has_master_key(id) || model.has_master_key(id) {
                return Err(reject(DecodeError::DuplicateMasterKey(id)));
            }
            scan.note_master_key(id);
            model.load_master_key(id, master_key);
        }
        WalletRecord::CKey { pubkey, crypted } => {
            scan.encrypted_keys += 1;
            if !model.load_crypted_key(pubkey, crypted) {
                return Err(reject(DecodeError::Rejected("LoadCryptedKey failed")));
            }
            scan.is_encrypted = true;
        }
        WalletRecord::KeyMeta { pubkey, meta } => {
            scan.key_meta += 1;
            model.load_key_metadata(&pubkey, meta);
        }
        WalletRecord::WatchMeta { script, meta } => {
            scan.key_meta += 1;
            model.load_script_metadata(&script, meta);
        }
        // Validated by the decoder; the default key itself is not kept.
        WalletRecord::DefaultKey(_) => {}
        WalletRecord::Pool { index, entry } => model.load_key_pool(index, entry),
        WalletRecord::Version(version) => scan.file_version = version,
        WalletRecord::CScript { script, .. } => {
            if !model.load_cscript(script) {
                return Err(reject(DecodeError::Rejected("LoadCScript failed")));
            }
        }
        WalletRecord::OrderPosNext(next) => model.load_order_pos_next(next),
        WalletRecord::DestData {
            address,
            key,
            value,
        } => model.load_dest_data(&address, key, value),
        WalletRecord::HdChain(chain) => model.set_hd_chain(chain),
        WalletRecord::Flags(flags) => {
            if !model.set_wallet_flags(flags) {
                return Err(reject(DecodeError::UnknownFlags(flags.bits())));
            }
        }
        WalletRecord::BestBlock(_)
        | WalletRecord::BestBlockNoMerkle(_)
        | WalletRecord::MinVersion(_)
        | WalletRecord::Extension { .. } => {}
        WalletRecord::Unknown { .. } => scan.unknown_records += 1,
    }

    Ok(tag)
}

/// Outcome a failed record contributes, or `None` for a tolerable failure.
fn classify_failure(tag: &str) -> Option<LoadOutcome> {
    match RecordKind::from_tag(tag) {
        Some(kind) if kind.is_key_type() || kind == RecordKind::DefaultKey => {
            Some(LoadOutcome::Corrupt)
        }
        Some(RecordKind::Flags) => Some(LoadOutcome::TooNew),
        _ => None,
    }
}

impl<'a, S: KvStore> WalletBatch<'a, S> {
    /// Reads `minversion`. An unreadable value counts as absent.
    fn check_min_version(&self) -> Result<Option<i32>, LoadOutcome> {
        match self.read_min_version() {
            Ok(Some(version)) if version > FEATURE_LATEST => Err(LoadOutcome::TooNew),
            Ok(found) => Ok(found),
            Err(e) if e.code() == StoreErrorCode::Corruption => Ok(None),
            Err(_) => Err(LoadOutcome::Corrupt),
        }
    }

    /// Scans the whole store into `model`.
    pub fn load_wallet<M: WalletModel + ?Sized>(
        &mut self,
        model: &mut M,
        ctx: &DecodeContext<'_>,
    ) -> LoadReport {
        log_event(Event::LoadStart);

        match self.check_min_version() {
            Ok(Some(version)) => model.load_min_version(version),
            Ok(None) => {}
            Err(outcome) => return abort(LoadReport::new(outcome), "minversion"),
        }

        let mut scan = ScanState::new();
        let mut outcome = LoadOutcome::Ok;
        let mut noncritical = false;
        let mut skipped = 0u32;

        {
            let cursor = match self.store.cursor() {
                Ok(cursor) => cursor,
                Err(_) => return abort(LoadReport::new(LoadOutcome::Corrupt), "cursor"),
            };

            for item in cursor {
                let (key, value) = match item {
                    Ok(pair) => pair,
                    Err(_) => return abort(LoadReport::new(LoadOutcome::Corrupt), "read"),
                };

                if let Err(err) = read_key_value(model, &key, &value, &mut scan, ctx) {
                    skipped += 1;
                    match classify_failure(&err.tag) {
                        Some(fatal) => outcome = outcome.escalate(fatal),
                        None => {
                            noncritical = true;
                            if err.tag == RecordKind::Tx.as_str() {
                                model.request_rescan();
                            }
                        }
                    }
                    log_event_with_fields(
                        Event::RecordSkipped,
                        &[("tag", &err.tag), ("error", &err.error.to_string())],
                    );
                }
            }
        }

        if noncritical && outcome.is_ok() {
            outcome = LoadOutcome::NoncriticalError;
        }

        model.set_wallet_version(scan.file_version);
        if let Some(max_id) = scan.master_key_max_id() {
            model.set_master_key_max_id(max_id);
        }

        let mut report = LoadReport::new(outcome);
        report.absorb(&scan);
        report.skipped_records = skipped;

        // Any corruption at all: no rewriting or upgrading.
        if !outcome.is_ok() {
            if outcome.is_fatal() {
                return abort(report, "records");
            }
            log_summary(&report);
            return report;
        }

        if !scan.key_metadata_complete() {
            model.update_time_first_key(1);
        }

        for hash in &scan.wallet_upgrade {
            if let Some(wtx) = model.wallet_tx(hash).cloned() {
                match self.write_tx(&wtx) {
                    Ok(()) => report.upgraded_txs += 1,
                    Err(e) => log_event_with_fields(
                        Event::RecordSkipped,
                        &[("tag", "tx"), ("error", &e.to_string())],
                    ),
                }
            }
        }

        if needs_rewrite(scan.is_encrypted, scan.file_version) {
            report.outcome = LoadOutcome::NeedRewrite;
            log_summary(&report);
            return report;
        }

        if scan.file_version < CLIENT_VERSION {
            match self.write_version(CLIENT_VERSION) {
                Ok(()) => {
                    report.version_written = true;
                    log_event_with_fields(
                        Event::VersionUpgraded,
                        &[
                            ("from", &scan.file_version.to_string()),
                            ("to", &CLIENT_VERSION.to_string()),
                        ],
                    );
                }
                Err(e) => log_event_with_fields(
                    Event::RecordSkipped,
                    &[("tag", "version"), ("error", &e.to_string())],
                ),
            }
        }

        if scan.any_unordered {
            report.outcome = self.reorder(model);
            report.reordered = true;
        }

        log_summary(&report);
        report
    }

    /// Runs the model's reorder and persists what moved.
    fn reorder<M: WalletModel + ?Sized>(&mut self, model: &mut M) -> LoadOutcome {
        let changed = match model.reorder_transactions() {
            Ok(changed) => changed,
            Err(reason) => {
                log_event_with_fields(Event::LoadAborted, &[("stage", "reorder"), ("error", &reason)]);
                return LoadOutcome::Corrupt;
            }
        };

        for hash in &changed {
            let Some(wtx) = model.wallet_tx(hash).cloned() else {
                continue;
            };
            if let Err(e) = self.write_tx(&wtx) {
                log_event_with_fields(
                    Event::LoadAborted,
                    &[("stage", "reorder"), ("error", &e.to_string())],
                );
                return LoadOutcome::Corrupt;
            }
        }

        log_event_with_fields(Event::TxReordered, &[("changed", &changed.len().to_string())]);
        LoadOutcome::Ok
    }

    /// Read-only scan collecting every transaction record.
    pub fn find_wallet_tx(&self) -> Result<Vec<(Hash256, WalletTx)>, LoadOutcome> {
        self.check_min_version()?;

        let cursor = self.store.cursor().map_err(|_| LoadOutcome::Corrupt)?;
        let mut found = Vec::new();

        for item in cursor {
            let (key, value) = item.map_err(|_| LoadOutcome::Corrupt)?;
            let mut k = StreamReader::new(&key);
            let tag = k.read_string().map_err(|_| LoadOutcome::Corrupt)?;
            if tag != RecordKind::Tx.as_str() {
                continue;
            }
            let hash: Hash256 = k.read().map_err(|_| LoadOutcome::Corrupt)?;
            let wtx = WalletTx::decode(&mut StreamReader::new(&value))
                .map_err(|_| LoadOutcome::Corrupt)?;
            found.push((hash, wtx));
        }

        Ok(found)
    }

    /// Erases the listed transactions that exist in the store.
    ///
    /// Every match is attempted; any failed erase makes the outcome
    /// CORRUPT.
    pub fn zap_select_tx(&mut self, targets: &[Hash256]) -> ZapReport {
        let mut found: Vec<Hash256> = match self.find_wallet_tx() {
            Ok(found) => found.into_iter().map(|(hash, _)| hash).collect(),
            Err(outcome) => {
                return ZapReport {
                    outcome,
                    erased: Vec::new(),
                }
            }
        };
        let mut targets = targets.to_vec();
        found.sort();
        targets.sort();

        let mut erase_failed = false;
        let mut erased = Vec::new();
        let mut it = 0;
        for hash in &found {
            while it < targets.len() && targets[it] < *hash {
                it += 1;
            }
            if it == targets.len() {
                break;
            }
            if targets[it] == *hash {
                if let Err(e) = self.erase_tx(hash) {
                    log_event_with_fields(
                        Event::RecordSkipped,
                        &[("tag", "tx"), ("tx", &hash.to_string()), ("error", &e.to_string())],
                    );
                    erase_failed = true;
                }
                erased.push(*hash);
            }
        }

        log_event_with_fields(Event::TxZapped, &[("count", &erased.len().to_string())]);
        ZapReport {
            outcome: if erase_failed {
                LoadOutcome::Corrupt
            } else {
                LoadOutcome::Ok
            },
            erased,
        }
    }

    /// Erases every transaction, returning what was removed.
    pub fn zap_wallet_tx(&mut self) -> Result<Vec<WalletTx>, LoadOutcome> {
        let found = self.find_wallet_tx()?;

        for (hash, _) in &found {
            self.erase_tx(hash).map_err(|_| LoadOutcome::Corrupt)?;
        }

        log_event_with_fields(Event::TxZapped, &[("count", &found.len().to_string())]);
        Ok(found.into_iter().map(|(_, wtx)| wtx).collect())
    }
}

fn abort(report: LoadReport, stage: &str) -> LoadReport {
    log_event_with_fields(
        Event::LoadAborted,
        &[("outcome", report.outcome.as_str()), ("stage", stage)],
    );
    report
}

fn log_summary(report: &LoadReport) {
    log_event_with_fields(
        Event::LoadComplete,
        &[
            ("outcome", report.outcome.as_str()),
            ("file_version", &report.file_version.to_string()),
            ("plaintext_keys", &report.plaintext_keys.to_string()),
            ("encrypted_keys", &report.encrypted_keys.to_string()),
            ("key_meta", &report.key_meta.to_string()),
            ("unknown_records", &report.unknown_records.to_string()),
            ("skipped_records", &report.skipped_records.to_string()),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::test_keys::{compressed_pubkey, privkey};
    use crate::codec::test_txs::wallet_tx;
    use crate::codec::{KeyMetadata, MasterKey, WalletFlags};
    use crate::storage::WalletStore;
    use crate::wallet::InMemoryWallet;
    use tempfile::TempDir;

    // ===== Test Utilities =====

    fn open_temp() -> (TempDir, WalletStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = WalletStore::open(&temp_dir.path().join("wallet.dat")).unwrap();
        (temp_dir, store)
    }

    fn put_record(store: &mut WalletStore, record: &WalletRecord) {
        let (key, value) = record.encode();
        store.write(&key, &value, true).unwrap();
    }

    /// Writes a record under its real key with a damaged value.
    fn put_corrupt(store: &mut WalletStore, record: &WalletRecord) {
        let (key, value) = record.encode();
        store.write(&key, &value[..value.len() / 2], true).unwrap();
    }

    fn load(store: &mut WalletStore) -> (LoadReport, InMemoryWallet) {
        let mut wallet = InMemoryWallet::new();
        let report = WalletBatch::new(store).load_wallet(&mut wallet, &DecodeContext::default());
        (report, wallet)
    }

    fn name(address: &str, label: &str) -> WalletRecord {
        WalletRecord::Name {
            address: address.into(),
            name: label.into(),
        }
    }

    fn add_key(store: &mut WalletStore, seed: u8) {
        WalletBatch::new(store)
            .write_key(
                &compressed_pubkey(seed),
                &privkey(seed),
                &KeyMetadata::new(1_000 + seed as i64),
            )
            .unwrap();
    }

    // ===== Outcomes =====

    #[test]
    fn test_clean_store_loads_ok_and_bumps_version() {
        let (_dir, mut store) = open_temp();
        add_key(&mut store, 1);
        put_record(&mut store, &name("addr", "Alice"));

        let (report, wallet) = load(&mut store);
        assert_eq!(report.outcome, LoadOutcome::Ok);
        assert_eq!(report.plaintext_keys, 1);
        assert_eq!(wallet.keys.len(), 1);
        assert_eq!(wallet.time_first_key, 1_001);
        assert!(report.version_written);
        assert_eq!(
            WalletBatch::new(&mut store).read_version().unwrap(),
            Some(CLIENT_VERSION)
        );
    }

    #[test]
    fn test_min_version_too_new_scans_nothing() {
        let (_dir, mut store) = open_temp();
        put_record(&mut store, &WalletRecord::MinVersion(FEATURE_LATEST + 1));
        put_record(&mut store, &name("addr", "Alice"));

        let (report, wallet) = load(&mut store);
        assert_eq!(report.outcome, LoadOutcome::TooNew);
        assert!(wallet.address_book.is_empty());
    }

    #[test]
    fn test_min_version_within_range_is_passed_to_model() {
        let (_dir, mut store) = open_temp();
        put_record(&mut store, &WalletRecord::MinVersion(300));

        let (report, wallet) = load(&mut store);
        assert_eq!(report.outcome, LoadOutcome::Ok);
        assert_eq!(wallet.min_version, 300);
    }

    #[test]
    fn test_corrupt_key_bearing_records_are_fatal() {
        let fatal_records = vec![
            WalletRecord::Key {
                pubkey: compressed_pubkey(1),
                privkey: privkey(1),
                integrity: None,
            },
            WalletRecord::CKey {
                pubkey: compressed_pubkey(2),
                crypted: vec![1; 48],
            },
            WalletRecord::MKey {
                id: 1,
                master_key: MasterKey {
                    crypted_key: vec![1; 48],
                    salt: vec![2; 8],
                    ..Default::default()
                },
            },
            WalletRecord::DefaultKey(compressed_pubkey(3)),
        ];

        for record in fatal_records {
            let (_dir, mut store) = open_temp();
            put_record(&mut store, &name("addr", "Alice"));
            put_corrupt(&mut store, &record);

            let (report, _) = load(&mut store);
            assert_eq!(
                report.outcome,
                LoadOutcome::Corrupt,
                "corrupt {} must be fatal",
                record.tag()
            );
            assert!(!report.version_written);
        }
    }

    #[test]
    fn test_unknown_flags_are_too_new() {
        let (_dir, mut store) = open_temp();
        let (key, _) = WalletRecord::Flags(WalletFlags(0)).encode();
        store.write(&key, &(1u64 << 45).to_le_bytes(), true).unwrap();

        let (report, _) = load(&mut store);
        assert_eq!(report.outcome, LoadOutcome::TooNew);
    }

    #[test]
    fn test_corrupt_key_beats_bad_flags() {
        let (_dir, mut store) = open_temp();
        let (key, _) = WalletRecord::Flags(WalletFlags(0)).encode();
        store.write(&key, &(1u64 << 45).to_le_bytes(), true).unwrap();
        put_corrupt(
            &mut store,
            &WalletRecord::Key {
                pubkey: compressed_pubkey(1),
                privkey: privkey(1),
                integrity: None,
            },
        );

        let (report, _) = load(&mut store);
        assert_eq!(report.outcome, LoadOutcome::Corrupt);
    }

    #[test]
    fn test_corrupt_name_is_noncritical_and_skips_migrations() {
        let (_dir, mut store) = open_temp();
        add_key(&mut store, 1);
        put_record(&mut store, &name("good", "Bob"));
        put_corrupt(&mut store, &name("bad", "Mallory"));
        put_record(&mut store, &WalletRecord::Version(60_000));

        let (report, wallet) = load(&mut store);
        assert_eq!(report.outcome, LoadOutcome::NoncriticalError);
        assert_eq!(report.skipped_records, 1);
        assert_eq!(wallet.keys.len(), 1);
        assert_eq!(wallet.address_book["good"].name, "Bob");
        assert!(!wallet.address_book.contains_key("bad"));
        assert_eq!(wallet.wallet_version, 60_000);
        assert!(!report.version_written);
    }

    #[test]
    fn test_corrupt_tx_requests_rescan() {
        let (_dir, mut store) = open_temp();
        let wtx = wallet_tx(1, 0);
        put_corrupt(
            &mut store,
            &WalletRecord::Tx {
                hash: wtx.hash(),
                wtx,
                upgrade: None,
            },
        );

        let (report, wallet) = load(&mut store);
        assert_eq!(report.outcome, LoadOutcome::NoncriticalError);
        assert!(wallet.rescan_requested);
    }

    #[test]
    fn test_duplicate_master_key_in_model_is_corrupt() {
        let (_dir, mut store) = open_temp();
        WalletBatch::new(&mut store)
            .write_master_key(4, &MasterKey::default())
            .unwrap();

        let mut wallet = InMemoryWallet::new();
        wallet.load_master_key(4, MasterKey::default());
        let report = WalletBatch::new(&mut store).load_wallet(&mut wallet, &DecodeContext::default());
        assert_eq!(report.outcome, LoadOutcome::Corrupt);
    }

    #[test]
    fn test_master_key_max_id_merged() {
        let (_dir, mut store) = open_temp();
        {
            let mut batch = WalletBatch::new(&mut store);
            batch.write_master_key(2, &MasterKey::default()).unwrap();
            batch.write_master_key(7, &MasterKey::default()).unwrap();
        }

        let (_, wallet) = load(&mut store);
        assert_eq!(wallet.master_keys.len(), 2);
        assert_eq!(wallet.master_key_max_id, 7);
    }

    // ===== Migrations =====

    #[test]
    fn test_legacy_encrypted_version_needs_rewrite() {
        let (_dir, mut store) = open_temp();
        WalletBatch::new(&mut store)
            .write_crypted_key(&compressed_pubkey(1), &[9; 48], &KeyMetadata::new(5))
            .unwrap();
        put_record(&mut store, &WalletRecord::Version(40_000));

        let (report, _) = load(&mut store);
        assert_eq!(report.outcome, LoadOutcome::NeedRewrite);
        assert!(!report.version_written);
    }

    #[test]
    fn test_missing_metadata_marks_first_key_time_unreliable() {
        let (_dir, mut store) = open_temp();
        put_record(
            &mut store,
            &WalletRecord::Key {
                pubkey: compressed_pubkey(1),
                privkey: privkey(1),
                integrity: None,
            },
        );

        let (report, wallet) = load(&mut store);
        assert_eq!(report.outcome, LoadOutcome::Ok);
        assert_eq!(wallet.time_first_key, 1);
    }

    #[test]
    fn test_legacy_tx_is_rewritten() {
        let (_dir, mut store) = open_temp();
        let mut wtx = wallet_tx(1, 0);
        wtx.time_received_is_tx_time = 31_600;
        let hash = wtx.hash();
        put_record(
            &mut store,
            &WalletRecord::Tx {
                hash,
                wtx,
                upgrade: None,
            },
        );

        let (report, _) = load(&mut store);
        assert_eq!(report.upgraded_txs, 1);

        let found = WalletBatch::new(&mut store).find_wallet_tx().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1.time_received_is_tx_time, 0);
    }

    #[test]
    fn test_unordered_transactions_reordered_once() {
        let (_dir, mut store) = open_temp();
        for seed in 1..=3 {
            let wtx = wallet_tx(seed, -1);
            put_record(
                &mut store,
                &WalletRecord::Tx {
                    hash: wtx.hash(),
                    wtx,
                    upgrade: None,
                },
            );
        }

        let (report, wallet) = load(&mut store);
        assert_eq!(report.outcome, LoadOutcome::Ok);
        assert!(report.reordered);
        assert_eq!(wallet.reorder_calls, 1);

        // Positions were persisted: a second load needs no reorder.
        let (report, wallet) = load(&mut store);
        assert!(!report.reordered);
        assert_eq!(wallet.reorder_calls, 0);
    }

    #[test]
    fn test_unknown_and_zerocoin_records_are_counted() {
        let (_dir, mut store) = open_temp();
        put_record(
            &mut store,
            &WalletRecord::Unknown {
                tag: "futurerecord".into(),
                key_fields: vec![],
                value: vec![1],
            },
        );
        put_record(
            &mut store,
            &WalletRecord::Extension {
                kind: RecordKind::ZcSerial,
                key_fields: vec![1, 5],
                value: vec![0xFF],
            },
        );
        put_record(
            &mut store,
            &WalletRecord::Extension {
                kind: RecordKind::AcEntry,
                key_fields: vec![2],
                value: vec![0xFF],
            },
        );
        // Ignored bookkeeping tags are never decoded.
        let (key, _) = WalletRecord::BestBlock(Default::default()).encode();
        store.write(&key, &[0xFF], true).unwrap();

        let (report, _) = load(&mut store);
        assert_eq!(report.outcome, LoadOutcome::Ok);
        // futurerecord and zcserial; acentry and bestblock are not counted.
        assert_eq!(report.unknown_records, 2);
    }

    // ===== Transaction erasure =====

    fn store_with_txs(seeds: &[u8]) -> (TempDir, WalletStore, Vec<Hash256>) {
        let (dir, mut store) = open_temp();
        let mut hashes = Vec::new();
        for seed in seeds {
            let wtx = wallet_tx(*seed, 0);
            hashes.push(wtx.hash());
            WalletBatch::new(&mut store).write_tx(&wtx).unwrap();
        }
        (dir, store, hashes)
    }

    #[test]
    fn test_zap_select_erases_only_matches() {
        let (_dir, mut store, hashes) = store_with_txs(&[1, 2, 3]);
        let absent = wallet_tx(9, 0).hash();

        let report =
            WalletBatch::new(&mut store).zap_select_tx(&[hashes[2], absent, hashes[0]]);
        assert_eq!(report.outcome, LoadOutcome::Ok);
        assert_eq!(report.erased.len(), 2);

        let remaining = WalletBatch::new(&mut store).find_wallet_tx().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].0, hashes[1]);
    }

    #[test]
    fn test_zap_wallet_tx_erases_everything() {
        let (_dir, mut store, _) = store_with_txs(&[1, 2]);
        put_record(&mut store, &name("addr", "Alice"));

        let removed = WalletBatch::new(&mut store).zap_wallet_tx().unwrap();
        assert_eq!(removed.len(), 2);
        assert!(WalletBatch::new(&mut store).find_wallet_tx().unwrap().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_find_wallet_tx_respects_min_version() {
        let (_dir, mut store, _) = store_with_txs(&[1]);
        put_record(&mut store, &WalletRecord::MinVersion(FEATURE_LATEST + 1));

        assert_eq!(
            WalletBatch::new(&mut store).find_wallet_tx(),
            Err(LoadOutcome::TooNew)
        );
    }
}
