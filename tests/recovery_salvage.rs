//! Recovery Salvage Tests
//!
//! - A damaged batch is lost but every other batch survives salvage
//! - The keys-only filter keeps exactly the decodable key material
//! - The damaged original is kept under a backup name
//! - Verification salvages automatically

use std::collections::BTreeSet;
use std::fs;

use tempfile::TempDir;
use walletdb::codec::{
    sha256d, DecodeContext, HdChain, MasterKey, PrivKey, PubKey, WalletRecord,
};
use walletdb::recovery::{
    recover, verify_database_file, AcceptAll, KeysOnlyFilter, RecordFilter, RecoveryErrorCode,
};
use walletdb::storage::{KvStore, WalletStore};
use walletdb::wallet::{InMemoryWallet, LoadOutcome, WalletBatch};

// =============================================================================
// Test Utilities
// =============================================================================

fn pubkey(seed: u8) -> PubKey {
    let mut bytes = vec![0x03];
    bytes.extend(sha256d(&[seed]).0);
    PubKey(bytes)
}

fn privkey(seed: u8) -> PrivKey {
    PrivKey(vec![seed.max(1); 214])
}

fn put(store: &mut WalletStore, record: &WalletRecord) {
    let (key, value) = record.encode();
    store.write(&key, &value, true).unwrap();
}

fn put_truncated(store: &mut WalletStore, record: &WalletRecord) {
    let (key, value) = record.encode();
    store.write(&key, &value[..value.len() / 2], true).unwrap();
}

fn tags(store: &WalletStore) -> BTreeSet<String> {
    store
        .cursor()
        .unwrap()
        .map(|item| {
            let (key, value) = item.unwrap();
            WalletRecord::decode(&key, &value).unwrap().tag().to_string()
        })
        .collect()
}

/// Filter that records what it was shown.
struct Recording {
    seen: usize,
}

impl RecordFilter for Recording {
    fn keep(&mut self, key: &[u8], _value: &[u8]) -> bool {
        self.seen += 1;
        !key.is_empty()
    }
}

// =============================================================================
// Structural salvage
// =============================================================================

#[test]
fn test_damaged_batch_is_skipped_rest_survives() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("wallet.dat");
    let first_len;
    {
        let mut store = WalletStore::open(&path).unwrap();
        store.write(b"first", b"lost", true).unwrap();
        first_len = fs::metadata(&path).unwrap().len() as usize;
        store.write(b"second", b"kept", true).unwrap();
        store.write(b"third", b"kept", true).unwrap();
    }

    // Flip the last payload byte of the first batch.
    let mut contents = fs::read(&path).unwrap();
    contents[first_len - 5] ^= 0xFF;
    fs::write(&path, &contents).unwrap();

    assert!(WalletStore::open(&path).is_err());

    let mut filter = Recording { seen: 0 };
    let report = recover(&path, &mut filter).unwrap();
    assert_eq!(report.damaged_batches, 1);
    assert_eq!(report.kept, 2);
    assert_eq!(filter.seen, 2);

    let store = WalletStore::open(&path).unwrap();
    assert_eq!(store.read(b"first").unwrap(), None);
    assert_eq!(store.read(b"second").unwrap(), Some(b"kept".to_vec()));

    // The original bytes are preserved under the backup name.
    assert_eq!(fs::read(&report.backup_path).unwrap(), contents);
    let backup_name = report.backup_path.file_name().unwrap().to_string_lossy();
    assert!(backup_name.starts_with("wallet.dat."));
    assert!(backup_name.ends_with(".bak"));
}

#[test]
fn test_no_temporary_files_left_behind() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("wallet.dat");
    WalletStore::open(&path)
        .unwrap()
        .write(b"k", b"v", true)
        .unwrap();

    recover(&path, &mut AcceptAll).unwrap();

    let names: Vec<String> = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.iter().all(|n| !n.ends_with(".tmp")));
}

#[test]
fn test_missing_file_cannot_be_recovered() {
    let temp_dir = TempDir::new().unwrap();
    let err = recover(&temp_dir.path().join("absent.dat"), &mut AcceptAll).unwrap_err();
    assert_eq!(err.code(), RecoveryErrorCode::SalvageFailed);
}

// =============================================================================
// Keys-only rescue
// =============================================================================

#[test]
fn test_keys_only_keeps_decodable_key_material() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("wallet.dat");
    {
        let mut store = WalletStore::open(&path).unwrap();
        put(
            &mut store,
            &WalletRecord::Key {
                pubkey: pubkey(1),
                privkey: privkey(1),
                integrity: None,
            },
        );
        // Wrong integrity hash: decodes but fails validation.
        put(
            &mut store,
            &WalletRecord::Key {
                pubkey: pubkey(2),
                privkey: privkey(2),
                integrity: Some(sha256d(b"wrong")),
            },
        );
        put_truncated(
            &mut store,
            &WalletRecord::CKey {
                pubkey: pubkey(3),
                crypted: vec![9; 48],
            },
        );
        put(
            &mut store,
            &WalletRecord::MKey {
                id: 1,
                master_key: MasterKey {
                    crypted_key: vec![1; 48],
                    salt: vec![2; 8],
                    derivation_method: 0,
                    derive_iterations: 25_000,
                    other_params: vec![],
                },
            },
        );
        put(
            &mut store,
            &WalletRecord::HdChain(HdChain {
                version: 1,
                external_counter: 3,
                seed_id: Default::default(),
                internal_counter: 0,
            }),
        );
        put(
            &mut store,
            &WalletRecord::Name {
                address: "addr".into(),
                name: "Alice".into(),
            },
        );
        put(&mut store, &WalletRecord::Version(170_000));
        put(
            &mut store,
            &WalletRecord::Unknown {
                tag: "future".into(),
                key_fields: vec![],
                value: vec![1],
            },
        );
    }

    let report = recover(&path, &mut KeysOnlyFilter::new()).unwrap();
    assert_eq!(report.kept, 3);
    assert_eq!(report.filtered, 5);

    let store = WalletStore::open(&path).unwrap();
    let expected: BTreeSet<String> = ["key", "mkey", "hdchain"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(tags(&store), expected);
    drop(store);

    // The rescue copy loads cleanly.
    let mut store = WalletStore::open(&path).unwrap();
    let mut wallet = InMemoryWallet::new();
    let load = WalletBatch::new(&mut store).load_wallet(&mut wallet, &DecodeContext::default());
    assert_eq!(load.outcome, LoadOutcome::Ok);
    assert_eq!(wallet.keys.len(), 1);
    assert_eq!(wallet.master_keys.len(), 1);
    assert!(wallet.hd_chain.is_some());
}

// =============================================================================
// Verification
// =============================================================================

#[test]
fn test_verify_salvages_truncated_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("wallet.dat");
    {
        let mut store = WalletStore::open(&path).unwrap();
        store.write(b"a", b"1", true).unwrap();
        store.write(b"b", b"2", true).unwrap();
    }
    let contents = fs::read(&path).unwrap();
    fs::write(&path, &contents[..contents.len() - 3]).unwrap();

    let warning = verify_database_file(&path).unwrap();
    assert!(warning.is_some());

    let store = WalletStore::open(&path).unwrap();
    assert_eq!(store.read(b"a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(store.read(b"b").unwrap(), None);
}
