//! Reference wallet model holding everything in memory

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::codec::{
    HdChain, Hash256, KeyMetadata, KeyPool, MasterKey, PrivKey, PubKey, Script, WalletFlags,
    WalletTx,
};

use super::model::{ReorderError, WalletModel};
use super::version::FEATURE_BASE;

/// Redeem scripts larger than this cannot be spent and are refused.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressBookEntry {
    pub name: String,
    pub purpose: String,
    pub dest_data: BTreeMap<String, String>,
}

/// Counts reported after a load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalletSummary {
    pub address_book: usize,
    pub transactions: usize,
    pub keys: usize,
    pub crypted_keys: usize,
    pub master_keys: usize,
    pub watch_only: usize,
    pub key_pool: usize,
    pub wallet_version: i32,
    pub hd_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct InMemoryWallet {
    pub address_book: BTreeMap<String, AddressBookEntry>,
    pub txs: BTreeMap<Hash256, WalletTx>,
    pub keys: BTreeMap<PubKey, PrivKey>,
    pub crypted_keys: BTreeMap<PubKey, Vec<u8>>,
    pub master_keys: BTreeMap<u32, MasterKey>,
    pub master_key_max_id: u32,
    pub scripts: BTreeSet<Script>,
    pub watch_only: BTreeSet<Script>,
    pub key_metadata: BTreeMap<PubKey, KeyMetadata>,
    pub script_metadata: BTreeMap<Script, KeyMetadata>,
    pub key_pool: BTreeMap<i64, KeyPool>,
    pub order_pos_next: i64,
    pub hd_chain: Option<HdChain>,
    pub flags: WalletFlags,
    pub min_version: i32,
    pub wallet_version: i32,
    /// Earliest key creation time; 0 when unknown.
    pub time_first_key: i64,
    pub rescan_requested: bool,
    pub reorder_calls: u32,
    pub keys_left_since_backup: usize,
    unlocked: bool,
}

impl Default for InMemoryWallet {
    fn default() -> Self {
        Self {
            address_book: BTreeMap::new(),
            txs: BTreeMap::new(),
            keys: BTreeMap::new(),
            crypted_keys: BTreeMap::new(),
            master_keys: BTreeMap::new(),
            master_key_max_id: 0,
            scripts: BTreeSet::new(),
            watch_only: BTreeSet::new(),
            key_metadata: BTreeMap::new(),
            script_metadata: BTreeMap::new(),
            key_pool: BTreeMap::new(),
            order_pos_next: 0,
            hd_chain: None,
            flags: WalletFlags::default(),
            min_version: 0,
            wallet_version: FEATURE_BASE,
            time_first_key: 0,
            rescan_requested: false,
            reorder_calls: 0,
            keys_left_since_backup: 0,
            unlocked: false,
        }
    }
}

impl InMemoryWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds encrypted key material.
    pub fn is_crypted(&self) -> bool {
        !self.master_keys.is_empty() || !self.crypted_keys.is_empty()
    }

    /// Marks an encrypted wallet as unlocked. Key decryption itself is out
    /// of scope here; this only models the lock state.
    pub fn set_unlocked(&mut self, unlocked: bool) {
        self.unlocked = unlocked;
    }

    pub fn summary(&self) -> WalletSummary {
        WalletSummary {
            address_book: self.address_book.len(),
            transactions: self.txs.len(),
            keys: self.keys.len(),
            crypted_keys: self.crypted_keys.len(),
            master_keys: self.master_keys.len(),
            watch_only: self.watch_only.len(),
            key_pool: self.key_pool.len(),
            wallet_version: self.wallet_version,
            hd_enabled: self.hd_chain.is_some(),
        }
    }

    fn entry(&mut self, address: &str) -> &mut AddressBookEntry {
        self.address_book.entry(address.to_string()).or_default()
    }
}

impl WalletModel for InMemoryWallet {
    fn load_min_version(&mut self, version: i32) {
        self.min_version = version;
    }

    fn load_name(&mut self, address: &str, name: String) {
        self.entry(address).name = name;
    }

    fn load_purpose(&mut self, address: &str, purpose: String) {
        self.entry(address).purpose = purpose;
    }

    fn load_dest_data(&mut self, address: &str, key: String, value: String) {
        self.entry(address).dest_data.insert(key, value);
    }

    fn load_tx(&mut self, hash: Hash256, wtx: WalletTx) {
        self.txs.insert(hash, wtx);
    }

    fn load_key(&mut self, pubkey: PubKey, privkey: PrivKey) -> bool {
        self.keys.insert(pubkey, privkey);
        true
    }

    fn load_crypted_key(&mut self, pubkey: PubKey, crypted: Vec<u8>) -> bool {
        if crypted.is_empty() {
            return false;
        }
        self.crypted_keys.insert(pubkey, crypted);
        true
    }

    fn has_master_key(&self, id: u32) -> bool {
        self.master_keys.contains_key(&id)
    }

    fn load_master_key(&mut self, id: u32, master_key: MasterKey) {
        self.master_keys.insert(id, master_key);
    }

    fn load_cscript(&mut self, script: Script) -> bool {
        if script.len() > MAX_SCRIPT_ELEMENT_SIZE {
            return false;
        }
        self.scripts.insert(script);
        true
    }

    fn load_watch_only(&mut self, script: Script) {
        self.watch_only.insert(script);
    }

    fn load_key_metadata(&mut self, pubkey: &PubKey, meta: KeyMetadata) {
        self.update_time_first_key(meta.create_time);
        self.key_metadata.insert(pubkey.clone(), meta);
    }

    fn load_script_metadata(&mut self, script: &Script, meta: KeyMetadata) {
        self.update_time_first_key(meta.create_time);
        self.script_metadata.insert(script.clone(), meta);
    }

    fn load_key_pool(&mut self, index: i64, entry: KeyPool) {
        self.key_pool.insert(index, entry);
    }

    fn load_order_pos_next(&mut self, next: i64) {
        self.order_pos_next = next;
    }

    fn set_hd_chain(&mut self, chain: HdChain) {
        self.hd_chain = Some(chain);
    }

    fn set_wallet_flags(&mut self, flags: WalletFlags) -> bool {
        self.flags = flags;
        true
    }

    fn set_wallet_version(&mut self, version: i32) {
        self.wallet_version = version;
    }

    fn set_master_key_max_id(&mut self, id: u32) {
        self.master_key_max_id = self.master_key_max_id.max(id);
    }

    fn update_time_first_key(&mut self, time: i64) {
        if time <= 0 {
            return;
        }
        if self.time_first_key == 0 || time < self.time_first_key {
            self.time_first_key = time;
        }
    }

    fn request_rescan(&mut self) {
        self.rescan_requested = true;
    }

    fn reorder_transactions(&mut self) -> Result<Vec<Hash256>, ReorderError> {
        self.reorder_calls += 1;

        let mut order: Vec<(u32, Hash256)> = self
            .txs
            .iter()
            .map(|(hash, wtx)| {
                let when = if wtx.time_smart != 0 {
                    wtx.time_smart
                } else {
                    wtx.time_received
                };
                (when, *hash)
            })
            .collect();
        order.sort();

        let mut changed = Vec::new();
        for (pos, (_, hash)) in order.iter().enumerate() {
            let wtx = self
                .txs
                .get_mut(hash)
                .ok_or_else(|| format!("transaction {} vanished during reorder", hash))?;
            let pos = pos as i64;
            if wtx.order_pos != pos {
                wtx.order_pos = pos;
                changed.push(*hash);
            }
        }
        self.order_pos_next = order.len() as i64;
        Ok(changed)
    }

    fn wallet_tx(&self, hash: &Hash256) -> Option<&WalletTx> {
        self.txs.get(hash)
    }

    fn is_locked(&self) -> bool {
        self.is_crypted() && !self.unlocked
    }

    fn key_pool_size(&self) -> usize {
        self.key_pool.len()
    }

    fn set_keys_left_since_backup(&mut self, keys: usize) {
        self.keys_left_since_backup = keys;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::test_txs::wallet_tx;

    #[test]
    fn test_address_book_merges_fields() {
        let mut wallet = InMemoryWallet::new();
        wallet.load_name("addr", "Alice".into());
        wallet.load_purpose("addr", "receive".into());
        wallet.load_dest_data("addr", "used".into(), "1".into());

        let entry = &wallet.address_book["addr"];
        assert_eq!(entry.name, "Alice");
        assert_eq!(entry.purpose, "receive");
        assert_eq!(entry.dest_data["used"], "1");
    }

    #[test]
    fn test_time_first_key_keeps_earliest() {
        let mut wallet = InMemoryWallet::new();
        wallet.update_time_first_key(500);
        wallet.update_time_first_key(900);
        assert_eq!(wallet.time_first_key, 500);
        wallet.update_time_first_key(1);
        assert_eq!(wallet.time_first_key, 1);
    }

    #[test]
    fn test_reorder_assigns_positions_by_time() {
        let mut wallet = InMemoryWallet::new();
        let mut late = wallet_tx(1, -1);
        late.time_received = 200;
        let mut early = wallet_tx(2, -1);
        early.time_received = 100;
        let (late_hash, early_hash) = (late.hash(), early.hash());
        wallet.load_tx(late_hash, late);
        wallet.load_tx(early_hash, early);

        let changed = wallet.reorder_transactions().unwrap();
        assert_eq!(changed.len(), 2);
        assert_eq!(wallet.txs[&early_hash].order_pos, 0);
        assert_eq!(wallet.txs[&late_hash].order_pos, 1);
        assert_eq!(wallet.order_pos_next, 2);
        assert_eq!(wallet.reorder_calls, 1);
    }

    #[test]
    fn test_lock_state_follows_encryption() {
        let mut wallet = InMemoryWallet::new();
        assert!(!wallet.is_locked());

        wallet.load_master_key(1, MasterKey::default());
        assert!(wallet.is_locked());

        wallet.set_unlocked(true);
        assert!(!wallet.is_locked());
    }

    #[test]
    fn test_oversized_cscript_refused() {
        let mut wallet = InMemoryWallet::new();
        assert!(!wallet.load_cscript(Script(vec![0; MAX_SCRIPT_ELEMENT_SIZE + 1])));
        assert!(wallet.load_cscript(Script(vec![0x51])));
    }
}
