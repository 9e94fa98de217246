//! Wallet model callbacks
//!
//! The load pipeline owns no wallet state. It hands every decoded entity to
//! a `WalletModel`, which enforces its own invariants. Methods returning
//! `bool` may refuse an entity; a refusal is treated like a decode failure
//! of that record.

use crate::codec::{
    HdChain, Hash256, KeyMetadata, KeyPool, MasterKey, PrivKey, PubKey, Script, WalletFlags,
    WalletTx,
};

/// Why a reorder pass could not complete.
pub type ReorderError = String;

pub trait WalletModel {
    fn load_min_version(&mut self, version: i32);

    fn load_name(&mut self, address: &str, name: String);
    fn load_purpose(&mut self, address: &str, purpose: String);
    fn load_dest_data(&mut self, address: &str, key: String, value: String);

    fn load_tx(&mut self, hash: Hash256, wtx: WalletTx);

    fn load_key(&mut self, pubkey: PubKey, privkey: PrivKey) -> bool;
    fn load_crypted_key(&mut self, pubkey: PubKey, crypted: Vec<u8>) -> bool;
    fn has_master_key(&self, id: u32) -> bool;
    fn load_master_key(&mut self, id: u32, master_key: MasterKey);
    fn load_cscript(&mut self, script: Script) -> bool;
    fn load_watch_only(&mut self, script: Script);
    fn load_key_metadata(&mut self, pubkey: &PubKey, meta: KeyMetadata);
    fn load_script_metadata(&mut self, script: &Script, meta: KeyMetadata);
    fn load_key_pool(&mut self, index: i64, entry: KeyPool);
    fn load_order_pos_next(&mut self, next: i64);
    fn set_hd_chain(&mut self, chain: HdChain);
    fn set_wallet_flags(&mut self, flags: WalletFlags) -> bool;

    /// Stored schema version seen by the last load.
    fn set_wallet_version(&mut self, version: i32);
    /// Raises the master key id high-water mark.
    fn set_master_key_max_id(&mut self, id: u32);

    /// Lowers the earliest key time estimate to `time` if it is earlier.
    fn update_time_first_key(&mut self, time: i64);
    /// Ask for a full chain rescan on next startup.
    fn request_rescan(&mut self);
    /// Assigns order positions to every transaction.
    ///
    /// Returns the hashes whose position changed so they can be persisted.
    fn reorder_transactions(&mut self) -> Result<Vec<Hash256>, ReorderError>;

    fn wallet_tx(&self, hash: &Hash256) -> Option<&WalletTx>;

    // Queries used by live backups
    fn is_locked(&self) -> bool;
    fn key_pool_size(&self) -> usize;
    fn set_keys_left_since_backup(&mut self, keys: usize);
}
