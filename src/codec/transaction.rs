//! Transactions and the wallet's per-transaction record
//!
//! Only structure is modelled here. Scripts are opaque and no signature or
//! consensus validation happens during a wallet load.

use std::collections::{BTreeMap, HashSet};

use super::errors::DecodeResult;
use super::primitives::{sha256d, Hash256, Script};
use super::stream::{Decodable, Encodable, StreamReader, StreamWriter};

/// Money supply cap in base units.
pub const MAX_MONEY: i64 = 21_000_000 * 100_000_000;

/// Largest serialized transaction accepted by the structural check.
pub const MAX_TX_SIZE: usize = 1_000_000;

/// Value-map key holding the order position.
const ORDER_POS_KEY: &str = "n";
const TIME_SMART_KEY: &str = "timesmart";

pub fn money_range(value: i64) -> bool {
    (0..=MAX_MONEY).contains(&value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OutPoint {
    pub hash: Hash256,
    pub n: u32,
}

impl OutPoint {
    pub fn null() -> Self {
        Self {
            hash: Hash256::ZERO,
            n: u32::MAX,
        }
    }

    pub fn is_null(&self) -> bool {
        self.hash.is_null() && self.n == u32::MAX
    }
}

impl Encodable for OutPoint {
    fn encode(&self, w: &mut StreamWriter) {
        w.write(&self.hash);
        w.write_u32(self.n);
    }
}

impl Decodable for OutPoint {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            hash: r.read()?,
            n: r.read_u32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TxIn {
    pub prevout: OutPoint,
    pub script_sig: Script,
    pub sequence: u32,
}

impl Encodable for TxIn {
    fn encode(&self, w: &mut StreamWriter) {
        w.write(&self.prevout);
        w.write(&self.script_sig);
        w.write_u32(self.sequence);
    }
}

impl Decodable for TxIn {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            prevout: r.read()?,
            script_sig: r.read()?,
            sequence: r.read_u32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TxOut {
    pub value: i64,
    pub script_pubkey: Script,
}

impl Encodable for TxOut {
    fn encode(&self, w: &mut StreamWriter) {
        w.write_i64(self.value);
        w.write(&self.script_pubkey);
    }
}

impl Decodable for TxOut {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            value: r.read_i64()?,
            script_pubkey: r.read()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Transaction {
    /// Double SHA-256 of the serialized transaction.
    pub fn hash(&self) -> Hash256 {
        sha256d(&self.to_bytes())
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_null()
    }
}

impl Encodable for Transaction {
    fn encode(&self, w: &mut StreamWriter) {
        w.write_i32(self.version);
        w.write_vec(&self.inputs);
        w.write_vec(&self.outputs);
        w.write_u32(self.lock_time);
    }
}

impl Decodable for Transaction {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            version: r.read_i32()?,
            inputs: r.read_vec()?,
            outputs: r.read_vec()?,
            lock_time: r.read_u32()?,
        })
    }
}

/// Transaction with the block it was mined in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MerkleTx {
    pub tx: Transaction,
    pub hash_block: Hash256,
    /// No longer populated; kept for format compatibility.
    pub merkle_branch: Vec<Hash256>,
    pub index: i32,
}

impl Encodable for MerkleTx {
    fn encode(&self, w: &mut StreamWriter) {
        w.write(&self.tx);
        w.write(&self.hash_block);
        w.write_vec(&self.merkle_branch);
        w.write_i32(self.index);
    }
}

impl Decodable for MerkleTx {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            tx: r.read()?,
            hash_block: r.read()?,
            merkle_branch: r.read_vec()?,
            index: r.read_i32()?,
        })
    }
}

/// A wallet-relevant transaction with its local bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletTx {
    pub merkle: MerkleTx,
    /// Formerly the list of previous transactions.
    pub unused: Vec<MerkleTx>,
    pub map_value: BTreeMap<String, String>,
    pub order_form: Vec<(String, String)>,
    /// Doubles as a format marker in files written by very old versions.
    pub time_received_is_tx_time: u32,
    pub time_received: u32,
    pub from_me: bool,
    pub spent: bool,
    /// Position in the wallet's transaction ordering; -1 when unordered.
    pub order_pos: i64,
    pub time_smart: u32,
}

impl Default for WalletTx {
    fn default() -> Self {
        Self {
            merkle: MerkleTx::default(),
            unused: Vec::new(),
            map_value: BTreeMap::new(),
            order_form: Vec::new(),
            time_received_is_tx_time: 0,
            time_received: 0,
            from_me: false,
            spent: false,
            order_pos: -1,
            time_smart: 0,
        }
    }
}

impl WalletTx {
    pub fn new(tx: Transaction) -> Self {
        Self {
            merkle: MerkleTx {
                tx,
                index: -1,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn tx(&self) -> &Transaction {
        &self.merkle.tx
    }

    pub fn hash(&self) -> Hash256 {
        self.merkle.tx.hash()
    }

    pub fn is_unordered(&self) -> bool {
        self.order_pos == -1
    }
}

fn write_string_pairs<'a, I>(w: &mut StreamWriter, len: usize, pairs: I)
where
    I: Iterator<Item = (&'a String, &'a String)>,
{
    w.write_compact_size(len as u64);
    for (k, v) in pairs {
        w.write_str(k);
        w.write_str(v);
    }
}

fn read_string_pairs(r: &mut StreamReader<'_>) -> DecodeResult<Vec<(String, String)>> {
    let count = r.read_compact_size()? as usize;
    let mut pairs = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        pairs.push((r.read_string()?, r.read_string()?));
    }
    Ok(pairs)
}

impl Encodable for WalletTx {
    fn encode(&self, w: &mut StreamWriter) {
        let mut map_value = self.map_value.clone();
        if self.order_pos != -1 {
            map_value.insert(ORDER_POS_KEY.to_string(), self.order_pos.to_string());
        }
        if self.time_smart != 0 {
            map_value.insert(TIME_SMART_KEY.to_string(), self.time_smart.to_string());
        }

        w.write(&self.merkle);
        w.write_vec(&self.unused);
        write_string_pairs(w, map_value.len(), map_value.iter());
        write_string_pairs(
            w,
            self.order_form.len(),
            self.order_form.iter().map(|(k, v)| (k, v)),
        );
        w.write_u32(self.time_received_is_tx_time);
        w.write_u32(self.time_received);
        w.write_bool(self.from_me);
        w.write_bool(self.spent);
    }
}

impl Decodable for WalletTx {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self> {
        let merkle = r.read()?;
        let unused = r.read_vec()?;
        let mut map_value: BTreeMap<String, String> = read_string_pairs(r)?.into_iter().collect();
        let order_form = read_string_pairs(r)?;
        let time_received_is_tx_time = r.read_u32()?;
        let time_received = r.read_u32()?;
        let from_me = r.read_bool()?;
        let spent = r.read_bool()?;

        // Unparseable bookkeeping values fall back to their defaults.
        let order_pos = map_value
            .remove(ORDER_POS_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or(-1);
        let time_smart = map_value
            .remove(TIME_SMART_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        Ok(Self {
            merkle,
            unused,
            map_value,
            order_form,
            time_received_is_tx_time,
            time_received,
            from_me,
            spent,
            order_pos,
            time_smart,
        })
    }
}

/// Best-effort chain lookups available during a load.
pub trait ChainView {
    /// Height of the block containing `txid`, if known.
    fn tx_height(&self, txid: &Hash256) -> Option<i32>;
}

/// Chain view for offline use: nothing is known.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChain;

impl ChainView for NoChain {
    fn tx_height(&self, _txid: &Hash256) -> Option<i32> {
        None
    }
}

/// Validity check applied to every `tx` record on load.
pub trait TxCheck {
    /// `height` is `i32::MAX` when the chain view has no answer.
    fn check(&self, tx: &Transaction, height: i32) -> Result<(), String>;
}

/// Context-free structural rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralTxCheck;

impl TxCheck for StructuralTxCheck {
    fn check(&self, tx: &Transaction, _height: i32) -> Result<(), String> {
        if tx.inputs.is_empty() {
            return Err("no inputs".to_string());
        }
        if tx.outputs.is_empty() {
            return Err("no outputs".to_string());
        }

        let size = tx.to_bytes().len();
        if size > MAX_TX_SIZE {
            return Err(format!("oversize: {} bytes", size));
        }

        let mut total: i64 = 0;
        for out in &tx.outputs {
            if !money_range(out.value) {
                return Err(format!("output value {} out of range", out.value));
            }
            total = total
                .checked_add(out.value)
                .filter(|t| money_range(*t))
                .ok_or_else(|| "total output value out of range".to_string())?;
        }

        let mut seen = HashSet::with_capacity(tx.inputs.len());
        for input in &tx.inputs {
            if !seen.insert(input.prevout) {
                return Err("duplicate inputs".to_string());
            }
        }

        if tx.is_coinbase() {
            let len = tx.inputs[0].script_sig.len();
            if !(2..=100).contains(&len) {
                return Err(format!("coinbase script length {}", len));
            }
        } else if tx.inputs.iter().any(|i| i.prevout.is_null()) {
            return Err("null previous output".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_txs {
    use super::*;

    /// Spends one synthetic output, paying `value` to a fixed script.
    pub fn simple_tx(seed: u8, value: i64) -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![TxIn {
                prevout: OutPoint {
                    hash: sha256d(&[seed]),
                    n: 0,
                },
                script_sig: Script(vec![0x51]),
                sequence: u32::MAX,
            }],
            outputs: vec![TxOut {
                value,
                script_pubkey: Script(vec![0x76, 0xa9, seed]),
            }],
            lock_time: 0,
        }
    }

    pub fn wallet_tx(seed: u8, order_pos: i64) -> WalletTx {
        let mut wtx = WalletTx::new(simple_tx(seed, 50_000));
        wtx.order_pos = order_pos;
        wtx.time_received = 1_600_000_000;
        wtx
    }
}
