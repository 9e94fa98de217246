//! Record filters applied during salvage

use crate::codec::{DecodeContext, RecordKind};
use crate::observability::{log_event_with_fields, Event};
use crate::wallet::{read_key_value, InMemoryWallet, ScanState};

/// Decides which salvaged pairs make it into the rebuilt store.
pub trait RecordFilter {
    fn keep(&mut self, key: &[u8], value: &[u8]) -> bool;
}

/// Keeps every pair: a plain structural repair.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl RecordFilter for AcceptAll {
    fn keep(&mut self, _key: &[u8], _value: &[u8]) -> bool {
        true
    }
}

/// Keeps only key material and the HD chain, and only when it decodes.
///
/// Every pair runs through the same decoder as a normal load, against a
/// throwaway wallet that lives as long as the filter. A duplicate master
/// key id is therefore rejected here too.
pub struct KeysOnlyFilter<'a> {
    wallet: InMemoryWallet,
    ctx: DecodeContext<'a>,
}

impl KeysOnlyFilter<'static> {
    pub fn new() -> Self {
        Self::with_context(DecodeContext::default())
    }
}

impl Default for KeysOnlyFilter<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> KeysOnlyFilter<'a> {
    pub fn with_context(ctx: DecodeContext<'a>) -> Self {
        Self {
            wallet: InMemoryWallet::new(),
            ctx,
        }
    }
}

impl RecordFilter for KeysOnlyFilter<'_> {
    fn keep(&mut self, key: &[u8], value: &[u8]) -> bool {
        let mut scan = ScanState::new();
        match read_key_value(&mut self.wallet, key, value, &mut scan, &self.ctx) {
            Ok(tag) => RecordKind::from_tag(&tag)
                .map_or(false, |kind| kind.is_key_type() || kind == RecordKind::HdChain),
            Err(err) => {
                log_event_with_fields(
                    Event::RecoveryRecordSkipped,
                    &[("tag", &err.tag), ("error", &err.error.to_string())],
                );
                false
            }
        }
    }
}
