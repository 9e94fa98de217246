//! Periodic flush of idle wallets
//!
//! The sweep compacts every wallet whose update counter has been stable for
//! a while. Only one sweep runs at a time: a trigger that finds one in
//! progress returns immediately instead of queueing.
//!
//! The guard belongs to a [`MaintenanceSweep`] value, not to the process:
//! share one sweep (e.g. behind an `Arc`) across all triggers, since two
//! separate sweeps can run at the same time.
//!
//! Update counters live in memory only and restart at zero when a store is
//! reopened. The sweep tracks each wallet per open handle, so a reopened
//! store starts from a clean baseline instead of looking changed.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use uuid::Uuid;

use crate::observability::{log_event_with_fields, Event};
use crate::storage::{KvStore, WalletStore};

/// Default time a wallet must go without updates before it is flushed.
pub const DEFAULT_STABLE_AFTER: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy)]
struct FlushState {
    handle: Uuid,
    last_seen: u64,
    last_update: Instant,
    last_flushed: u64,
}

/// What one trigger did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// False when disabled or another sweep held the guard
    pub ran: bool,
    pub flushed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Held while a sweep runs; releases the guard on drop.
pub struct SweepGuard<'a> {
    running: &'a AtomicBool,
}

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Flushes wallets that have been idle for `stable_after`.
///
/// Only one `run` per value executes at a time; see the module docs for
/// what is and is not shared.
pub struct MaintenanceSweep {
    enabled: bool,
    stable_after: Duration,
    running: AtomicBool,
    state: Mutex<HashMap<PathBuf, FlushState>>,
}

impl MaintenanceSweep {
    pub fn new(enabled: bool, stable_after: Duration) -> Self {
        Self {
            enabled,
            stable_after,
            running: AtomicBool::new(false),
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Tries to take the guard without blocking.
    pub fn try_begin(&self) -> Option<SweepGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| SweepGuard {
                running: &self.running,
            })
    }

    /// Idle time required before a wallet is flushed.
    pub fn stable_after(&self) -> Duration {
        self.stable_after
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn run(&self, wallets: &mut [&mut WalletStore]) -> SweepReport {
        self.run_at(wallets, Instant::now())
    }

    /// One sweep over `wallets` as of `now`.
    pub fn run_at(&self, wallets: &mut [&mut WalletStore], now: Instant) -> SweepReport {
        let mut report = SweepReport::default();
        if !self.enabled {
            return report;
        }
        let Some(_guard) = self.try_begin() else {
            return report;
        };
        report.ran = true;

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for store in wallets.iter_mut() {
            let counter = store.update_counter();
            let handle = store.handle_id();
            let fresh = FlushState {
                handle,
                last_seen: 0,
                last_update: now,
                last_flushed: 0,
            };
            let entry = state.entry(store.path().to_path_buf()).or_insert(fresh);
            if entry.handle != handle {
                *entry = fresh;
            }

            if entry.last_seen != counter {
                entry.last_seen = counter;
                entry.last_update = now;
            }

            let stable = now.saturating_duration_since(entry.last_update) >= self.stable_after;
            if entry.last_flushed == counter || !stable {
                continue;
            }

            let path = store.path().to_path_buf();
            match store.compact() {
                Ok(()) => {
                    entry.last_flushed = counter;
                    log_event_with_fields(
                        Event::FlushComplete,
                        &[
                            ("path", &path.display().to_string()),
                            ("updates", &counter.to_string()),
                        ],
                    );
                    report.flushed.push(path);
                }
                Err(e) => report.failed.push((path, e.to_string())),
            }
        }

        report
    }
}

impl Default for MaintenanceSweep {
    fn default() -> Self {
        Self::new(true, DEFAULT_STABLE_AFTER)
    }
}
