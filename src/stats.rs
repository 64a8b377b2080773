//! `GetStats`/`GetConfig` snapshot types and the atomic counters
//! backing them.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained on the producer side as records are committed.
///
/// `records` and `bytes` count `PKT` records only; `drops` is the running
/// total of packets reported lost across all `DROP` records emitted so far
/// (not the count of `DROP` records themselves — a single `DROP` record can
/// report an arbitrarily large burst).
#[derive(Debug, Default)]
pub struct Counters {
    records: AtomicU64,
    bytes: AtomicU64,
    drops: AtomicU64,
}

impl Counters {
    pub(crate) fn record_packet(&self, payload_len: u64) {
        self.records.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(payload_len, Ordering::Relaxed);
    }

    pub(crate) fn record_drop(&self, lost: u64) {
        self.drops.fetch_add(lost, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.records.store(0, Ordering::Relaxed);
        self.bytes.store(0, Ordering::Relaxed);
        self.drops.store(0, Ordering::Relaxed);
    }
}

/// Snapshot returned by the control surface's `GetStats` operation.
///
/// Fields are each read with a single atomic load and are individually
/// consistent, but the snapshot as a whole is not atomic: `head` may be
/// observed slightly ahead of `records`/`bytes` if the producer commits
/// between loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingStats {
    pub head: u64,
    pub tail: u64,
    pub records: u64,
    pub bytes: u64,
    pub drops: u64,
}

impl RingStats {
    pub(crate) fn snapshot(ctrl: &crate::layout::ControlBlock, counters: &Counters) -> Self {
        Self {
            head: ctrl.load_head_relaxed(),
            tail: ctrl.load_tail_relaxed(),
            records: counters.records.load(Ordering::Relaxed),
            bytes: counters.bytes.load(Ordering::Relaxed),
            drops: counters.drops.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot returned by the control surface's `GetConfig` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingInfo {
    pub size: u64,
    pub hi_pct: u32,
    pub lo_pct: u32,
}
