//! Control surface: the six out-of-band operations. All of them
//! serialize on one mutex; none of them is ever on the data-path hot loop,
//! and none holds that mutex across a data-region read or write.

use crate::error::ControlError;
use crate::notifier::{Notify, WatermarkNotifier};
use crate::ring::RingShared;
use crate::stats::{RingInfo, RingStats};
use std::sync::atomic::Ordering::{Acquire, Relaxed};
use std::sync::Arc;

/// A control-surface handle. Cheap to clone, any number may coexist.
#[derive(Clone)]
pub struct Control {
    pub(crate) shared: Arc<RingShared>,
}

impl Control {
    /// `SetWatermarks`: validates `lo <= hi <= 100`, then stores both.
    /// Takes effect for subsequent `head`/`tail` releases; does not
    /// retroactively re-evaluate the current edge state.
    pub fn set_watermarks(&self, hi_pct: u32, lo_pct: u32) -> Result<(), ControlError> {
        if hi_pct > 100 || lo_pct > hi_pct {
            return Err(ControlError::InvalidArgument {
                reason: format!("watermarks must satisfy lo_pct <= hi_pct <= 100, got hi={hi_pct} lo={lo_pct}"),
            });
        }
        let _guard = self.shared.control_lock.lock().unwrap();
        let ctrl = self.shared.region.ctrl();
        ctrl.hi_pct.store(hi_pct, Relaxed);
        ctrl.lo_pct.store(lo_pct, Relaxed);
        Ok(())
    }

    /// `BindNotifier`: installs (or, with `None`, removes) the channel the
    /// consumer will be signaled through. Replaces any previously bound
    /// channel outright.
    pub fn bind_notifier(&self, notifier: Option<Arc<dyn Notify>>) -> Result<(), ControlError> {
        let _guard = self.shared.control_lock.lock().unwrap();
        self.shared.notifier.bind(notifier);
        Ok(())
    }

    /// `GetStats`: a point-in-time snapshot of cursors and running counters.
    #[must_use]
    pub fn get_stats(&self) -> RingStats {
        RingStats::snapshot(self.shared.region.ctrl(), &self.shared.counters)
    }

    /// Level-triggered poll for consumers that prefer polling over waiting
    /// on a bound notifier: readable iff occupancy is currently at or above
    /// `hi_pct`, independent of the edge-triggered signal's rising/falling
    /// state.
    #[must_use]
    pub fn is_readable(&self) -> bool {
        let ctrl = self.shared.region.ctrl();
        let head = ctrl.load_head_acquire();
        let tail = ctrl.load_tail_relaxed();
        let hi_pct = ctrl.hi_pct.load(Relaxed);
        WatermarkNotifier::poll_readable(ctrl.used_bytes(head, tail), ctrl.size, hi_pct)
    }

    /// `AdvanceTail`: lets an out-of-band control plane fast-forward the
    /// consumer's cursor (e.g. a supervisor recovering a wedged consumer).
    /// Rejects a target outside `[tail, head]`. Re-evaluates the falling
    /// edge exactly as a normal `tail` release would.
    pub fn advance_tail(&self, new_tail: u64) -> Result<(), ControlError> {
        let _guard = self.shared.control_lock.lock().unwrap();
        let ctrl = self.shared.region.ctrl();
        let head = ctrl.load_head_acquire();
        let tail = ctrl.load_tail_relaxed();
        if new_tail < tail || new_tail > head {
            return Err(ControlError::InvalidArgument {
                reason: format!("advance_tail target {new_tail} outside current range [{tail}, {head}]"),
            });
        }
        ctrl.release_tail(new_tail);
        let lo_pct = ctrl.lo_pct.load(Relaxed);
        self.shared
            .notifier
            .on_tail_release(ctrl.used_bytes(head, new_tail), ctrl.size, lo_pct);
        Ok(())
    }

    /// `Reset`: zeros cursors and coalescer state. Only valid while no
    /// consumer handle is attached — draining and resetting concurrently
    /// would let the consumer observe a `tail` the producer never released.
    pub fn reset(&self) -> Result<(), ControlError> {
        let _guard = self.shared.control_lock.lock().unwrap();
        if self.shared.consumer_claimed().load(Acquire) {
            return Err(ControlError::InvalidArgument {
                reason: "reset requires no consumer handle attached".to_string(),
            });
        }
        self.shared.region.ctrl().reset_cursors_and_coalescer();
        self.shared.counters.reset();
        self.shared.notifier.reset();
        Ok(())
    }

    /// `GetConfig`: the ring's fixed size and current watermarks.
    #[must_use]
    pub fn get_config(&self) -> RingInfo {
        let ctrl = self.shared.region.ctrl();
        RingInfo {
            size: ctrl.size,
            hi_pct: ctrl.hi_pct.load(Relaxed),
            lo_pct: ctrl.lo_pct.load(Relaxed),
        }
    }
}
