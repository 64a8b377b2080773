//! Watermark notifier: edge-triggered hi/lo hysteresis over an
//! abstract, coalesceable notification channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};

/// Outcome of a consumer's wait on a [`Notify`] channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A signal was observed (possibly coalescing several rising edges).
    Signaled,
    /// The channel was closed; the consumer's wait must not block again.
    Closed,
}

/// A notification primitive that can "signal one waiter, coalesceable".
/// Any implementation satisfying that contract may be bound via
/// `BindNotifier` — an event count, a semaphore, a pipe with byte writes.
pub trait Notify: Send + Sync {
    /// Arms a pending wake. Multiple signals before the next `wait()`
    /// collapse into one.
    fn signal(&self);
    /// Blocks until a signal arrives or the channel is closed.
    fn wait(&self) -> WaitOutcome;
    /// Cancels any in-progress and future waits. Pending signals are
    /// dropped, not delivered.
    fn close(&self);
}

#[derive(Default)]
struct EventState {
    pending: bool,
    closed: bool,
}

/// The default [`Notify`] implementation: a `Mutex`+`Condvar` event count.
/// Concurrent `signal()` calls coalesce into a single pending wake;
/// `close()` drops any pending wake and unblocks every waiter.
pub struct EventChannel {
    state: Mutex<EventState>,
    cv: Condvar,
}

impl EventChannel {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(EventState::default()),
            cv: Condvar::new(),
        })
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self {
            state: Mutex::new(EventState::default()),
            cv: Condvar::new(),
        }
    }
}

impl Notify for EventChannel {
    fn signal(&self) {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return;
        }
        state.pending = true;
        self.cv.notify_one();
    }

    fn wait(&self) -> WaitOutcome {
        let mut state = self.state.lock().unwrap();
        while !state.pending && !state.closed {
            state = self.cv.wait(state).unwrap();
        }
        if state.closed {
            return WaitOutcome::Closed;
        }
        state.pending = false;
        WaitOutcome::Signaled
    }

    fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        state.pending = false;
        self.cv.notify_all();
    }
}

/// Edge-triggered hi/lo watermark state machine.
///
/// Holds one bit of state (`above_hi`) shared between the producer thread
/// (which calls [`on_head_release`](Self::on_head_release)) and the
/// consumer thread (which calls
/// [`on_tail_release`](Self::on_tail_release)); the rising-edge check is a
/// compare-exchange so a concurrent falling-edge clear can never cause a
/// missed or duplicated wake.
pub struct WatermarkNotifier {
    above_hi: AtomicBool,
    bound: Mutex<Option<Arc<dyn Notify>>>,
}

impl WatermarkNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            above_hi: AtomicBool::new(false),
            bound: Mutex::new(None),
        }
    }

    /// `BindNotifier`: replaces any prior notifier; `None` unbinds.
    pub fn bind(&self, notifier: Option<Arc<dyn Notify>>) {
        *self.bound.lock().unwrap() = notifier;
    }

    pub fn is_bound(&self) -> bool {
        self.bound.lock().unwrap().is_some()
    }

    fn pct(used: u64, size: u64) -> u32 {
        ((100 * used) / size) as u32
    }

    /// Called after every `head` release. Signals once per rising edge.
    pub fn on_head_release(&self, used: u64, size: u64, hi_pct: u32) {
        if Self::pct(used, size) < hi_pct {
            return;
        }
        if self
            .above_hi
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            if let Some(notifier) = self.bound.lock().unwrap().as_ref() {
                notifier.signal();
            }
        }
    }

    /// Called after every `tail` release. Clears `above_hi` on the falling
    /// edge; never signals.
    pub fn on_tail_release(&self, used: u64, size: u64, lo_pct: u32) {
        if Self::pct(used, size) > lo_pct {
            return;
        }
        let _ = self
            .above_hi
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Level-triggered poll: readable iff currently at/above `hi_pct`,
    /// independent of edge state.
    pub fn poll_readable(used: u64, size: u64, hi_pct: u32) -> bool {
        Self::pct(used, size) >= hi_pct
    }

    /// Diagnostic-only: current edge state. Not used for correctness.
    pub(crate) fn is_above_hi(&self) -> bool {
        self.above_hi.load(Ordering::Acquire)
    }

    pub(crate) fn reset(&self) {
        self.above_hi.store(false, Ordering::Release);
    }

    /// Blocks the calling (consumer) thread on whatever is currently bound,
    /// cloning the `Arc` out from under the lock first so a concurrent
    /// `BindNotifier`/`Reset` call is never blocked behind an in-progress
    /// wait. Returns `Closed` immediately if nothing is bound.
    pub(crate) fn wait_for_signal(&self) -> WaitOutcome {
        let notifier = self.bound.lock().unwrap().clone();
        match notifier {
            Some(n) => n.wait(),
            None => WaitOutcome::Closed,
        }
    }
}

impl Default for WatermarkNotifier {
    fn default() -> Self {
        Self::new()
    }
}
