//! The ring façade: owns the shared region and the producer-exclusive
//! mutex, and hands out the role-scoped handles (`Producer`, `Consumer`,
//! `Control`) that the rest of the crate's modules operate on.
//!
//! `RingShared` is an `Arc`-wrapped inner struct cloned into each role
//! handle; exactly one producer and one consumer role may be claimed at a
//! time, each independently attachable and detachable.

use crate::coalescer;
use crate::config::RingConfig;
use crate::error::AttachError;
use crate::notifier::WatermarkNotifier;
use crate::region::SharedRegion;
use crate::stats::Counters;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) struct RingShared {
    pub(crate) region: SharedRegion,
    pub(crate) counters: Counters,
    pub(crate) notifier: WatermarkNotifier,
    pub(crate) control_lock: Mutex<()>,
    producer_claimed: AtomicBool,
    consumer_claimed: AtomicBool,
}

impl RingShared {
    pub(crate) fn consumer_claimed(&self) -> &AtomicBool {
        &self.consumer_claimed
    }
}

/// A shared-memory SPSC ring: the ring's control block plus data region,
/// with role handles to hand out.
///
/// `Ring` itself is cheap to clone (it's one `Arc`) and holds no role —
/// obtaining a [`Producer`], [`Consumer`], or [`Control`] handle is how a
/// caller claims a role. Exactly one `Producer` and one `Consumer` may be
/// outstanding at a time; dropping a handle releases its role, so a
/// consumer (say) may attach and detach at any time.
#[derive(Clone)]
pub struct Ring {
    pub(crate) shared: Arc<RingShared>,
}

impl Ring {
    /// Allocates and zero-initializes a fresh ring on the heap, sized for
    /// `config`. For tests and single-process use; the production path is
    /// [`Ring::attach`].
    #[must_use]
    pub fn create_boxed(config: RingConfig) -> Self {
        Self {
            shared: Arc::new(RingShared {
                region: SharedRegion::new_boxed(&config),
                counters: Counters::default(),
                notifier: WatermarkNotifier::new(),
                control_lock: Mutex::new(()),
                producer_claimed: AtomicBool::new(false),
                consumer_claimed: AtomicBool::new(false),
            }),
        }
    }

    /// Attaches to an existing mapping previously initialized by
    /// [`ControlBlock::init_in_place`](crate::layout::ControlBlock::init_in_place)
    /// (the producer's init step; *how* the mapping reached this process —
    /// the mmap/device-node step — is the caller's concern, not this
    /// crate's).
    ///
    /// # Safety
    ///
    /// See [`SharedRegion::attach`].
    pub unsafe fn attach(ptr: *mut u8, len: usize) -> Self {
        Self {
            shared: Arc::new(RingShared {
                region: unsafe { SharedRegion::attach(ptr, len) },
                counters: Counters::default(),
                notifier: WatermarkNotifier::new(),
                control_lock: Mutex::new(()),
                producer_claimed: AtomicBool::new(false),
                consumer_claimed: AtomicBool::new(false),
            }),
        }
    }

    /// Claims the producer role. Fails if a `Producer` handle is already
    /// outstanding.
    pub fn producer(&self) -> Result<Producer, AttachError> {
        if self
            .shared
            .producer_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AttachError::ProducerAlreadyClaimed);
        }
        Ok(Producer {
            shared: Arc::clone(&self.shared),
        })
    }

    /// Claims the consumer role. Fails if a `Consumer` handle is already
    /// outstanding.
    pub fn consumer(&self) -> Result<Consumer, AttachError> {
        if self
            .shared
            .consumer_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AttachError::ConsumerAlreadyClaimed);
        }
        Ok(Consumer::new(Arc::clone(&self.shared)))
    }

    /// Returns a control-surface handle. Any number of these may exist;
    /// the six operations serialize on an internal mutex.
    #[must_use]
    pub fn control(&self) -> Control {
        Control {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Producer handle: the sole writer of `head` and the coalescer state.
pub struct Producer {
    shared: Arc<RingShared>,
}

impl Producer {
    /// Pushes one `PKT` record of `payload`: the data-path entry point.
    /// `now_ns` becomes the record's timestamp and, if this push
    /// opens or extends an overflow burst, the coalescer's bookkeeping
    /// timestamp.
    ///
    /// Never fails from the caller's perspective: on overflow the packet is
    /// silently folded into the drop coalescer and this returns normally.
    ///
    /// # Panics (debug only)
    ///
    /// Debug builds assert that `16 + payload.len() + 36 <= S` — the ring
    /// must always have room left over for a future drop record.
    pub fn push(&self, payload: &[u8], now_ns: u64) {
        coalescer::push_packet(
            self.shared.region.ctrl(),
            self.shared.region.data_ptr(),
            &self.shared.counters,
            &self.shared.notifier,
            payload,
            now_ns,
        );
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        self.shared.producer_claimed.store(false, Ordering::Release);
    }
}

// Consumer and Control live in their own modules but are re-exported here
// for a single `use ringspsc_shm::{Ring, Producer, Consumer, Control};`.
pub use crate::consumer::Consumer;
pub use crate::control::Control;
