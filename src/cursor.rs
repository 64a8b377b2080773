//! Acquire/release cursor protocol.
//!
//! Producer: load `tail` acquire, write the data region, store `head`
//! release. Consumer: load `head` acquire, read the data region, store
//! `tail` release. No other synchronization protects the data region —
//! correctness depends entirely on this pairing.

use crate::layout::ControlBlock;
use std::sync::atomic::Ordering;

impl ControlBlock {
    /// Producer-local, relaxed load of `head`. Only the producer writes
    /// `head`, so this never races with another writer.
    #[inline]
    pub fn load_head_relaxed(&self) -> u64 {
        self.head.load(Ordering::Relaxed)
    }

    /// Producer's view of `tail`, with acquire ordering: pairs with the
    /// consumer's release store, so everything the consumer did up to that
    /// store (freeing the space below it) happens-before this load.
    #[inline]
    pub fn load_tail_acquire(&self) -> u64 {
        self.tail.load(Ordering::Acquire)
    }

    /// Publishes a new `head` with release ordering: every byte the
    /// producer wrote at a cursor below `new_head` becomes visible to a
    /// consumer that observes this value.
    #[inline]
    pub fn release_head(&self, new_head: u64) {
        self.head.store(new_head, Ordering::Release);
    }

    /// Consumer-local, relaxed load of `tail`. Only the consumer writes
    /// `tail`, so this never races with another writer.
    #[inline]
    pub fn load_tail_relaxed(&self) -> u64 {
        self.tail.load(Ordering::Relaxed)
    }

    /// Consumer's view of `head`, with acquire ordering: pairs with the
    /// producer's release store, so every byte behind it is visible.
    #[inline]
    pub fn load_head_acquire(&self) -> u64 {
        self.head.load(Ordering::Acquire)
    }

    /// Publishes a new `tail` with release ordering: the space below
    /// `new_tail` is free for the producer to overwrite.
    #[inline]
    pub fn release_tail(&self, new_tail: u64) {
        self.tail.store(new_tail, Ordering::Release);
    }

    /// `S - (head - tail)`: bytes free for the producer to reserve.
    #[inline]
    pub fn free_bytes(&self, head: u64, tail: u64) -> u64 {
        self.size - (head - tail)
    }

    /// `head - tail`: bytes the consumer has not yet drained.
    #[inline]
    pub fn used_bytes(&self, head: u64, tail: u64) -> u64 {
        head - tail
    }

    /// Ring index for an unbounded cursor: `cursor & (S - 1)`.
    #[inline]
    pub fn index_of(&self, cursor: u64) -> u64 {
        cursor & (self.size - 1)
    }
}
