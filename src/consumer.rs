//! Consumer loop: waits for a signal, drains everything currently
//! available, and goes back to waiting.

use crate::codec;
use crate::error::ConsumerError;
use crate::invariants::{debug_assert_monotonic, debug_assert_record_contained};
use crate::layout::{record_type, HEADER_LEN};
use crate::notifier::WaitOutcome;
use crate::ring::RingShared;
use std::sync::atomic::Ordering::{Relaxed, Release};
use std::sync::Arc;

/// A decoded `DROP` record, handed to the caller's drop callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropSummary {
    pub ts_ns: u64,
    pub lost: u32,
    pub start_ns: u64,
    pub end_ns: u64,
}

/// Consumer handle: the sole writer of `tail`.
pub struct Consumer {
    pub(crate) shared: Arc<RingShared>,
    scratch: Vec<u8>,
}

impl Consumer {
    pub(crate) fn new(shared: Arc<RingShared>) -> Self {
        Self {
            shared,
            scratch: Vec::new(),
        }
    }

    /// Drains every record currently between `tail` and `head`, dispatching
    /// each to `on_packet` (payload borrowed from an internal scratch
    /// buffer, valid only for the duration of that call) or `on_drop`.
    /// Unknown record types are skipped — forward compatible with future
    /// record kinds a newer producer might emit.
    ///
    /// Returns the number of records dispatched. Stops and returns
    /// [`ConsumerError::Corrupt`] the moment a header claims more bytes than
    /// could possibly be available — treated as unrecoverable corruption
    /// rather than something to skip past.
    pub fn drain_available(
        &mut self,
        mut on_packet: impl FnMut(u64, &[u8]),
        mut on_drop: impl FnMut(DropSummary),
    ) -> Result<usize, ConsumerError> {
        let ctrl = self.shared.region.ctrl();
        let data = self.shared.region.data_ptr();
        let size = ctrl.size;
        let mut tail = ctrl.load_tail_relaxed();
        let mut dispatched = 0usize;

        loop {
            let head = ctrl.load_head_acquire();
            if head == tail {
                break;
            }
            let available = head - tail;

            // SAFETY: [tail, head) was published by the producer's release
            // store of `head`, which we just observed with an acquire load.
            let header = unsafe { codec::read_header(data, size, tail) };
            let total_len = HEADER_LEN as u64 + u64::from(header.len);
            if total_len > available {
                return Err(ConsumerError::Corrupt {
                    tail,
                    len: header.len,
                    available,
                });
            }
            debug_assert_record_contained!(total_len, available);

            match header.record_type {
                record_type::PKT => {
                    self.scratch.clear();
                    self.scratch.resize(header.len as usize, 0);
                    unsafe {
                        codec::read_at(data, size, tail + HEADER_LEN as u64, &mut self.scratch);
                    }
                    on_packet(header.ts_ns, &self.scratch);
                }
                record_type::DROP => {
                    let payload =
                        unsafe { codec::read_drop_payload(data, size, tail + HEADER_LEN as u64) };
                    on_drop(DropSummary {
                        ts_ns: header.ts_ns,
                        lost: payload.lost,
                        start_ns: payload.start_ns,
                        end_ns: payload.end_ns,
                    });
                }
                _ => {}
            }

            let old_tail = tail;
            tail += total_len;
            debug_assert_monotonic!("tail", old_tail, tail);
            ctrl.release_tail(tail);
            dispatched += 1;

            let lo_pct = ctrl.lo_pct.load(Relaxed);
            self.shared
                .notifier
                .on_tail_release(ctrl.used_bytes(head, tail), size, lo_pct);
        }

        Ok(dispatched)
    }

    /// Runs the full consumer loop: wait for a signal, drain, repeat. Returns
    /// when the bound notifier is closed (or nothing is bound). Propagates
    /// [`ConsumerError::Corrupt`] without draining further.
    pub fn run(
        &mut self,
        mut on_packet: impl FnMut(u64, &[u8]),
        mut on_drop: impl FnMut(DropSummary),
    ) -> Result<(), ConsumerError> {
        loop {
            match self.shared.notifier.wait_for_signal() {
                WaitOutcome::Closed => return Ok(()),
                WaitOutcome::Signaled => {
                    self.drain_available(&mut on_packet, &mut on_drop)?;
                }
            }
        }
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        self.shared.consumer_claimed().store(false, Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RingConfig;
    use crate::ring::Ring;

    #[test]
    fn single_packet_round_trips() {
        let ring = Ring::create_boxed(RingConfig::new(12, 50, 30));
        let producer = ring.producer().unwrap();
        let mut consumer = ring.consumer().unwrap();

        producer.push(&[1, 2, 3], 42);

        let mut seen = Vec::new();
        let dispatched = consumer
            .drain_available(|ts, payload| seen.push((ts, payload.to_vec())), |_| panic!("no drops expected"))
            .unwrap();

        assert_eq!(dispatched, 1);
        assert_eq!(seen, vec![(42, vec![1, 2, 3])]);
    }

    #[test]
    fn corrupt_header_is_reported_not_skipped() {
        let ring = Ring::create_boxed(RingConfig::new(12, 50, 30));
        let producer = ring.producer().unwrap();
        let mut consumer = ring.consumer().unwrap();

        producer.push(&[1, 2, 3], 1);
        // Corrupt the in-flight record's length field directly.
        let ctrl = ring.shared.region.ctrl();
        unsafe {
            let mut header = codec::read_header(ring.shared.region.data_ptr(), ctrl.size, 0);
            header.len = u32::MAX;
            codec::write_header(ring.shared.region.data_ptr(), ctrl.size, 0, header);
        }

        let result = consumer.drain_available(|_, _| {}, |_| {});
        assert!(matches!(result, Err(ConsumerError::Corrupt { .. })));
    }

    #[test]
    fn drop_record_dispatches_summary() {
        let ring = Ring::create_boxed(RingConfig::new(12, 50, 30));
        let producer = ring.producer().unwrap();
        let mut consumer = ring.consumer().unwrap();
        let ctrl = ring.shared.region.ctrl();
        let size = ctrl.size;

        let filler = vec![0u8; (size - 16) as usize - 1];
        producer.push(&filler, 1);
        producer.push(&[1, 2], 2);
        producer.push(&[3, 4], 3);

        let mut drops = Vec::new();
        let mut packets = Vec::new();
        consumer
            .drain_available(|ts, p| packets.push((ts, p.to_vec())), |d| drops.push(d))
            .unwrap();
        assert_eq!(packets, vec![(1, filler)]);
        assert!(drops.is_empty());

        // Drain the filler so the next burst's combined reservation fits.
        producer.push(&[5, 6], 4);
        producer.push(&[7, 8], 5);

        let mut drops2 = Vec::new();
        consumer
            .drain_available(|_, _| {}, |d| drops2.push(d))
            .unwrap();
        assert_eq!(drops2.len(), 1);
        assert_eq!(drops2[0].lost, 2);
    }
}
