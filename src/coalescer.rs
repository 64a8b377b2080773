//! Drop coalescer: collapses a contiguous burst of failed
//! reservations into exactly one `DROP` record, emitted immediately before
//! the `PKT` that ends the burst.
//!
//! ```text
//!           reserve succeeds AND !DROPPING
//!   IDLE  ─────────────────────────────────────▶  IDLE      (commit packet)
//!    │                                               ▲
//!    │ reserve fails                                 │ reserve succeeds AND DROPPING
//!    ▼                                               │      (emit drop record, then packet)
//!  IN-BURST ◀───── reserve fails again ────────── IN-BURST
//! ```
//!
//! The burst accumulators (`DROPPING`, `drop_start_ns`, `lost_in_drop`)
//! live in the shared control block so the consumer can observe them
//! opportunistically for diagnostics, but ownership is producer-exclusive —
//! the consumer must never use them for correctness, only the in-band
//! `DROP` records.

use crate::codec;
use crate::invariants::{debug_assert_cursors_bounded, debug_assert_monotonic};
use crate::layout::{
    ControlBlock, DropPayload, RecordHeader, DROP_PAYLOAD_LEN, DROP_RECORD_LEN, FLAG_DROPPING,
    HEADER_LEN, record_type,
};
use crate::notifier::WatermarkNotifier;
use crate::reservation::try_reserve;
use crate::stats::Counters;
use std::sync::atomic::Ordering::Relaxed;

impl ControlBlock {
    pub(crate) fn is_dropping(&self) -> bool {
        self.flags.load(Relaxed) & FLAG_DROPPING != 0
    }

    fn enter_burst(&self, now_ns: u64) {
        self.drop_start_ns.store(now_ns, Relaxed);
        self.lost_in_drop.store(1, Relaxed);
        self.flags.store(FLAG_DROPPING, Relaxed);
    }

    fn bump_burst(&self) {
        self.lost_in_drop.fetch_add(1, Relaxed);
    }

    /// `(lost, start_ns)` for the in-progress burst.
    fn burst_snapshot(&self) -> (u64, u64) {
        (
            self.lost_in_drop.load(Relaxed),
            self.drop_start_ns.load(Relaxed),
        )
    }

    fn clear_burst(&self) {
        self.flags.store(0, Relaxed);
        self.drop_start_ns.store(0, Relaxed);
        self.lost_in_drop.store(0, Relaxed);
    }
}

/// Pushes one `PKT` record of `payload`, running the full coalescer
/// automaton first. Never fails from the caller's point of view: on
/// overflow the packet is silently folded into the current burst and the
/// function returns.
///
/// `now_ns` is supplied by the caller (no clock dependency inside the hot
/// path) and becomes the record's `ts_ns`, and — while a burst is open —
/// the coalescer's `drop_start_ns`/`end_ns` timestamps.
pub(crate) fn push_packet(
    ctrl: &ControlBlock,
    data: *mut u8,
    counters: &Counters,
    notifier: &WatermarkNotifier,
    payload: &[u8],
    now_ns: u64,
) {
    let size = ctrl.size;
    let packet_len = HEADER_LEN as u64 + payload.len() as u64;
    debug_assert!(
        packet_len + DROP_RECORD_LEN as u64 <= size,
        "packet of {} bytes leaves no room for a future drop record in a ring of {} bytes",
        packet_len,
        size
    );

    if !ctrl.is_dropping() {
        match try_reserve(ctrl, packet_len) {
            Some(cursor) => commit_packet(ctrl, data, counters, notifier, cursor, payload, now_ns),
            None => ctrl.enter_burst(now_ns),
        }
        return;
    }

    let combined_len = DROP_RECORD_LEN as u64 + packet_len;
    match try_reserve(ctrl, combined_len) {
        Some(cursor) => {
            let (lost, start_ns) = ctrl.burst_snapshot();
            let drop_header = RecordHeader {
                record_type: record_type::DROP,
                flags: 0,
                len: DROP_PAYLOAD_LEN as u32,
                ts_ns: now_ns,
            };
            let drop_payload = DropPayload {
                lost: lost as u32,
                start_ns,
                end_ns: now_ns,
            };
            let packet_cursor = cursor + DROP_RECORD_LEN as u64;
            let packet_header = RecordHeader {
                record_type: record_type::PKT,
                flags: 0,
                len: payload.len() as u32,
                ts_ns: now_ns,
            };

            // SAFETY: the combined window [cursor, cursor+combined_len) was
            // just reserved exclusively for this producer; nothing else
            // writes the data region.
            unsafe {
                codec::write_header(data, size, cursor, drop_header);
                codec::write_drop_payload(data, size, cursor + HEADER_LEN as u64, drop_payload);
                codec::write_header(data, size, packet_cursor, packet_header);
                codec::write_at(
                    data,
                    size,
                    packet_cursor + HEADER_LEN as u64,
                    payload,
                );
            }

            ctrl.clear_burst();
            let old_head = ctrl.load_head_relaxed();
            let new_head = cursor + combined_len;
            debug_assert_monotonic!("head", old_head, new_head);
            ctrl.release_head(new_head);
            debug_assert_cursors_bounded!(new_head, ctrl.load_tail_relaxed(), size);

            counters.record_drop(lost);
            counters.record_packet(payload.len() as u64);

            let tail = ctrl.load_tail_relaxed();
            let hi_pct = ctrl.hi_pct.load(Relaxed);
            notifier.on_head_release(ctrl.used_bytes(new_head, tail), size, hi_pct);
        }
        None => ctrl.bump_burst(),
    }
}

fn commit_packet(
    ctrl: &ControlBlock,
    data: *mut u8,
    counters: &Counters,
    notifier: &WatermarkNotifier,
    cursor: u64,
    payload: &[u8],
    now_ns: u64,
) {
    let size = ctrl.size;
    let header = RecordHeader {
        record_type: record_type::PKT,
        flags: 0,
        len: payload.len() as u32,
        ts_ns: now_ns,
    };

    // SAFETY: [cursor, cursor + 16 + payload.len()) was just reserved
    // exclusively for this producer.
    unsafe {
        codec::write_header(data, size, cursor, header);
        codec::write_at(data, size, cursor + HEADER_LEN as u64, payload);
    }

    let old_head = ctrl.load_head_relaxed();
    let new_head = cursor + HEADER_LEN as u64 + payload.len() as u64;
    debug_assert_monotonic!("head", old_head, new_head);
    ctrl.release_head(new_head);
    debug_assert_cursors_bounded!(new_head, ctrl.load_tail_relaxed(), size);
    counters.record_packet(payload.len() as u64);

    let tail = ctrl.load_tail_relaxed();
    let hi_pct = ctrl.hi_pct.load(Relaxed);
    notifier.on_head_release(ctrl.used_bytes(new_head, tail), size, hi_pct);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RingConfig;
    use crate::region::SharedRegion;

    fn setup(order: u8) -> (SharedRegion, Counters, WatermarkNotifier) {
        let cfg = RingConfig::new(order, 50, 30);
        (
            SharedRegion::new_boxed(&cfg),
            Counters::default(),
            WatermarkNotifier::new(),
        )
    }

    #[test]
    fn single_packet_commits_without_drop() {
        let (region, counters, notifier) = setup(12);
        let ctrl = region.ctrl();
        push_packet(ctrl, region.data_ptr(), &counters, &notifier, &[0xAA, 0xBB], 1000);

        assert_eq!(ctrl.load_head_relaxed(), HEADER_LEN as u64 + 2);
        assert!(!ctrl.is_dropping());

        let header = unsafe { codec::read_header(region.data_ptr(), region.data_len(), 0) };
        assert_eq!(header.record_type, record_type::PKT);
        assert_eq!(header.len, 2);
        assert_eq!(header.ts_ns, 1000);
    }

    #[test]
    fn burst_of_four_collapses_to_one_drop_record() {
        // S = 4096 (order 12), fill to within 20 bytes of full with one
        // packet, then fail four 20-byte pushes, then drain and succeed.
        let (region, counters, notifier) = setup(12);
        let ctrl = region.ctrl();
        let size = ctrl.size;

        // Fill the ring almost to capacity with one big packet.
        let filler_len = (size - 16) as usize - 1; // leave 1 free byte
        let filler = vec![0u8; filler_len];
        push_packet(ctrl, region.data_ptr(), &counters, &notifier, &filler, 1);
        assert_eq!(ctrl.load_head_relaxed(), size - 1);

        for _ in 0..4 {
            push_packet(ctrl, region.data_ptr(), &counters, &notifier, &[1, 2], 2);
        }
        assert!(ctrl.is_dropping());
        let (lost, _) = ctrl.burst_snapshot();
        assert_eq!(lost, 4);

        // Drain everything so the combined reservation succeeds.
        ctrl.release_tail(ctrl.load_head_relaxed());

        push_packet(ctrl, region.data_ptr(), &counters, &notifier, &[9, 9], 100);
        assert!(!ctrl.is_dropping());

        let tail = size - 1; // where the drained packet's remainder ended
        let drop_header = unsafe { codec::read_header(region.data_ptr(), size, tail) };
        assert_eq!(drop_header.record_type, record_type::DROP);
        let drop_payload = unsafe {
            codec::read_drop_payload(region.data_ptr(), size, tail + HEADER_LEN as u64)
        };
        assert_eq!(drop_payload.lost, 4);

        let pkt_cursor = tail + DROP_RECORD_LEN as u64;
        let pkt_header = unsafe { codec::read_header(region.data_ptr(), size, pkt_cursor) };
        assert_eq!(pkt_header.record_type, record_type::PKT);
        assert_eq!(pkt_header.len, 2);
    }
}
