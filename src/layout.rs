//! The shared-memory ABI: control-block byte layout, record header, and
//! drop-payload shapes. This module IS the ABI — there is no separate shared
//! header file; a consumer in another process computes field positions from
//! these offsets alone.
//!
//! Per the design note on unaligned packed structs: nothing here is accessed
//! by casting a pointer into the mapped region and dereferencing a Rust
//! struct. Multi-byte fields are read and written through explicit
//! little-endian byte conversions (`to_bytes`/`from_bytes`), copying into an
//! aligned local first.

use std::sync::atomic::{AtomicU32, AtomicU64};

/// Page size assumed for the control block. Fixed, not configurable: the
/// data region always starts at this offset.
pub const PAGE_SIZE: u64 = 4096;

/// Byte length of a record header (`type`, `flags`, `len`, `ts_ns`).
pub const HEADER_LEN: usize = 16;

/// Byte length of a `DROP` record's payload.
pub const DROP_PAYLOAD_LEN: usize = 20;

/// Bytes a combined drop+packet reservation needs before the packet payload:
/// one full `DROP` record (header + payload).
pub const DROP_RECORD_LEN: usize = HEADER_LEN + DROP_PAYLOAD_LEN;

/// Record type tags.
pub mod record_type {
    /// Opaque application payload.
    pub const PKT: u16 = 1;
    /// Coalesced overflow-burst summary.
    pub const DROP: u16 = 0xFFFF;
}

/// Bit 0 of `ControlBlock::flags`: the coalescer is in the in-burst state.
pub const FLAG_DROPPING: u32 = 1 << 0;

/// The shared control page, byte-exact across producer and consumer.
///
/// ```text
/// offset 0x00  u64  head              (producer writes, release)
/// offset 0x08  u64  tail              (consumer writes, release)
/// offset 0x10  u64  size              (S, power of two)
/// offset 0x18  u32  hi_pct
/// offset 0x1C  u32  lo_pct
/// offset 0x20  u32  flags             (bit 0 = DROPPING)
/// offset 0x24  u32  reserved
/// offset 0x28  u64  drop_start_ns
/// offset 0x30  u64  lost_in_drop
/// offset 0x38  ...  unused to end of control page
/// offset P     ...  data region (S bytes, power of two)
/// ```
#[repr(C)]
pub struct ControlBlock {
    /// Producer cursor. Producer-exclusive write, release semantics.
    pub head: AtomicU64,
    /// Consumer cursor. Consumer-exclusive write, release semantics.
    pub tail: AtomicU64,
    /// `S`, the data-region length. Written once at init, read-only after.
    pub size: u64,
    /// Rising-edge watermark, percent of `S`. Mutated only via the control surface.
    pub hi_pct: AtomicU32,
    /// Falling-edge watermark, percent of `S`. Mutated only via the control surface.
    pub lo_pct: AtomicU32,
    /// Bit 0: `DROPPING`. Producer-exclusive write.
    pub flags: AtomicU32,
    _reserved: u32,
    /// Coalescer: timestamp the current burst started.
    pub drop_start_ns: AtomicU64,
    /// Coalescer: packets lost so far in the current burst.
    pub lost_in_drop: AtomicU64,
    _pad: [u8; PAGE_SIZE as usize - ControlBlock::HEADER_BYTES],
}

impl ControlBlock {
    const HEADER_BYTES: usize = 0x38;

    /// Allocates a fresh, zeroed control block on the heap. Used for
    /// single-process/test `Ring`s; the production path attaches to an
    /// externally mapped region instead (see `region.rs`).
    #[must_use]
    pub fn new_boxed(size: u64, hi_pct: u32, lo_pct: u32) -> Box<Self> {
        Box::new(Self {
            head: AtomicU64::new(0),
            tail: AtomicU64::new(0),
            size,
            hi_pct: AtomicU32::new(hi_pct),
            lo_pct: AtomicU32::new(lo_pct),
            flags: AtomicU32::new(0),
            _reserved: 0,
            drop_start_ns: AtomicU64::new(0),
            lost_in_drop: AtomicU64::new(0),
            _pad: [0u8; PAGE_SIZE as usize - Self::HEADER_BYTES],
        })
    }

    /// Initializes a freshly-allocated control block: cursors, flags, and
    /// coalescer accumulators at zero, watermarks and `size` set from
    /// configuration. Only valid before any producer/consumer attaches.
    pub fn init_in_place(&mut self, size: u64, hi_pct: u32, lo_pct: u32) {
        self.head = AtomicU64::new(0);
        self.tail = AtomicU64::new(0);
        self.size = size;
        self.hi_pct = AtomicU32::new(hi_pct);
        self.lo_pct = AtomicU32::new(lo_pct);
        self.flags = AtomicU32::new(0);
        self._reserved = 0;
        self.drop_start_ns = AtomicU64::new(0);
        self.lost_in_drop = AtomicU64::new(0);
    }

    /// `Reset`: zeros `head`, `tail`, `flags`, and the coalescer
    /// accumulators. Leaves `size` and the watermarks untouched.
    pub fn reset_cursors_and_coalescer(&self) {
        use std::sync::atomic::Ordering::Relaxed;
        self.head.store(0, Relaxed);
        self.tail.store(0, Relaxed);
        self.flags.store(0, Relaxed);
        self.drop_start_ns.store(0, Relaxed);
        self.lost_in_drop.store(0, Relaxed);
    }
}

const _: () = assert!(std::mem::size_of::<ControlBlock>() == PAGE_SIZE as usize);
const _: () = assert!(std::mem::align_of::<ControlBlock>() <= 8);

/// A decoded 16-byte record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub record_type: u16,
    pub flags: u16,
    pub len: u32,
    pub ts_ns: u64,
}

impl RecordHeader {
    #[must_use]
    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..2].copy_from_slice(&self.record_type.to_le_bytes());
        buf[2..4].copy_from_slice(&self.flags.to_le_bytes());
        buf[4..8].copy_from_slice(&self.len.to_le_bytes());
        buf[8..16].copy_from_slice(&self.ts_ns.to_le_bytes());
        buf
    }

    #[must_use]
    pub fn from_bytes(buf: &[u8; HEADER_LEN]) -> Self {
        Self {
            record_type: u16::from_le_bytes(buf[0..2].try_into().unwrap()),
            flags: u16::from_le_bytes(buf[2..4].try_into().unwrap()),
            len: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            ts_ns: u64::from_le_bytes(buf[8..16].try_into().unwrap()),
        }
    }
}

/// The `DROP` record's 20-byte payload: `{lost, start_ns, end_ns}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropPayload {
    pub lost: u32,
    pub start_ns: u64,
    pub end_ns: u64,
}

impl DropPayload {
    #[must_use]
    pub fn to_bytes(self) -> [u8; DROP_PAYLOAD_LEN] {
        let mut buf = [0u8; DROP_PAYLOAD_LEN];
        buf[0..4].copy_from_slice(&self.lost.to_le_bytes());
        buf[4..12].copy_from_slice(&self.start_ns.to_le_bytes());
        buf[12..20].copy_from_slice(&self.end_ns.to_le_bytes());
        buf
    }

    #[must_use]
    pub fn from_bytes(buf: &[u8; DROP_PAYLOAD_LEN]) -> Self {
        Self {
            lost: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            start_ns: u64::from_le_bytes(buf[4..12].try_into().unwrap()),
            end_ns: u64::from_le_bytes(buf[12..20].try_into().unwrap()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_block_is_exactly_one_page() {
        assert_eq!(std::mem::size_of::<ControlBlock>(), PAGE_SIZE as usize);
    }

    #[test]
    fn header_round_trips() {
        let h = RecordHeader {
            record_type: record_type::PKT,
            flags: 0,
            len: 42,
            ts_ns: 123_456_789,
        };
        let buf = h.to_bytes();
        assert_eq!(RecordHeader::from_bytes(&buf), h);
    }

    #[test]
    fn drop_payload_round_trips() {
        let p = DropPayload {
            lost: 7,
            start_ns: 1000,
            end_ns: 2000,
        };
        let buf = p.to_bytes();
        assert_eq!(DropPayload::from_bytes(&buf), p);
    }

    #[test]
    fn header_offsets_are_little_endian_and_byte_exact() {
        let h = RecordHeader {
            record_type: 1,
            flags: 0,
            len: 2,
            ts_ns: 1000,
        };
        let buf = h.to_bytes();
        // type=1, flags=0, len=2 (LE u32), ts_ns=1000 (LE u64)
        assert_eq!(&buf[0..2], &1u16.to_le_bytes());
        assert_eq!(&buf[4..8], &2u32.to_le_bytes());
        assert_eq!(&buf[8..16], &1000u64.to_le_bytes());
    }
}
