//! Frame codec: wrap-aware writes and reads into the data region.
//!
//! A record may straddle the end of the data region, so every read and
//! write splits into at most two contiguous spans. Neither `write_at` nor
//! `read_at` touches `head`/`tail` — cursor advancement is the caller's
//! job, after the bytes are in place.

use crate::layout::{DropPayload, RecordHeader, DROP_PAYLOAD_LEN, HEADER_LEN};

/// Writes `src` into the data region starting at `cursor`, wrapping at `size`.
///
/// # Safety
///
/// `data` must be valid for `size` bytes, exclusively writable for the
/// duration of the call (no concurrent reader/writer touching the same
/// span), and `src.len() <= size`.
pub unsafe fn write_at(data: *mut u8, size: u64, cursor: u64, src: &[u8]) {
    let mask = size - 1;
    let idx = (cursor & mask) as usize;
    let len = src.len();
    let first = len.min((size as usize) - idx);

    unsafe {
        std::ptr::copy_nonoverlapping(src.as_ptr(), data.add(idx), first);
        if first < len {
            std::ptr::copy_nonoverlapping(src[first..].as_ptr(), data, len - first);
        }
    }
}

/// Reads `dst.len()` bytes from the data region starting at `cursor`,
/// wrapping at `size`.
///
/// # Safety
///
/// `data` must be valid for `size` bytes, readable for the duration of the
/// call, and `dst.len() <= size`.
pub unsafe fn read_at(data: *const u8, size: u64, cursor: u64, dst: &mut [u8]) {
    let mask = size - 1;
    let idx = (cursor & mask) as usize;
    let len = dst.len();
    let first = len.min((size as usize) - idx);

    unsafe {
        std::ptr::copy_nonoverlapping(data.add(idx), dst.as_mut_ptr(), first);
        if first < len {
            std::ptr::copy_nonoverlapping(data, dst[first..].as_mut_ptr(), len - first);
        }
    }
}

/// Writes a record header at `cursor`.
///
/// # Safety
/// Same preconditions as [`write_at`].
pub unsafe fn write_header(data: *mut u8, size: u64, cursor: u64, header: RecordHeader) {
    unsafe { write_at(data, size, cursor, &header.to_bytes()) }
}

/// Reads a record header at `cursor` (itself possibly wrapped).
///
/// # Safety
/// Same preconditions as [`read_at`].
pub unsafe fn read_header(data: *const u8, size: u64, cursor: u64) -> RecordHeader {
    let mut buf = [0u8; HEADER_LEN];
    unsafe { read_at(data, size, cursor, &mut buf) };
    RecordHeader::from_bytes(&buf)
}

/// Writes a `DROP` payload at `cursor`.
///
/// # Safety
/// Same preconditions as [`write_at`].
pub unsafe fn write_drop_payload(data: *mut u8, size: u64, cursor: u64, payload: DropPayload) {
    unsafe { write_at(data, size, cursor, &payload.to_bytes()) }
}

/// Reads a `DROP` payload at `cursor`.
///
/// # Safety
/// Same preconditions as [`read_at`].
pub unsafe fn read_drop_payload(data: *const u8, size: u64, cursor: u64) -> DropPayload {
    let mut buf = [0u8; DROP_PAYLOAD_LEN];
    unsafe { read_at(data, size, cursor, &mut buf) };
    DropPayload::from_bytes(&buf)
}
