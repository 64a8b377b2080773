//! Ownership of the shared byte region: the control page plus the data
//! region. The crate does not perform the `mmap` itself — the
//! memory-mapping primitive is an external collaborator — it either
//! attaches to a caller-provided pointer or, for tests and single-process
//! use, owns a boxed allocation laid out the same way a real mapping would
//! be.

use crate::layout::ControlBlock;

/// Heap storage for a single-process / test ring. Kept alive by
/// [`SharedRegion`] for as long as any handle references it.
struct OwnedStorage {
    ctrl: Box<ControlBlock>,
    data: Box<[u8]>,
}

/// A shared control block plus data region, addressed by raw pointers so
/// the producer and consumer sides (which alias the same memory by design)
/// can each hold a handle without fighting Rust's aliasing rules. All
/// synchronization is via the atomics inside [`ControlBlock`] and the
/// acquire/release cursor protocol (`cursor.rs`) — this type just owns (or
/// borrows) the bytes.
pub struct SharedRegion {
    ctrl: *mut ControlBlock,
    data: *mut u8,
    data_len: u64,
    _owned: Option<OwnedStorage>,
}

// SAFETY: all mutable access through `ctrl`/`data` goes through atomics or
// the single-producer/single-consumer discipline enforced by the types in
// `ring.rs`; the region itself carries no thread-confined state.
unsafe impl Send for SharedRegion {}
unsafe impl Sync for SharedRegion {}

impl SharedRegion {
    /// Allocates and zero-initializes a fresh region on the heap, sized for
    /// `config`. For tests and single-process demos.
    #[must_use]
    pub fn new_boxed(config: &crate::config::RingConfig) -> Self {
        let size = config.size();
        let ctrl = ControlBlock::new_boxed(size, config.hi_pct, config.lo_pct);
        let data = vec![0u8; size as usize].into_boxed_slice();

        let ctrl_ptr = Box::into_raw(ctrl);
        let data_ptr = Box::into_raw(data);

        Self {
            ctrl: ctrl_ptr,
            data: data_ptr.cast::<u8>(),
            data_len: size,
            _owned: Some(OwnedStorage {
                // SAFETY: pointers were just obtained from `Box::into_raw`
                // above and are reconstituted into the same box types so
                // `OwnedStorage`'s `Drop` frees them correctly.
                ctrl: unsafe { Box::from_raw(ctrl_ptr) },
                data: unsafe { Box::from_raw(data_ptr) },
            }),
        }
    }

    /// Attaches to an existing, externally-owned mapping (e.g. the result
    /// of `mmap`-ing a device node). The control block is assumed to already
    /// be initialized (or about to be, by the producer, via
    /// [`ControlBlock::init_in_place`](crate::layout::ControlBlock::init_in_place)).
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for `len` bytes for as long as any handle built
    /// on this region is alive, `len` must equal `PAGE_SIZE + S` for the `S`
    /// the control block declares (or will declare, for the initializing
    /// producer), and `ptr` must be at least 8-byte aligned.
    pub unsafe fn attach(ptr: *mut u8, len: usize) -> Self {
        let page = crate::layout::PAGE_SIZE as usize;
        assert!(len > page, "region too small for a control page");
        let data_len = (len - page) as u64;
        assert!(data_len.is_power_of_two(), "data region must be a power of two");

        Self {
            ctrl: ptr.cast::<ControlBlock>(),
            data: unsafe { ptr.add(page) },
            data_len,
            _owned: None,
        }
    }

    #[inline]
    pub fn ctrl(&self) -> &ControlBlock {
        // SAFETY: `ctrl` is valid for the region's lifetime by construction.
        unsafe { &*self.ctrl }
    }

    #[inline]
    pub fn data_ptr(&self) -> *mut u8 {
        self.data
    }

    #[inline]
    pub fn data_len(&self) -> u64 {
        self.data_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RingConfig;

    #[test]
    fn boxed_region_has_requested_size() {
        let cfg = RingConfig::new(16, 50, 30);
        let region = SharedRegion::new_boxed(&cfg);
        assert_eq!(region.data_len(), cfg.size());
        assert_eq!(region.ctrl().size, cfg.size());
    }

    #[test]
    fn attach_rejects_non_power_of_two_data_region() {
        let mut buf = vec![0u8; crate::layout::PAGE_SIZE as usize + 100];
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| unsafe {
            SharedRegion::attach(buf.as_mut_ptr(), buf.len())
        }));
        assert!(result.is_err());
    }
}
