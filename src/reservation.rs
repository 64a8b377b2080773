//! Reservation engine: the producer's wait-free "reserve N bytes or
//! fail" primitive over the free window between `tail` and `head`.

use crate::layout::ControlBlock;

/// Attempts to reserve `n` contiguous (modulo wrap) bytes starting at the
/// current `head`.
///
/// Returns the cursor to write at, or `None` if there is not enough free
/// space. `n == 0` is a caller bug (unspecified behavior, we return `None`);
/// `n > S` is always rejected.
///
/// Exact fill (`head - tail == S`) is correctly treated as full: the
/// unbounded-counter formulation means `free_bytes` is `0`, not `S`.
pub fn try_reserve(ctrl: &ControlBlock, n: u64) -> Option<u64> {
    if n == 0 || n > ctrl.size {
        return None;
    }

    let head = ctrl.load_head_relaxed();
    let tail = ctrl.load_tail_acquire();

    if ctrl.free_bytes(head, tail) < n {
        return None;
    }

    Some(head)
}
