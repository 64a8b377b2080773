//! Debug-only invariant checks, compiled out of release builds.
//!
//! Expresses the ring's core correctness obligations as cheap
//! `debug_assert!` macros rather than a runtime logger — the producer fast
//! path must stay allocation- and syscall-free.

/// `tail <= head <= tail + S`.
macro_rules! debug_assert_cursors_bounded {
    ($head:expr, $tail:expr, $size:expr) => {
        debug_assert!(
            $head >= $tail && $head - $tail <= $size,
            "cursor bound violated: head {} tail {} size {}",
            $head,
            $tail,
            $size
        )
    };
}

/// A cursor only ever increases.
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "{} went backwards: {} -> {}",
            $name,
            $old,
            $new
        )
    };
}

/// A just-decoded record's header.len does not run past the producer's
/// committed data, i.e. it does not claim more bytes than `head - tail`
/// (at the moment of decode) actually holds.
macro_rules! debug_assert_record_contained {
    ($total_len:expr, $available:expr) => {
        debug_assert!(
            $total_len <= $available,
            "record of {} bytes does not fit in {} available bytes",
            $total_len,
            $available
        )
    };
}

pub(crate) use debug_assert_cursors_bounded;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_record_contained;
