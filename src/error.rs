use thiserror::Error;

/// Errors surfaced by the control surface.
#[derive(Debug, Clone, Error)]
pub enum ControlError {
    /// Bad watermarks, or an `AdvanceTail` target out of range.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The operation requires a notifier but none is bound.
    #[error("no notifier is bound")]
    NotBound,

    /// Notifier channel creation or binding failed.
    #[error("notifier unavailable: {reason}")]
    ResourceUnavailable { reason: String },
}

/// Errors from claiming a role handle on a [`crate::Ring`](crate::ring::Ring).
#[derive(Debug, Clone, Copy, Error)]
pub enum AttachError {
    #[error("a producer handle is already attached")]
    ProducerAlreadyClaimed,
    #[error("a consumer handle is already attached")]
    ConsumerAlreadyClaimed,
}

/// Errors surfaced by the consumer loop.
///
/// The data path otherwise has no user-visible errors: a failed
/// reservation is a normal condition handled by the drop coalescer and
/// never reported up.
#[derive(Debug, Clone, Error)]
pub enum ConsumerError {
    /// A decoded record header claims more bytes than the ring could ever
    /// hold between `tail` and `head`. This indicates ring corruption, and
    /// must be surfaced rather than guessed past.
    #[error("corrupt frame at tail={tail}: header.len={len} exceeds available {available} bytes")]
    Corrupt {
        tail: u64,
        len: u32,
        available: u64,
    },
}
