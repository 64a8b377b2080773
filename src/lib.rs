//! A single-producer/single-consumer ring transport over shared memory,
//! crossing a privilege boundary: one side maps the region read-write and
//! produces, the other maps it (often read-only, often unprivileged) and
//! consumes. The wire format and control-block layout are the contract —
//! there is no shared Rust type between the two sides, only byte offsets.
//!
//! # Example
//!
//! ```
//! use ringspsc_shm::{Ring, RingConfig};
//!
//! let ring = Ring::create_boxed(RingConfig::new(16, 50, 30));
//! let producer = ring.producer().unwrap();
//! let mut consumer = ring.consumer().unwrap();
//!
//! producer.push(b"hello", 1_000);
//!
//! consumer
//!     .drain_available(
//!         |ts_ns, payload| println!("packet at {ts_ns}: {} bytes", payload.len()),
//!         |drop| println!("lost {} packets", drop.lost),
//!     )
//!     .unwrap();
//! ```

mod coalescer;
mod codec;
mod config;
mod consumer;
mod control;
mod cursor;
mod error;
mod invariants;
mod layout;
mod notifier;
mod region;
mod reservation;
mod ring;
mod stats;

pub use config::RingConfig;
pub use consumer::{Consumer, DropSummary};
pub use control::Control;
pub use error::{AttachError, ConsumerError, ControlError};
pub use layout::{record_type, DropPayload, RecordHeader, DROP_PAYLOAD_LEN, HEADER_LEN, PAGE_SIZE};
pub use notifier::{EventChannel, Notify, WaitOutcome};
pub use ring::{Producer, Ring};
pub use stats::{RingInfo, RingStats};
