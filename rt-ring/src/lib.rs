//! Overwrite-on-full ring buffer shared by one producer and one consumer.
//!
//! ### Structure
//!
//! |  producer task  |                      |  consumer task  |
//!
//! |          DataQueue (RingBuffer<u32, L>, L = spin or blocking)          |
//!
//! |          EventLog  (RingBuffer<LogRecord, BlockingLock>)               |
//!
//! * [`RingBuffer`]
//!   * fixed number of slots, allocated once
//!   * enqueue never fails: when full the oldest unread value is dropped
//!   * dequeue returns [`Empty`] when there is nothing to read
//!   * every mutation runs under one [`RawLock`]
//! * [`RawLock`]
//!   * [`SpinLock`]: weak CAS loop on an ownership token, never suspends
//!   * [`BlockingLock`]: `parking_lot` mutex, waiters park
//!   * both count acquisition attempts that found the lock held, per role
//! * [`EventLog`]
//!   * same ring mechanics with its own blocking lock
//!   * keeps the most recent events, drained after a run
//!   * written after the data queue lock is released, so the two locks are
//!     never nested and the log order is only approximate
//! * [`workload`]
//!   * spawns producer then consumer, both borrow the same queue
//!   * consumer busy-polls until it reads [`SENTINEL`]
//!
//! Exactly one producer and one consumer is a hard precondition. The
//! overwrite path moves the remove cursor from the producer side, which
//! would need rethinking with more writers.
//!
//! ```
//! use rt_ring::{RingBuffer, SpinLock};
//!
//! let rb = RingBuffer::new(4, SpinLock::new());
//! for v in 1..=5u32 {
//!     rb.enqueue(v);
//! }
//! assert_eq!(rb.drain_all(), vec![2, 3, 4, 5]);
//! ```
pub mod config;
pub mod event_log;
pub mod lock;
pub mod queue;
pub mod ring_buffer;
pub mod walkthrough;
pub mod workload;

mod error;

pub use config::Config;
pub use error::{Empty, Error, Result};
pub use event_log::{EventKind, EventLog, LogRecord};
pub use lock::{
    BlockingLock, Contention, Discipline, LockGuard, RawLock, Role, SpinLock, SpinOrdering,
};
pub use queue::DataQueue;
pub use ring_buffer::{RingBuffer, Snapshot};
pub use workload::{run, RunReport, Scenario, SENTINEL};
