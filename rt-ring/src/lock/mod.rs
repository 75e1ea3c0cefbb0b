//! Mutual exclusion for the ring buffers.
//!
//! Two disciplines satisfy the same [`RawLock`] contract:
//!
//! * [`SpinLock`] busy-waits on an atomic ownership token and never
//!   suspends the caller. Meant for very short critical sections where a
//!   reschedule would cost more than the wait itself.
//! * [`BlockingLock`] parks the waiting thread. It is the baseline the spin
//!   discipline gets compared against.
//!
//! Both count how often an acquisition attempt found the lock already held,
//! attributed to the [`Role`] that was holding it.
use crate::Result;
use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
};

mod blocking;
mod spin;

pub use blocking::BlockingLock;
pub use spin::{SpinLock, SpinOrdering};

/// Which side of the queue is touching a lock.
///
/// The discriminants double as the ownership bits stored in a lock token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Role {
    Producer = 0b01,
    Consumer = 0b10,
}

impl Role {
    #[inline]
    pub(crate) const fn bits(self) -> u32 {
        self as u32
    }

    #[inline]
    pub(crate) fn from_bits(bits: u32) -> Option<Role> {
        match bits {
            0b01 => Some(Role::Producer),
            0b10 => Some(Role::Consumer),
            _ => None,
        }
    }

    /// Return `str` representation of this role.
    pub fn name(self) -> &'static str {
        match self {
            Role::Producer => "producer",
            Role::Consumer => "consumer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Selects the lock discipline for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Discipline {
    #[default]
    Spin,
    Blocking,
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discipline::Spin => f.write_str("spin"),
            Discipline::Blocking => f.write_str("blocking"),
        }
    }
}

impl FromStr for Discipline {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "spin" => Ok(Discipline::Spin),
            "blocking" | "mutex" => Ok(Discipline::Blocking),
            other => Err(format!("unknown lock discipline `{other}`")),
        }
    }
}

/// Snapshot of a lock's contention counters.
///
/// `held_by_producer` counts acquisition attempts that found the producer
/// holding the lock; `held_by_consumer` likewise for the consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contention {
    pub held_by_producer: u64,
    pub held_by_consumer: u64,
}

impl Contention {
    pub fn total(&self) -> u64 {
        self.held_by_producer + self.held_by_consumer
    }
}

impl fmt::Display for Contention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "held_by_producer={} held_by_consumer={}",
            self.held_by_producer, self.held_by_consumer
        )
    }
}

/// The contract both disciplines implement.
///
/// # Safety
///
/// Implementations must provide mutual exclusion: once `acquire` returns for
/// one role, no other call to `acquire` may return until that role releases.
/// [`RingBuffer`](crate::RingBuffer) hands out `&mut` access to its slots on
/// the strength of this guarantee.
pub unsafe trait RawLock: Send + Sync {
    /// Block (spinning or parking) until `role` owns the lock.
    fn acquire(&self, role: Role);

    /// Give up ownership held as `role`.
    ///
    /// Fails with [`Error::LockNotHeld`](crate::Error::LockNotHeld), leaving
    /// the lock untouched, if `role` is not the current owner.
    ///
    /// # Safety
    ///
    /// The caller must be the context that acquired the lock as `role`.
    /// Releasing on behalf of another thread ends its critical section early.
    unsafe fn release(&self, role: Role) -> Result<()>;

    /// Current contention counters. Only meaningful once the contending
    /// threads have been joined.
    fn contention(&self) -> Contention;

    /// Acquire and return a guard that releases on drop.
    #[inline]
    fn lock(&self, role: Role) -> LockGuard<'_, Self>
    where
        Self: Sized,
    {
        self.acquire(role);
        LockGuard { lock: self, role }
    }
}

/// Releases the lock it was created from when dropped.
#[must_use = "if unused the lock will immediately unlock"]
pub struct LockGuard<'a, L: RawLock> {
    lock: &'a L,
    role: Role,
}

impl<L: RawLock> Drop for LockGuard<'_, L> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: the guard is only created by `lock`, which acquired as `role`.
        if let Err(err) = unsafe { self.lock.release(self.role) } {
            panic!("mutual exclusion violated: {} lost the lock: {err}", self.role);
        }
    }
}

/// Per-role counters shared by both disciplines.
#[derive(Debug, Default)]
pub(crate) struct ContentionCounters {
    held_by_producer: AtomicU64,
    held_by_consumer: AtomicU64,
}

impl ContentionCounters {
    pub(crate) const fn new() -> Self {
        Self {
            held_by_producer: AtomicU64::new(0),
            held_by_consumer: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record(&self, holder: Role) {
        let counter = match holder {
            Role::Producer => &self.held_by_producer,
            Role::Consumer => &self.held_by_consumer,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> Contention {
        Contention {
            held_by_producer: self.held_by_producer.load(Ordering::Relaxed),
            held_by_consumer: self.held_by_consumer.load(Ordering::Relaxed),
        }
    }
}
