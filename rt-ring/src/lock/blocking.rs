use super::{Contention, ContentionCounters, RawLock, Role};
use crate::{Error, Result};
use lock_api::RawMutex as _;
use std::sync::atomic::{AtomicU32, Ordering};

const NO_HOLDER: u32 = 0;

/// A parking mutex with the same acquire/release contract as
/// [`SpinLock`](super::SpinLock).
///
/// Waiters are suspended by `parking_lot` instead of spinning.
pub struct BlockingLock {
    raw: parking_lot::RawMutex,
    holder: AtomicU32,
    counters: ContentionCounters,
}

impl BlockingLock {
    pub const fn new() -> Self {
        Self {
            raw: parking_lot::RawMutex::INIT,
            holder: AtomicU32::new(NO_HOLDER),
            counters: ContentionCounters::new(),
        }
    }

    /// The role currently holding the lock, if any.
    pub fn holder(&self) -> Option<Role> {
        Role::from_bits(self.holder.load(Ordering::Relaxed))
    }
}

impl Default for BlockingLock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BlockingLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingLock")
            .field("holder", &self.holder())
            .field("contention", &self.counters.snapshot())
            .finish()
    }
}

// SAFETY: exclusion comes from the parking_lot mutex; `holder` only
// records who got it.
unsafe impl RawLock for BlockingLock {
    #[inline]
    fn acquire(&self, role: Role) {
        if !self.raw.try_lock() {
            // The holder is published right after locking, so a waiter can
            // briefly see NO_HOLDER. With a single producer and consumer the
            // other side is the only possible owner.
            let holder = self.holder().unwrap_or(match role {
                Role::Producer => Role::Consumer,
                Role::Consumer => Role::Producer,
            });
            self.counters.record(holder);
            self.raw.lock();
        }
        self.holder.store(role.bits(), Ordering::Relaxed);
    }

    #[inline]
    unsafe fn release(&self, role: Role) -> Result<()> {
        if !self.raw.is_locked() || self.holder.load(Ordering::Relaxed) != role.bits() {
            return Err(Error::LockNotHeld);
        }
        self.holder.store(NO_HOLDER, Ordering::Relaxed);
        // SAFETY: the mutex is locked as `role`, and the caller acquired it as `role`.
        unsafe { self.raw.unlock() };
        Ok(())
    }

    fn contention(&self) -> Contention {
        self.counters.snapshot()
    }
}
