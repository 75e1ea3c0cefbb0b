use crate::{
    lock::{Contention, RawLock, Role},
    Empty,
};
use std::{
    cell::UnsafeCell,
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

/// A fixed-capacity ring buffer that overwrites the oldest element when full.
///
/// Slots live in a boxed slice allocated once at construction; cursors are
/// plain indices taken modulo the capacity. Whether a slot holds a readable
/// value is decided only by `count` and the cursors, never by slot content.
///
/// Every mutation happens under `L`. The buffer assumes exactly one producer
/// and one consumer: the overwrite path moves the remove cursor on the
/// producer's behalf, which is only sound while the lock serializes those
/// two roles.
pub struct RingBuffer<T, L> {
    lock: L,
    capacity: usize,
    // Written only under the lock; read without it as a hint in `dequeue`.
    count: AtomicUsize,
    cursors: UnsafeCell<Cursors<T>>,
}

struct Cursors<T> {
    slots: Box<[T]>,
    insert: usize,
    remove: usize,
}

impl<T> Cursors<T> {
    #[inline]
    fn next(&self, idx: usize) -> usize {
        if idx + 1 == self.slots.len() {
            0
        } else {
            idx + 1
        }
    }
}

// SAFETY: `cursors` is only touched while `lock` is held, or through `&mut self`.
unsafe impl<T: Send, L: RawLock> Sync for RingBuffer<T, L> {}

impl<T: Copy + Default, L: RawLock> RingBuffer<T, L> {
    /// Creates an empty buffer with `capacity` default-initialized slots.
    pub fn new(capacity: usize, lock: L) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        Self::from_slots(vec![T::default(); capacity], lock)
    }
}

impl<T: Copy, L: RawLock> RingBuffer<T, L> {
    /// Creates an empty buffer over pre-filled slots.
    ///
    /// The existing contents are never returned by `dequeue`; they only show
    /// up in [`inspect_all`](Self::inspect_all) until overwritten.
    pub fn from_slots(slots: Vec<T>, lock: L) -> Self {
        assert!(!slots.is_empty(), "Capacity must be greater than zero");
        Self {
            lock,
            capacity: slots.len(),
            count: AtomicUsize::new(0),
            cursors: UnsafeCell::new(Cursors {
                slots: slots.into_boxed_slice(),
                insert: 0,
                remove: 0,
            }),
        }
    }

    /// Appends `value` as the producer, discarding the oldest unread value if
    /// the buffer is full.
    #[inline]
    pub fn enqueue(&self, value: T) {
        self.enqueue_as(Role::Producer, value)
    }

    /// Removes the oldest unread value as the consumer.
    #[inline]
    pub fn dequeue(&self) -> Result<T, Empty> {
        self.dequeue_as(Role::Consumer)
    }

    pub(crate) fn enqueue_as(&self, role: Role, value: T) {
        let _guard = self.lock.lock(role);
        // SAFETY: we hold the lock.
        let cur = unsafe { &mut *self.cursors.get() };
        let capacity = self.capacity;
        let count = self.count.load(Ordering::Relaxed);

        if count == capacity {
            // The slot about to be written is the oldest one; step the remove
            // cursor off it first.
            debug_assert_eq!(cur.insert, cur.remove);
            log::trace!("overwriting oldest slot {}", cur.remove);
            cur.remove = cur.next(cur.remove);
        }

        cur.slots[cur.insert] = value;
        cur.insert = cur.next(cur.insert);

        if count < capacity {
            self.count.store(count + 1, Ordering::Relaxed);
        }
    }

    /// Like [`dequeue`](Self::dequeue), but overwrites the vacated slot with
    /// `vacant` so dumps show which slots have been consumed.
    #[inline]
    pub fn dequeue_clearing(&self, vacant: T) -> Result<T, Empty> {
        self.take(Role::Consumer, Some(vacant))
    }

    #[inline]
    pub(crate) fn dequeue_as(&self, role: Role) -> Result<T, Empty> {
        self.take(role, None)
    }

    fn take(&self, role: Role, vacant: Option<T>) -> Result<T, Empty> {
        // Racy fast path; rechecked below under the lock.
        if self.count.load(Ordering::Relaxed) == 0 {
            return Err(Empty);
        }

        let _guard = self.lock.lock(role);
        let count = self.count.load(Ordering::Relaxed);
        if count == 0 {
            return Err(Empty);
        }
        // SAFETY: we hold the lock.
        let cur = unsafe { &mut *self.cursors.get() };
        let value = cur.slots[cur.remove];
        if let Some(vacant) = vacant {
            cur.slots[cur.remove] = vacant;
        }
        cur.remove = cur.next(cur.remove);
        self.count.store(count - 1, Ordering::Relaxed);
        Ok(value)
    }

    /// Dequeues until the buffer reports [`Empty`], oldest first.
    pub fn drain_all(&self) -> Vec<T> {
        std::iter::from_fn(|| self.dequeue().ok()).collect()
    }

    /// Every slot from the first to the last, valid or not.
    ///
    /// Taking `&mut self` keeps this off any buffer that is still shared with
    /// running tasks.
    pub fn inspect_all(&mut self) -> Vec<T> {
        self.cursors.get_mut().slots.to_vec()
    }

    /// Cursor positions and slot contents for debug dumps.
    pub fn snapshot(&mut self) -> Snapshot<T> {
        let count = *self.count.get_mut();
        let cur = self.cursors.get_mut();
        Snapshot {
            count,
            insert: cur.insert,
            remove: cur.remove,
            slots: cur.slots.to_vec(),
        }
    }

    /// Number of unread values. Only a hint while other tasks are running.
    #[inline]
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Contention counters of the buffer's lock.
    pub fn contention(&self) -> Contention {
        self.lock.contention()
    }

    #[cfg(test)]
    pub(crate) fn lock(&self) -> &L {
        &self.lock
    }
}

impl<T, L> fmt::Debug for RingBuffer<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("count", &self.count.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// A point-in-time copy of a buffer's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<T> {
    pub count: usize,
    pub insert: usize,
    pub remove: usize,
    pub slots: Vec<T>,
}

impl<T: fmt::Display> fmt::Display for Snapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "count={} enq={} deq={}", self.count, self.insert, self.remove)?;
        let mut first = true;
        for slot in &self.slots {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{slot}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::RingBuffer;
    use crate::{
        lock::{BlockingLock, SpinLock},
        Empty,
    };

    #[test]
    fn basic_enqueue_and_overwrite() {
        let buf = RingBuffer::new(3, SpinLock::new());
        buf.enqueue(1);
        buf.enqueue(2);
        assert_eq!(buf.len(), 2);
        // Fill to capacity
        buf.enqueue(3);
        assert!(buf.is_full());
        // Overwrite oldest
        buf.enqueue(4);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.drain_all(), vec![2, 3, 4]);
        assert!(buf.is_empty());
    }

    #[test]
    fn empty_buffer_rejects_dequeue() {
        let buf: RingBuffer<u32, _> = RingBuffer::new(1, BlockingLock::new());
        assert_eq!(buf.dequeue(), Err(Empty));
    }

    #[test]
    fn leftover_slots_are_not_readable() {
        let mut buf = RingBuffer::from_slots(vec![7u32, 7, 7, 7], SpinLock::new());
        assert_eq!(buf.dequeue(), Err(Empty));
        assert_eq!(buf.inspect_all(), vec![7, 7, 7, 7]);
        buf.enqueue(1);
        assert_eq!(buf.inspect_all(), vec![1, 7, 7, 7]);
        assert_eq!(buf.drain_all(), vec![1]);
    }

    #[test]
    fn cursors_wrap_to_zero() {
        let mut buf = RingBuffer::new(3, SpinLock::new());
        for v in 0..3u32 {
            buf.enqueue(v);
        }
        let snap = buf.snapshot();
        assert_eq!((snap.count, snap.insert, snap.remove), (3, 0, 0));

        buf.enqueue(3);
        let snap = buf.snapshot();
        assert_eq!((snap.count, snap.insert, snap.remove), (3, 1, 1));
        assert_eq!(snap.slots, vec![3, 1, 2]);

        assert_eq!(buf.dequeue(), Ok(1));
        let snap = buf.snapshot();
        assert_eq!((snap.count, snap.insert, snap.remove), (2, 1, 2));
    }

    #[test]
    fn capacity_one() {
        let buf = RingBuffer::new(1, BlockingLock::new());
        buf.enqueue(1u32);
        buf.enqueue(2);
        assert_eq!(buf.dequeue(), Ok(2));
        assert_eq!(buf.dequeue(), Err(Empty));
    }

    #[test]
    fn snapshot_display() {
        let mut buf = RingBuffer::new(4, SpinLock::new());
        buf.enqueue(5u32);
        buf.enqueue(6);
        assert_eq!(buf.snapshot().to_string(), "count=2 enq=2 deq=0\n5 6 0 0");
    }

    #[test]
    #[should_panic(expected = "Capacity must be greater than zero")]
    fn zero_capacity_panics() {
        let _ = RingBuffer::<u32, _>::new(0, SpinLock::new());
    }

    #[test]
    fn locks_are_released_between_calls() {
        let buf = RingBuffer::new(2, SpinLock::new());
        buf.enqueue(1u32);
        assert_eq!(buf.lock().holder(), None);
        buf.dequeue().unwrap();
        assert_eq!(buf.lock().holder(), None);
        assert_eq!(buf.contention().total(), 0);
    }

    #[test]
    fn dequeue_clearing_marks_vacated_slot() {
        let mut buf = RingBuffer::new(3, SpinLock::new());
        buf.enqueue(1i32);
        buf.enqueue(2);
        assert_eq!(buf.dequeue_clearing(-1), Ok(1));
        assert_eq!(buf.inspect_all(), vec![-1, 2, 0]);
        assert_eq!(buf.dequeue(), Ok(2));
        assert_eq!(buf.dequeue_clearing(-1), Err(Empty));
        assert_eq!(buf.inspect_all(), vec![-1, 2, 0]);
    }
}
