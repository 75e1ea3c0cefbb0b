use crate::{
    event_log::{EventKind, EventLog},
    lock::{Contention, RawLock},
    ring_buffer::RingBuffer,
    Empty,
};

/// The data queue shared by the producer and the consumer.
///
/// Each successful operation appends an event to `events` after the queue
/// lock has been released; the two locks are never held together.
pub struct DataQueue<'log, L> {
    ring: RingBuffer<u32, L>,
    events: &'log EventLog,
}

impl<'log, L: RawLock> DataQueue<'log, L> {
    pub fn new(capacity: usize, lock: L, events: &'log EventLog) -> Self {
        Self {
            ring: RingBuffer::new(capacity, lock),
            events,
        }
    }

    #[inline]
    pub fn enqueue(&self, value: u32) {
        self.ring.enqueue(value);
        self.events.record(EventKind::Enqueued, value);
    }

    #[inline]
    pub fn dequeue(&self) -> Result<u32, Empty> {
        let value = self.ring.dequeue()?;
        self.events.record(EventKind::Dequeued, value);
        Ok(value)
    }

    pub fn events(&self) -> &'log EventLog {
        self.events
    }

    pub fn contention(&self) -> Contention {
        self.ring.contention()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}
