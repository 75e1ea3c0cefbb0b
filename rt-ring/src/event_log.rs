//! Low-overhead diagnostic event recording.
//!
//! The event log is a [`RingBuffer`] of [`LogRecord`]s guarded by its own
//! [`BlockingLock`]. It keeps only the most recent `capacity` events and is
//! drained explicitly once the tasks writing to it have finished.
//!
//! Events from the producer and the consumer go through separate lock
//! acquisitions from the data queue, so their relative order in the log
//! only approximates the true order of the queue operations.
use crate::{
    lock::{BlockingLock, Contention, Role},
    ring_buffer::RingBuffer,
};
use fastant::Instant;
use std::{
    fmt,
    io::{self, Write},
    time::Duration,
};

pub const DEFAULT_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventKind {
    #[default]
    Enqueued,
    Dequeued,
    ConsumerIdle,
    Terminated,
}

impl EventKind {
    /// Return `str` representation of this kind.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Enqueued => "enq",
            EventKind::Dequeued => "deq",
            EventKind::ConsumerIdle => "idle",
            EventKind::Terminated => "end",
        }
    }

    /// The task that emits this kind of event.
    pub fn role(self) -> Role {
        match self {
            EventKind::Enqueued => Role::Producer,
            EventKind::Dequeued | EventKind::ConsumerIdle | EventKind::Terminated => {
                Role::Consumer
            }
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogRecord {
    pub kind: EventKind,
    pub value: u32,
    /// Monotonic time since the owning log was created.
    pub timestamp: Duration,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} val={} time={}.{:09}",
            self.kind,
            self.value,
            self.timestamp.as_secs(),
            self.timestamp.subsec_nanos()
        )
    }
}

pub struct EventLog {
    ring: RingBuffer<LogRecord, BlockingLock>,
    epoch: Instant,
    enabled: bool,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: RingBuffer::new(capacity, BlockingLock::new()),
            epoch: Instant::now(),
            enabled: true,
        }
    }

    /// A log that drops every record. `record` returns immediately.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(1)
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    #[inline]
    pub fn record(&self, kind: EventKind, value: u32) {
        if !self.enabled {
            return;
        }
        let record = LogRecord {
            kind,
            value,
            timestamp: self.epoch.elapsed(),
        };
        self.ring.enqueue_as(kind.role(), record);
    }

    /// Removes every retained record, oldest first.
    pub fn drain(&self) -> Vec<LogRecord> {
        std::iter::from_fn(|| self.ring.dequeue_as(Role::Consumer).ok()).collect()
    }

    /// Drains into `out`, one `<index>: <record>` line per record.
    pub fn drain_to(&self, out: &mut impl fmt::Write) -> fmt::Result {
        for (idx, record) in self.drain().into_iter().enumerate() {
            writeln!(out, "{idx}: {record}")?;
        }
        Ok(())
    }

    pub fn drain_to_string(&self) -> String {
        let mut out = String::new();
        // Writing into a `String` cannot fail.
        let _ = self.drain_to(&mut out);
        out
    }

    /// Drains to stdout and returns what was printed.
    pub fn drain_and_print(&self) -> io::Result<String> {
        let text = self.drain_to_string();
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(text)
    }

    pub fn contention(&self) -> Contention {
        self.ring.contention()
    }
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLog")
            .field("enabled", &self.enabled)
            .field("len", &self.ring.len())
            .field("capacity", &self.ring.capacity())
            .finish()
    }
}
