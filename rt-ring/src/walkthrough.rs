//! Single-threaded tour of the ring buffer.
//!
//! Runs a fixed sequence of enqueues and dequeues on a 12-slot buffer and
//! dumps the slots after every step, which makes the cursor movement and the
//! overwrite policy easy to follow by eye. Every dequeue here resets its slot
//! to [`INVALID_ENTRY`], so consumed slots stand out in the dumps.
use crate::{lock::SpinLock, ring_buffer::RingBuffer};
use std::fmt::{self, Write};

pub const WALKTHROUGH_CAPACITY: usize = 12;

/// Marks slots that hold no value: some of the initial ones, and every slot
/// whose value has been dequeued.
pub const INVALID_ENTRY: i32 = -1;

type Buffer = RingBuffer<i32, SpinLock>;

fn dump(out: &mut impl Write, label: &str, rb: &mut Buffer) -> fmt::Result {
    writeln!(out, "{label} {}", rb.snapshot())
}

fn deq(rb: &Buffer) -> Option<i32> {
    rb.dequeue_clearing(INVALID_ENTRY).ok()
}

fn deq_all(out: &mut impl Write, rb: &mut Buffer) -> fmt::Result {
    write!(out, "deq all:")?;
    while let Some(value) = deq(rb) {
        write!(out, " {value}")?;
    }
    writeln!(out)?;
    dump(out, "deq empty", rb)
}

/// Writes the whole walkthrough to `out`.
pub fn run(out: &mut impl Write) -> fmt::Result {
    // Some slots start out marked invalid, the rest zeroed; none of it is
    // readable until written.
    let mut slots = vec![0; WALKTHROUGH_CAPACITY];
    for idx in [0, 1, 4] {
        slots[idx] = INVALID_ENTRY;
    }
    let mut rb = RingBuffer::from_slots(slots, SpinLock::new());
    dump(out, "init", &mut rb)?;

    let mut base = 0;
    for i in 0..3 {
        rb.enqueue(base + i);
    }
    dump(out, "enq 3", &mut rb)?;
    deq_all(out, &mut rb)?;

    base += 10;
    rb.enqueue(base + 1);
    dump(out, "enq 1", &mut rb)?;
    if let Some(value) = deq(&rb) {
        writeln!(out, "deq oldest val={value}")?;
    }
    dump(out, "deq 1", &mut rb)?;

    base += 10;
    for i in 0..24 {
        rb.enqueue(base + i);
    }
    dump(out, "enq 24 wrap", &mut rb)?;

    let oldest: Vec<String> = (0..3)
        .filter_map(|_| deq(&rb))
        .map(|value| format!("oldest={value}"))
        .collect();
    writeln!(out, "{}", oldest.join(" "))?;
    dump(out, "deq 3", &mut rb)?;

    base += 10;
    for i in 0..3 {
        rb.enqueue(base + i);
    }
    dump(out, "enq 3", &mut rb)?;

    base += 10;
    for i in 0..4 {
        rb.enqueue(base + i);
    }
    dump(out, "enq 4", &mut rb)?;
    deq_all(out, &mut rb)?;

    // Fill fast, drain slowly.
    for _ in 0..8 {
        base += 10;
        for i in 0..5 {
            rb.enqueue(base + i);
        }
        dump(out, "enq 5", &mut rb)?;
        match deq(&rb) {
            Some(value) => writeln!(out, "oldest val={value}")?,
            None => writeln!(out, "warning, no entries")?,
        }
    }

    deq_all(out, &mut rb)
}

pub fn run_to_string() -> String {
    let mut out = String::new();
    // Writing into a `String` cannot fail.
    let _ = run(&mut out);
    out
}
