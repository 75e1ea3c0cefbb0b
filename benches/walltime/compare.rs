use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;
use rt_ring::BlockingLock;
use rt_ring::RawLock;
use rt_ring::RingBuffer;
use rt_ring::SpinLock;
use rt_ring::SpinOrdering;
use std::hint::black_box;

const CAPACITY: usize = 1024;

fn ring_harness<L: RawLock>(rb: &RingBuffer<u32, L>, n: u32) {
    for v in 0..n {
        rb.enqueue(black_box(v));
        if v % 4 == 3 {
            // Keep some values around so the overwrite path is exercised too.
            for _ in 0..2 {
                black_box(rb.dequeue().ok());
            }
        }
    }
    black_box(rb.drain_all());
}

fn rtrb_harness(n: u32) {
    // Lock-free reference point; it rejects pushes instead of overwriting.
    let (mut tx, mut rx) = rtrb::RingBuffer::<u32>::new(CAPACITY);
    for v in 0..n {
        if tx.push(black_box(v)).is_err() {
            black_box(rx.pop().ok());
            let _ = tx.push(v);
        }
        if v % 4 == 3 {
            for _ in 0..2 {
                black_box(rx.pop().ok());
            }
        }
    }
    while let Ok(v) = rx.pop() {
        black_box(v);
    }
}

fn uncontended(c: &mut Criterion) {
    let spin = RingBuffer::new(CAPACITY, SpinLock::new());
    let spin_acqrel = RingBuffer::new(
        CAPACITY,
        SpinLock::with_ordering(SpinOrdering::AcquireRelease),
    );
    let blocking = RingBuffer::new(CAPACITY, BlockingLock::new());

    let mut bgroup = c.benchmark_group("uncontended");

    for n in &[100, 1000, 10000] {
        bgroup.bench_function(format!("spin_seqcst/{n}"), |b| {
            b.iter(|| ring_harness(&spin, *n))
        });
        bgroup.bench_function(format!("spin_acqrel/{n}"), |b| {
            b.iter(|| ring_harness(&spin_acqrel, *n))
        });
        bgroup.bench_function(format!("blocking/{n}"), |b| {
            b.iter(|| ring_harness(&blocking, *n))
        });
        bgroup.bench_function(format!("rtrb/{n}"), |b| b.iter(|| rtrb_harness(*n)));
    }

    bgroup.finish();
}

criterion_group!(benches, uncontended);
criterion_main!(benches);
