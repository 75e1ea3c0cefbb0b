use iai_callgrind::{library_benchmark, library_benchmark_group, main};
use rt_ring::{BlockingLock, EventKind, EventLog, RawLock, RingBuffer, SpinLock};
use std::hint::black_box;

fn enqueue_dequeue<L: RawLock>(rb: &RingBuffer<u32, L>, n: u32) {
    for v in 0..n {
        rb.enqueue(v);
        black_box(rb.dequeue().ok());
    }
}

fn setup_spin() -> RingBuffer<u32, SpinLock> {
    RingBuffer::new(64, SpinLock::new())
}

fn setup_blocking() -> RingBuffer<u32, BlockingLock> {
    RingBuffer::new(64, BlockingLock::new())
}

#[library_benchmark]
#[bench::first(setup_spin())]
fn bench_spin(rb: RingBuffer<u32, SpinLock>) {
    enqueue_dequeue(&rb, 100_000);
}

#[library_benchmark]
#[bench::first(setup_blocking())]
fn bench_blocking(rb: RingBuffer<u32, BlockingLock>) {
    enqueue_dequeue(&rb, 100_000);
}

#[library_benchmark]
#[bench::first(EventLog::new(100))]
fn bench_event_log(log: EventLog) {
    for v in 0..100_000 {
        log.record(EventKind::Enqueued, v);
    }
    black_box(log.drain());
}

library_benchmark_group!(name = bench_group; benchmarks = bench_spin, bench_blocking, bench_event_log);
main!(library_benchmark_groups = bench_group);
