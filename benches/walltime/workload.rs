use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;
use rt_ring::Config;
use rt_ring::Discipline;
use rt_ring::Scenario;

fn workload_harness(config: &Config, n: u32) {
    let report = rt_ring::run(config, Scenario::Burst, n).unwrap();
    std::hint::black_box(report);
}

fn producer_consumer(c: &mut Criterion) {
    let mut bgroup = c.benchmark_group("producer_consumer");

    for discipline in [Discipline::Spin, Discipline::Blocking] {
        for event_log in [false, true] {
            let config = Config {
                capacity: 256,
                discipline,
                event_log,
                ..Config::default()
            };
            let log = if event_log { "log" } else { "nolog" };
            for n in &[10000, 100000] {
                bgroup.bench_function(format!("{discipline}/{log}/{n}"), |b| {
                    b.iter(|| workload_harness(&config, *n))
                });
            }
        }
    }

    bgroup.finish();
}

criterion_group!(benches, producer_consumer);
criterion_main!(benches);
