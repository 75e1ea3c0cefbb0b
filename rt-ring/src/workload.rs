//! Producer/consumer workload over a [`DataQueue`].
//!
//! The producer enqueues `0..count` and then [`SENTINEL`]. The consumer
//! busy-polls `dequeue` until it reads the sentinel. There is no other way
//! for a run to end: a consumer whose producer never sends the sentinel
//! spins forever, so the driver only starts a consumer once its producer is
//! running, and a producer that panics still sends the sentinel while it
//! unwinds.
use crate::{
    config::Config,
    event_log::{EventKind, EventLog},
    lock::{BlockingLock, Contention, Discipline, RawLock, Role, SpinLock},
    queue::DataQueue,
    Empty, Error, Result,
};
use fastant::Instant;
use std::{fmt, hint, str::FromStr, thread, time::Duration};

/// Reserved end-of-stream value. Never produced as data.
pub const SENTINEL: u32 = u32::MAX;

/// How the producer paces its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scenario {
    /// All values back-to-back.
    #[default]
    Burst,
    /// Bursts of `burst_len` values separated by `burst_pause`.
    Paced,
    /// Yield the producer thread after every value.
    Interleaved,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Burst, Scenario::Paced, Scenario::Interleaved];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Burst => "burst",
            Scenario::Paced => "paced",
            Scenario::Interleaved => "interleaved",
        }
    }

    pub fn pacing(self, config: &Config) -> Pacing {
        match self {
            Scenario::Burst => Pacing::None,
            Scenario::Paced => Pacing::Bursts {
                len: config.burst_len,
                pause: config.burst_pause,
            },
            Scenario::Interleaved => Pacing::Yield,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.name() == s)
            .ok_or_else(|| format!("unknown scenario `{s}`"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    None,
    Bursts { len: u32, pause: Duration },
    Yield,
}

/// Enqueues every value in `values`, then the sentinel.
///
/// The sentinel is also sent if `values` or the queue panics part way.
pub fn produce<L: RawLock>(
    queue: &DataQueue<'_, L>,
    values: impl IntoIterator<Item = u32>,
    pacing: Pacing,
) {
    let _unwind = SentinelOnUnwind(queue);
    for (idx, value) in values.into_iter().enumerate() {
        debug_assert_ne!(value, SENTINEL);
        match pacing {
            Pacing::None => {}
            Pacing::Bursts { len, pause } => {
                if idx > 0 && idx % len.max(1) as usize == 0 {
                    thread::sleep(pause);
                }
            }
            Pacing::Yield => {
                if idx > 0 {
                    thread::yield_now();
                }
            }
        }
        queue.enqueue(value);
    }
    queue.enqueue(SENTINEL);
}

struct SentinelOnUnwind<'q, 'log, L: RawLock>(&'q DataQueue<'log, L>);

impl<L: RawLock> Drop for SentinelOnUnwind<'_, '_, L> {
    fn drop(&mut self) {
        if thread::panicking() {
            log::error!("producer panicked, sending sentinel");
            self.0.enqueue(SENTINEL);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsumerState {
    WaitingForFirstValue,
    Draining,
    Terminated,
}

/// What the consumer saw before the sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Consumed {
    pub values: Vec<u32>,
    /// Empty polls across the whole run.
    pub idle_polls: u64,
}

/// Polls `queue` until the sentinel arrives.
///
/// Each stretch of empty polls is logged as one `ConsumerIdle` event
/// carrying its length, written when the next value arrives.
pub fn consume<L: RawLock>(queue: &DataQueue<'_, L>, size_hint: usize) -> Consumed {
    let events = queue.events();
    let mut consumed = Consumed {
        values: Vec::with_capacity(size_hint),
        idle_polls: 0,
    };
    let mut state = ConsumerState::WaitingForFirstValue;
    let mut idle: u32 = 0;

    while state != ConsumerState::Terminated {
        match queue.dequeue() {
            Err(Empty) => {
                idle = idle.saturating_add(1);
                hint::spin_loop();
            }
            Ok(value) => {
                if idle > 0 {
                    events.record(EventKind::ConsumerIdle, idle);
                    consumed.idle_polls += u64::from(idle);
                    idle = 0;
                }
                if value == SENTINEL {
                    events.record(EventKind::Terminated, value);
                    state = ConsumerState::Terminated;
                } else {
                    if state == ConsumerState::WaitingForFirstValue {
                        log::debug!("consumer received first value {value}");
                        state = ConsumerState::Draining;
                    }
                    consumed.values.push(value);
                }
            }
        }
    }
    consumed
}

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub discipline: Discipline,
    pub scenario: Scenario,
    pub count: u32,
    /// Wall time from spawning the producer until both tasks joined.
    pub elapsed: Duration,
    pub queue_contention: Contention,
    pub log_contention: Contention,
    /// Values the consumer received, sentinel excluded.
    pub consumed: Vec<u32>,
    pub idle_polls: u64,
    /// Drained event log, one line per record. Empty when the log is off.
    pub events: String,
}

impl RunReport {
    /// Values overwritten before the consumer got to them.
    pub fn lost(&self) -> u64 {
        u64::from(self.count) - self.consumed.len() as u64
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.events.is_empty() {
            writeln!(f, "dumping log")?;
            f.write_str(&self.events)?;
            writeln!(f, "done")?;
        }
        writeln!(
            f,
            "{} {} count={}: elapsed {}.{:09}s",
            self.discipline,
            self.scenario,
            self.count,
            self.elapsed.as_secs(),
            self.elapsed.subsec_nanos()
        )?;
        writeln!(
            f,
            "consumed={} lost={} idle_polls={}",
            self.consumed.len(),
            self.lost(),
            self.idle_polls
        )?;
        writeln!(f, "queue contention: {}", self.queue_contention)?;
        write!(f, "log contention: {}", self.log_contention)
    }
}

/// Runs `scenario` with `count` values under `config` and reports the result.
pub fn run(config: &Config, scenario: Scenario, count: u32) -> Result<RunReport> {
    config.validate(count)?;

    let events = if config.event_log {
        EventLog::new(config.log_capacity)
    } else {
        EventLog::disabled()
    };

    log::info!(
        "running {scenario} with {count} values, capacity {}, {} lock",
        config.capacity,
        config.discipline
    );

    match config.discipline {
        Discipline::Spin => {
            let lock = SpinLock::with_ordering(config.spin_ordering);
            let queue = DataQueue::new(config.capacity, lock, &events);
            drive(&queue, config, scenario, count, 0..count)
        }
        Discipline::Blocking => {
            let queue = DataQueue::new(config.capacity, BlockingLock::new(), &events);
            drive(&queue, config, scenario, count, 0..count)
        }
    }
}

fn drive<L, I>(
    queue: &DataQueue<'_, L>,
    config: &Config,
    scenario: Scenario,
    count: u32,
    values: I,
) -> Result<RunReport>
where
    L: RawLock,
    I: IntoIterator<Item = u32> + Send,
{
    let pacing = scenario.pacing(config);
    let start = Instant::now();

    let consumed = thread::scope(|s| -> Result<Consumed> {
        // Producer first: a consumer without a producer would never see the
        // sentinel.
        let producer = thread::Builder::new()
            .name("producer".to_string())
            .spawn_scoped(s, move || produce(queue, values, pacing))
            .map_err(|source| Error::TaskStart {
                role: Role::Producer,
                source,
            })?;
        let consumer = thread::Builder::new()
            .name("consumer".to_string())
            .spawn_scoped(s, move || consume(queue, count as usize))
            .map_err(|source| Error::TaskStart {
                role: Role::Consumer,
                source,
            })?;
        log::debug!("producer and consumer started");

        producer.join().map_err(|_| Error::TaskPanicked {
            role: Role::Producer,
        })?;
        consumer.join().map_err(|_| Error::TaskPanicked {
            role: Role::Consumer,
        })
    })?;

    let elapsed = start.elapsed();
    log::debug!("tasks joined after {elapsed:?}");

    let events = queue.events();
    Ok(RunReport {
        discipline: config.discipline,
        scenario,
        count,
        elapsed,
        queue_contention: queue.contention(),
        log_contention: events.contention(),
        idle_polls: consumed.idle_polls,
        consumed: consumed.values,
        events: events.drain_to_string(),
    })
}
