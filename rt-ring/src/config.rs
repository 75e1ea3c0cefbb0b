use crate::{
    event_log::DEFAULT_LOG_CAPACITY,
    lock::{Discipline, SpinOrdering},
    workload::SENTINEL,
    Error, Result,
};
use std::time::Duration;

pub const DEFAULT_CAPACITY: usize = 12;
pub const DEFAULT_BURST_LEN: u32 = 10;
pub const DEFAULT_BURST_PAUSE: Duration = Duration::from_millis(1);

/// Settings resolved once before a run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Slots in the data queue.
    pub capacity: usize,
    pub discipline: Discipline,
    /// Only used by [`Discipline::Spin`].
    pub spin_ordering: SpinOrdering,
    /// Record queue operations into the event log.
    pub event_log: bool,
    /// Events retained by the log. Older ones are overwritten.
    pub log_capacity: usize,
    /// Values per burst for [`Scenario::Paced`](crate::workload::Scenario::Paced).
    pub burst_len: u32,
    pub burst_pause: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            discipline: Discipline::default(),
            spin_ordering: SpinOrdering::default(),
            event_log: true,
            log_capacity: DEFAULT_LOG_CAPACITY,
            burst_len: DEFAULT_BURST_LEN,
            burst_pause: DEFAULT_BURST_PAUSE,
        }
    }
}

impl Config {
    /// Checks that a run producing `count` values can be driven with these
    /// settings.
    pub fn validate(&self, count: u32) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::invalid_config("queue capacity must be at least 1"));
        }
        if self.event_log && self.log_capacity == 0 {
            return Err(Error::invalid_config("event log capacity must be at least 1"));
        }
        if self.burst_len == 0 {
            return Err(Error::invalid_config("burst length must be at least 1"));
        }
        // Values run 0..count, so the largest one must stay below the sentinel.
        if count >= SENTINEL {
            return Err(Error::invalid_config(format!(
                "count {count} collides with the sentinel value {SENTINEL}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.capacity, 12);
        assert_eq!(config.log_capacity, 100);
        assert_eq!(config.discipline, Discipline::Spin);
        assert_eq!(config.spin_ordering, SpinOrdering::SeqCst);
        config.validate(1_000).unwrap();
    }

    #[test]
    fn rejects_zero_capacity() {
        let config = Config {
            capacity: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(1), Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn log_capacity_ignored_when_disabled() {
        let config = Config {
            event_log: false,
            log_capacity: 0,
            ..Config::default()
        };
        config.validate(1).unwrap();
    }

    #[test]
    fn rejects_count_reaching_sentinel() {
        let config = Config::default();
        config.validate(SENTINEL - 1).unwrap();
        assert!(config.validate(SENTINEL).is_err());
    }
}
