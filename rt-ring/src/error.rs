use crate::lock::Role;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Returned by `dequeue` when there is nothing to read.
///
/// This is an ordinary outcome for a polling consumer, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ring buffer is empty")]
pub struct Empty;

#[derive(Debug, Error)]
pub enum Error {
    /// A lock was released while nobody held it.
    #[error("lock released while not held")]
    LockNotHeld,

    #[error("failed to start {role} task: {source}")]
    TaskStart {
        role: Role,
        #[source]
        source: std::io::Error,
    },

    #[error("{role} task panicked")]
    TaskPanicked { role: Role },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl Error {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            reason: reason.into(),
        }
    }
}
