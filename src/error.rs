use thiserror::Error;

use crate::counters::{MAX_PRECISION, MIN_PRECISION};

/// Errors raised while configuring or reducing an experiment.
///
/// Everything except `Io` and `Serialization` is a configuration or
/// consistency error and is fatal: nothing here is retryable.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid precision {0}: expected {MIN_PRECISION}..={MAX_PRECISION}")]
    InvalidPrecision(u8),

    #[error("stream length must be positive")]
    EmptyStream,

    #[error("trial count must be positive")]
    NoTrials,

    #[error("invalid checkpoint schedule: {0}")]
    InvalidSchedule(String),

    #[error("trial {trial_id} emitted checkpoint at {processed}, schedule expects {expected:?}")]
    ScheduleMismatch {
        trial_id: usize,
        processed: u64,
        expected: Option<u64>,
    },

    #[error("checkpoint {processed}: {found} records from distinct trials, expected {expected}")]
    MisalignedCheckpoint {
        processed: u64,
        found: usize,
        expected: usize,
    },

    #[error("cannot merge sketches: {0}")]
    IncompatibleMerge(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
