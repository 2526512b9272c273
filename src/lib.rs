pub mod aggregate;
pub mod checkpoints;
pub mod config;
pub mod counters;
pub mod error;
pub mod record;
pub mod stream;
pub mod trial;

pub use aggregate::{ExperimentReport, Summary, aggregate, run_experiment};
pub use checkpoints::CheckpointSchedule;
pub use config::ExperimentConfig;
pub use counters::Counter;
pub use counters::ExactCounter;
pub use counters::HLLCounter;
pub use counters::Variant;
pub use error::{Error, Result};
pub use record::{AggregateRecord, CheckpointRecord};
pub use stream::{Element, StreamGenerator, StreamKind};
pub use trial::{Trial, run_trial};
