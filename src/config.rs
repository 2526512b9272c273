use crate::checkpoints::CheckpointSchedule;
use crate::counters::{MAX_PRECISION, MIN_PRECISION};
use crate::error::{Error, Result};
use crate::stream::StreamKind;

/// Everything a run needs, fixed before the first trial starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExperimentConfig {
    pub trials: usize,
    pub stream_len: u64,
    pub schedule: CheckpointSchedule,
    pub precision: u8,
    pub seed_base: u64,
    pub stream_kind: StreamKind,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            trials: 30,
            stream_len: 50_000,
            schedule: CheckpointSchedule::default(),
            precision: 10,
            seed_base: 42,
            stream_kind: StreamKind::default(),
        }
    }
}

impl ExperimentConfig {
    /// Checks the configuration and resolves its checkpoint milestones.
    pub fn validate(&self) -> Result<Vec<u64>> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&self.precision) {
            return Err(Error::InvalidPrecision(self.precision));
        }
        if self.trials == 0 {
            return Err(Error::NoTrials);
        }
        self.schedule.resolve(self.stream_len)
    }

    pub fn num_registers(&self) -> usize {
        1 << self.precision
    }

    /// Seed of trial `trial_id`; distinct trials get distinct seeds.
    pub fn trial_seed(&self, trial_id: usize) -> u64 {
        self.seed_base
            .wrapping_mul(1_000_003)
            .wrapping_add((trial_id as u64).wrapping_mul(999_983))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let milestones = ExperimentConfig::default().validate().unwrap();
        assert_eq!(milestones.len(), 20);
        assert_eq!(milestones.last(), Some(&50_000));
    }

    #[test]
    fn rejects_bad_precision() {
        let config = ExperimentConfig {
            precision: 2,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidPrecision(2))));
    }

    #[test]
    fn rejects_zero_trials() {
        let config = ExperimentConfig {
            trials: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::NoTrials)));
    }

    #[test]
    fn rejects_empty_stream() {
        let config = ExperimentConfig {
            stream_len: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::EmptyStream)));
    }

    #[test]
    fn trial_seeds_are_distinct() {
        let config = ExperimentConfig::default();
        let seeds: std::collections::HashSet<u64> = (0..1000).map(|t| config.trial_seed(t)).collect();
        assert_eq!(seeds.len(), 1000);
    }
}
