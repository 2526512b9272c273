use tracing::trace;

use crate::checkpoints::check_milestones;
use crate::config::ExperimentConfig;
use crate::counters::hashing::{DefaultHashBuilder, seeded_builder};
use crate::counters::{Counter, ExactCounter, HLLCounter, Variant};
use crate::error::Result;
use crate::record::CheckpointRecord;
use crate::stream::{Element, StreamGenerator};

/// One pass of a generated stream through the exact counter and both
/// sketches.
///
/// Each call to `next` consumes the stream up to the next milestone and
/// samples all three counters. Dropping the trial early abandons it at that
/// checkpoint; nothing it owns is shared with other trials.
pub struct Trial<'a> {
    trial_id: usize,
    stream: StreamGenerator,
    exact: ExactCounter<Element>,
    classic: HLLCounter<DefaultHashBuilder>,
    plus: HLLCounter<DefaultHashBuilder>,
    milestones: &'a [u64],
    next_milestone: usize,
}

impl<'a> Trial<'a> {
    /// Fails with [`Error::InvalidSchedule`](crate::Error::InvalidSchedule)
    /// unless `milestones` is strictly increasing and within
    /// `1..=config.stream_len`.
    pub fn new(trial_id: usize, config: &ExperimentConfig, milestones: &'a [u64]) -> Result<Self> {
        check_milestones(milestones, config.stream_len)?;
        let seed = config.trial_seed(trial_id);
        let stream = StreamGenerator::new(config.stream_kind, seed, config.stream_len);
        Ok(Trial {
            trial_id,
            exact: ExactCounter::with_capacity(stream.max_distinct() as usize),
            stream,
            classic: HLLCounter::with_hasher(config.precision, Variant::Classic, seeded_builder(seed))?,
            plus: HLLCounter::with_hasher(config.precision, Variant::Plus, seeded_builder(seed))?,
            milestones,
            next_milestone: 0,
        })
    }

    pub fn id(&self) -> usize {
        self.trial_id
    }

    pub fn processed(&self) -> u64 {
        self.stream.produced()
    }

    pub fn classic(&self) -> &HLLCounter<DefaultHashBuilder> {
        &self.classic
    }

    pub fn plus(&self) -> &HLLCounter<DefaultHashBuilder> {
        &self.plus
    }
}

impl Iterator for Trial<'_> {
    type Item = CheckpointRecord;

    fn next(&mut self) -> Option<CheckpointRecord> {
        let target = *self.milestones.get(self.next_milestone)?;
        while self.stream.produced() < target {
            let element = self.stream.next()?;
            self.exact.add(&element);
            self.classic.add(&element);
            self.plus.add(&element);
        }
        self.next_milestone += 1;

        let record = CheckpointRecord {
            trial_id: self.trial_id,
            processed_count: target,
            true_unique: self.exact.size() as u64,
            estimate_classic: self.classic.estimate(),
            estimate_refined: self.plus.estimate(),
        };
        trace!(
            trial = self.trial_id,
            processed = target,
            true_unique = record.true_unique,
            estimate = record.estimate_classic,
            estimate_plus = record.estimate_refined,
            "checkpoint"
        );
        Some(record)
    }
}

/// Runs trial `trial_id` to completion.
pub fn run_trial(
    trial_id: usize,
    config: &ExperimentConfig,
    milestones: &[u64],
) -> Result<Vec<CheckpointRecord>> {
    Ok(Trial::new(trial_id, config, milestones)?.collect())
}
