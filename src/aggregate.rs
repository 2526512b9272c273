use std::collections::{BTreeMap, HashSet};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::ExperimentConfig;
use crate::counters::bias::bias_table;
use crate::counters::hll_counter::{loglog_relative_standard_error, relative_standard_error};
use crate::error::{Error, Result};
use crate::record::{AggregateRecord, CheckpointRecord};
use crate::trial::run_trial;

/// Headline numbers for one experiment.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub precision: u8,
    pub num_registers: usize,
    pub memory_bytes: usize,
    pub theoretical_error: f64,
    pub loglog_error: f64,
    /// `std_est / mean_est` at the last checkpoint.
    pub observed_error: f64,
    pub observed_error_plus: f64,
}

#[derive(Clone, Debug)]
pub struct ExperimentReport {
    pub timeseries: Vec<CheckpointRecord>,
    pub aggregates: Vec<AggregateRecord>,
    pub summary: Summary,
}

/// Runs every trial of `config` and reduces them checkpoint by checkpoint.
///
/// With `parallel` set, each trial is its own rayon task; aggregation starts
/// only once all of them have finished.
pub fn run_experiment(config: &ExperimentConfig, parallel: bool) -> Result<ExperimentReport> {
    let milestones = config.validate()?;
    info!(
        trials = config.trials,
        stream_len = config.stream_len,
        precision = config.precision,
        checkpoints = milestones.len(),
        parallel,
        "starting experiment"
    );

    // Calibrate up front so no trial task blocks on it.
    bias_table(config.precision);

    let per_trial: Vec<Vec<CheckpointRecord>> = if parallel {
        (0..config.trials)
            .into_par_iter()
            .map(|trial_id| run_trial(trial_id, config, &milestones))
            .collect::<Result<_>>()?
    } else {
        (0..config.trials)
            .map(|trial_id| run_trial(trial_id, config, &milestones))
            .collect::<Result<_>>()?
    };
    let timeseries: Vec<CheckpointRecord> = per_trial.into_iter().flatten().collect();
    debug!(records = timeseries.len(), "all trials joined");

    let aggregates = aggregate(&timeseries, config.trials, &milestones)?;
    let summary = summarize(config, &aggregates);
    info!(
        observed_error = summary.observed_error,
        observed_error_plus = summary.observed_error_plus,
        theoretical_error = summary.theoretical_error,
        "experiment finished"
    );

    Ok(ExperimentReport {
        timeseries,
        aggregates,
        summary,
    })
}

/// Reduces checkpoint records from `trials` trials into one aggregate per
/// milestone.
///
/// Every milestone must be reported by exactly `trials` distinct trials and
/// no record may fall outside the schedule. Standard deviations use the
/// population convention (divide by the trial count).
pub fn aggregate(
    records: &[CheckpointRecord],
    trials: usize,
    milestones: &[u64],
) -> Result<Vec<AggregateRecord>> {
    if trials == 0 {
        return Err(Error::NoTrials);
    }

    let mut groups: BTreeMap<u64, Vec<&CheckpointRecord>> =
        milestones.iter().map(|&m| (m, Vec::new())).collect();
    for record in records {
        match groups.get_mut(&record.processed_count) {
            Some(group) => group.push(record),
            None => {
                return Err(Error::ScheduleMismatch {
                    trial_id: record.trial_id,
                    processed: record.processed_count,
                    expected: milestones
                        .iter()
                        .copied()
                        .find(|&m| m > record.processed_count),
                });
            }
        }
    }

    groups
        .into_iter()
        .map(|(processed, group)| {
            let distinct: HashSet<usize> = group.iter().map(|r| r.trial_id).collect();
            if group.len() != trials || distinct.len() != trials {
                return Err(Error::MisalignedCheckpoint {
                    processed,
                    found: distinct.len(),
                    expected: trials,
                });
            }

            let (mean_true, std_true) = mean_std(group.iter().map(|r| r.true_unique as f64));
            let (mean_est_classic, std_est_classic) =
                mean_std(group.iter().map(|r| r.estimate_classic));
            let (mean_est_refined, std_est_refined) =
                mean_std(group.iter().map(|r| r.estimate_refined));
            Ok(AggregateRecord {
                processed_count: processed,
                mean_true,
                std_true,
                mean_est_classic,
                std_est_classic,
                mean_est_refined,
                std_est_refined,
            })
        })
        .collect()
}

/// Mean and population standard deviation, two-pass.
fn mean_std(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let n = values.clone().count() as f64;
    if n == 0.0 {
        return (0.0, 0.0);
    }
    let mean = values.clone().sum::<f64>() / n;
    let variance = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn summarize(config: &ExperimentConfig, aggregates: &[AggregateRecord]) -> Summary {
    let m = config.num_registers();
    let ratio = |std: f64, mean: f64| if mean > 0.0 { std / mean } else { 0.0 };
    let (observed_error, observed_error_plus) = aggregates
        .last()
        .map(|a| {
            (
                ratio(a.std_est_classic, a.mean_est_classic),
                ratio(a.std_est_refined, a.mean_est_refined),
            )
        })
        .unwrap_or_default();
    Summary {
        precision: config.precision,
        num_registers: m,
        memory_bytes: m,
        theoretical_error: relative_standard_error(m),
        loglog_error: loglog_relative_standard_error(m),
        observed_error,
        observed_error_plus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(trial_id: usize, processed: u64, truth: u64, est: f64, plus: f64) -> CheckpointRecord {
        CheckpointRecord {
            trial_id,
            processed_count: processed,
            true_unique: truth,
            estimate_classic: est,
            estimate_refined: plus,
        }
    }

    #[test]
    fn population_statistics() {
        let records = vec![
            record(0, 10, 10, 8.0, 9.0),
            record(1, 10, 10, 12.0, 11.0),
            record(0, 20, 19, 18.0, 20.0),
            record(1, 20, 21, 22.0, 20.0),
        ];
        let aggregates = aggregate(&records, 2, &[10, 20]).unwrap();
        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].processed_count, 10);
        assert_eq!(aggregates[0].mean_est_classic, 10.0);
        assert_eq!(aggregates[0].std_est_classic, 2.0);
        assert_eq!(aggregates[0].std_est_refined, 1.0);
        assert_eq!(aggregates[1].mean_true, 20.0);
        assert_eq!(aggregates[1].std_true, 1.0);
        assert_eq!(aggregates[1].std_est_refined, 0.0);
    }

    #[test]
    fn groups_by_processed_count_not_position() {
        let records = vec![
            record(1, 20, 20, 20.0, 20.0),
            record(0, 10, 10, 10.0, 10.0),
            record(0, 20, 20, 20.0, 20.0),
            record(1, 10, 10, 10.0, 10.0),
        ];
        let aggregates = aggregate(&records, 2, &[10, 20]).unwrap();
        assert_eq!(aggregates[0].mean_true, 10.0);
        assert_eq!(aggregates[1].mean_true, 20.0);
    }

    #[test]
    fn missing_checkpoint_is_fatal() {
        let records = vec![
            record(0, 10, 10, 10.0, 10.0),
            record(1, 10, 10, 10.0, 10.0),
            record(0, 20, 20, 20.0, 20.0),
        ];
        assert!(matches!(
            aggregate(&records, 2, &[10, 20]),
            Err(Error::MisalignedCheckpoint {
                processed: 20,
                found: 1,
                expected: 2
            })
        ));
    }

    #[test]
    fn repeated_trial_is_fatal() {
        let records = vec![record(0, 10, 10, 10.0, 10.0), record(0, 10, 10, 10.0, 10.0)];
        assert!(matches!(
            aggregate(&records, 2, &[10]),
            Err(Error::MisalignedCheckpoint { found: 1, .. })
        ));
    }

    #[test]
    fn off_schedule_record_is_fatal() {
        let records = vec![record(0, 10, 10, 10.0, 10.0), record(1, 15, 15, 15.0, 15.0)];
        assert!(matches!(
            aggregate(&records, 2, &[10, 20]),
            Err(Error::ScheduleMismatch {
                trial_id: 1,
                processed: 15,
                expected: Some(20)
            })
        ));
    }

    #[test]
    fn parallel_matches_sequential() {
        let config = ExperimentConfig {
            trials: 6,
            stream_len: 2_000,
            precision: 7,
            ..Default::default()
        };
        let parallel = run_experiment(&config, true).unwrap();
        let sequential = run_experiment(&config, false).unwrap();
        assert_eq!(parallel.timeseries, sequential.timeseries);
        assert_eq!(parallel.aggregates, sequential.aggregates);
        assert_eq!(parallel.summary, sequential.summary);
    }

    #[test]
    fn rejects_invalid_config_before_running() {
        let config = ExperimentConfig {
            trials: 0,
            ..Default::default()
        };
        assert!(matches!(run_experiment(&config, true), Err(Error::NoTrials)));
    }
}
