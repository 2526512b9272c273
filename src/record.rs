use serde::Serialize;

/// One sample of a trial, a row of the per-trial timeseries table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CheckpointRecord {
    #[serde(rename = "stream")]
    pub trial_id: usize,
    #[serde(rename = "processed")]
    pub processed_count: u64,
    pub true_unique: u64,
    #[serde(rename = "estimate")]
    pub estimate_classic: f64,
    #[serde(rename = "estimate_plus")]
    pub estimate_refined: f64,
}

/// Cross-trial statistics for one checkpoint, a row of the aggregate table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AggregateRecord {
    #[serde(rename = "processed")]
    pub processed_count: u64,
    pub mean_true: f64,
    #[serde(skip)]
    pub std_true: f64,
    #[serde(rename = "mean_est")]
    pub mean_est_classic: f64,
    #[serde(rename = "std_est")]
    pub std_est_classic: f64,
    #[serde(rename = "mean_est_plus")]
    pub mean_est_refined: f64,
    #[serde(rename = "std_est_plus")]
    pub std_est_refined: f64,
}
