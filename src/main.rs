mod demo;

use std::io;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use hll_experiment::{CheckpointSchedule, ExperimentConfig, StreamKind};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StreamKindArg {
    RandomStrings,
    DistinctIntegers,
    Duplicated,
}

impl From<StreamKindArg> for StreamKind {
    fn from(arg: StreamKindArg) -> Self {
        match arg {
            StreamKindArg::RandomStrings => StreamKind::RandomStrings,
            StreamKindArg::DistinctIntegers => StreamKind::DistinctIntegers,
            StreamKindArg::Duplicated => StreamKind::Duplicated,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "hll-experiment")]
#[command(about = "Compare HyperLogLog and HyperLogLog++ against exact distinct counts")]
struct Args {
    #[arg(long, default_value_t = 30)]
    trials: usize,

    #[arg(long, default_value_t = 50_000)]
    stream_len: u64,

    /// Register precision b, m = 2^b
    #[arg(long, default_value_t = 10)]
    precision: u8,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, value_enum, default_value_t = StreamKindArg::RandomStrings)]
    stream_kind: StreamKindArg,

    /// Checkpoint every K elements
    #[arg(long, conflicts_with_all = ["parts", "checkpoints"])]
    every: Option<u64>,

    /// Checkpoint at N*i/P for i in 1..=P
    #[arg(long, conflicts_with = "checkpoints")]
    parts: Option<u64>,

    /// Explicit checkpoints, comma separated
    #[arg(long, value_delimiter = ',')]
    checkpoints: Option<Vec<u64>>,

    /// Run trials one after another instead of on the rayon pool
    #[arg(long)]
    sequential: bool,

    #[arg(long, default_value = "out_timeseries.jsonl")]
    timeseries_out: PathBuf,

    #[arg(long, default_value = "out_stats.jsonl")]
    stats_out: PathBuf,
}

impl Args {
    fn config(&self) -> ExperimentConfig {
        let schedule = match (&self.every, &self.parts, &self.checkpoints) {
            (Some(k), _, _) => CheckpointSchedule::Every(*k),
            (_, Some(p), _) => CheckpointSchedule::Parts(*p),
            (_, _, Some(list)) => CheckpointSchedule::Explicit(list.clone()),
            _ => CheckpointSchedule::default(),
        };
        ExperimentConfig {
            trials: self.trials,
            stream_len: self.stream_len,
            schedule,
            precision: self.precision,
            seed_base: self.seed,
            stream_kind: self.stream_kind.into(),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = args.config();

    println!("Synthetic stream experiment");
    println!("===========================");
    demo::synthetic::run_comparison(
        &config,
        !args.sequential,
        &args.timeseries_out,
        &args.stats_out,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_kind_flag_maps_onto_library_kind() {
        let args = Args::try_parse_from(["hll-experiment", "--stream-kind", "duplicated"]).unwrap();
        assert_eq!(args.config().stream_kind, StreamKind::Duplicated);
        let args = Args::try_parse_from(["hll-experiment"]).unwrap();
        assert_eq!(args.config().stream_kind, StreamKind::RandomStrings);
    }

    #[test]
    fn explicit_checkpoints_are_comma_separated() {
        let args = Args::try_parse_from(["hll-experiment", "--checkpoints", "10,20,30"]).unwrap();
        assert_eq!(args.config().schedule, CheckpointSchedule::Explicit(vec![10, 20, 30]));
    }
}
