use hll_experiment::{ExperimentConfig, run_experiment};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Writes one JSON object per row.
fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> hll_experiment::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "table written");
    Ok(())
}

pub fn run_comparison(
    config: &ExperimentConfig,
    parallel: bool,
    timeseries_out: &Path,
    stats_out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Collecting test data (parallel={})...", parallel);
    let report = run_experiment(config, parallel)?;

    write_table(timeseries_out, &report.timeseries)?;
    write_table(stats_out, &report.aggregates)?;

    let summary = &report.summary;
    println!("B={} m={}", summary.precision, summary.num_registers);
    println!("theory 1.04/sqrt(m) = {:.5}", summary.theoretical_error);
    println!("theory 1.30/sqrt(m) = {:.5}", summary.loglog_error);
    println!(
        "observed std/mean at N={}: HLL {:.5}, HLL++ {:.5}",
        config.stream_len, summary.observed_error, summary.observed_error_plus
    );
    println!("memory (standard): {} bytes", summary.memory_bytes);
    println!(
        "done: {}, {}",
        timeseries_out.display(),
        stats_out.display()
    );

    Ok(())
}
