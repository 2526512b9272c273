//! Empirical bias table for the HyperLogLog++ estimate.
//!
//! The table for a precision is produced once, by simulating many sketches
//! fed uniform 64-bit hashes and recording how far the mean raw estimate
//! sits from the true cardinality. Tables are cached for the lifetime of the
//! process and never mutated afterwards, so every trial on every thread reads
//! the same values.

use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::counters::hll_counter::alpha;
use crate::counters::registers::bucket_and_run_length;
use crate::counters::{MAX_PRECISION, MIN_PRECISION};

const CALIBRATION_SEED: u64 = 0x5EED_B1A5;
/// Sample points per table, spaced `m / SAMPLES_PER_REGISTER_SET` apart.
const SAMPLE_POINTS: usize = 48;
const SAMPLES_PER_REGISTER_SET: usize = 8;
const CHUNKS: usize = 64;
const MIN_REPETITIONS: usize = 32;
const UPDATE_BUDGET_LOG2: u32 = 20;

static TABLES: [OnceLock<BiasTable>; (MAX_PRECISION - MIN_PRECISION + 1) as usize] =
    [const { OnceLock::new() }; (MAX_PRECISION - MIN_PRECISION + 1) as usize];

#[derive(Clone, Debug)]
pub struct BiasTable {
    precision: u8,
    raw_estimates: Vec<f64>,
    biases: Vec<f64>,
}

/// Shared table for `precision`, calibrating it on first use.
///
/// Callers validate `precision` beforehand.
pub fn bias_table(precision: u8) -> &'static BiasTable {
    TABLES[(precision - MIN_PRECISION) as usize].get_or_init(|| BiasTable::calibrate(precision))
}

impl BiasTable {
    pub fn calibrate(precision: u8) -> Self {
        let m = 1usize << precision;
        let step = m / SAMPLES_PER_REGISTER_SET;
        let repetitions = std::cmp::max(MIN_REPETITIONS, (1usize << UPDATE_BUDGET_LOG2) >> precision);
        let per_chunk = repetitions.div_ceil(CHUNKS);

        // Chunks are reduced in index order so the table does not depend on
        // how rayon schedules them.
        let chunk_sums: Vec<Vec<f64>> = (0..CHUNKS)
            .into_par_iter()
            .map(|chunk| {
                let mut rng = StdRng::seed_from_u64(CALIBRATION_SEED.wrapping_add(chunk as u64));
                let mut sums = vec![0.0; SAMPLE_POINTS];
                for _ in 0..per_chunk {
                    simulate_sketch(precision, step, &mut rng, &mut sums);
                }
                sums
            })
            .collect();

        let total = (per_chunk * CHUNKS) as f64;
        let mut points: Vec<(f64, f64)> = (0..SAMPLE_POINTS)
            .map(|k| {
                let mean_raw = chunk_sums.iter().map(|sums| sums[k]).sum::<f64>() / total;
                let cardinality = ((k + 1) * step) as f64;
                (mean_raw, mean_raw - cardinality)
            })
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        debug!(
            precision,
            repetitions = per_chunk * CHUNKS,
            first_bias = points[0].1,
            "calibrated bias table"
        );

        BiasTable {
            precision,
            raw_estimates: points.iter().map(|p| p.0).collect(),
            biases: points.iter().map(|p| p.1).collect(),
        }
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn len(&self) -> usize {
        self.raw_estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_estimates.is_empty()
    }

    /// Largest raw estimate covered by calibration.
    pub fn max_raw_estimate(&self) -> f64 {
        self.raw_estimates.last().copied().unwrap_or(0.0)
    }

    /// Expected bias of a raw estimate, linearly interpolated between the two
    /// neighbouring calibration points and clamped at both ends.
    pub fn bias(&self, raw_estimate: f64) -> f64 {
        let (Some(&first), Some(&last)) = (self.raw_estimates.first(), self.raw_estimates.last())
        else {
            return 0.0;
        };
        if raw_estimate <= first {
            return self.biases[0];
        }
        if raw_estimate >= last {
            return self.biases[self.biases.len() - 1];
        }

        let pos = self.raw_estimates.partition_point(|&e| e < raw_estimate);
        let (e1, e2) = (self.raw_estimates[pos - 1], self.raw_estimates[pos]);
        if e2 == e1 {
            return self.biases[pos];
        }
        let c = (raw_estimate - e1) / (e2 - e1);
        self.biases[pos - 1] * (1.0 - c) + self.biases[pos] * c
    }
}

/// Feeds one simulated sketch `SAMPLE_POINTS * step` uniform hashes,
/// accumulating its raw estimate at every sample point into `sums`.
fn simulate_sketch(precision: u8, step: usize, rng: &mut StdRng, sums: &mut [f64]) {
    let m = 1usize << precision;
    let numerator = alpha(m) * (m * m) as f64;
    let mut registers = vec![0u8; m];
    // Kept incrementally: recomputing it at every sample would dominate.
    let mut harmonic_sum = m as f64;

    for sum in sums.iter_mut() {
        for _ in 0..step {
            let (index, run_length) = bucket_and_run_length(rng.next_u64(), precision, 64);
            let reg = registers[index];
            if run_length > reg {
                harmonic_sum += 2f64.powi(-(run_length as i32)) - 2f64.powi(-(reg as i32));
                registers[index] = run_length;
            }
        }
        *sum += numerator / harmonic_sum;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(raw: &[f64], bias: &[f64]) -> BiasTable {
        BiasTable {
            precision: 4,
            raw_estimates: raw.to_vec(),
            biases: bias.to_vec(),
        }
    }

    #[test]
    fn interpolates_between_points() {
        let t = table(&[10.0, 20.0, 30.0], &[4.0, 2.0, 0.0]);
        assert_eq!(t.bias(15.0), 3.0);
        assert_eq!(t.bias(20.0), 2.0);
        assert_eq!(t.bias(27.5), 0.5);
    }

    #[test]
    fn clamps_outside_range() {
        let t = table(&[10.0, 20.0], &[4.0, 2.0]);
        assert_eq!(t.bias(1.0), 4.0);
        assert_eq!(t.bias(1000.0), 2.0);
    }

    #[test]
    fn calibration_is_reproducible() {
        let a = BiasTable::calibrate(5);
        let b = BiasTable::calibrate(5);
        assert_eq!(a.raw_estimates, b.raw_estimates);
        assert_eq!(a.biases, b.biases);
    }

    #[test]
    fn calibration_covers_bias_correction_range() {
        let t = bias_table(6);
        assert_eq!(t.precision(), 6);
        assert_eq!(t.len(), SAMPLE_POINTS);
        assert!(t.max_raw_estimate() > 5.0 * 64.0);
        assert!(t.raw_estimates.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn raw_estimate_overshoots_at_small_cardinality() {
        // The raw estimate never drops below alpha * m, so at n = m/8 the
        // bias must be large and positive.
        let t = bias_table(8);
        let m = 256.0;
        assert!(t.biases[0] > 0.3 * m, "bias {}", t.biases[0]);
    }

    #[test]
    fn shared_table_is_initialised_once() {
        assert!(std::ptr::eq(bias_table(7), bias_table(7)));
    }
}
