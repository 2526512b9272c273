use crate::counters::bias::{BiasTable, bias_table};
use crate::counters::hashing::{DefaultHashBuilder, hash_element};
use crate::counters::registers::{RegisterBank, bucket_and_run_length};
use crate::counters::{Counter, MAX_PRECISION, MIN_PRECISION};
use crate::error::{Error, Result};
use std::hash::{BuildHasher, Hash};

const AM_4: f64 = 0.673;
const AM_5: f64 = 0.697;
const AM_6: f64 = 0.709;

const TWO_32: f64 = 4_294_967_296.0;

/// Which estimation formula a sketch applies on top of its registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Flajolet et al. HyperLogLog over a 32-bit hash, with linear counting
    /// for small ranges and the `2^32` large-range correction.
    Classic,
    /// HyperLogLog++: full 64-bit hash, and the raw estimate is corrected by
    /// an empirical bias table up to `5m` instead of being used as is.
    Plus,
}

impl Variant {
    /// Hash bits consumed per element.
    pub fn hash_width(self) -> u32 {
        match self {
            Variant::Classic => 32,
            Variant::Plus => 64,
        }
    }
}

/// Bias correction constant `alpha_m` for `m` registers.
pub fn alpha(num_registers: usize) -> f64 {
    match num_registers {
        0..=16 => AM_4,
        32 => AM_5,
        64 => AM_6,
        _ => 0.7213 / (1.0 + 1.079 / num_registers as f64),
    }
}

/// Theoretical relative standard error of HyperLogLog with `m` registers.
pub fn relative_standard_error(num_registers: usize) -> f64 {
    1.04 / (num_registers as f64).sqrt()
}

/// Same quantity for the older LogLog estimator, for comparison.
pub fn loglog_relative_standard_error(num_registers: usize) -> f64 {
    1.30 / (num_registers as f64).sqrt()
}

pub struct HLLCounter<S = DefaultHashBuilder> {
    variant: Variant,
    am: f64,
    registers: RegisterBank,
    bias: Option<&'static BiasTable>,
    hasher: S,
}

impl HLLCounter<DefaultHashBuilder> {
    pub fn classic(precision: u8) -> Result<Self> {
        Self::with_hasher(precision, Variant::Classic, DefaultHashBuilder::default())
    }

    pub fn plus(precision: u8) -> Result<Self> {
        Self::with_hasher(precision, Variant::Plus, DefaultHashBuilder::default())
    }
}

impl<S: BuildHasher> HLLCounter<S> {
    /// Builds an empty sketch with `2^precision` registers.
    ///
    /// For [`Variant::Plus`] this may calibrate the shared bias table for
    /// `precision` if no other sketch has needed it yet.
    pub fn with_hasher(precision: u8, variant: Variant, hasher: S) -> Result<Self> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(Error::InvalidPrecision(precision));
        }
        let bias = match variant {
            Variant::Classic => None,
            Variant::Plus => Some(bias_table(precision)),
        };
        Ok(HLLCounter {
            variant,
            am: alpha(1 << precision),
            registers: RegisterBank::new(precision),
            bias,
            hasher,
        })
    }

    // Some specialized high-performance methods
    #[inline(always)]
    pub fn add_u64(&mut self, item: u64) {
        let hash = hash_element(&self.hasher, &item);
        self.add_hash(hash);
    }

    #[inline(always)]
    pub fn add_hash(&mut self, hash: u64) {
        let (index, run_length) =
            bucket_and_run_length(hash, self.registers.precision(), self.variant.hash_width());
        self.registers.update(index, run_length);
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn precision(&self) -> u8 {
        self.registers.precision()
    }

    pub fn num_registers(&self) -> usize {
        self.registers.len()
    }

    pub fn registers(&self) -> &[u8] {
        self.registers.snapshot()
    }

    /// Bytes of register storage, one per register.
    pub fn memory_bytes(&self) -> usize {
        self.registers.len() * std::mem::size_of::<u8>()
    }

    /// Uncorrected harmonic-mean estimate `alpha_m * m^2 / sum(2^-reg)`.
    pub fn raw_estimate(&self) -> f64 {
        let num_registers = self.registers.len() as f64;
        self.am * num_registers * num_registers / self.registers.harmonic_sum()
    }

    pub fn merge(&mut self, other: &HLLCounter<S>) -> Result<()> {
        if self.variant != other.variant || self.precision() != other.precision() {
            return Err(Error::IncompatibleMerge(format!(
                "{:?}/{} vs {:?}/{}",
                self.variant,
                self.precision(),
                other.variant,
                other.precision()
            )));
        }
        self.registers.merge(&other.registers);
        Ok(())
    }

    /// Current cardinality estimate under this sketch's variant.
    ///
    /// Never decreases as elements are added while the sketch stays in one
    /// regime (linear counting, bias-corrected, raw or large-range). It can
    /// step down where the formula switches, for example when the raw
    /// estimate first exceeds `2.5m` and linear counting is abandoned.
    pub fn estimate(&self) -> f64 {
        match self.bias {
            Some(bias) => self.plus_estimate(bias),
            None => self.classic_estimate(),
        }
    }

    fn classic_estimate(&self) -> f64 {
        let num_registers = self.registers.len() as f64;
        let mut estimate = self.raw_estimate();

        // Small range correction
        if estimate <= 2.5 * num_registers {
            let zeros = self.registers.zeros();
            if zeros > 0 {
                estimate = num_registers * (num_registers / zeros as f64).ln();
            }
        } else if estimate > TWO_32 / 30.0 && estimate < TWO_32 {
            estimate = -TWO_32 * (1.0 - estimate / TWO_32).ln();
        }

        estimate
    }

    fn plus_estimate(&self, bias: &BiasTable) -> f64 {
        let num_registers = self.registers.len() as f64;
        let raw = self.raw_estimate();

        if raw <= 2.5 * num_registers {
            let zeros = self.registers.zeros();
            if zeros > 0 {
                return num_registers * (num_registers / zeros as f64).ln();
            }
        }

        if raw <= 5.0 * num_registers {
            (raw - bias.bias(raw)).max(0.0)
        } else {
            raw
        }
    }
}

impl<T: Hash + ?Sized, S: BuildHasher> Counter<T> for HLLCounter<S> {
    fn add(&mut self, item: &T) {
        let hash = hash_element(&self.hasher, item);
        self.add_hash(hash);
    }

    fn estimate(&self) -> f64 {
        HLLCounter::estimate(self)
    }
}
