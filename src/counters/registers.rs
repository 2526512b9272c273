/// `m = 2^precision` registers, each holding the longest run length seen
/// for its bucket. Registers only ever grow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterBank {
    precision: u8,
    registers: Vec<u8>,
}

impl RegisterBank {
    pub fn new(precision: u8) -> Self {
        RegisterBank {
            precision,
            registers: vec![u8::MIN; 1 << precision],
        }
    }

    #[inline(always)]
    pub fn update(&mut self, index: usize, run_length: u8) {
        let reg = &mut self.registers[index];
        *reg = std::cmp::max(*reg, run_length);
    }

    pub fn snapshot(&self) -> &[u8] {
        &self.registers
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    pub fn zeros(&self) -> usize {
        self.registers.iter().filter(|&&reg| reg == 0).count()
    }

    /// Sum of `2^-register` over the bank, the denominator of the raw
    /// estimate.
    pub fn harmonic_sum(&self) -> f64 {
        self.registers
            .iter()
            .map(|&reg| 2f64.powi(-(reg as i32)))
            .sum()
    }

    /// Register-wise maximum with `other`. Callers check the precisions match.
    pub fn merge(&mut self, other: &RegisterBank) {
        for (reg_self, reg_other) in self.registers.iter_mut().zip(other.registers.iter()) {
            *reg_self = std::cmp::max(*reg_self, *reg_other);
        }
    }
}

/// Splits a hash into `(bucket, run_length)` using only the low `width` bits.
///
/// The bucket is the low `precision` bits; the run length is the count of
/// leading zeros in the remaining `width - precision` bits plus one, which
/// reaches `width - precision + 1` when those bits are all zero.
#[inline(always)]
pub fn bucket_and_run_length(hash: u64, precision: u8, width: u32) -> (usize, u8) {
    let hash = if width < 64 {
        hash & ((1u64 << width) - 1)
    } else {
        hash
    };
    let index = (hash & ((1u64 << precision) - 1)) as usize;
    let remainder = hash >> precision;
    // `remainder` occupies the low `width - precision` bits.
    let unused = 64 - width + precision as u32;
    let run_length = remainder.leading_zeros() - unused + 1;
    (index, run_length as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn starts_at_zero() {
        let bank = RegisterBank::new(4);
        assert_eq!(bank.len(), 16);
        assert_eq!(bank.zeros(), 16);
        assert_eq!(bank.harmonic_sum(), 16.0);
    }

    #[test]
    fn update_keeps_maximum() {
        let mut bank = RegisterBank::new(4);
        bank.update(3, 5);
        bank.update(3, 2);
        assert_eq!(bank.snapshot()[3], 5);
        bank.update(3, 7);
        assert_eq!(bank.snapshot()[3], 7);
        assert_eq!(bank.zeros(), 15);
    }

    #[test]
    fn merge_takes_registerwise_max() {
        let mut a = RegisterBank::new(4);
        let mut b = RegisterBank::new(4);
        a.update(0, 3);
        a.update(1, 1);
        b.update(0, 1);
        b.update(2, 4);
        a.merge(&b);
        assert_eq!(&a.snapshot()[..3], &[3, 1, 4]);
    }

    // bucket = low 4 bits, remaining bits counted from the top of `width`
    #[test_case(0x0000_0000_0000_0003, 64 => (3, 61); "zero remainder saturates")]
    #[test_case(0x8000_0000_0000_0005, 64 => (5, 1); "top bit set")]
    #[test_case(0x0000_0001_0000_0002, 64 => (2, 32); "bit 32 set")]
    #[test_case(0x0000_0000_0000_0003, 32 => (3, 29); "narrow zero remainder saturates")]
    #[test_case(0x0000_0000_8000_0001, 32 => (1, 1); "narrow top bit set")]
    #[test_case(0xFFFF_FFFF_0000_0001, 32 => (1, 29); "narrow ignores upper half")]
    fn splits_hash(hash: u64, width: u32) -> (usize, u8) {
        bucket_and_run_length(hash, 4, width)
    }
}
