use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-";
const MAX_STRING_LEN: usize = 30;
const FEISTEL_ROUNDS: usize = 4;

/// One stream element. Identity is value equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Element {
    Text(String),
    Int(u64),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamKind {
    /// Random strings of 1 to 30 characters; repeats are possible but rare.
    #[default]
    RandomStrings,
    /// `i ^ seed` for `i` in `0..len`, every element distinct.
    DistinctIntegers,
    /// Every value appears exactly twice, shuffled.
    Duplicated,
}

impl StreamKind {
    /// Upper bound on the distinct elements in a stream of `len` elements.
    pub fn max_distinct(self, len: u64) -> u64 {
        match self {
            StreamKind::Duplicated => len.div_ceil(2),
            _ => len,
        }
    }
}

/// Seeded bijection on `0..size`: a balanced Feistel network over the
/// smallest even bit width covering `size`, cycle-walked back into range.
struct Permutation {
    size: u64,
    half_bits: u32,
    keys: [u64; FEISTEL_ROUNDS],
}

impl Permutation {
    fn new(size: u64, rng: &mut StdRng) -> Self {
        let bits = std::cmp::max(2, 64 - size.saturating_sub(1).leading_zeros());
        let mut keys = [0u64; FEISTEL_ROUNDS];
        for key in keys.iter_mut() {
            *key = rng.next_u64();
        }
        Permutation {
            size,
            half_bits: bits.div_ceil(2),
            keys,
        }
    }

    fn encrypt(&self, x: u64) -> u64 {
        let mask = (1u64 << self.half_bits) - 1;
        let (mut left, mut right) = (x >> self.half_bits, x & mask);
        for &key in &self.keys {
            let mixed = left ^ (splitmix64(right ^ key) & mask);
            left = right;
            right = mixed;
        }
        (left << self.half_bits) | right
    }

    fn apply(&self, index: u64) -> u64 {
        let mut x = self.encrypt(index);
        while x >= self.size {
            x = self.encrypt(x);
        }
        x
    }
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// A finite, seeded stream of `len` elements, produced lazily.
///
/// Two generators built from the same kind, seed and length yield identical
/// sequences.
pub struct StreamGenerator {
    kind: StreamKind,
    seed: u64,
    len: u64,
    produced: u64,
    rng: StdRng,
    // Over `0..2 * ceil(len / 2)` slots; slot `j` carries value `j / 2`.
    slots: Option<Permutation>,
}

impl StreamGenerator {
    pub fn new(kind: StreamKind, seed: u64, len: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let slots = match kind {
            StreamKind::Duplicated if len > 0 => {
                Some(Permutation::new(len.div_ceil(2).saturating_mul(2), &mut rng))
            }
            _ => None,
        };
        StreamGenerator {
            kind,
            seed,
            len,
            produced: 0,
            rng,
            slots,
        }
    }

    /// A fresh generator replaying this stream from the start.
    pub fn restart(&self) -> Self {
        Self::new(self.kind, self.seed, self.len)
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// Upper bound on the distinct elements this stream can yield.
    pub fn max_distinct(&self) -> u64 {
        self.kind.max_distinct(self.len)
    }

    fn random_string(&mut self) -> String {
        let len = self.rng.gen_range(1..=MAX_STRING_LEN);
        (0..len)
            .map(|_| ALPHABET[self.rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

impl Iterator for StreamGenerator {
    type Item = Element;

    fn next(&mut self) -> Option<Element> {
        if self.produced >= self.len {
            return None;
        }
        let element = match (self.kind, &self.slots) {
            (StreamKind::RandomStrings, _) => Element::Text(self.random_string()),
            (StreamKind::Duplicated, Some(slots)) => {
                Element::Int((slots.apply(self.produced) / 2) ^ self.seed)
            }
            _ => Element::Int(self.produced ^ self.seed),
        };
        self.produced += 1;
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.len - self.produced) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for StreamGenerator {}
