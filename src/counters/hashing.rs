use std::hash::{BuildHasher, Hash};
use xxhash_rust::xxh64::Xxh64Builder;

/// Hash builder used by the sketches unless another one is supplied.
pub type DefaultHashBuilder = Xxh64Builder;

/// Salt mixed into a trial seed to derive that trial's hash seed.
pub const HASH_SEED_SALT: u64 = 0xABCDEF;

/// Seeded xxh64 builder for one trial.
pub fn seeded_builder(trial_seed: u64) -> DefaultHashBuilder {
    Xxh64Builder::new(trial_seed ^ HASH_SEED_SALT)
}

#[inline(always)]
pub fn hash_element<T: Hash + ?Sized, S: BuildHasher>(hasher: &S, item: &T) -> u64 {
    hasher.hash_one(item)
}
