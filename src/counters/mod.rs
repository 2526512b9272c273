pub mod bias;
pub mod counter_base;
pub mod exact_counter;
pub mod hashing;
pub mod hll_counter;
pub mod registers;

pub use counter_base::Counter;
pub use exact_counter::ExactCounter;
pub use hashing::DefaultHashBuilder;
pub use hll_counter::{HLLCounter, Variant};
pub use registers::RegisterBank;

/// Smallest supported precision, `m = 16`.
pub const MIN_PRECISION: u8 = 4;
/// Largest supported precision, `m = 262144`.
pub const MAX_PRECISION: u8 = 18;
