//! Open-addressing hash table over power-of-two slot arrays.
//!
//! Keys and values live in parallel arrays guarded by an occupancy bitmap.
//! Collisions are resolved by a full-period probe sequence, and the table
//! rebuilds itself at twice the size once occupancy crosses its load factor.
//! Entries are never removed.
//!
//! ```
//! use probetable::HashTable;
//!
//! let mut table = HashTable::new();
//! for word in "the quick brown fox jumps over the lazy dog".split(' ') {
//!     table.update_with_default(word, 0, |n| n + 1);
//! }
//!
//! assert_eq!(table.get_or_default("the", 0), 2);
//! assert_eq!(table.get_or_default("cat", 0), 0);
//! ```

mod comparisons;
mod config;
mod iter;
pub mod probe;
mod slot;
mod table;
#[cfg(test)]
mod test_util;

pub use config::{MAX_SIZE_EXPONENT, ProbeStrategy, TableConfig};
pub use iter::{Cursor, IntoIter, Iter, IterMut, Keys, Values};
pub use table::HashTable;

/// Hash builder used when none is supplied.
pub type DefaultHashBuilder = foldhash::fast::RandomState;

pub const DEFAULT_SIZE_EXPONENT: u32 = 5;
pub const DEFAULT_LOAD_FACTOR: f64 = 0.6;
pub const DEFAULT_GROWTH_STEP: u32 = 1;
pub const DEFAULT_STRIDE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("size exponent {exponent} exceeds maximum {max}")]
    SizeExponentTooLarge { exponent: u32, max: u32 },
    #[error("load factor {0} must lie strictly between 0 and 1")]
    InvalidLoadFactor(f64),
    #[error("growth step must be at least 1")]
    ZeroGrowthStep,
    #[error("growth step {step} from size exponent {size_exponent} exceeds maximum {max}")]
    GrowthStepTooLarge { step: u32, size_exponent: u32, max: u32 },
    #[error("probe stride {0} must be odd")]
    EvenStride(usize),
    #[error("{0:?} probing does not visit every slot")]
    PartialCoverage(ProbeStrategy),
}
