//! Building blocks shared by the stratum maps.
//!
//! - [`position`]: global, chunk, and local voxel coordinates, all ordered by their Morton (Z-order) code.
//! - [`bitplane`]: a fixed-length integer array stored as a stack of bit-planes.
//! - [`error`]: the error type returned by the throwing accessors.

pub mod bitplane;
pub mod error;
pub mod position;

pub use bitplane::*;
pub use error::*;
pub use position::*;

use ahash::AHashMap;
pub type SmallKeyHashMap<K, V> = AHashMap<K, V>;

// Re-exports.
pub use smallvec;
pub use static_assertions;
