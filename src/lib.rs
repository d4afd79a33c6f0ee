//! Deduplicating hierarchical maps for voxel data.
//!
//! The data model lives in two crates, re-exported here:
//!
//! - [`stratum_core`]: positions with Morton ordering, the bit-plane [`PackedArray`] and the [`Error`] type.
//! - [`stratum_map`]: [`BucketMap`], [`ChunkMap`], [`LayeredMap`] and the lazy set-algebra [`views`].
//!
//! [`shapes`] builds simple solids as layered maps, which is handy for trying out the set operations.

mod config;

pub mod shapes;

pub use config::Config;

pub use stratum_core::*;
pub use stratum_map::*;
