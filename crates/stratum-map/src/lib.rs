//! The stratum map data model.
//!
//! # Bucket Maps
//!
//! A [`BucketMap`] stores values for integer-like keys. Keys are grouped into buckets of 64, and every bucket is a
//! bit-plane [`PackedArray`](stratum_core::PackedArray) of [`PaletteId`]s into a shared value store. Equal values
//! written into the same bucket share one id, so a bucket of 64 identical values costs one word of ids.
//!
//! # Chunk Maps
//!
//! A [`ChunkMap`] splits every [`GlobalPosition`](stratum_core::GlobalPosition) into a chunk position and a local
//! position and keeps one inner map per occupied chunk. Any [`OrderedMap`] can serve as either level. The
//! [`LayeredMap`] uses a [`BucketMap`] per chunk, so a chunk of 32³ voxels is 512 buckets.
//!
//! # Set Algebra
//!
//! [`SetView`]s combine two sorted sequences lazily: [`SetOp::Overlap`] (intersection), [`SetOp::Subtract`]
//! (difference), [`SetOp::Merge`] (union) and [`SetOp::Exclusive`] (symmetric difference). Maps take part
//! with `&a | views::merge(&b)`.

mod bucket_map;
mod chunk_map;
mod config;
mod key;
mod layered_map;
mod ordered_map;
mod palette;
mod set_view;

pub use bucket_map::{BucketMap, BucketPairView, CompactionStats, Iter as BucketMapIter, Node, Nodes, SlotMut};
pub use chunk_map::{ChunkMap, Iter as ChunkMapIter, PairView};
pub use config::*;
pub use key::*;
pub use layered_map::*;
pub use ordered_map::*;
pub use palette::*;
pub use set_view::*;
