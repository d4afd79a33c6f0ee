use crate::{BucketMap, ChunkMap, CompactionConfig, CompactionStats};

use static_assertions::const_assert_eq;
use stratum_core::{ChunkPosition, LocalPosition, CHUNK_VOLUME};

use std::collections::BTreeMap;

/// The per-chunk map of a [`LayeredMap`]: one 64-key bucket per 64 consecutive local indices.
pub type ChunkBuckets<T> = BucketMap<LocalPosition, T>;

/// A [`ChunkMap`] whose chunks are [`BucketMap`]s, so repeated values inside a chunk share storage.
pub type LayeredMap<T> = ChunkMap<T, ChunkBuckets<T>, BTreeMap<ChunkPosition, ChunkBuckets<T>>>;

pub const BUCKETS_PER_CHUNK: usize = CHUNK_VOLUME / u64::BITS as usize;

const_assert_eq!(BUCKETS_PER_CHUNK, 512);

impl<T> ChunkMap<T, ChunkBuckets<T>, BTreeMap<ChunkPosition, ChunkBuckets<T>>>
where
    T: Clone + Default + PartialEq,
{
    /// Runs [`BucketMap::maybe_compact`] on every chunk and sums up what was reclaimed.
    pub fn compact(&mut self, config: &CompactionConfig) -> CompactionStats {
        let mut total = CompactionStats::default();
        let mut compacted_chunks = 0;
        for buckets in self.chunks.values_mut() {
            if let Some(stats) = buckets.maybe_compact(config) {
                total += stats;
                compacted_chunks += 1;
            }
        }
        log::debug!(
            "compacted {} of {} chunks, {} value slots removed",
            compacted_chunks,
            self.chunks.len(),
            total.value_slots_removed()
        );
        total
    }

    /// The number of value slots across all chunks, including dead ones.
    pub fn value_slots(&self) -> usize {
        self.chunks.values().map(|b| b.value_slots()).sum()
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
