use serde::{Deserialize, Serialize};

/// Controls when [`BucketMap::maybe_compact`](crate::BucketMap::maybe_compact) rebuilds a value store.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct CompactionConfig {
    /// Compact once at least this fraction of the value slots is no longer referenced by any key.
    pub min_dead_ratio: f32,
    /// Also drop bit-planes that no longer hold any set bit.
    pub shrink_planes: bool,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            min_dead_ratio: 0.5,
            shrink_planes: true,
        }
    }
}
