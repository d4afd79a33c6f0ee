//! Voxel coordinates.
//!
//! A [`GlobalPosition`] names a single voxel in the world. It splits into the [`ChunkPosition`] of the 32³ chunk that
//! contains it and the [`LocalPosition`] of the voxel inside that chunk.
//!
//! All three types are totally ordered by their Morton code. Interleaving keeps the chunk bits above the local bits, so
//! `morton(g) == morton(chunk) << 15 | morton(local)`, and visiting chunks in order and then the locals of each chunk
//! in order is the same as visiting global positions in order.

use morton_encoding::{morton_decode, morton_encode};
use static_assertions::const_assert_eq;
use std::cmp::Ordering;
use std::ops::Add;

pub const CHUNK_EDGE_LOG2: u32 = 5;
pub const CHUNK_EDGE: u32 = 1 << CHUNK_EDGE_LOG2;
pub const LOCAL_MASK: u32 = CHUNK_EDGE - 1;
/// Number of voxels in one chunk.
pub const CHUNK_VOLUME: usize = (CHUNK_EDGE * CHUNK_EDGE * CHUNK_EDGE) as usize;

const_assert_eq!(CHUNK_VOLUME, 32768);
const_assert_eq!(CHUNK_VOLUME, 1 << (3 * CHUNK_EDGE_LOG2));

/// Interleaves the bits of three coordinates. Only the low 96 bits of the result are used.
#[inline]
pub fn morton3(p: [u32; 3]) -> u128 {
    morton_encode(p)
}

/// Inverse of [`morton3`].
#[inline]
pub fn morton3_decode(code: u128) -> [u32; 3] {
    morton_decode::<u32, 3>(code)
}

macro_rules! def_position {
    ($t: ident, $doc: expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
        pub struct $t {
            pub x: u32,
            pub y: u32,
            pub z: u32,
        }

        impl $t {
            pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

            #[inline]
            pub const fn new(x: u32, y: u32, z: u32) -> Self {
                Self { x, y, z }
            }

            #[inline]
            pub const fn to_array(self) -> [u32; 3] {
                [self.x, self.y, self.z]
            }

            /// The Morton (Z-order) code of this position. This is the order used by [`Ord`].
            #[inline]
            pub fn morton(self) -> u128 {
                morton3(self.to_array())
            }

            #[inline]
            pub fn from_morton(code: u128) -> Self {
                Self::from(morton3_decode(code))
            }
        }

        impl From<[u32; 3]> for $t {
            #[inline]
            fn from([x, y, z]: [u32; 3]) -> Self {
                Self { x, y, z }
            }
        }

        impl From<$t> for [u32; 3] {
            #[inline]
            fn from(p: $t) -> Self {
                p.to_array()
            }
        }

        impl Ord for $t {
            #[inline]
            fn cmp(&self, other: &Self) -> Ordering {
                self.morton().cmp(&other.morton())
            }
        }

        impl PartialOrd for $t {
            #[inline]
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }
    };
}

def_position!(GlobalPosition, "The position of a single voxel in the world.");
def_position!(ChunkPosition, "The coordinates of a 32³ chunk, i.e. a [`GlobalPosition`] shifted right by 5 bits.");
def_position!(LocalPosition, "The position of a voxel inside of its chunk. Every component is less than 32.");

impl GlobalPosition {
    /// Reassembles the global position from its chunk and local parts.
    #[inline]
    pub const fn from_parts(chunk: ChunkPosition, local: LocalPosition) -> Self {
        Self {
            x: (chunk.x << CHUNK_EDGE_LOG2) | local.x,
            y: (chunk.y << CHUNK_EDGE_LOG2) | local.y,
            z: (chunk.z << CHUNK_EDGE_LOG2) | local.z,
        }
    }

    #[inline]
    pub fn split(self) -> (ChunkPosition, LocalPosition) {
        (ChunkPosition::from(self), LocalPosition::from(self))
    }

    #[inline]
    pub fn chunk(self) -> ChunkPosition {
        ChunkPosition::from(self)
    }

    #[inline]
    pub fn local(self) -> LocalPosition {
        LocalPosition::from(self)
    }
}

impl Add for GlobalPosition {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl From<GlobalPosition> for ChunkPosition {
    #[inline]
    fn from(p: GlobalPosition) -> Self {
        Self::new(
            p.x >> CHUNK_EDGE_LOG2,
            p.y >> CHUNK_EDGE_LOG2,
            p.z >> CHUNK_EDGE_LOG2,
        )
    }
}

impl ChunkPosition {
    /// The minimum global position covered by this chunk.
    #[inline]
    pub const fn chunk_min(self) -> GlobalPosition {
        GlobalPosition::from_parts(self, LocalPosition::ZERO)
    }
}

impl From<GlobalPosition> for LocalPosition {
    #[inline]
    fn from(p: GlobalPosition) -> Self {
        Self::new(p.x & LOCAL_MASK, p.y & LOCAL_MASK, p.z & LOCAL_MASK)
    }
}

impl LocalPosition {
    /// Linear index in `0..CHUNK_VOLUME`, which is the Morton code of the position.
    #[inline]
    pub fn index(self) -> usize {
        debug_assert!(self.x <= LOCAL_MASK && self.y <= LOCAL_MASK && self.z <= LOCAL_MASK);
        self.morton() as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Self {
        debug_assert!(index < CHUNK_VOLUME);
        Self::from_morton(index as u128)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    const SAMPLES: [GlobalPosition; 6] = [
        GlobalPosition::new(0, 0, 0),
        GlobalPosition::new(31, 31, 31),
        GlobalPosition::new(32, 0, 5),
        GlobalPosition::new(100, 7, 64),
        GlobalPosition::new(1 << 20, 3, (1 << 31) + 17),
        GlobalPosition::new(u32::MAX, u32::MAX, u32::MAX),
    ];

    #[test]
    fn split_then_combine_is_identity() {
        for p in SAMPLES {
            let (chunk, local) = p.split();
            assert!(local.x < CHUNK_EDGE && local.y < CHUNK_EDGE && local.z < CHUNK_EDGE);
            assert_eq!(GlobalPosition::from_parts(chunk, local), p);
        }
    }

    #[test]
    fn global_morton_is_chunk_major() {
        for p in SAMPLES {
            let (chunk, local) = p.split();
            assert_eq!(p.morton(), (chunk.morton() << 15) | local.morton());
        }
    }

    #[test]
    fn morton_round_trips() {
        for p in SAMPLES {
            assert_eq!(GlobalPosition::from_morton(p.morton()), p);
        }
    }

    #[test]
    fn local_index_covers_chunk() {
        let mut seen = vec![false; CHUNK_VOLUME];
        for x in 0..CHUNK_EDGE {
            for y in 0..CHUNK_EDGE {
                for z in 0..CHUNK_EDGE {
                    let p = LocalPosition::new(x, y, z);
                    let i = p.index();
                    assert!(!seen[i], "index {} produced twice", i);
                    seen[i] = true;
                    assert_eq!(LocalPosition::from_index(i), p);
                }
            }
        }
        assert!(seen.into_iter().all(|s| s));
    }

    #[test]
    fn order_follows_morton_code() {
        let mut sorted = SAMPLES.to_vec();
        sorted.reverse();
        sorted.sort();
        for w in sorted.windows(2) {
            assert!(w[0].morton() < w[1].morton());
        }
        // The origin is the least position, and every chunk sorts before the chunk whose minimum lies above it.
        assert_eq!(sorted[0], GlobalPosition::ZERO);
        assert!(GlobalPosition::new(31, 31, 31) < GlobalPosition::new(32, 0, 0));
    }

    #[test]
    fn chunk_min_is_aligned() {
        let chunk = GlobalPosition::new(100, 7, 64).chunk();
        assert_eq!(chunk, ChunkPosition::new(3, 0, 2));
        assert_eq!(chunk.chunk_min(), GlobalPosition::new(96, 0, 64));
        assert_eq!(chunk.chunk_min().local(), LocalPosition::ZERO);
    }
}
