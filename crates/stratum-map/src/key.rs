use stratum_core::LocalPosition;

use std::fmt::Debug;

/// A key that converts losslessly to and from an unsigned index. The order of keys must agree with the order of their
/// indices, since maps iterate keys by ascending index.
pub trait MapKey: Copy + Debug + Ord {
    fn to_index(self) -> usize;
    fn from_index(index: usize) -> Self;
}

macro_rules! impl_map_key {
    ($($t:ty),*) => {$(
        impl MapKey for $t {
            #[inline]
            fn to_index(self) -> usize {
                self as usize
            }

            #[inline]
            fn from_index(index: usize) -> Self {
                index as $t
            }
        }
    )*};
}

impl_map_key!(u8, u16, u32, u64, usize);

impl MapKey for LocalPosition {
    #[inline]
    fn to_index(self) -> usize {
        self.index()
    }

    #[inline]
    fn from_index(index: usize) -> Self {
        // Inherent constructor; it checks `index < CHUNK_VOLUME` in debug builds.
        LocalPosition::from_index(index)
    }
}
