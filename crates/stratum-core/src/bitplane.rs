use crate::{Error, Result};

use smallvec::SmallVec;
use std::fmt::Debug;
use std::marker::PhantomData;

/// An unsigned integer used as one bit-plane of a [`PackedArray`]. Bit `i` of the word belongs to slot `i`.
pub trait PlaneWord: Copy + Debug + Eq {
    const BITS: usize;
    const ZERO: Self;

    /// A word with only bit `i` set.
    fn bit(i: usize) -> Self;
    /// A word with bits `i..BITS` set.
    fn bits_from(i: usize) -> Self;
    fn test(self, i: usize) -> bool;
    fn with_bit(self, i: usize, value: bool) -> Self;
    fn union(self, other: Self) -> Self;
    fn intersection(self, other: Self) -> Self;
    fn count_ones(self) -> u32;
    fn lowest_one(self) -> Option<usize>;
    fn without_lowest_one(self) -> Self;

    #[inline]
    fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    /// Iterates the indices of the set bits in ascending order.
    #[inline]
    fn ones(self) -> Ones<Self> {
        Ones(self)
    }
}

macro_rules! impl_plane_word {
    ($($t:ty),*) => {$(
        impl PlaneWord for $t {
            const BITS: usize = <$t>::BITS as usize;
            const ZERO: Self = 0;

            #[inline]
            fn bit(i: usize) -> Self {
                1 << i
            }

            #[inline]
            fn bits_from(i: usize) -> Self {
                if i >= <Self as PlaneWord>::BITS { 0 } else { <$t>::MAX << i }
            }

            #[inline]
            fn test(self, i: usize) -> bool {
                (self >> i) & 1 == 1
            }

            #[inline]
            fn with_bit(self, i: usize, value: bool) -> Self {
                if value { self | (1 << i) } else { self & !(1 << i) }
            }

            #[inline]
            fn union(self, other: Self) -> Self {
                self | other
            }

            #[inline]
            fn intersection(self, other: Self) -> Self {
                self & other
            }

            #[inline]
            fn count_ones(self) -> u32 {
                <$t>::count_ones(self)
            }

            #[inline]
            fn lowest_one(self) -> Option<usize> {
                (self != 0).then(|| self.trailing_zeros() as usize)
            }

            #[inline]
            fn without_lowest_one(self) -> Self {
                self & self.wrapping_sub(1)
            }
        }
    )*};
}

impl_plane_word!(u8, u16, u32, u64, u128);

/// Iterator over the set bits of a [`PlaneWord`].
#[derive(Clone, Copy, Debug)]
pub struct Ones<W>(W);

impl<W: PlaneWord> Iterator for Ones<W> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        let i = self.0.lowest_one()?;
        self.0 = self.0.without_lowest_one();
        Some(i)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

/// A fixed-width integer that can be stored in a [`PackedArray`]. Signed types are stored by their two's complement
/// bits, so a negative value occupies every plane.
pub trait PackedInt: Copy + Debug + Eq {
    const BITS: u32;

    fn to_bits(self) -> u128;
    fn from_bits(bits: u128) -> Self;
}

macro_rules! impl_packed_int {
    ($($t:ty => $u:ty),*) => {$(
        impl PackedInt for $t {
            const BITS: u32 = <$t>::BITS;

            #[inline]
            fn to_bits(self) -> u128 {
                self as $u as u128
            }

            #[inline]
            fn from_bits(bits: u128) -> Self {
                bits as $u as $t
            }
        }
    )*};
}

impl_packed_int!(
    u8 => u8, u16 => u16, u32 => u32, u64 => u64, usize => usize,
    i8 => u8, i16 => u16, i32 => u32, i64 => u64, isize => usize
);

/// An array of `W::BITS` integers stored as a stack of bit-planes.
///
/// The length is tied to the plane word: `u8` planes give 8 slots, `u128` planes give 128. Longer sequences are split
/// over several arrays, one per bucket of `W::BITS` keys.
///
/// Plane `b` holds bit `b` of every slot, so reading or writing a slot costs one word operation per plane. The number
/// of planes is the bit width of the largest value ever written. Planes are never dropped implicitly, even when the
/// widest value is overwritten; call [`PackedArray::shrink_to_fit`] to rescan and trim them.
#[derive(Clone, Debug)]
pub struct PackedArray<T, W = u64> {
    planes: SmallVec<[W; 8]>,
    marker: PhantomData<T>,
}

impl<T, W> Default for PackedArray<T, W> {
    fn default() -> Self {
        Self {
            planes: SmallVec::new(),
            marker: PhantomData,
        }
    }
}

impl<T: PackedInt, W: PlaneWord> PackedArray<T, W> {
    pub const LEN: usize = W::BITS;

    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub const fn len(&self) -> usize {
        Self::LEN
    }

    /// Always false; the length is fixed.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Reads slot `i`. `i` must be less than `W::BITS`.
    #[inline]
    pub fn get(&self, i: usize) -> T {
        debug_assert!(i < W::BITS);
        let mut bits = 0u128;
        for (b, plane) in self.planes.iter().enumerate() {
            if plane.test(i) {
                bits |= 1 << b;
            }
        }
        T::from_bits(bits)
    }

    /// Bounds-checked [`PackedArray::get`].
    pub fn at(&self, i: usize) -> Result<T> {
        if i >= W::BITS {
            return Err(Error::OutOfRange {
                index: i,
                len: W::BITS,
            });
        }
        Ok(self.get(i))
    }

    /// Writes slot `i`, adding planes if `value` is wider than any value written so far. `i` must be less than
    /// `W::BITS`.
    #[inline]
    pub fn set(&mut self, i: usize, value: T) {
        debug_assert!(i < W::BITS);
        let bits = value.to_bits();
        let needed = (u128::BITS - bits.leading_zeros()) as usize;
        if needed > self.planes.len() {
            self.planes.resize(needed, W::ZERO);
        }
        for (b, plane) in self.planes.iter_mut().enumerate() {
            *plane = plane.with_bit(i, (bits >> b) & 1 == 1);
        }
    }

    /// Mask of the slots holding a nonzero value.
    #[inline]
    pub fn occupied(&self) -> W {
        self.planes
            .iter()
            .fold(W::ZERO, |acc, &plane| acc.union(plane))
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..W::BITS).map(move |i| self.get(i))
    }

    /// Groups the nonzero slots by value. Each entry is a value and the mask of slots holding it, ordered by value
    /// bits.
    pub fn groups(&self) -> SmallVec<[(T, W); 8]> {
        let mut groups: SmallVec<[(T, W); 8]> = SmallVec::new();
        for slot in self.occupied().ones() {
            let value = self.get(slot);
            match groups.iter_mut().find(|(v, _)| *v == value) {
                Some((_, mask)) => *mask = mask.union(W::bit(slot)),
                None => groups.push((value, W::bit(slot))),
            }
        }
        groups.sort_unstable_by_key(|(v, _)| v.to_bits());
        groups
    }

    /// Drops the high planes that no slot uses anymore. Returns the number of planes removed.
    pub fn shrink_to_fit(&mut self) -> usize {
        let before = self.planes.len();
        while self.planes.last().map_or(false, |p| p.is_zero()) {
            self.planes.pop();
        }
        self.planes.shrink_to_fit();
        before - self.planes.len()
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

    #[test]
    fn length_follows_plane_word() {
        assert_eq!(PackedArray::<u8, u8>::LEN, 8);
        assert_eq!(PackedArray::<u32, u128>::LEN, 128);

        let mut a = PackedArray::<u16, u16>::new();
        assert_eq!(a.len(), 16);
        a.set(15, 3);
        assert_eq!(a.at(15), Ok(3));
        assert_eq!(a.at(16), Err(Error::OutOfRange { index: 16, len: 16 }));
    }

    #[test]
    fn set_and_get_values() {
        let mut a = PackedArray::<i32>::new();
        a.set(0, 1);
        a.set(1, 4);
        a.set(1, 5);
        a.set(3, 42);
        assert_eq!(a.get(0), 1);
        assert_eq!(a.get(1), 5);
        assert_eq!(a.get(2), 0);
        assert_eq!(a.get(3), 42);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn iterate_values() {
        let mut a = PackedArray::<u32>::new();
        for i in 0..4 {
            a.set(i, i as u32 * 2);
        }
        let values: Vec<u32> = a.iter().take(5).collect();
        assert_eq!(values, [0, 2, 4, 6, 0]);
    }

    #[test]
    fn planes_grow_but_never_shrink_implicitly() {
        let mut a = PackedArray::<u32, u16>::new();
        assert_eq!(a.plane_count(), 0);
        a.set(2, 3);
        assert_eq!(a.plane_count(), 2);
        a.set(5, 1000);
        assert_eq!(a.plane_count(), 10);

        // Overwriting the widest value keeps the planes.
        a.set(5, 1);
        assert_eq!(a.plane_count(), 10);
        assert_eq!(a.get(5), 1);
        assert_eq!(a.get(2), 3);

        assert_eq!(a.shrink_to_fit(), 8);
        assert_eq!(a.plane_count(), 2);
        assert_eq!(a.get(5), 1);
        assert_eq!(a.get(2), 3);
    }

    #[test]
    fn signed_values_use_every_plane() {
        let mut a = PackedArray::<i8, u8>::new();
        a.set(7, -1);
        assert_eq!(a.plane_count(), 8);
        assert_eq!(a.get(7), -1);
        a.set(6, -128);
        assert_eq!(a.get(6), -128);
        assert_eq!(a.get(0), 0);
    }

    #[test]
    fn checked_access() {
        let a = PackedArray::<u8, u32>::new();
        assert_eq!(a.at(31), Ok(0));
        assert_eq!(a.at(32), Err(Error::OutOfRange { index: 32, len: 32 }));
    }

    #[test]
    fn occupied_and_groups() {
        let mut a = PackedArray::<u32>::new();
        a.set(0, 2);
        a.set(5, 1);
        a.set(9, 2);
        a.set(63, 1);
        a.set(9, 0);
        assert_eq!(a.occupied(), (1 << 0) | (1 << 5) | (1 << 63));
        let groups = a.groups();
        assert_eq!(groups.as_slice(), &[(1, (1 << 5) | (1 << 63)), (2, 1)]);
    }

    #[test]
    fn ones_iterates_set_bits() {
        let bits: Vec<usize> = 0b1010_0101u8.ones().collect();
        assert_eq!(bits, [0, 2, 5, 7]);
        assert_eq!(u64::bits_from(62), (1 << 62) | (1 << 63));
        assert_eq!(u64::bits_from(64), 0);
    }
}
