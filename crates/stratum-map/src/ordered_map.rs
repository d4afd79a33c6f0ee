use std::collections::btree_map::{self, BTreeMap};
use std::ops::DerefMut;

/// A sorted associative container that [`ChunkMap`](crate::ChunkMap) can use for either of its levels.
///
/// Iteration yields keys by value and values by reference, in ascending key order.
pub trait OrderedMap<K, V>: Default {
    type Iter<'a>: Iterator<Item = (K, &'a V)>
    where
        Self: 'a,
        V: 'a;

    /// Mutable access to one value. Writes may be deferred until the handle is dropped.
    type SlotMut<'a>: DerefMut<Target = V>
    where
        Self: 'a;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, key: K) -> Option<&V>;

    /// Returns `true` if `key` was not present.
    fn insert_or_assign(&mut self, key: K, value: V) -> bool;

    /// Returns the number of values removed, 0 or 1.
    fn erase(&mut self, key: K) -> usize;

    /// Inserts `V::default()` at `key` if it's missing.
    fn slot_mut(&mut self, key: K) -> Self::SlotMut<'_>;

    fn iter(&self) -> Self::Iter<'_>;

    /// Iterates all entries with keys not less than `key`.
    fn iter_from(&self, key: K) -> Self::Iter<'_>;

    fn clear(&mut self);
}

/// An [`OrderedMap`] that can lend out plain `&mut V`.
pub trait OrderedMapMut<K, V>: OrderedMap<K, V> {
    fn get_mut(&mut self, key: K) -> Option<&mut V>;

    fn get_or_insert_default(&mut self, key: K) -> &mut V;
}

/// Adapts the `(&K, &V)` items of a [`BTreeMap`] range to `(K, &V)`.
#[derive(Clone, Debug)]
pub struct Entries<'a, K, V>(btree_map::Range<'a, K, V>);

impl<'a, K: Copy, V> Iterator for Entries<'a, K, V> {
    type Item = (K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, v)| (*k, v))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K: Copy + Ord, V: Default> OrderedMap<K, V> for BTreeMap<K, V> {
    type Iter<'a> = Entries<'a, K, V>
    where
        Self: 'a,
        V: 'a;

    type SlotMut<'a> = &'a mut V
    where
        Self: 'a;

    #[inline]
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    #[inline]
    fn get(&self, key: K) -> Option<&V> {
        BTreeMap::get(self, &key)
    }

    #[inline]
    fn insert_or_assign(&mut self, key: K, value: V) -> bool {
        self.insert(key, value).is_none()
    }

    #[inline]
    fn erase(&mut self, key: K) -> usize {
        self.remove(&key).is_some() as usize
    }

    #[inline]
    fn slot_mut(&mut self, key: K) -> &mut V {
        self.entry(key).or_default()
    }

    fn iter(&self) -> Self::Iter<'_> {
        Entries(self.range::<K, _>(..))
    }

    fn iter_from(&self, key: K) -> Self::Iter<'_> {
        Entries(self.range(key..))
    }

    fn clear(&mut self) {
        BTreeMap::clear(self)
    }
}

impl<K: Copy + Ord, V: Default> OrderedMapMut<K, V> for BTreeMap<K, V> {
    #[inline]
    fn get_mut(&mut self, key: K) -> Option<&mut V> {
        BTreeMap::get_mut(self, &key)
    }

    #[inline]
    fn get_or_insert_default(&mut self, key: K) -> &mut V {
        self.entry(key).or_default()
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

    fn exercise<M: OrderedMap<u32, i32>>() {
        let mut map = M::default();
        assert!(map.is_empty());
        assert!(map.insert_or_assign(3, 30));
        assert!(map.insert_or_assign(1, 10));
        assert!(!map.insert_or_assign(3, 31));
        *map.slot_mut(2) += 20;
        *map.slot_mut(1) += 1;
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(1), Some(&11));

        let all: Vec<_> = map.iter().map(|(k, v)| (k, *v)).collect();
        assert_eq!(all, [(1, 11), (2, 20), (3, 31)]);
        let tail: Vec<_> = map.iter_from(2).map(|(k, _)| k).collect();
        assert_eq!(tail, [2, 3]);

        assert_eq!(map.erase(2), 1);
        assert_eq!(map.erase(2), 0);
        map.clear();
        assert!(map.is_empty());
    }

    #[test]
    fn btree_map_is_an_ordered_map() {
        exercise::<BTreeMap<u32, i32>>();
    }

    #[test]
    fn bucket_map_is_an_ordered_map() {
        exercise::<crate::BucketMap<u32, i32>>();
        exercise::<crate::BucketMap<u32, i32, u8>>();
    }
}
