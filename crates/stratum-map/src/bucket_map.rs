//! A sparse map from integer-like keys to deduplicated values.
//!
//! Keys are split into fixed-size buckets of `W::BITS` slots. Each bucket is a [`PackedArray`] of [`PaletteId`]s, so a
//! bucket whose keys share a handful of distinct values costs only a few words. Deduplication is local: inserting a
//! value reuses an id only if some other key *in the same bucket* already refers to an equal value.

use crate::{
    ByKey, Comparator, CompactionConfig, MapKey, OrderedMap, Palette, PaletteId, SetAdaptor, SetOp, SetView, EMPTY_ID,
};

use stratum_core::{Error, PackedArray, PlaneWord, Result, SmallKeyHashMap};

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem;
use std::ops::{AddAssign, BitOr, Deref, DerefMut};

#[derive(Clone)]
pub struct BucketMap<K, T, W = u64> {
    buckets: Vec<PackedArray<PaletteId, W>>,
    values: Palette<T>,
    len: usize,
    marker: PhantomData<K>,
}

/// What a call to [`BucketMap::compact`] reclaimed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CompactionStats {
    pub value_slots_before: usize,
    pub value_slots_after: usize,
    pub planes_removed: usize,
}

impl CompactionStats {
    pub fn value_slots_removed(&self) -> usize {
        self.value_slots_before - self.value_slots_after
    }
}

impl AddAssign for CompactionStats {
    fn add_assign(&mut self, rhs: Self) {
        self.value_slots_before += rhs.value_slots_before;
        self.value_slots_after += rhs.value_slots_after;
        self.planes_removed += rhs.planes_removed;
    }
}

impl<K, T, W> Default for BucketMap<K, T, W> {
    fn default() -> Self {
        Self {
            buckets: Vec::new(),
            values: Palette::new(),
            len: 0,
            marker: PhantomData,
        }
    }
}

impl<K, T, W> BucketMap<K, T, W>
where
    K: MapKey,
    T: PartialEq,
    W: PlaneWord,
{
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn locate(key: K) -> (usize, usize) {
        let index = key.to_index();
        (index / W::BITS, index % W::BITS)
    }

    #[inline]
    fn key_at(bucket: usize, bit: usize) -> K {
        K::from_index(bucket * W::BITS + bit)
    }

    /// The number of keys with a value.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of allocated buckets. Buckets are never freed, except by [`BucketMap::clear`].
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// The number of slots in the value store, including values that no key refers to anymore.
    #[inline]
    pub fn value_slots(&self) -> usize {
        self.values.len()
    }

    /// The number of value slots that no key refers to.
    pub fn dead_value_slots(&self) -> usize {
        let mut referenced = vec![false; self.values.len() + 1];
        for bucket in self.buckets.iter() {
            for bit in bucket.occupied().ones() {
                referenced[bucket.get(bit) as usize] = true;
            }
        }
        self.values.len() - referenced.into_iter().skip(1).filter(|&r| r).count()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.values.clear();
        self.len = 0;
    }

    #[inline]
    pub fn get(&self, key: K) -> Option<&T> {
        let (bucket, bit) = Self::locate(key);
        let id = self.buckets.get(bucket)?.get(bit);
        self.values.get(id)
    }

    /// Like [`BucketMap::get`], but a missing key is an error.
    pub fn at(&self, key: K) -> Result<&T> {
        self.get(key).ok_or_else(|| Error::not_found(&key))
    }

    #[inline]
    pub fn contains_key(&self, key: K) -> bool {
        let (bucket, bit) = Self::locate(key);
        self.buckets
            .get(bucket)
            .map_or(false, |b| b.occupied().test(bit))
    }

    /// Writes `value` at `key`, reusing the id of an equal value already stored in the same bucket. Returns `true` if
    /// `key` had no value before.
    pub fn insert_or_assign(&mut self, key: K, value: T) -> bool {
        let (bucket, bit) = Self::locate(key);
        if bucket >= self.buckets.len() {
            self.buckets.resize_with(bucket + 1, PackedArray::new);
        }
        let packed = &mut self.buckets[bucket];
        let previous = packed.get(bit);

        let values = &self.values;
        let existing = packed
            .occupied()
            .ones()
            .map(|slot| packed.get(slot))
            .find(|&id| values[id] == value);
        let id = match existing {
            Some(id) => id,
            None => self.values.push(value),
        };
        packed.set(bit, id);

        let inserted = previous == EMPTY_ID;
        if inserted {
            self.len += 1;
        }
        inserted
    }

    /// Returns the number of values removed, 0 or 1. The value slot is kept until the next [`BucketMap::compact`].
    pub fn erase(&mut self, key: K) -> usize {
        let (bucket, bit) = Self::locate(key);
        match self.buckets.get_mut(bucket) {
            Some(packed) if packed.get(bit) != EMPTY_ID => {
                packed.set(bit, EMPTY_ID);
                self.len -= 1;
                1
            }
            _ => 0,
        }
    }

    pub fn iter(&self) -> Iter<'_, K, T, W> {
        Iter {
            map: self,
            bucket: 0,
            pending: self.buckets.first().map_or(W::ZERO, |b| b.occupied()),
        }
    }

    /// Iterates all entries with keys not less than `key`.
    pub fn iter_from(&self, key: K) -> Iter<'_, K, T, W> {
        let (bucket, bit) = Self::locate(key);
        match self.buckets.get(bucket) {
            Some(packed) => Iter {
                map: self,
                bucket,
                pending: packed.occupied().intersection(W::bits_from(bit)),
            },
            None => Iter {
                map: self,
                bucket: self.buckets.len(),
                pending: W::ZERO,
            },
        }
    }

    /// Groups the keys of every bucket by their value id, in order of bucket then id.
    pub fn nodes(&self) -> Nodes<'_, K, T, W> {
        Nodes {
            map: self,
            next_bucket: 0,
            bucket_index: 0,
            groups: smallvec::SmallVec::new().into_iter(),
        }
    }

    /// Copies every entry of `other` into `self`, overwriting values at shared keys.
    pub fn extend_from_map(&mut self, other: &Self)
    where
        T: Clone,
    {
        self.extend(other.iter());
    }

    /// Moves every entry of `other` into `self`, overwriting values at shared keys.
    ///
    /// Each value of `other` is moved at most once. Later keys that refer to the same source slot either reuse an equal
    /// value already in their destination bucket, or share the id of the moved value.
    pub fn absorb(&mut self, other: Self) {
        let BucketMap {
            buckets: src_buckets,
            values: src_values,
            ..
        } = other;
        let mut slots: Vec<Option<T>> = src_values.into_values().into_iter().map(Some).collect();
        let mut relocated: SmallKeyHashMap<PaletteId, PaletteId> = SmallKeyHashMap::default();

        if src_buckets.len() > self.buckets.len() {
            self.buckets.resize_with(src_buckets.len(), PackedArray::new);
        }

        for (bucket, src) in src_buckets.iter().enumerate() {
            let dst = &mut self.buckets[bucket];
            for bit in src.occupied().ones() {
                let src_id = src.get(bit);
                let slot = src_id as usize - 1;
                let moved = relocated.get(&src_id).copied();

                let values = &self.values;
                let candidate = match moved {
                    Some(id) => Some(&values[id]),
                    None => slots[slot].as_ref(),
                };
                let Some(candidate) = candidate else {
                    continue;
                };
                let existing = dst
                    .occupied()
                    .ones()
                    .map(|i| dst.get(i))
                    .find(|&id| values[id] == *candidate);

                let id = match (existing, moved) {
                    (Some(id), _) | (None, Some(id)) => id,
                    (None, None) => match slots[slot].take() {
                        Some(value) => {
                            let id = self.values.push(value);
                            relocated.insert(src_id, id);
                            id
                        }
                        None => continue,
                    },
                };

                if dst.get(bit) == EMPTY_ID {
                    self.len += 1;
                }
                dst.set(bit, id);
            }
        }
    }

    /// Rebuilds the value store from the ids that are still referenced, then renumbers every bucket.
    pub fn compact(&mut self) -> CompactionStats {
        let value_slots_before = self.values.len();
        let mut slots: Vec<Option<T>> = mem::take(&mut self.values)
            .into_values()
            .into_iter()
            .map(Some)
            .collect();
        let mut remap: SmallKeyHashMap<PaletteId, PaletteId> = SmallKeyHashMap::default();

        for packed in self.buckets.iter_mut() {
            for bit in packed.occupied().ones() {
                let old = packed.get(bit);
                let new = match remap.get(&old) {
                    Some(&new) => new,
                    None => match slots[old as usize - 1].take() {
                        Some(value) => {
                            let new = self.values.push(value);
                            remap.insert(old, new);
                            new
                        }
                        None => continue,
                    },
                };
                packed.set(bit, new);
            }
        }

        let stats = CompactionStats {
            value_slots_before,
            value_slots_after: self.values.len(),
            planes_removed: 0,
        };
        log::debug!(
            "compacted bucket map: {} -> {} value slots",
            stats.value_slots_before,
            stats.value_slots_after
        );
        stats
    }

    /// Drops the unused high bit-planes of every bucket. Returns the number of planes removed.
    pub fn shrink_planes(&mut self) -> usize {
        self.buckets.iter_mut().map(|b| b.shrink_to_fit()).sum()
    }

    /// Runs [`BucketMap::compact`] if the share of dead value slots has reached `config.min_dead_ratio`.
    pub fn maybe_compact(&mut self, config: &CompactionConfig) -> Option<CompactionStats> {
        if self.values.is_empty() {
            return None;
        }
        let dead_ratio = self.dead_value_slots() as f32 / self.values.len() as f32;
        if dead_ratio < config.min_dead_ratio {
            return None;
        }
        let mut stats = self.compact();
        if config.shrink_planes {
            stats.planes_removed = self.shrink_planes();
        }
        Some(stats)
    }
}

impl<K, T, W> BucketMap<K, T, W>
where
    K: MapKey,
    T: Clone + Default + PartialEq,
    W: PlaneWord,
{
    /// A handle to the value at `key`. If `key` is missing, `T::default()` is inserted when the handle drops.
    pub fn slot_mut(&mut self, key: K) -> SlotMut<'_, K, T, W> {
        let value = self.get(key).cloned().unwrap_or_default();
        SlotMut {
            map: self,
            key,
            value,
        }
    }
}

/// A copy of one value of a [`BucketMap`]. Dropping the handle writes the copy back, deduplicating it against its
/// bucket.
pub struct SlotMut<'a, K, T, W>
where
    K: MapKey,
    T: Clone + Default + PartialEq,
    W: PlaneWord,
{
    map: &'a mut BucketMap<K, T, W>,
    key: K,
    value: T,
}

impl<'a, K, T, W> Deref for SlotMut<'a, K, T, W>
where
    K: MapKey,
    T: Clone + Default + PartialEq,
    W: PlaneWord,
{
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<'a, K, T, W> DerefMut for SlotMut<'a, K, T, W>
where
    K: MapKey,
    T: Clone + Default + PartialEq,
    W: PlaneWord,
{
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<'a, K, T, W> Drop for SlotMut<'a, K, T, W>
where
    K: MapKey,
    T: Clone + Default + PartialEq,
    W: PlaneWord,
{
    fn drop(&mut self) {
        let value = mem::take(&mut self.value);
        self.map.insert_or_assign(self.key, value);
    }
}

/// Iterator over the entries of a [`BucketMap`] in ascending key order.
pub struct Iter<'a, K, T, W> {
    map: &'a BucketMap<K, T, W>,
    bucket: usize,
    /// Bits of `bucket` not yet visited.
    pending: W,
}

impl<'a, K, T, W> Iterator for Iter<'a, K, T, W>
where
    K: MapKey,
    T: PartialEq,
    W: PlaneWord,
{
    type Item = (K, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(bit) = self.pending.lowest_one() {
                self.pending = self.pending.without_lowest_one();
                let id = self.map.buckets[self.bucket].get(bit);
                return Some((BucketMap::<K, T, W>::key_at(self.bucket, bit), &self.map.values[id]));
            }
            let num_buckets = self.map.buckets.len();
            if self.bucket + 1 >= num_buckets {
                self.bucket = num_buckets;
                return None;
            }
            self.bucket += 1;
            self.pending = self.map.buckets[self.bucket].occupied();
        }
    }
}

impl<'a, K, T, W> FusedIterator for Iter<'a, K, T, W>
where
    K: MapKey,
    T: PartialEq,
    W: PlaneWord,
{
}

impl<'a, K, T, W> IntoIterator for &'a BucketMap<K, T, W>
where
    K: MapKey,
    T: PartialEq,
    W: PlaneWord,
{
    type Item = (K, &'a T);
    type IntoIter = Iter<'a, K, T, W>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The keys of one bucket that share a value.
#[derive(Debug)]
pub struct Node<'a, T, W> {
    pub bucket_index: usize,
    /// One bit per key of the bucket.
    pub mask: W,
    pub value: &'a T,
}

impl<'a, T, W: PlaneWord> Node<'a, T, W> {
    pub fn keys<K: MapKey>(&self) -> impl Iterator<Item = K> {
        let base = self.bucket_index * W::BITS;
        self.mask.ones().map(move |bit| K::from_index(base + bit))
    }

    pub fn key_count(&self) -> usize {
        self.mask.count_ones() as usize
    }
}

/// Lazy iterator over the [`Node`]s of a [`BucketMap`].
pub struct Nodes<'a, K, T, W> {
    map: &'a BucketMap<K, T, W>,
    next_bucket: usize,
    bucket_index: usize,
    groups: smallvec::IntoIter<[(PaletteId, W); 8]>,
}

impl<'a, K, T, W> Iterator for Nodes<'a, K, T, W>
where
    W: PlaneWord,
{
    type Item = Node<'a, T, W>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((id, mask)) = self.groups.next() {
                return Some(Node {
                    bucket_index: self.bucket_index,
                    mask,
                    value: &self.map.values[id],
                });
            }
            let packed = self.map.buckets.get(self.next_bucket)?;
            self.bucket_index = self.next_bucket;
            self.next_bucket += 1;
            self.groups = packed.groups().into_iter();
        }
    }
}

impl<K, T, W> PartialEq for BucketMap<K, T, W>
where
    K: MapKey,
    T: PartialEq,
    W: PlaneWord,
{
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<K, T, W> fmt::Debug for BucketMap<K, T, W>
where
    K: MapKey,
    T: fmt::Debug + PartialEq,
    W: PlaneWord,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, T, W> Extend<(K, T)> for BucketMap<K, T, W>
where
    K: MapKey,
    T: PartialEq,
    W: PlaneWord,
{
    fn extend<I: IntoIterator<Item = (K, T)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert_or_assign(key, value);
        }
    }
}

impl<'a, K, T, W> Extend<(K, &'a T)> for BucketMap<K, T, W>
where
    K: MapKey,
    T: Clone + PartialEq + 'a,
    W: PlaneWord,
{
    fn extend<I: IntoIterator<Item = (K, &'a T)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert_or_assign(key, value.clone());
        }
    }
}

impl<K, T, W> FromIterator<(K, T)> for BucketMap<K, T, W>
where
    K: MapKey,
    T: PartialEq,
    W: PlaneWord,
{
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

/// A set-algebra view over two [`BucketMap`]s of the same type, ordered by key.
pub type BucketPairView<'a, K, T, W> = SetView<Iter<'a, K, T, W>, Iter<'a, K, T, W>, ByKey>;

impl<K, T, W> BucketMap<K, T, W>
where
    K: MapKey,
    T: PartialEq,
    W: PlaneWord,
{
    /// The entries of `a` whose keys are also in `b`.
    pub fn overlap<'a>(a: &'a Self, b: &'a Self) -> BucketPairView<'a, K, T, W> {
        SetView::new(SetOp::Overlap, a.iter(), b.iter(), ByKey)
    }

    /// The entries of `a` whose keys are not in `b`.
    pub fn subtract<'a>(a: &'a Self, b: &'a Self) -> BucketPairView<'a, K, T, W> {
        SetView::new(SetOp::Subtract, a.iter(), b.iter(), ByKey)
    }

    /// Every key of `a` or `b`, with the value from `a` where both have one.
    pub fn merge<'a>(a: &'a Self, b: &'a Self) -> BucketPairView<'a, K, T, W> {
        SetView::new(SetOp::Merge, a.iter(), b.iter(), ByKey)
    }

    /// The entries whose keys are in exactly one of `a` and `b`.
    pub fn exclusive<'a>(a: &'a Self, b: &'a Self) -> BucketPairView<'a, K, T, W> {
        SetView::new(SetOp::Exclusive, a.iter(), b.iter(), ByKey)
    }
}

impl<'a, K, T, W, R, C> BitOr<SetAdaptor<R, C>> for &'a BucketMap<K, T, W>
where
    K: MapKey,
    T: PartialEq,
    W: PlaneWord,
    R: IntoIterator<Item = (K, &'a T)>,
    C: Comparator<(K, &'a T)>,
{
    type Output = SetView<Iter<'a, K, T, W>, R::IntoIter, C>;

    fn bitor(self, rhs: SetAdaptor<R, C>) -> Self::Output {
        rhs.apply(self)
    }
}

impl<K, T, W> OrderedMap<K, T> for BucketMap<K, T, W>
where
    K: MapKey,
    T: Clone + Default + PartialEq,
    W: PlaneWord,
{
    type Iter<'a> = Iter<'a, K, T, W>
    where
        Self: 'a,
        T: 'a;

    type SlotMut<'a> = SlotMut<'a, K, T, W>
    where
        Self: 'a;

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn get(&self, key: K) -> Option<&T> {
        BucketMap::get(self, key)
    }

    #[inline]
    fn insert_or_assign(&mut self, key: K, value: T) -> bool {
        BucketMap::insert_or_assign(self, key, value)
    }

    #[inline]
    fn erase(&mut self, key: K) -> usize {
        BucketMap::erase(self, key)
    }

    #[inline]
    fn slot_mut(&mut self, key: K) -> Self::SlotMut<'_> {
        BucketMap::slot_mut(self, key)
    }

    fn iter(&self) -> Self::Iter<'_> {
        BucketMap::iter(self)
    }

    fn iter_from(&self, key: K) -> Self::Iter<'_> {
        BucketMap::iter_from(self, key)
    }

    fn clear(&mut self) {
        BucketMap::clear(self)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
