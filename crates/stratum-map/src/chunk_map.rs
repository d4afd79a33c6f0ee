use crate::{ByKey, Comparator, OrderedMap, OrderedMapMut, SetAdaptor, SetOp, SetView};

use stratum_core::{ChunkPosition, Error, GlobalPosition, LocalPosition, Result};

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::ops::BitOr;

/// A sparse map from [`GlobalPosition`] to `T`, stored as a map of chunks.
///
/// Each position is split into the chunk that contains it and its offset inside that chunk. The `Outer` map owns one
/// `Inner` map per chunk that holds at least one value; a chunk whose last value is erased is removed. Iteration visits
/// chunks in Morton order and then each chunk's positions in Morton order, which is global Morton order.
///
/// The default levels are both [`BTreeMap`]s. See [`LayeredMap`](crate::LayeredMap) for a deduplicating inner level.
#[derive(Clone)]
pub struct ChunkMap<T, Inner = BTreeMap<LocalPosition, T>, Outer = BTreeMap<ChunkPosition, Inner>> {
    pub(crate) chunks: Outer,
    marker: PhantomData<(T, Inner)>,
}

impl<T, Inner, Outer> Default for ChunkMap<T, Inner, Outer>
where
    Outer: Default,
{
    fn default() -> Self {
        Self {
            chunks: Outer::default(),
            marker: PhantomData,
        }
    }
}

impl<T, Inner, Outer> ChunkMap<T, Inner, Outer>
where
    Inner: OrderedMap<LocalPosition, T>,
    Outer: OrderedMapMut<ChunkPosition, Inner>,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// The total number of values. This visits every chunk.
    pub fn len(&self) -> usize {
        self.chunks.iter().map(|(_, inner)| inner.len()).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Iterates the occupied chunks in order.
    pub fn chunks(&self) -> Outer::Iter<'_> {
        self.chunks.iter()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    #[inline]
    pub fn get(&self, pos: GlobalPosition) -> Option<&T> {
        let (chunk, local) = pos.split();
        self.chunks.get(chunk)?.get(local)
    }

    /// Like [`ChunkMap::get`], but a missing position is an error.
    pub fn at(&self, pos: GlobalPosition) -> Result<&T> {
        self.get(pos).ok_or_else(|| Error::not_found(&pos))
    }

    #[inline]
    pub fn contains(&self, pos: GlobalPosition) -> bool {
        self.get(pos).is_some()
    }

    /// Mutable access to the value at `pos`, inserting `T::default()` (and the chunk) if it's missing.
    pub fn slot_mut(&mut self, pos: GlobalPosition) -> Inner::SlotMut<'_> {
        let (chunk, local) = pos.split();
        self.chunk_mut(chunk).slot_mut(local)
    }

    /// Writes `value` at `pos`. Returns `true` if `pos` had no value before.
    pub fn set(&mut self, pos: GlobalPosition, value: T) -> bool {
        let (chunk, local) = pos.split();
        self.chunk_mut(chunk).insert_or_assign(local, value)
    }

    /// Writes `value` at `pos` only if `pos` has no value. Returns an iterator positioned at `pos` and whether `value`
    /// was inserted.
    pub fn insert(&mut self, pos: GlobalPosition, value: T) -> (Iter<'_, T, Inner, Outer>, bool) {
        let inserted = !self.contains(pos);
        if inserted {
            self.set(pos, value);
        }
        (self.iter_at(pos), inserted)
    }

    /// Returns the number of values removed, 0 or 1.
    pub fn erase(&mut self, pos: GlobalPosition) -> usize {
        let (chunk, local) = pos.split();
        let Some(inner) = self.chunks.get_mut(chunk) else {
            return 0;
        };
        let removed = inner.erase(local);
        if inner.is_empty() {
            log::trace!("dropping empty chunk {:?}", chunk);
            self.chunks.erase(chunk);
        }
        removed
    }

    pub fn iter(&self) -> Iter<'_, T, Inner, Outer> {
        Iter {
            outer: self.chunks.iter(),
            current: None,
        }
    }

    /// An iterator that starts at `pos`, or `None` if `pos` has no value.
    pub fn find(&self, pos: GlobalPosition) -> Option<Iter<'_, T, Inner, Outer>> {
        self.contains(pos).then(|| self.iter_at(pos))
    }

    /// Iterates all entries not less than `pos`.
    pub fn iter_from(&self, pos: GlobalPosition) -> Iter<'_, T, Inner, Outer> {
        self.iter_at(pos)
    }

    fn iter_at(&self, pos: GlobalPosition) -> Iter<'_, T, Inner, Outer> {
        let (chunk, local) = pos.split();
        let mut outer = self.chunks.iter_from(chunk);
        let current = match outer.next() {
            Some((c, inner)) if c == chunk => Some((c, inner.iter_from(local))),
            Some((c, inner)) => Some((c, inner.iter())),
            None => None,
        };
        Iter { outer, current }
    }

    fn chunk_mut(&mut self, chunk: ChunkPosition) -> &mut Inner {
        if self.chunks.get(chunk).is_none() {
            log::trace!("creating chunk {:?}", chunk);
        }
        self.chunks.get_or_insert_default(chunk)
    }

    fn view<'a>(op: SetOp, a: &'a Self, b: &'a Self) -> PairView<'a, T, Inner, Outer> {
        SetView::new(op, a.iter(), b.iter(), ByKey)
    }

    /// The entries of `a` whose positions are also in `b`.
    pub fn overlap<'a>(a: &'a Self, b: &'a Self) -> PairView<'a, T, Inner, Outer> {
        Self::view(SetOp::Overlap, a, b)
    }

    /// The entries of `a` whose positions are not in `b`.
    pub fn subtract<'a>(a: &'a Self, b: &'a Self) -> PairView<'a, T, Inner, Outer> {
        Self::view(SetOp::Subtract, a, b)
    }

    /// Every position of `a` or `b`, with the value from `a` where both have one.
    pub fn merge<'a>(a: &'a Self, b: &'a Self) -> PairView<'a, T, Inner, Outer> {
        Self::view(SetOp::Merge, a, b)
    }

    /// The entries whose positions are in exactly one of `a` and `b`.
    pub fn exclusive<'a>(a: &'a Self, b: &'a Self) -> PairView<'a, T, Inner, Outer> {
        Self::view(SetOp::Exclusive, a, b)
    }
}

/// A set-algebra view over two [`ChunkMap`]s of the same type, ordered by position.
pub type PairView<'a, T, Inner, Outer> = SetView<Iter<'a, T, Inner, Outer>, Iter<'a, T, Inner, Outer>, ByKey>;

/// Iterator over the entries of a [`ChunkMap`] in global Morton order.
pub struct Iter<'a, T, Inner, Outer>
where
    T: 'a,
    Inner: OrderedMap<LocalPosition, T> + 'a,
    Outer: OrderedMap<ChunkPosition, Inner> + 'a,
{
    outer: Outer::Iter<'a>,
    /// `None` before the first chunk and after the last one.
    current: Option<(ChunkPosition, Inner::Iter<'a>)>,
}

impl<'a, T, Inner, Outer> Iterator for Iter<'a, T, Inner, Outer>
where
    T: 'a,
    Inner: OrderedMap<LocalPosition, T> + 'a,
    Outer: OrderedMap<ChunkPosition, Inner> + 'a,
{
    type Item = (GlobalPosition, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((chunk, inner)) = &mut self.current {
                if let Some((local, value)) = inner.next() {
                    return Some((GlobalPosition::from_parts(*chunk, local), value));
                }
            }
            match self.outer.next() {
                Some((chunk, inner)) => self.current = Some((chunk, inner.iter())),
                None => {
                    self.current = None;
                    return None;
                }
            }
        }
    }
}

impl<'a, T, Inner, Outer> IntoIterator for &'a ChunkMap<T, Inner, Outer>
where
    Inner: OrderedMap<LocalPosition, T>,
    Outer: OrderedMapMut<ChunkPosition, Inner>,
{
    type Item = (GlobalPosition, &'a T);
    type IntoIter = Iter<'a, T, Inner, Outer>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, Inner, Outer, R, C> BitOr<SetAdaptor<R, C>> for &'a ChunkMap<T, Inner, Outer>
where
    Inner: OrderedMap<LocalPosition, T>,
    Outer: OrderedMapMut<ChunkPosition, Inner>,
    R: IntoIterator<Item = (GlobalPosition, &'a T)>,
    C: Comparator<(GlobalPosition, &'a T)>,
{
    type Output = SetView<Iter<'a, T, Inner, Outer>, R::IntoIter, C>;

    fn bitor(self, rhs: SetAdaptor<R, C>) -> Self::Output {
        rhs.apply(self)
    }
}

impl<T, Inner, Outer> PartialEq for ChunkMap<T, Inner, Outer>
where
    T: PartialEq,
    Inner: OrderedMap<LocalPosition, T>,
    Outer: OrderedMapMut<ChunkPosition, Inner>,
{
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<T, Inner, Outer> fmt::Debug for ChunkMap<T, Inner, Outer>
where
    T: fmt::Debug,
    Inner: OrderedMap<LocalPosition, T>,
    Outer: OrderedMapMut<ChunkPosition, Inner>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T, Inner, Outer> Extend<(GlobalPosition, T)> for ChunkMap<T, Inner, Outer>
where
    Inner: OrderedMap<LocalPosition, T>,
    Outer: OrderedMapMut<ChunkPosition, Inner>,
{
    fn extend<I: IntoIterator<Item = (GlobalPosition, T)>>(&mut self, iter: I) {
        for (pos, value) in iter {
            self.set(pos, value);
        }
    }
}

impl<'a, T, Inner, Outer> Extend<(GlobalPosition, &'a T)> for ChunkMap<T, Inner, Outer>
where
    T: Clone + 'a,
    Inner: OrderedMap<LocalPosition, T>,
    Outer: OrderedMapMut<ChunkPosition, Inner>,
{
    fn extend<I: IntoIterator<Item = (GlobalPosition, &'a T)>>(&mut self, iter: I) {
        for (pos, value) in iter {
            self.set(pos, value.clone());
        }
    }
}

impl<T, Inner, Outer> FromIterator<(GlobalPosition, T)> for ChunkMap<T, Inner, Outer>
where
    Inner: OrderedMap<LocalPosition, T>,
    Outer: OrderedMapMut<ChunkPosition, Inner>,
{
    fn from_iter<I: IntoIterator<Item = (GlobalPosition, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
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
    use crate::views;

    fn p(x: u32, y: u32, z: u32) -> GlobalPosition {
        GlobalPosition::new(x, y, z)
    }

    fn keys<'a>(iter: impl Iterator<Item = (GlobalPosition, &'a i32)>) -> Vec<GlobalPosition> {
        iter.map(|(pos, _)| pos).collect()
    }

    #[test]
    fn set_get_and_erase() {
        let mut map = ChunkMap::<i32>::new();
        assert!(map.is_empty());
        assert!(map.set(p(1, 2, 3), 5));
        assert!(map.set(p(100, 0, 0), 6));
        assert!(!map.set(p(1, 2, 3), 7));
        assert_eq!(map.len(), 2);
        assert_eq!(map.chunk_count(), 2);
        assert_eq!(map.get(p(1, 2, 3)), Some(&7));
        assert_eq!(map.at(p(100, 0, 0)), Ok(&6));
        assert!(map.at(p(100, 0, 1)).is_err());
        assert!(!map.contains(p(5, 5, 5)));

        assert_eq!(map.erase(p(100, 0, 0)), 1);
        assert_eq!(map.erase(p(100, 0, 0)), 0);
        assert_eq!(map.erase(p(1000, 0, 0)), 0);
        // The chunk that lost its last value is gone.
        assert_eq!(map.chunk_count(), 1);
        assert_eq!(map.len(), 1);

        map.clear();
        assert!(map.is_empty());
    }

    #[test]
    fn erase_keeps_chunks_with_values() {
        let mut map = ChunkMap::<i32>::new();
        map.set(p(0, 0, 0), 1);
        map.set(p(1, 0, 0), 2);
        map.erase(p(0, 0, 0));
        assert_eq!(map.chunk_count(), 1);
        map.erase(p(1, 0, 0));
        assert_eq!(map.chunk_count(), 0);
        assert!(map.is_empty());
    }

    #[test]
    fn slot_mut_creates_default_values() {
        let mut map = ChunkMap::<i32>::new();
        *map.slot_mut(p(40, 40, 40)) += 2;
        *map.slot_mut(p(40, 40, 40)) += 2;
        assert_eq!(map.get(p(40, 40, 40)), Some(&4));
        assert_eq!(map.chunk_count(), 1);
    }

    #[test]
    fn iteration_is_in_global_morton_order() {
        let positions = [
            p(33, 0, 0),
            p(0, 0, 1),
            p(31, 31, 31),
            p(0, 64, 0),
            p(1, 0, 0),
            p(1 << 30, 5, 9),
        ];
        let map: ChunkMap<i32> = positions.iter().map(|&pos| (pos, 0)).collect();
        let mut expected = positions.to_vec();
        expected.sort_by_key(|pos| pos.morton());
        assert_eq!(keys(map.iter()), expected);
        assert_eq!(keys((&map).into_iter()), expected);
    }

    #[test]
    fn find_and_insert() {
        let mut map: ChunkMap<i32> = [(p(1, 0, 0), 1), (p(40, 0, 0), 2), (p(80, 0, 0), 3)]
            .into_iter()
            .collect();

        let found = map.find(p(40, 0, 0)).expect("present");
        assert_eq!(keys(found), [p(40, 0, 0), p(80, 0, 0)]);
        assert!(map.find(p(41, 0, 0)).is_none());

        let (mut iter, inserted) = map.insert(p(1, 0, 0), 100);
        assert!(!inserted);
        assert_eq!(iter.next(), Some((p(1, 0, 0), &1)));

        let (mut iter, inserted) = map.insert(p(2, 0, 0), 200);
        assert!(inserted);
        assert_eq!(iter.next(), Some((p(2, 0, 0), &200)));
        assert_eq!(iter.next(), Some((p(40, 0, 0), &2)));
        assert_eq!(map.len(), 4);

        assert_eq!(keys(map.iter_from(p(3, 0, 0))), [p(40, 0, 0), p(80, 0, 0)]);
    }

    #[test]
    fn set_algebra() {
        let a: ChunkMap<i32> = [(p(1, 0, 0), 1), (p(2, 0, 0), 2), (p(64, 0, 0), 3)]
            .into_iter()
            .collect();
        let b: ChunkMap<i32> = [(p(2, 0, 0), 20), (p(64, 0, 0), 30), (p(99, 0, 0), 40)]
            .into_iter()
            .collect();

        let overlap: Vec<_> = ChunkMap::overlap(&a, &b).collect();
        assert_eq!(overlap, [(p(2, 0, 0), &2), (p(64, 0, 0), &3)]);
        assert_eq!(keys(ChunkMap::subtract(&a, &b)), [p(1, 0, 0)]);
        assert_eq!(keys(ChunkMap::exclusive(&a, &b)), [p(1, 0, 0), p(99, 0, 0)]);

        let merged: ChunkMap<i32> = (&a | views::merge(&b)).map(|(pos, v)| (pos, *v)).collect();
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.get(p(2, 0, 0)), Some(&2));
        assert_eq!(ChunkMap::merge(&a, &a).count(), a.len());

        let mut copy = ChunkMap::<i32>::new();
        copy.extend(&a | views::subtract(&b));
        assert_eq!(copy.len(), 1);
    }

    #[test]
    fn debug_lists_entries() {
        let map: ChunkMap<i32> = [(p(1, 0, 0), 1)].into_iter().collect();
        assert_eq!(
            format!("{:?}", map),
            "{GlobalPosition { x: 1, y: 0, z: 0 }: 1}"
        );
    }
}
