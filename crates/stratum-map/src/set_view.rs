//! Lazy set algebra over sorted sequences.
//!
//! A [`SetView`] walks two inputs that are already sorted by the same [`Comparator`], holding one lookahead item per
//! side. Nothing is buffered and nothing is allocated, so a view over two maps costs the same as iterating them both.
//!
//! Views compose in pipelines:
//!
//! ```
//! use stratum_map::{views, ChunkMap};
//! use stratum_core::GlobalPosition;
//!
//! let p = |x| GlobalPosition::new(x, 0, 0);
//! let a: ChunkMap<i32> = [(p(1), 1), (p(2), 2)].into_iter().collect();
//! let b: ChunkMap<i32> = [(p(2), 20), (p(3), 30)].into_iter().collect();
//! let c: ChunkMap<i32> = [(p(3), 300)].into_iter().collect();
//!
//! let keys: Vec<_> = (&a | views::merge(&b) | views::subtract(&c)).map(|(p, _)| p.x).collect();
//! assert_eq!(keys, [1, 2]);
//! ```
//!
//! Inputs that are not sorted are not detected by the views; they produce some sequence of the input items, without
//! panicking. Use [`check_ordered`] to validate an untrusted sequence first.

use stratum_core::{Error, Result};

use std::cmp::Ordering;
use std::iter::{Fuse, FusedIterator, Peekable};
use std::ops::BitOr;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SetOp {
    /// Intersection. Yields left items whose key is also on the right.
    Overlap,
    /// Difference. Yields left items whose key is not on the right.
    Subtract,
    /// Union. Yields every key once, taking the left item on ties.
    Merge,
    /// Symmetric difference. Yields the items whose key is on exactly one side.
    Exclusive,
}

/// A total order over items of type `T`.
pub trait Comparator<T> {
    fn compare(&mut self, a: &T, b: &T) -> Ordering;
}

impl<T, F> Comparator<T> for F
where
    F: FnMut(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&mut self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// Orders `(key, value)` pairs by key alone.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByKey;

impl<K: Ord, V> Comparator<(K, V)> for ByKey {
    #[inline]
    fn compare(&mut self, a: &(K, V), b: &(K, V)) -> Ordering {
        a.0.cmp(&b.0)
    }
}

/// The state of the two lookahead slots.
enum Heads {
    Both(Ordering),
    LeftOnly,
    RightOnly,
    Neither,
}

/// A lazy merge of two sorted iterators. See [`SetOp`] for what each operation yields.
pub struct SetView<I1, I2, C>
where
    I1: Iterator,
    I2: Iterator<Item = I1::Item>,
{
    op: SetOp,
    left: Peekable<Fuse<I1>>,
    right: Peekable<Fuse<I2>>,
    cmp: C,
}

impl<I1, I2, C> SetView<I1, I2, C>
where
    I1: Iterator,
    I2: Iterator<Item = I1::Item>,
    C: Comparator<I1::Item>,
{
    pub fn new(op: SetOp, left: I1, right: I2, cmp: C) -> Self {
        Self {
            op,
            left: left.fuse().peekable(),
            right: right.fuse().peekable(),
            cmp,
        }
    }

    fn heads(&mut self) -> Heads {
        match (self.left.peek(), self.right.peek()) {
            (Some(l), Some(r)) => Heads::Both(self.cmp.compare(l, r)),
            (Some(_), None) => Heads::LeftOnly,
            (None, Some(_)) => Heads::RightOnly,
            (None, None) => Heads::Neither,
        }
    }
}

impl<I1, I2, C> Iterator for SetView<I1, I2, C>
where
    I1: Iterator,
    I2: Iterator<Item = I1::Item>,
    C: Comparator<I1::Item>,
{
    type Item = I1::Item;

    fn next(&mut self) -> Option<Self::Item> {
        use Heads::*;
        use Ordering::*;

        loop {
            let heads = self.heads();
            match (self.op, heads) {
                (SetOp::Overlap, Both(Less)) => {
                    self.left.next();
                }
                (SetOp::Overlap, Both(Greater)) => {
                    self.right.next();
                }
                (SetOp::Overlap, Both(Equal)) => {
                    self.right.next();
                    return self.left.next();
                }
                (SetOp::Overlap, _) => return None,

                (SetOp::Subtract, Both(Less) | LeftOnly) => return self.left.next(),
                (SetOp::Subtract, Both(Greater)) => {
                    self.right.next();
                }
                (SetOp::Subtract, Both(Equal)) => {
                    self.left.next();
                    self.right.next();
                }
                (SetOp::Subtract, RightOnly | Neither) => return None,

                (SetOp::Merge, Both(Equal)) => {
                    self.right.next();
                    return self.left.next();
                }
                (SetOp::Merge | SetOp::Exclusive, Both(Less) | LeftOnly) => return self.left.next(),
                (SetOp::Merge | SetOp::Exclusive, Both(Greater) | RightOnly) => return self.right.next(),
                (SetOp::Exclusive, Both(Equal)) => {
                    self.left.next();
                    self.right.next();
                }
                (SetOp::Merge | SetOp::Exclusive, Neither) => return None,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (_, left) = self.left.size_hint();
        let (_, right) = self.right.size_hint();
        let upper = match self.op {
            SetOp::Overlap => left.zip(right).map(|(l, r)| l.min(r)),
            SetOp::Subtract => left,
            SetOp::Merge | SetOp::Exclusive => left.zip(right).and_then(|(l, r)| l.checked_add(r)),
        };
        (0, upper)
    }
}

impl<I1, I2, C> FusedIterator for SetView<I1, I2, C>
where
    I1: Iterator,
    I2: Iterator<Item = I1::Item>,
    C: Comparator<I1::Item>,
{
}

/// The right-hand side of a set operation, waiting for its left-hand side. Apply it with `lhs | adaptor`.
#[derive(Clone, Debug)]
pub struct SetAdaptor<R, C = ByKey> {
    op: SetOp,
    rhs: R,
    cmp: C,
}

impl<R> SetAdaptor<R> {
    pub fn new(op: SetOp, rhs: R) -> Self {
        Self { op, rhs, cmp: ByKey }
    }
}

impl<R, C> SetAdaptor<R, C> {
    /// Replaces the comparator.
    pub fn by<C2>(self, cmp: C2) -> SetAdaptor<R, C2> {
        SetAdaptor {
            op: self.op,
            rhs: self.rhs,
            cmp,
        }
    }

    pub fn apply<L>(self, lhs: L) -> SetView<L::IntoIter, R::IntoIter, C>
    where
        L: IntoIterator,
        R: IntoIterator<Item = L::Item>,
        C: Comparator<L::Item>,
    {
        SetView::new(self.op, lhs.into_iter(), self.rhs.into_iter(), self.cmp)
    }
}

impl<I1, I2, C, R, C2> BitOr<SetAdaptor<R, C2>> for SetView<I1, I2, C>
where
    I1: Iterator,
    I2: Iterator<Item = I1::Item>,
    C: Comparator<I1::Item>,
    R: IntoIterator<Item = I1::Item>,
    C2: Comparator<I1::Item>,
{
    type Output = SetView<Self, R::IntoIter, C2>;

    fn bitor(self, rhs: SetAdaptor<R, C2>) -> Self::Output {
        rhs.apply(self)
    }
}

/// Constructors for set-algebra views.
///
/// The one-argument forms build a [`SetAdaptor`] for the pipeline syntax `lhs | views::overlap(rhs)`, ordered by key.
/// The `_by` forms take both sides and a comparator.
pub mod views {
    use super::*;

    pub fn overlap<R: IntoIterator>(rhs: R) -> SetAdaptor<R> {
        SetAdaptor::new(SetOp::Overlap, rhs)
    }

    pub fn subtract<R: IntoIterator>(rhs: R) -> SetAdaptor<R> {
        SetAdaptor::new(SetOp::Subtract, rhs)
    }

    pub fn merge<R: IntoIterator>(rhs: R) -> SetAdaptor<R> {
        SetAdaptor::new(SetOp::Merge, rhs)
    }

    pub fn exclusive<R: IntoIterator>(rhs: R) -> SetAdaptor<R> {
        SetAdaptor::new(SetOp::Exclusive, rhs)
    }

    pub fn overlap_by<L, R, C>(lhs: L, rhs: R, cmp: C) -> SetView<L::IntoIter, R::IntoIter, C>
    where
        L: IntoIterator,
        R: IntoIterator<Item = L::Item>,
        C: Comparator<L::Item>,
    {
        SetView::new(SetOp::Overlap, lhs.into_iter(), rhs.into_iter(), cmp)
    }

    pub fn subtract_by<L, R, C>(lhs: L, rhs: R, cmp: C) -> SetView<L::IntoIter, R::IntoIter, C>
    where
        L: IntoIterator,
        R: IntoIterator<Item = L::Item>,
        C: Comparator<L::Item>,
    {
        SetView::new(SetOp::Subtract, lhs.into_iter(), rhs.into_iter(), cmp)
    }

    pub fn merge_by<L, R, C>(lhs: L, rhs: R, cmp: C) -> SetView<L::IntoIter, R::IntoIter, C>
    where
        L: IntoIterator,
        R: IntoIterator<Item = L::Item>,
        C: Comparator<L::Item>,
    {
        SetView::new(SetOp::Merge, lhs.into_iter(), rhs.into_iter(), cmp)
    }

    pub fn exclusive_by<L, R, C>(lhs: L, rhs: R, cmp: C) -> SetView<L::IntoIter, R::IntoIter, C>
    where
        L: IntoIterator,
        R: IntoIterator<Item = L::Item>,
        C: Comparator<L::Item>,
    {
        SetView::new(SetOp::Exclusive, lhs.into_iter(), rhs.into_iter(), cmp)
    }
}

/// Set algebra as iterator methods, for sequences of `(key, value)` pairs sorted by key.
pub trait SetAlgebraExt: Iterator + Sized {
    fn set_view<R, C>(self, op: SetOp, rhs: R, cmp: C) -> SetView<Self, R::IntoIter, C>
    where
        R: IntoIterator<Item = Self::Item>,
        C: Comparator<Self::Item>,
    {
        SetView::new(op, self, rhs.into_iter(), cmp)
    }

    fn overlap<R>(self, rhs: R) -> SetView<Self, R::IntoIter, ByKey>
    where
        R: IntoIterator<Item = Self::Item>,
        ByKey: Comparator<Self::Item>,
    {
        self.set_view(SetOp::Overlap, rhs, ByKey)
    }

    fn subtract<R>(self, rhs: R) -> SetView<Self, R::IntoIter, ByKey>
    where
        R: IntoIterator<Item = Self::Item>,
        ByKey: Comparator<Self::Item>,
    {
        self.set_view(SetOp::Subtract, rhs, ByKey)
    }

    fn merge<R>(self, rhs: R) -> SetView<Self, R::IntoIter, ByKey>
    where
        R: IntoIterator<Item = Self::Item>,
        ByKey: Comparator<Self::Item>,
    {
        self.set_view(SetOp::Merge, rhs, ByKey)
    }

    fn exclusive<R>(self, rhs: R) -> SetView<Self, R::IntoIter, ByKey>
    where
        R: IntoIterator<Item = Self::Item>,
        ByKey: Comparator<Self::Item>,
    {
        self.set_view(SetOp::Exclusive, rhs, ByKey)
    }
}

impl<I: Iterator> SetAlgebraExt for I {}

/// Checks that `iter` never decreases under `cmp`. Equal neighbors are allowed.
///
/// Reports the position of the first item that is less than its predecessor.
pub fn check_ordered<I, C>(iter: I, mut cmp: C) -> Result<()>
where
    I: IntoIterator,
    I::Item: Clone,
    C: Comparator<I::Item>,
{
    let first_descent = itertools::Itertools::tuple_windows::<(_, _)>(iter.into_iter())
        .position(|(a, b)| cmp.compare(&a, &b) == Ordering::Greater);
    match first_descent {
        Some(i) => Err(Error::Unordered { index: i + 1 }),
        None => Ok(()),
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

    const LEFT: [i32; 5] = [1, 2, 4, 6, 9];
    const RIGHT: [i32; 5] = [2, 3, 4, 7, 9];

    fn run(op: SetOp, left: &[i32], right: &[i32]) -> Vec<i32> {
        SetView::new(op, left.iter().copied(), right.iter().copied(), i32::cmp).collect()
    }

    #[test]
    fn each_operation_on_integers() {
        assert_eq!(run(SetOp::Overlap, &LEFT, &RIGHT), [2, 4, 9]);
        assert_eq!(run(SetOp::Subtract, &LEFT, &RIGHT), [1, 6]);
        assert_eq!(run(SetOp::Merge, &LEFT, &RIGHT), [1, 2, 3, 4, 6, 7, 9]);
        assert_eq!(run(SetOp::Exclusive, &LEFT, &RIGHT), [1, 3, 6, 7]);
    }

    #[test]
    fn empty_sides() {
        for op in [SetOp::Overlap, SetOp::Subtract, SetOp::Merge, SetOp::Exclusive] {
            assert!(run(op, &[], &[]).is_empty());
        }
        assert!(run(SetOp::Overlap, &LEFT, &[]).is_empty());
        assert_eq!(run(SetOp::Subtract, &LEFT, &[]), LEFT);
        assert!(run(SetOp::Subtract, &[], &RIGHT).is_empty());
        assert_eq!(run(SetOp::Merge, &[], &RIGHT), RIGHT);
        assert_eq!(run(SetOp::Exclusive, &LEFT, &[]), LEFT);
    }

    #[test]
    fn overlap_stops_when_the_right_side_runs_out() {
        assert_eq!(run(SetOp::Overlap, &[1, 5], &[1]), [1]);
        assert_eq!(run(SetOp::Overlap, &[1], &[1, 5]), [1]);
    }

    #[test]
    fn ties_take_the_left_value() {
        let left = [(1, "l1"), (3, "l3")];
        let right = [(1, "r1"), (2, "r2"), (3, "r3")];
        let merged: Vec<_> = left.into_iter().merge(right).collect();
        assert_eq!(merged, [(1, "l1"), (2, "r2"), (3, "l3")]);
        let both: Vec<_> = left.into_iter().overlap(right).collect();
        assert_eq!(both, [(1, "l1"), (3, "l3")]);
    }

    #[test]
    fn adaptors_compose() {
        let a = [(1, 'a'), (2, 'a'), (5, 'a')];
        let b = [(2, 'b'), (3, 'b')];
        let c = [(5, 'c')];
        let view = views::merge(b).apply(a) | views::subtract(c);
        let keys: Vec<_> = view.map(|(k, _)| k).collect();
        assert_eq!(keys, [1, 2, 3]);

        let descending = views::overlap_by([5, 3, 1], [4, 3, 1], |a: &i32, b: &i32| b.cmp(a));
        assert_eq!(descending.collect::<Vec<_>>(), [3, 1]);

        let by_value = views::exclusive([(9, 1), (9, 2)]).by(|a: &(i32, i32), b: &(i32, i32)| a.1.cmp(&b.1));
        assert_eq!(by_value.apply([(0, 2)]).collect::<Vec<_>>(), [(9, 1)]);
    }

    #[test]
    fn unsorted_input_does_not_panic() {
        let out = run(SetOp::Merge, &[3, 1, 2], &[2, 0]);
        assert_eq!(out.len(), 5);
        assert_eq!(check_ordered([3, 1, 2], i32::cmp), Err(Error::Unordered { index: 1 }));
    }

    #[test]
    fn ordering_check() {
        assert_eq!(check_ordered(LEFT, i32::cmp), Ok(()));
        assert_eq!(check_ordered([1, 1, 2], i32::cmp), Ok(()));
        assert_eq!(check_ordered(Vec::<i32>::new(), i32::cmp), Ok(()));
        assert_eq!(check_ordered([1, 2, 2, 0], i32::cmp), Err(Error::Unordered { index: 3 }));
    }
}
