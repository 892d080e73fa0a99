//! Set algebra over sorted leaves.
//!
//! Every operation opens one [`MergeCursor`] per input and walks them in lock
//! step: find the smallest current key among the active cursors, collect the
//! cursors positioned on it, apply the operation's rule to that group, and
//! advance the group. Inputs are anything exposing sorted keys through
//! [`KeySource`], so buckets, sets and their serialized states mix freely.
//!
//! ```
//! use btree_buckets::{set_ops, Set};
//!
//! let mut a = Set::new();
//! a.update([1u32, 3, 5])?;
//! let mut b = Set::new();
//! b.update([2u32, 3, 4])?;
//!
//! assert_eq!(set_ops::union(&a, &b).iter().copied().collect::<Vec<_>>(), [1, 2, 3, 4, 5]);
//! assert_eq!(set_ops::intersection(&a, &b).iter().copied().collect::<Vec<_>>(), [3]);
//! assert_eq!(set_ops::difference(&a, &b).iter().copied().collect::<Vec<_>>(), [1, 5]);
//! # Ok::<(), btree_buckets::Error>(())
//! ```

use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::bucket::Bucket;
use crate::datatype::{KeyType, UnionKey, ValueType, WeightedValue};
use crate::set::Set;
use crate::state::{BucketState, SetState};

mod cursor;

pub use cursor::MergeCursor;

/// Indices of the cursors positioned on the current key.
type Matched = SmallVec<[usize; 8]>;

/// A sorted run of keys that can feed the set algebra.
pub trait KeySource<K> {
    /// Returns the keys in strictly increasing order.
    fn key_slice(&self) -> &[K];
}

/// A [`KeySource`] that may carry a value for every key.
pub trait ValueSource<K, V>: KeySource<K> {
    /// Returns the values paired with [`KeySource::key_slice`], or `None` for
    /// inputs without values.
    fn value_slice(&self) -> Option<&[V]>;
}

/// Inputs that can be narrowed to a subset of their own entries, so that
/// [`difference`] returns the same shape it was given.
pub trait Retain<K>: KeySource<K> + Sized {
    /// Returns a new, unlinked leaf holding the entries at `positions`.
    ///
    /// `positions` is strictly increasing.
    #[must_use]
    fn retain_positions(&self, positions: &[usize]) -> Self;
}

impl<K: KeyType, V: ValueType> KeySource<K> for Bucket<K, V> {
    fn key_slice(&self) -> &[K] {
        crate::OrderedLeaf::key_slice(self)
    }
}

impl<K: KeyType, V: ValueType> ValueSource<K, V> for Bucket<K, V> {
    fn value_slice(&self) -> Option<&[V]> {
        Some(self.values(&crate::KeyRange::new()))
    }
}

impl<K: KeyType, V: ValueType> Retain<K> for Bucket<K, V> {
    fn retain_positions(&self, positions: &[usize]) -> Self {
        let keys = KeySource::key_slice(self);
        let values = self.values(&crate::KeyRange::new());
        Self::from_sorted(
            positions.iter().map(|&i| keys[i].clone()).collect(),
            positions.iter().map(|&i| values[i].clone()).collect(),
        )
    }
}

impl<K: KeyType> KeySource<K> for Set<K> {
    fn key_slice(&self) -> &[K] {
        crate::OrderedLeaf::key_slice(self)
    }
}

impl<K: KeyType, V> ValueSource<K, V> for Set<K> {
    fn value_slice(&self) -> Option<&[V]> {
        None
    }
}

impl<K: KeyType> Retain<K> for Set<K> {
    fn retain_positions(&self, positions: &[usize]) -> Self {
        let keys = KeySource::key_slice(self);
        Self::from_sorted(positions.iter().map(|&i| keys[i].clone()).collect())
    }
}

impl<K, V> KeySource<K> for BucketState<K, V> {
    fn key_slice(&self) -> &[K] {
        self.keys()
    }
}

impl<K, V> ValueSource<K, V> for BucketState<K, V> {
    fn value_slice(&self) -> Option<&[V]> {
        Some(self.values())
    }
}

impl<K> KeySource<K> for SetState<K> {
    fn key_slice(&self) -> &[K] {
        self.keys()
    }
}

impl<K, V> ValueSource<K, V> for SetState<K> {
    fn value_slice(&self) -> Option<&[V]> {
        None
    }
}

/// Walks `cursors` in lock step, calling `rule` once per distinct key with the
/// indices of the cursors positioned on it.
fn merge<'a, K, V, F>(cursors: &mut [MergeCursor<'a, K, V>], mut rule: F)
where
    K: Ord,
    F: FnMut(&'a K, &[usize], &[MergeCursor<'a, K, V>]),
{
    while let Some(min) = cursors.iter().filter_map(MergeCursor::key).min() {
        let matched: Matched =
            cursors.iter().enumerate().filter(|(_, cursor)| cursor.key() == Some(min)).map(|(i, _)| i).collect();
        rule(min, &matched, cursors);
        for &i in &matched {
            cursors[i].advance();
        }
    }
}

fn key_cursor<K, A>(source: &A) -> MergeCursor<'_, K, ()>
where
    A: KeySource<K> + ?Sized,
{
    MergeCursor::new(source.key_slice())
}

fn value_cursor<'a, K, V, A>(source: &'a A, fill: &'a V) -> MergeCursor<'a, K, V>
where
    A: ValueSource<K, V> + ?Sized,
{
    match source.value_slice() {
        Some(values) => MergeCursor::with_values(source.key_slice(), values),
        None => MergeCursor::new(source.key_slice()).with_default(fill),
    }
}

/// Keys present in either input.
#[must_use]
pub fn union<K, A, B>(a: &A, b: &B) -> Set<K>
where
    K: KeyType,
    A: KeySource<K> + ?Sized,
    B: KeySource<K> + ?Sized,
{
    let mut keys = Vec::with_capacity(a.key_slice().len().max(b.key_slice().len()));
    merge(&mut [key_cursor(a), key_cursor(b)], |key, _, _| keys.push(key.clone()));

    #[cfg(feature = "tracing")]
    tracing::trace!(op = "union", len = keys.len(), "set operation complete");

    Set::from_sorted(keys)
}

/// Keys present in both inputs.
#[must_use]
pub fn intersection<K, A, B>(a: &A, b: &B) -> Set<K>
where
    K: KeyType,
    A: KeySource<K> + ?Sized,
    B: KeySource<K> + ?Sized,
{
    let mut keys = Vec::new();
    merge(&mut [key_cursor(a), key_cursor(b)], |key, matched, _| {
        if matched.len() == 2 {
            keys.push(key.clone());
        }
    });

    #[cfg(feature = "tracing")]
    tracing::trace!(op = "intersection", len = keys.len(), "set operation complete");

    Set::from_sorted(keys)
}

/// Entries of `a` whose key is not in `b`.
///
/// A bucket keeps its values, a set stays a set.
#[must_use]
pub fn difference<K, A, B>(a: &A, b: &B) -> A
where
    K: KeyType,
    A: Retain<K>,
    B: KeySource<K> + ?Sized,
{
    let mut positions = Vec::new();
    merge(&mut [key_cursor(a), key_cursor(b)], |_, matched, cursors| {
        if matched == [0] {
            positions.push(cursors[0].position());
        }
    });

    #[cfg(feature = "tracing")]
    tracing::trace!(op = "difference", len = positions.len(), "set operation complete");

    a.retain_positions(&positions)
}

/// Union with values combined by weight.
///
/// A key in both inputs maps to `va * wa + vb * wb`, a key in one input to
/// its value times that input's weight. An input without values counts
/// [`WeightedValue::IDENTITY`] for each of its keys. Returns the weight of the
/// result, which is always the identity, alongside it.
///
/// ```
/// use btree_buckets::{set_ops, Bucket};
///
/// let mut a = Bucket::new();
/// a.insert(1u32, 1i32)?;
/// let mut b = Bucket::new();
/// b.update([(1u32, 2i32), (2, 3)])?;
///
/// let (weight, merged) = set_ops::weighted_union(&a, &b, 1, 1);
/// assert_eq!(weight, 1);
/// assert_eq!(merged.iter().collect::<Vec<_>>(), [(&1, &3), (&2, &3)]);
/// # Ok::<(), btree_buckets::Error>(())
/// ```
#[must_use]
pub fn weighted_union<K, V, A, B>(a: &A, b: &B, weight_a: V, weight_b: V) -> (V, Bucket<K, V>)
where
    K: KeyType,
    V: WeightedValue,
    A: ValueSource<K, V> + ?Sized,
    B: ValueSource<K, V> + ?Sized,
{
    weighted(a, b, &weight_a, &weight_b, true, "weighted_union")
}

/// Intersection with values combined by weight.
///
/// Every key in both inputs maps to `va * wa + vb * wb`; see
/// [`weighted_union`].
#[must_use]
pub fn weighted_intersection<K, V, A, B>(a: &A, b: &B, weight_a: V, weight_b: V) -> (V, Bucket<K, V>)
where
    K: KeyType,
    V: WeightedValue,
    A: ValueSource<K, V> + ?Sized,
    B: ValueSource<K, V> + ?Sized,
{
    weighted(a, b, &weight_a, &weight_b, false, "weighted_intersection")
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn weighted<K, V, A, B>(a: &A, b: &B, weight_a: &V, weight_b: &V, keep_unmatched: bool, op: &str) -> (V, Bucket<K, V>)
where
    K: KeyType,
    V: WeightedValue,
    A: ValueSource<K, V> + ?Sized,
    B: ValueSource<K, V> + ?Sized,
{
    let fill = V::IDENTITY;
    let weights = [weight_a, weight_b];
    let mut keys = Vec::new();
    let mut values = Vec::new();

    merge(&mut [value_cursor(a, &fill), value_cursor(b, &fill)], |key, matched, cursors| {
        let value = match *matched {
            [i] if keep_unmatched => cursors[i].value().map(|value| value.apply_weight(weights[i])),
            [_, _] => match (cursors[0].value(), cursors[1].value()) {
                (Some(va), Some(vb)) => Some(va.merge_weighted(weight_a, vb, weight_b)),
                _ => None,
            },
            _ => None,
        };
        if let Some(value) = value {
            keys.push(key.clone());
            values.push(value);
        }
    });

    #[cfg(feature = "tracing")]
    tracing::trace!(op, len = keys.len(), "set operation complete");

    (V::IDENTITY, Bucket::from_sorted(keys, values))
}

/// Keys present in any of `sources`.
///
/// ```
/// use btree_buckets::{set_ops, Set};
/// use btree_buckets::set_ops::KeySource;
///
/// let mut a = Set::new();
/// a.update([1u64, 4])?;
/// let mut b = Set::new();
/// b.update([2u64, 4])?;
/// let c: Set<u64> = Set::new();
///
/// let sources: [&dyn KeySource<u64>; 3] = [&a, &b, &c];
/// assert_eq!(set_ops::multiunion(&sources).iter().copied().collect::<Vec<_>>(), [1, 2, 4]);
/// # Ok::<(), btree_buckets::Error>(())
/// ```
#[must_use]
pub fn multiunion<K: UnionKey>(sources: &[&dyn KeySource<K>]) -> Set<K> {
    let mut cursors: Vec<MergeCursor<'_, K, ()>> = sources.iter().map(|source| key_cursor(*source)).collect();
    let mut keys = Vec::new();
    merge(&mut cursors, |key, _, _| keys.push(key.clone()));

    #[cfg(feature = "tracing")]
    tracing::trace!(op = "multiunion", inputs = sources.len(), len = keys.len(), "set operation complete");

    Set::from_sorted(keys)
}

/// Keys present in any of `sources`, each mapped to the number of sources
/// that contain it.
#[must_use]
pub fn multiunion_counts<K: UnionKey>(sources: &[&dyn KeySource<K>]) -> Bucket<K, u64> {
    let mut cursors: Vec<MergeCursor<'_, K, ()>> = sources.iter().map(|source| key_cursor(*source)).collect();
    let mut keys = Vec::new();
    let mut counts = Vec::new();
    merge(&mut cursors, |key, matched, _| {
        keys.push(key.clone());
        counts.push(matched.len() as u64);
    });

    #[cfg(feature = "tracing")]
    tracing::trace!(op = "multiunion_counts", inputs = sources.len(), len = keys.len(), "set operation complete");

    Bucket::from_sorted(keys, counts)
}
