//! Machinery shared by every leaf kind.
//!
//! A leaf is a strictly increasing run of keys plus a `next` link to the leaf
//! that follows it in global key order. [`OrderedLeaf`] asks an implementor for
//! exactly those two things (and how to cut the run in two) and derives binary
//! search, bounded ranges, bound queries and splitting from them.

use core::slice;

use crate::datatype::KeyType;
use crate::error::{Error, Result, TypeError};
use crate::raw::LeafId;

/// Result of searching for a key in a leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SearchResult {
    /// Key was found at the given index.
    Found(usize),
    /// Key was not found; index is where it would be inserted.
    InsertAt(usize),
}

impl SearchResult {
    /// Returns the matched index or the insertion point.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Found(index) | Self::InsertAt(index) => index,
        }
    }

    #[must_use]
    pub const fn is_found(self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Returns the signed single-integer encoding: the index itself when found,
    /// `-(insertion point) - 1` otherwise.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn encoded(self) -> isize {
        match self {
            Self::Found(index) => index as isize,
            Self::InsertAt(index) => -(index as isize) - 1,
        }
    }
}

/// Bounds for a range query over a leaf.
///
/// The exclusion flags only matter when the bound is an exact hit. An
/// exclusion flag without a bound drops the first (or last) key.
///
/// ```
/// use btree_buckets::KeyRange;
///
/// let range = KeyRange::new().min(&3).max(&9).exclude_max();
/// assert!(range.excludes_max());
/// ```
#[derive(Debug)]
pub struct KeyRange<'a, K> {
    min: Option<&'a K>,
    max: Option<&'a K>,
    exclude_min: bool,
    exclude_max: bool,
}

impl<'a, K> KeyRange<'a, K> {
    /// Creates an unbounded range.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            min: None,
            max: None,
            exclude_min: false,
            exclude_max: false,
        }
    }

    #[must_use]
    pub const fn min(mut self, min: &'a K) -> Self {
        self.min = Some(min);
        self
    }

    #[must_use]
    pub const fn max(mut self, max: &'a K) -> Self {
        self.max = Some(max);
        self
    }

    #[must_use]
    pub const fn exclude_min(mut self) -> Self {
        self.exclude_min = true;
        self
    }

    #[must_use]
    pub const fn exclude_max(mut self) -> Self {
        self.exclude_max = true;
        self
    }

    #[must_use]
    pub const fn lower(&self) -> Option<&'a K> {
        self.min
    }

    #[must_use]
    pub const fn upper(&self) -> Option<&'a K> {
        self.max
    }

    #[must_use]
    pub const fn excludes_min(&self) -> bool {
        self.exclude_min
    }

    #[must_use]
    pub const fn excludes_max(&self) -> bool {
        self.exclude_max
    }
}

impl<K> Clone for KeyRange<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for KeyRange<'_, K> {}

impl<K> Default for KeyRange<'_, K> {
    fn default() -> Self {
        Self::new()
    }
}

/// An ordered run of keys linked to its successor leaf.
///
/// Implemented by [`Bucket`](crate::Bucket) and [`Set`](crate::Set).
pub trait OrderedLeaf {
    type Key: KeyType;

    /// Number of keys above which the tree layer should split the leaf.
    const MAX_SIZE: usize;

    /// Returns the keys in increasing order.
    fn key_slice(&self) -> &[Self::Key];

    /// Returns the successor leaf, if any.
    fn next(&self) -> Option<LeafId>;

    fn set_next(&mut self, next: Option<LeafId>);

    /// Moves the entries at `index..` into a new, unlinked leaf.
    ///
    /// Callers guarantee `index <= self.len()`.
    #[must_use]
    fn split_off(&mut self, index: usize) -> Self
    where
        Self: Sized;

    #[inline]
    fn len(&self) -> usize {
        self.key_slice().len()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.key_slice().is_empty()
    }

    /// Binary searches for `key`.
    ///
    /// ```
    /// use btree_buckets::{OrderedLeaf, SearchResult, Set};
    ///
    /// let mut set = Set::new();
    /// set.update([10u32, 20, 30])?;
    /// assert_eq!(set.search(&20), SearchResult::Found(1));
    /// assert_eq!(set.search(&25), SearchResult::InsertAt(2));
    /// assert_eq!(set.search(&25).encoded(), -3);
    /// # Ok::<(), btree_buckets::Error>(())
    /// ```
    fn search(&self, key: &Self::Key) -> SearchResult {
        match self.key_slice().binary_search(key) {
            Ok(index) => SearchResult::Found(index),
            Err(index) => SearchResult::InsertAt(index),
        }
    }

    #[inline]
    fn contains(&self, key: &Self::Key) -> bool {
        self.search(key).is_found()
    }

    /// Returns the half-open index range `(lo, hi)` of the keys within `range`.
    ///
    /// Always `lo <= hi <= len`.
    fn range(&self, range: &KeyRange<'_, Self::Key>) -> (usize, usize) {
        let len = self.len();

        let lo = match range.lower() {
            None => usize::from(range.excludes_min()),
            Some(min) => match self.search(min) {
                SearchResult::Found(index) => index + usize::from(range.excludes_min()),
                SearchResult::InsertAt(index) => index,
            },
        };
        let hi = match range.upper() {
            None => {
                if range.excludes_max() {
                    len.saturating_sub(1)
                } else {
                    len
                }
            }
            Some(max) => match self.search(max) {
                SearchResult::Found(index) => {
                    if range.excludes_max() {
                        index
                    } else {
                        index + 1
                    }
                }
                SearchResult::InsertAt(index) => index,
            },
        };

        let hi = hi.min(len);
        (lo.min(hi), hi)
    }

    /// Returns the keys within `range`.
    fn keys(&self, range: &KeyRange<'_, Self::Key>) -> &[Self::Key] {
        let (lo, hi) = self.range(range);
        &self.key_slice()[lo..hi]
    }

    fn iter_keys(&self, range: &KeyRange<'_, Self::Key>) -> slice::Iter<'_, Self::Key> {
        self.keys(range).iter()
    }

    /// Returns the smallest key, or the smallest key `>= floor`.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyLeaf`] if the leaf has no keys, [`Error::InvalidBound`]
    /// if every key is below `floor`.
    fn min_key(&self, floor: Option<&Self::Key>) -> Result<&Self::Key> {
        let keys = self.key_slice();
        let first = keys.first().ok_or(Error::EmptyLeaf)?;
        match floor {
            None => Ok(first),
            Some(floor) => keys.get(self.search(floor).index()).ok_or(Error::InvalidBound),
        }
    }

    /// Returns the largest key, or the largest key `<= ceiling`.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyLeaf`] if the leaf has no keys, [`Error::InvalidBound`]
    /// if every key is above `ceiling`.
    fn max_key(&self, ceiling: Option<&Self::Key>) -> Result<&Self::Key> {
        let keys = self.key_slice();
        let last = keys.last().ok_or(Error::EmptyLeaf)?;
        match ceiling {
            None => Ok(last),
            Some(ceiling) => {
                let index = match self.search(ceiling) {
                    SearchResult::Found(index) => Some(index),
                    SearchResult::InsertAt(index) => index.checked_sub(1),
                };
                index.and_then(|index| keys.get(index)).ok_or(Error::InvalidBound)
            }
        }
    }

    /// Splits off the keys from `index` on into a new leaf that inherits this
    /// leaf's `next`.
    ///
    /// `None`, or an index outside the leaf, splits at the midpoint.
    ///
    /// # Chain
    ///
    /// The returned leaf is not linked. This leaf's `next` is cleared, so
    /// the caller must store the new leaf and point this leaf's `next` at it.
    /// [`LeafArena::split`](crate::LeafArena::split) does both and is the way
    /// to split a leaf that is already part of a chain.
    #[must_use]
    fn split(&mut self, index: Option<usize>) -> Self
    where
        Self: Sized,
    {
        let len = self.len();
        let index = match index {
            Some(index) if index < len => index,
            _ => len / 2,
        };

        let mut right = self.split_off(index);
        right.set_next(self.next());
        self.set_next(None);

        #[cfg(feature = "tracing")]
        tracing::debug!(index, left = self.len(), right = right.len(), "split leaf");

        right
    }

    /// Whether the leaf has grown past [`OrderedLeaf::MAX_SIZE`].
    #[inline]
    fn is_overfull(&self) -> bool {
        self.len() > Self::MAX_SIZE
    }
}

/// Checks that `key` may be stored among `keys`.
pub(crate) fn check_key<K: KeyType>(keys: &[K], key: &K) -> core::result::Result<(), TypeError> {
    key.check_key()?;
    match keys.first() {
        Some(stored) => key.comparable_with(stored),
        None => Ok(()),
    }
}

/// Checks that decoded `keys` are storable and strictly increasing.
pub(crate) fn check_sorted_keys<K: KeyType>(keys: &[K]) -> Result<()> {
    for key in keys {
        check_key(keys, key)?;
    }
    if keys.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(Error::malformed_state("keys are not strictly increasing"));
    }
    Ok(())
}
