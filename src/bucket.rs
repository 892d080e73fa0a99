use alloc::vec::Vec;
use core::cmp::Ordering;
use core::iter::Zip;
use core::ops::Index;
use core::slice;

use crate::conflict;
use crate::datatype::{KeyType, ValueType};
use crate::error::{Error, Result};
use crate::leaf::{self, KeyRange, OrderedLeaf, SearchResult};
use crate::raw::LeafId;
use crate::state::BucketState;

/// A leaf mapping keys to values.
///
/// Keys are kept strictly increasing in one vector, with the value for
/// `keys[i]` at `values[i]` in another. The bucket never decides on its own
/// when to split; the tree layer checks [`OrderedLeaf::is_overfull`] and calls
/// [`LeafArena::split`](crate::LeafArena::split).
///
/// # Examples
///
/// ```
/// use btree_buckets::{Bucket, KeyRange, OrderedLeaf};
///
/// let mut bucket = Bucket::new();
/// bucket.insert(3u32, 30u32)?;
/// bucket.insert(1, 10)?;
/// bucket.insert(2, 20)?;
///
/// assert_eq!(bucket.get(&2), Some(&20));
/// assert_eq!(bucket.keys(&KeyRange::new().min(&2)), &[2, 3]);
/// assert_eq!(bucket.pop(&1)?, 10);
/// # Ok::<(), btree_buckets::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Bucket<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
    next: Option<LeafId>,
}

/// Iterator over the `(key, value)` entries of a [`Bucket`].
pub type Items<'a, K, V> = Zip<slice::Iter<'a, K>, slice::Iter<'a, V>>;

impl<K, V> Bucket<K, V> {
    /// Creates an empty bucket.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            next: None,
        }
    }

    /// Wraps parallel vectors whose keys are already strictly increasing.
    pub(crate) const fn from_sorted(keys: Vec<K>, values: Vec<V>) -> Self {
        Self {
            keys,
            values,
            next: None,
        }
    }

    /// Removes every entry. The successor link is kept.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }
}

impl<K: KeyType, V: ValueType> Bucket<K, V> {
    /// Returns the value stored for `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        match self.search(key) {
            SearchResult::Found(index) => Some(&self.values[index]),
            SearchResult::InsertAt(_) => None,
        }
    }

    #[must_use]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.search(key) {
            SearchResult::Found(index) => Some(&mut self.values[index]),
            SearchResult::InsertAt(_) => None,
        }
    }

    /// Returns the value stored for `key`, or `default`.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &K, default: &'a V) -> &'a V {
        self.get(key).unwrap_or(default)
    }

    /// Returns the value stored for `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if `key` is not stored.
    pub fn get_item(&self, key: &K) -> Result<&V> {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Stores `value` under `key`, returning the value it replaces.
    ///
    /// # Errors
    ///
    /// A [`TypeError`](crate::TypeError) if the key cannot be ordered against the stored keys or
    /// the value is rejected by its descriptor. The bucket is left unchanged.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        leaf::check_key(&self.keys, &key)?;
        value.check_value()?;
        Ok(self.insert_checked(key, value))
    }

    fn insert_checked(&mut self, key: K, value: V) -> Option<V> {
        match self.search(&key) {
            SearchResult::Found(index) => Some(core::mem::replace(&mut self.values[index], value)),
            SearchResult::InsertAt(index) => {
                self.keys.insert(index, key);
                self.values.insert(index, value);
                None
            }
        }
    }

    /// Returns the value for `key`, first storing `default` if there is none.
    ///
    /// # Errors
    ///
    /// As [`Bucket::insert`] when `key` is missing.
    pub fn set_default(&mut self, key: K, default: V) -> Result<&V> {
        let index = match self.search(&key) {
            SearchResult::Found(index) => index,
            SearchResult::InsertAt(index) => {
                leaf::check_key(&self.keys, &key)?;
                default.check_value()?;
                self.keys.insert(index, key);
                self.values.insert(index, default);
                index
            }
        };
        Ok(&self.values[index])
    }

    /// Removes `key` and returns its value.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if `key` is not stored.
    pub fn pop(&mut self, key: &K) -> Result<V> {
        match self.search(key) {
            SearchResult::Found(index) => {
                self.keys.remove(index);
                Ok(self.values.remove(index))
            }
            SearchResult::InsertAt(_) => Err(Error::KeyNotFound),
        }
    }

    /// Removes `key` and returns its value, or `default` if it is not stored.
    pub fn pop_or(&mut self, key: &K, default: V) -> V {
        self.pop(key).unwrap_or(default)
    }

    /// Removes `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if `key` is not stored.
    pub fn remove(&mut self, key: &K) -> Result<()> {
        self.pop(key).map(drop)
    }

    /// Stores every entry of `entries`. Later entries win over earlier ones
    /// with the same key.
    ///
    /// Accepts anything that yields `(key, value)` pairs: a map, another
    /// bucket, or a sequence of pairs.
    ///
    /// # Errors
    ///
    /// A [`TypeError`](crate::TypeError) if any key or value is rejected. Nothing is stored in
    /// that case.
    pub fn update<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let entries: Vec<(K, V)> = entries.into_iter().collect();

        let anchor = self.keys.first().or_else(|| entries.first().map(|(key, _)| key));
        for (key, value) in &entries {
            key.check_key()?;
            if let Some(anchor) = anchor {
                key.comparable_with(anchor)?;
            }
            value.check_value()?;
        }

        for (key, value) in entries {
            self.insert_checked(key, value);
        }
        Ok(())
    }

    /// Returns the values of the keys within `range`.
    pub fn values(&self, range: &KeyRange<'_, K>) -> &[V] {
        let (lo, hi) = self.range(range);
        &self.values[lo..hi]
    }

    /// Iterates the `(key, value)` entries within `range`.
    pub fn items(&self, range: &KeyRange<'_, K>) -> Items<'_, K, V> {
        let (lo, hi) = self.range(range);
        self.keys[lo..hi].iter().zip(&self.values[lo..hi])
    }

    /// Iterates every `(key, value)` entry.
    pub fn iter(&self) -> Items<'_, K, V> {
        self.keys.iter().zip(&self.values)
    }

    /// Returns the serialized state of this bucket.
    #[must_use]
    pub fn state(&self) -> BucketState<K, V> {
        BucketState {
            keys: self.keys.clone(),
            values: self.values.clone(),
            next: self.next,
        }
    }

    #[must_use]
    pub fn into_state(self) -> BucketState<K, V> {
        BucketState {
            keys: self.keys,
            values: self.values,
            next: self.next,
        }
    }

    /// Replaces the contents and successor link with `state`.
    ///
    /// # Errors
    ///
    /// [`TypeError::MalformedState`](crate::TypeError::MalformedState) if the keys are not strictly increasing or
    /// the key and value counts differ, or any type error a stored key or
    /// value would raise. The bucket is left unchanged.
    pub fn set_state(&mut self, state: BucketState<K, V>) -> Result<()> {
        *self = Self::from_state(state)?;
        Ok(())
    }

    /// Builds a bucket from its serialized state.
    ///
    /// # Errors
    ///
    /// As [`Bucket::set_state`].
    pub fn from_state(state: BucketState<K, V>) -> Result<Self> {
        if state.keys.len() != state.values.len() {
            return Err(Error::malformed_state("key and value counts differ"));
        }
        leaf::check_sorted_keys(&state.keys)?;
        state.values.iter().try_for_each(ValueType::check_value)?;

        Ok(Self {
            keys: state.keys,
            values: state.values,
            next: state.next,
        })
    }

    /// Merges two states written concurrently against the common ancestor
    /// `old`.
    ///
    /// # Errors
    ///
    /// [`Error::Conflict`] with the [`ConflictReason`](crate::ConflictReason)
    /// of the first edit that cannot be reconciled.
    pub fn resolve_conflict(
        old: &BucketState<K, V>,
        committed: &BucketState<K, V>,
        new: &BucketState<K, V>,
    ) -> Result<BucketState<K, V>> {
        conflict::resolve(old, committed, new).map_err(Error::from)
    }
}

impl<K: KeyType, V: ValueType + PartialOrd> Bucket<K, V> {
    /// Returns the `(value, key)` pairs whose value is at least `min`, highest
    /// value first.
    ///
    /// Values that do not compare (such as a NaN float) are left out.
    #[must_use]
    pub fn by_value(&self, min: &V) -> Vec<(&V, &K)> {
        let mut pairs: Vec<(&V, &K)> = self
            .values
            .iter()
            .zip(&self.keys)
            .filter(|(value, _)| matches!((*value).partial_cmp(min), Some(Ordering::Greater | Ordering::Equal)))
            .collect();
        pairs.sort_by(|a, b| b.0.partial_cmp(a.0).unwrap_or(Ordering::Equal).then_with(|| b.1.cmp(a.1)));
        pairs
    }
}

impl<K: KeyType, V: ValueType> OrderedLeaf for Bucket<K, V> {
    type Key = K;

    const MAX_SIZE: usize = if V::NATIVE {
        K::NATIVE_VALUE_LEAF_SIZE
    } else {
        K::OBJECT_VALUE_LEAF_SIZE
    };

    #[inline]
    fn key_slice(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    fn next(&self) -> Option<LeafId> {
        self.next
    }

    #[inline]
    fn set_next(&mut self, next: Option<LeafId>) {
        self.next = next;
    }

    fn split_off(&mut self, index: usize) -> Self {
        Self {
            keys: self.keys.split_off(index),
            values: self.values.split_off(index),
            next: None,
        }
    }
}

impl<K, V> Default for Bucket<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: KeyType, V: ValueType> Index<&K> for Bucket<K, V> {
    type Output = V;

    /// # Panics
    ///
    /// Panics if `key` is not stored.
    fn index(&self, key: &K) -> &V {
        self.get(key).expect("`Bucket::index()` - key not found!")
    }
}

impl<'a, K: KeyType, V: ValueType> IntoIterator for &'a Bucket<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Items<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> IntoIterator for Bucket<K, V> {
    type Item = (K, V);
    type IntoIter = Zip<alloc::vec::IntoIter<K>, alloc::vec::IntoIter<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter().zip(self.values)
    }
}

impl<K: KeyType, V: ValueType> TryFrom<BucketState<K, V>> for Bucket<K, V> {
    type Error = Error;

    fn try_from(state: BucketState<K, V>) -> Result<Self> {
        Self::from_state(state)
    }
}
