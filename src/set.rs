use alloc::vec::Vec;
use core::slice;

use crate::conflict;
use crate::datatype::KeyType;
use crate::error::{Error, Result};
use crate::leaf::{self, OrderedLeaf, SearchResult};
use crate::raw::LeafId;
use crate::state::SetState;

/// A leaf of unique keys.
///
/// # Examples
///
/// ```
/// use btree_buckets::{OrderedLeaf, Set};
///
/// let mut set = Set::new();
/// assert_eq!(set.update([3i64, 1, 2, 3])?, 3);
/// assert!(!set.insert(2)?);
/// assert_eq!(set.get_by_index(0)?, &1);
/// assert_eq!(set.max_key(None)?, &3);
/// # Ok::<(), btree_buckets::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Set<K> {
    keys: Vec<K>,
    next: Option<LeafId>,
}

impl<K> Set<K> {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            keys: Vec::new(),
            next: None,
        }
    }

    /// Wraps keys that are already strictly increasing.
    pub(crate) const fn from_sorted(keys: Vec<K>) -> Self {
        Self {
            keys,
            next: None,
        }
    }

    /// Removes every key. The successor link is kept.
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn iter(&self) -> slice::Iter<'_, K> {
        self.keys.iter()
    }
}

impl<K: KeyType> Set<K> {
    /// Adds `key`, returning whether it was not already present.
    ///
    /// # Errors
    ///
    /// A [`TypeError`](crate::TypeError) if `key` cannot be ordered against
    /// the stored keys.
    pub fn insert(&mut self, key: K) -> Result<bool> {
        leaf::check_key(&self.keys, &key)?;
        Ok(self.insert_checked(key))
    }

    fn insert_checked(&mut self, key: K) -> bool {
        match self.search(&key) {
            SearchResult::Found(_) => false,
            SearchResult::InsertAt(index) => {
                self.keys.insert(index, key);
                true
            }
        }
    }

    /// Removes `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if `key` is not present.
    pub fn remove(&mut self, key: &K) -> Result<()> {
        match self.search(key) {
            SearchResult::Found(index) => {
                self.keys.remove(index);
                Ok(())
            }
            SearchResult::InsertAt(_) => Err(Error::KeyNotFound),
        }
    }

    /// Adds every key of `keys` and returns how many were new.
    ///
    /// # Errors
    ///
    /// A [`TypeError`](crate::TypeError) if any key is rejected. Nothing is
    /// added in that case.
    pub fn update<I>(&mut self, keys: I) -> Result<usize>
    where
        I: IntoIterator<Item = K>,
    {
        let keys: Vec<K> = keys.into_iter().collect();

        let anchor = self.keys.first().or_else(|| keys.first());
        for key in &keys {
            key.check_key()?;
            if let Some(anchor) = anchor {
                key.comparable_with(anchor)?;
            }
        }

        let mut added = 0;
        for key in keys {
            if self.insert_checked(key) {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Returns the key at position `index`.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] past the last key.
    pub fn get_by_index(&self, index: usize) -> Result<&K> {
        self.keys.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.keys.len(),
        })
    }

    /// Returns the serialized state of this set.
    #[must_use]
    pub fn state(&self) -> SetState<K> {
        SetState {
            keys: self.keys.clone(),
            next: self.next,
        }
    }

    #[must_use]
    pub fn into_state(self) -> SetState<K> {
        SetState {
            keys: self.keys,
            next: self.next,
        }
    }

    /// Replaces the contents and successor link with `state`.
    ///
    /// # Errors
    ///
    /// [`TypeError::MalformedState`](crate::TypeError::MalformedState) if the
    /// keys are not strictly increasing, or the type error a stored key would
    /// raise. The set is left unchanged.
    pub fn set_state(&mut self, state: SetState<K>) -> Result<()> {
        *self = Self::from_state(state)?;
        Ok(())
    }

    /// Builds a set from its serialized state.
    ///
    /// # Errors
    ///
    /// As [`Set::set_state`].
    pub fn from_state(state: SetState<K>) -> Result<Self> {
        leaf::check_sorted_keys(&state.keys)?;
        Ok(Self {
            keys: state.keys,
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
    pub fn resolve_conflict(old: &SetState<K>, committed: &SetState<K>, new: &SetState<K>) -> Result<SetState<K>> {
        conflict::resolve(old, committed, new).map_err(Error::from)
    }
}

impl<K: KeyType> OrderedLeaf for Set<K> {
    type Key = K;

    const MAX_SIZE: usize = K::SET_LEAF_SIZE;

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
        Self::from_sorted(self.keys.split_off(index))
    }
}

impl<K> Default for Set<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K> IntoIterator for &'a Set<K> {
    type Item = &'a K;
    type IntoIter = slice::Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K> IntoIterator for Set<K> {
    type Item = K;
    type IntoIter = alloc::vec::IntoIter<K>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}

impl<K: KeyType> TryFrom<SetState<K>> for Set<K> {
    type Error = Error;

    fn try_from(state: SetState<K>) -> Result<Self> {
        Self::from_state(state)
    }
}
