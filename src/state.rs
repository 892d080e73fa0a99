//! Serialized leaf state.
//!
//! A state is what the persistence layer stores for a leaf and what conflict
//! resolution consumes. On the wire it is a one- or two-element sequence: a flat
//! run of entries, followed by the successor leaf only when there is one.
//!
//! ```text
//! [["a", 0, "b", 1]]        bucket, no successor
//! [["a", "b"], 7]           set, successor is leaf 7
//! ```

use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use serde::de::{self, Deserialize, Deserializer, IgnoredAny, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::error::{Error, Result};
use crate::raw::LeafId;

/// Serialized state of a [`Bucket`](crate::Bucket): parallel keys and values
/// plus the successor link.
#[derive(Clone, Debug, PartialEq)]
pub struct BucketState<K, V> {
    pub(crate) keys: Vec<K>,
    pub(crate) values: Vec<V>,
    pub(crate) next: Option<LeafId>,
}

impl<K, V> BucketState<K, V> {
    /// Creates an empty state without a successor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            next: None,
        }
    }

    /// Sets the successor link.
    #[must_use]
    pub const fn with_next(mut self, next: Option<LeafId>) -> Self {
        self.next = next;
        self
    }

    #[must_use]
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    #[must_use]
    pub fn values(&self) -> &[V] {
        &self.values
    }

    #[must_use]
    pub const fn next(&self) -> Option<LeafId> {
        self.next
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterates the `(key, value)` entries in order.
    pub fn items(&self) -> impl Iterator<Item = (&K, &V)> {
        self.keys.iter().zip(&self.values)
    }

    pub(crate) fn push(&mut self, key: K, value: V) {
        self.keys.push(key);
        self.values.push(value);
    }

    /// Decodes a state, reporting any shape error as
    /// [`TypeError::MalformedState`](crate::TypeError::MalformedState).
    ///
    /// # Errors
    ///
    /// Fails if the input is not a one- or two-element sequence whose first
    /// element is a flat run of alternating keys and values.
    pub fn decode<'de, D>(deserializer: D) -> Result<Self>
    where
        D: Deserializer<'de>,
        K: Deserialize<'de>,
        V: Deserialize<'de>,
    {
        Self::deserialize(deserializer).map_err(|err| Error::malformed_state(err.to_string()))
    }
}

impl<K, V> Default for BucketState<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for BucketState<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut state = Self::new();
        for (key, value) in iter {
            state.push(key, value);
        }
        state
    }
}

/// Serialized state of a [`Set`](crate::Set): keys plus the successor link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetState<K> {
    pub(crate) keys: Vec<K>,
    pub(crate) next: Option<LeafId>,
}

impl<K> SetState<K> {
    /// Creates an empty state without a successor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            keys: Vec::new(),
            next: None,
        }
    }

    /// Sets the successor link.
    #[must_use]
    pub const fn with_next(mut self, next: Option<LeafId>) -> Self {
        self.next = next;
        self
    }

    #[must_use]
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    #[must_use]
    pub const fn next(&self) -> Option<LeafId> {
        self.next
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Decodes a state, reporting any shape error as
    /// [`TypeError::MalformedState`](crate::TypeError::MalformedState).
    ///
    /// # Errors
    ///
    /// Fails if the input is not a one- or two-element sequence whose first
    /// element is a sequence of keys.
    pub fn decode<'de, D>(deserializer: D) -> Result<Self>
    where
        D: Deserializer<'de>,
        K: Deserialize<'de>,
    {
        Self::deserialize(deserializer).map_err(|err| Error::malformed_state(err.to_string()))
    }
}

impl<K> Default for SetState<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> FromIterator<K> for SetState<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
            next: None,
        }
    }
}

// === Wire format ===

fn serialize_state<S, F>(serializer: S, flat: &F, next: Option<LeafId>) -> core::result::Result<S::Ok, S::Error>
where
    S: Serializer,
    F: Serialize + ?Sized,
{
    let mut seq = serializer.serialize_seq(Some(if next.is_some() { 2 } else { 1 }))?;
    seq.serialize_element(flat)?;
    if let Some(next) = next {
        seq.serialize_element(&next)?;
    }
    seq.end()
}

/// Bucket entries flattened to `key, value, key, value, ...`.
struct FlatItems<'a, K, V> {
    keys: &'a [K],
    values: &'a [V],
}

impl<K: Serialize, V: Serialize> Serialize for FlatItems<'_, K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.keys.len() * 2))?;
        for (key, value) in self.keys.iter().zip(self.values) {
            seq.serialize_element(key)?;
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

impl<K: Serialize, V: Serialize> Serialize for BucketState<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        let flat = FlatItems {
            keys: &self.keys,
            values: &self.values,
        };
        serialize_state(serializer, &flat, self.next)
    }
}

impl<K: Serialize> Serialize for SetState<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serialize_state(serializer, self.keys.as_slice(), self.next)
    }
}

/// Owned counterpart of [`FlatItems`].
struct FlatEntries<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
}

struct FlatEntriesVisitor<K, V> {
    marker: PhantomData<fn() -> (K, V)>,
}

impl<'de, K, V> Visitor<'de> for FlatEntriesVisitor<K, V>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
{
    type Value = FlatEntries<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a flat sequence of alternating keys and values")
    }

    fn visit_seq<A>(self, mut access: A) -> core::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let capacity = access.size_hint().unwrap_or(0) / 2;
        let mut keys = Vec::with_capacity(capacity);
        let mut values = Vec::with_capacity(capacity);
        while let Some(key) = access.next_element()? {
            let Some(value) = access.next_element()? else {
                return Err(de::Error::invalid_length(keys.len() * 2 + 1, &"an even number of items"));
            };
            keys.push(key);
            values.push(value);
        }
        Ok(FlatEntries {
            keys,
            values,
        })
    }
}

impl<'de, K, V> Deserialize<'de> for FlatEntries<K, V>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        deserializer.deserialize_seq(FlatEntriesVisitor {
            marker: PhantomData,
        })
    }
}

/// Reads the outer `[flat]` / `[flat, next]` sequence.
struct StateVisitor<F> {
    marker: PhantomData<fn() -> F>,
}

impl<F> StateVisitor<F> {
    const fn new() -> Self {
        Self {
            marker: PhantomData,
        }
    }
}

impl<'de, F: Deserialize<'de>> Visitor<'de> for StateVisitor<F> {
    type Value = (F, Option<LeafId>);

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a leaf state of one or two elements")
    }

    fn visit_seq<A>(self, mut access: A) -> core::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let flat = access.next_element()?.ok_or_else(|| de::Error::invalid_length(0, &self))?;
        // A null successor reads the same as a missing one.
        let next: Option<Option<LeafId>> = access.next_element()?;
        if access.next_element::<IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(3, &self));
        }
        Ok((flat, next.flatten()))
    }
}

impl<'de, K, V> Deserialize<'de> for BucketState<K, V>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let (flat, next): (FlatEntries<K, V>, _) = deserializer.deserialize_seq(StateVisitor::new())?;
        Ok(Self {
            keys: flat.keys,
            values: flat.values,
            next,
        })
    }
}

impl<'de, K: Deserialize<'de>> Deserialize<'de> for SetState<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let (keys, next) = deserializer.deserialize_seq(StateVisitor::new())?;
        Ok(Self {
            keys,
            next,
        })
    }
}
