//! Key and value descriptors.
//!
//! Every bucket and set is generic over a [`KeyType`] and (for buckets) a
//! [`ValueType`]. The descriptor supplies what the leaf algorithms cannot know on
//! their own: how to validate a key or value before it is stored, how large a
//! leaf may grow, and whether the weighted set operations make sense.
//!
//! Capabilities that only some types have are separate traits, so an operation
//! that needs them simply does not exist for the other types:
//!
//! - [`WeightedValue`] enables [`weighted_union`](crate::set_ops::weighted_union)
//!   and [`weighted_intersection`](crate::set_ops::weighted_intersection).
//! - [`UnionKey`] enables [`multiunion`](crate::set_ops::multiunion).

use alloc::format;
use alloc::string::String;
use core::fmt;
use core::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::TypeError;

mod native;
mod object;

pub use object::Object;

/// Descriptor for the keys of a bucket or set.
pub trait KeyType: Clone + Ord + fmt::Debug + Serialize + DeserializeOwned {
    /// One-letter code naming this key type in family names (`"U"` in `"UOBucket"`).
    const PREFIX: &'static str;
    const LONG_NAME: &'static str;
    /// Maximum fan-out of internal tree nodes over these keys.
    const TREE_SIZE: usize;
    /// Maximum bucket size when paired with a native value type.
    const NATIVE_VALUE_LEAF_SIZE: usize;
    /// Maximum bucket size when paired with object values.
    const OBJECT_VALUE_LEAF_SIZE: usize;
    /// Maximum size of a set leaf over these keys.
    const SET_LEAF_SIZE: usize;
    const USING_64_BITS: bool;
    /// Whether repeated keys can be unioned as weights (`multiunion`).
    const SUPPORTS_VALUE_UNION: bool;

    /// Rejects keys that can never be stored.
    fn check_key(&self) -> Result<(), TypeError> {
        Ok(())
    }

    /// Rejects keys that cannot be ordered against `stored`, a key already in the leaf.
    fn comparable_with(&self, stored: &Self) -> Result<(), TypeError> {
        let _ = stored;
        Ok(())
    }

    /// Maximum bucket size for these keys paired with values of type `V`.
    #[must_use]
    fn bucket_size_for<V: ValueType>() -> usize {
        if V::NATIVE {
            Self::NATIVE_VALUE_LEAF_SIZE
        } else {
            Self::OBJECT_VALUE_LEAF_SIZE
        }
    }
}

/// Descriptor for the values of a bucket.
pub trait ValueType: Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned {
    const PREFIX: &'static str;
    const LONG_NAME: &'static str;
    const USING_64_BITS: bool;
    /// Whether the weighted set operations are meaningful for these values.
    const SUPPORTS_VALUE_UNION: bool;
    /// Fixed-width machine values (as opposed to arbitrary objects).
    const NATIVE: bool;

    /// Rejects values that can never be stored.
    fn check_value(&self) -> Result<(), TypeError> {
        Ok(())
    }
}

/// Values that can be weighted and summed by the weighted set operations.
pub trait WeightedValue: ValueType {
    /// The multiplication identity, used as the value of a key taken from an
    /// input that carries no values.
    const IDENTITY: Self;

    /// Returns `self * weight`.
    #[must_use]
    fn apply_weight(&self, weight: &Self) -> Self;

    /// Returns `self * weight + other * other_weight`.
    #[must_use]
    fn merge_weighted(&self, weight: &Self, other: &Self, other_weight: &Self) -> Self;
}

/// Keys for which [`multiunion`](crate::set_ops::multiunion) is defined.
pub trait UnionKey: KeyType {}

/// Static description of the container family for one key/value pairing.
///
/// This is the typed counterpart of a generated module such as `UOBTree`: every
/// property is derived from the two descriptors.
pub struct Family<K, V>(PhantomData<fn() -> (K, V)>);

impl<K: KeyType, V: ValueType> Family<K, V> {
    /// Returns the family prefix, e.g. `"UO"`.
    #[must_use]
    pub fn prefix() -> String {
        format!("{}{}", K::PREFIX, V::PREFIX)
    }

    /// Returns the generated name of `base` in this family, e.g. `"UOBucket"`.
    #[must_use]
    pub fn type_name(base: &str) -> String {
        format!("{}{}{base}", K::PREFIX, V::PREFIX)
    }

    #[must_use]
    pub fn max_leaf_size() -> usize {
        K::bucket_size_for::<V>()
    }

    #[must_use]
    pub const fn max_internal_size() -> usize {
        K::TREE_SIZE
    }

    #[must_use]
    pub const fn using_64_bits() -> bool {
        K::USING_64_BITS || V::USING_64_BITS
    }

    #[must_use]
    pub const fn supports_weighted_ops() -> bool {
        V::SUPPORTS_VALUE_UNION
    }

    #[must_use]
    pub const fn supports_multiunion() -> bool {
        K::SUPPORTS_VALUE_UNION
    }
}
