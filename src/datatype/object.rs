use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{KeyType, ValueType};
use crate::error::TypeError;

/// A dynamically typed key or value.
///
/// Numbers compare numerically whether they are stored as integers or floats,
/// so `Int(2) == Float(2.0)`. Strings compare with strings and byte strings
/// with byte strings. Values of different classes are never stored side by
/// side in one leaf (see [`KeyType::comparable_with`]), but `Ord` still places
/// them in a fixed class order (numbers, strings, bytes, opaque) so that the
/// ordering is total.
///
/// `Opaque` stands for an object that has identity but no meaningful order. It
/// may be stored as a value, never as a key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Object {
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Opaque(u64),
}

impl Object {
    /// Creates an opaque object with the given identity.
    #[must_use]
    pub const fn opaque(id: u64) -> Self {
        Self::Opaque(id)
    }

    /// Returns a short name for the class of this object.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) | Self::Float(_) => "number",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::Opaque(_) => "opaque",
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Int(_) | Self::Float(_) => 0,
            Self::Str(_) => 1,
            Self::Bytes(_) => 2,
            Self::Opaque(_) => 3,
        }
    }
}

fn cmp_floats(a: f64, b: f64) -> Ordering {
    // `total_cmp` alone would separate -0.0 from 0.0, which `Int(0)` equals.
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn cmp_int_float(int: i64, float: f64) -> Ordering {
    // 2^63, the first float above every i64.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    if float.is_nan() {
        return if float.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if float >= LIMIT {
        return Ordering::Less;
    }
    if float < -LIMIT {
        return Ordering::Greater;
    }

    // In range, `as` truncates toward zero and the integer part is exact.
    let whole = float as i64;
    int.cmp(&whole).then_with(|| {
        let back = whole as f64;
        if float > back {
            Ordering::Less
        } else if float < back {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    })
}

impl Ord for Object {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => cmp_floats(*a, *b),
            (Self::Int(a), Self::Float(b)) => cmp_int_float(*a, *b),
            (Self::Float(a), Self::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            (Self::Opaque(a), Self::Opaque(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Object {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Object {}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Object {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for Object {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&[u8]> for Object {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.into())
    }
}

impl From<Vec<u8>> for Object {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl KeyType for Object {
    const PREFIX: &'static str = "O";
    const LONG_NAME: &'static str = "Object";
    const TREE_SIZE: usize = 250;
    const NATIVE_VALUE_LEAF_SIZE: usize = 60;
    const OBJECT_VALUE_LEAF_SIZE: usize = 30;
    const SET_LEAF_SIZE: usize = 30;
    const USING_64_BITS: bool = false;
    const SUPPORTS_VALUE_UNION: bool = false;

    fn check_key(&self) -> Result<(), TypeError> {
        match self {
            Self::Opaque(_) => Err(TypeError::UnorderableKey {
                kind: self.kind(),
            }),
            _ => Ok(()),
        }
    }

    fn comparable_with(&self, stored: &Self) -> Result<(), TypeError> {
        if self.rank() == stored.rank() {
            Ok(())
        } else {
            Err(TypeError::IncomparableKey {
                kind: self.kind(),
                stored: stored.kind(),
            })
        }
    }
}

impl ValueType for Object {
    const PREFIX: &'static str = "O";
    const LONG_NAME: &'static str = "Object";
    const USING_64_BITS: bool = false;
    const SUPPORTS_VALUE_UNION: bool = false;
    const NATIVE: bool = false;
}
