use core::fmt;
use core::num::NonZero;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

type RawLeafId = u32;

/// A non-owning reference to a leaf stored in a [`LeafArena`](crate::LeafArena).
///
/// Leaves link to their successor through a `LeafId` rather than a pointer, so
/// the chain can never keep a leaf alive or form an ownership cycle. The tree
/// layer owns the arena; a `LeafId` is only meaningful for the arena that issued it.
///
/// `Option<LeafId>` is the same size as `LeafId`.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct LeafId(NonZero<RawLeafId>);

impl LeafId {
    pub(crate) const MAX: usize = (RawLeafId::MAX - 1) as usize;

    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        assert!(index <= Self::MAX, "`LeafId::from_index()` - `index` > `LeafId::MAX`!");
        // `index + 1` cannot be zero and cannot overflow.
        #[allow(clippy::cast_possible_truncation)]
        match NonZero::new((index + 1) as RawLeafId) {
            Some(raw) => Self(raw),
            None => unreachable!(),
        }
    }

    /// Returns the arena slot this id refers to.
    #[inline]
    #[must_use]
    pub const fn to_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Debug for LeafId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LeafId({})", self.to_index())
    }
}

impl Serialize for LeafId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0.get() - 1)
    }
}

impl<'de> Deserialize<'de> for LeafId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let index = RawLeafId::deserialize(deserializer)?;
        if index as usize > Self::MAX {
            return Err(serde::de::Error::custom("leaf id out of range"));
        }
        Ok(Self::from_index(index as usize))
    }
}
