//! Error types for bucket and set operations.
//!
//! Every failure is local to the call that raised it. Callers branch on the
//! variant; conflict errors additionally carry a stable [`ConflictReason`] code
//! that transaction layers use to decide whether to retry.

use alloc::string::String;

use thiserror::Error;

pub use crate::conflict::{ConflictError, ConflictReason};

/// Result type for bucket and set operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur in bucket and set operations.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// Point lookup or deletion of a key that is not stored.
    #[error("key not found")]
    KeyNotFound,

    /// `min_key`/`max_key` on a leaf without keys.
    #[error("leaf is empty")]
    EmptyLeaf,

    /// `min_key`/`max_key` with a bound that no stored key satisfies.
    #[error("no key satisfies the bound")]
    InvalidBound,

    /// Positional access past the end of a leaf.
    #[error("index {index} out of range for leaf of length {len}")]
    IndexOutOfRange {
        /// The requested position.
        index: usize,
        /// Number of keys in the leaf.
        len: usize,
    },

    /// A key, value or serialized state of the wrong shape.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Three-way conflict resolution could not merge the states.
    #[error(transparent)]
    Conflict(#[from] ConflictError),
}

/// Values that cannot be stored, and states that cannot be decoded.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// The key has no ordering at all.
    #[error("{kind} keys have no ordering and cannot be stored")]
    UnorderableKey {
        /// Short description of the rejected key.
        kind: &'static str,
    },

    /// The key cannot be ordered against the keys already stored.
    #[error("{kind} key cannot be compared with stored {stored} keys")]
    IncomparableKey {
        /// Short description of the rejected key.
        kind: &'static str,
        /// Short description of the stored keys.
        stored: &'static str,
    },

    /// A serialized leaf state that does not have the expected shape.
    #[error("malformed leaf state: {0}")]
    MalformedState(String),
}

impl Error {
    /// Creates a new malformed state error.
    pub fn malformed_state(msg: impl Into<String>) -> Self {
        Self::Type(TypeError::MalformedState(msg.into()))
    }

    /// Returns the conflict reason if this is a conflict error.
    #[must_use]
    pub fn conflict_reason(&self) -> Option<ConflictReason> {
        match self {
            Self::Conflict(conflict) => Some(conflict.reason()),
            _ => None,
        }
    }
}
