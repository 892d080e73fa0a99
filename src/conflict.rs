//! Three-way conflict resolution for leaf states.
//!
//! When two transactions write the same leaf, the persistence layer hands over
//! three states: `old` (the common ancestor), `committed` (the write that won
//! the race) and `new` (the write being committed now). If the two writes touch
//! disjoint keys they can be composed into one state; otherwise resolution
//! fails with a [`ConflictReason`] and the caller retries the transaction.
//!
//! Resolution walks the three key sequences in lock step with one
//! [`MergeCursor`] each. It is a pure function of its inputs.

use core::cmp::Ordering;
use core::fmt;

use thiserror::Error;

use crate::datatype::{KeyType, ValueType};
use crate::raw::LeafId;
use crate::set_ops::MergeCursor;
use crate::state::{BucketState, SetState};

/// Why two concurrent writes to a leaf could not be merged.
///
/// The numeric [`code`](ConflictReason::code) of each reason is stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConflictReason {
    /// The three states do not agree on the successor leaf.
    NextMismatch = 0,
    /// Both writes changed the value of the same key.
    ConflictingUpdates = 1,
    /// `new` deleted a key whose value `committed` changed.
    NewDeletesChangedKey = 2,
    /// `committed` deleted a key whose value `new` changed.
    CommittedDeletesChangedKey = 3,
    /// Both writes inserted the same key.
    DuplicateInsert = 4,
    /// Both writes deleted the same key.
    DuplicateDelete = 5,
    /// Both writes appended the same key past the end of `old`.
    DuplicateAppend = 6,
    /// `new` deleted a trailing key that `committed` changed or also deleted.
    NewDeletesCommittedTail = 7,
    /// `committed` deleted a trailing key that `new` changed or also deleted.
    CommittedDeletesNewTail = 8,
    /// Both writes deleted trailing keys, but not the same ones.
    InconsistentDeletes = 9,
    /// The merged leaf would be empty.
    MergedEmpty = 10,
    /// One write emptied a leaf that had keys.
    EmptiedLeaf = 12,
    /// One write deleted the first key while the other changed the leaf.
    FirstKeyDeleted = 13,
}

impl ConflictReason {
    /// Returns the stable numeric code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns the reason with the given code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::NextMismatch,
            1 => Self::ConflictingUpdates,
            2 => Self::NewDeletesChangedKey,
            3 => Self::CommittedDeletesChangedKey,
            4 => Self::DuplicateInsert,
            5 => Self::DuplicateDelete,
            6 => Self::DuplicateAppend,
            7 => Self::NewDeletesCommittedTail,
            8 => Self::CommittedDeletesNewTail,
            9 => Self::InconsistentDeletes,
            10 => Self::MergedEmpty,
            12 => Self::EmptiedLeaf,
            13 => Self::FirstKeyDeleted,
            _ => return None,
        })
    }

    const fn description(self) -> &'static str {
        match self {
            Self::NextMismatch => "states disagree on the next leaf",
            Self::ConflictingUpdates => "both sides changed the same value",
            Self::NewDeletesChangedKey => "new deleted a key committed changed",
            Self::CommittedDeletesChangedKey => "committed deleted a key new changed",
            Self::DuplicateInsert => "both sides inserted the same key",
            Self::DuplicateDelete => "both sides deleted the same key",
            Self::DuplicateAppend => "both sides appended the same key",
            Self::NewDeletesCommittedTail => "new deleted keys committed changed",
            Self::CommittedDeletesNewTail => "committed deleted keys new changed",
            Self::InconsistentDeletes => "sides deleted different keys",
            Self::MergedEmpty => "merged leaf would be empty",
            Self::EmptiedLeaf => "one side emptied the leaf",
            Self::FirstKeyDeleted => "first key deleted while the other side changed the leaf",
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (reason {})", self.description(), self.code())
    }
}

/// Three-way merge failure.
///
/// Carries the reason and, when the failure was found mid-walk, the index each
/// cursor had reached in its state (`None` for an exhausted cursor).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("unresolvable conflict: {reason}")]
pub struct ConflictError {
    reason: ConflictReason,
    old: Option<usize>,
    committed: Option<usize>,
    new: Option<usize>,
}

impl ConflictError {
    /// Creates an error that is not tied to a position.
    #[must_use]
    pub const fn new(reason: ConflictReason) -> Self {
        Self {
            reason,
            old: None,
            committed: None,
            new: None,
        }
    }

    fn at<K, V>(reason: ConflictReason, cursors: &[MergeCursor<'_, K, V>; 3]) -> Self {
        let at = |cursor: &MergeCursor<'_, K, V>| cursor.is_active().then_some(cursor.position());
        Self {
            reason,
            old: at(&cursors[0]),
            committed: at(&cursors[1]),
            new: at(&cursors[2]),
        }
    }

    #[must_use]
    pub const fn reason(&self) -> ConflictReason {
        self.reason
    }

    /// Returns the reason's stable numeric code.
    #[must_use]
    pub const fn code(&self) -> u8 {
        self.reason.code()
    }

    /// Returns the `(old, committed, new)` positions at which the conflict
    /// was detected.
    #[must_use]
    pub const fn positions(&self) -> (Option<usize>, Option<usize>, Option<usize>) {
        (self.old, self.committed, self.new)
    }
}

/// A leaf state that can take part in three-way resolution.
pub(crate) trait MergeState: Sized {
    type Key: KeyType;
    type Value: PartialEq + Clone;

    fn cursor(&self) -> MergeCursor<'_, Self::Key, Self::Value>;

    fn next(&self) -> Option<LeafId>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates an empty state linked to `next`.
    fn empty(next: Option<LeafId>) -> Self;

    /// Appends the current entry of `cursor`.
    fn push_from(&mut self, cursor: &MergeCursor<'_, Self::Key, Self::Value>);
}

impl<K: KeyType, V: ValueType> MergeState for BucketState<K, V> {
    type Key = K;
    type Value = V;

    fn cursor(&self) -> MergeCursor<'_, K, V> {
        MergeCursor::with_values(&self.keys, &self.values)
    }

    fn next(&self) -> Option<LeafId> {
        self.next
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn empty(next: Option<LeafId>) -> Self {
        Self::new().with_next(next)
    }

    fn push_from(&mut self, cursor: &MergeCursor<'_, K, V>) {
        if let (Some(key), Some(value)) = (cursor.key(), cursor.value()) {
            self.push(key.clone(), value.clone());
        }
    }
}

impl<K: KeyType> MergeState for SetState<K> {
    type Key = K;
    type Value = ();

    fn cursor(&self) -> MergeCursor<'_, K, ()> {
        MergeCursor::new(&self.keys)
    }

    fn next(&self) -> Option<LeafId> {
        self.next
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn empty(next: Option<LeafId>) -> Self {
        Self::new().with_next(next)
    }

    fn push_from(&mut self, cursor: &MergeCursor<'_, K, ()>) {
        if let Some(key) = cursor.key() {
            self.keys.push(key.clone());
        }
    }
}

const OLD: usize = 0;
const COM: usize = 1;
const NEW: usize = 2;

/// Merges `committed` and `new`, both derived from `old`.
pub(crate) fn resolve<S: MergeState>(old: &S, committed: &S, new: &S) -> Result<S, ConflictError> {
    let result = merge(old, committed, new);

    #[cfg(feature = "tracing")]
    log_outcome(&result);

    result
}

#[cfg(feature = "tracing")]
fn log_outcome<S: MergeState>(result: &Result<S, ConflictError>) {
    match result {
        Ok(merged) => tracing::trace!(len = merged.len(), "resolved leaf conflict"),
        Err(err) => tracing::debug!(reason = err.code(), positions = ?err.positions(), "unresolvable leaf conflict"),
    }
}

fn merge<S: MergeState>(old: &S, committed: &S, new: &S) -> Result<S, ConflictError> {
    let next = old.next();
    if committed.next() != next || new.next() != next {
        return Err(ConflictError::new(ConflictReason::NextMismatch));
    }
    if !old.is_empty() && (committed.is_empty() || new.is_empty()) {
        return Err(ConflictError::new(ConflictReason::EmptiedLeaf));
    }

    let mut merged = S::empty(next);
    let mut cursors = [old.cursor(), committed.cursor(), new.cursor()];
    let fail = |reason: ConflictReason, cursors: &[MergeCursor<'_, S::Key, S::Value>; 3]| -> Result<S, ConflictError> {
        Err(ConflictError::at(reason, cursors))
    };

    // Every key of `old` still present on one side is decided here.
    while let (Some(old_key), Some(com_key), Some(new_key)) =
        (cursors[OLD].key(), cursors[COM].key(), cursors[NEW].key())
    {
        let old_com = old_key.cmp(com_key);
        let old_new = old_key.cmp(new_key);

        match (old_com, old_new) {
            (Ordering::Equal, Ordering::Equal) => {
                let old_value = cursors[OLD].value();
                if cursors[COM].value() == old_value {
                    merged.push_from(&cursors[NEW]);
                } else if cursors[NEW].value() == old_value {
                    merged.push_from(&cursors[COM]);
                } else {
                    return fail(ConflictReason::ConflictingUpdates, &cursors);
                }
                cursors.iter_mut().for_each(MergeCursor::advance);
            }
            (Ordering::Equal, Ordering::Greater) => {
                merged.push_from(&cursors[NEW]);
                cursors[NEW].advance();
            }
            (Ordering::Equal, Ordering::Less) => {
                // Deleted by `new`.
                if cursors[OLD].value() != cursors[COM].value() {
                    return fail(ConflictReason::NewDeletesChangedKey, &cursors);
                }
                if cursors[NEW].position() == 0 {
                    return fail(ConflictReason::FirstKeyDeleted, &cursors);
                }
                cursors[OLD].advance();
                cursors[COM].advance();
            }
            (Ordering::Greater, Ordering::Equal) => {
                merged.push_from(&cursors[COM]);
                cursors[COM].advance();
            }
            (Ordering::Less, Ordering::Equal) => {
                // Deleted by `committed`.
                if cursors[OLD].value() != cursors[NEW].value() {
                    return fail(ConflictReason::CommittedDeletesChangedKey, &cursors);
                }
                if cursors[COM].position() == 0 {
                    return fail(ConflictReason::FirstKeyDeleted, &cursors);
                }
                cursors[OLD].advance();
                cursors[NEW].advance();
            }
            _ => {
                let com_new = com_key.cmp(new_key);
                if com_new == Ordering::Equal {
                    return fail(ConflictReason::DuplicateInsert, &cursors);
                }
                if old_com == Ordering::Greater {
                    let side = if com_new == Ordering::Greater { NEW } else { COM };
                    merged.push_from(&cursors[side]);
                    cursors[side].advance();
                } else if old_new == Ordering::Greater {
                    merged.push_from(&cursors[NEW]);
                    cursors[NEW].advance();
                } else {
                    return fail(ConflictReason::DuplicateDelete, &cursors);
                }
            }
        }
    }

    // `old` is exhausted: both sides appended.
    while let (Some(com_key), Some(new_key)) = (cursors[COM].key(), cursors[NEW].key()) {
        let side = match com_key.cmp(new_key) {
            Ordering::Less => COM,
            Ordering::Greater => NEW,
            Ordering::Equal => return fail(ConflictReason::DuplicateAppend, &cursors),
        };
        merged.push_from(&cursors[side]);
        cursors[side].advance();
    }

    // `new` is exhausted: the rest of `old` must survive unchanged in `committed`.
    while let (Some(old_key), Some(com_key)) = (cursors[OLD].key(), cursors[COM].key()) {
        match old_key.cmp(com_key) {
            Ordering::Greater => {
                merged.push_from(&cursors[COM]);
                cursors[COM].advance();
            }
            Ordering::Equal if cursors[OLD].value() == cursors[COM].value() => {
                cursors[OLD].advance();
                cursors[COM].advance();
            }
            _ => return fail(ConflictReason::NewDeletesCommittedTail, &cursors),
        }
    }

    // `committed` is exhausted: the rest of `old` must survive unchanged in `new`.
    while let (Some(old_key), Some(new_key)) = (cursors[OLD].key(), cursors[NEW].key()) {
        match old_key.cmp(new_key) {
            Ordering::Greater => {
                merged.push_from(&cursors[NEW]);
                cursors[NEW].advance();
            }
            Ordering::Equal if cursors[OLD].value() == cursors[NEW].value() => {
                cursors[OLD].advance();
                cursors[NEW].advance();
            }
            _ => return fail(ConflictReason::CommittedDeletesNewTail, &cursors),
        }
    }

    if cursors[OLD].is_active() {
        return fail(ConflictReason::InconsistentDeletes, &cursors);
    }

    for side in [COM, NEW] {
        while cursors[side].is_active() {
            merged.push_from(&cursors[side]);
            cursors[side].advance();
        }
    }

    if merged.is_empty() {
        return Err(ConflictError::new(ConflictReason::MergedEmpty));
    }
    Ok(merged)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn set(keys: &[u32]) -> SetState<u32> {
        keys.iter().copied().collect()
    }

    #[test]
    fn reason_codes_are_stable() {
        for code in 0..=20 {
            match ConflictReason::from_code(code) {
                Some(reason) => assert_eq!(reason.code(), code),
                None => assert!(code == 11 || code > 13),
            }
        }
    }

    #[test]
    fn error_display_names_code() {
        let err = ConflictError::new(ConflictReason::DuplicateAppend);
        assert!(err.to_string().contains("reason 6"));
        assert_eq!(err.positions(), (None, None, None));
    }

    #[test]
    fn positions_point_at_conflict() {
        let err = resolve(&set(&[1]), &set(&[1, 2]), &set(&[1, 2, 3])).unwrap_err();
        assert_eq!(err.reason(), ConflictReason::DuplicateAppend);
        assert_eq!(err.positions(), (None, Some(1), Some(1)));
    }

    #[test]
    fn all_empty_cannot_be_merged() {
        let err = resolve(&set(&[]), &set(&[]), &set(&[])).unwrap_err();
        assert_eq!(err.reason(), ConflictReason::MergedEmpty);
    }

    #[test]
    fn growing_an_empty_leaf_on_one_side() {
        let merged = resolve(&set(&[]), &set(&[]), &set(&[4])).unwrap();
        assert_eq!(merged.keys(), &[4]);
    }

    #[test]
    fn resolution_is_symmetric_for_disjoint_inserts() {
        let old = set(&[10, 20, 30]);
        let left = set(&[5, 10, 20, 30]);
        let right = set(&[10, 20, 25, 30]);
        assert_eq!(resolve(&old, &left, &right).unwrap(), resolve(&old, &right, &left).unwrap());
    }
}
