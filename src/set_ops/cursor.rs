/// Position of one input in a lock-step walk over several sorted inputs.
///
/// A cursor is built at the start of one merge, advanced as its keys are
/// consumed, and dropped when the merge returns. It is inactive once every key
/// has been consumed.
///
/// When the input carries no values, [`MergeCursor::value`] yields the fill
/// value given to [`MergeCursor::with_default`] (if any), so value-aware
/// merges can treat every input alike.
#[derive(Debug)]
pub struct MergeCursor<'a, K, V> {
    keys: &'a [K],
    values: Option<&'a [V]>,
    default: Option<&'a V>,
    index: usize,
}

impl<K, V> Clone for MergeCursor<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for MergeCursor<'_, K, V> {}

impl<'a, K, V> MergeCursor<'a, K, V> {
    /// Creates a cursor over keys only.
    #[must_use]
    pub const fn new(keys: &'a [K]) -> Self {
        Self {
            keys,
            values: None,
            default: None,
            index: 0,
        }
    }

    /// Creates a cursor over keys and the values paired with them.
    ///
    /// `values` must be at least as long as `keys`.
    #[must_use]
    pub const fn with_values(keys: &'a [K], values: &'a [V]) -> Self {
        Self {
            keys,
            values: Some(values),
            default: None,
            index: 0,
        }
    }

    /// Sets the value reported for keys of an input without values.
    #[must_use]
    pub const fn with_default(mut self, default: &'a V) -> Self {
        self.default = Some(default);
        self
    }

    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.index < self.keys.len()
    }

    /// Returns the current key, or `None` once the cursor is exhausted.
    #[inline]
    #[must_use]
    pub fn key(&self) -> Option<&'a K> {
        self.keys.get(self.index)
    }

    /// Returns the value at the current key.
    ///
    /// That is the stored value if the input has values and the fill value
    /// otherwise. Always `None` once the cursor is exhausted.
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&'a V> {
        if !self.is_active() {
            return None;
        }
        match self.values {
            Some(values) => values.get(self.index),
            None => self.default,
        }
    }

    /// Returns the index of the current key in the input.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.index
    }

    /// Moves to the next key. Does nothing once exhausted.
    #[inline]
    pub fn advance(&mut self) {
        if self.is_active() {
            self.index += 1;
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn walks_keys_and_values() {
        let keys = [1, 2];
        let values = ["one", "two"];
        let mut cursor = MergeCursor::with_values(&keys, &values);

        assert!(cursor.is_active());
        assert_eq!((cursor.key(), cursor.value()), (Some(&1), Some(&"one")));
        cursor.advance();
        assert_eq!((cursor.key(), cursor.value(), cursor.position()), (Some(&2), Some(&"two"), 1));
        cursor.advance();
        assert!(!cursor.is_active());
        assert_eq!((cursor.key(), cursor.value()), (None, None));
        cursor.advance();
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn keys_only_reports_default() {
        let keys = [5u32];
        let fill = 1u32;

        let cursor: MergeCursor<'_, u32, u32> = MergeCursor::new(&keys);
        assert_eq!(cursor.value(), None);

        let cursor = cursor.with_default(&fill);
        assert_eq!(cursor.value(), Some(&1));
    }

    #[test]
    fn empty_input_is_inactive() {
        let cursor: MergeCursor<'_, u32, u32> = MergeCursor::new(&[]);
        assert!(!cursor.is_active());
        assert_eq!(cursor.key(), None);
    }
}
