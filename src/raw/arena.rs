use alloc::vec::Vec;
use core::iter::FusedIterator;
use core::ops::{Index, IndexMut};

use super::handle::LeafId;
use crate::leaf::OrderedLeaf;

/// Slot storage for the leaves of one tree.
///
/// The arena is the single owner of every leaf; leaves refer to each other only
/// through [`LeafId`]s. Freed slots are reused by later inserts, so a stale id may
/// resolve to a different leaf once its slot has been recycled.
#[derive(Clone, Debug)]
pub struct LeafArena<L> {
    slots: Vec<Option<L>>,
    free: Vec<LeafId>,
}

impl<L> LeafArena<L> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Creates an empty arena with room for `capacity` leaves.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Returns the number of live leaves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores `leaf` and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if the arena already holds `u32::MAX - 1` leaves.
    pub fn insert(&mut self, leaf: L) -> LeafId {
        if let Some(id) = self.free.pop() {
            // Reuse a free slot.
            self.slots[id.to_index()] = Some(leaf);
            id
        } else {
            assert!(
                self.slots.len() <= LeafId::MAX,
                "`LeafArena::insert()` - arena is at maximum capacity ({})",
                LeafId::MAX
            );
            self.slots.push(Some(leaf));
            LeafId::from_index(self.slots.len() - 1)
        }
    }

    /// Returns the leaf stored under `id`, if it is live.
    #[inline]
    #[must_use]
    pub fn get(&self, id: LeafId) -> Option<&L> {
        self.slots.get(id.to_index()).and_then(Option::as_ref)
    }

    #[inline]
    #[must_use]
    pub fn get_mut(&mut self, id: LeafId) -> Option<&mut L> {
        self.slots.get_mut(id.to_index()).and_then(Option::as_mut)
    }

    #[must_use]
    pub fn contains(&self, id: LeafId) -> bool {
        self.get(id).is_some()
    }

    /// Removes the leaf stored under `id` and frees its slot.
    ///
    /// Other leaves that still name `id` as their successor are not touched;
    /// unlinking is the caller's job (see [`LeafArena::delete_next`]).
    pub fn remove(&mut self, id: LeafId) -> Option<L> {
        let leaf = self.slots.get_mut(id.to_index())?.take()?;
        self.free.push(id);
        Some(leaf)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

impl<L: OrderedLeaf> LeafArena<L> {
    /// Splits the leaf `id` at `index` and links the new right-hand leaf in
    /// directly after it.
    ///
    /// Afterwards `id` keeps the keys before `index`, the returned leaf holds the
    /// rest, `id.next` is the new leaf and the new leaf's `next` is the old
    /// `id.next`. `None` (or an out-of-range index) splits at the midpoint.
    /// Returns `None` when `id` is not live.
    pub fn split(&mut self, id: LeafId, index: Option<usize>) -> Option<LeafId> {
        let right = self.get_mut(id)?.split(index);
        let right_id = self.insert(right);
        if let Some(left) = self.get_mut(id) {
            left.set_next(Some(right_id));
        }
        Some(right_id)
    }

    /// Unlinks the successor of `id` from the chain and removes it from the arena.
    ///
    /// `id.next` becomes the successor's own `next`. Returns the removed leaf,
    /// or `None` if `id` has no (live) successor.
    pub fn delete_next(&mut self, id: LeafId) -> Option<L> {
        let next_id = self.get(id)?.next()?;
        let removed = self.remove(next_id)?;
        let after = removed.next();
        if let Some(leaf) = self.get_mut(id) {
            leaf.set_next(after);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(leaf = ?id, removed = ?next_id, next = ?after, "unlinked successor leaf");

        Some(removed)
    }

    /// Walks the chain starting at `start`, yielding each leaf id in key order.
    ///
    /// The walk stops at the end of the chain or at the first id that is no
    /// longer live.
    pub fn chain(&self, start: LeafId) -> Chain<'_, L> {
        Chain {
            arena: self,
            current: Some(start),
        }
    }

    /// Iterates every key of every leaf reachable from `start`, in key order.
    pub fn chain_keys(&self, start: LeafId) -> impl Iterator<Item = &L::Key> + '_ {
        self.chain(start).filter_map(|id| self.get(id)).flat_map(|leaf| leaf.key_slice())
    }
}

impl<L> Default for LeafArena<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> Index<LeafId> for LeafArena<L> {
    type Output = L;

    /// # Panics
    ///
    /// Panics if `id` is not live.
    fn index(&self, id: LeafId) -> &L {
        self.get(id).expect("`LeafArena::index()` - `id` is not live!")
    }
}

impl<L> IndexMut<LeafId> for LeafArena<L> {
    fn index_mut(&mut self, id: LeafId) -> &mut L {
        self.get_mut(id).expect("`LeafArena::index_mut()` - `id` is not live!")
    }
}

/// An iterator over leaf ids along a `next` chain.
///
/// This `struct` is created by [`LeafArena::chain`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Chain<'a, L> {
    arena: &'a LeafArena<L>,
    current: Option<LeafId>,
}

impl<L: OrderedLeaf> Iterator for Chain<'_, L> {
    type Item = LeafId;

    fn next(&mut self) -> Option<LeafId> {
        let id = self.current.take()?;
        let leaf = self.arena.get(id)?;
        self.current = leaf.next();
        Some(id)
    }
}

impl<L: OrderedLeaf> FusedIterator for Chain<'_, L> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::Set;
    use alloc::vec;
    use proptest::prelude::*;

    fn set_of(keys: &[u32]) -> Set<u32> {
        let mut set = Set::new();
        set.update(keys.iter().copied()).unwrap();
        set
    }

    #[test]
    fn arena_capacity() {
        let arena: LeafArena<Set<u32>> = LeafArena::with_capacity(10);
        assert_eq!(arena.capacity(), 10);
    }

    #[test]
    fn split_links_new_leaf_between_neighbours() {
        let mut arena = LeafArena::new();
        let tail = arena.insert(set_of(&[100]));
        let mut head = set_of(&[1, 2, 3, 4, 5, 6]);
        head.set_next(Some(tail));
        let head = arena.insert(head);

        let right = arena.split(head, None).unwrap();

        assert_eq!(arena[head].key_slice(), &[1, 2, 3]);
        assert_eq!(arena[right].key_slice(), &[4, 5, 6]);
        assert_eq!(arena[head].next(), Some(right));
        assert_eq!(arena[right].next(), Some(tail));
        assert_eq!(arena.chain(head).collect::<Vec<_>>(), vec![head, right, tail]);
        assert_eq!(arena.chain_keys(head).copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6, 100]);
    }

    #[test]
    fn split_of_missing_leaf_is_none() {
        let mut arena: LeafArena<Set<u32>> = LeafArena::new();
        let id = arena.insert(Set::new());
        arena.remove(id);
        assert_eq!(arena.split(id, None), None);
    }

    #[test]
    fn delete_next_none() {
        let mut arena = LeafArena::new();
        let only = arena.insert(set_of(&[1]));
        assert!(arena.delete_next(only).is_none());
        assert_eq!(arena[only].next(), None);
    }

    #[test]
    fn delete_next_one() {
        let mut arena = LeafArena::new();
        let second = arena.insert(set_of(&[2]));
        let mut first = set_of(&[1]);
        first.set_next(Some(second));
        let first = arena.insert(first);

        let removed = arena.delete_next(first).unwrap();
        assert_eq!(removed.key_slice(), &[2]);
        assert_eq!(arena[first].next(), None);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn delete_next_two() {
        let mut arena = LeafArena::new();
        let third = arena.insert(set_of(&[3]));
        let mut second = set_of(&[2]);
        second.set_next(Some(third));
        let second = arena.insert(second);
        let mut first = set_of(&[1]);
        first.set_next(Some(second));
        let first = arena.insert(first);

        arena.delete_next(first);
        assert_eq!(arena[first].next(), Some(third));
        assert!(!arena.contains(second));
    }

    #[test]
    #[should_panic(expected = "`LeafArena::index()` - `id` is not live!")]
    fn index_of_removed_leaf_panics() {
        let mut arena: LeafArena<Set<u32>> = LeafArena::new();
        let id = arena.insert(Set::new());
        arena.remove(id);
        let _ = &arena[id];
    }

    proptest! {
        #[test]
        fn arena_behaves_like_vec(operations in prop::collection::vec(strategy(), 0..256)) {
            let mut model: Vec<(LeafId, u32)> = Vec::new();
            let mut arena: LeafArena<u32> = LeafArena::new();

            for operation in operations {
                match operation {
                    Operation::Insert(value) => {
                        let id = arena.insert(value);
                        model.push((id, value));
                    }
                    Operation::Get(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let id = model[index].0;
                        prop_assert_eq!(arena.get(id), Some(&model[index].1));
                    }
                    Operation::GetMut(which, value) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let id = model[index].0;
                        *arena.get_mut(id).unwrap() = value;
                        model[index].1 = value;
                    }
                    Operation::Remove(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let id = model[index].0;
                        let value1 = arena.remove(id);
                        let (_, value2) = model.swap_remove(index);
                        prop_assert_eq!(value1, Some(value2));
                        prop_assert_eq!(arena.remove(id), None);
                    }
                    Operation::Clear => {
                        arena.clear();
                        model.clear();
                    }
                }

                prop_assert_eq!(arena.len(), model.len());
                prop_assert_eq!(arena.is_empty(), model.is_empty());

                for &(id, value) in &model {
                    prop_assert_eq!(arena[id], value);
                }
            }
        }
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Insert(u32),
        Get(usize),
        GetMut(usize, u32),
        Remove(usize),
        Clear,
    }

    fn strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            20 => any::<u32>().prop_map(Operation::Insert),
            5 => any::<usize>().prop_map(Operation::Get),
            5 => (any::<usize>(), any::<u32>()).prop_map(|(which, value)| Operation::GetMut(which, value)),
            5 => any::<usize>().prop_map(Operation::Remove),
            1 => Just(Operation::Clear),
        ]
    }
}
