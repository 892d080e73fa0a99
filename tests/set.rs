use std::collections::BTreeSet;

use btree_buckets::{Error, KeyRange, LeafArena, Object, OrderedLeaf, SearchResult, Set, SetState, TypeError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 2_000;

fn value_strategy() -> impl Strategy<Value = i32> {
    -1_000i32..1_000i32
}

#[derive(Debug, Clone)]
enum SetOp {
    Insert(i32),
    Remove(i32),
    Contains(i32),
    GetByIndex(usize),
}

fn set_op_strategy() -> impl Strategy<Value = SetOp> {
    prop_oneof![
        5 => value_strategy().prop_map(SetOp::Insert),
        3 => value_strategy().prop_map(SetOp::Remove),
        2 => value_strategy().prop_map(SetOp::Contains),
        1 => (0usize..200).prop_map(SetOp::GetByIndex),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Replays random operations on both Set and BTreeSet.
    #[test]
    fn set_ops_match_btreeset(ops in proptest::collection::vec(set_op_strategy(), TEST_SIZE)) {
        let mut set: Set<i32> = Set::new();
        let mut reference: BTreeSet<i32> = BTreeSet::new();

        for op in &ops {
            match *op {
                SetOp::Insert(v) => {
                    prop_assert_eq!(set.insert(v).unwrap(), reference.insert(v), "insert({})", v);
                }
                SetOp::Remove(v) => {
                    prop_assert_eq!(set.remove(&v).is_ok(), reference.remove(&v), "remove({})", v);
                }
                SetOp::Contains(v) => {
                    prop_assert_eq!(set.contains(&v), reference.contains(&v), "contains({})", v);
                }
                SetOp::GetByIndex(i) => {
                    prop_assert_eq!(set.get_by_index(i).ok(), reference.iter().nth(i), "get_by_index({})", i);
                }
            }
        }

        prop_assert!(set.iter().eq(reference.iter()));
    }

    /// Searching reports the position binary search would.
    #[test]
    fn search_matches_slice(values in proptest::collection::btree_set(value_strategy(), 0..300), probe in value_strategy()) {
        let mut set = Set::new();
        set.update(values.iter().copied()).unwrap();
        let sorted: Vec<i32> = values.into_iter().collect();

        let expected = match sorted.binary_search(&probe) {
            Ok(index) => SearchResult::Found(index),
            Err(index) => SearchResult::InsertAt(index),
        };
        prop_assert_eq!(set.search(&probe), expected);
    }

    /// Splitting at any index keeps every key exactly once and in order.
    #[test]
    fn split_preserves_keys(values in proptest::collection::btree_set(value_strategy(), 0..200), index in proptest::option::of(0usize..250)) {
        let mut arena = LeafArena::new();
        let mut set = Set::new();
        set.update(values.iter().copied()).unwrap();
        let left = arena.insert(set);

        let right = arena.split(left, index).unwrap();
        let expected_split = match index {
            Some(index) if index < values.len() => index,
            _ => values.len() / 2,
        };
        prop_assert_eq!(arena[left].len(), expected_split);
        prop_assert_eq!(arena[left].next(), Some(right));
        prop_assert_eq!(arena[right].next(), None);
        prop_assert!(arena.chain_keys(left).eq(values.iter()));
    }
}

#[test]
fn iteration_over_ranges() {
    let mut set = Set::new();
    set.update((1..=9).map(|i| i * 10)).unwrap();

    assert_eq!(set.keys(&KeyRange::new().min(&25).max(&60)), &[30, 40, 50, 60]);
    assert_eq!(set.keys(&KeyRange::new().min(&30).exclude_min().max(&60).exclude_max()), &[40, 50]);
    assert_eq!(set.iter_keys(&KeyRange::new().min(&95)).count(), 0);
    assert_eq!(set.keys(&KeyRange::new().min(&80).max(&20)), &[] as &[i32]);
}

#[test]
fn min_and_max_keys() {
    let empty: Set<i32> = Set::new();
    assert_eq!(empty.min_key(None), Err(Error::EmptyLeaf));
    assert_eq!(empty.max_key(Some(&3)), Err(Error::EmptyLeaf));

    let mut set = Set::new();
    set.update([10, 20, 30]).unwrap();
    assert_eq!(set.min_key(Some(&15)), Ok(&20));
    assert_eq!(set.max_key(Some(&25)), Ok(&20));
    assert_eq!(set.min_key(Some(&31)), Err(Error::InvalidBound));
    assert_eq!(set.max_key(Some(&9)), Err(Error::InvalidBound));
}

#[test]
fn bytes_and_strings_do_not_mix() {
    let mut set = Set::new();
    set.insert(Object::from(&b"raw"[..])).unwrap();
    let err = set.insert(Object::from("text")).unwrap_err();
    assert!(matches!(err, Error::Type(TypeError::IncomparableKey { stored: "bytes", .. })));
}

#[test]
fn state_round_trip() {
    let mut set = Set::new();
    set.update([3u64, 1, 2]).unwrap();

    let json = serde_json::to_string(&set.state()).unwrap();
    assert_eq!(json, "[[1,2,3]]");

    let state: SetState<u64> = serde_json::from_str(&json).unwrap();
    assert_eq!(Set::from_state(state).unwrap(), set);
}

#[test]
fn from_state_rejects_duplicates() {
    let state: SetState<u64> = [1, 1].into_iter().collect();
    let err = Set::try_from(state).unwrap_err();
    assert!(matches!(err, Error::Type(TypeError::MalformedState(_))));
}

#[test]
fn set_state_keeps_set_on_error() {
    let mut set = Set::new();
    set.insert(5u32).unwrap();
    let state: SetState<u32> = [2, 1].into_iter().collect();
    assert!(set.set_state(state).is_err());
    assert_eq!(set.get_by_index(0), Ok(&5));
}

#[test]
fn clear_keeps_next() {
    let mut arena = LeafArena::new();
    let mut set = Set::new();
    set.update([1u32, 2, 3, 4]).unwrap();
    let left = arena.insert(set);
    let right = arena.split(left, None).unwrap();

    arena[left].clear();
    assert!(arena[left].is_empty());
    assert_eq!(arena[left].next(), Some(right));
    assert_eq!(arena.chain_keys(left).copied().collect::<Vec<_>>(), vec![3, 4]);
}
