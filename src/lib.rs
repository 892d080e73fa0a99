//! Leaf buckets and sets for persistent B-trees.
//!
//! This crate provides the leaf layer of a multi-level B-tree: the ordered
//! containers the tree stores its entries in, plus the algorithms that work on
//! whole leaves.
//!
//! - [`Bucket`] maps keys to values, [`Set`] holds unique keys. Both keep their
//!   keys sorted and share binary search, range queries and splitting through
//!   [`OrderedLeaf`].
//! - Leaves link to their successor through a [`LeafId`] into a [`LeafArena`]
//!   owned by the tree, so the tree can walk every key in order without
//!   descending again.
//! - [`BucketState`] and [`SetState`] are the serialized form of a leaf.
//!   [`Bucket::resolve_conflict`] and [`Set::resolve_conflict`] merge two
//!   states written concurrently against a common ancestor, or report a
//!   [`ConflictReason`].
//! - [`set_ops`] computes unions, intersections, differences and their
//!   weighted variants over any mix of sorted inputs.
//!
//! Key and value types describe themselves through [`KeyType`] and
//! [`ValueType`]; [`families`] names the supported pairings.
//!
//! # Example
//!
//! ```
//! use btree_buckets::{Bucket, KeyRange, LeafArena, OrderedLeaf};
//!
//! let mut arena = LeafArena::new();
//!
//! let mut bucket = Bucket::new();
//! bucket.update((0..8u32).map(|k| (k, k * 10)))?;
//! let left = arena.insert(bucket);
//!
//! // The tree layer splits the leaf and the chain stays in key order.
//! let right = arena.split(left, None).unwrap();
//! assert_eq!(arena[left].next(), Some(right));
//! assert_eq!(arena[right].keys(&KeyRange::new()), &[4, 5, 6, 7]);
//! assert_eq!(arena.chain_keys(left).count(), 8);
//! # Ok::<(), btree_buckets::Error>(())
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`
//! - **`tracing`** - Emits `tracing` events for splits, unlinks, conflict
//!   resolution and set operations (off by default)

#![no_std]
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![warn(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod bucket;
mod conflict;
mod error;
mod leaf;
mod raw;
mod set;
mod state;

pub mod datatype;
pub mod families;
pub mod set_ops;

pub use bucket::{Bucket, Items};
pub use datatype::{Family, KeyType, Object, UnionKey, ValueType, WeightedValue};
pub use error::{ConflictError, ConflictReason, Error, Result, TypeError};
pub use leaf::{KeyRange, OrderedLeaf, SearchResult};
pub use raw::{Chain, LeafArena, LeafId};
pub use set::Set;
pub use state::{BucketState, SetState};
