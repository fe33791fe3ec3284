//! A key-value store in two layers: [`OrderedMap`], an unbalanced binary
//! search tree, and [`ShardTable`], a hash table that uses those trees as its
//! buckets and doubles itself when it gets too full.
//!
//! ```
//! use tree_table::{Error, ShardTable};
//!
//! let mut table = ShardTable::new();
//! for (i, word) in ["put", "large", "things", "in", "memory"].iter().enumerate() {
//!     table.set(*word, i);
//! }
//!
//! assert_eq!(Ok(&2), table.get("things"));
//! assert_eq!(Err(Error::NotFound), table.delete("nothing"));
//!
//! // only sorted bucket by bucket, unless you ask for the merge
//! let words: Vec<&str> = table.iter_sorted().map(|(k, _)| *k).collect();
//! assert_eq!(vec!["in", "large", "memory", "put", "things"], words);
//! ```
//!
//! Neither layer is thread safe and neither rebalances. Sorted input will
//! turn a bucket into a linked list; every traversal is written with an
//! explicit [`Stack`] or [`Queue`] so that stays slow rather than fatal.

mod config;
mod error;
mod identity_hasher;
pub mod linked_list;
pub mod ordered_map;
mod queue;
pub mod shard_table;
mod stack;
mod store;

#[cfg(test)]
mod proptests;

pub use config::{TableConfig, DEFAULT_CAPACITY, DEFAULT_MAX_LOAD_FACTOR};
pub use error::{Error, Result};
pub use identity_hasher::{BuildIdentityHasher, IdentityHasher};
pub use linked_list::LinkedList;
pub use ordered_map::{Order, OrderedMap};
pub use queue::Queue;
pub use shard_table::ShardTable;
pub use stack::Stack;
pub use store::Store;
