//! chained-hash-table: a single-threaded hash table whose buckets are
//! array-resident head slots with owned overflow chains.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small, auditable separate-chaining table where every chain node
//!   is owned by exactly one predecessor and no raw pointers are involved.
//! - Layers:
//!   - Slot<K, V>: one storage cell (vacant or holding an entry) plus an
//!     optional boxed successor. Dropping a slot releases its chain
//!     iteratively.
//!   - ChainedHashTable<K, V, S>: the bucket array, hashing, growth policy,
//!     and the public insert/find/remove surface.
//!   - Cursor<'a, K, V, S>: a position (bucket, node) or the end sentinel;
//!     `Iter`, `Keys` and `Values` are std iterators built on it.
//!
//! Layout
//! - Bucket `i` is `slots[i]`. An occupied head holds a key whose
//!   `hash % capacity == i`; keys that collide with it are appended to its
//!   chain in insertion order.
//! - Only a head can be vacant. A vacant head never owns a chain.
//! - Head slots are never freed on their own. Removing an occupied head
//!   pulls its successor's entry into the head and frees the successor.
//!
//! Growth policy
//! - The first insertion allocates one bucket.
//! - After each insertion, the table rehashes if the touched chain holds
//!   more than `max_chain_depth` entries or the load factor exceeds
//!   `max_load_factor`. A rehash doubles the capacity, clamped to
//!   `max_capacity`; at the cap it is skipped.
//! - A rehash appends every entry to its new bucket's chain by stored hash,
//!   in old bucket order, without calling `K: Eq`. It may produce a chain
//!   deeper than `max_chain_depth`; that chain is only revisited when a
//!   later insertion lands in its bucket.
//! - If the larger array cannot be allocated, the rehash is skipped and
//!   logged; the table stays as it was and the insertion that asked for the
//!   growth stands.
//!
//! Hashing
//! - Each entry stores its `u64` hash. Rehashing uses the stored hash and
//!   never calls `K: Hash`; lookups compare hashes before keys.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync`. Cursors borrow the table,
//!   so it cannot change under a traversal.
//! - Reentrancy: a debug-only guard panics if `K: Eq`/`K: Hash` reaches
//!   back into the table while an operation is running.
//! - Capacity never shrinks.
//!
//! Notes and non-goals
//! - No serialization of the table.
//! - Iteration order is bucket order then chain order, and is unspecified
//!   across mutations.

mod chained_hash_table;
#[cfg(test)]
mod chained_hash_table_proptest;
pub mod config;
pub mod cursor;
mod error;
mod reentrancy;
mod slot;

// Public surface
pub use chained_hash_table::ChainedHashTable;
pub use config::TableConfig;
pub use cursor::{Cursor, Iter, Keys, Values};
pub use error::{ConfigError, OutOfRange};
