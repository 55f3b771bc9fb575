//! ChainedHashTable: bucket array with owned overflow chains.

use crate::config::TableConfig;
use crate::cursor::{Cursor, Iter, Keys, Values};
use crate::reentrancy::DebugReentrancy;
use crate::slot::{Entry, Slot};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use log::{debug, trace, warn};
use std::collections::TryReserveError;

/// Where a key lives, or would live, within one bucket chain.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Probe {
    /// An occupied node at this depth holds the key.
    Found(usize),
    /// The node at this depth is vacant and can take the key.
    Vacant(usize),
    /// The key is absent and the chain is full; its last node is at this depth.
    Tail(usize),
}

/// The bucket array and its bookkeeping. Works on precomputed hashes only;
/// hashing and reentrancy checks live in `ChainedHashTable`.
struct Buckets<K, V> {
    // Empty exactly while capacity is 0.
    slots: Vec<Slot<K, V>>,
    len: usize,
    load_factor: f32,
    // Makes every growth reservation fail.
    #[cfg(test)]
    deny_growth: bool,
}

impl<K, V> Buckets<K, V> {
    const fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
            load_factor: 0.0,
            #[cfg(test)]
            deny_growth: false,
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn bucket_for(hash: u64, capacity: usize) -> usize {
        (hash % capacity as u64) as usize
    }

    fn update_load_factor(&mut self) {
        self.load_factor = if self.slots.is_empty() {
            0.0
        } else {
            self.len as f32 / self.slots.len() as f32
        };
    }

    /// Walk the chain of `head` looking for `q`. Comparison stops at the
    /// first vacant node: no occupied node follows a vacant one.
    fn probe<Q>(head: &Slot<K, V>, hash: u64, q: &Q) -> Probe
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut depth = 0;
        let mut node = head;
        loop {
            match node.entry() {
                None => return Probe::Vacant(depth),
                Some(e) if e.hash == hash && e.key.borrow() == q => return Probe::Found(depth),
                Some(_) => {}
            }
            match node.next() {
                Some(next) => {
                    node = next;
                    depth += 1;
                }
                None => return Probe::Tail(depth),
            }
        }
    }

    /// Locate `q` as `(bucket, depth)`.
    fn locate<Q>(&self, hash: u64, q: &Q) -> Option<(usize, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        if self.slots.is_empty() {
            return None;
        }
        let bucket = Self::bucket_for(hash, self.slots.len());
        match Self::probe(&self.slots[bucket], hash, q) {
            Probe::Found(depth) => Some((bucket, depth)),
            Probe::Vacant(_) | Probe::Tail(_) => None,
        }
    }

    fn node(&self, bucket: usize, depth: usize) -> Option<&Slot<K, V>> {
        self.slots.get(bucket)?.node_at_depth(depth)
    }

    fn node_mut(&mut self, bucket: usize, depth: usize) -> Option<&mut Slot<K, V>> {
        self.slots.get_mut(bucket)?.node_at_depth_mut(depth)
    }

    /// Place `entry` into `slots`: overwrite the value of a node with an
    /// equal key, else fill the first vacant node, else append a new node at
    /// the tail. Returns the bucket used and the replaced value, if any.
    fn place(slots: &mut [Slot<K, V>], entry: Entry<K, V>) -> (usize, Option<V>)
    where
        K: Eq,
    {
        let bucket = Self::bucket_for(entry.hash, slots.len());
        let head = &mut slots[bucket];
        let probe = Self::probe(head, entry.hash, &entry.key);
        let depth = match probe {
            Probe::Found(d) | Probe::Vacant(d) | Probe::Tail(d) => d,
        };
        let Some(node) = head.node_at_depth_mut(depth) else {
            unreachable!("probe reported depth {depth} beyond the chain");
        };
        match probe {
            Probe::Found(_) => (bucket, node.set_value(entry.value)),
            Probe::Vacant(_) => {
                node.fill(entry);
                (bucket, None)
            }
            Probe::Tail(_) => {
                node.set_next(Some(Box::new(Slot::occupied(entry))));
                (bucket, None)
            }
        }
    }

    /// Append an entry already known to be absent from `slots`: fill the
    /// vacant head, or link a new node after the chain's tail. Only the
    /// stored hash is read; no `K: Eq` call is made.
    fn relink(slots: &mut [Slot<K, V>], entry: Entry<K, V>) {
        let bucket = Self::bucket_for(entry.hash, slots.len());
        let head = &mut slots[bucket];
        let Some(tail_depth) = head.chain_len().checked_sub(1) else {
            head.fill(entry);
            return;
        };
        let Some(tail) = head.node_at_depth_mut(tail_depth) else {
            unreachable!("chain of {} entries has no tail", tail_depth + 1);
        };
        tail.set_next(Some(Box::new(Slot::occupied(entry))));
    }

    fn insert(&mut self, entry: Entry<K, V>, config: &TableConfig) -> Option<V>
    where
        K: Eq,
    {
        if self.slots.is_empty() && !self.rehash(config) {
            std::alloc::handle_alloc_error(core::alloc::Layout::new::<Slot<K, V>>());
        }
        let (bucket, replaced) = Self::place(&mut self.slots, entry);
        if replaced.is_none() {
            self.len += 1;
            self.update_load_factor();
        }
        if self.requires_rehash(bucket, config) {
            self.rehash(config);
        }
        replaced
    }

    /// Head slots belong to the array and are never freed: removing a head
    /// that has a successor moves the successor's entry into the head and
    /// frees the successor node instead. A head without a successor just
    /// becomes vacant. Any deeper node is unlinked and freed.
    fn remove_at(&mut self, bucket: usize, depth: usize) -> Option<Entry<K, V>> {
        let head = self.slots.get_mut(bucket)?;
        let removed = if depth == 0 {
            let removed = head.take_entry()?;
            if let Some(mut successor) = head.take_next() {
                *head = successor.take();
            }
            removed
        } else {
            let predecessor = head.node_at_depth_mut(depth - 1)?;
            let mut victim = predecessor.take_next()?;
            predecessor.set_next(victim.take_next());
            victim.take_entry()?
        };
        self.len -= 1;
        self.update_load_factor();
        Some(removed)
    }

    fn requires_rehash(&self, bucket: usize, config: &TableConfig) -> bool {
        self.slots[bucket].chain_len() > config.max_chain_depth()
            || self.load_factor > config.max_load_factor()
    }

    /// Move every entry into a fresh array of the next capacity. Returns
    /// false if the table is already at its cap or the allocation failed;
    /// in both cases the current array is left untouched.
    ///
    /// Entries are moved with `relink`, so no user code runs while the old
    /// array is detached. This can build a chain longer than
    /// `max_chain_depth`; that chain is left alone until a later insertion
    /// lands in its bucket.
    fn rehash(&mut self, config: &TableConfig) -> bool {
        let old_capacity = self.slots.len();
        let new_capacity = config.next_capacity(old_capacity);
        if new_capacity == old_capacity {
            trace!(
                "rehash skipped: capacity {} is at max_capacity (len {}, load factor {})",
                old_capacity,
                self.len,
                self.load_factor
            );
            return false;
        }

        let mut fresh: Vec<Slot<K, V>> = Vec::new();
        if let Err(err) = self.reserve(&mut fresh, new_capacity) {
            warn!(
                "rehash skipped: could not allocate {} buckets: {}",
                new_capacity, err
            );
            return false;
        }
        fresh.resize_with(new_capacity, Slot::empty);

        debug!(
            "rehashing {} entries from {} to {} buckets",
            self.len, old_capacity, new_capacity
        );
        for mut head in core::mem::take(&mut self.slots) {
            let mut next = head.take_next();
            if let Some(entry) = head.take_entry() {
                Self::relink(&mut fresh, entry);
            }
            while let Some(mut node) = next {
                next = node.take_next();
                if let Some(entry) = node.take_entry() {
                    Self::relink(&mut fresh, entry);
                }
            }
        }
        self.slots = fresh;
        self.update_load_factor();
        true
    }

    fn reserve(
        &self,
        fresh: &mut Vec<Slot<K, V>>,
        capacity: usize,
    ) -> Result<(), TryReserveError> {
        #[cfg(test)]
        {
            if self.deny_growth {
                // More than isize::MAX bytes: always refused.
                return fresh.try_reserve_exact(usize::MAX);
            }
        }
        fresh.try_reserve_exact(capacity)
    }
}

impl<K: Clone, V: Clone> Clone for Buckets<K, V> {
    /// Deep copy: every chain is rebuilt node by node, so the copy shares no
    /// ownership with the original.
    fn clone(&self) -> Self {
        let slots = self
            .slots
            .iter()
            .map(|head| {
                let mut copy = head.detached_clone();
                let mut overflow = Vec::new();
                let mut node = head.next();
                while let Some(slot) = node {
                    overflow.push(slot.detached_clone());
                    node = slot.next();
                }
                let mut tail: Option<Box<Slot<K, V>>> = None;
                for mut slot in overflow.into_iter().rev() {
                    slot.set_next(tail);
                    tail = Some(Box::new(slot));
                }
                copy.set_next(tail);
                copy
            })
            .collect();
        Self {
            slots,
            len: self.len,
            load_factor: self.load_factor,
            #[cfg(test)]
            deny_growth: false,
        }
    }
}

pub struct ChainedHashTable<K, V, S = DefaultHashBuilder> {
    hasher: S,
    buckets: Buckets<K, V>,
    config: TableConfig,
    reentrancy: DebugReentrancy,
}

impl<K, V> ChainedHashTable<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_config_and_hasher(TableConfig::default(), Default::default())
    }

    pub fn with_config(config: TableConfig) -> Self {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl<K, V> Default for ChainedHashTable<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ChainedHashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_config_and_hasher(TableConfig::default(), hasher)
    }

    /// Create an empty table. No bucket array is allocated until the first
    /// insertion.
    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Self {
        Self {
            hasher,
            buckets: Buckets::new(),
            config,
            reentrancy: DebugReentrancy::new(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn locate<Q>(&self, q: &Q) -> Option<(usize, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.buckets.capacity() == 0 {
            return None;
        }
        self.buckets.locate(self.make_hash(q), q)
    }

    /// Insert `key -> value`. If the key is already present only its value
    /// is overwritten and the previous value is returned; otherwise the
    /// entry is added and `None` is returned. May trigger a rehash.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(&key);
        self.buckets
            .insert(Entry::new(hash, key, value), &self.config)
    }

    /// Cursor positioned at `q`, or the end sentinel if `q` is absent.
    pub fn find<Q>(&self, q: &Q) -> Cursor<'_, K, V, S>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        self.locate(q)
            .and_then(|(bucket, depth)| {
                let node = self.buckets.node(bucket, depth)?;
                Some(Cursor::at(self, bucket, node))
            })
            .unwrap_or_else(|| Cursor::end(self))
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let (bucket, depth) = self.locate(q)?;
        self.buckets.node(bucket, depth)?.value()
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let (bucket, depth) = self.locate(q)?;
        self.buckets.node_mut(bucket, depth)?.value_mut()
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        self.locate(q).is_some()
    }

    /// Remove `q`, returning the owned pair. Absent keys are a no-op.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let (bucket, depth) = self.locate(q)?;
        let removed = self.buckets.remove_at(bucket, depth)?;
        Some((removed.key, removed.value))
    }
}

impl<K, V, S> ChainedHashTable<K, V, S> {
    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.buckets.len
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.len == 0
    }

    /// Number of buckets. Zero until the first insertion; only ever grows.
    pub fn capacity(&self) -> usize {
        self.buckets.capacity()
    }

    /// `len / capacity`, or 0 for a table that never allocated.
    pub fn load_factor(&self) -> f32 {
        self.buckets.load_factor
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub(crate) fn head(&self, bucket: usize) -> Option<&Slot<K, V>> {
        self.buckets.slots.get(bucket)
    }

    /// First bucket at or after `from` whose head is occupied.
    pub(crate) fn first_occupied_bucket(&self, from: usize) -> Option<usize> {
        self.buckets
            .slots
            .get(from..)?
            .iter()
            .position(Slot::is_valid)
            .map(|offset| from + offset)
    }

    /// Cursor at the first entry, or the end sentinel for an empty table.
    pub fn begin(&self) -> Cursor<'_, K, V, S> {
        Cursor::begin(self)
    }

    /// The end sentinel.
    pub fn end(&self) -> Cursor<'_, K, V, S> {
        Cursor::end(self)
    }

    /// Visit every entry exactly once, in bucket order and then chain
    /// order. The order is unspecified across mutations.
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter::new(self.begin(), self.buckets.len)
    }

    pub fn keys(&self) -> Keys<'_, K, V, S> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V, S> {
        Values { inner: self.iter() }
    }
}

impl<K, V, S> Clone for ChainedHashTable<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            buckets: self.buckets.clone(),
            config: self.config,
            reentrancy: DebugReentrancy::new(),
        }
    }
}

impl<K, V, S> fmt::Debug for ChainedHashTable<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for ChainedHashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainedHashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::with_hasher(S::default());
        table.extend(iter);
        table
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashTable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
