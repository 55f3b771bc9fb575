//! Slot: one storage cell of a bucket chain.
//!
//! A slot is either vacant or holds one `Entry`, and owns at most one
//! successor through `next`. Slots living in the table's array are never
//! freed individually; successors are boxed and owned solely by their
//! predecessor. In a well-formed chain every boxed successor is occupied,
//! so only an array-resident head can be vacant.

/// A stored key/value pair together with the key's precomputed hash.
#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) hash: u64,
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K, V> Entry<K, V> {
    #[inline]
    pub(crate) fn new(hash: u64, key: K, value: V) -> Self {
        Self { hash, key, value }
    }
}

#[derive(Debug)]
pub(crate) struct Slot<K, V> {
    entry: Option<Entry<K, V>>,
    next: Option<Box<Slot<K, V>>>,
}

impl<K, V> Slot<K, V> {
    pub(crate) const fn empty() -> Self {
        Self {
            entry: None,
            next: None,
        }
    }

    pub(crate) fn occupied(entry: Entry<K, V>) -> Self {
        Self {
            entry: Some(entry),
            next: None,
        }
    }

    #[inline]
    pub(crate) fn is_valid(&self) -> bool {
        self.entry.is_some()
    }

    #[inline]
    pub(crate) fn entry(&self) -> Option<&Entry<K, V>> {
        self.entry.as_ref()
    }

    #[inline]
    pub(crate) fn key(&self) -> Option<&K> {
        self.entry.as_ref().map(|e| &e.key)
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<&V> {
        self.entry.as_ref().map(|e| &e.value)
    }

    #[inline]
    pub(crate) fn value_mut(&mut self) -> Option<&mut V> {
        self.entry.as_mut().map(|e| &mut e.value)
    }

    /// Overwrite the value of an occupied slot in place, keeping its key.
    /// Returns the previous value, or `None` (and drops `value`) if vacant.
    pub(crate) fn set_value(&mut self, value: V) -> Option<V> {
        self.value_mut()
            .map(|slot_value| core::mem::replace(slot_value, value))
    }

    /// Turn a vacant slot into an occupied one. The chain is left as is.
    pub(crate) fn fill(&mut self, entry: Entry<K, V>) {
        debug_assert!(!self.is_valid(), "fill on an occupied slot");
        self.entry = Some(entry);
    }

    /// Vacate the slot, handing back its entry. The chain is left as is.
    pub(crate) fn take_entry(&mut self) -> Option<Entry<K, V>> {
        self.entry.take()
    }

    #[inline]
    pub(crate) fn next(&self) -> Option<&Slot<K, V>> {
        self.next.as_deref()
    }

    pub(crate) fn set_next(&mut self, next: Option<Box<Slot<K, V>>>) {
        debug_assert!(self.next.is_none(), "set_next would leak a chain");
        self.next = next;
    }

    pub(crate) fn take_next(&mut self) -> Option<Box<Slot<K, V>>> {
        self.next.take()
    }

    /// Walk `depth` successor links. Fails if the chain is shorter than
    /// `depth` or a node stepped over is vacant.
    pub(crate) fn node_at_depth(&self, depth: usize) -> Option<&Slot<K, V>> {
        let mut node = self;
        for _ in 0..depth {
            if !node.is_valid() {
                return None;
            }
            node = node.next.as_deref()?;
        }
        Some(node)
    }

    pub(crate) fn node_at_depth_mut(&mut self, depth: usize) -> Option<&mut Slot<K, V>> {
        let mut node = self;
        for _ in 0..depth {
            if !node.is_valid() {
                return None;
            }
            node = node.next.as_deref_mut()?;
        }
        Some(node)
    }

    /// Number of occupied slots from this one up to the first vacant slot.
    pub(crate) fn chain_len(&self) -> usize {
        let mut len = 0;
        let mut node = Some(self);
        while let Some(slot) = node.filter(|s| s.is_valid()) {
            len += 1;
            node = slot.next();
        }
        len
    }

    /// Move the whole slot out, chain included, leaving a vacant slot with
    /// no successor behind.
    pub(crate) fn take(&mut self) -> Slot<K, V> {
        core::mem::replace(self, Slot::empty())
    }

    /// Copy the entry of this slot without its chain. The copy never shares
    /// or duplicates ownership of the successors.
    pub(crate) fn detached_clone(&self) -> Slot<K, V>
    where
        K: Clone,
        V: Clone,
    {
        Slot {
            entry: self.entry.as_ref().map(|e| Entry {
                hash: e.hash,
                key: e.key.clone(),
                value: e.value.clone(),
            }),
            next: None,
        }
    }
}

impl<K, V> Drop for Slot<K, V> {
    // Unlink successors one at a time so dropping a long chain does not
    // recurse once per node.
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(mut node) = next {
            next = node.next.take();
        }
    }
}
