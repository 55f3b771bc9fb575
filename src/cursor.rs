//! Cursors and iterators over a `ChainedHashTable`.
//!
//! A `Cursor` is a position in the table: a bucket index plus a node of
//! that bucket's chain, or the end sentinel. It borrows the table, so the
//! table cannot be mutated while a traversal is in progress.

use crate::chained_hash_table::ChainedHashTable;
use crate::error::OutOfRange;
use crate::slot::Slot;
use core::fmt;
use core::iter::FusedIterator;

pub struct Cursor<'a, K, V, S> {
    table: &'a ChainedHashTable<K, V, S>,
    // None for the end sentinel.
    position: Option<(usize, &'a Slot<K, V>)>,
}

impl<'a, K, V, S> Cursor<'a, K, V, S> {
    pub(crate) fn begin(table: &'a ChainedHashTable<K, V, S>) -> Self {
        let mut cursor = Self::end(table);
        cursor.seek_head(0);
        cursor
    }

    pub(crate) fn end(table: &'a ChainedHashTable<K, V, S>) -> Self {
        Self {
            table,
            position: None,
        }
    }

    pub(crate) fn at(
        table: &'a ChainedHashTable<K, V, S>,
        bucket: usize,
        node: &'a Slot<K, V>,
    ) -> Self {
        Self {
            table,
            position: Some((bucket, node)),
        }
    }

    // Move to the head of the first occupied bucket at or after `from`, or
    // to the end sentinel if there is none.
    fn seek_head(&mut self, from: usize) {
        let table = self.table;
        self.position = table
            .first_occupied_bucket(from)
            .and_then(|bucket| Some((bucket, table.head(bucket)?)));
    }

    pub fn is_end(&self) -> bool {
        self.position.is_none()
    }

    /// Bucket of the current entry; `None` at the end sentinel.
    pub fn bucket(&self) -> Option<usize> {
        self.position.map(|(bucket, _)| bucket)
    }

    /// Step to the next entry: along the current chain first, then to the
    /// next occupied bucket. Advancing the end sentinel does nothing.
    pub fn advance(&mut self) {
        let Some((bucket, node)) = self.position else {
            return;
        };
        match node.next().filter(|next| next.is_valid()) {
            Some(next) => self.position = Some((bucket, next)),
            None => self.seek_head(bucket + 1),
        }
    }

    /// The entry under the cursor.
    pub fn get(&self) -> Result<(&'a K, &'a V), OutOfRange> {
        let (_, node) = self.position.ok_or(OutOfRange)?;
        let entry = node.entry().ok_or(OutOfRange)?;
        Ok((&entry.key, &entry.value))
    }

    pub fn key(&self) -> Result<&'a K, OutOfRange> {
        let (_, node) = self.position.ok_or(OutOfRange)?;
        node.key().ok_or(OutOfRange)
    }

    pub fn value(&self) -> Result<&'a V, OutOfRange> {
        let (_, node) = self.position.ok_or(OutOfRange)?;
        node.value().ok_or(OutOfRange)
    }
}

impl<K, V, S> Clone for Cursor<'_, K, V, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, S> Copy for Cursor<'_, K, V, S> {}

/// Cursors are equal when they belong to the same table and sit on the same
/// node of the same bucket. End sentinels of one table are all equal.
impl<K, V, S> PartialEq for Cursor<'_, K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        if !core::ptr::eq(self.table, other.table) {
            return false;
        }
        match (self.position, other.position) {
            (None, None) => true,
            (Some((b1, n1)), Some((b2, n2))) => b1 == b2 && core::ptr::eq(n1, n2),
            _ => false,
        }
    }
}

impl<K, V, S> Eq for Cursor<'_, K, V, S> {}

impl<K, V, S> fmt::Debug for Cursor<'_, K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Ok((key, value)) => f
                .debug_struct("Cursor")
                .field("bucket", &self.bucket())
                .field("key", key)
                .field("value", value)
                .finish(),
            Err(_) => f.write_str("Cursor(end)"),
        }
    }
}

/// Iterator over `(&K, &V)` pairs, driven by a `Cursor`.
pub struct Iter<'a, K, V, S> {
    cursor: Cursor<'a, K, V, S>,
    remaining: usize,
}

impl<'a, K, V, S> Iter<'a, K, V, S> {
    pub(crate) fn new(cursor: Cursor<'a, K, V, S>, remaining: usize) -> Self {
        Self { cursor, remaining }
    }
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.cursor.get().ok()?;
        self.cursor.advance();
        self.remaining = self.remaining.saturating_sub(1);
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, S> ExactSizeIterator for Iter<'_, K, V, S> {}
impl<K, V, S> FusedIterator for Iter<'_, K, V, S> {}

impl<K, V, S> Clone for Iter<'_, K, V, S> {
    fn clone(&self) -> Self {
        Self {
            cursor: self.cursor,
            remaining: self.remaining,
        }
    }
}

pub struct Keys<'a, K, V, S> {
    pub(crate) inner: Iter<'a, K, V, S>,
}

impl<'a, K, V, S> Iterator for Keys<'a, K, V, S> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

pub struct Values<'a, K, V, S> {
    pub(crate) inner: Iter<'a, K, V, S>,
}

impl<'a, K, V, S> Iterator for Values<'a, K, V, S> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
