use std::{fmt, iter::FusedIterator, ptr};

use crate::slot::{OccupiedMut, SlotStore};

/// Position over the occupied slots of a table.
///
/// Offsets run over `[0, capacity]`; `capacity` is the end position and is
/// never occupied. Two cursors are equal iff they walk the same table and
/// sit at the same offset.
///
/// A cursor borrows the table, so the table cannot grow (and replace its
/// slot array) while the cursor is alive.
pub struct Cursor<'a, K, V> {
    slots: &'a SlotStore<K, V>,
    offset: usize,
}

impl<'a, K, V> Cursor<'a, K, V> {
    pub(crate) fn begin(slots: &'a SlotStore<K, V>) -> Self {
        let offset = slots.next_occupied(0).unwrap_or(slots.capacity());
        Self { slots, offset }
    }

    pub(crate) fn end(slots: &'a SlotStore<K, V>) -> Self {
        Self {
            slots,
            offset: slots.capacity(),
        }
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.offset == self.slots.capacity()
    }

    /// Entry at the current slot, `None` at the end position.
    #[inline]
    pub fn entry(&self) -> Option<(&'a K, &'a V)> {
        if self.is_end() {
            return None;
        }
        self.slots.get(self.offset)
    }

    /// Move to the next occupied slot, or to the end position.
    /// Stays put at the end.
    pub fn advance(&mut self) {
        if self.is_end() {
            return;
        }
        self.offset = self
            .slots
            .next_occupied(self.offset + 1)
            .unwrap_or(self.slots.capacity());
    }

    /// Move to the previous occupied slot. Returns `false` and stays put if
    /// there is none.
    pub fn retreat(&mut self) -> bool {
        match self.slots.prev_occupied(self.offset) {
            Some(idx) => {
                self.offset = idx;
                true
            }
            None => false,
        }
    }
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Cursor<'_, K, V> {}

impl<K, V> PartialEq for Cursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.slots, other.slots) && self.offset == other.offset
    }
}

impl<K, V> Eq for Cursor<'_, K, V> {}

impl<K, V> fmt::Debug for Cursor<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("offset", &self.offset)
            .field("capacity", &self.slots.capacity())
            .finish()
    }
}

/// Entries of a table in slot order.
///
/// Front and back scans share one remaining-count, so they never cross.
pub struct Iter<'a, K, V> {
    slots: &'a SlotStore<K, V>,
    front: usize,
    back: usize,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(slots: &'a SlotStore<K, V>) -> Self {
        Self {
            slots,
            front: 0,
            back: slots.capacity(),
            remaining: slots.len(),
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.slots.next_occupied(self.front)?;
        self.front = idx + 1;
        self.remaining -= 1;
        self.slots.get(idx)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.slots.prev_occupied(self.back)?;
        self.back = idx;
        self.remaining -= 1;
        self.slots.get(idx)
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

pub struct IterMut<'a, K, V> {
    inner: OccupiedMut<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(slots: &'a mut SlotStore<K, V>) -> Self {
        let remaining = slots.len();
        Self {
            inner: slots.occupied_mut(),
            remaining,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (_, k, v) = self.inner.next()?;
        self.remaining -= 1;
        Some((k, v))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        let (_, k, v) = self.inner.next_back()?;
        self.remaining -= 1;
        Some((k, v))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Values<'a, K, V> {
    pub(crate) fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// Owning iterator. Entries not yet yielded drop with it.
pub struct IntoIter<K, V> {
    slots: SlotStore<K, V>,
    front: usize,
    back: usize,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(slots: SlotStore<K, V>) -> Self {
        let back = slots.capacity();
        Self {
            slots,
            front: 0,
            back,
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        let idx = self.slots.next_occupied(self.front)?;
        self.front = idx + 1;
        self.slots.take(idx)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.slots.len(), Some(self.slots.len()))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<(K, V)> {
        let idx = self.slots.prev_occupied(self.back)?;
        self.back = idx;
        self.slots.take(idx)
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}
