use std::{
    iter::{Enumerate, Zip},
    mem::MaybeUninit,
    slice,
};

const WORD_BITS: usize = u64::BITS as usize;
const WORD_SHIFT: usize = 6;
const WORD_MASK: usize = WORD_BITS - 1;

#[inline(always)]
fn bit_is_set(occupied: &[u64], idx: usize) -> bool {
    (occupied[idx >> WORD_SHIFT] >> (idx & WORD_MASK)) & 1 == 1
}

fn uninit_slice<T>(len: usize) -> Box<[MaybeUninit<T>]> {
    (0..len)
        .map(|_| MaybeUninit::uninit())
        .collect::<Vec<_>>()
        .into_boxed_slice()
}

/// Fixed-capacity parallel arrays of keys and values.
///
/// Capacity is `2^size_exponent`. A bit in `occupied` guards each
/// key/value pair: the pair is initialized iff the bit is set. The three
/// arrays are allocated together and never resized; growth builds a new
/// store.
pub struct SlotStore<K, V> {
    occupied: Box<[u64]>,
    keys: Box<[MaybeUninit<K>]>,
    values: Box<[MaybeUninit<V>]>,
    len: usize,
    size_exponent: u32,
}

impl<K, V> SlotStore<K, V> {
    pub fn with_size_exponent(size_exponent: u32) -> Self {
        debug_assert!(
            size_exponent < usize::BITS,
            "size exponent {size_exponent} out of range"
        );

        let capacity = 1usize << size_exponent;
        let words = capacity.div_ceil(WORD_BITS);

        Self {
            occupied: vec![0u64; words].into_boxed_slice(),
            keys: uninit_slice(capacity),
            values: uninit_slice(capacity),
            len: 0,
            size_exponent,
        }
    }

    /// Claim a vacant slot. Returns the stored value.
    ///
    /// # Panics
    /// Panics if `idx` is out of bounds or already occupied.
    #[inline]
    pub fn claim(&mut self, idx: usize, key: K, value: V) -> &mut V {
        assert!(!self.is_occupied(idx), "slot {idx} already occupied");

        self.keys[idx].write(key);
        self.occupied[idx >> WORD_SHIFT] |= 1u64 << (idx & WORD_MASK);
        self.len += 1;
        self.values[idx].write(value)
    }

    /// Move the entry out of an occupied slot, leaving it vacant.
    ///
    /// Only growth and owning iteration vacate slots; the table itself never
    /// deletes.
    #[inline]
    pub fn take(&mut self, idx: usize) -> Option<(K, V)> {
        if !self.is_occupied(idx) {
            return None;
        }

        self.occupied[idx >> WORD_SHIFT] &= !(1u64 << (idx & WORD_MASK));
        self.len -= 1;

        // SAFETY: the occupied bit was set, so both halves are initialized,
        // and clearing it above hands ownership to us.
        unsafe {
            Some((
                self.keys[idx].assume_init_read(),
                self.values[idx].assume_init_read(),
            ))
        }
    }

    /// Check if slot is occupied.
    ///
    /// # Panics
    /// Panics if `idx >= capacity`.
    #[inline(always)]
    pub fn is_occupied(&self, idx: usize) -> bool {
        assert!(
            idx < self.capacity(),
            "slot {idx} out of bounds (capacity: {})",
            self.capacity()
        );
        bit_is_set(&self.occupied, idx)
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<(&K, &V)> {
        if !self.is_occupied(idx) {
            return None;
        }
        // SAFETY: occupied bit set
        unsafe { Some(self.get_unchecked(idx)) }
    }

    #[inline]
    pub fn get_mut(&mut self, idx: usize) -> Option<(&K, &mut V)> {
        if !self.is_occupied(idx) {
            return None;
        }
        // SAFETY: occupied bit set
        unsafe {
            Some((
                self.keys[idx].assume_init_ref(),
                self.values[idx].assume_init_mut(),
            ))
        }
    }

    /// # Safety
    /// Caller must ensure `idx < capacity` and the slot is occupied.
    #[inline(always)]
    pub unsafe fn get_unchecked(&self, idx: usize) -> (&K, &V) {
        debug_assert!(bit_is_set(&self.occupied, idx), "slot {idx} is vacant");

        unsafe {
            (
                self.keys.get_unchecked(idx).assume_init_ref(),
                self.values.get_unchecked(idx).assume_init_ref(),
            )
        }
    }

    /// # Safety
    /// Caller must ensure `idx < capacity` and the slot is occupied.
    #[inline(always)]
    pub unsafe fn value_unchecked_mut(&mut self, idx: usize) -> &mut V {
        debug_assert!(bit_is_set(&self.occupied, idx), "slot {idx} is vacant");

        unsafe { self.values.get_unchecked_mut(idx).assume_init_mut() }
    }

    /// First occupied slot at or after `from`.
    pub fn next_occupied(&self, from: usize) -> Option<usize> {
        if from >= self.capacity() {
            return None;
        }

        let mut word = from >> WORD_SHIFT;
        let mut bits = self.occupied[word] & (!0u64 << (from & WORD_MASK));

        loop {
            if bits != 0 {
                return Some((word << WORD_SHIFT) + bits.trailing_zeros() as usize);
            }
            word += 1;
            if word >= self.occupied.len() {
                return None;
            }
            bits = self.occupied[word];
        }
    }

    /// Last occupied slot strictly before `before`.
    pub fn prev_occupied(&self, before: usize) -> Option<usize> {
        let before = before.min(self.capacity());
        if before == 0 {
            return None;
        }

        let last = before - 1;
        let mut word = last >> WORD_SHIFT;
        let keep = (last & WORD_MASK) as u32;
        let mut bits = self.occupied[word] & (!0u64 >> (WORD_MASK as u32 - keep));

        loop {
            if bits != 0 {
                return Some((word << WORD_SHIFT) + WORD_MASK - bits.leading_zeros() as usize);
            }
            if word == 0 {
                return None;
            }
            word -= 1;
            bits = self.occupied[word];
        }
    }

    /// Occupied slots in slot order, with mutable access to values.
    pub fn occupied_mut(&mut self) -> OccupiedMut<'_, K, V> {
        OccupiedMut {
            occupied: &self.occupied,
            inner: self.keys.iter().zip(self.values.iter_mut()).enumerate(),
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.keys.len()
    }

    #[inline(always)]
    pub fn size_exponent(&self) -> u32 {
        self.size_exponent
    }
}

impl<K: Clone, V: Clone> Clone for SlotStore<K, V> {
    fn clone(&self) -> Self {
        let mut out = Self::with_size_exponent(self.size_exponent);
        let mut idx = 0;
        while let Some(found) = self.next_occupied(idx) {
            // SAFETY: next_occupied only returns occupied slots
            let (k, v) = unsafe { self.get_unchecked(found) };
            out.claim(found, k.clone(), v.clone());
            idx = found + 1;
        }
        out
    }
}

impl<K, V> Drop for SlotStore<K, V> {
    fn drop(&mut self) {
        if self.len == 0 {
            return;
        }
        let mut idx = 0;
        while let Some(found) = self.next_occupied(idx) {
            // SAFETY: occupied bit set; the store is going away so the bit
            // is never read again.
            unsafe {
                self.keys[found].assume_init_drop();
                self.values[found].assume_init_drop();
            }
            idx = found + 1;
        }
    }
}

type SlotPairs<'a, K, V> =
    Enumerate<Zip<slice::Iter<'a, MaybeUninit<K>>, slice::IterMut<'a, MaybeUninit<V>>>>;

/// Occupied `(slot, key, value)` triples with mutable values.
pub struct OccupiedMut<'a, K, V> {
    occupied: &'a [u64],
    inner: SlotPairs<'a, K, V>,
}

impl<'a, K, V> Iterator for OccupiedMut<'a, K, V> {
    type Item = (usize, &'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        for (idx, (k, v)) in self.inner.by_ref() {
            if bit_is_set(self.occupied, idx) {
                // SAFETY: occupied bit set
                return Some(unsafe { (idx, k.assume_init_ref(), v.assume_init_mut()) });
            }
        }
        None
    }
}

impl<K, V> DoubleEndedIterator for OccupiedMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while let Some((idx, (k, v))) = self.inner.next_back() {
            if bit_is_set(self.occupied, idx) {
                // SAFETY: occupied bit set
                return Some(unsafe { (idx, k.assume_init_ref(), v.assume_init_mut()) });
            }
        }
        None
    }
}
