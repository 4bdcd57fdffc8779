use std::{
    borrow::Borrow,
    fmt::{self, Debug},
    hash::{BuildHasher, Hash},
    mem,
    ops::Index,
};

use tracing::{debug, warn};

use crate::{
    ConfigError, DEFAULT_LOAD_FACTOR, DefaultHashBuilder,
    config::{MAX_SIZE_EXPONENT, TableConfig},
    iter::{Cursor, IntoIter, Iter, IterMut, Keys, Values},
    slot::SlotStore,
};

/// Open-addressing hash map over a power-of-two slot array.
///
/// Every key lives directly in the slot array. Collisions are resolved by
/// walking the configured probe sequence from `hash & (capacity - 1)`.
/// Entries are never removed, so a lookup can stop at the first vacant slot
/// it meets.
///
/// # Growth
///
/// Before a new slot is claimed, the table checks
/// `len >= load_factor * capacity`. If it holds, a fresh store with
/// `size_exponent + growth_step` is built and every entry is rehashed into
/// it. Borrowing rules keep iterators and cursors from outliving the store
/// they walk.
pub struct HashTable<K, V, S = DefaultHashBuilder> {
    slots: SlotStore<K, V>,
    config: TableConfig,
    grow_at: usize,
    hash_builder: S,
}

impl<K, V> HashTable<K, V, DefaultHashBuilder> {
    /// Empty table with 32 slots and a 0.6 load factor.
    pub fn new() -> Self {
        Self::with_config_unchecked(TableConfig::default(), DefaultHashBuilder::default())
    }

    /// # Panics
    /// Panics if the table could not grow once from `size_exponent`
    /// without passing [`MAX_SIZE_EXPONENT`].
    pub fn with_size_exponent(size_exponent: u32) -> Self {
        Self::with_size_exponent_and_load_factor(size_exponent, DEFAULT_LOAD_FACTOR)
    }

    /// Empty table with `2^size_exponent` slots that grows once
    /// `len >= load_factor * capacity`.
    ///
    /// # Panics
    /// Panics if the shape is rejected by [`TableConfig::validate`].
    pub fn with_size_exponent_and_load_factor(size_exponent: u32, load_factor: f64) -> Self {
        let config = TableConfig::default()
            .with_size_exponent(size_exponent)
            .with_load_factor(load_factor);

        match Self::try_with_config(config) {
            Ok(table) => table,
            Err(err) => panic!("invalid table shape: {err}"),
        }
    }

    pub fn try_with_config(config: TableConfig) -> Result<Self, ConfigError> {
        Self::try_with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V, S> HashTable<K, V, S> {
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_config_unchecked(TableConfig::default(), hash_builder)
    }

    pub fn try_with_config_and_hasher(config: TableConfig, hash_builder: S) -> Result<Self, ConfigError> {
        if let Err(err) = config.validate() {
            warn!(?config, %err, "rejected table config");
            return Err(err);
        }
        Ok(Self::with_config_unchecked(config, hash_builder))
    }

    fn with_config_unchecked(config: TableConfig, hash_builder: S) -> Self {
        let slots = SlotStore::with_size_exponent(config.size_exponent);
        let grow_at = config.growth_threshold(slots.capacity());
        Self {
            slots,
            config,
            grow_at,
            hash_builder,
        }
    }

    /// Number of slots, always `2^size_exponent`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    #[inline]
    pub fn size_exponent(&self) -> u32 {
        self.slots.size_exponent()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current occupancy as a fraction of capacity.
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.capacity() as f64
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Entries in slot order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.slots)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.slots)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }

    /// Cursor at the first occupied slot, or at [`end`](Self::end) if the
    /// table is empty.
    pub fn begin(&self) -> Cursor<'_, K, V> {
        Cursor::begin(&self.slots)
    }

    /// Cursor one past the last slot.
    pub fn end(&self) -> Cursor<'_, K, V> {
        Cursor::end(&self.slots)
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    pub fn hash<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        self.hash_builder.hash_one(key)
    }

    /// Slot where `key` lives, or the vacant slot where it would be placed.
    ///
    /// `None` means the probe visited every slot without finding either.
    #[inline]
    pub fn find_slot<Q>(&self, key: &Q, hash: u64) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let slots = &self.slots;
        self.config.strategy.probe(
            hash as usize,
            slots.size_exponent(),
            self.config.stride,
            |idx| match slots.get(idx) {
                None => true,
                Some((k, _)) => k.borrow() == key,
            },
        )
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_hashed(key, self.hash(key))
    }

    /// Lookup with a hash the caller already computed via [`hash`](Self::hash).
    pub fn get_hashed<Q>(&self, key: &Q, hash: u64) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.get_key_value_hashed(key, hash).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value_hashed(key, self.hash(key))
    }

    fn get_key_value_hashed<Q>(&self, key: &Q, hash: u64) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let idx = self.find_slot(key, hash)?;
        self.slots.get(idx)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.find_slot(key, self.hash(key))?;
        self.slots.get_mut(idx).map(|(_, v)| v)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Stored value for `key`, or `default` if absent. Never mutates.
    pub fn get_or_default<Q>(&self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.get(key).cloned().unwrap_or(default)
    }

    /// Insert a key known to be absent.
    ///
    /// Inserting a key that is already present is a logic error. Debug
    /// builds report it as such; release builds still refuse to overwrite
    /// the occupied slot.
    ///
    /// # Panics
    /// Panics if `key` is already present.
    pub fn insert(&mut self, key: K, value: V) {
        let hash = self.hash(&key);
        self.insert_hashed(key, value, hash);
    }

    pub fn insert_hashed(&mut self, key: K, value: V, hash: u64) {
        let idx = self.find_slot(&key, hash);
        debug_assert!(
            !matches!(idx, Some(i) if self.slots.is_occupied(i)),
            "insert of a key that is already present"
        );
        self.claim(idx, key, value, hash);
    }

    /// Update or insert. Returns the value previously stored under `key`.
    pub fn assoc(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash(&key);
        self.assoc_hashed(key, value, hash)
    }

    pub fn assoc_hashed(&mut self, key: K, value: V, hash: u64) -> Option<V> {
        self.upsert(key, value, hash).1
    }

    /// Replace the stored value with `update(current)`, where `current` is
    /// the stored value or `default` when `key` is absent.
    ///
    /// Two probes: one to read, one to write.
    pub fn update_with_default<F>(&mut self, key: K, default: V, update: F) -> &mut V
    where
        V: Clone,
        F: FnOnce(V) -> V,
    {
        let hash = self.hash(&key);
        let current = self.get_hashed(&key, hash).cloned().unwrap_or(default);
        self.upsert(key, update(current), hash).0
    }

    /// Grow ahead of time so `additional` more keys fit without growth.
    pub fn reserve(&mut self, additional: usize) {
        let wanted = self.len().saturating_add(additional);
        let mut exponent = self.size_exponent();

        while exponent < MAX_SIZE_EXPONENT && self.config.growth_threshold(1 << exponent) < wanted {
            exponent += 1;
        }

        if exponent > self.size_exponent() {
            self.rehash_into(exponent);
        }
    }

    fn upsert(&mut self, key: K, value: V, hash: u64) -> (&mut V, Option<V>) {
        let idx = self.find_slot(&key, hash);

        if let Some(i) = idx {
            if self.slots.is_occupied(i) {
                // SAFETY: checked occupied above
                let slot = unsafe { self.slots.value_unchecked_mut(i) };
                let old = mem::replace(slot, value);
                return (slot, Some(old));
            }
        }

        (self.claim(idx, key, value, hash), None)
    }

    /// Claim the vacant slot `idx` for an absent key, growing first if the
    /// table is at its threshold or the probe found no slot.
    fn claim(&mut self, mut idx: Option<usize>, key: K, value: V, hash: u64) -> &mut V {
        loop {
            match idx {
                Some(i) if self.len() < self.grow_at => return self.slots.claim(i, key, value),
                _ => {
                    self.grow();
                    idx = self.find_slot(&key, hash);
                }
            }
        }
    }

    fn grow(&mut self) {
        match self.config.grown_exponent(self.size_exponent()) {
            Some(exponent) => self.rehash_into(exponent),
            None => panic!(
                "table cannot grow past size exponent {MAX_SIZE_EXPONENT} (len: {})",
                self.len()
            ),
        }
    }

    fn rehash_into(&mut self, size_exponent: u32) {
        let from = self.capacity();
        let old = mem::replace(&mut self.slots, SlotStore::with_size_exponent(size_exponent));
        self.grow_at = self.config.growth_threshold(self.slots.capacity());

        for (key, value) in IntoIter::new(old) {
            let hash = self.hash(&key);
            self.place(key, value, hash);
        }

        debug!(
            target: "probetable::grow",
            from,
            to = self.capacity(),
            len = self.len(),
            "rehashed table"
        );
    }

    /// Claim a slot for a rehashed entry. No growth check, keys are distinct.
    fn place(&mut self, key: K, value: V, hash: u64) {
        let slots = &self.slots;
        let idx = self.config.strategy.probe(
            hash as usize,
            slots.size_exponent(),
            self.config.stride,
            |i| !slots.is_occupied(i),
        );

        match idx {
            Some(i) => {
                self.slots.claim(i, key, value);
            }
            None => panic!(
                "probe exhausted {} slots while rehashing: {:?} with stride {} is not full-period",
                self.capacity(),
                self.config.strategy,
                self.config.stride
            ),
        }
    }
}

impl<K, V, S: Default> Default for HashTable<K, V, S> {
    fn default() -> Self {
        Self::with_config_unchecked(TableConfig::default(), S::default())
    }
}

impl<K: Clone, V: Clone, S: Clone> Clone for HashTable<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            config: self.config,
            grow_at: self.grow_at,
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K: Debug, V: Debug, S> Debug for HashTable<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for HashTable<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for HashTable<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, Q, V, S> Index<&Q> for HashTable<K, V, S>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    type Output = V;

    /// # Panics
    /// Panics if `key` is absent.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("key not found in table"),
        }
    }
}

impl<K, V, S> Extend<(K, V)> for HashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (k, v) in iter {
            self.assoc(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::default();
        table.extend(iter);
        table
    }
}

impl<K, V, S> IntoIterator for HashTable<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter::new(self.slots)
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashTable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut HashTable<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}


#[cfg(test)]
mod proptests {
    use super::HashTable;
    use proptest::prelude::*;
    use std::collections::HashMap;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn assoc_matches_std_model(
            ops in proptest::collection::vec((0u16..512, any::<u32>()), 0..2_000),
        ) {
            let mut table: HashTable<u16, u32> = HashTable::new();
            let mut model: HashMap<u16, u32> = HashMap::new();

            for (key, value) in ops {
                prop_assert_eq!(table.assoc(key, value), model.insert(key, value));
            }

            prop_assert_eq!(table.len(), model.len());
            for (key, value) in &model {
                prop_assert_eq!(table.get(key), Some(value));
            }

            let mut entries: Vec<(u16, u32)> = table.iter().map(|(k, v)| (*k, *v)).collect();
            let mut expected: Vec<(u16, u32)> = model.into_iter().collect();
            entries.sort_unstable();
            expected.sort_unstable();
            prop_assert_eq!(entries, expected);
        }

        #[test]
        fn growth_keeps_power_of_two_and_vacancy(
            keys in proptest::collection::vec(any::<u64>(), 0..1_500),
        ) {
            let mut table: HashTable<u64, u64> = HashTable::with_size_exponent(0);
            let mut capacity = table.capacity();

            for key in &keys {
                table.assoc(*key, !*key);

                prop_assert!(table.capacity().is_power_of_two());
                prop_assert!(table.capacity() >= capacity);
                prop_assert!(table.len() < table.capacity());
                capacity = table.capacity();
            }

            for key in &keys {
                prop_assert_eq!(table.get(key), Some(&!*key));
            }
        }

        #[test]
        fn absent_keys_yield_default(
            present in proptest::collection::hash_set(0u32..10_000, 0..300),
            queries in proptest::collection::vec(0u32..10_000, 0..100),
            default in any::<u32>(),
        ) {
            let table: HashTable<u32, u32> = present.iter().map(|&k| (k, k)).collect();

            for query in queries {
                let expected = if present.contains(&query) { query } else { default };
                prop_assert_eq!(table.get_or_default(&query, default), expected);
            }
            prop_assert_eq!(table.len(), present.len());
        }

        #[test]
        fn reverse_iteration_mirrors_forward(
            keys in proptest::collection::hash_set(any::<u32>(), 0..400),
        ) {
            let table: HashTable<u32, ()> = keys.iter().map(|&k| (k, ())).collect();

            let forward: Vec<u32> = table.keys().copied().collect();
            let mut backward: Vec<u32> = table.keys().rev().copied().collect();
            backward.reverse();
            prop_assert_eq!(&forward, &backward);
            prop_assert_eq!(forward.len(), keys.len());

            let mut walked = Vec::new();
            let mut cursor = table.begin();
            while let Some((k, _)) = cursor.entry() {
                walked.push(*k);
                cursor.advance();
            }
            prop_assert_eq!(cursor, table.end());
            prop_assert_eq!(walked, forward);
        }
    }
}
