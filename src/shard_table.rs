//! A hash table whose buckets are [`OrderedMap`]s. Keys are sharded across
//! buckets by `hash(key) % capacity`; keys that collide end up in the same
//! tree instead of a chain, so a badly loaded bucket still searches in
//! O(height) rather than O(len).

use std::{
    borrow::Borrow,
    cmp::Ordering,
    collections::{hash_map::RandomState, BinaryHeap},
    fmt,
    hash::{BuildHasher, Hash, Hasher},
    mem, slice,
};

use tracing::debug;

use crate::config::{TableConfig, DEFAULT_CAPACITY, DEFAULT_MAX_LOAD_FACTOR};
use crate::error::{Error, Result};
use crate::ordered_map::{InOrder, OrderedMap};
use crate::store::Store;

/// A growable hash table of binary search tree buckets.
///
/// The table doubles its bucket count whenever a `set` leaves it fuller than
/// its max load factor (0.75 unless configured otherwise). Growing is a full
/// rehash: every entry is moved into a freshly allocated bucket array, and
/// the table can't be touched until that's finished.
pub struct ShardTable<K, V, S = RandomState> {
    buckets: Vec<OrderedMap<K, V>>,
    size: usize,
    max_load_factor: f64,
    hash_builder: S,
}

impl<K, V> ShardTable<K, V, RandomState> {
    /// Makes a new table with the default capacity of 8 buckets.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Makes a new table with a specified number of buckets. Zero is bumped
    /// up to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V, S> ShardTable<K, V, S> {
    /// Makes a new table with the default capacity and a specific hasher.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hash_builder)
    }

    /// Makes a new table with a specified number of buckets and hasher.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self::build(capacity.max(1), DEFAULT_MAX_LOAD_FACTOR, hash_builder)
    }

    /// Makes a new table from a [`TableConfig`], rejecting configs that
    /// don't [`validate`](TableConfig::validate).
    pub fn with_config(config: TableConfig, hash_builder: S) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(
            config.initial_capacity,
            config.max_load_factor,
            hash_builder,
        ))
    }

    fn build(capacity: usize, max_load_factor: f64, hash_builder: S) -> Self {
        Self {
            buckets: empty_buckets(capacity),
            size: 0,
            max_load_factor,
            hash_builder,
        }
    }

    /// The number of entries across every bucket.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Entries per bucket.
    pub fn load_factor(&self) -> f64 {
        self.size as f64 / self.buckets.len() as f64
    }

    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Removes every entry. The bucket count stays where it is.
    pub fn clear(&mut self) {
        for bucket in self.buckets.iter_mut() {
            bucket.clear();
        }
        self.size = 0;
    }

    /// Iterates every entry, bucket by bucket in array order and in key order
    /// within each bucket.
    ///
    /// The result is only sorted *within* a bucket. Across the whole table the
    /// order depends on the hasher and the current capacity, and it changes
    /// when the table resizes. Use [`iter_sorted`](Self::iter_sorted) for
    /// global key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            current: None,
            remaining: self.size,
        }
    }

    /// The keys, in the same bucket-local order as [`iter`](Self::iter).
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// The values, in the same bucket-local order as [`iter`](Self::iter).
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

impl<K, V, S> ShardTable<K, V, S>
where
    K: Hash + Ord,
    S: BuildHasher,
{
    /// Which bucket a key belongs in under the current capacity.
    pub fn bucket_index<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        bucket_for(&self.hash_builder, key, self.buckets.len())
    }

    /// Gets the value stored at a key, or [`Error::NotFound`].
    pub fn get<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Ord + ?Sized,
    {
        let idx = self.bucket_index(key);
        self.buckets[idx].search(key).ok_or(Error::NotFound)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Ord + ?Sized,
    {
        let idx = self.bucket_index(key);
        self.buckets[idx].search_mut(key).ok_or(Error::NotFound)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Ord + ?Sized,
    {
        let idx = self.bucket_index(key);
        self.buckets[idx].contains(key)
    }

    /// Inserts or updates a key, returning the value it replaced. Only a new
    /// key changes the length. Afterwards, if the table is fuller than its
    /// max load factor, it doubles as many times as it takes to get back
    /// under and rehashes once.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let idx = self.bucket_index(&key);
        let previous = self.buckets[idx].insert(key, value);

        if previous.is_none() {
            self.size += 1;
        }

        if self.load_factor() > self.max_load_factor {
            let mut to = self.buckets.len();
            while self.size as f64 / to as f64 > self.max_load_factor {
                match to.checked_mul(2) {
                    Some(doubled) => to = doubled,
                    None => break,
                }
            }
            self.resize(to);
        }

        previous
    }

    /// Removes a key and returns its value. A miss changes nothing.
    pub fn delete<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Ord + ?Sized,
    {
        let idx = self.bucket_index(key);
        let (_, value) = self.buckets[idx].delete(key)?;
        self.size -= 1;
        Ok(value)
    }

    /// Rebuilds the table with `new_capacity` buckets (at least one),
    /// rehashing every entry into it.
    ///
    /// The new bucket array is allocated before anything is moved, so the
    /// table is either fully on the old array or fully on the new one.
    pub fn resize(&mut self, new_capacity: usize) {
        let new_capacity = new_capacity.max(1);
        let old = mem::replace(&mut self.buckets, empty_buckets(new_capacity));
        let from = old.len();

        for bucket in old {
            for (key, value) in bucket {
                let idx = bucket_for(&self.hash_builder, &key, new_capacity);
                self.buckets[idx].insert(key, value);
            }
        }

        debug!(from, to = new_capacity, entries = self.size, "resized shard table");
    }

    /// Halves the bucket count (never below one). Nothing stops the next
    /// `set` from growing it again if that leaves the table too full.
    pub fn shrink(&mut self) {
        let to = (self.buckets.len() / 2).max(1);
        if to != self.buckets.len() {
            self.resize(to);
        }
    }

    /// Iterates every entry in global key order by merging the buckets'
    /// sorted runs. Costs O(log capacity) extra per entry over
    /// [`iter`](Self::iter).
    pub fn iter_sorted(&self) -> SortedIter<'_, K, V> {
        let mut sources: Vec<InOrder<'_, K, V>> =
            self.buckets.iter().map(|b| b.iter()).collect();

        let mut heap = BinaryHeap::with_capacity(sources.len());
        for (source, iter) in sources.iter_mut().enumerate() {
            if let Some((key, value)) = iter.next() {
                heap.push(Head { key, value, source });
            }
        }

        SortedIter {
            sources,
            heap,
            remaining: self.size,
        }
    }

    /// Checks the size bookkeeping and that every key sits in the bucket its
    /// hash says it should.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let mut total = 0;
        for (idx, bucket) in self.buckets.iter().enumerate() {
            bucket.check_invariants();
            total += bucket.len();
            for key in bucket.keys() {
                assert_eq!(idx, self.bucket_index(key), "key in wrong bucket");
            }
        }
        assert_eq!(self.size, total, "size must match the buckets");
    }
}

fn empty_buckets<K, V>(capacity: usize) -> Vec<OrderedMap<K, V>> {
    (0..capacity).map(|_| OrderedMap::new()).collect()
}

fn bucket_for<Q, S>(hash_builder: &S, key: &Q, capacity: usize) -> usize
where
    Q: Hash + ?Sized,
    S: BuildHasher,
{
    let mut h = hash_builder.build_hasher();
    key.hash(&mut h);
    (h.finish() % capacity as u64) as usize
}

impl<K, V> Default for ShardTable<K, V, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> fmt::Debug for ShardTable<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> FromIterator<(K, V)> for ShardTable<K, V, RandomState>
where
    K: Hash + Ord,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = ShardTable::new();
        table.extend(iter);
        table
    }
}

impl<K, V, S> Extend<(K, V)> for ShardTable<K, V, S>
where
    K: Hash + Ord,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a ShardTable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> Store<K, V> for ShardTable<K, V, S>
where
    K: Hash + Ord,
    S: BuildHasher,
{
    fn set(&mut self, k: K, v: V) -> Option<V> {
        ShardTable::set(self, k, v)
    }

    fn get<'a>(&'a self, k: &K) -> Result<&'a V> {
        ShardTable::get(self, k)
    }

    fn get_mut<'a>(&'a mut self, k: &K) -> Result<&'a mut V> {
        ShardTable::get_mut(self, k)
    }

    fn contains(&self, k: &K) -> bool {
        ShardTable::contains(self, k)
    }

    fn delete(&mut self, k: &K) -> Result<V> {
        ShardTable::delete(self, k)
    }

    fn clear(&mut self) {
        ShardTable::clear(self)
    }

    fn len(&self) -> usize {
        self.size
    }
}

/// Bucket-local iterator over a [`ShardTable`]. See [`ShardTable::iter`].
pub struct Iter<'a, K, V> {
    buckets: slice::Iter<'a, OrderedMap<K, V>>,
    current: Option<InOrder<'a, K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.current.as_mut().and_then(|it| it.next()) {
                self.remaining = self.remaining.saturating_sub(1);
                return Some(item);
            }

            self.current = Some(self.buckets.next()?.iter());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// The smallest unconsumed entry of one bucket. Ordered backwards by key so
/// the max-heap hands out the smallest key first.
struct Head<'a, K, V> {
    key: &'a K,
    value: &'a V,
    source: usize,
}

impl<K: Ord, V> PartialEq for Head<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Ord, V> Eq for Head<'_, K, V> {}

impl<K: Ord, V> PartialOrd for Head<'_, K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, V> Ord for Head<'_, K, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key.cmp(self.key)
    }
}

/// Globally sorted iterator over a [`ShardTable`]. See
/// [`ShardTable::iter_sorted`].
pub struct SortedIter<'a, K, V> {
    sources: Vec<InOrder<'a, K, V>>,
    heap: BinaryHeap<Head<'a, K, V>>,
    remaining: usize,
}

impl<'a, K: Ord, V> Iterator for SortedIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let head = self.heap.pop()?;

        if let Some((key, value)) = self.sources[head.source].next() {
            self.heap.push(Head {
                key,
                value,
                source: head.source,
            });
        }

        self.remaining = self.remaining.saturating_sub(1);
        Some((head.key, head.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::ShardTable;
    use crate::config::TableConfig;
    use crate::error::Error;
    use crate::identity_hasher::BuildIdentityHasher;
    use crate::store::Store;

    fn identity_table(capacity: usize) -> ShardTable<u64, u64, BuildIdentityHasher> {
        ShardTable::with_capacity_and_hasher(capacity, BuildIdentityHasher)
    }

    #[test]
    fn test_grows_past_three_quarters() {
        let mut table: ShardTable<u64, String> = ShardTable::new();
        assert_eq!(8, table.capacity());

        for k in 0..6 {
            table.set(k, k.to_string());
        }
        // 6/8 is exactly the threshold, not over it
        assert_eq!(8, table.capacity());
        assert_eq!(0.75, table.load_factor());

        table.set(6, "6".to_owned());
        assert_eq!(16, table.capacity());
        assert_eq!(7, table.len());
        assert_eq!(7.0 / 16.0, table.load_factor());

        for k in 0..7 {
            assert_eq!(Ok(&k.to_string()), table.get(&k));
        }
        table.check_invariants();
    }

    #[test]
    fn test_update_does_not_count() {
        let mut table = identity_table(8);

        assert_eq!(None, table.set(3, 30));
        assert_eq!(Some(30), table.set(3, 31));
        assert_eq!(1, table.len());
        assert_eq!(Ok(&31), table.get(&3));
        table.check_invariants();
    }

    #[test]
    fn test_keys_land_in_hash_buckets() {
        let mut table = identity_table(4);

        // with the identity hash everything here collides into bucket 1
        table.set(1, 1);
        table.set(5, 5);
        table.set(9, 9);

        assert_eq!(1, table.bucket_index(&13u64));
        assert_eq!(3, table.buckets[1].len());
        assert_eq!(2, table.buckets[1].height());
        table.check_invariants();
    }

    #[test]
    fn test_delete() {
        let mut table = identity_table(8);
        table.set(1, 10);
        table.set(2, 20);

        assert_eq!(Ok(10), table.delete(&1));
        assert_eq!(1, table.len());
        assert!(!table.contains(&1));

        assert_eq!(Err(Error::NotFound), table.delete(&1));
        assert_eq!(Err(Error::NotFound), table.get(&1));
        assert_eq!(1, table.len());
        table.check_invariants();
    }

    #[test]
    fn test_get_mut() {
        let mut table = identity_table(8);
        table.set(4, 1);

        *table.get_mut(&4).unwrap() += 1;
        assert_eq!(Ok(&2), table.get(&4));
        assert_eq!(Err(Error::NotFound), table.get_mut(&5).map(|v| *v));
    }

    #[test]
    fn test_iteration_is_bucket_local() {
        let mut table = identity_table(8);
        for k in [9, 1, 4, 12, 2, 3] {
            table.set(k, k * 100);
        }
        // 6/8 doesn't trigger a resize
        assert_eq!(8, table.capacity());

        let keys: Vec<u64> = table.keys().copied().collect();
        // 9 shares bucket 1 with 1, and 12 shares bucket 4 with 4
        assert_eq!(vec![1, 9, 2, 3, 4, 12], keys);
        assert_eq!(6, table.iter().size_hint().0);
        assert_eq!(
            keys.iter().map(|k| k * 100).collect::<Vec<_>>(),
            table.values().copied().collect::<Vec<_>>()
        );

        let sorted: Vec<u64> = table.iter_sorted().map(|(k, _)| *k).collect();
        assert_eq!(vec![1, 2, 3, 4, 9, 12], sorted);
    }

    #[test]
    fn test_resize_and_shrink_keep_everything() {
        let mut table: ShardTable<String, usize> = ShardTable::with_capacity(2);
        for i in 0..100 {
            table.set(format!("key-{}", i), i);
        }
        table.check_invariants();

        let capacity = table.capacity();
        assert!(table.load_factor() <= 0.75);

        table.resize(3);
        assert_eq!(3, table.capacity());
        assert_eq!(100, table.len());
        table.check_invariants();

        table.shrink();
        assert_eq!(1, table.capacity());
        table.shrink();
        assert_eq!(1, table.capacity());
        table.check_invariants();

        for i in 0..100 {
            assert_eq!(Ok(&i), table.get(format!("key-{}", i).as_str()));
        }

        // the next insert notices how full it is
        table.set("one more".to_owned(), 100);
        assert_eq!(2, table.capacity());
        assert!(capacity > table.capacity());
    }

    #[test]
    fn test_resize_to_zero_is_clamped() {
        let mut table = identity_table(0);
        assert_eq!(1, table.capacity());

        table.resize(0);
        assert_eq!(1, table.capacity());
        assert_eq!(0.0, table.load_factor());
    }

    #[test]
    fn test_with_config() {
        let config = TableConfig::default()
            .with_initial_capacity(2)
            .with_max_load_factor(2.0);
        let mut table: ShardTable<u64, u64, _> =
            ShardTable::with_config(config, BuildIdentityHasher).unwrap();

        for k in 0..4 {
            table.set(k, k);
        }
        assert_eq!(2, table.capacity());
        assert_eq!(2.0, table.max_load_factor());

        table.set(4, 4);
        assert_eq!(4, table.capacity());
        table.check_invariants();

        let bad = TableConfig::default().with_initial_capacity(0);
        assert!(matches!(
            ShardTable::<u64, u64, _>::with_config(bad, BuildIdentityHasher),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_small_load_factor_grows_far_enough() {
        let config = TableConfig::default()
            .with_initial_capacity(1)
            .with_max_load_factor(0.01);
        let mut table: ShardTable<u64, u64, _> =
            ShardTable::with_config(config, BuildIdentityHasher).unwrap();

        for k in 0..5 {
            table.set(k, k);
            assert!(
                table.load_factor() <= 0.01,
                "load factor {} after {} inserts",
                table.load_factor(),
                k + 1
            );
        }
        assert_eq!(512, table.capacity());
        table.check_invariants();
    }

    #[test]
    fn test_clear() {
        let mut table: ShardTable<u64, u64> = (0..20).map(|k| (k, k)).collect();
        let capacity = table.capacity();

        table.clear();
        assert!(table.is_empty());
        assert_eq!(capacity, table.capacity());
        assert_eq!(None, table.iter().next());
        table.check_invariants();
    }

    #[test]
    fn test_against_btreemap() {
        let mut table = identity_table(8);
        let mut oracle = BTreeMap::new();

        for k in 0..500u64 {
            let key = (k * 7919) % 1000;
            assert_eq!(oracle.insert(key, k), table.set(key, k));
        }
        for k in (0..1000u64).step_by(3) {
            assert_eq!(oracle.remove(&k).ok_or(Error::NotFound), table.delete(&k));
        }

        assert_eq!(oracle.len(), table.len());
        table.check_invariants();

        let sorted: Vec<(u64, u64)> =
            table.iter_sorted().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u64, u64)> =
            oracle.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(expected, sorted);
    }

    #[test]
    fn test_debug() {
        let mut table = identity_table(4);
        table.set(2, 20);
        table.set(1, 10);
        assert_eq!("{1: 10, 2: 20}", format!("{:?}", table));
    }

    #[test]
    fn test_store_trait() {
        fn exercise<S: Store<u64, u64>>(store: &mut S) {
            for k in 0..10 {
                assert_eq!(None, store.set(k, k));
            }
            assert_eq!(10, store.len());
            assert_eq!(Ok(&4), store.get(&4));
            *store.get_mut(&4).unwrap() = 40;
            assert_eq!(Ok(40), store.delete(&4));
            assert!(!store.contains(&4));
            assert_eq!(Err(Error::NotFound), store.delete(&4));
            store.clear();
            assert!(store.is_empty());
        }

        exercise(&mut identity_table(2));
        exercise(&mut ShardTable::<u64, u64>::new());
    }
}
