use core::fmt;
use core::mem;
use core::hash::{BuildHasher, Hash};
use core::iter::{FromIterator, FusedIterator};

use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashSet;
use log::{debug, trace};
use xxhash_rust::xxh3::Xxh3Builder;

use crate::error::Error;
use crate::report::{BucketReport, ConflictReport};

/// Number of buckets a map gets unless told otherwise.
pub const DEFAULT_BUCKETS: usize = 8;

/// Default hasher: XXH3 with a fixed seed, so a key lands in the same bucket
/// in every map and every run.
pub type FixedState = Xxh3Builder;

/// One link of a bucket chain.
///
/// A cleared `key` marks a tombstone: the node stays linked but no lookup
/// matches it anymore.
#[derive(Debug, Clone)]
struct Entry<K, V> {
    key: Option<K>,
    value: Option<V>,

    // bucket this entry is chained into, and the next entry of that chain
    // (indexes into entries vec)
    bucket: usize,
    next: Option<usize>
}

impl<K, V> Entry<K, V> {
    /// A live entry with no value yet; the caller stores one.
    #[inline(always)]
    const fn new(key: K, bucket: usize, next: Option<usize>) -> Self {
        Self { key: Some(key), value: None, bucket, next }
    }

    #[inline(always)]
    const fn is_live(&self) -> bool {
        self.key.is_some()
    }
}

/// A hash map over a fixed number of buckets, each bucket a singly-linked
/// chain of entries.
///
/// The bucket count is chosen at construction and never changes: there is
/// no rehashing, so chains simply grow as keys collide. New keys are linked
/// at the head of their chain.
///
/// Alongside the chains the map keeps a key-view, the set of live keys,
/// which always agrees with [`len`](BucketMap::len). The hasher of that set
/// is also the one that picks buckets.
///
/// The map is a plain owned value; share it across threads through
/// [`Shared`](crate::Shared) or your own lock.
#[derive(Clone)]
pub struct BucketMap<K, V, S = FixedState> {
    buckets: Vec<Option<usize>>, // chain heads, indexes into entries
    entries: Vec<Entry<K, V>>, // every linked entry, tombstones included
    keys: HashSet<K, S>, // live keys

    len: usize,
}

impl<K, V> BucketMap<K, V, FixedState> {
    /// Creates an empty map with [`DEFAULT_BUCKETS`] buckets.
    #[inline]
    pub fn new() -> Self {
        Self::with_hasher(FixedState::new())
    }

    /// Creates an empty map with `n` buckets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroBuckets`] if `n` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use bucket_map::{BucketMap, Error};
    ///
    /// let map = BucketMap::<u32, u32>::with_buckets(16).unwrap();
    /// assert_eq!(map.bucket_count(), 16);
    ///
    /// assert_eq!(BucketMap::<u32, u32>::with_buckets(0).unwrap_err(), Error::ZeroBuckets);
    /// ```
    #[inline]
    pub fn with_buckets(n: usize) -> Result<Self, Error> {
        Self::with_buckets_and_hasher(n, FixedState::new())
    }
}

impl<K, V, S> BucketMap<K, V, S> {
    /// Creates an empty map with [`DEFAULT_BUCKETS`] buckets, using `h` to
    /// hash keys.
    #[inline]
    pub fn with_hasher(h: S) -> Self {
        Self::from_parts(DEFAULT_BUCKETS, h)
    }

    /// Creates an empty map with `n` buckets, using `h` to hash keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroBuckets`] if `n` is zero.
    #[inline]
    pub fn with_buckets_and_hasher(n: usize, h: S) -> Result<Self, Error> {
        if n == 0 {
            return Err(Error::ZeroBuckets)
        }
        Ok(Self::from_parts(n, h))
    }

    #[inline]
    fn from_parts(n: usize, h: S) -> Self {
        Self {
            buckets: vec![None; n],
            entries: Vec::new(),
            keys: HashSet::with_hasher(h),
            len: 0,
        }
    }

    /// Returns the number of live key-value pairs.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the map holds no live pairs.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the fixed number of buckets.
    #[inline(always)]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the set of live keys.
    ///
    /// This borrows the map's own key-view, so it always reflects the map as
    /// of the call.
    #[inline(always)]
    pub const fn key_set(&self) -> &HashSet<K, S> {
        &self.keys
    }

    /// Returns the hasher used for both bucket selection and the key-view.
    #[inline(always)]
    pub fn hasher(&self) -> &S {
        self.keys.hasher()
    }

    /// Returns how many entries, tombstones included, are chained into
    /// `bucket`. Out-of-range buckets hold nothing.
    pub fn chain_len(&self, bucket: usize) -> usize {
        self.buckets
            .get(bucket)
            .map_or(0, |&head| self.chain(head).count())
    }

    /// Returns how many tombstones are still linked into chains.
    pub fn tombstones(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.is_live()).count()
    }

    /// Returns `true` if some entry in any chain holds `value`.
    ///
    /// Values are not bucketed, so this walks the whole table.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq
    {
        self.buckets.iter().any(|&head| {
            self.chain(head).any(|(_, entry)| entry.value.as_ref() == Some(value))
        })
    }

    /// Removes every entry, leaving all buckets empty.
    ///
    /// The bucket count and hasher are kept.
    pub fn clear(&mut self) {
        self.buckets.fill(None);
        self.entries.clear();
        self.keys.clear();
        self.len = 0;
        debug!("cleared bucket table of {} buckets", self.buckets.len());
    }

    /// Rebuilds entry storage without tombstones.
    ///
    /// Chain order of the live entries is preserved, so lookups, iteration
    /// and the conflict report are unchanged. Values left behind on
    /// tombstones are dropped, so [`contains_value`](BucketMap::contains_value)
    /// stops matching them.
    pub fn purge_tombstones(&mut self) {
        let dead = self.tombstones();
        if dead == 0 {
            self.entries.shrink_to_fit();
            return
        }

        let mut old_entries = mem::take(&mut self.entries)
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();

        let mut new_entries = Vec::with_capacity(old_entries.len() - dead);

        for bucket in 0..self.buckets.len() {
            let mut curr = self.buckets[bucket].take();
            let mut tail: Option<usize> = None;

            while let Some(old_idx) = curr {
                let Some(entry) = old_entries[old_idx].take() else {
                    break
                };
                curr = entry.next;

                if !entry.is_live() {
                    continue
                }

                let new_idx = new_entries.len();
                new_entries.push(Entry { next: None, ..entry });

                match tail {
                    Some(prev) => new_entries[prev].next = Some(new_idx),
                    None => self.buckets[bucket] = Some(new_idx),
                }

                tail = Some(new_idx);
            }
        }

        debug!("purged {dead} tombstones, {} entries remain", new_entries.len());
        self.entries = new_entries;
    }

    /// Collects, per bucket, the distinct live keys of its chain and how many
    /// of them collide.
    ///
    /// # Examples
    ///
    /// ```
    /// use bucket_map::BucketMap;
    ///
    /// let mut map = BucketMap::new();
    /// map.put("a", 1);
    /// map.put("b", 2);
    ///
    /// let report = map.conflict_report();
    /// assert_eq!(report.buckets().len(), map.bucket_count());
    /// assert!(report.total_conflicts() <= 1);
    /// ```
    pub fn conflict_report(&self) -> ConflictReport<'_, K>
    where
        K: PartialEq
    {
        let buckets = self.buckets
            .iter()
            .enumerate()
            .map(move |(index, &head)| {
                let mut keys: Vec<&K> = Vec::new();
                for (_, entry) in self.chain(head) {
                    if let Some(key) = &entry.key {
                        if !keys.contains(&key) {
                            keys.push(key)
                        }
                    }
                }
                BucketReport::new(index, keys)
            })
            .collect();

        ConflictReport::new(buckets)
    }

    /// Prints the [conflict report](BucketMap::conflict_report) to stdout, one
    /// line per bucket followed by the total.
    #[cfg(feature = "std")]
    pub fn print_table(&self)
    where
        K: PartialEq + fmt::Display
    {
        let report = self.conflict_report();
        debug!(
            "printing table: {} conflicts over {} buckets",
            report.total_conflicts(),
            report.buckets().len()
        );
        std::println!("{report}");
    }

    /// Returns an iterator over live pairs, bucket by bucket, each chain from
    /// its head.
    #[inline]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            entries: &self.entries,
            curr: None,
        }
    }

    /// Returns an iterator over live keys, in [`iter`](BucketMap::iter) order.
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over live values, in [`iter`](BucketMap::iter) order.
    #[inline]
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    #[inline]
    fn chain(&self, head: Option<usize>) -> Chain<'_, K, V> {
        Chain { entries: &self.entries, curr: head }
    }

    /// Takes the entry at `idx`, which must already be unlinked, out of
    /// storage.
    ///
    /// `swap_remove` moves the last entry into `idx`, so whatever linked to
    /// that entry is re-pointed first.
    fn release(&mut self, idx: usize) -> Entry<K, V> {
        let last = self.entries.len() - 1;
        if idx != last {
            let bucket = self.entries[last].bucket;
            if self.buckets[bucket] == Some(last) {
                self.buckets[bucket] = Some(idx)
            } else {
                let mut curr = self.buckets[bucket];
                while let Some(i) = curr {
                    if self.entries[i].next == Some(last) {
                        self.entries[i].next = Some(idx);
                        break
                    }
                    curr = self.entries[i].next;
                }
            }
        }
        self.entries.swap_remove(idx)
    }
}

impl<K, V, S> BucketMap<K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    /// Returns the bucket `key` chains into.
    ///
    /// Equal keys always land in the same bucket for the lifetime of a map.
    #[inline]
    pub fn bucket_index(&self, key: &K) -> usize {
        let hash = self.keys.hasher().hash_one(key);
        (hash % self.buckets.len() as u64) as usize
    }

    /// Stores `value` under `key` and returns a reference to it.
    ///
    /// An existing key has its value overwritten in place. A new key is
    /// linked in as the head of its bucket's chain.
    ///
    /// # Examples
    ///
    /// ```
    /// use bucket_map::BucketMap;
    ///
    /// let mut map = BucketMap::new();
    /// assert_eq!(*map.put("a", 1), 1);
    /// assert_eq!(*map.put("a", 2), 2);
    /// assert_eq!(map.len(), 1);
    /// assert_eq!(map.get(&"a"), Some(&2));
    /// ```
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn put(&mut self, key: K, value: V) -> &mut V {
        let bucket = self.bucket_index(&key);

        if let Some((_, idx)) = self.find(&key) {
            trace!("overwriting entry {idx} in bucket {bucket}");
            return self.entries[idx].value.insert(value)
        }

        let idx = self.entries.len();
        let head = self.buckets[bucket];
        self.entries.push(Entry::new(key.clone(), bucket, head));
        self.buckets[bucket] = Some(idx);
        if self.keys.insert(key) {
            self.len += 1;
        }

        trace!(
            "linked entry {idx} as head of bucket {bucket} ({})",
            if head.is_some() { "collision" } else { "was empty" }
        );

        self.entries[idx].value.insert(value)
    }

    /// Returns a reference to the value stored under `key`.
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn get(&self, key: &K) -> Option<&V> {
        let (_, idx) = self.find(key)?;
        self.entries[idx].value.as_ref()
    }

    /// Returns a mutable reference to the value stored under `key`.
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let (_, idx) = self.find(key)?;
        self.entries[idx].value.as_mut()
    }

    /// Returns `true` if `key` is live in the map.
    ///
    /// Only the key's own bucket is scanned.
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Removes `key`, returning its value.
    ///
    /// An entry with a successor is unlinked from its chain. The terminal
    /// entry of a chain is tombstoned instead: its key is cleared but it
    /// stays linked and keeps its value, which
    /// [`contains_value`](BucketMap::contains_value) still finds; a copy is
    /// returned. Use [`purge_tombstones`](BucketMap::purge_tombstones) to
    /// reclaim tombstones.
    ///
    /// # Examples
    ///
    /// ```
    /// use bucket_map::BucketMap;
    ///
    /// let mut map = BucketMap::new();
    /// map.put(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// assert!(map.is_empty());
    /// ```
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn remove(&mut self, key: &K) -> Option<V>
    where
        V: Clone
    {
        let (prev, idx) = self.find(key)?;

        if self.keys.remove(key) {
            self.len -= 1;
        }

        let bucket = self.entries[idx].bucket;
        match self.entries[idx].next {
            Some(next) => {
                match prev {
                    Some(prev) => self.entries[prev].next = Some(next),
                    None => self.buckets[bucket] = Some(next),
                }
                trace!("unlinked entry {idx} from bucket {bucket}");
                self.release(idx).value
            }
            None => {
                let entry = &mut self.entries[idx];
                entry.key = None;
                trace!("tombstoned entry {idx} at the end of bucket {bucket}");
                entry.value.clone()
            }
        }
    }

    /// Removes `key` with the older splice-past-successor policy, returning a
    /// copy of its value.
    ///
    /// Kept for compatibility with code that depends on that policy, defects
    /// included:
    ///
    /// - if the entry's successor has a successor of its own, the entry is
    ///   linked past its successor. The successor drops out of the chain
    ///   while `key` itself stays reachable;
    /// - if the successor is the last entry, the chain is left as it is;
    /// - the terminal entry is tombstoned, but keeps its value, so
    ///   [`contains_value`](BucketMap::contains_value) still sees it.
    ///
    /// In every case `key` leaves the key-view. The length follows the
    /// key-view, so `len() == key_set().len()` still holds, but the key-view
    /// may no longer match what lookups find. Prefer
    /// [`remove`](BucketMap::remove).
    pub fn remove_legacy(&mut self, key: &K) -> Option<V>
    where
        V: Clone
    {
        let (_, idx) = self.find(key)?;

        if self.keys.remove(key) {
            self.len -= 1;
        }

        let value = self.entries[idx].value.clone();
        let bucket = self.entries[idx].bucket;
        match self.entries[idx].next {
            Some(next) => match self.entries[next].next {
                Some(after) => {
                    self.entries[idx].next = Some(after);
                    self.release(next);
                    trace!("legacy removal dropped successor {next} of entry {idx} in bucket {bucket}");
                }
                None => {
                    trace!("legacy removal left bucket {bucket} unchanged");
                }
            },
            None => {
                self.entries[idx].key = None;
                trace!("legacy removal tombstoned entry {idx} in bucket {bucket}");
            }
        }

        value
    }

    /// Locates the live entry for `key` as `(predecessor, index)`.
    fn find(&self, key: &K) -> Option<(Option<usize>, usize)> {
        let head = self.buckets[self.bucket_index(key)];

        let mut prev = None;
        for (idx, entry) in self.chain(head) {
            if entry.key.as_ref() == Some(key) {
                return Some((prev, idx))
            }
            prev = Some(idx);
        }
        None
    }
}

/// Walks one chain from its head, yielding `(index, entry)`.
struct Chain<'a, K, V> {
    entries: &'a [Entry<K, V>],
    curr: Option<usize>,
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = (usize, &'a Entry<K, V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.curr?;
        let entry = &self.entries[idx];
        self.curr = entry.next;
        Some((idx, entry))
    }
}

/// Borrowing iterator over live pairs, in bucket then chain order.
#[derive(Debug)]
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Option<usize>>,
    entries: &'a [Entry<K, V>],
    curr: Option<usize>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[cfg_attr(feature = "inline-more", inline)]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.curr {
                Some(idx) => {
                    let entry = &self.entries[idx];
                    self.curr = entry.next;
                    if let (Some(key), Some(value)) = (&entry.key, &entry.value) {
                        return Some((key, value))
                    }
                }
                None => self.curr = *self.buckets.next()?,
            }
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.entries.len()))
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a BucketMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> FromIterator<(K, V)> for BucketMap<K, V, S>
where
    K: Eq + Hash + Clone,
    S: Default + BuildHasher,
{
    #[cfg_attr(feature = "inline-more", inline)]
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = BucketMap::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for BucketMap<K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher,
{
    #[cfg_attr(feature = "inline-more", inline)]
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        let iter = iter.into_iter();
        self.entries.reserve(iter.size_hint().0);
        iter.for_each(move |(k, v)| _ = self.put(k, v));
    }
}

impl<K, V, S> Default for BucketMap<K, V, S>
where
    S: Default,
{
    #[inline]
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> PartialEq for BucketMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: PartialEq,
    S: BuildHasher,
{
    /// Two maps are equal when they hold the same live pairs, whatever their
    /// chain layout.
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K, V, S> Eq for BucketMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> fmt::Debug for BucketMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::{BuildHasherDefault, Hasher};

    use alloc::format;
    use alloc::string::{String, ToString};

    /// Sends integer keys to bucket `key % buckets`.
    #[derive(Debug, Default, Clone, Copy)]
    struct IdentityHasher(u64);

    impl Hasher for IdentityHasher {
        fn finish(&self) -> u64 {
            self.0
        }

        fn write(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.0 = self.0.wrapping_mul(31).wrapping_add(u64::from(b));
            }
        }

        fn write_u64(&mut self, n: u64) {
            self.0 = n
        }
    }

    type Identity = BuildHasherDefault<IdentityHasher>;

    fn identity_map<V>() -> BucketMap<u64, V, Identity> {
        BucketMap::with_hasher(Identity::default())
    }

    fn chain_keys<V>(map: &BucketMap<u64, V, Identity>, bucket: usize) -> Vec<Option<u64>> {
        map.chain(map.buckets[bucket]).map(|(_, entry)| entry.key).collect()
    }

    #[test]
    fn test_new_and_default_and_with_buckets() {
        let a: BucketMap<u64, u64> = BucketMap::new();
        assert!(a.is_empty());
        assert_eq!(a.bucket_count(), DEFAULT_BUCKETS);
        let b: BucketMap<u64, u64> = BucketMap::default();
        assert!(b.is_empty());
        let c: BucketMap<u64, u64> = BucketMap::with_buckets(3).unwrap();
        assert_eq!(c.bucket_count(), 3);
        assert!(c.key_set().is_empty());
    }

    #[test]
    fn test_zero_buckets_rejected() {
        let err = BucketMap::<u64, u64>::with_buckets(0).unwrap_err();
        assert_eq!(err, Error::ZeroBuckets);
        assert!(BucketMap::<u64, u64, Identity>::with_buckets_and_hasher(0, Identity::default()).is_err());
    }

    #[test]
    fn test_default_hasher_is_fixed() {
        let a: BucketMap<u64, ()> = BucketMap::new();
        let b: BucketMap<u64, ()> = BucketMap::default();
        for k in 0..64 {
            assert_eq!(a.bucket_index(&k), b.bucket_index(&k));
        }
        let c: BucketMap<&str, ()> = BucketMap::new();
        let d: BucketMap<&str, ()> = BucketMap::with_buckets(8).unwrap();
        assert_eq!(c.bucket_index(&"a"), d.bucket_index(&"a"));
    }

    #[test]
    fn test_bucket_index_is_hash_mod_buckets() {
        let map = identity_map::<()>();
        assert_eq!(map.bucket_index(&3), 3);
        assert_eq!(map.bucket_index(&11), 3);
        assert_eq!(map.bucket_index(&8), 0);
        assert_eq!(map.bucket_index(&u64::MAX), (u64::MAX % 8) as usize);
    }

    #[test]
    fn test_put_get_overwrite() {
        let mut m = identity_map();
        assert_eq!(*m.put(1, "a"), "a");
        assert_eq!(*m.put(1, "b"), "b");
        assert_eq!(m.len(), 1);
        assert_eq!(m.entries.len(), 1); // no duplicate entry
        assert_eq!(m.get(&1), Some(&"b"));
        assert!(m.contains_key(&1));
        assert!(!m.contains_key(&9));
    }

    #[test]
    fn test_put_links_new_head() {
        let mut m = identity_map();
        m.put(1, 'a');
        m.put(9, 'b');
        m.put(17, 'c');
        assert_eq!(chain_keys(&m, 1), vec![Some(17), Some(9), Some(1)]);
        assert_eq!(m.chain_len(1), 3);
        assert_eq!(m.chain_len(0), 0);
        assert_eq!(m.chain_len(100), 0);
    }

    #[test]
    fn test_get_mut_changes_value() {
        let mut m = identity_map();
        m.put(10, String::from("hello"));
        m.get_mut(&10).unwrap().push_str("_world");
        assert_eq!(m.get(&10).map(|s| s.as_str()), Some("hello_world"));
        assert!(m.get_mut(&2).is_none());
    }

    #[test]
    fn test_remove_unlinks_middle_entry() {
        let mut m = identity_map();
        m.put(1, 'a');
        m.put(9, 'b');
        m.put(17, 'c');
        assert_eq!(m.remove(&9), Some('b'));
        assert_eq!(chain_keys(&m, 1), vec![Some(17), Some(1)]);
        assert_eq!(m.entries.len(), 2);
        assert_eq!(m.get(&17), Some(&'c'));
        assert_eq!(m.get(&1), Some(&'a'));
        assert_eq!(m.len(), m.key_set().len());
    }

    #[test]
    fn test_remove_head_of_two_entry_chain() {
        let mut m = identity_map();
        m.put(1, 'a');
        m.put(9, 'b');
        assert_eq!(m.remove(&9), Some('b'));
        assert_eq!(chain_keys(&m, 1), vec![Some(1)]);
        assert_eq!(m.get(&9), None);
        assert_eq!(m.get(&1), Some(&'a'));
        assert_eq!(m.tombstones(), 0);
    }

    #[test]
    fn test_remove_terminal_entry_tombstones() {
        let mut m = identity_map();
        m.put(1, 'a');
        m.put(9, 'b');
        assert_eq!(m.remove(&1), Some('a'));
        assert_eq!(chain_keys(&m, 1), vec![Some(9), None]);
        assert_eq!(m.tombstones(), 1);
        assert_eq!(m.len(), 1);
        assert!(!m.contains_key(&1));
        // the tombstone keeps its value
        assert!(m.contains_value(&'a'));
        assert_eq!(m.get(&1), None);

        // a new entry goes in front of the tombstone
        m.put(1, 'z');
        assert_eq!(chain_keys(&m, 1), vec![Some(1), Some(9), None]);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_release_repoints_moved_entries() {
        let mut m = identity_map();
        for k in [8, 16, 1, 9, 2, 10, 18] {
            m.put(k, k * 100);
        }

        // 18 (last, head of bucket 2) moves into the slot of 9
        assert_eq!(m.remove(&9), Some(900));
        // 10 (now last, mid-chain of bucket 2) moves into the slot of 16
        assert_eq!(m.remove(&16), Some(1600));

        assert_eq!(m.entries.len(), 5);
        assert_eq!(chain_keys(&m, 2), vec![Some(18), Some(10), Some(2)]);
        for k in [8, 1, 2, 10, 18] {
            assert_eq!(m.get(&k), Some(&(k * 100)));
        }
        assert_eq!(m.len(), 5);
    }

    #[test]
    fn test_remove_nonexistent_returns_none() {
        let mut m = identity_map::<u32>();
        m.put(1, 1);
        assert_eq!(m.remove(&123), None);
        assert_eq!(m.remove(&9), None);
        assert_eq!(m.len(), 1);
        assert_eq!(m.key_set().len(), 1);
    }

    #[test]
    fn test_remove_legacy_two_entry_chain_keeps_chain() {
        let mut m = identity_map();
        m.put(1, 'a');
        m.put(9, 'b');
        assert_eq!(m.remove_legacy(&9), Some('b'));
        assert_eq!(chain_keys(&m, 1), vec![Some(9), Some(1)]);
        assert_eq!(m.len(), 1);
        assert!(!m.key_set().contains(&9));
        // still reachable through its chain
        assert_eq!(m.get(&9), Some(&'b'));
    }

    #[test]
    fn test_remove_legacy_three_entry_chain_drops_successor() {
        let mut m = identity_map();
        m.put(1, 'a');
        m.put(9, 'b');
        m.put(17, 'c');
        assert_eq!(m.remove_legacy(&17), Some('c'));
        assert_eq!(chain_keys(&m, 1), vec![Some(17), Some(1)]);
        assert_eq!(m.get(&9), None);
        assert_eq!(m.get(&17), Some(&'c'));
        assert_eq!(m.len(), 2);
        assert_eq!(m.len(), m.key_set().len());
        assert!(m.key_set().contains(&9));
    }

    #[test]
    fn test_remove_legacy_terminal_retains_value() {
        let mut m = identity_map();
        m.put(1, "one");
        assert_eq!(m.remove_legacy(&1), Some("one"));
        assert_eq!(m.get(&1), None);
        assert!(m.is_empty());
        assert!(m.contains_value(&"one"));
        assert_eq!(m.tombstones(), 1);
        assert_eq!(m.remove(&1), None);
        assert_eq!(m.remove_legacy(&1), None);
    }

    #[test]
    fn test_contains_value_scans_all_buckets() {
        let mut m = identity_map();
        m.put(0, "zero");
        m.put(7, "seven");
        m.put(15, "fifteen");
        assert!(m.contains_value(&"seven"));
        assert!(m.contains_value(&"fifteen"));
        assert!(!m.contains_value(&"eight"));
    }

    #[test]
    fn test_conflict_report_counts_collisions() {
        let mut m = identity_map();
        for k in [3, 11, 19, 4] {
            m.put(k, ());
        }
        let report = m.conflict_report();
        assert_eq!(report.buckets().len(), 8);
        assert_eq!(report.buckets()[3].conflicts(), 2);
        assert_eq!(report.buckets()[3].keys(), &[&19, &11, &3]);
        assert_eq!(report.buckets()[4].conflicts(), 0);
        assert_eq!(report.buckets()[0].conflicts(), 0);
        assert_eq!(report.total_conflicts(), 2);
    }

    #[test]
    fn test_conflict_report_format() {
        let mut m = identity_map();
        m.put(3, ());
        m.put(11, ());
        m.put(5, ());
        let expected = "\
Index 0: (0 conflicts), {}
Index 1: (0 conflicts), {}
Index 2: (0 conflicts), {}
Index 3: (1 conflicts), {11,3}
Index 4: (0 conflicts), {}
Index 5: (0 conflicts), {5}
Index 6: (0 conflicts), {}
Index 7: (0 conflicts), {}
Total # of conflicts: 1";
        assert_eq!(m.conflict_report().to_string(), expected);
    }

    #[test]
    fn test_conflict_report_skips_tombstones() {
        let mut m = identity_map();
        m.put(3, ());
        m.put(11, ());
        m.remove(&3);
        assert_eq!(m.chain_len(3), 2);
        let report = m.conflict_report();
        assert_eq!(report.buckets()[3].keys(), &[&11]);
        assert_eq!(report.total_conflicts(), 0);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut m = identity_map();
        m.put(1, 1);
        m.put(9, 9);
        m.remove(&1);
        m.clear();
        assert!(m.is_empty());
        assert!(m.key_set().is_empty());
        assert_eq!(m.tombstones(), 0);
        assert_eq!(m.bucket_count(), 8);
        assert!((0..8).all(|b| m.chain_len(b) == 0));
        assert_eq!(m.get(&9), None);
    }

    #[test]
    fn test_purge_tombstones_preserves_chains() {
        let mut m = identity_map();
        for k in [1, 9, 17, 2, 10] {
            m.put(k, k);
        }
        m.remove(&1);
        m.remove(&2);
        assert_eq!(m.tombstones(), 2);
        assert!(m.contains_value(&1));

        m.purge_tombstones();
        assert_eq!(m.tombstones(), 0);
        assert!(!m.contains_value(&1));
        assert!(!m.contains_value(&2));
        assert_eq!(m.entries.len(), m.len());
        assert_eq!(chain_keys(&m, 1), vec![Some(17), Some(9)]);
        assert_eq!(chain_keys(&m, 2), vec![Some(10)]);
        for k in [9, 17, 10] {
            assert_eq!(m.get(&k), Some(&k));
        }

        // nothing left to purge
        m.purge_tombstones();
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn test_iter_skips_tombstones() {
        let mut m = identity_map();
        m.put(1, 'a');
        m.put(9, 'b');
        m.put(2, 'c');
        m.remove(&1);
        let items: Vec<_> = m.iter().collect();
        assert_eq!(items, vec![(&9, &'b'), (&2, &'c')]);
        assert_eq!(m.keys().count(), 2);
        assert_eq!(m.values().copied().collect::<Vec<_>>(), vec!['b', 'c']);

        let mut it = m.iter();
        it.by_ref().for_each(drop);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_from_iterator_and_extend() {
        let src = vec![(1u64, "a"), (2, "b"), (3, "c"), (1, "d")];
        let map: BucketMap<_, _, Identity> = src.clone().into_iter().collect();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&1), Some(&"d"));

        let mut m2 = identity_map();
        m2.extend(src);
        assert_eq!(m2, map);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut a = identity_map();
        a.put(1, 10);
        a.put(9, 90);
        let mut b = a.clone();
        b.remove(&1);
        b.put(2, 20);
        assert_eq!(a.len(), 2);
        assert_eq!(a.get(&1), Some(&10));
        assert_eq!(a.get(&2), None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_partial_eq_ignores_chain_order() {
        let mut a = identity_map();
        a.put(1, 'x');
        a.put(9, 'y');
        let mut b = identity_map();
        b.put(9, 'y');
        b.put(1, 'x');
        assert_eq!(a, b);
        b.put(1, 'z');
        assert_ne!(a, b);
    }

    #[test]
    fn test_debug_contains_keys() {
        let mut a = identity_map();
        a.put(5, "five");
        a.put(6, "six");
        let s = format!("{:?}", a);
        assert!(s.contains("5"));
        assert!(s.contains("six"));
    }

    #[test]
    fn test_string_keys_use_value_equality() {
        let mut m = BucketMap::new();
        m.put(String::from("key"), 1);
        let probe = "key".to_string();
        assert_eq!(m.get(&probe), Some(&1));
        assert_eq!(m.bucket_index(&probe), m.bucket_index(&String::from("key")));
    }
}
