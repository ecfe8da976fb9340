//! # LFU (Least Frequently Used) Cache
//!
//! An in-memory key/value cache that evicts the least frequently used entry
//! when full. Every operation that touches a single key (lookup, insert,
//! frequency bump, single eviction) is O(1): no scans, no heap.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                    LfuCache<K, V>  (cloneable handle)                    │
//!   │                                                                          │
//!   │   Arc<parking_lot::Mutex<LfuCore<K, Arc<V>>>>                            │
//!   │                                                                          │
//!   │   ┌────────────────────────────────────────────────────────────────────┐ │
//!   │   │  LfuCore<K, V>                                                     │ │
//!   │   │                                                                    │ │
//!   │   │   KeyIndex<K>                 FrequencyBucketList<K, V>            │ │
//!   │   │   ┌─────────┬────────┐                                             │ │
//!   │   │   │ page_1  │ e0 ────┼──►  [freq=1: e2, e1] ◄─► [freq=4: e0]       │ │
//!   │   │   │ page_2  │ e1 ────┼──►        ▲                                 │ │
//!   │   │   │ page_3  │ e2 ────┼──►        └── head: eviction target         │ │
//!   │   │   └─────────┴────────┘                                             │ │
//!   │   │                                                                    │ │
//!   │   │   capacity: Capacity  (Unbounded | Bounded(n))                     │ │
//!   │   └────────────────────────────────────────────────────────────────────┘ │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Insert Flow
//!
//! ```text
//!   insert(key, value)
//!        │
//!        ▼
//!   ┌────────────────────────────────────────────────────────────────────────┐
//!   │ Key already indexed?                                                   │
//!   │                                                                        │
//!   │   YES → replace value, frequency += 1, return old value (no eviction)  │
//!   │   NO  → continue                                                       │
//!   └────────────────────────────────────────────────────────────────────────┘
//!        │
//!        ▼
//!   ┌────────────────────────────────────────────────────────────────────────┐
//!   │ Bounded and len >= capacity?                                           │
//!   │                                                                        │
//!   │   YES → evict exactly one entry from the head bucket                   │
//!   │   NO  → nothing to do                                                  │
//!   └────────────────────────────────────────────────────────────────────────┘
//!        │
//!        ▼
//!   place_new(key, value) at frequency 1, then index the key
//! ```
//!
//! In [`LfuCache`] the whole flow runs under one mutex acquisition, so two
//! threads inserting distinct new keys can never both see room and overshoot
//! the capacity. `get` also takes the mutex exclusively because it moves the
//! entry to a new bucket.
//!
//! ## Operations
//!
//! | Operation    | Time | Notes                                             |
//! |--------------|------|---------------------------------------------------|
//! | `insert`     | O(1) | At most one automatic eviction                    |
//! | `get`        | O(1) | Counts as an access                               |
//! | `peek`       | O(1) | No frequency change                               |
//! | `frequency`  | O(1) |                                                   |
//! | `pop_lfu`    | O(1) |                                                   |
//! | `evict(n)`   | O(n) | `n <= 0` is a no-op; over-asking empties the cache|
//!
//! ## Tie-breaking
//!
//! Among entries sharing the lowest frequency the one that reached that
//! frequency first is evicted. See
//! [`frequency_buckets`](crate::ds::frequency_buckets) for the mechanics.
//!
//! ## Example Usage
//!
//! ```
//! use freqcache::policy::lfu::LfuCache;
//!
//! let cache = LfuCache::new(2);
//! cache.set("a", 1);
//! cache.set("b", 2);
//!
//! // "a" is now at frequency 2
//! assert_eq!(cache.get(&"a").as_deref(), Some(&1));
//!
//! // Full: the only frequency-1 entry ("b") makes room
//! cache.set("c", 3);
//! assert!(cache.contains(&"a"));
//! assert!(!cache.contains(&"b"));
//! assert_eq!(cache.size(), 2);
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::ds::{Entry, FrequencyBucketList, KeyIndex};
use crate::error::InvariantError;
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::LfuMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::LfuMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{
    CoreMetricsRecorder, LfuMetricsReadRecorder, LfuMetricsRecorder, MetricsSnapshotProvider,
};
use crate::traits::{Capacity, ConcurrentCache, CoreCache, LfuCacheTrait};

/// Upper bound on the up-front reservation made for a bounded cache.
pub(crate) const MAX_DEFAULT_PREALLOC: usize = 1024;

/// Reservation used when the caller does not choose one.
pub(crate) fn default_prealloc(capacity: Capacity) -> usize {
    capacity
        .limit()
        .map_or(0, |limit| limit.min(MAX_DEFAULT_PREALLOC))
}

/// Single-threaded LFU cache.
///
/// All mutating operations take `&mut self`. Wrap it in [`LfuCache`] to share
/// it between threads.
pub struct LfuCore<K, V> {
    index: KeyIndex<K>,
    buckets: FrequencyBucketList<K, V>,
    capacity: Capacity,
    #[cfg(feature = "metrics")]
    metrics: LfuMetrics,
}

impl<K, V> LfuCore<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero or less means unbounded: entries are only removed
    /// by [`evict`](Self::evict) and [`pop_lfu`](Self::pop_lfu).
    ///
    /// # Example
    ///
    /// ```
    /// use freqcache::policy::lfu::LfuCore;
    /// use freqcache::traits::Capacity;
    ///
    /// let cache: LfuCore<u32, String> = LfuCore::new(100);
    /// assert_eq!(cache.capacity().limit(), Some(100));
    ///
    /// let unbounded: LfuCore<u32, String> = LfuCore::new(-1);
    /// assert_eq!(unbounded.capacity(), Capacity::Unbounded);
    /// ```
    pub fn new(capacity: i64) -> Self {
        let capacity = Capacity::from_limit(capacity);
        Self::with_prealloc(capacity, default_prealloc(capacity))
    }

    /// Creates a cache with room reserved for `prealloc` entries.
    pub(crate) fn with_prealloc(capacity: Capacity, prealloc: usize) -> Self {
        debug!(?capacity, prealloc, "created lfu cache");
        Self {
            index: KeyIndex::with_capacity(prealloc),
            buckets: FrequencyBucketList::with_capacity(prealloc),
            capacity,
            #[cfg(feature = "metrics")]
            metrics: LfuMetrics::default(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Number of distinct frequencies currently represented.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.bucket_count()
    }

    /// `(frequency, entries)` per bucket, lowest frequency first.
    pub fn buckets(&self) -> impl Iterator<Item = (u64, usize)> + '_ {
        self.buckets.iter_buckets()
    }

    /// Inserts `key`, or replaces its value if already present.
    ///
    /// Replacing counts as an access and returns the previous value. It never
    /// evicts. Inserting a new key into a full cache first evicts exactly one
    /// least frequently used entry.
    ///
    /// # Example
    ///
    /// ```
    /// use freqcache::policy::lfu::LfuCore;
    ///
    /// let mut cache = LfuCore::new(10);
    /// assert_eq!(cache.insert("k", 1), None);
    /// assert_eq!(cache.insert("k", 2), Some(1));
    /// assert_eq!(cache.frequency(&"k"), Some(2));
    /// assert_eq!(cache.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        #[cfg(feature = "metrics")]
        self.metrics.record_insert_call();

        if let Some(id) = self.index.lookup(&key) {
            let entry = self
                .buckets
                .entry_mut(id)
                .unwrap_or_else(|| panic!("key index points at dead entry {:?}", id));
            let previous = mem::replace(entry.value_mut(), value);
            self.buckets.increment(id);

            #[cfg(feature = "metrics")]
            self.metrics.record_insert_update();
            return Some(previous);
        }

        if self.capacity.limit().is_some_and(|limit| self.len() >= limit) {
            self.make_room();
        }

        let id = self.buckets.place_new(key.clone(), value);
        if self.index.insert(key, id).is_err() {
            panic!("key index already held a key that was not in the cache");
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_insert_new();
        None
    }

    /// Returns the value for `key` and bumps its frequency.
    ///
    /// A miss has no side effects.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let Some(id) = self.index.lookup(key) else {
            #[cfg(feature = "metrics")]
            self.metrics.record_get_miss();
            return None;
        };

        if self.buckets.increment(id).is_none() {
            panic!("key index points at dead entry {:?}", id);
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_get_hit();
        self.buckets.entry(id).map(Entry::value)
    }

    /// Returns the value for `key` without counting an access.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let id = self.index.lookup(key)?;
        self.buckets.entry(id).map(Entry::value)
    }

    #[inline]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.index.contains(key)
    }

    /// Current access frequency of `key`: 1 after the first insert, plus
    /// one for every hit or update since.
    pub fn frequency<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        #[cfg(feature = "metrics")]
        (&self.metrics).record_frequency_call();

        let frequency = self
            .index
            .lookup(key)
            .and_then(|id| self.buckets.frequency_of(id));

        #[cfg(feature = "metrics")]
        if frequency.is_some() {
            (&self.metrics).record_frequency_found();
        }
        frequency
    }

    /// Removes and returns the entry with the lowest frequency.
    pub fn pop_lfu(&mut self) -> Option<(K, V)> {
        #[cfg(feature = "metrics")]
        self.metrics.record_pop_lfu_call();

        let popped = self.remove_front();

        #[cfg(feature = "metrics")]
        if popped.is_some() {
            self.metrics.record_pop_lfu_found();
        }
        popped
    }

    /// The entry [`pop_lfu`](Self::pop_lfu) would return next.
    pub fn peek_lfu(&self) -> Option<(&K, &V)> {
        #[cfg(feature = "metrics")]
        (&self.metrics).record_peek_lfu_call();

        let front = self.buckets.peek_front().map(|entry| (entry.key(), entry.value()));

        #[cfg(feature = "metrics")]
        if front.is_some() {
            (&self.metrics).record_peek_lfu_found();
        }
        front
    }

    /// Removes up to `n` entries, lowest frequency first.
    ///
    /// `n <= 0` does nothing. Asking for more entries than the cache holds
    /// empties it.
    ///
    /// # Example
    ///
    /// ```
    /// use freqcache::policy::lfu::LfuCore;
    ///
    /// let mut cache = LfuCore::new(0);
    /// for k in 0..3 {
    ///     cache.insert(k, k * 10);
    /// }
    /// assert!(cache.evict(-5).is_empty());
    /// assert_eq!(cache.evict(5), vec![(0, 0), (1, 10), (2, 20)]);
    /// assert!(cache.is_empty());
    /// ```
    pub fn evict(&mut self, n: i64) -> Vec<(K, V)> {
        if n <= 0 {
            return Vec::new();
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_evict_call();

        let requested = usize::try_from(n).unwrap_or(usize::MAX);
        let evicted = self.buckets.evict_front(requested);
        for (key, _) in &evicted {
            if self.index.remove(key).is_none() {
                panic!("evicted entry was missing from the key index");
            }
            #[cfg(feature = "metrics")]
            self.metrics.record_evicted_entry();
        }

        debug!(
            requested = n,
            removed = evicted.len(),
            remaining = self.len(),
            "evicted entries"
        );
        evicted
    }

    /// Cross-checks the key index against the bucket list.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.buckets.check_invariants()?;

        if self.index.len() != self.buckets.len() {
            return Err(InvariantError::new(format!(
                "key index holds {} keys but buckets hold {} entries",
                self.index.len(),
                self.buckets.len()
            )));
        }
        for (key, id) in self.index.iter() {
            let entry = self.buckets.entry(id).ok_or_else(|| {
                InvariantError::new(format!("key index points at dead entry {:?}", id))
            })?;
            if entry.key() != key {
                return Err(InvariantError::new(format!(
                    "key index maps a key to entry {:?} holding a different key",
                    id
                )));
            }
        }
        if let Some(limit) = self.capacity.limit() {
            if self.len() > limit {
                return Err(InvariantError::new(format!(
                    "{} entries exceed capacity {}",
                    self.len(),
                    limit
                )));
            }
        }
        Ok(())
    }

    /// Evicts the single entry a new key displaces in a full cache.
    fn make_room(&mut self) {
        if self.remove_front().is_some() {
            trace!(len = self.len(), "evicted to make room for new key");
            #[cfg(feature = "metrics")]
            self.metrics.record_evicted_entry();
        }
    }

    /// Pops the head-bucket victim and drops its index mapping.
    fn remove_front(&mut self) -> Option<(K, V)> {
        let (key, value) = self.buckets.pop_front()?;
        if self.index.remove(&key).is_none() {
            panic!("evicted entry was missing from the key index");
        }
        Some((key, value))
    }

    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> LfuMetricsSnapshot {
        LfuMetricsSnapshot {
            get_calls: self.metrics.get_calls,
            get_hits: self.metrics.get_hits,
            get_misses: self.metrics.get_misses,
            insert_calls: self.metrics.insert_calls,
            insert_updates: self.metrics.insert_updates,
            insert_new: self.metrics.insert_new,
            evict_calls: self.metrics.evict_calls,
            evicted_entries: self.metrics.evicted_entries,
            pop_lfu_calls: self.metrics.pop_lfu_calls,
            pop_lfu_found: self.metrics.pop_lfu_found,
            peek_lfu_calls: self.metrics.peek_lfu_calls.get(),
            peek_lfu_found: self.metrics.peek_lfu_found.get(),
            frequency_calls: self.metrics.frequency_calls.get(),
            frequency_found: self.metrics.frequency_found.get(),
            cache_len: self.len(),
            capacity: self.capacity.limit().unwrap_or(0),
            bucket_count: self.bucket_count(),
        }
    }
}

impl<K, V> fmt::Debug for LfuCore<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuCore")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("buckets", &self.bucket_count())
            .finish_non_exhaustive()
    }
}

impl<K, V> Default for LfuCore<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates an unbounded cache.
    fn default() -> Self {
        Self::new(0)
    }
}

impl<K, V> Extend<(K, V)> for LfuCore<K, V>
where
    K: Clone + Eq + Hash,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> CoreCache<K, V> for LfuCore<K, V>
where
    K: Clone + Eq + Hash,
{
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        LfuCore::insert(self, key, value)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        LfuCore::get(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        LfuCore::contains(self, key)
    }

    fn len(&self) -> usize {
        LfuCore::len(self)
    }

    fn capacity(&self) -> Capacity {
        self.capacity
    }
}

impl<K, V> LfuCacheTrait<K, V> for LfuCore<K, V>
where
    K: Clone + Eq + Hash,
{
    fn pop_lfu(&mut self) -> Option<(K, V)> {
        LfuCore::pop_lfu(self)
    }

    fn peek_lfu(&self) -> Option<(&K, &V)> {
        LfuCore::peek_lfu(self)
    }

    fn frequency(&self, key: &K) -> Option<u64> {
        LfuCore::frequency(self, key)
    }

    fn evict(&mut self, n: i64) -> Vec<(K, V)> {
        LfuCore::evict(self, n)
    }
}

#[cfg(feature = "metrics")]
impl<K, V> MetricsSnapshotProvider<LfuMetricsSnapshot> for LfuCore<K, V>
where
    K: Clone + Eq + Hash,
{
    fn snapshot(&self) -> LfuMetricsSnapshot {
        self.metrics_snapshot()
    }
}

/// Thread-safe LFU cache.
///
/// A cloneable handle around one [`LfuCore`] behind a [`parking_lot::Mutex`].
/// Values are stored as `Arc<V>` so reads hand out shared references without
/// holding the lock. Every method holds the lock for its whole duration.
pub struct LfuCache<K, V> {
    inner: Arc<Mutex<LfuCore<K, Arc<V>>>>,
}

impl<K, V> Clone for LfuCache<K, V> {
    /// Returns another handle to the same cache.
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates a cache holding at most `capacity` entries; `<= 0` means
    /// unbounded.
    ///
    /// # Example
    ///
    /// ```
    /// use freqcache::policy::lfu::LfuCache;
    ///
    /// let cache: LfuCache<u32, String> = LfuCache::new(100);
    /// assert_eq!(cache.capacity().limit(), Some(100));
    /// assert!(cache.is_empty());
    /// ```
    pub fn new(capacity: i64) -> Self {
        Self::from_core(LfuCore::new(capacity))
    }

    pub(crate) fn from_core(core: LfuCore<K, Arc<V>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(core)),
        }
    }

    /// Stores `value` under `key`, wrapping it in `Arc<V>`.
    ///
    /// Returns the previous value if the key existed. See
    /// [`LfuCore::insert`] for the eviction rules.
    ///
    /// # Example
    ///
    /// ```
    /// use freqcache::policy::lfu::LfuCache;
    ///
    /// let cache = LfuCache::new(10);
    /// assert!(cache.set(1, "first".to_string()).is_none());
    ///
    /// let old = cache.set(1, "updated".to_string());
    /// assert_eq!(old.as_deref().map(String::as_str), Some("first"));
    /// assert_eq!(cache.size(), 1);
    /// ```
    pub fn set(&self, key: K, value: V) -> Option<Arc<V>> {
        let value = Arc::new(value);
        self.inner.lock().insert(key, value)
    }

    /// Stores an already shared value.
    pub fn set_arc(&self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        self.inner.lock().insert(key, value)
    }

    /// Returns the value for `key` and bumps its frequency.
    ///
    /// # Example
    ///
    /// ```
    /// use freqcache::policy::lfu::LfuCache;
    ///
    /// let cache = LfuCache::new(10);
    /// cache.set("k", 7);
    ///
    /// assert_eq!(cache.get(&"k").as_deref(), Some(&7));
    /// assert_eq!(cache.frequency(&"k"), Some(2));
    /// assert!(cache.get(&"missing").is_none());
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.lock().get(key).map(Arc::clone)
    }

    /// Returns the value for `key` without counting an access.
    pub fn peek<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.lock().peek(key).map(Arc::clone)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.lock().contains(key)
    }

    pub fn frequency<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.lock().frequency(key)
    }

    /// Removes up to `n` least frequently used entries and returns how many
    /// were removed. `n <= 0` is a no-op.
    ///
    /// # Example
    ///
    /// ```
    /// use freqcache::policy::lfu::LfuCache;
    ///
    /// let cache = LfuCache::new(0);
    /// for k in 0..3 {
    ///     cache.set(k, ());
    /// }
    /// assert_eq!(cache.evict(0), 0);
    /// assert_eq!(cache.evict(5), 3);
    /// assert_eq!(cache.size(), 0);
    /// ```
    pub fn evict(&self, n: i64) -> usize {
        self.inner.lock().evict(n).len()
    }

    pub fn pop_lfu(&self) -> Option<(K, Arc<V>)> {
        self.inner.lock().pop_lfu()
    }

    pub fn peek_lfu(&self) -> Option<(K, Arc<V>)> {
        let cache = self.inner.lock();
        cache
            .peek_lfu()
            .map(|(key, value)| (key.clone(), Arc::clone(value)))
    }

    /// Number of live entries.
    pub fn size(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> Capacity {
        self.inner.lock().capacity()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.lock().check_invariants()
    }

    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> LfuMetricsSnapshot {
        self.inner.lock().metrics_snapshot()
    }
}

impl<K, V> fmt::Debug for LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.inner.lock();
        f.debug_struct("LfuCache")
            .field("len", &cache.len())
            .field("capacity", &cache.capacity())
            .finish_non_exhaustive()
    }
}

impl<K, V> Default for LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates an unbounded cache.
    fn default() -> Self {
        Self::new(0)
    }
}

impl<K: Send, V: Send + Sync> ConcurrentCache for LfuCache<K, V> {}

#[cfg(feature = "metrics")]
impl<K, V> MetricsSnapshotProvider<LfuMetricsSnapshot> for LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn snapshot(&self) -> LfuMetricsSnapshot {
        self.metrics_snapshot()
    }
}
