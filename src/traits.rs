//! # Cache Traits
//!
//! Small trait surface shared by the single-threaded [`LfuCore`] and anything
//! else that wants to be driven generically as an LFU cache.
//!
//! ```text
//!   ┌─────────────────────────────────────┐
//!   │          CoreCache<K, V>            │
//!   │  insert / get / contains / len      │
//!   │  is_empty / capacity                │
//!   └──────────────────┬──────────────────┘
//!                      │
//!                      ▼
//!   ┌─────────────────────────────────────┐      ┌──────────────────────────┐
//!   │        LfuCacheTrait<K, V>          │      │     ConcurrentCache      │
//!   │  pop_lfu / peek_lfu / frequency     │      │  marker: Send + Sync     │
//!   │  evict(n)                           │      │  (LfuCache)              │
//!   └─────────────────────────────────────┘      └──────────────────────────┘
//! ```
//!
//! Core traits take `&mut self` for anything that changes frequency; the
//! thread-safe [`LfuCache`] exposes the same operations through `&self` and
//! an internal lock instead of implementing these traits.
//!
//! [`LfuCore`]: crate::policy::lfu::LfuCore
//! [`LfuCache`]: crate::policy::lfu::LfuCache

use std::num::NonZeroUsize;

/// Maximum number of live entries before inserts start evicting.
///
/// # Example
///
/// ```
/// use freqcache::traits::Capacity;
///
/// assert_eq!(Capacity::from_limit(0), Capacity::Unbounded);
/// assert_eq!(Capacity::from_limit(-3), Capacity::Unbounded);
/// assert_eq!(Capacity::from_limit(8).limit(), Some(8));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capacity {
    /// No automatic eviction; only explicit `evict` shrinks the cache.
    #[default]
    Unbounded,
    /// At most this many live entries.
    Bounded(NonZeroUsize),
}

impl Capacity {
    /// Maps a signed limit to a capacity. Zero or negative means unbounded.
    pub fn from_limit(limit: i64) -> Self {
        if limit <= 0 {
            return Capacity::Unbounded;
        }
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        NonZeroUsize::new(limit).map_or(Capacity::Unbounded, Capacity::Bounded)
    }

    /// The entry limit, or `None` when unbounded.
    #[inline]
    pub fn limit(self) -> Option<usize> {
        match self {
            Capacity::Unbounded => None,
            Capacity::Bounded(limit) => Some(limit.get()),
        }
    }

    #[inline]
    pub fn is_bounded(self) -> bool {
        matches!(self, Capacity::Bounded(_))
    }
}

impl From<NonZeroUsize> for Capacity {
    fn from(limit: NonZeroUsize) -> Self {
        Capacity::Bounded(limit)
    }
}

/// Operations every cache supports.
///
/// # Example
///
/// ```
/// use freqcache::policy::lfu::LfuCore;
/// use freqcache::traits::CoreCache;
///
/// fn warm<C: CoreCache<u64, String>>(cache: &mut C, data: &[(u64, String)]) {
///     for (k, v) in data {
///         cache.insert(*k, v.clone());
///     }
/// }
///
/// let mut cache = LfuCore::new(10);
/// warm(&mut cache, &[(1, "one".into()), (2, "two".into())]);
/// assert_eq!(CoreCache::len(&cache), 2);
/// ```
pub trait CoreCache<K, V> {
    /// Inserts or updates `key`. Returns the previous value on update.
    ///
    /// Updating an existing key counts as an access. Inserting a new key into
    /// a full cache evicts exactly one entry first.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Returns the value for `key`, counting the lookup as an access.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Returns `true` if `key` is present. Does not count as an access.
    fn contains(&self, key: &K) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> Capacity;
}

/// LFU-specific operations.
///
/// # Example
///
/// ```
/// use freqcache::policy::lfu::LfuCore;
/// use freqcache::traits::{CoreCache, LfuCacheTrait};
///
/// let mut cache: LfuCore<u64, &str> = LfuCore::new(10);
/// cache.insert(1, "first");
/// cache.insert(2, "second");
/// cache.get(&2);
///
/// assert_eq!(cache.peek_lfu().map(|(k, _)| *k), Some(1));
/// assert_eq!(cache.pop_lfu(), Some((1, "first")));
/// ```
pub trait LfuCacheTrait<K, V>: CoreCache<K, V> {
    /// Removes and returns the least frequently used entry.
    ///
    /// Among entries sharing the lowest frequency, the one that reached that
    /// frequency first is chosen.
    fn pop_lfu(&mut self) -> Option<(K, V)>;

    /// The entry [`pop_lfu`](Self::pop_lfu) would remove. Not an access.
    fn peek_lfu(&self) -> Option<(&K, &V)>;

    /// Access count of `key`: 1 after insertion, plus one per hit or update.
    fn frequency(&self, key: &K) -> Option<u64>;

    /// Removes up to `n` least frequently used entries. `n <= 0` is a no-op.
    fn evict(&mut self, n: i64) -> Vec<(K, V)>;
}

/// Marker trait for caches that are safe to share across threads.
///
/// # Example
///
/// ```
/// use freqcache::policy::lfu::LfuCache;
/// use freqcache::traits::ConcurrentCache;
///
/// fn share<C: ConcurrentCache + Clone + 'static>(cache: &C) {
///     let cache = cache.clone();
///     std::thread::spawn(move || drop(cache)).join().unwrap();
/// }
///
/// share(&LfuCache::<u64, String>::new(16));
/// ```
pub trait ConcurrentCache: Send + Sync {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_non_positive_is_unbounded() {
        assert_eq!(Capacity::from_limit(0), Capacity::Unbounded);
        assert_eq!(Capacity::from_limit(-1), Capacity::Unbounded);
        assert_eq!(Capacity::from_limit(i64::MIN), Capacity::Unbounded);
        assert!(!Capacity::from_limit(0).is_bounded());
        assert_eq!(Capacity::Unbounded.limit(), None);
    }

    #[test]
    fn capacity_positive_is_bounded() {
        let cap = Capacity::from_limit(3);
        assert!(cap.is_bounded());
        assert_eq!(cap.limit(), Some(3));
    }

    #[test]
    fn capacity_large_limit_saturates() {
        let cap = Capacity::from_limit(i64::MAX);
        assert!(cap.limit().unwrap() > 0);
    }

    #[test]
    fn capacity_default_is_unbounded() {
        assert_eq!(Capacity::default(), Capacity::Unbounded);
    }
}
