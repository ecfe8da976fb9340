//! Key index: direct key → entry-handle lookup.
//!
//! A thin wrapper over [`FxHashMap`] that refuses to overwrite an existing
//! mapping. The cache owns exactly one index, and every live entry in the
//! [`FrequencyBucketList`](crate::ds::FrequencyBucketList) has exactly one
//! mapping here.
//!
//! | Operation | Time | Notes                                   |
//! |-----------|------|-----------------------------------------|
//! | `lookup`  | O(1) | No side effects                         |
//! | `insert`  | O(1) | `DuplicateKeyError` if key present      |
//! | `remove`  | O(1) | Returns the handle that was mapped      |
//!
//! ## Example Usage
//!
//! ```
//! use freqcache::ds::KeyIndex;
//!
//! let mut index: KeyIndex<String, u32> = KeyIndex::with_capacity(16);
//! index.insert("page_a".to_string(), 7).unwrap();
//!
//! // Borrowed lookups avoid allocating a String.
//! assert_eq!(index.lookup("page_a"), Some(7));
//! assert_eq!(index.remove("page_a"), Some(7));
//! assert!(index.is_empty());
//! ```

use std::borrow::Borrow;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::frequency_buckets::EntryId;
use crate::error::DuplicateKeyError;

/// Mapping from key to the handle of its cache entry.
#[derive(Debug)]
pub struct KeyIndex<K, H = EntryId> {
    map: FxHashMap<K, H>,
}

impl<K, H> KeyIndex<K, H>
where
    K: Eq + Hash,
    H: Copy,
{
    pub fn new() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the handle mapped to `key`, if any.
    #[inline]
    pub fn lookup<Q>(&self, key: &Q) -> Option<H>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.map.get(key).copied()
    }

    #[inline]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Maps `key` to `handle`.
    ///
    /// Fails with [`DuplicateKeyError`] if `key` is already mapped; the
    /// existing mapping is kept.
    ///
    /// ```
    /// use freqcache::ds::KeyIndex;
    ///
    /// let mut index: KeyIndex<&str, u8> = KeyIndex::new();
    /// assert!(index.insert("k", 1).is_ok());
    /// assert!(index.insert("k", 2).is_err());
    /// assert_eq!(index.lookup("k"), Some(1));
    /// ```
    #[inline]
    pub fn insert(&mut self, key: K, handle: H) -> Result<(), DuplicateKeyError<K>> {
        if self.map.contains_key(&key) {
            return Err(DuplicateKeyError::new(key));
        }
        self.map.insert(key, handle);
        Ok(())
    }

    /// Removes the mapping for `key`, returning the handle it pointed at.
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Option<H>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.map.remove(key)
    }

    /// Iterates all `(key, handle)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, H)> {
        self.map.iter().map(|(key, handle)| (key, *handle))
    }
}

impl<K, H> Default for KeyIndex<K, H>
where
    K: Eq + Hash,
    H: Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_missing_is_none() {
        let index: KeyIndex<u64, usize> = KeyIndex::new();
        assert_eq!(index.lookup(&1), None);
        assert!(!index.contains(&1));
        assert!(index.is_empty());
    }

    #[test]
    fn insert_then_lookup() {
        let mut index = KeyIndex::new();
        index.insert("a", 1usize).unwrap();
        index.insert("b", 2usize).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup(&"a"), Some(1));
        assert_eq!(index.lookup(&"b"), Some(2));
    }

    #[test]
    fn duplicate_insert_keeps_original_mapping() {
        let mut index = KeyIndex::new();
        index.insert("a", 1usize).unwrap();

        let err = index.insert("a", 9).unwrap_err();
        assert_eq!(err.key(), &"a");
        assert_eq!(index.lookup(&"a"), Some(1));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn remove_returns_handle_once() {
        let mut index = KeyIndex::new();
        index.insert(10u32, 3usize).unwrap();
        assert_eq!(index.remove(&10), Some(3));
        assert_eq!(index.remove(&10), None);
        assert!(index.is_empty());
    }

    #[test]
    fn borrowed_lookup_with_string_keys() {
        let mut index: KeyIndex<String, usize> = KeyIndex::with_capacity(4);
        index.insert("page".to_string(), 0).unwrap();
        assert!(index.contains("page"));
        assert_eq!(index.lookup("page"), Some(0));
    }

    #[test]
    fn iter_visits_every_mapping() {
        let mut index = KeyIndex::new();
        for k in 0..5u32 {
            index.insert(k, k as usize * 10).unwrap();
        }
        let mut pairs: Vec<_> = index.iter().map(|(k, h)| (*k, h)).collect();
        pairs.sort();
        assert_eq!(pairs, vec![(0, 0), (1, 10), (2, 20), (3, 30), (4, 40)]);
    }
}
