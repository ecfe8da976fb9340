//! Construction-time configuration for LFU caches.
//!
//! ## Example
//!
//! ```rust
//! use freqcache::builder::CacheBuilder;
//!
//! let cache = CacheBuilder::new(100)
//!     .prealloc(16)
//!     .build::<u64, String>();
//! cache.set(1, "hello".to_string());
//! assert_eq!(cache.get(&1).as_deref().map(String::as_str), Some("hello"));
//! ```

use std::hash::Hash;
use std::sync::Arc;

use crate::policy::lfu::{LfuCache, LfuCore, default_prealloc};
use crate::traits::Capacity;

/// Builder for [`LfuCore`] and [`LfuCache`] instances.
#[derive(Debug, Clone, Copy)]
pub struct CacheBuilder {
    capacity: Capacity,
    prealloc: Option<usize>,
}

impl CacheBuilder {
    /// Create a new cache builder with the specified capacity. Zero or
    /// negative means unbounded.
    pub fn new(capacity: i64) -> Self {
        Self {
            capacity: Capacity::from_limit(capacity),
            prealloc: None,
        }
    }

    /// Reserve room for `entries` up front.
    ///
    /// Defaults to the capacity, capped at 1024, or nothing when unbounded.
    pub fn prealloc(mut self, entries: usize) -> Self {
        self.prealloc = Some(entries);
        self
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    fn resolved_prealloc(&self) -> usize {
        self.prealloc
            .unwrap_or_else(|| default_prealloc(self.capacity))
    }

    /// Build a single-threaded cache.
    ///
    /// # Example
    ///
    /// ```rust
    /// use freqcache::builder::CacheBuilder;
    ///
    /// let mut cache = CacheBuilder::new(2).build_core::<&str, u32>();
    /// cache.insert("a", 1);
    /// cache.insert("b", 2);
    /// cache.get(&"a");
    /// cache.insert("c", 3);
    /// assert!(!cache.contains(&"b"));
    /// ```
    pub fn build_core<K, V>(self) -> LfuCore<K, V>
    where
        K: Clone + Eq + Hash,
    {
        LfuCore::with_prealloc(self.capacity, self.resolved_prealloc())
    }

    /// Build a thread-safe cache handle.
    pub fn build<K, V>(self) -> LfuCache<K, V>
    where
        K: Clone + Eq + Hash,
    {
        LfuCache::from_core(LfuCore::<K, Arc<V>>::with_prealloc(
            self.capacity,
            self.resolved_prealloc(),
        ))
    }
}
