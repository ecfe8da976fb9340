//! freqcache: an in-memory LFU cache with O(1) frequency buckets.
//!
//! Entries are grouped into buckets by access count; the buckets form an
//! ascending sequence whose head is always the eviction target. A key index
//! gives direct lookup, so get, insert, frequency bump and single eviction
//! never scan.
//!
//! - [`policy::lfu::LfuCore`]: single-threaded cache, `&mut self` API.
//! - [`policy::lfu::LfuCache`]: cloneable thread-safe handle, one mutex around
//!   the whole structure.
//! - [`ds`]: the bucket list, key index and slot arena underneath.
//!
//! ```
//! use freqcache::prelude::*;
//!
//! let cache = LfuCache::new(2);
//! cache.set("a", 1);
//! cache.set("b", 2);
//! cache.get(&"a");
//! cache.set("c", 3);
//! assert!(!cache.contains(&"b"));
//! ```

pub mod builder;
pub mod ds;
pub mod error;
pub mod policy;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
pub mod traits;
