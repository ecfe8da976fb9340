//! Error types for the freqcache library.
//!
//! ## Key Components
//!
//! - [`InvariantError`]: Returned by `check_invariants` when the bucket
//!   structure, the key index, or the entry arena disagree.
//! - [`DuplicateKeyError`]: Returned by [`KeyIndex::insert`](crate::ds::KeyIndex::insert)
//!   when the key is already mapped. Carries the rejected key back to the caller.
//!
//! Lookups that miss are not errors; they return `None`.
//!
//! ## Example Usage
//!
//! ```
//! use freqcache::ds::KeyIndex;
//!
//! let mut index: KeyIndex<&str, usize> = KeyIndex::new();
//! assert!(index.insert("a", 0).is_ok());
//!
//! let err = index.insert("a", 1).unwrap_err();
//! assert_eq!(err.into_key(), "a");
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by `check_invariants` on
/// [`FrequencyBucketList`](crate::ds::FrequencyBucketList),
/// [`LfuCore`](crate::policy::lfu::LfuCore) and
/// [`LfuCache`](crate::policy::lfu::LfuCache). Carries a human-readable
/// description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// DuplicateKeyError
// ---------------------------------------------------------------------------

/// Error returned when inserting a key that is already present in a
/// [`KeyIndex`](crate::ds::KeyIndex).
///
/// The index is left unchanged and the rejected key is handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKeyError<K>(K);

impl<K> DuplicateKeyError<K> {
    #[inline]
    pub(crate) fn new(key: K) -> Self {
        Self(key)
    }

    /// Returns a reference to the rejected key.
    #[inline]
    pub fn key(&self) -> &K {
        &self.0
    }

    /// Consumes the error, returning the rejected key.
    #[inline]
    pub fn into_key(self) -> K {
        self.0
    }
}

impl<K: fmt::Debug> fmt::Display for DuplicateKeyError<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "duplicate key {:?} in key index", self.0)
    }
}

impl<K: fmt::Debug> std::error::Error for DuplicateKeyError<K> {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
