pub use crate::builder::CacheBuilder;
pub use crate::ds::{EntryId, FrequencyBucketList, KeyIndex};
pub use crate::error::{DuplicateKeyError, InvariantError};
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::LfuMetricsSnapshot;
pub use crate::policy::lfu::{LfuCache, LfuCore};
pub use crate::traits::{Capacity, ConcurrentCache, CoreCache, LfuCacheTrait};
