pub mod frequency_buckets;
pub mod key_index;
pub mod slot_arena;

pub use frequency_buckets::{BucketId, Entry, EntryId, EvictionOrderIter, FrequencyBucketList};
pub use key_index::KeyIndex;
pub use slot_arena::{SlotArena, SlotId};
