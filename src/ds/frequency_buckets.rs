//! Frequency bucket list for O(1) LFU bookkeeping.
//!
//! Owns every cache entry and keeps them grouped by access frequency. Buckets
//! form an ordered sequence, strictly ascending by frequency, so the head
//! bucket is always the eviction target. Lookup by key is not handled here;
//! that is the job of [`KeyIndex`](crate::ds::KeyIndex), which maps keys to
//! the [`EntryId`] handles issued by this list.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     FrequencyBucketList<K, V> Layout                     │
//! │                                                                         │
//! │   entries: SlotArena<Entry<K, V>>       buckets: SlotArena<Bucket>      │
//! │   ┌──────┬──────────────────────┐       ┌──────┬─────────────────────┐  │
//! │   │ e0   │ "a" bucket=b1 links  │       │ b0   │ freq=1 head/tail/len│  │
//! │   │ e1   │ "b" bucket=b0 links  │       │ b1   │ freq=2 head/tail/len│  │
//! │   │ e2   │ "c" bucket=b0 links  │       └──────┴─────────────────────┘  │
//! │   └──────┴──────────────────────┘                                       │
//! │                                                                         │
//! │   head ──► [b0 freq=1] ◄──► [b1 freq=2] ◄── tail                        │
//! │              │                 │                                        │
//! │              ▼                 ▼                                        │
//! │        front [e2] ◄──► [e1]   [e0]                                      │
//! │        newest        oldest (evicted first)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entries point at their bucket through a [`BucketId`] handle, never a
//! reference, and buckets link to their neighbours the same way. Bucket
//! membership is an intrusive doubly-linked list threaded through the
//! entries' `prev`/`next` handles, which gives O(1) insert and unlink and
//! remembers arrival order.
//!
//! ## Invariants
//!
//! - Bucket frequencies strictly increase from head to tail.
//! - No two buckets share a frequency.
//! - No bucket is empty; a bucket is unlinked the moment its last member leaves.
//! - Every entry is a member of exactly the bucket its `bucket` handle names.
//!
//! ## Operations
//!
//! | Operation      | Time  | Notes                                          |
//! |----------------|-------|------------------------------------------------|
//! | `place_new`    | O(1)  | Joins (or creates) the head freq=1 bucket      |
//! | `increment`    | O(1)  | Moves to freq+1, creating/merging the bucket   |
//! | `pop_front`    | O(1)  | Oldest member of the lowest-frequency bucket   |
//! | `evict_front`  | O(n)  | `n` repeated `pop_front` calls                 |
//! | `frequency_of` | O(1)  | Frequency of the entry's bucket                |
//!
//! ## Tie-breaking
//!
//! An entry is pushed to the front of a bucket whenever it arrives there
//! (new insert or increment) and eviction takes from the back. Among entries
//! sharing the lowest frequency, the one that has held that frequency
//! longest goes first.
//!
//! ## Example Usage
//!
//! ```
//! use freqcache::ds::FrequencyBucketList;
//!
//! let mut list = FrequencyBucketList::new();
//! let a = list.place_new("a", 1);
//! let _b = list.place_new("b", 2);
//! let _c = list.place_new("c", 3);
//!
//! assert_eq!(list.increment(a), Some(2));
//!
//! // Lowest frequency first, oldest arrival first among ties.
//! assert_eq!(list.pop_front(), Some(("b", 2)));
//! assert_eq!(list.evict_front(5), vec![("c", 3), ("a", 1)]);
//! assert!(list.is_empty());
//! ```

use tracing::trace;

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

/// Handle to a live entry in a [`FrequencyBucketList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(SlotId);

/// Handle to a live bucket in a [`FrequencyBucketList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketId(SlotId);

/// One cached key/value pair.
///
/// Link fields come first; they are touched on every increment and eviction.
#[derive(Debug)]
pub struct Entry<K, V> {
    prev: Option<EntryId>,
    next: Option<EntryId>,
    bucket: BucketId,
    key: K,
    value: V,
}

impl<K, V> Entry<K, V> {
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    #[inline]
    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// The bucket this entry is currently a member of.
    #[inline]
    pub fn bucket(&self) -> BucketId {
        self.bucket
    }
}

/// Intrusive member list of a bucket. `head` is the newest arrival.
#[derive(Debug, Default, Clone, Copy)]
struct Members {
    head: Option<EntryId>,
    tail: Option<EntryId>,
    len: usize,
}

impl Members {
    fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug)]
struct FrequencyBucket {
    frequency: u64,
    members: Members,
    prev: Option<BucketId>,
    next: Option<BucketId>,
}

/// Ordered sequence of frequency buckets holding every cache entry.
///
/// See the [module documentation](self) for layout and invariants.
#[derive(Debug)]
pub struct FrequencyBucketList<K, V> {
    entries: SlotArena<Entry<K, V>>,
    buckets: SlotArena<FrequencyBucket>,
    head: Option<BucketId>,
    tail: Option<BucketId>,
}

impl<K, V> FrequencyBucketList<K, V> {
    pub fn new() -> Self {
        Self {
            entries: SlotArena::new(),
            buckets: SlotArena::new(),
            head: None,
            tail: None,
        }
    }

    /// Creates an empty list with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: SlotArena::with_capacity(capacity),
            buckets: SlotArena::new(),
            head: None,
            tail: None,
        }
    }

    /// Number of live entries across all buckets.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-empty buckets.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Lowest frequency currently represented, if any.
    pub fn min_frequency(&self) -> Option<u64> {
        self.head.map(|id| self.bucket_ref(id).frequency)
    }

    #[inline]
    pub fn entry(&self, id: EntryId) -> Option<&Entry<K, V>> {
        self.entries.get(id.0)
    }

    #[inline]
    pub fn entry_mut(&mut self, id: EntryId) -> Option<&mut Entry<K, V>> {
        self.entries.get_mut(id.0)
    }

    /// Current access frequency of `id`.
    pub fn frequency_of(&self, id: EntryId) -> Option<u64> {
        let entry = self.entries.get(id.0)?;
        Some(self.bucket_ref(entry.bucket).frequency)
    }

    /// Frequency of bucket `id`, or `None` if the bucket is gone.
    pub fn bucket_frequency(&self, id: BucketId) -> Option<u64> {
        self.buckets.get(id.0).map(|bucket| bucket.frequency)
    }

    /// Creates an entry at frequency 1.
    ///
    /// Reuses the head bucket when it already has frequency 1, otherwise a
    /// new frequency-1 bucket becomes the head. Since 1 is the lowest
    /// possible frequency this never disturbs ordering.
    pub fn place_new(&mut self, key: K, value: V) -> EntryId {
        let bucket = match self.head {
            Some(head) if self.bucket_ref(head).frequency == 1 => head,
            _ => self.link_bucket_front(1),
        };
        let id = EntryId(self.entries.insert(Entry {
            prev: None,
            next: None,
            bucket,
            key,
            value,
        }));
        self.member_push_front(bucket, id);
        id
    }

    /// Moves `id` to the bucket for its frequency plus one and returns the
    /// new frequency.
    ///
    /// Merges into the following bucket when it already has that frequency,
    /// otherwise splices a new bucket in directly after the current one. The
    /// vacated bucket is unlinked if this was its last member. At `u64::MAX`
    /// the frequency saturates and the entry only moves to the front of its
    /// bucket.
    ///
    /// Returns `None` if `id` is not a live entry.
    pub fn increment(&mut self, id: EntryId) -> Option<u64> {
        let curr = self.entries.get(id.0)?.bucket;
        let (frequency, next) = {
            let bucket = self.bucket_ref(curr);
            (bucket.frequency, bucket.next)
        };

        let Some(target_frequency) = frequency.checked_add(1) else {
            self.member_unlink(curr, id);
            self.member_push_front(curr, id);
            return Some(frequency);
        };

        let target = match next {
            Some(next) if self.bucket_ref(next).frequency == target_frequency => next,
            _ => self.link_bucket_after(curr, target_frequency),
        };

        self.member_unlink(curr, id);
        self.entry_or_panic(id).bucket = target;
        self.member_push_front(target, id);

        if self.bucket_ref(curr).members.is_empty() {
            self.unlink_bucket(curr);
        }
        Some(target_frequency)
    }

    /// The entry [`pop_front`](Self::pop_front) would remove next.
    pub fn peek_front(&self) -> Option<&Entry<K, V>> {
        let head = self.head?;
        let id = self.bucket_ref(head).members.tail?;
        self.entries.get(id.0)
    }

    /// Removes the oldest member of the lowest-frequency bucket.
    pub fn pop_front(&mut self) -> Option<(K, V)> {
        let head = self.head?;
        let (frequency, id) = {
            let bucket = self.bucket_ref(head);
            let id = bucket
                .members
                .tail
                .unwrap_or_else(|| panic!("head bucket (freq={}) has no members", bucket.frequency));
            (bucket.frequency, id)
        };

        self.member_unlink(head, id);
        if self.bucket_ref(head).members.is_empty() {
            self.unlink_bucket(head);
        }

        let entry = self
            .entries
            .remove(id.0)
            .unwrap_or_else(|| panic!("bucket member {:?} has no entry", id));
        trace!(frequency, "evicted entry");
        Some((entry.key, entry.value))
    }

    /// Removes up to `n` entries, lowest frequency first.
    ///
    /// Drains the head bucket oldest-first, unlinks it once empty, then
    /// continues into the next bucket until `n` entries are gone or the list
    /// is empty. The caller is responsible for dropping the evicted keys from
    /// its key index.
    pub fn evict_front(&mut self, n: usize) -> Vec<(K, V)> {
        let mut evicted = Vec::with_capacity(n.min(self.len()));
        while evicted.len() < n {
            match self.pop_front() {
                Some(pair) => evicted.push(pair),
                None => break,
            }
        }
        evicted
    }

    /// Iterates `(frequency, member_count)` from head to tail.
    pub fn iter_buckets(&self) -> impl Iterator<Item = (u64, usize)> + '_ {
        std::iter::successors(self.head, move |id| self.bucket_ref(*id).next).map(move |id| {
            let bucket = self.bucket_ref(id);
            (bucket.frequency, bucket.members.len)
        })
    }

    /// Iterates `(frequency, entry)` in the order entries would be evicted.
    pub fn iter_eviction_order(&self) -> EvictionOrderIter<'_, K, V> {
        EvictionOrderIter {
            list: self,
            bucket: self.head,
            cursor: self.head.and_then(|id| self.bucket_ref(id).members.tail),
        }
    }

    /// Walks the whole structure and reports the first broken invariant.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let mut prev_bucket: Option<BucketId> = None;
        let mut prev_frequency: Option<u64> = None;
        let mut buckets_seen = 0usize;
        let mut members_seen = 0usize;
        let mut cursor = self.head;

        while let Some(bucket_id) = cursor {
            let bucket = self.buckets.get(bucket_id.0).ok_or_else(|| {
                InvariantError::new(format!("bucket list links to dead bucket {:?}", bucket_id))
            })?;
            if bucket.prev != prev_bucket {
                return Err(InvariantError::new(format!(
                    "bucket freq={} has prev {:?}, expected {:?}",
                    bucket.frequency, bucket.prev, prev_bucket
                )));
            }
            if bucket.frequency == 0 {
                return Err(InvariantError::new("bucket with frequency 0"));
            }
            if let Some(prev) = prev_frequency {
                if bucket.frequency <= prev {
                    return Err(InvariantError::new(format!(
                        "bucket frequencies not strictly ascending: {} after {}",
                        bucket.frequency, prev
                    )));
                }
            }
            if bucket.members.is_empty() {
                return Err(InvariantError::new(format!(
                    "bucket freq={} is empty",
                    bucket.frequency
                )));
            }

            let mut prev_member: Option<EntryId> = None;
            let mut member_cursor = bucket.members.head;
            let mut count = 0usize;
            while let Some(id) = member_cursor {
                let entry = self.entries.get(id.0).ok_or_else(|| {
                    InvariantError::new(format!(
                        "bucket freq={} links to dead entry {:?}",
                        bucket.frequency, id
                    ))
                })?;
                if entry.bucket != bucket_id {
                    return Err(InvariantError::new(format!(
                        "entry {:?} is linked in bucket freq={} but points at {:?}",
                        id, bucket.frequency, entry.bucket
                    )));
                }
                if entry.prev != prev_member {
                    return Err(InvariantError::new(format!(
                        "entry {:?} has prev {:?}, expected {:?}",
                        id, entry.prev, prev_member
                    )));
                }
                prev_member = Some(id);
                member_cursor = entry.next;
                count += 1;
                if count > self.entries.len() {
                    return Err(InvariantError::new("cycle in bucket member list"));
                }
            }
            if bucket.members.tail != prev_member {
                return Err(InvariantError::new(format!(
                    "bucket freq={} tail does not match last member",
                    bucket.frequency
                )));
            }
            if bucket.members.len != count {
                return Err(InvariantError::new(format!(
                    "bucket freq={} records {} members, found {}",
                    bucket.frequency, bucket.members.len, count
                )));
            }

            members_seen += count;
            buckets_seen += 1;
            if buckets_seen > self.buckets.len() {
                return Err(InvariantError::new("cycle in bucket list"));
            }
            prev_frequency = Some(bucket.frequency);
            prev_bucket = Some(bucket_id);
            cursor = bucket.next;
        }

        if self.tail != prev_bucket {
            return Err(InvariantError::new("bucket list tail does not match last bucket"));
        }
        if buckets_seen != self.buckets.len() {
            return Err(InvariantError::new(format!(
                "{} buckets allocated but {} reachable",
                self.buckets.len(),
                buckets_seen
            )));
        }
        if members_seen != self.entries.len() {
            return Err(InvariantError::new(format!(
                "{} entries allocated but {} linked into buckets",
                self.entries.len(),
                members_seen
            )));
        }
        Ok(())
    }

    fn bucket_ref(&self, id: BucketId) -> &FrequencyBucket {
        self.buckets
            .get(id.0)
            .unwrap_or_else(|| panic!("dangling bucket handle {:?}", id))
    }

    fn entry_or_panic(&mut self, id: EntryId) -> &mut Entry<K, V> {
        self.entries
            .get_mut(id.0)
            .unwrap_or_else(|| panic!("dangling entry handle {:?}", id))
    }

    fn link_bucket_front(&mut self, frequency: u64) -> BucketId {
        let old_head = self.head;
        let id = BucketId(self.buckets.insert(FrequencyBucket {
            frequency,
            members: Members::default(),
            prev: None,
            next: old_head,
        }));
        match old_head {
            Some(old) => self.bucket_mut(old).prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        trace!(frequency, "created bucket at head");
        id
    }

    fn link_bucket_after(&mut self, after: BucketId, frequency: u64) -> BucketId {
        let next = self.bucket_ref(after).next;
        let id = BucketId(self.buckets.insert(FrequencyBucket {
            frequency,
            members: Members::default(),
            prev: Some(after),
            next,
        }));
        self.bucket_mut(after).next = Some(id);
        match next {
            Some(next) => self.bucket_mut(next).prev = Some(id),
            None => self.tail = Some(id),
        }
        trace!(frequency, "created bucket");
        id
    }

    fn unlink_bucket(&mut self, id: BucketId) {
        let bucket = self
            .buckets
            .remove(id.0)
            .unwrap_or_else(|| panic!("dangling bucket handle {:?}", id));
        debug_assert!(bucket.members.is_empty());
        match bucket.prev {
            Some(prev) => self.bucket_mut(prev).next = bucket.next,
            None => self.head = bucket.next,
        }
        match bucket.next {
            Some(next) => self.bucket_mut(next).prev = bucket.prev,
            None => self.tail = bucket.prev,
        }
        trace!(frequency = bucket.frequency, "removed empty bucket");
    }

    fn bucket_mut(&mut self, id: BucketId) -> &mut FrequencyBucket {
        self.buckets
            .get_mut(id.0)
            .unwrap_or_else(|| panic!("dangling bucket handle {:?}", id))
    }

    fn member_push_front(&mut self, bucket: BucketId, id: EntryId) {
        let members = &mut self
            .buckets
            .get_mut(bucket.0)
            .unwrap_or_else(|| panic!("dangling bucket handle {:?}", bucket))
            .members;
        let old_head = members.head;
        if let Some(entry) = self.entries.get_mut(id.0) {
            entry.prev = None;
            entry.next = old_head;
        }
        match old_head {
            Some(old) => {
                if let Some(entry) = self.entries.get_mut(old.0) {
                    entry.prev = Some(id);
                }
            },
            None => members.tail = Some(id),
        }
        members.head = Some(id);
        members.len += 1;
    }

    fn member_unlink(&mut self, bucket: BucketId, id: EntryId) {
        let (prev, next) = {
            let entry = self.entry_or_panic(id);
            let links = (entry.prev, entry.next);
            entry.prev = None;
            entry.next = None;
            links
        };
        let members = &mut self
            .buckets
            .get_mut(bucket.0)
            .unwrap_or_else(|| panic!("dangling bucket handle {:?}", bucket))
            .members;
        match prev {
            Some(prev) => {
                if let Some(entry) = self.entries.get_mut(prev.0) {
                    entry.next = next;
                }
            },
            None => members.head = next,
        }
        match next {
            Some(next) => {
                if let Some(entry) = self.entries.get_mut(next.0) {
                    entry.prev = prev;
                }
            },
            None => members.tail = prev,
        }
        members.len -= 1;
    }
}

impl<K, V> Default for FrequencyBucketList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over `(frequency, entry)` in eviction order.
///
/// Created by [`FrequencyBucketList::iter_eviction_order`]. Walks buckets
/// from lowest to highest frequency and each bucket from oldest to newest
/// arrival.
pub struct EvictionOrderIter<'a, K, V> {
    list: &'a FrequencyBucketList<K, V>,
    bucket: Option<BucketId>,
    cursor: Option<EntryId>,
}

impl<'a, K, V> Iterator for EvictionOrderIter<'a, K, V> {
    type Item = (u64, &'a Entry<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let bucket = self.list.buckets.get(self.bucket?.0)?;
            match self.cursor {
                Some(id) => {
                    let entry = self.list.entries.get(id.0)?;
                    self.cursor = entry.prev;
                    return Some((bucket.frequency, entry));
                },
                None => {
                    self.bucket = bucket.next;
                    self.cursor = bucket
                        .next
                        .and_then(|next| self.list.buckets.get(next.0))
                        .and_then(|next| next.members.tail);
                },
            }
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone)]
    enum Op {
        Place,
        Increment(usize),
        Evict(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => Just(Op::Place),
            4 => any::<usize>().prop_map(Op::Increment),
            1 => (0usize..4).prop_map(Op::Evict),
        ]
    }

    proptest! {
        /// Property: structure invariants hold and frequencies match a model
        /// after any sequence of placements, increments and evictions
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_invariants_hold_after_random_ops(
            ops in prop::collection::vec(op_strategy(), 0..200)
        ) {
            let mut list: FrequencyBucketList<u32, ()> = FrequencyBucketList::new();
            let mut model: HashMap<u32, (EntryId, u64)> = HashMap::new();
            let mut next_key = 0u32;

            for op in ops {
                match op {
                    Op::Place => {
                        let id = list.place_new(next_key, ());
                        model.insert(next_key, (id, 1));
                        next_key += 1;
                    },
                    Op::Increment(pick) => {
                        if model.is_empty() {
                            continue;
                        }
                        let mut keys: Vec<_> = model.keys().copied().collect();
                        keys.sort_unstable();
                        let key = keys[pick % keys.len()];
                        let slot = model.get_mut(&key).unwrap();
                        slot.1 += 1;
                        prop_assert_eq!(list.increment(slot.0), Some(slot.1));
                    },
                    Op::Evict(n) => {
                        let before = list.len();
                        let min = model.values().map(|(_, f)| *f).min();
                        let evicted = list.evict_front(n);
                        prop_assert_eq!(evicted.len(), n.min(before));
                        if let (Some(min), Some((first, _))) = (min, evicted.first()) {
                            prop_assert_eq!(model[first].1, min);
                        }
                        for (key, _) in evicted {
                            prop_assert!(model.remove(&key).is_some());
                        }
                    },
                }

                prop_assert!(list.check_invariants().is_ok());
                prop_assert_eq!(list.len(), model.len());
                for (id, freq) in model.values() {
                    prop_assert_eq!(list.frequency_of(*id), Some(*freq));
                }
            }
        }

        /// Property: eviction order is non-decreasing in frequency
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_eviction_order_is_sorted(
            touches in prop::collection::vec(0usize..16, 0..100)
        ) {
            let mut list: FrequencyBucketList<usize, ()> = FrequencyBucketList::new();
            let ids: Vec<_> = (0..16).map(|k| list.place_new(k, ())).collect();
            for t in touches {
                list.increment(ids[t]);
            }

            let mut last = 0u64;
            while let Some((freq, key)) = list
                .iter_eviction_order()
                .next()
                .map(|(freq, entry)| (freq, *entry.key()))
            {
                prop_assert!(freq >= last);
                last = freq;
                prop_assert_eq!(list.peek_front().map(|e| *e.key()), Some(key));
                let (popped, _) = list.pop_front().unwrap();
                prop_assert_eq!(popped, key);
            }
            prop_assert!(list.is_empty());
        }
    }
}
