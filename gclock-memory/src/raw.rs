// Copyright 2026 gclock Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::hash::Hash;

use equivalent::Equivalent;
use gclock_common::{strict_assert, strict_assert_eq};

use crate::{indexer::Indexer, ring::Ring};

/// Outcome of [`RawClock::emplace`].
///
/// Everything carried out of the critical section is dropped or dispatched by the caller after the lock is released.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Emplaced<K, V> {
    /// The key was present, its value was swapped in place.
    Replaced(V),
    /// The key was new and got a slot. Carries the live entry reclaimed to make room, if any.
    Inserted(Option<(K, V)>),
    /// The ring has no slot at all.
    Rejected(K, V),
}

/// Ring, key index and hand, guarded as one unit by the cache lock.
pub(crate) struct RawClock<K, V> {
    ring: Ring<K, V>,
    indexer: Indexer,
}

impl<K, V> RawClock<K, V>
where
    K: Hash + Eq,
{
    pub fn new(capacity: usize, clock_count: u8) -> Self {
        Self {
            ring: Ring::new(capacity, clock_count),
            indexer: Indexer::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.indexer.len()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn clock_count(&self) -> u8 {
        self.ring.clock_count()
    }

    #[cfg_attr(feature = "tracing", fastrace::trace(name = "gclock::memory::raw::emplace"))]
    pub fn emplace(&mut self, hash: u64, key: K, value: V) -> Emplaced<K, V> {
        if let Some(index) = self.indexer.get(&self.ring, hash, &key) {
            return match self.ring.replace_value(index, value) {
                Some(old) => Emplaced::Replaced(old),
                None => unreachable!("indexed slot {index} holds no entry"),
            };
        }

        if self.ring.capacity() == 0 {
            return Emplaced::Rejected(key, value);
        }

        let full = self.len() == self.ring.capacity();
        let (index, steps) = self.ring.sweep();
        let evicted = if self.ring.slot(index).is_live() {
            let removed = self.indexer.remove_slot(&self.ring, index);
            strict_assert!(removed);
            tracing::trace!("[raw]: evict slot {index} after {steps} steps");
            self.ring.take(index)
        } else {
            None
        };
        strict_assert!(!full || evicted.is_some());

        let old = self.ring.fill(index, hash, key, value);
        strict_assert!(old.is_none());
        self.indexer.insert(&self.ring, index);
        strict_assert!(self.len() <= self.ring.capacity());

        Emplaced::Inserted(evicted)
    }

    /// Find the slot of the key without refreshing it.
    pub fn index<Q>(&self, hash: u64, key: &Q) -> Option<usize>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        self.indexer.get(&self.ring, hash, key)
    }

    /// Find the value of the key and grant its slot a full reprieve.
    ///
    /// Takes `&self` so that lookups can run under the shared lock.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "gclock::memory::raw::lookup"))]
    pub fn lookup<Q>(&self, hash: u64, key: &Q) -> Option<&V>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let index = self.index(hash, key)?;
        self.ring.touch(index);
        self.ring.slot(index).value()
    }

    #[cfg_attr(feature = "tracing", fastrace::trace(name = "gclock::memory::raw::remove"))]
    pub fn remove<Q>(&mut self, hash: u64, key: &Q) -> Option<(K, V)>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let index = self.indexer.remove(&self.ring, hash, key)?;
        let entry = self.ring.take(index);
        strict_assert!(entry.is_some());
        entry
    }

    #[cfg_attr(feature = "tracing", fastrace::trace(name = "gclock::memory::raw::clear"))]
    pub fn clear(&mut self) -> Vec<(K, V)> {
        let len = self.len();
        self.indexer.clear();
        let drained = self.ring.clear();
        strict_assert_eq!(drained.len(), len);
        drained
    }

    /// Sweep the whole structure and describe the first inconsistency found.
    #[cfg(any(test, feature = "test_utils"))]
    pub fn check_invariants(&self, hash: impl Fn(&K) -> u64) -> std::result::Result<(), String> {
        let capacity = self.ring.capacity();
        let clock_count = self.ring.clock_count();

        if capacity > 0 && self.ring.hand() >= capacity {
            return Err(format!("hand {} out of ring of {capacity} slots", self.ring.hand()));
        }
        if self.len() > capacity {
            return Err(format!("{} keys indexed over capacity {capacity}", self.len()));
        }

        let mut live = 0;
        for (index, slot) in self.ring.slots().enumerate() {
            if slot.counter() > clock_count {
                return Err(format!(
                    "slot {index} counter {} exceeds clock count {clock_count}",
                    slot.counter()
                ));
            }
            let Some(key) = slot.key() else { continue };
            live += 1;
            if slot.hash() != hash(key) {
                return Err(format!("slot {index} caches a stale hash"));
            }
            match self.indexer.get(&self.ring, slot.hash(), key) {
                Some(i) if i == index => {}
                Some(i) => return Err(format!("key of slot {index} is indexed to slot {i}")),
                None => return Err(format!("key of slot {index} is not indexed")),
            }
        }

        if live != self.len() {
            return Err(format!("{live} live slots but {} indexed keys", self.len()));
        }
        if let Some(index) = self.indexer.iter().find(|&i| i >= capacity || !self.ring.slot(i).is_live()) {
            return Err(format!("index points to empty or missing slot {index}"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::hash::BuildHasher;

    use gclock_common::hasher::ModHasher;

    use super::*;

    fn put(raw: &mut RawClock<u64, u64>, key: u64) -> Emplaced<u64, u64> {
        raw.emplace(ModHasher::default().hash_one(key), key, key)
    }

    fn get(raw: &RawClock<u64, u64>, key: u64) -> Option<u64> {
        raw.lookup(ModHasher::default().hash_one(key), &key).copied()
    }

    fn check(raw: &RawClock<u64, u64>) {
        raw.check_invariants(|k| ModHasher::default().hash_one(k)).unwrap();
    }

    #[test]
    fn test_emplace_replace_and_evict() {
        let mut raw = RawClock::new(3, 1);
        for key in 0..3 {
            assert_eq!(put(&mut raw, key), Emplaced::Inserted(None));
        }
        assert_eq!(raw.emplace(ModHasher::default().hash_one(1u64), 1, 100), Emplaced::Replaced(1));
        assert_eq!(raw.len(), 3);
        check(&raw);

        assert_eq!(put(&mut raw, 3), Emplaced::Inserted(Some((0, 0))));
        assert_eq!(get(&raw, 1), Some(100));
        assert_eq!(put(&mut raw, 4), Emplaced::Inserted(Some((2, 2))));
        check(&raw);
    }

    #[test]
    fn test_empty_ring_rejects() {
        let mut raw = RawClock::new(0, 1);
        assert_eq!(put(&mut raw, 1), Emplaced::Rejected(1, 1));
        assert_eq!(get(&raw, 1), None);
        assert_eq!(raw.len(), 0);
        check(&raw);
    }

    #[test]
    fn test_deleted_slot_reclaimed_by_sweep() {
        let mut raw = RawClock::new(4, 2);
        for key in 0..4 {
            put(&mut raw, key);
        }
        assert_eq!(raw.remove(ModHasher::default().hash_one(2u64), &2), Some((2, 2)));
        assert_eq!(raw.remove(ModHasher::default().hash_one(2u64), &2), None);
        check(&raw);

        // The sweep ages slots 0 and 1 on its way to the freed slot.
        assert_eq!(put(&mut raw, 10), Emplaced::Inserted(None));
        assert_eq!(raw.index(10, &10u64), Some(2));
        let counter = |raw: &RawClock<u64, u64>, key: u64| raw.ring.slot(raw.index(key, &key).unwrap()).counter();
        assert_eq!([0, 1, 10, 3].map(|key| counter(&raw, key)), [1, 1, 2, 2]);
        check(&raw);
    }

    #[test]
    fn test_sweep_evicts_before_reaching_freed_slot() {
        let mut raw = RawClock::new(3, 1);
        for key in 0..3 {
            put(&mut raw, key);
        }
        assert_eq!(put(&mut raw, 3), Emplaced::Inserted(Some((0, 0))));
        raw.remove(3, &3u64);

        // The hand rests on slot 1, whose counter the previous sweep spent.
        assert_eq!(put(&mut raw, 4), Emplaced::Inserted(Some((1, 1))));
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.index(0, &0u64), None);
        check(&raw);
    }

    #[test]
    fn test_clear() {
        let mut raw = RawClock::new(4, 1);
        for key in 0..6 {
            put(&mut raw, key);
        }
        let mut drained = raw.clear();
        drained.sort();
        assert_eq!(drained.len(), 4);
        assert_eq!(raw.len(), 0);
        check(&raw);

        assert_eq!(put(&mut raw, 42), Emplaced::Inserted(None));
        assert_eq!(raw.index(42, &42u64), Some(0));
    }
}
