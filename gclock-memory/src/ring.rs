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

use std::sync::atomic::{AtomicU8, Ordering};

use gclock_common::strict_assert;

/// A pre-allocated cell of the ring.
///
/// The counter is atomic so that a reader holding the shared lock can refresh it. Everything else is only mutated
/// under the exclusive lock.
pub(crate) struct Slot<K, V> {
    counter: AtomicU8,
    hash: u64,
    entry: Option<(K, V)>,
}

impl<K, V> Default for Slot<K, V> {
    fn default() -> Self {
        Self {
            counter: AtomicU8::new(0),
            hash: 0,
            entry: None,
        }
    }
}

impl<K, V> Slot<K, V> {
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[cfg(any(test, feature = "test_utils"))]
    pub fn counter(&self) -> u8 {
        self.counter.load(Ordering::Relaxed)
    }

    pub fn key(&self) -> Option<&K> {
        self.entry.as_ref().map(|(k, _)| k)
    }

    pub fn value(&self) -> Option<&V> {
        self.entry.as_ref().map(|(_, v)| v)
    }

    pub fn is_live(&self) -> bool {
        self.entry.is_some()
    }
}

/// Fixed number of slots arranged in a cycle, plus the clock hand.
pub(crate) struct Ring<K, V> {
    slots: Box<[Slot<K, V>]>,
    hand: usize,
    clock_count: u8,
}

impl<K, V> Ring<K, V> {
    pub fn new(capacity: usize, clock_count: u8) -> Self {
        let slots = (0..capacity).map(|_| Slot::default()).collect();
        Self {
            slots,
            hand: 0,
            clock_count,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn clock_count(&self) -> u8 {
        self.clock_count
    }

    #[cfg(any(test, feature = "test_utils"))]
    pub fn hand(&self) -> usize {
        self.hand
    }

    pub fn slot(&self, index: usize) -> &Slot<K, V> {
        &self.slots[index]
    }

    #[cfg(any(test, feature = "test_utils"))]
    pub fn slots(&self) -> impl Iterator<Item = &Slot<K, V>> {
        self.slots.iter()
    }

    /// Upper bound of hand steps a single [`Ring::sweep`] may take.
    pub fn sweep_bound(&self) -> usize {
        self.capacity() * (self.clock_count as usize + 1)
    }

    #[inline(always)]
    fn next(&self, index: usize) -> usize {
        (index + 1) % self.slots.len()
    }

    /// Grant the slot a full reprieve.
    ///
    /// Safe to call with the shared lock held.
    #[inline(always)]
    pub fn touch(&self, index: usize) {
        self.slots[index].counter.store(self.clock_count, Ordering::Relaxed);
    }

    /// Run the generalized CLOCK scan and return `(victim, steps)`.
    ///
    /// Every slot under the hand with a positive counter is decremented and skipped. The first slot found at zero is
    /// the victim; the hand is left on it. Empty slots always sit at zero, so the victim may hold no entry. The ring
    /// must have at least one slot.
    pub fn sweep(&mut self) -> (usize, usize) {
        let mut steps = 0;
        loop {
            steps += 1;
            let counter = &self.slots[self.hand].counter;
            let count = counter.load(Ordering::Relaxed);
            if count == 0 {
                break;
            }
            counter.store(count - 1, Ordering::Relaxed);
            self.hand = self.next(self.hand);
        }
        strict_assert!(
            steps <= self.sweep_bound(),
            "sweep took {steps} steps, bound is {}",
            self.sweep_bound()
        );
        (self.hand, steps)
    }

    /// Write a new entry into the slot, returning the entry it held.
    ///
    /// The slot receives a full reprieve and the hand moves past it.
    pub fn fill(&mut self, index: usize, hash: u64, key: K, value: V) -> Option<(K, V)> {
        let clock_count = self.clock_count;
        let slot = &mut self.slots[index];
        let old = slot.entry.replace((key, value));
        slot.hash = hash;
        *slot.counter.get_mut() = clock_count;
        self.hand = self.next(index);
        old
    }

    /// Swap the value of a live slot and refresh its counter.
    pub fn replace_value(&mut self, index: usize, value: V) -> Option<V> {
        let clock_count = self.clock_count;
        let slot = &mut self.slots[index];
        let (_, v) = slot.entry.as_mut()?;
        *slot.counter.get_mut() = clock_count;
        Some(std::mem::replace(v, value))
    }

    /// Empty the slot and zero its counter. The hand is left where it is.
    pub fn take(&mut self, index: usize) -> Option<(K, V)> {
        let slot = &mut self.slots[index];
        *slot.counter.get_mut() = 0;
        slot.hash = 0;
        slot.entry.take()
    }

    /// Empty every slot and reset the hand to the first slot.
    pub fn clear(&mut self) -> Vec<(K, V)> {
        self.hand = 0;
        (0..self.slots.len()).filter_map(|i| self.take(i)).collect()
    }
}
