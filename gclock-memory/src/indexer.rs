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
use hashbrown::hash_table::{Entry as HashTableEntry, HashTable};

use crate::ring::Ring;

/// Maps keys to the ring slots holding them.
///
/// The table stores slot indices only. Keys and hashes live in the ring, so every operation borrows the ring to
/// compare keys and to rehash on growth.
#[derive(Default)]
pub(crate) struct Indexer {
    table: HashTable<usize>,
}

impl Indexer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn get<K, V, Q>(&self, ring: &Ring<K, V>, hash: u64, key: &Q) -> Option<usize>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        self.table
            .find(hash, |&i| ring.slot(i).key().is_some_and(|k| key.equivalent(k)))
            .copied()
    }

    /// Index a slot that was just filled. The key must not be indexed yet.
    pub fn insert<K, V>(&mut self, ring: &Ring<K, V>, index: usize) {
        let hash = ring.slot(index).hash();
        self.table.insert_unique(hash, index, |&i| ring.slot(i).hash());
    }

    pub fn remove<K, V, Q>(&mut self, ring: &Ring<K, V>, hash: u64, key: &Q) -> Option<usize>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        match self.table.entry(
            hash,
            |&i| ring.slot(i).key().is_some_and(|k| key.equivalent(k)),
            |&i| ring.slot(i).hash(),
        ) {
            HashTableEntry::Occupied(o) => {
                let (index, _) = o.remove();
                Some(index)
            }
            HashTableEntry::Vacant(_) => None,
        }
    }

    /// Drop the mapping of a slot about to be reused, identified by position rather than by key.
    pub fn remove_slot<K, V>(&mut self, ring: &Ring<K, V>, index: usize) -> bool {
        let hash = ring.slot(index).hash();
        match self.table.find_entry(hash, |&i| i == index) {
            Ok(o) => {
                o.remove();
                true
            }
            Err(_) => false,
        }
    }

    #[cfg(any(test, feature = "test_utils"))]
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.table.iter().copied()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }
}
