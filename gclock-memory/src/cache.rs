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

use std::{borrow::Cow, fmt::Debug, hash::Hash, sync::Arc};

use equivalent::Equivalent;
use gclock_common::{
    code::{DefaultHasher, HashBuilder, Key, Value},
    error::Result,
    event::{EventListener, FnEventListener},
    metrics::{Metrics, RegistryOps},
    scope::Scope,
};
use parking_lot::RwLock;

use crate::{
    dispatch::{ArcEventListener, Dispatch, Dispatcher},
    raw::{Emplaced, RawClock},
};

/// The default reprieves a slot receives before it becomes evictable.
pub const DEFAULT_CLOCK_COUNT: u8 = 1;

struct Inner<K, V, S> {
    raw: RwLock<RawClock<K, V>>,
    hash_builder: S,
    dispatcher: Option<Dispatcher<K, V>>,
    metrics: Arc<Metrics>,
}

/// A fixed-capacity in-memory cache with generalized CLOCK eviction.
///
/// Entries live in a ring of pre-allocated slots. A hit grants the entry's slot `clock_count` reprieves. When a new
/// key arrives at a full cache, the clock hand sweeps the ring, spending one reprieve per slot it passes, and reclaims
/// the first slot with none left.
///
/// [`ClockCache`] is a cheap handle, clones share the same cache.
///
/// # Examples
///
/// ```rust
/// use gclock_memory::ClockCache;
///
/// let cache = ClockCache::new(2);
/// cache.put("a", 1);
/// cache.put("b", 2);
/// assert_eq!(cache.get("a"), Some(1));
///
/// // The cache is full, so "c" takes the slot of an entry without reprieves left.
/// cache.put("c", 3);
/// assert_eq!(cache.len(), 2);
/// assert!(cache.contains("c"));
/// ```
pub struct ClockCache<K, V, S = DefaultHasher> {
    inner: Arc<Inner<K, V, S>>,
}

impl<K, V, S> Clone for ClockCache<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V, S> Debug for ClockCache<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClockCache")
            .field("capacity", &self.capacity())
            .field("clock_count", &self.clock_count())
            .field("len", &self.len())
            .field("dispatcher", &self.inner.dispatcher)
            .finish()
    }
}

impl<K, V> ClockCache<K, V, DefaultHasher>
where
    K: Key,
    V: Value,
{
    /// Create a cache of `capacity` slots with the default configuration and no event listener.
    pub fn new(capacity: usize) -> Self {
        Self::with_parts(
            RawClock::new(capacity, DEFAULT_CLOCK_COUNT),
            DefaultHasher::default(),
            None,
            Arc::new(Metrics::noop()),
        )
    }

    /// Create a builder for a cache of `capacity` slots.
    pub fn builder(capacity: usize) -> CacheBuilder<K, V, DefaultHasher> {
        CacheBuilder::new(capacity)
    }
}

impl<K, V, S> ClockCache<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    fn with_parts(
        raw: RawClock<K, V>,
        hash_builder: S,
        dispatcher: Option<Dispatcher<K, V>>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                raw: RwLock::new(raw),
                hash_builder,
                dispatcher,
                metrics,
            }),
        }
    }

    /// Insert or update an entry.
    ///
    /// Updating an existing key swaps its value and refreshes it, the entry stays in its slot. A new key takes the
    /// slot picked by the clock sweep, evicting its entry if the slot is live. Slots freed by `delete` are reused
    /// once the hand reaches them. Eviction notifications are handed to the dispatcher after the lock is released,
    /// `put` never waits for them.
    ///
    /// A cache with zero capacity drops every entry.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "gclock::memory::cache::put"))]
    pub fn put(&self, key: K, value: V) {
        let hash = self.inner.hash_builder.hash_one(&key);

        let emplaced = self.inner.raw.write().with(|mut raw| raw.emplace(hash, key, value));

        match emplaced {
            Emplaced::Replaced(_) => self.inner.metrics.memory_replace.increase(1),
            Emplaced::Inserted(None) => {
                self.inner.metrics.memory_insert.increase(1);
                self.inner.metrics.memory_usage.increase(1);
            }
            Emplaced::Inserted(Some((key, value))) => {
                self.inner.metrics.memory_insert.increase(1);
                self.inner.metrics.memory_evict.increase(1);
                if let Some(dispatcher) = self.inner.dispatcher.as_ref() {
                    dispatcher.dispatch(key, value);
                }
            }
            Emplaced::Rejected(..) => {}
        }
    }

    /// Get a clone of the value of the key, refreshing the entry on hit.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "gclock::memory::cache::get"))]
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        Q: Hash + Equivalent<K> + ?Sized,
        V: Clone,
    {
        self.with_value(key, V::clone)
    }

    /// Call `f` with a reference to the value of the key, refreshing the entry on hit.
    ///
    /// `f` runs under the shared lock. It must not call back into a mutating operation of the same cache.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "gclock::memory::cache::with_value"))]
    pub fn with_value<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
    where
        Q: Hash + Equivalent<K> + ?Sized,
        F: FnOnce(&V) -> R,
    {
        let hash = self.inner.hash_builder.hash_one(key);

        let res = self.inner.raw.read().with(|raw| raw.lookup(hash, key).map(f));

        match res {
            Some(_) => self.inner.metrics.memory_hit.increase(1),
            None => self.inner.metrics.memory_miss.increase(1),
        }
        res
    }

    /// Check if the key is cached, without refreshing it.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let hash = self.inner.hash_builder.hash_one(key);
        self.inner.raw.read().index(hash, key).is_some()
    }

    /// Remove the entry of the key, if any.
    ///
    /// The freed slot is reused by a later insertion. Removal is not eviction: no notification is emitted.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "gclock::memory::cache::delete"))]
    pub fn delete<Q>(&self, key: &Q)
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let hash = self.inner.hash_builder.hash_one(key);

        let removed = self.inner.raw.write().with(|mut raw| raw.remove(hash, key));

        if removed.is_some() {
            self.inner.metrics.memory_remove.increase(1);
            self.inner.metrics.memory_usage.decrease(1);
        }
    }

    /// Remove every entry without notifications and reset the clock hand.
    #[cfg_attr(feature = "tracing", fastrace::trace(name = "gclock::memory::cache::clear"))]
    pub fn clear(&self) {
        let garbages = self.inner.raw.write().with(|mut raw| raw.clear());
        self.inner.metrics.memory_remove.increase(garbages.len() as _);
        self.inner.metrics.memory_usage.absolute(0);
        drop(garbages);
    }

    /// Live entry count.
    pub fn len(&self) -> usize {
        self.inner.raw.read().len()
    }

    /// Returns `true` if the cache holds no entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slot count, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.inner.raw.read().capacity()
    }

    /// Reprieves a slot receives before it becomes evictable.
    pub fn clock_count(&self) -> u8 {
        self.inner.raw.read().clock_count()
    }

    /// Hash builder of the cache.
    pub fn hash_builder(&self) -> &S {
        &self.inner.hash_builder
    }

    /// Check the consistency between the slot ring and the key index.
    ///
    /// Returns a description of the first violation found.
    #[cfg(any(test, feature = "test_utils"))]
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        self.inner
            .raw
            .read()
            .check_invariants(|key| self.inner.hash_builder.hash_one(key))
    }
}

/// Builder for [`ClockCache`].
pub struct CacheBuilder<K, V, S = DefaultHasher> {
    capacity: usize,
    clock_count: u8,
    event_listener: Option<ArcEventListener<K, V>>,
    dispatch: Dispatch,
    hash_builder: S,
    metrics: Option<Arc<Metrics>>,
}

impl<K, V> CacheBuilder<K, V, DefaultHasher>
where
    K: Key,
    V: Value,
{
    /// Create a cache builder with the given capacity, in slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            clock_count: DEFAULT_CLOCK_COUNT,
            event_listener: None,
            dispatch: Dispatch::default(),
            hash_builder: DefaultHasher::default(),
            metrics: None,
        }
    }
}

impl<K, V, S> CacheBuilder<K, V, S>
where
    K: Key,
    V: Value,
    S: HashBuilder,
{
    /// Set the reprieves a slot receives on insertion and on every hit.
    ///
    /// With `0`, hits do not protect entries and the cache degrades to FIFO order. `1` is the classic second-chance
    /// CLOCK. Larger values let frequently used entries survive more sweeps of the clock hand.
    ///
    /// The default value is `1`.
    pub fn with_clock_count(mut self, clock_count: u8) -> Self {
        self.clock_count = clock_count;
        self
    }

    /// Set the listener notified of every eviction.
    pub fn with_event_listener(mut self, event_listener: Arc<dyn EventListener<Key = K, Value = V>>) -> Self {
        self.event_listener = Some(event_listener);
        self
    }

    /// Set a closure notified of every eviction.
    ///
    /// Shorthand for [`CacheBuilder::with_event_listener`] with a [`FnEventListener`].
    pub fn with_on_evict<F>(self, f: F) -> Self
    where
        F: Fn(K, V) + Send + Sync + 'static,
    {
        self.with_event_listener(Arc::new(FnEventListener::new(f)))
    }

    /// Set where eviction notifications are delivered.
    ///
    /// The default value is [`Dispatch::Thread`]. Ignored without an event listener.
    pub fn with_dispatch(mut self, dispatch: impl Into<Dispatch>) -> Self {
        self.dispatch = dispatch.into();
        self
    }

    /// Set the hash builder used to index keys.
    pub fn with_hash_builder<OS>(self, hash_builder: OS) -> CacheBuilder<K, V, OS>
    where
        OS: HashBuilder,
    {
        CacheBuilder {
            capacity: self.capacity,
            clock_count: self.clock_count,
            event_listener: self.event_listener,
            dispatch: self.dispatch,
            hash_builder,
            metrics: self.metrics,
        }
    }

    /// Report metrics labeled with `name` to the registry.
    ///
    /// Metrics are discarded by default.
    pub fn with_metrics_registry(mut self, name: impl Into<Cow<'static, str>>, registry: &impl RegistryOps) -> Self {
        self.metrics = Some(Arc::new(Metrics::new(name, registry)));
        self
    }

    /// Build the cache.
    ///
    /// Fails only if the dispatcher worker thread cannot be spawned.
    pub fn build(self) -> Result<ClockCache<K, V, S>> {
        let dispatcher = match self.event_listener {
            Some(listener) => Some(Dispatcher::open(self.dispatch, listener)?),
            None => None,
        };
        let metrics = self.metrics.unwrap_or_else(|| Arc::new(Metrics::noop()));

        tracing::debug!(
            capacity = self.capacity,
            clock_count = self.clock_count,
            dispatcher = ?dispatcher,
            "[cache]: build clock cache"
        );

        Ok(ClockCache::with_parts(
            RawClock::new(self.capacity, self.clock_count),
            self.hash_builder,
            dispatcher,
            metrics,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::{mpsc, Barrier},
        thread,
        time::Duration,
    };

    use gclock_common::{hasher::ModHasher, spawn::Spawner};
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::*;

    fn evict_channel<K, V>(
        builder: CacheBuilder<K, V, ModHasher>,
    ) -> (ClockCache<K, V, ModHasher>, mpsc::Receiver<(K, V)>)
    where
        K: Key,
        V: Value,
    {
        let (tx, rx) = mpsc::channel();
        let tx = parking_lot::Mutex::new(tx);
        let cache = builder
            .with_on_evict(move |k, v| {
                let _ = tx.lock().send((k, v));
            })
            .build()
            .unwrap();
        (cache, rx)
    }

    /// Drop the cache and collect every notification once the dispatcher has drained.
    fn evicted<K, V, S>(cache: ClockCache<K, V, S>, rx: mpsc::Receiver<(K, V)>) -> Vec<K> {
        drop(cache);
        rx.iter().map(|(k, _)| k).collect()
    }

    fn mod_builder(capacity: usize) -> CacheBuilder<u64, u64, ModHasher> {
        CacheBuilder::new(capacity).with_hash_builder(ModHasher::default())
    }

    #[test_log::test]
    fn test_round_trip_update_delete() {
        let cache = ClockCache::new(4);
        assert!(cache.is_empty());

        cache.put("a".to_string(), 1);
        assert_eq!(cache.get("a"), Some(1));

        cache.put("a".to_string(), 2);
        assert_eq!(cache.get("a"), Some(2));
        assert_eq!(cache.len(), 1);

        cache.delete("a");
        assert_eq!(cache.get("a"), None);
        assert!(!cache.contains("a"));
        assert!(cache.is_empty());

        cache.delete("a");
        cache.check_invariants().unwrap();
    }

    #[test_log::test]
    fn test_second_chance_order() {
        let (cache, rx) = evict_channel(mod_builder(3).with_clock_count(1));
        for i in 0..4 {
            cache.put(i, i);
        }
        assert!(!cache.contains(&0));

        assert_eq!(cache.get(&1), Some(1));
        cache.put(4, 4);
        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));

        cache.check_invariants().unwrap();
        assert_eq!(evicted(cache, rx), vec![0, 2]);
    }

    #[test_log::test]
    fn test_clock_count_zero_ignores_hits() {
        let (cache, rx) = evict_channel(mod_builder(3).with_clock_count(0));
        for i in 0..3 {
            cache.put(i, i);
        }
        cache.get(&0);
        cache.put(3, 3);
        cache.get(&1);
        cache.put(4, 4);
        assert_eq!(evicted(cache, rx), vec![0, 1]);
    }

    /// A hit grants `clock_count` reprieves. The hit key below loses one reprieve to the sweep that evicts key 2,
    /// then the next sweep reaches it again before the freed slot.
    #[test_log::test]
    fn test_generalized_reprieve() {
        fn run(clock_count: u8) -> (Vec<u64>, bool) {
            let (cache, rx) = evict_channel(mod_builder(3).with_clock_count(clock_count));
            for i in 0..4 {
                cache.put(i, i);
            }
            cache.get(&1);
            cache.put(4, 4);
            cache.delete(&4);
            cache.put(5, 5);
            cache.check_invariants().unwrap();
            let survived = cache.contains(&1);
            (evicted(cache, rx), survived)
        }

        assert_eq!(run(1), (vec![0, 2, 1], false));
        assert_eq!(run(2), (vec![0, 2], true));
    }

    #[test_log::test]
    fn test_deleted_slots_reclaimed_by_sweep() {
        let (cache, rx) = evict_channel(mod_builder(4));
        for i in 0..4 {
            cache.put(i, i);
        }
        cache.delete(&1);
        cache.delete(&3);
        cache.put(10, 10);
        cache.put(11, 11);
        assert_eq!(cache.len(), 4);
        for key in [0, 2, 10, 11] {
            assert!(cache.contains(&key));
        }
        cache.check_invariants().unwrap();

        // Reaching the freed slots spent the reprieves of keys 0 and 2.
        cache.put(12, 12);
        assert!(!cache.contains(&0));
        assert_eq!(evicted(cache, rx), vec![0]);
    }

    #[test_log::test]
    fn test_sweep_evicts_live_slot_ahead_of_freed_slot() {
        let (cache, rx) = evict_channel(mod_builder(3).with_clock_count(1));
        for i in 0..4 {
            cache.put(i, i);
        }
        cache.delete(&3);
        cache.put(4, 4);

        assert_eq!(cache.len(), 2);
        let live = (0..5).filter(|k| cache.contains(k)).collect::<Vec<_>>();
        assert_eq!(live, vec![2, 4]);
        cache.check_invariants().unwrap();
        assert_eq!(evicted(cache, rx), vec![0, 1]);
    }

    #[test_log::test]
    fn test_eviction_notification_completeness() {
        const CAPACITY: usize = 16;
        const N: u64 = 1000;

        let (cache, rx) = evict_channel(
            CacheBuilder::new(CAPACITY)
                .with_clock_count(3)
                .with_hash_builder(ModHasher::default()),
        );
        let mut rng = SmallRng::seed_from_u64(114514);
        for i in 0..N {
            cache.put(i, i.to_string());
            if rng.random_bool(0.5) {
                cache.get(&rng.random_range(0..=i));
            }
        }
        assert_eq!(cache.len(), CAPACITY);
        cache.check_invariants().unwrap();

        let live = (0..N).filter(|i| cache.contains(i)).collect::<HashSet<_>>();
        let evicted = evicted(cache, rx);
        assert_eq!(evicted.len(), N as usize - CAPACITY);

        let mut all = evicted.into_iter().collect::<HashSet<_>>();
        assert!(all.is_disjoint(&live));
        all.extend(live);
        assert_eq!(all, (0..N).collect::<HashSet<_>>());
    }

    #[test_log::test]
    fn test_zero_capacity() {
        let (cache, rx) = evict_channel(mod_builder(0));
        for i in 0..10 {
            cache.put(i, i);
            assert_eq!(cache.get(&i), None);
        }
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.capacity(), 0);
        cache.delete(&0);
        cache.clear();
        cache.check_invariants().unwrap();
        assert!(evicted(cache, rx).is_empty());
    }

    #[test_log::test]
    fn test_clear_without_notification() {
        let (cache, rx) = evict_channel(mod_builder(4));
        for i in 0..6 {
            cache.put(i, i);
        }
        cache.clear();
        assert!(cache.is_empty());
        cache.check_invariants().unwrap();

        for i in 10..14 {
            cache.put(i, i);
        }
        assert_eq!(cache.len(), 4);
        assert_eq!(evicted(cache, rx), vec![0, 1]);
    }

    #[test_log::test]
    fn test_with_value_refreshes() {
        let (cache, rx) = evict_channel(CacheBuilder::new(3).with_hash_builder(ModHasher::default()));
        for i in 1..=4u64 {
            cache.put(i, vec![i as u8; 16]);
        }
        assert_eq!(cache.with_value(&2, |v| v.len()), Some(16));
        assert_eq!(cache.with_value(&1, |v| v.len()), None);
        cache.put(5, vec![5u8; 16]);
        assert!(cache.contains(&2));
        assert_eq!(evicted(cache, rx), vec![1, 3]);
    }

    #[test_log::test]
    fn test_panicking_listener() {
        let (tx, rx) = mpsc::channel();
        let tx = parking_lot::Mutex::new(tx);
        let cache = mod_builder(1)
            .with_on_evict(move |k, _| {
                if k == 0 {
                    panic!("listener failure on key {k}");
                }
                let _ = tx.lock().send(k);
            })
            .build()
            .unwrap();
        for i in 0..4 {
            cache.put(i, i);
        }
        assert_eq!(cache.get(&3), Some(3));
        drop(cache);
        assert_eq!(rx.iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test_log::test]
    fn test_slow_listener_does_not_block() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = parking_lot::Mutex::new(release_rx);
        let cache = mod_builder(2)
            .with_on_evict(move |_, _| {
                let _ = release_rx.lock().recv();
            })
            .build()
            .unwrap();
        for i in 0..100 {
            cache.put(i, i);
        }
        assert_eq!(cache.len(), 2);
        drop(release_tx);
    }

    #[test_log::test]
    fn test_spawner_dispatch() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .build()
            .unwrap();
        let spawner = Spawner::from(runtime.handle().clone());
        let (cache, rx) = evict_channel(mod_builder(8).with_dispatch(Dispatch::Spawner(spawner)));
        for i in 0..64 {
            cache.put(i, i);
        }
        let mut evicted = evicted(cache, rx);
        evicted.sort();
        assert_eq!(evicted, (0..56).collect::<Vec<_>>());
    }

    #[test_log::test]
    fn test_clones_share_cache() {
        let cache = ClockCache::new(8);
        let clone = cache.clone();
        cache.put(1u64, 1u64);
        assert_eq!(clone.get(&1), Some(1));
        clone.delete(&1);
        assert!(!cache.contains(&1));
    }

    #[test_log::test]
    fn test_concurrent_storm() {
        const THREADS: usize = 8;
        const OPS: usize = 20_000;
        const CAPACITY: usize = 64;
        const KEYS: u64 = 256;

        let (cache, rx) = evict_channel(
            CacheBuilder::new(CAPACITY)
                .with_clock_count(2)
                .with_hash_builder(ModHasher::default()),
        );
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles = (0..THREADS)
            .map(|t| {
                let cache = cache.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    let mut rng = SmallRng::seed_from_u64(t as u64);
                    barrier.wait();
                    for _ in 0..OPS {
                        let key = rng.random_range(0..KEYS);
                        match rng.random_range(0..10) {
                            0..5 => {
                                if let Some(v) = cache.get(&key) {
                                    assert_eq!(v, key * 10);
                                }
                            }
                            5..9 => cache.put(key, key * 10),
                            _ => cache.delete(&key),
                        }
                        assert!(cache.len() <= CAPACITY);
                    }
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            handle.join().unwrap();
        }

        cache.check_invariants().unwrap();
        assert!(cache.len() <= CAPACITY);
        assert!(evicted(cache, rx).iter().all(|k| *k < KEYS));
    }

    #[test_log::test]
    fn test_concurrent_readers_see_consistent_values() {
        let cache = ClockCache::builder(16).with_clock_count(4).build().unwrap();
        for i in 0..16u64 {
            cache.put(i, i);
        }

        let readers = (0..4)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for _ in 0..10_000 {
                        for i in 0..16u64 {
                            if let Some(v) = cache.get(&i) {
                                assert!(v == i || v == i + 100);
                            }
                        }
                    }
                })
            })
            .collect::<Vec<_>>();

        for i in 0..16u64 {
            cache.put(i, i + 100);
            thread::sleep(Duration::from_micros(10));
        }
        for reader in readers {
            reader.join().unwrap();
        }
        cache.check_invariants().unwrap();
    }
}
