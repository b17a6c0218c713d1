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

use std::{fmt::Debug, marker::PhantomData};

use crate::code::{Key, Value};

/// Trait for the customized event listener.
pub trait EventListener: Send + Sync + 'static {
    /// Associated key type.
    type Key;
    /// Associated value type.
    type Value;

    /// Called when a live entry is reclaimed by the eviction scan to admit a new entry.
    ///
    /// The key and value are moved out of the cache, so the listener owns them.
    ///
    /// The call happens off the path of the cache operation that caused the eviction, with no ordering guarantee
    /// relative to later cache operations or to other evictions.
    #[expect(unused_variables)]
    fn on_evict(&self, key: Self::Key, value: Self::Value)
    where
        Self::Key: Key,
        Self::Value: Value,
    {
    }
}

/// An [`EventListener`] backed by a closure.
pub struct FnEventListener<K, V, F> {
    f: F,
    _marker: PhantomData<fn(K, V)>,
}

impl<K, V, F> Debug for FnEventListener<K, V, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnEventListener").finish()
    }
}

impl<K, V, F> FnEventListener<K, V, F>
where
    F: Fn(K, V) + Send + Sync + 'static,
{
    /// Wrap a closure as an event listener.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<K, V, F> EventListener for FnEventListener<K, V, F>
where
    K: Key,
    V: Value,
    F: Fn(K, V) + Send + Sync + 'static,
{
    type Key = K;
    type Value = V;

    fn on_evict(&self, key: Self::Key, value: Self::Value) {
        (self.f)(key, value)
    }
}
