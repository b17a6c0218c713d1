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

//! Observe evictions with a custom event listener.

use std::{sync::Arc, thread};

use gclock::{CacheBuilder, EventListener};

struct EchoEventListener;

impl EventListener for EchoEventListener {
    type Key = u64;
    type Value = String;

    fn on_evict(&self, key: Self::Key, value: Self::Value)
    where
        Self::Key: gclock::Key,
        Self::Value: gclock::Value,
    {
        println!("Entry [key = {key}] [value = {value}] is evicted.")
    }
}

/// Output:
///
/// ```plain
/// Entry [key = 1] [value = First] is evicted.
/// Entry [key = 2] [value = Second] is evicted.
/// ```
fn main() -> anyhow::Result<()> {
    let listener = Arc::new(EchoEventListener);
    let cache = CacheBuilder::<u64, String>::new(2)
        .with_event_listener(listener.clone())
        .build()?;

    cache.put(1, "First".to_string());
    cache.put(2, "Second".to_string());
    cache.put(3, "Third".to_string());
    // Updates are not evictions.
    cache.put(3, "Forth".to_string());
    cache.put(4, "Fifth".to_string());

    // The dispatcher releases the listener after all notifications are delivered.
    drop(cache);
    while Arc::strong_count(&listener) > 1 {
        thread::yield_now();
    }

    Ok(())
}
