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

//! Deliver eviction notifications on an existing tokio runtime.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use gclock::{CacheBuilder, Dispatch, Spawner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let evictions = Arc::new(AtomicUsize::new(0));

    let cache = CacheBuilder::<u64, String>::new(8)
        .with_clock_count(2)
        .with_dispatch(Dispatch::Spawner(Spawner::current()))
        .with_on_evict({
            let evictions = evictions.clone();
            move |key, value| {
                println!("evicted {key} => {value}");
                evictions.fetch_add(1, Ordering::Relaxed);
            }
        })
        .build()?;

    for i in 0..32 {
        cache.put(i, format!("value-{i}"));
    }

    while evictions.load(Ordering::Relaxed) < 24 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    println!("{} entries evicted, {} cached", evictions.load(Ordering::Relaxed), cache.len());

    Ok(())
}
