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

//! Report cache metrics to a prometheus registry and render them in the text exposition format.

use gclock::{ClockCache, PrometheusMetricsRegistry};
use prometheus::{Registry, TextEncoder};

fn main() -> anyhow::Result<()> {
    let registry = Registry::new();

    let cache: ClockCache<u64, u64> = ClockCache::builder(64)
        .with_metrics_registry("demo", &PrometheusMetricsRegistry::new(registry.clone()))
        .build()?;

    for i in 0..256 {
        cache.put(i, i);
        let _ = cache.get(&(i / 2));
    }

    let text = TextEncoder::new().encode_to_string(&registry.gather())?;
    println!("{text}");

    Ok(())
}
