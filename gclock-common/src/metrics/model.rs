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

use std::borrow::Cow;

use super::{BoxedCounter, BoxedGauge, RegistryOps};

/// In-memory cache metrics.
///
/// Every metric is labeled with the cache name, so several caches can share one registry.
#[derive(Debug)]
pub struct Metrics {
    /// New keys admitted by `put`.
    pub memory_insert: BoxedCounter,
    /// Existing keys updated in place by `put`.
    pub memory_replace: BoxedCounter,
    /// Lookups that found their key.
    pub memory_hit: BoxedCounter,
    /// Lookups that missed.
    pub memory_miss: BoxedCounter,
    /// Entries dropped by `delete`.
    pub memory_remove: BoxedCounter,
    /// Live entries reclaimed by the eviction scan.
    pub memory_evict: BoxedCounter,

    /// Live entry count.
    pub memory_usage: BoxedGauge,
}

impl Metrics {
    /// Create a new metric with the given name and registry.
    pub fn new(name: impl Into<Cow<'static, str>>, registry: &impl RegistryOps) -> Self {
        let name = name.into();

        let gclock_memory_op_total = registry.register_counter_vec(
            "gclock_memory_op_total".into(),
            "gclock in-memory cache operations".into(),
            &["name", "op"],
        );
        let gclock_memory_usage = registry.register_gauge_vec(
            "gclock_memory_usage".into(),
            "gclock in-memory cache live entries".into(),
            &["name"],
        );

        let op = |op: &'static str| gclock_memory_op_total.counter(&[name.clone(), op.into()]);

        Self {
            memory_insert: op("insert"),
            memory_replace: op("replace"),
            memory_hit: op("hit"),
            memory_miss: op("miss"),
            memory_remove: op("remove"),
            memory_evict: op("evict"),
            memory_usage: gclock_memory_usage.gauge(&[name.clone()]),
        }
    }

    /// Build noop metrics.
    ///
    /// Note: `noop` is only supposed to be called by other gclock components.
    #[doc(hidden)]
    pub fn noop() -> Self {
        use super::registry::noop::NoopMetricsRegistry;

        Self::new("test", &NoopMetricsRegistry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::registry::noop::NoopMetricsRegistry;

    fn case(registry: &impl RegistryOps) {
        let m = Metrics::new("test", registry);
        m.memory_insert.increase(1);
        m.memory_hit.increase(2);
        m.memory_usage.increase(1);
        m.memory_usage.decrease(1);
    }

    #[test]
    fn test_metrics_noop() {
        case(&NoopMetricsRegistry);
    }

    #[cfg(feature = "prometheus")]
    #[test]
    fn test_metrics_prometheus() {
        use crate::metrics::registry::prometheus::PrometheusMetricsRegistry;

        let registry = prometheus::Registry::new();
        case(&PrometheusMetricsRegistry::new(registry.clone()));

        assert_eq!(registry.gather().len(), 2);
        let text = prometheus::TextEncoder::new()
            .encode_to_string(&registry.gather())
            .unwrap();
        assert!(text.contains(r#"gclock_memory_op_total{name="test",op="hit"} 2"#));
    }
}
