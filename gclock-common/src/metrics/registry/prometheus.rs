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

use std::{borrow::Cow, collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use prometheus::{IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};

use crate::metrics::{
    registry::noop::NoopMetricsRegistry,
    BoxedCounter, BoxedCounterVec, BoxedGauge, BoxedGaugeVec, Boxer, CounterOps, CounterVecOps, GaugeOps,
    GaugeVecOps, RegistryOps,
};

impl CounterOps for IntCounter {
    fn increase(&self, val: u64) {
        self.inc_by(val);
    }
}

impl CounterVecOps for IntCounterVec {
    fn counter(&self, labels: &[Cow<'static, str>]) -> BoxedCounter {
        let labels = labels.iter().map(Cow::as_ref).collect::<Vec<_>>();
        self.with_label_values(&labels).boxed()
    }
}

impl GaugeOps for IntGauge {
    fn increase(&self, val: u64) {
        self.add(val as _);
    }

    fn decrease(&self, val: u64) {
        self.sub(val as _);
    }

    fn absolute(&self, val: u64) {
        self.set(val as _);
    }
}

impl GaugeVecOps for IntGaugeVec {
    fn gauge(&self, labels: &[Cow<'static, str>]) -> BoxedGauge {
        let labels = labels.iter().map(Cow::as_ref).collect::<Vec<_>>();
        self.with_label_values(&labels).boxed()
    }
}

#[derive(Debug, Clone)]
enum MetricVec {
    Counter(IntCounterVec),
    Gauge(IntGaugeVec),
}

/// Prometheus metric registry with lib `prometheus`.
///
/// The [`PrometheusMetricsRegistry`] can be cloned and shared by multiple caches. Each metric vector is registered
/// to the underlying [`Registry`] only once; later registrations with the same name reuse it.
#[derive(Debug, Clone)]
pub struct PrometheusMetricsRegistry {
    registry: Registry,
    vecs: Arc<Mutex<HashMap<Cow<'static, str>, MetricVec>>>,
}

impl PrometheusMetricsRegistry {
    /// Create an Prometheus metrics registry.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            vecs: Arc::default(),
        }
    }

    /// Get the wrapped prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn get_or_register(
        &self,
        name: Cow<'static, str>,
        create: impl FnOnce() -> prometheus::Result<MetricVec>,
    ) -> Option<MetricVec> {
        let mut vecs = self.vecs.lock();
        if let Some(vec) = vecs.get(&name) {
            return Some(vec.clone());
        }
        let res = create().and_then(|vec| {
            match &vec {
                MetricVec::Counter(v) => self.registry.register(Box::new(v.clone()))?,
                MetricVec::Gauge(v) => self.registry.register(Box::new(v.clone()))?,
            }
            Ok(vec)
        });
        match res {
            Ok(vec) => {
                vecs.insert(name, vec.clone());
                Some(vec)
            }
            Err(e) => {
                tracing::warn!("[prometheus]: register metric vector {name} failed, fallback to noop: {e}");
                None
            }
        }
    }
}

impl RegistryOps for PrometheusMetricsRegistry {
    fn register_counter_vec(
        &self,
        name: Cow<'static, str>,
        desc: Cow<'static, str>,
        label_names: &'static [&'static str],
    ) -> BoxedCounterVec {
        let opts = Opts::new(name.as_ref(), desc.as_ref());
        match self.get_or_register(name, || IntCounterVec::new(opts, label_names).map(MetricVec::Counter)) {
            Some(MetricVec::Counter(v)) => v.boxed(),
            _ => NoopMetricsRegistry.boxed(),
        }
    }

    fn register_gauge_vec(
        &self,
        name: Cow<'static, str>,
        desc: Cow<'static, str>,
        label_names: &'static [&'static str],
    ) -> BoxedGaugeVec {
        let opts = Opts::new(name.as_ref(), desc.as_ref());
        match self.get_or_register(name, || IntGaugeVec::new(opts, label_names).map(MetricVec::Gauge)) {
            Some(MetricVec::Gauge(v)) => v.boxed(),
            _ => NoopMetricsRegistry.boxed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(registry: &PrometheusMetricsRegistry) {
        let cv = registry.register_counter_vec("test_counter_1".into(), "test counter 1".into(), &["label1", "label2"]);
        let c = cv.counter(&["l1".into(), "l2".into()]);
        c.increase(42);

        let gv = registry.register_gauge_vec("test_gauge_1".into(), "test gauge 1".into(), &["label1", "label2"]);
        let g = gv.gauge(&["l1".into(), "l2".into()]);
        g.increase(514);
        g.decrease(114);
        g.absolute(114514);
    }

    #[test]
    fn test_prometheus_metrics_registry() {
        let p8s = PrometheusMetricsRegistry::new(Registry::new());
        case(&p8s);
        assert_eq!(p8s.registry().gather().len(), 2);
    }

    #[test]
    fn test_shared_prometheus_metrics_registry() {
        let p8s1 = PrometheusMetricsRegistry::new(Registry::new());
        let p8s2 = p8s1.clone();
        case(&p8s1);
        case(&p8s2);
        assert_eq!(p8s1.registry().gather().len(), 2);
    }

    #[test]
    fn test_prometheus_type_clash_falls_back_to_noop() {
        let p8s = PrometheusMetricsRegistry::new(Registry::new());
        let _ = p8s.register_counter_vec("clash".into(), "clash".into(), &["label"]);
        let gv = p8s.register_gauge_vec("clash".into(), "clash".into(), &["label"]);
        gv.gauge(&["l".into()]).absolute(1);
        assert_eq!(p8s.registry().gather().len(), 1);
    }
}
