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

use std::{
    fmt::Display,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use hdrhistogram::Histogram;
use parking_lot::Mutex;

/// Significant figures kept by the latency histograms.
const SIGFIG: u8 = 3;

#[derive(Debug)]
pub struct Metrics {
    pub gets: AtomicU64,
    pub hits: AtomicU64,
    pub puts: AtomicU64,
    pub evictions: AtomicU64,

    pub get_lats: Mutex<Histogram<u64>>,
    pub put_lats: Mutex<Histogram<u64>>,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            gets: AtomicU64::default(),
            hits: AtomicU64::default(),
            puts: AtomicU64::default(),
            evictions: AtomicU64::default(),
            get_lats: Mutex::new(Histogram::new(SIGFIG)?),
            put_lats: Mutex::new(Histogram::new(SIGFIG)?),
        })
    }

    /// Empty histograms configured like the shared ones, for thread-local recording.
    pub fn local_histograms(&self) -> (Histogram<u64>, Histogram<u64>) {
        (
            Histogram::new_from(&*self.get_lats.lock()),
            Histogram::new_from(&*self.put_lats.lock()),
        )
    }

    pub fn dump(&self) -> MetricsDump {
        MetricsDump {
            gets: self.gets.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsDump {
    pub gets: u64,
    pub hits: u64,
    pub puts: u64,
    pub evictions: u64,
}

#[derive(Debug)]
pub struct Latency {
    p50: u64,
    p90: u64,
    p99: u64,
    max: u64,
}

impl Latency {
    fn new(histogram: &Histogram<u64>) -> Self {
        Self {
            p50: histogram.value_at_quantile(0.5),
            p90: histogram.value_at_quantile(0.9),
            p99: histogram.value_at_quantile(0.99),
            max: histogram.max(),
        }
    }
}

impl Display for Latency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "p50: {}ns, p90: {}ns, p99: {}ns, max: {}ns",
            self.p50, self.p90, self.p99, self.max
        )
    }
}

#[derive(Debug)]
pub struct Analysis {
    elapsed: Duration,
    ops: f64,
    gets: f64,
    puts: f64,
    evictions: f64,
    hit_ratio: f64,
    get_lat: Option<Latency>,
    put_lat: Option<Latency>,
}

pub fn analyze(elapsed: Duration, start: &MetricsDump, end: &MetricsDump, metrics: Option<&Metrics>) -> Analysis {
    let secs = elapsed.as_secs_f64().max(f64::EPSILON);
    let gets = end.gets - start.gets;
    let hits = end.hits - start.hits;
    let puts = end.puts - start.puts;
    let evictions = end.evictions - start.evictions;

    Analysis {
        elapsed,
        ops: (gets + puts) as f64 / secs,
        gets: gets as f64 / secs,
        puts: puts as f64 / secs,
        evictions: evictions as f64 / secs,
        hit_ratio: if gets == 0 { 0.0 } else { hits as f64 / gets as f64 },
        get_lat: metrics.map(|m| Latency::new(&m.get_lats.lock())),
        put_lat: metrics.map(|m| Latency::new(&m.put_lats.lock())),
    }
}

impl Display for Analysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "elapsed: {:.3?}", self.elapsed)?;
        writeln!(f, "ops/s: {:.0}", self.ops)?;
        writeln!(f, "gets/s: {:.0}", self.gets)?;
        writeln!(f, "puts/s: {:.0}", self.puts)?;
        writeln!(f, "evictions/s: {:.0}", self.evictions)?;
        write!(f, "hit ratio: {:.2}%", self.hit_ratio * 100.0)?;
        if let Some(lat) = &self.get_lat {
            write!(f, "\nget latency: {lat}")?;
        }
        if let Some(lat) = &self.put_lat {
            write!(f, "\nput latency: {lat}")?;
        }
        Ok(())
    }
}
