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

//! A load generator for the gclock cache.
//!
//! Worker threads hammer a shared cache with a configurable mix of lookups and insertions over a uniform or zipf key
//! distribution. Lookups that miss insert the key afterwards, like a cache-aside client would.

mod analyze;

use std::{
    sync::{atomic::Ordering, Arc},
    thread,
    time::{Duration, Instant},
};

use analyze::{analyze, Metrics};
use clap::{Parser, ValueEnum};
use gclock::{CacheBuilder, ClockCache, PrometheusMetricsRegistry};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rand_distr::{Distribution, Zipf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KeyDistribution {
    Uniform,
    Zipf,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
struct Args {
    /// Cache capacity, in entries.
    #[arg(short, long, default_value_t = 100_000)]
    capacity: usize,

    /// Reprieves granted to a slot on insertion and on every hit.
    #[arg(long, default_value_t = 1)]
    clock_count: u8,

    /// Worker threads.
    #[arg(short, long, default_value_t = 8)]
    threads: usize,

    /// Total bench duration.
    #[arg(long, default_value = "10s")]
    time: humantime::Duration,

    /// Interval between progress reports.
    #[arg(long, default_value = "2s")]
    report_interval: humantime::Duration,

    /// Key space size.
    #[arg(short, long, default_value_t = 1_000_000)]
    keys: u64,

    /// Key distribution.
    #[arg(long, value_enum, default_value_t = KeyDistribution::Zipf)]
    distribution: KeyDistribution,

    /// Zipf exponent, only used with `--distribution zipf`.
    #[arg(long, default_value_t = 0.9)]
    zipf_s: f64,

    /// Ratio of operations that are blind insertions instead of lookups.
    #[arg(long, default_value_t = 0.1)]
    put_ratio: f64,

    /// Value size in bytes.
    #[arg(long, default_value_t = 64)]
    value_size: usize,

    /// Seed of the per-thread random generators.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Print the cache's prometheus metrics after the bench.
    #[arg(long, default_value_t = false)]
    metrics: bool,
}

type Value = Arc<[u8]>;

fn init_logger() {
    use tracing_subscriber::{prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_line_number(true))
        .with(EnvFilter::from_default_env())
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logger();

    #[cfg(feature = "deadlock")]
    {
        thread::spawn(move || loop {
            thread::sleep(Duration::from_secs(1));
            let deadlocks = parking_lot::deadlock::check_deadlock();
            if deadlocks.is_empty() {
                continue;
            }

            println!("{} deadlocks detected", deadlocks.len());
            for (i, threads) in deadlocks.iter().enumerate() {
                println!("Deadlock #{}", i);
                for t in threads {
                    println!("Thread Id {:#?}", t.thread_id());
                    println!("{:#?}", t.backtrace());
                }
            }
            panic!()
        });
    }

    let args = Args::parse();
    println!("{:#?}", args);
    anyhow::ensure!(args.keys > 0, "\"--keys\" value must be greater than 0");
    anyhow::ensure!(
        (0.0..=1.0).contains(&args.put_ratio),
        "\"--put-ratio\" value must be in [0, 1]"
    );
    if args.distribution == KeyDistribution::Zipf {
        // Validate the parameters once before spawning workers.
        Zipf::new(args.keys as f64, args.zipf_s)?;
    }

    let metrics = Arc::new(Metrics::new()?);
    let registry = prometheus::Registry::new();

    let mut builder = CacheBuilder::new(args.capacity)
        .with_clock_count(args.clock_count)
        .with_on_evict({
            let metrics = metrics.clone();
            move |_: u64, _: Value| {
                metrics.evictions.fetch_add(1, Ordering::Relaxed);
            }
        });
    if args.metrics {
        builder = builder.with_metrics_registry("bench", &PrometheusMetricsRegistry::new(registry.clone()));
    }
    let cache = builder.build()?;
    tracing::info!("[bench]: cache ready: {cache:?}");

    let start = Instant::now();
    let deadline = start + Duration::from(args.time);
    let dump_start = metrics.dump();

    let workers = (0..args.threads)
        .map(|id| {
            let cache = cache.clone();
            let metrics = metrics.clone();
            let args = args.clone();
            thread::Builder::new()
                .name(format!("gclock-bench-{id}"))
                .spawn(move || bench(id as u64, args, cache, metrics, deadline))
        })
        .collect::<std::io::Result<Vec<_>>>()?;

    let interval = Duration::from(args.report_interval);
    let mut last = metrics.dump();
    while Instant::now() < deadline {
        thread::sleep(interval.min(deadline.saturating_duration_since(Instant::now())));
        let now = metrics.dump();
        println!("\n{}", analyze(interval, &last, &now, None));
        last = now;
    }

    for worker in workers {
        if worker.join().is_err() {
            anyhow::bail!("bench worker panicked");
        }
    }

    let analysis = analyze(start.elapsed(), &dump_start, &metrics.dump(), Some(&metrics));
    println!("\nTotal:\n{analysis}");

    if args.metrics {
        let text = prometheus::TextEncoder::new().encode_to_string(&registry.gather())?;
        println!("\nMetrics:\n{text}");
    }

    Ok(())
}

fn bench(id: u64, args: Args, cache: ClockCache<u64, Value>, metrics: Arc<Metrics>, deadline: Instant) {
    let mut rng = SmallRng::seed_from_u64(args.seed.wrapping_add(id));
    let zipf = match args.distribution {
        KeyDistribution::Zipf => Zipf::new(args.keys as f64, args.zipf_s).ok(),
        KeyDistribution::Uniform => None,
    };
    let value: Value = vec![id as u8; args.value_size].into();

    let (mut get_lats, mut put_lats) = metrics.local_histograms();
    let (mut gets, mut hits, mut puts) = (0u64, 0u64, 0u64);

    const BATCH: u64 = 1024;

    for n in 1.. {
        // Zipf samples lie in `[1, keys]`.
        let key = match &zipf {
            Some(zipf) => zipf.sample(&mut rng) as u64 - 1,
            None => rng.random_range(0..args.keys),
        };

        if rng.random_bool(args.put_ratio) {
            let time = Instant::now();
            cache.put(key, value.clone());
            let _ = put_lats.record(time.elapsed().as_nanos() as u64);
            puts += 1;
        } else {
            let time = Instant::now();
            let hit = cache.get(&key).is_some();
            let _ = get_lats.record(time.elapsed().as_nanos() as u64);
            gets += 1;
            if hit {
                hits += 1;
            } else {
                let time = Instant::now();
                cache.put(key, value.clone());
                let _ = put_lats.record(time.elapsed().as_nanos() as u64);
                puts += 1;
            }
        }

        if n % BATCH == 0 {
            metrics.gets.fetch_add(std::mem::take(&mut gets), Ordering::Relaxed);
            metrics.hits.fetch_add(std::mem::take(&mut hits), Ordering::Relaxed);
            metrics.puts.fetch_add(std::mem::take(&mut puts), Ordering::Relaxed);
            if Instant::now() >= deadline {
                break;
            }
        }
    }

    metrics.gets.fetch_add(gets, Ordering::Relaxed);
    metrics.hits.fetch_add(hits, Ordering::Relaxed);
    metrics.puts.fetch_add(puts, Ordering::Relaxed);

    if let Err(e) = metrics.get_lats.lock().add(&get_lats) {
        tracing::error!("[bench]: merge get latency histogram error: {e}");
    }
    if let Err(e) = metrics.put_lats.lock().add(&put_lats) {
        tracing::error!("[bench]: merge put latency histogram error: {e}");
    }
    tracing::debug!("[bench]: worker {id} exit");
}
