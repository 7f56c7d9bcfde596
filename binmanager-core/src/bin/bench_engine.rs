//! # Engine Benchmark Harness
//!
//! Purpose: provide a dependency-free, repeatable benchmark driver for the
//! bin-placement engine so baseline throughput for lookups, membership
//! churn, and snapshot round-trips can be compared over time.
//!
//! ## Design Principles
//! 1. **Deterministic Workload**: use a fixed PRNG seed for stable comparisons.
//! 2. **Allocation Control**: pre-build location ids and hashes to keep setup
//!    costs off the hot path.
//! 3. **Zero-Cost Dispatch**: call the concrete `Engine<SystemClock>` directly.

use std::env;
use std::hint::black_box;
use std::time::Instant;

use binmanager_common::{LocationId, SystemClock, UtcInstant};
use binmanager_core::Engine;

const DEFAULT_LOCATION_COUNT: usize = 256;
const DEFAULT_LOOKUP_COUNT: usize = 1_000_000;
const DEFAULT_CHURN_COUNT: usize = 1_000;
const DEFAULT_K: u32 = 3;

struct BenchConfig {
    location_count: usize,
    lookup_count: usize,
    churn_count: usize,
    k: u32,
}

impl BenchConfig {
    fn from_args() -> Self {
        let mut args = env::args().skip(1);
        BenchConfig {
            location_count: parse_usize(args.next(), DEFAULT_LOCATION_COUNT),
            lookup_count: parse_usize(args.next(), DEFAULT_LOOKUP_COUNT),
            churn_count: parse_usize(args.next(), DEFAULT_CHURN_COUNT),
            k: parse_usize(args.next(), DEFAULT_K as usize) as u32,
        }
    }
}

fn parse_usize(value: Option<String>, fallback: usize) -> usize {
    value.and_then(|raw| raw.parse().ok()).unwrap_or(fallback)
}

/// Tiny deterministic PRNG used to avoid external dependencies.
///
/// XorShift is fast enough for benchmarks and keeps the workload reproducible.
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

fn build_locations(count: usize) -> Vec<LocationId> {
    (0..count).map(|i| LocationId::from(i.to_string())).collect()
}

fn build_hashes(count: usize, seed: u64) -> Vec<[u8; 2]> {
    let mut rng = XorShift64::new(seed);
    (0..count)
        .map(|_| {
            let v = rng.next_u64();
            [(v & 0xFF) as u8, ((v >> 8) & 0xFF) as u8]
        })
        .collect()
}

fn report(label: &str, ops: usize, elapsed: std::time::Duration) {
    let secs = elapsed.as_secs_f64();
    let ops_per_sec = (ops as f64) / secs;
    let nanos_per_op = (secs * 1e9) / (ops as f64);
    println!(
        "{label}: {ops} ops in {secs:.3}s ({ops_per_sec:.0} ops/s, {nanos_per_op:.1} ns/op)"
    );
}

fn main() {
    let config = BenchConfig::from_args();
    let locations = build_locations(config.location_count);
    let mut engine = Engine::new(config.k, locations.clone(), SystemClock);

    println!(
        "locations={}, lookups={}, churn={}, k={}",
        config.location_count, config.lookup_count, config.churn_count, config.k
    );

    let hashes = build_hashes(config.lookup_count, 0xA5A5_A5A5_A5A5_A5A5);
    let start = Instant::now();
    for hash in &hashes {
        let result = engine.lookup(hash);
        black_box(result);
    }
    report("LOOKUP", config.lookup_count, start.elapsed());

    let churn_ids: Vec<LocationId> = (0..config.churn_count)
        .map(|i| LocationId::from(format!("churn-{i}")))
        .collect();
    let start = Instant::now();
    for id in &churn_ids {
        engine.add_location(id.clone());
    }
    for id in &churn_ids {
        engine.remove_location(id);
    }
    report("ADD+REMOVE", config.churn_count * 2, start.elapsed());

    let start = Instant::now();
    let snapshot = engine.snapshot();
    let bytes = snapshot.encode();
    report("SNAPSHOT_ENCODE", 1, start.elapsed());
    println!("snapshot size: {} bytes", bytes.len());

    engine.prune(UtcInstant::from_ticks(i64::MAX));
    let metrics = engine.metrics_snapshot();
    println!("{metrics:?}");
}
