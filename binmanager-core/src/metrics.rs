//! # Engine Metrics
//!
//! Lightweight atomic counters for the engine's mutating operations,
//! patterned directly on `hkv-server`'s `Metrics` accumulator: plain
//! `AtomicU64` fields, `Ordering::Relaxed` everywhere because callers only
//! need eventual-consistency totals, not cross-field ordering, and a
//! `snapshot()` that copies out a plain struct with no heap work on the
//! hot path.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of all engine counters at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub locations_added: u64,
    pub locations_removed: u64,
    pub rebalance_moves: u64,
    pub assignments_pruned: u64,
    pub prune_calls: u64,
}

/// Thread-naive (the engine itself is single-threaded) but still atomic
/// accumulator, so a caller that wraps the engine behind its own lock can
/// still read counters without taking that lock.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    locations_added: AtomicU64,
    locations_removed: AtomicU64,
    rebalance_moves: AtomicU64,
    assignments_pruned: AtomicU64,
    prune_calls: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        EngineMetrics::default()
    }

    pub fn record_location_added(&self) {
        self.locations_added.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_location_removed(&self) {
        self.locations_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rebalance_move(&self) {
        self.rebalance_moves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prune(&self, pruned: u64) {
        self.prune_calls.fetch_add(1, Ordering::Relaxed);
        self.assignments_pruned.fetch_add(pruned, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            locations_added: self.locations_added.load(Ordering::Relaxed),
            locations_removed: self.locations_removed.load(Ordering::Relaxed),
            rebalance_moves: self.rebalance_moves.load(Ordering::Relaxed),
            assignments_pruned: self.assignments_pruned.load(Ordering::Relaxed),
            prune_calls: self.prune_calls.load(Ordering::Relaxed),
        }
    }
}
