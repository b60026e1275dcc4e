// Copyright 2025 eraflo
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

//! Per-pool checkout/return statistics.
//!
//! Counters are instance-scoped, not process-wide: every pool owns its own
//! set, so lifetimes stay explicit and tests stay isolated. All counters
//! are read with `Ordering::Relaxed`; they are monitoring data, not
//! synchronization.

use std::sync::atomic::{AtomicU64, Ordering};

/// Raw atomic counters owned by one pool.
#[derive(Debug, Default)]
pub(crate) struct PoolStats {
    checkouts: AtomicU64,
    ready_hits: AtomicU64,
    coalesced_waits: AtomicU64,
    constructions: AtomicU64,
    construction_failures: AtomicU64,
    disposals: AtomicU64,
    dispose_failures: AtomicU64,
}

impl PoolStats {
    pub(crate) fn record_checkout(&self) {
        self.checkouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ready_hit(&self) {
        self.ready_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_coalesced_wait(&self) {
        self.coalesced_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_construction(&self) {
        self.constructions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_construction_failure(&self) {
        self.construction_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_disposal(&self) {
        self.disposals.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispose_failure(&self) {
        self.dispose_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a snapshot of all counters and populates the derived metrics.
    pub(crate) fn snapshot(&self) -> PoolStatsSnapshot {
        let mut snapshot = PoolStatsSnapshot {
            checkouts: self.checkouts.load(Ordering::Relaxed),
            ready_hits: self.ready_hits.load(Ordering::Relaxed),
            coalesced_waits: self.coalesced_waits.load(Ordering::Relaxed),
            constructions: self.constructions.load(Ordering::Relaxed),
            construction_failures: self.construction_failures.load(Ordering::Relaxed),
            disposals: self.disposals.load(Ordering::Relaxed),
            dispose_failures: self.dispose_failures.load(Ordering::Relaxed),
            ..Default::default()
        };
        snapshot.calculate_derived_metrics();
        snapshot
    }
}

/// A snapshot of one pool's lifetime statistics, including derived metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolStatsSnapshot {
    /// Total checkout calls served.
    pub checkouts: u64,
    /// Checkouts satisfied immediately from a `Ready` entry.
    pub ready_hits: u64,
    /// Checkouts that joined an already in-flight construction episode.
    pub coalesced_waits: u64,
    /// Construction episodes started (factory invocations).
    pub constructions: u64,
    /// Construction episodes that failed.
    pub construction_failures: u64,
    /// Entries disposed after their last reference was returned.
    pub disposals: u64,
    /// Disposals whose release callback reported a failure.
    pub dispose_failures: u64,

    // --- Calculated Metrics ---
    /// Checkouts that did not start a construction (`ready_hits` +
    /// `coalesced_waits`).
    pub deduplicated: u64,
    /// The fraction of checkouts served without a new construction
    /// (`deduplicated` / `checkouts`).
    pub dedup_ratio: f64,
}

impl PoolStatsSnapshot {
    /// Populates the derived metrics based on the raw counter values.
    pub fn calculate_derived_metrics(&mut self) {
        self.deduplicated = self.ready_hits + self.coalesced_waits;
        if self.checkouts > 0 {
            self.dedup_ratio = self.deduplicated as f64 / self.checkouts as f64;
        }
    }
}
