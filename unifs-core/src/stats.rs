//! Lifecycle counters for a provider.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters updated by the provider as instances are opened, reused and closed.
#[derive(Debug, Default)]
pub struct ProviderStats {
    /// Instances successfully constructed by the backend
    constructed: AtomicU64,

    /// Requests answered from the registry without construction
    reused: AtomicU64,

    /// Instances removed from the registry
    closed: AtomicU64,

    /// Backend construction attempts that failed
    failed: AtomicU64,
}

impl ProviderStats {
    /// Creates a new ProviderStats instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_constructed(&self) {
        self.constructed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reused(&self) {
        self.reused.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_closed(&self) {
        self.closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of the counters.
    pub fn snapshot(&self, open: usize) -> StatsSnapshot {
        StatsSnapshot {
            constructed: self.constructed.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            closed: self.closed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            open,
        }
    }
}

/// A copy of [`ProviderStats`] plus the number of currently open instances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub constructed: u64,
    pub reused: u64,
    pub closed: u64,
    pub failed: u64,
    pub open: usize,
}

impl StatsSnapshot {
    /// Fraction of requests served from the registry (0.0 to 1.0).
    pub fn reuse_ratio(&self) -> f64 {
        let total = self.constructed + self.reused;
        if total == 0 {
            0.0
        } else {
            self.reused as f64 / total as f64
        }
    }
}
