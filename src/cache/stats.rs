//! Layer Statistics Module
//!
//! Tracks how often an in-memory layer answered locally versus delegated downstream.

use serde::Serialize;

// == Layer Stats ==
/// Tracks layer activity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayerStats {
    /// Lookups answered from local storage
    pub hits: u64,
    /// Lookups that had to consult the write-through layer
    pub misses: u64,
    /// Values cached locally after being resolved downstream
    pub fills: u64,
    /// Calls to `remove` (forwarded invalidations)
    pub removals: u64,
    /// Calls to `flush`
    pub flushes: u64,
    /// Current number of entries in the layer
    pub total_entries: usize,
}

impl LayerStats {
    // == Constructor ==
    /// Creates a new LayerStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Number of lookups the layer has served, local or not.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_fill(&mut self) {
        self.fills += 1;
    }

    pub fn record_removal(&mut self) {
        self.removals += 1;
    }

    pub fn record_flush(&mut self) {
        self.flushes += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
