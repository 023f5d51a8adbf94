//! Search diagnostics (spec §4.13): node counts, cache hit rates, and
//! per-component timings, collected by an instrumented solve and
//! surfaced for the `profile_solve` binary.

use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DominanceStats {
    pub nodes_pushed: u64,
    pub nodes_pruned: u64,
}

impl DominanceStats {
    pub fn prune_rate(&self) -> f64 {
        let total = self.nodes_pushed + self.nodes_pruned;
        if total == 0 {
            0.0
        } else {
            self.nodes_pruned as f64 / total as f64
        }
    }
}

/// Aggregate diagnostics for one `solve()` run. Populated by an
/// instrumented call path (spec §4.13); the plain `search::solve` stays
/// allocation-light and does not collect these by default.
#[derive(Debug, Clone, Default)]
pub struct SolveProfile {
    pub nodes_expanded: u64,
    pub candidate_cache: CacheStats,
    pub rate_cache: CacheStats,
    pub dominance: DominanceStats,
    pub wall_time: Option<Duration>,
}

impl SolveProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> String {
        format!(
            "expanded={} candidate_cache_hit_rate={:.2} rate_cache_hit_rate={:.2} prune_rate={:.2} wall_time={:?}",
            self.nodes_expanded,
            self.candidate_cache.hit_rate(),
            self.rate_cache.hit_rate(),
            self.dominance.prune_rate(),
            self.wall_time,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_is_zero_with_no_samples() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn hit_rate_reflects_recorded_hits_and_misses() {
        let mut stats = CacheStats::default();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert!((stats.hit_rate() - (2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn summary_includes_every_metric() {
        let profile = SolveProfile::new();
        let summary = profile.summary();
        assert!(summary.contains("expanded="));
        assert!(summary.contains("prune_rate="));
    }
}
