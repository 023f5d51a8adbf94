//! Coarse visited-set deduplication (spec §4.9): states are deduped on
//! a lossy key, not full equality, trading missed revisits for a
//! tractable search space.

use std::collections::HashMap;

use crate::candidates::CapabilityKey;
use crate::state::GameState;

/// A coarse fingerprint: capability key, a bucketed goal-progress value,
/// and inventory fullness bucket. States colliding on this key are
/// treated as the same for dedup purposes even if not literally equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisitedKey {
    capability: CapabilityKey,
    progress_bucket: i64,
    inventory_bucket: u8,
}

impl VisitedKey {
    pub fn compute(state: &GameState, progress: f64, progress_bucket_width: f64) -> Self {
        VisitedKey {
            capability: CapabilityKey::compute(state),
            progress_bucket: (progress / progress_bucket_width.max(1.0)).floor() as i64,
            inventory_bucket: (state.inventory.fraction_full() * 10.0).floor() as u8,
        }
    }
}

#[derive(Debug, Default)]
pub struct VisitedSet {
    best_ticks: HashMap<VisitedKey, u64>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` and records `ticks_so_far` if `key` is unseen or
    /// this path reaches it in fewer ticks than any prior visit.
    pub fn should_expand(&mut self, key: VisitedKey, ticks_so_far: u64) -> bool {
        match self.best_ticks.get(&key) {
            Some(&best) if best <= ticks_so_far => false,
            _ => {
                self.best_ticks.insert(key, ticks_so_far);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.best_ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best_ticks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_worse_visit_to_same_bucket_is_rejected() {
        let mut visited = VisitedSet::new();
        let state = GameState::new(10, 10);
        let key = VisitedKey::compute(&state, 10.0, 5.0);
        assert!(visited.should_expand(key, 100));
        assert!(!visited.should_expand(key, 200));
    }

    #[test]
    fn better_visit_to_same_bucket_is_accepted() {
        let mut visited = VisitedSet::new();
        let state = GameState::new(10, 10);
        let key = VisitedKey::compute(&state, 10.0, 5.0);
        assert!(visited.should_expand(key, 200));
        assert!(visited.should_expand(key, 50));
    }
}
