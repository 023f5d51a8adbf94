//! Per-solve caches (spec §4.5, §5): rate estimates and candidate sets
//! are both expensive enough to memoize across the many near-identical
//! states a single search visits, and both must be cleared at the start
//! of every `solve()` call since they key off capability, not identity.

use std::collections::HashMap;

use crate::candidates::CandidateCache;
use crate::rates::{RateEstimator, Rates};
use crate::registries::Registries;
use crate::state::GameState;
use crate::types::ActionId;

/// Rates depend only on the active action, its selected recipe, and the
/// aggregated shop duration modifier for its skill -- not on the rest of
/// the state -- so this key is exact, unlike `CapabilityKey`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RateCacheKey {
    action: ActionId,
    recipe: Option<u16>,
    duration_modifier_bucket: i64,
}

impl RateCacheKey {
    fn compute(state: &GameState, registries: &Registries) -> Option<Self> {
        let active = state.active_action?;
        let action = registries.actions.by_id(active.id)?;
        let modifier = crate::rates::aggregated_duration_modifier(state, registries, action.skill);
        Some(RateCacheKey {
            action: active.id,
            recipe: state.action_state(active.id).recipe,
            duration_modifier_bucket: (modifier * 1000.0).round() as i64,
        })
    }
}

#[derive(Debug, Default)]
pub struct RateCache {
    entries: HashMap<RateCacheKey, Rates>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn estimate(&mut self, state: &GameState, registries: &Registries) -> Rates {
        self.estimate_tracked(state, registries).0
    }

    /// Same as `estimate`, additionally reporting whether the rates came
    /// from the cache -- used by the instrumented solve to populate
    /// `SolveProfile::rate_cache` (spec §4.13).
    pub fn estimate_tracked(&mut self, state: &GameState, registries: &Registries) -> (Rates, bool) {
        match RateCacheKey::compute(state, registries) {
            Some(key) => {
                if let Some(hit) = self.entries.get(&key) {
                    (hit.clone(), true)
                } else {
                    let fresh = RateEstimator::estimate(state, registries);
                    self.entries.insert(key, fresh.clone());
                    (fresh, false)
                }
            }
            None => (RateEstimator::estimate(state, registries), false),
        }
    }
}

/// Bundles every per-solve cache so `solve()` has one thing to clear at
/// entry (spec §5: "per-solve caches cleared at solve() entry").
#[derive(Debug, Default)]
pub struct SolverCaches {
    pub candidates: CandidateCache,
    pub rates: RateCache,
}

impl SolverCaches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
        self.rates.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registries::{Action, ActionRegistry, ItemRegistry, Recipe, ShopRegistry};
    use crate::state::ActiveAction;
    use crate::types::Skill;

    fn registries() -> Registries {
        let action = Action {
            id: ActionId::new(0, 1),
            skill: Skill::Woodcutting,
            unlock_level: 1,
            mean_duration_ticks: 5.0,
            xp: 10.0,
            mastery_xp: 1.0,
            outputs: vec![(crate::types::ItemId::new(1, 1), 1)],
            recipes: vec![Recipe { id: 0, inputs: vec![] }],
            is_skill_action: true,
            thieving: None,
        };
        Registries::new(
            ActionRegistry::build(vec![action]),
            ItemRegistry::build(vec![]),
            ShopRegistry::build(vec![]),
        )
    }

    #[test]
    fn cached_estimate_matches_fresh_estimate() {
        let registries = registries();
        let mut state = GameState::new(10, 10);
        state.active_action = Some(ActiveAction {
            id: ActionId::new(0, 1),
            remaining_ticks: 100,
            total_ticks: 100,
            stunned: false,
        });
        let mut cache = RateCache::new();
        let cached = cache.estimate(&state, &registries);
        let fresh = RateEstimator::estimate(&state, &registries);
        assert_eq!(cached, fresh);
        assert_eq!(cache.entries.len(), 1);
    }

    #[test]
    fn clear_empties_both_caches() {
        let mut caches = SolverCaches::new();
        caches.rates.entries.insert(
            RateCacheKey {
                action: ActionId::new(0, 1),
                recipe: None,
                duration_modifier_bucket: 0,
            },
            Rates::zero(),
        );
        caches.clear();
        assert!(caches.rates.entries.is_empty());
    }
}
