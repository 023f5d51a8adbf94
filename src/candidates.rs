//! Candidate enumeration (spec §4.5): the set of moves the search
//! considers from a given state, ranked by how well they serve the
//! active goal.

use std::collections::HashMap;

use rand::Rng;

use crate::goal::Goal;
use crate::rates::RateEstimator;
use crate::registries::Registries;
use crate::sell_policy::SellPolicySpec;
use crate::state::GameState;
use crate::types::{ActionId, ShopPurchaseId, Skill};
use crate::watch::WatchSet;

/// A single move the planner may take from a state.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    SwitchActivity { action: ActionId, recipe: Option<u16> },
    BuyUpgrade { purchase: ShopPurchaseId },
    Sell,
}

/// Packed, order-independent summary of "what this state can currently
/// do" used to key the candidate cache (spec §4.5, §5). Two states with
/// the same key produce the same candidate set *modulo inventory
/// contents*, since unlocks and owned upgrades are monotone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilityKey(u64);

impl CapabilityKey {
    /// Bit layout: low 56 bits are one bit per (skill, decile-of-level)
    /// bucket reached so far; top 8 bits are a saturating count of owned
    /// skill-upgrade purchases. Coarse by design -- collisions are
    /// resolved by the cache's superset check, not by this key alone.
    pub fn compute(state: &GameState) -> Self {
        let mut bits: u64 = 0;
        for (i, &skill) in Skill::ALL.iter().enumerate() {
            let decile = (state.skills.level(skill) / 10).min(9) as u64;
            bits |= decile << (i as u64 * 4);
        }
        let owned_upgrades: u64 = state.shop_state.values().filter(|&&n| n > 0).count() as u64;
        bits |= owned_upgrades.min(255) << 56;
        CapabilityKey(bits)
    }

    /// `true` if every capability bit set in `other` is also set here --
    /// i.e. this state can do at least everything `other` could.
    pub fn is_superset_of(&self, other: CapabilityKey) -> bool {
        (self.0 & other.0) == other.0
    }
}

/// Cached candidate sets keyed by `CapabilityKey`, with 1% sampled
/// re-verification against a fresh enumeration (spec §4.5: superset
/// reuse is an approximation, not a proof, so it is audited).
#[derive(Debug, Default)]
pub struct CandidateCache {
    entries: HashMap<CapabilityKey, Vec<Candidate>>,
}

impl CandidateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns a cached candidate list for `key`, or any cached entry
    /// keyed by a capability that `key` is a superset of (the larger
    /// capability set's candidates remain valid -- nothing unlocked is
    /// ever un-unlocked).
    pub fn get(&self, key: CapabilityKey) -> Option<&Vec<Candidate>> {
        if let Some(hit) = self.entries.get(&key) {
            return Some(hit);
        }
        self.entries
            .iter()
            .find(|(&cached_key, _)| key.is_superset_of(cached_key))
            .map(|(_, v)| v)
    }

    pub fn insert(&mut self, key: CapabilityKey, candidates: Vec<Candidate>) {
        self.entries.insert(key, candidates);
    }
}

/// Enumerates and ranks candidates for `state` under `goal`, consulting
/// (and populating) `cache`. `rng` drives the 1% sampled verification;
/// pass a fixed-seed RNG during planning to keep the audit deterministic.
pub fn enumerate(
    state: &GameState,
    goal: &Goal,
    registries: &Registries,
    watch: Option<&WatchSet>,
    cache: &mut CandidateCache,
    rng: &mut impl Rng,
) -> Vec<Candidate> {
    enumerate_tracked(state, goal, registries, watch, cache, rng).0
}

/// Same as `enumerate`, additionally reporting whether the candidate set
/// came from the cache -- used by the instrumented solve to populate
/// `SolveProfile::candidate_cache` (spec §4.13).
pub fn enumerate_tracked(
    state: &GameState,
    goal: &Goal,
    registries: &Registries,
    watch: Option<&WatchSet>,
    cache: &mut CandidateCache,
    rng: &mut impl Rng,
) -> (Vec<Candidate>, bool) {
    let key = CapabilityKey::compute(state);

    if let Some(cached) = cache.get(key) {
        let cached = cached.clone();
        if rng.gen_ratio(1, 100) {
            let fresh = enumerate_fresh(state, goal, registries, watch);
            if fresh != cached {
                log::warn!(
                    "candidate cache divergence for capability key {:?}: cached {} entries, fresh {} entries",
                    key,
                    cached.len(),
                    fresh.len()
                );
            }
        }
        return (cached, true);
    }

    let fresh = enumerate_fresh(state, goal, registries, watch);
    cache.insert(key, fresh.clone());
    (fresh, false)
}

/// Best `goal.activity_rate` score any currently-unlocked, non-combat
/// action of `skill` can achieve from `state` (spec §4.5: the rate a
/// prospective shop purchase must match or beat to be worth buying).
fn best_activity_rate(skill: Skill, state: &GameState, goal: &Goal, registries: &Registries) -> f64 {
    registries
        .actions
        .for_skill(skill)
        .filter(|action| action.unlock_level <= state.skills.level(skill) && !action.is_combat())
        .map(|action| {
            let mut probe = state.clone();
            probe.active_action = Some(crate::state::ActiveAction {
                id: action.id,
                remaining_ticks: u32::MAX,
                total_ticks: u32::MAX,
                stunned: false,
            });
            let rates = RateEstimator::estimate(&probe, registries);
            goal.activity_rate(skill, rates.currency_per_tick, rates.xp_per_tick)
        })
        .fold(0.0, f64::max)
}

fn enumerate_fresh(
    state: &GameState,
    goal: &Goal,
    registries: &Registries,
    watch: Option<&WatchSet>,
) -> Vec<Candidate> {
    let mut ranked: Vec<(f64, Candidate)> = Vec::new();

    for &skill in &Skill::ALL {
        for action in registries.actions.for_skill(skill) {
            if action.unlock_level > state.skills.level(skill) {
                continue;
            }
            if action.is_combat() {
                continue; // combat actions are not switch targets for the planner (spec §4.1)
            }
            let recipes: Vec<Option<u16>> = if action.recipes.is_empty() {
                vec![None]
            } else {
                action.recipes.iter().map(|r| Some(r.id)).collect()
            };
            for recipe in recipes {
                let mut probe = state.clone();
                probe.active_action = Some(crate::state::ActiveAction {
                    id: action.id,
                    remaining_ticks: u32::MAX,
                    total_ticks: u32::MAX,
                    stunned: false,
                });
                if let Some(r) = recipe {
                    probe.action_state.entry(action.id).or_default().recipe = Some(r);
                }
                let rates = RateEstimator::estimate(&probe, registries);
                let score = goal.activity_rate(skill, rates.currency_per_tick, rates.xp_per_tick);
                ranked.push((
                    score,
                    Candidate::SwitchActivity { action: action.id, recipe },
                ));
            }
        }
    }

    // Watch != act (spec §4.5): a watched upgrade is only surfaced as an
    // actionable *buy* candidate once affordable; otherwise it stays
    // purely on the watch list consulted by `next_decision_delta`.
    let consuming = goal.consuming_skills();
    let policy = goal.sell_policy_spec().resolve(registries, &consuming);
    let credits = policy.effective_credits(state, registries);
    for &skill in &goal.relevant_skills() {
        for purchase in registries.shop.for_skill(skill) {
            let owned = state.purchase_count(purchase.id);
            if !purchase.is_unlimited && owned >= purchase.buy_limit {
                continue;
            }
            let meets_requirements = purchase
                .purchase_requirements
                .iter()
                .all(|&(s, lvl)| state.skills.level(s) >= lvl);
            if !meets_requirements {
                continue;
            }
            let cost = purchase.cost.cost_at(owned);
            if credits < cost {
                continue;
            }

            let best_current = best_activity_rate(skill, state, goal, registries);
            let mut probe = state.clone();
            *probe.shop_state.entry(purchase.id).or_insert(0) += 1;
            let new_rate = best_activity_rate(skill, &probe, goal, registries);
            if new_rate + f64::EPSILON < best_current {
                continue; // not competitive: this purchase would make the skill worse off
            }
            let gain = (new_rate - best_current).max(0.0);
            let payback_ticks = if gain > 0.0 { cost as f64 / gain } else { f64::INFINITY };
            let score = if payback_ticks.is_finite() { 1.0 / (1.0 + payback_ticks) } else { 0.0 };
            ranked.push((score, Candidate::BuyUpgrade { purchase: purchase.id }));
        }
    }

    if should_emit_sell_candidate(state, goal, registries) {
        ranked.push((0.5, Candidate::Sell));
    }

    let _ = watch; // watch list membership does not gate the returned candidates, only `next_decision_delta`

    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    ranked.into_iter().map(|(_, c)| c).collect()
}

/// A sell candidate is only worth emitting when it would unlock
/// additional spending power -- i.e. unsold inventory plus GP already
/// covers some relevant purchase, or the inventory is near full and the
/// policy is sell-all (spec §4.5).
fn should_emit_sell_candidate(state: &GameState, goal: &Goal, registries: &Registries) -> bool {
    if matches!(goal.sell_policy_spec(), SellPolicySpec::SellAll) && state.inventory.fraction_full() > 0.5 {
        return true;
    }
    let consuming = goal.consuming_skills();
    let policy = goal.sell_policy_spec().resolve(registries, &consuming);
    let keep = policy.keep_set();
    state
        .inventory
        .stacks()
        .iter()
        .any(|s| !keep.contains(&s.item) && s.count > 0)
}
