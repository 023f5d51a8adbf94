//! Rate estimator (spec §4.1): expected per-tick flows for whatever
//! action is currently active in a state.

use std::collections::HashMap;

use crate::registries::Registries;
use crate::state::GameState;
use crate::types::{ActionId, ItemId, Skill};

/// Ticks assumed lost to restarting an activity after death. A design
/// decision (spec leaves the exact overhead unspecified): small enough
/// that frequent deaths still dominate the sustainable rate, but
/// non-zero so `ticksToDeath -> 0` doesn't produce a divide-by-zero.
pub const RESTART_OVERHEAD_TICKS: f64 = 3.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rates {
    pub currency_per_tick: f64,
    pub xp_per_tick: f64,
    pub skill: Option<Skill>,
    pub mastery_xp_per_tick: f64,
    pub mastery_action: Option<ActionId>,
    pub produced_per_tick: HashMap<ItemId, f64>,
    pub consumed_per_tick: HashMap<ItemId, f64>,
    pub hp_loss_per_tick: f64,
    pub distinct_item_type_flow_per_tick: f64,
    /// Expected deaths per tick, derived from the same death-cycle model
    /// that discounts the other fields above -- lets callers that need a
    /// discrete death count (e.g. the executor's telemetry) integrate it
    /// over elapsed ticks without re-deriving `ticksToDeath` themselves.
    pub expected_deaths_per_tick: f64,
}

impl Rates {
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Aggregated duration modifier for `skill` from every owned shop
/// purchase that affects it. Positive values slow the action down,
/// negative values speed it up, matching `duration_multiplier`'s sign
/// convention in the registry.
pub(crate) fn aggregated_duration_modifier(state: &GameState, registries: &Registries, skill: Skill) -> f64 {
    registries
        .shop
        .for_skill(skill)
        .filter(|p| p.is_skill_upgrade())
        .map(|p| {
            let owned = state.purchase_count(p.id) as f64;
            owned * p.duration_multiplier
        })
        .sum()
}

/// Stealth score feeding the thieving success-probability formula.
/// Combines thieving level and mastery level; the exact weighting is an
/// open design choice (spec §4.1 only fixes the shape of the success
/// formula, not how stealth derives from level/mastery).
fn stealth_score(thieving_level: u32, mastery_level: u32) -> f64 {
    thieving_level as f64 + 0.5 * mastery_level as f64
}

pub struct RateEstimator;

impl RateEstimator {
    /// Expected per-tick flows for the state's active action, with
    /// death-cycle adjustment folded in. Non-skill (e.g. combat) actions
    /// and states with no active action yield all-zero rates.
    pub fn estimate(state: &GameState, registries: &Registries) -> Rates {
        let Some(active) = state.active_action else {
            return Rates::zero();
        };
        let Some(action) = registries.actions.by_id(active.id) else {
            return Rates::zero();
        };
        if action.is_combat() {
            return Rates::zero();
        }

        let modifier = aggregated_duration_modifier(state, registries, action.skill);
        let mean_ticks = (action.mean_duration_ticks * (1.0 + modifier)).max(1.0);

        let mut rates = if let Some(thieving) = action.thieving {
            estimate_thieving(state, registries, action, thieving, mean_ticks)
        } else {
            estimate_producing(state, registries, action, mean_ticks)
        };

        apply_death_cycle_adjustment(state, &mut rates);
        rates
    }
}

fn estimate_producing(
    state: &GameState,
    registries: &Registries,
    action: &crate::registries::Action,
    mean_ticks: f64,
) -> Rates {
    let action_state = state.action_state(action.id);
    let mut produced = HashMap::new();
    for (item, count) in &action.outputs {
        produced.insert(*item, *count as f64 / mean_ticks);
    }
    let mut consumed = HashMap::new();
    for (item, count) in action.inputs_for(action_state.recipe) {
        consumed.insert(*item, *count as f64 / mean_ticks);
    }
    let distinct_flow = produced.len() as f64 + consumed.len() as f64;

    let _ = registries; // registries reserved for future per-item modifiers
    Rates {
        currency_per_tick: 0.0,
        xp_per_tick: action.xp / mean_ticks,
        skill: Some(action.skill),
        mastery_xp_per_tick: action.mastery_xp / mean_ticks,
        mastery_action: Some(action.id),
        produced_per_tick: produced,
        consumed_per_tick: consumed,
        hp_loss_per_tick: 0.0,
        distinct_item_type_flow_per_tick: distinct_flow / mean_ticks,
        expected_deaths_per_tick: 0.0,
    }
}

fn estimate_thieving(
    state: &GameState,
    _registries: &Registries,
    action: &crate::registries::Action,
    thieving: crate::registries::ThievingParams,
    base_expected_ticks: f64,
) -> Rates {
    let level = state.skills.level(Skill::Thieving);
    let mastery_level = state.action_state(action.id).mastery_level();
    let stealth = stealth_score(level, mastery_level);

    let success = ((100.0 + stealth) / (100.0 + thieving.perception)).clamp(0.0, 1.0);
    let failure = 1.0 - success;

    let currency_per_attempt = success * (1.0 + thieving.max_gold) / 2.0;
    let effective_ticks = base_expected_ticks + failure * thieving.stun_ticks as f64;
    let hp_loss_per_attempt = failure * (1.0 + thieving.max_hit) / 2.0;

    Rates {
        currency_per_tick: currency_per_attempt / effective_ticks,
        xp_per_tick: success * action.xp / effective_ticks,
        skill: Some(Skill::Thieving),
        mastery_xp_per_tick: success * action.mastery_xp / effective_ticks,
        mastery_action: Some(action.id),
        produced_per_tick: HashMap::new(),
        consumed_per_tick: HashMap::new(),
        hp_loss_per_tick: hp_loss_per_attempt / effective_ticks,
        distinct_item_type_flow_per_tick: 0.0,
        expected_deaths_per_tick: 0.0,
    }
}

/// Folds death/restart into a sustainable long-run average (spec
/// §4.1): keeps the advancer monotone in XP by never modeling a
/// discrete death event during planning.
fn apply_death_cycle_adjustment(state: &GameState, rates: &mut Rates) {
    if rates.hp_loss_per_tick <= 0.0 {
        return;
    }
    let ticks_to_death = (((state.hp.max(1) - 1) as f64) / rates.hp_loss_per_tick).floor();
    let sustain = ticks_to_death / (ticks_to_death + RESTART_OVERHEAD_TICKS);
    rates.expected_deaths_per_tick = 1.0 / (ticks_to_death + RESTART_OVERHEAD_TICKS);

    rates.currency_per_tick *= sustain;
    rates.xp_per_tick *= sustain;
    rates.mastery_xp_per_tick *= sustain;
    for v in rates.produced_per_tick.values_mut() {
        *v *= sustain;
    }
    for v in rates.consumed_per_tick.values_mut() {
        *v *= sustain;
    }
    rates.hp_loss_per_tick *= sustain;
}
