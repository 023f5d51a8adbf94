//! State advancer (spec §4.2): fast-forwards a state by `dt` ticks,
//! either in closed form (`advanceExpected`) or via the external
//! stochastic ticker (`advanceFullSim`).

use rand::RngCore;

use crate::rates::{RateEstimator, Rates};
use crate::registries::Registries;
use crate::state::{CurrencyId, GameState, StateBuilder};

/// Outcome of `Ticker::consume_ticks` (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    StillRunning,
    OutOfInputs,
    InventoryFull,
    PlayerDied,
}

/// The external, stochastic tick-by-tick simulator (spec §6). The core
/// only depends on this trait; the real implementation lives in the
/// surrounding application and is out of scope here.
pub trait Ticker {
    fn consume_ticks(
        &self,
        builder: &mut StateBuilder,
        delta_ticks: u32,
        rng: &mut dyn RngCore,
    ) -> StopReason;
}

/// True for actions the O(1) expected-value advancer can model: skill
/// (non-combat) actions. Combat actions must go through full
/// simulation.
fn is_rate_modelable(state: &GameState, registries: &Registries) -> bool {
    state
        .active_action
        .and_then(|a| registries.actions.by_id(a.id))
        .map(|action| !action.is_combat())
        .unwrap_or(true) // no active action: trivially advanceable in closed form (nothing happens)
}

/// The number of ticks a consuming action can actually sustain its
/// current rate for, given what's in `state.inventory` (Glossary
/// "Consuming skill": `XP ∝ min(dt, floor(available/consumption_rate))`).
/// Non-consuming actions (`rates.consumed_per_tick` empty) are
/// unconstrained and return `dt` unchanged.
fn consuming_cap_ticks(state: &GameState, rates: &Rates, dt: u32) -> u32 {
    let mut cap = dt;
    for (item, rate) in &rates.consumed_per_tick {
        if *rate <= 0.0 {
            continue;
        }
        let available = state.inventory.count(*item) as f64;
        let max_ticks = (available / rate).floor();
        let max_ticks = if max_ticks.is_finite() && max_ticks >= 0.0 {
            max_ticks.min(u32::MAX as f64) as u32
        } else {
            0
        };
        cap = cap.min(max_ticks);
    }
    cap
}

/// O(1) closed-form advance: currency, per-skill XP, mastery XP, and
/// inventory counts move by `rate * dt`, rounded down. A consuming
/// action (one with non-empty `consumed_per_tick`) only accrues XP,
/// mastery, production, and HP loss for as many ticks as its inputs can
/// actually sustain; the remainder of `dt` still elapses (the active
/// action keeps ticking down) but produces nothing further. Never calls
/// the ticker and never touches the RNG — safe to use during planning
/// where determinism is required (spec §5).
pub fn advance_expected(state: &GameState, dt: u32, registries: &Registries) -> GameState {
    if dt == 0 {
        return state.clone();
    }
    let rates = RateEstimator::estimate(state, registries);
    let mut builder = StateBuilder::new(state.clone());

    let effective_dt = consuming_cap_ticks(state, &rates, dt);
    let dt_f = effective_dt as f64;
    builder.adjust_currency(CurrencyId::GP, (rates.currency_per_tick * dt_f).floor() as i64);
    if let Some(skill) = rates.skill {
        builder.apply_xp(skill, (rates.xp_per_tick * dt_f).floor());
    }
    if let Some(action) = rates.mastery_action {
        builder.apply_mastery_xp(action, (rates.mastery_xp_per_tick * dt_f).floor());
    }
    for (item, rate) in &rates.produced_per_tick {
        builder.add_item(*item, (rate * dt_f).floor() as u64);
    }
    for (item, rate) in &rates.consumed_per_tick {
        builder.remove_item(*item, (rate * dt_f).floor() as u64);
    }
    if rates.hp_loss_per_tick > 0.0 {
        builder.adjust_hp(-((rates.hp_loss_per_tick * dt_f).floor() as i64));
    }

    for _ in 0..dt {
        builder.tick_active_action();
    }

    let next = builder.finalize();
    next.debug_assert_invariants();
    debug_assert!(
        rates.skill.is_none() || next.skills.xp(rates.skill.unwrap()) >= state.skills.xp(rates.skill.unwrap()),
        "advance_expected must not decrease skill xp"
    );
    next
}

/// Full stochastic simulation via the external ticker.
pub fn advance_full_sim(
    state: &GameState,
    dt: u32,
    rng: &mut dyn RngCore,
    ticker: &dyn Ticker,
) -> (GameState, StopReason) {
    let mut builder = StateBuilder::new(state.clone());
    let reason = ticker.consume_ticks(&mut builder, dt, rng);
    let next = builder.finalize();
    next.debug_assert_invariants();
    (next, reason)
}

/// Chooses expected-value advance for rate-modelable actions, full
/// simulation otherwise (spec §4.2).
pub fn advance(
    state: &GameState,
    dt: u32,
    rng: &mut dyn RngCore,
    ticker: &dyn Ticker,
    registries: &Registries,
) -> (GameState, StopReason) {
    if is_rate_modelable(state, registries) {
        (advance_expected(state, dt, registries), StopReason::StillRunning)
    } else {
        advance_full_sim(state, dt, rng, ticker)
    }
}

/// Never falls back to stochastic simulation — used exclusively by the
/// planner, where determinism is mandatory (spec §5).
pub fn advance_deterministic(state: &GameState, dt: u32, registries: &Registries) -> GameState {
    advance_expected(state, dt, registries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registries::{Action, ActionRegistry, ItemRegistry, Recipe, ShopRegistry};
    use crate::state::ActiveAction;
    use crate::types::{ActionId, Skill};

    fn woodcutting_registries() -> Registries {
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
    fn advance_expected_is_monotone_in_xp() {
        let registries = woodcutting_registries();
        let mut state = GameState::new(10, 10);
        state.active_action = Some(ActiveAction {
            id: ActionId::new(0, 1),
            remaining_ticks: 1000,
            total_ticks: 1000,
            stunned: false,
        });
        let before = state.skills.xp(Skill::Woodcutting);
        let after = advance_expected(&state, 37, &registries);
        assert!(after.skills.xp(Skill::Woodcutting) >= before);
    }

    #[test]
    fn advance_expected_zero_delta_is_identity_for_xp() {
        let registries = woodcutting_registries();
        let state = GameState::new(10, 10);
        let after = advance_expected(&state, 0, &registries);
        assert_eq!(after.skills.xp(Skill::Woodcutting), state.skills.xp(Skill::Woodcutting));
    }

    #[test]
    fn advance_expected_never_goes_currency_negative() {
        let registries = woodcutting_registries();
        let state = GameState::new(10, 10);
        let after = advance_expected(&state, 100, &registries);
        assert!(after.gp() <= i64::MAX as u64);
    }

    #[test]
    fn consuming_action_gains_no_xp_without_its_input() {
        let log = crate::types::ItemId::new(1, 1);
        let burn = Action {
            id: ActionId::new(0, 2),
            skill: Skill::Firemaking,
            unlock_level: 1,
            mean_duration_ticks: 4.0,
            xp: 15.0,
            mastery_xp: 1.0,
            outputs: vec![],
            recipes: vec![Recipe { id: 0, inputs: vec![(log, 1)] }],
            is_skill_action: true,
            thieving: None,
        };
        let registries = Registries::new(
            ActionRegistry::build(vec![burn.clone()]),
            ItemRegistry::build(vec![]),
            ShopRegistry::build(vec![]),
        );
        let mut state = GameState::new(10, 10);
        state.active_action = Some(ActiveAction {
            id: burn.id,
            remaining_ticks: 1000,
            total_ticks: 1000,
            stunned: false,
        });
        let after = advance_expected(&state, 100, &registries);
        assert_eq!(after.skills.xp(Skill::Firemaking), 0.0);
    }

    #[test]
    fn consuming_action_xp_is_capped_by_available_logs() {
        let log = crate::types::ItemId::new(1, 1);
        let burn = Action {
            id: ActionId::new(0, 2),
            skill: Skill::Firemaking,
            unlock_level: 1,
            mean_duration_ticks: 1.0,
            xp: 10.0,
            mastery_xp: 1.0,
            outputs: vec![],
            recipes: vec![Recipe { id: 0, inputs: vec![(log, 1)] }],
            is_skill_action: true,
            thieving: None,
        };
        let registries = Registries::new(
            ActionRegistry::build(vec![burn.clone()]),
            ItemRegistry::build(vec![]),
            ShopRegistry::build(vec![]),
        );
        let mut state = GameState::new(10, 10).with_item(log, 5);
        state.active_action = Some(ActiveAction {
            id: burn.id,
            remaining_ticks: 1000,
            total_ticks: 1000,
            stunned: false,
        });
        let after = advance_expected(&state, 100, &registries);
        // Only 5 logs available at a 1-per-tick consumption rate: XP must
        // stop accruing once they run out, not scale with the full dt.
        assert_eq!(after.skills.xp(Skill::Firemaking), 50.0);
        assert_eq!(after.inventory.count(log), 0);
    }

    proptest::proptest! {
        #[test]
        fn prop_advance_expected_never_decreases_xp(dt in 0u32..10_000) {
            let registries = woodcutting_registries();
            let mut state = GameState::new(10, 10);
            state.active_action = Some(ActiveAction {
                id: ActionId::new(0, 1),
                remaining_ticks: u32::MAX,
                total_ticks: u32::MAX,
                stunned: false,
            });
            let after = advance_expected(&state, dt, &registries);
            prop_assert!(after.skills.xp(Skill::Woodcutting) >= state.skills.xp(Skill::Woodcutting));
            prop_assert!(after.hp <= after.max_hp);
        }
    }
}
