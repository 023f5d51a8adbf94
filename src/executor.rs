//! Plan executor (spec §4.12): replays a `Plan` step by step against the
//! real, stochastic advancer, consulting a `WatchSet` after every step
//! so execution can stop early on a material boundary.

use std::collections::HashMap;

use rand::RngCore;

use crate::advance::{advance, StopReason, Ticker};
use crate::candidates::Candidate;
use crate::error::{ExecutionError, ReplanBoundary};
use crate::macros::{self, MacroSpec};
use crate::plan::{Plan, Step};
use crate::rates::RateEstimator;
use crate::registries::Registries;
use crate::sell_policy::SellPolicySpec;
use crate::state::{CurrencyId, GameState, StateBuilder};
use crate::types::{ActionId, ItemId, Skill};
use crate::wait::{StopRule, WaitFor};
use crate::watch::WatchSet;

/// Cap on how many ticks a single `advance` call simulates at once while
/// chasing a `WaitFor` that re-estimates its remaining ticks every
/// iteration -- keeps a stalled or slowly-converging wait from pinning
/// the executor in one oversized jump.
const MAX_CHUNK_TICKS: u32 = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub enum PlanExecutionOutcome {
    Completed,
    StoppedEarly(ReplanBoundary),
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct PlanExecutionResult {
    pub final_state: GameState,
    pub steps_executed: usize,
    pub outcome: PlanExecutionOutcome,
    /// Expected death count accrued over the run, estimated from each
    /// step's `Rates::expected_deaths_per_tick` rather than observed
    /// discretely -- the advancer never models a death as a discrete
    /// event (spec §4.1).
    pub total_deaths: u64,
    /// Ticks actually simulated; can differ from `planned_ticks` since
    /// `WaitFor` predicates are re-checked against live state rather
    /// than blindly trusting the plan's tick estimate.
    pub actual_ticks: u64,
    pub planned_ticks: u64,
    /// Every boundary observed during the run, in order, regardless of
    /// whether it was material enough to stop execution.
    pub boundaries_hit: Vec<ReplanBoundary>,
}

/// Running totals threaded through step execution that don't belong on
/// `GameState` itself (spec §4.12, §6: execution telemetry, not state).
#[derive(Debug, Default)]
struct Telemetry {
    actual_ticks: u64,
    expected_deaths: f64,
}

/// Executes `plan` from `state` until it completes, a watch-set
/// boundary fires, or the plan runs out of steps without finishing
/// (`Exhausted`, distinct from a clean `Completed`). Deaths never stop
/// execution: the advancer folds them into its death-cycle rate model
/// and the executor moves on to the next step (spec §4.1, §4.12).
/// `on_step_complete` is invoked with the index and resulting state
/// after every step, for callers that want live progress (e.g. a UI).
pub fn execute_plan(
    mut state: GameState,
    plan: &Plan,
    watch: &WatchSet,
    registries: &Registries,
    rng: &mut dyn RngCore,
    ticker: &dyn Ticker,
    on_step_complete: &mut dyn FnMut(usize, &GameState),
) -> Result<PlanExecutionResult, ExecutionError> {
    let mut steps_executed = 0;
    let mut telemetry = Telemetry::default();
    let mut boundaries_hit = Vec::new();
    let planned_ticks = plan.total_ticks;

    for (index, step) in plan.steps.iter().enumerate() {
        state = run_step(state, step, registries, rng, ticker, &mut telemetry)?;
        steps_executed += 1;
        on_step_complete(index, &state);

        if state.inventory.is_full() {
            state = recover_from_full_inventory(state, plan, index, registries);
        }

        if let Some(boundary) = watch.detect_boundary(&state, registries) {
            boundaries_hit.push(boundary.clone());
            if watch.is_material(&boundary) {
                return Ok(PlanExecutionResult {
                    final_state: state,
                    steps_executed,
                    outcome: PlanExecutionOutcome::StoppedEarly(boundary),
                    total_deaths: telemetry.expected_deaths.round() as u64,
                    actual_ticks: telemetry.actual_ticks,
                    planned_ticks,
                    boundaries_hit,
                });
            }
        }
    }

    let outcome = if watch.goal.is_satisfied(&state, registries) {
        PlanExecutionOutcome::Completed
    } else {
        PlanExecutionOutcome::Exhausted
    };

    Ok(PlanExecutionResult {
        final_state: state,
        steps_executed,
        outcome,
        total_deaths: telemetry.expected_deaths.round() as u64,
        actual_ticks: telemetry.actual_ticks,
        planned_ticks,
        boundaries_hit,
    })
}

fn run_step(
    state: GameState,
    step: &Step,
    registries: &Registries,
    rng: &mut dyn RngCore,
    ticker: &dyn Ticker,
    telemetry: &mut Telemetry,
) -> Result<GameState, ExecutionError> {
    match step {
        Step::InteractionStep { candidate, .. } => apply_interaction(state, candidate, registries),
        Step::WaitStep { ticks, wait_for, expected_action } => {
            run_wait_step(state, *ticks, wait_for, *expected_action, registries, rng, ticker, telemetry)
        }
        Step::MacroStep { macro_spec, .. } => run_macro_step(state, macro_spec, registries, rng, ticker, telemetry),
    }
}

/// Re-checks `wait_for` against live state rather than trusting the
/// plan's `ticks` estimate (spec §4.12): the plan was computed against
/// the closed-form expected-value model, but execution runs the real,
/// stochastic advancer, so the two can drift.
fn run_wait_step(
    mut state: GameState,
    ticks_hint: u64,
    wait_for: &WaitFor,
    expected_action: Option<ActionId>,
    registries: &Registries,
    rng: &mut dyn RngCore,
    ticker: &dyn Ticker,
    telemetry: &mut Telemetry,
) -> Result<GameState, ExecutionError> {
    if let Some(action) = expected_action {
        if state.active_action.map(|a| a.id) != Some(action) {
            state = switch_to(state, action, None, registries)?;
        }
    }

    // `WaitFor::Goal` is deliberately unresolvable on its own (spec §3:
    // "resolved externally with access to the Goal") -- the watch set
    // checked by the caller after every step is what actually detects
    // goal completion, so here we just run the estimated ticks.
    if matches!(wait_for, WaitFor::Goal) {
        let rates = RateEstimator::estimate(&state, registries);
        telemetry.actual_ticks += ticks_hint;
        telemetry.expected_deaths += rates.expected_deaths_per_tick * ticks_hint as f64;
        let (next, reason) = advance(&state, ticks_hint as u32, rng, ticker, registries);
        return match reason {
            StopReason::OutOfInputs => Err(ExecutionError::NoProgressPossible("inputs depleted mid-step".into())),
            _ => Ok(next),
        };
    }

    run_until_with_recovery(state, wait_for, &SellPolicySpec::SellAll, &[], macros::DEFAULT_MAX_RECOVERY_ATTEMPTS, registries, rng, ticker, telemetry)
}

fn run_macro_step(
    state: GameState,
    macro_spec: &MacroSpec,
    registries: &Registries,
    rng: &mut dyn RngCore,
    ticker: &dyn Ticker,
    telemetry: &mut Telemetry,
) -> Result<GameState, ExecutionError> {
    match macro_spec {
        MacroSpec::TrainSkillUntil { skill, target_level, action, watched_stops } => {
            run_train_skill_until(state, *skill, *target_level, *action, watched_stops, registries, rng, ticker, telemetry)
        }
        MacroSpec::TrainConsumingSkillUntil {
            skill,
            target_level,
            action,
            recipe,
            producer_by_input_item,
            buffer_target,
            sell_policy_spec,
            max_recovery_attempts,
            watched_stops,
        } => run_train_consuming_skill_until(
            state,
            *skill,
            *target_level,
            *action,
            *recipe,
            producer_by_input_item,
            *buffer_target,
            sell_policy_spec,
            *max_recovery_attempts,
            watched_stops,
            registries,
            rng,
            ticker,
            telemetry,
        ),
        MacroSpec::AcquireItem { item, qty } => run_acquire_item(state, *item, *qty, registries, rng, ticker, telemetry),
        MacroSpec::EnsureStock { item, qty } => run_ensure_stock(state, *item, *qty, registries, rng, ticker, telemetry),
    }
}

/// `TrainSkillUntil` dispatch (spec §4.12): picks `action` if given,
/// otherwise the best unlocked non-combat action for `skill`, and runs
/// it until `target_level` or one of `watched_stops` fires.
fn run_train_skill_until(
    mut state: GameState,
    skill: Skill,
    target_level: u32,
    action: Option<ActionId>,
    watched_stops: &[WaitFor],
    registries: &Registries,
    rng: &mut dyn RngCore,
    ticker: &dyn Ticker,
    telemetry: &mut Telemetry,
) -> Result<GameState, ExecutionError> {
    let chosen = match action {
        Some(id) => id,
        None => best_unlocked_action(skill, &state, registries).ok_or_else(|| ExecutionError::ActionUnavailable {
            action: ActionId::new(0, 0),
            reason: format!("no unlocked action for {skill:?}"),
        })?,
    };
    if state.active_action.map(|a| a.id) != Some(chosen) {
        state = switch_to(state, chosen, None, registries)?;
    }

    let wait_for = level_boundary_wait(skill, target_level, watched_stops);
    run_until_with_recovery(state, &wait_for, &SellPolicySpec::SellAll, &[], macros::DEFAULT_MAX_RECOVERY_ATTEMPTS, registries, rng, ticker, telemetry)
}

/// `TrainConsumingSkillUntil` dispatch (spec §4.6, §4.12): alternates
/// stocking each recipe input up to `buffer_target` (switching to its
/// producer) with running the consuming action, until `target_level` or
/// a watched stop fires. Recovery-sells via `sell_policy_spec` when the
/// inventory fills mid-cycle.
#[allow(clippy::too_many_arguments)]
fn run_train_consuming_skill_until(
    mut state: GameState,
    skill: Skill,
    target_level: u32,
    action: ActionId,
    recipe: Option<u16>,
    producer_by_input_item: &HashMap<ItemId, ActionId>,
    buffer_target: u64,
    sell_policy_spec: &SellPolicySpec,
    max_recovery_attempts: u32,
    watched_stops: &[WaitFor],
    registries: &Registries,
    rng: &mut dyn RngCore,
    ticker: &dyn Ticker,
    telemetry: &mut Telemetry,
) -> Result<GameState, ExecutionError> {
    let def = registries.actions.by_id(action).ok_or_else(|| ExecutionError::ActionUnavailable {
        action,
        reason: "unknown action id".into(),
    })?;
    let inputs = def.inputs_for(recipe).to_vec();
    let stop = level_boundary_wait(skill, target_level, watched_stops);

    while !stop.is_satisfied(&state, registries) {
        for &(item, _) in &inputs {
            if state.inventory.count(item) >= buffer_target {
                continue;
            }
            let producer = *producer_by_input_item.get(&item).ok_or_else(|| ExecutionError::ActionUnavailable {
                action,
                reason: format!("no known producer for input {item}"),
            })?;
            state = switch_to(state, producer, None, registries)?;
            let want = WaitFor::InventoryOfItemAtLeast { item, min: buffer_target };
            state = run_until_with_recovery(
                state,
                &want,
                sell_policy_spec,
                &[skill],
                max_recovery_attempts,
                registries,
                rng,
                ticker,
                telemetry,
            )?;
            if stop.is_satisfied(&state, registries) {
                return Ok(state);
            }
        }

        state = switch_to(state, action, recipe, registries)?;
        let mut consume_waits: Vec<WaitFor> = vec![stop.clone()];
        consume_waits.extend(inputs.iter().map(|&(item, _)| WaitFor::InputsDepleted { item }));
        let consume_until = WaitFor::AnyOf(consume_waits);
        state = run_until_with_recovery(
            state,
            &consume_until,
            sell_policy_spec,
            &[skill],
            max_recovery_attempts,
            registries,
            rng,
            ticker,
            telemetry,
        )?;
    }

    Ok(state)
}

/// `AcquireItem` dispatch (spec §4.6, §4.12): switches to `item`'s
/// producer and waits for `qty` more than currently held.
fn run_acquire_item(
    mut state: GameState,
    item: ItemId,
    qty: u64,
    registries: &Registries,
    rng: &mut dyn RngCore,
    ticker: &dyn Ticker,
    telemetry: &mut Telemetry,
) -> Result<GameState, ExecutionError> {
    let producer_id = macros::find_producer(item, registries)
        .ok_or_else(|| ExecutionError::ActionUnavailable {
            action: ActionId::new(0, 0),
            reason: format!("no producer for item {item}"),
        })?
        .id;
    if state.active_action.map(|a| a.id) != Some(producer_id) {
        state = switch_to(state, producer_id, None, registries)?;
    }
    let snapshot = state.inventory.count(item);
    let wait_for = WaitFor::DeltaToAcquire { item, qty, snapshot };
    run_until_with_recovery(state, &wait_for, &SellPolicySpec::SellAll, &[], macros::DEFAULT_MAX_RECOVERY_ATTEMPTS, registries, rng, ticker, telemetry)
}

/// `EnsureStock` dispatch (spec §4.6, §4.12): tops up `item` to `qty`,
/// selling down on a full inventory; if nothing is left to sell and the
/// target still isn't met, there is genuinely no way to proceed.
fn run_ensure_stock(
    mut state: GameState,
    item: ItemId,
    qty: u64,
    registries: &Registries,
    rng: &mut dyn RngCore,
    ticker: &dyn Ticker,
    telemetry: &mut Telemetry,
) -> Result<GameState, ExecutionError> {
    if state.inventory.count(item) >= qty {
        return Ok(state);
    }
    let producer_id = macros::find_producer(item, registries)
        .ok_or_else(|| ExecutionError::ActionUnavailable {
            action: ActionId::new(0, 0),
            reason: format!("no producer for item {item}"),
        })?
        .id;
    if state.active_action.map(|a| a.id) != Some(producer_id) {
        state = switch_to(state, producer_id, None, registries)?;
    }
    let wait_for = WaitFor::InventoryOfItemAtLeast { item, min: qty };
    run_until_with_recovery(state, &wait_for, &SellPolicySpec::SellAll, &[], macros::DEFAULT_MAX_RECOVERY_ATTEMPTS, registries, rng, ticker, telemetry)
}

fn level_boundary_wait(skill: Skill, target_level: u32, watched_stops: &[WaitFor]) -> WaitFor {
    let stop = StopRule::StopAtLevel { skill, level: target_level }.to_wait_for();
    if watched_stops.is_empty() {
        stop
    } else {
        let mut list = vec![stop];
        list.extend(watched_stops.iter().cloned());
        WaitFor::AnyOf(list)
    }
}

fn best_unlocked_action(skill: Skill, state: &GameState, registries: &Registries) -> Option<ActionId> {
    registries
        .actions
        .for_skill(skill)
        .filter(|a| a.unlock_level <= state.skills.level(skill) && !a.is_combat())
        .max_by_key(|a| a.unlock_level)
        .map(|a| a.id)
}

/// Drives `state` forward, chunk by chunk, until `wait_for` is satisfied,
/// recovering from a full inventory by selling down per `sell_policy_spec`
/// up to `max_recovery_attempts` times. Returns `NoProgressPossible` if
/// the wait has no projected positive progress, if inputs run out mid
/// step, or if the inventory is full with nothing left worth selling
/// (spec §4.6: `EnsureStock` "no progress possible when sellable value is
/// zero", generalized here to every macro that stocks inventory).
#[allow(clippy::too_many_arguments)]
fn run_until_with_recovery(
    mut state: GameState,
    wait_for: &WaitFor,
    sell_policy_spec: &SellPolicySpec,
    consuming_skills: &[Skill],
    max_recovery_attempts: u32,
    registries: &Registries,
    rng: &mut dyn RngCore,
    ticker: &dyn Ticker,
    telemetry: &mut Telemetry,
) -> Result<GameState, ExecutionError> {
    let mut recovery_attempts = 0u32;
    loop {
        if wait_for.is_satisfied(&state, registries) {
            return Ok(state);
        }

        if state.inventory.is_full() {
            if recovery_attempts >= max_recovery_attempts {
                return Err(ExecutionError::NoProgressPossible(
                    "inventory full and recovery attempts exhausted".into(),
                ));
            }
            let policy = sell_policy_spec.resolve(registries, consuming_skills);
            let keep: Vec<ItemId> = policy.keep_set().into_iter().collect();
            let sellable = state.inventory.sell_value(&registries.items, &keep);
            if sellable == 0 {
                return Err(ExecutionError::NoProgressPossible(
                    "inventory full with nothing sellable to recover".into(),
                ));
            }
            let proceeds = state.inventory.sell_all(&registries.items, &keep);
            *state.currencies.entry(CurrencyId::GP).or_insert(0) += proceeds;
            recovery_attempts += 1;
            continue;
        }

        let rates = RateEstimator::estimate(&state, registries);
        let ticks = wait_for
            .estimate_ticks(&state, &rates, registries)
            .ok_or_else(|| ExecutionError::NoProgressPossible(wait_for.description()))?;
        if ticks == 0 {
            return Ok(state);
        }
        let chunk = (ticks as u32).clamp(1, MAX_CHUNK_TICKS);
        telemetry.actual_ticks += chunk as u64;
        telemetry.expected_deaths += rates.expected_deaths_per_tick * chunk as f64;
        let (next, reason) = advance(&state, chunk, rng, ticker, registries);
        state = next;
        if reason == StopReason::OutOfInputs {
            return Err(ExecutionError::NoProgressPossible("inputs depleted mid-step".into()));
        }
    }
}

fn switch_to(
    state: GameState,
    action: ActionId,
    recipe: Option<u16>,
    registries: &Registries,
) -> Result<GameState, ExecutionError> {
    apply_interaction(state, &Candidate::SwitchActivity { action, recipe }, registries)
}

fn apply_interaction(
    state: GameState,
    candidate: &Candidate,
    registries: &Registries,
) -> Result<GameState, ExecutionError> {
    let mut builder = StateBuilder::new(state.clone());
    match candidate {
        Candidate::SwitchActivity { action, recipe } => {
            let def = registries.actions.by_id(*action).ok_or_else(|| ExecutionError::ActionUnavailable {
                action: *action,
                reason: "unknown action id".into(),
            })?;
            builder.set_active_action(*action, def.mean_duration_ticks.max(1.0) as u32);
            let mut next = builder.finalize();
            if let Some(r) = recipe {
                next.action_state.entry(*action).or_default().recipe = Some(*r);
            }
            Ok(next)
        }
        Candidate::BuyUpgrade { purchase } => {
            let def = registries.shop.by_id(*purchase).ok_or_else(|| ExecutionError::ActionUnavailable {
                action: ActionId::new(0, 0),
                reason: "unknown purchase id".into(),
            })?;
            let owned = state.purchase_count(*purchase);
            let cost = def.cost.cost_at(owned);
            if state.gp() < cost {
                return Err(ExecutionError::CannotAfford {
                    purchase: *purchase,
                    cost,
                    available: state.gp(),
                });
            }
            builder.adjust_currency(CurrencyId::GP, -(cost as i64));
            let mut next = builder.finalize();
            *next.shop_state.entry(*purchase).or_insert(0) += 1;
            Ok(next)
        }
        Candidate::Sell => {
            let mut next_inventory = state.inventory.clone();
            let proceeds = next_inventory.sell_all(&registries.items, &[]);
            builder.adjust_currency(CurrencyId::GP, proceeds as i64);
            let mut next = builder.finalize();
            next.inventory = next_inventory;
            Ok(next)
        }
    }
}

/// A full inventory mid-plan is recovered by selling down to the
/// segment's active keep-set rather than aborting the plan (spec
/// §4.12: "inventory-full sell-policy recovery").
fn recover_from_full_inventory(mut state: GameState, plan: &Plan, step_index: usize, registries: &Registries) -> GameState {
    let policy = plan.sell_policy_at(step_index);
    let keep: Vec<_> = policy.keep_set().into_iter().collect();
    let proceeds = state.inventory.sell_all(&registries.items, &keep);
    *state.currencies.entry(CurrencyId::GP).or_insert(0) += proceeds;
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::Goal;
    use crate::registries::{Action, ActionRegistry, ItemRegistry, Recipe, ShopRegistry};
    use crate::types::{ActionId, ItemId, Skill};
    use crate::watch::SegmentConfig;
    use rand::rngs::mock::StepRng;
    use std::collections::HashMap;

    struct NoopTicker;
    impl Ticker for NoopTicker {
        fn consume_ticks(&self, builder: &mut StateBuilder, _delta: u32, _rng: &mut dyn RngCore) -> StopReason {
            let _ = builder;
            StopReason::StillRunning
        }
    }

    fn registries() -> Registries {
        let action = Action {
            id: ActionId::new(0, 1),
            skill: Skill::Woodcutting,
            unlock_level: 1,
            mean_duration_ticks: 5.0,
            xp: 10.0,
            mastery_xp: 1.0,
            outputs: vec![(ItemId::new(1, 1), 1)],
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
    fn executes_switch_then_wait_and_completes_on_goal() {
        let registries = registries();
        let goal = Goal::reach_skill_level(Skill::Woodcutting, 2);
        let state = GameState::new(10, 10);
        let watch = WatchSet::build(&state, goal, SegmentConfig::default(), &registries, HashMap::new());

        let plan = Plan::new(vec![
            Step::InteractionStep {
                candidate: Candidate::SwitchActivity { action: ActionId::new(0, 1), recipe: None },
                ticks: 0,
            },
            Step::WaitStep { ticks: 10_000, wait_for: WaitFor::Goal, expected_action: None },
        ]);

        let mut rng = StepRng::new(0, 1);
        let ticker = NoopTicker;
        let result = execute_plan(state, &plan, &watch, &registries, &mut rng, &ticker, &mut |_, _| {}).unwrap();
        assert_eq!(result.outcome, PlanExecutionOutcome::StoppedEarly(ReplanBoundary::GoalReached));
        assert_eq!(result.planned_ticks, plan.total_ticks);
        assert!(result.actual_ticks <= result.planned_ticks);
    }

    #[test]
    fn buy_upgrade_fails_when_unaffordable() {
        use crate::registries::{CostDescriptor, ShopPurchase};
        use crate::types::ShopPurchaseId;

        let purchase = ShopPurchase {
            id: ShopPurchaseId::new(0, 1),
            name: "Axe".into(),
            unlock_requirements: vec![],
            purchase_requirements: vec![],
            buy_limit: 1,
            is_unlimited: false,
            cost: CostDescriptor::Fixed(vec![1_000_000]),
            duration_multiplier: 0.1,
            affected_skills: vec![Skill::Woodcutting],
        };
        let registries = Registries::new(
            ActionRegistry::build(vec![]),
            ItemRegistry::build(vec![]),
            ShopRegistry::build(vec![purchase]),
        );
        let state = GameState::new(10, 10);
        let err = apply_interaction(state, &Candidate::BuyUpgrade { purchase: ShopPurchaseId::new(0, 1) }, &registries)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::CannotAfford { .. }));
    }

    #[test]
    fn on_step_complete_is_called_once_per_step() {
        let registries = registries();
        let goal = Goal::reach_skill_level(Skill::Woodcutting, 2);
        let state = GameState::new(10, 10);
        let watch = WatchSet::build(&state, goal, SegmentConfig::default(), &registries, HashMap::new());
        let plan = Plan::new(vec![
            Step::InteractionStep {
                candidate: Candidate::SwitchActivity { action: ActionId::new(0, 1), recipe: None },
                ticks: 0,
            },
            Step::WaitStep { ticks: 10_000, wait_for: WaitFor::Goal, expected_action: None },
        ]);
        let mut rng = StepRng::new(0, 1);
        let ticker = NoopTicker;
        let mut calls = 0usize;
        let result = execute_plan(state, &plan, &watch, &registries, &mut rng, &ticker, &mut |_, _| calls += 1).unwrap();
        assert_eq!(calls, result.steps_executed);
    }

    #[test]
    fn train_skill_until_macro_runs_to_target_level() {
        let registries = registries();
        let state = GameState::new(10, 10);
        let macro_spec = MacroSpec::TrainSkillUntil {
            skill: Skill::Woodcutting,
            target_level: 2,
            action: Some(ActionId::new(0, 1)),
            watched_stops: vec![],
        };
        let mut rng = StepRng::new(0, 1);
        let ticker = NoopTicker;
        let mut telemetry = Telemetry::default();
        let next = run_macro_step(state, &macro_spec, &registries, &mut rng, &ticker, &mut telemetry).unwrap();
        assert!(next.skills.level(Skill::Woodcutting) >= 2);
    }

    #[test]
    fn ensure_stock_tops_up_from_producer() {
        let log = ItemId::new(1, 1);
        let registries = registries();
        let state = GameState::new(10, 10);
        let macro_spec = MacroSpec::EnsureStock { item: log, qty: 3 };
        let mut rng = StepRng::new(0, 1);
        let ticker = NoopTicker;
        let mut telemetry = Telemetry::default();
        let next = run_macro_step(state, &macro_spec, &registries, &mut rng, &ticker, &mut telemetry).unwrap();
        assert!(next.inventory.count(log) >= 3);
    }
}
