//! WaitFor predicates and the wait-delta selector (spec §3, §4.7).

use crate::goal::Goal;
use crate::rates::Rates;
use crate::registries::Registries;
use crate::sell_policy::SellPolicy;
use crate::state::{skills::start_xp_for_level, GameState};
use crate::types::{ActionId, ItemId, Skill};

/// A predicate over state, each convertible to an estimated-ticks bound
/// from the current rate model (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub enum WaitFor {
    InventoryValueAtLeast { policy: SellPolicy, target: u64 },
    SkillXpAtLeast { skill: Skill, target_xp: f64 },
    MasteryXpAtLeast { action: ActionId, target_xp: f64 },
    InventoryFractionAtLeast { threshold: f64 },
    InventoryFull,
    Goal,
    InputsDepleted { item: ItemId },
    InputsAvailable { item: ItemId, min: u64 },
    InventoryOfItemAtLeast { item: ItemId, min: u64 },
    SufficientInputsForAction { action: ActionId, inputs: Vec<(ItemId, u64)> },
    DeltaToAcquire { item: ItemId, qty: u64, snapshot: u64 },
    AnyOf(Vec<WaitFor>),
}

impl WaitFor {
    pub fn description(&self) -> String {
        match self {
            WaitFor::InventoryValueAtLeast { target, .. } => {
                format!("inventory value >= {target}")
            }
            WaitFor::SkillXpAtLeast { skill, target_xp } => {
                format!("{skill:?} xp >= {target_xp}")
            }
            WaitFor::MasteryXpAtLeast { action, target_xp } => {
                format!("mastery xp for {action} >= {target_xp}")
            }
            WaitFor::InventoryFractionAtLeast { threshold } => {
                format!("inventory fraction >= {threshold}")
            }
            WaitFor::InventoryFull => "inventory full".into(),
            WaitFor::Goal => "goal reached".into(),
            WaitFor::InputsDepleted { item } => format!("inputs of {item} depleted"),
            WaitFor::InputsAvailable { item, min } => format!("{item} available >= {min}"),
            WaitFor::InventoryOfItemAtLeast { item, min } => format!("{item} count >= {min}"),
            WaitFor::SufficientInputsForAction { action, .. } => {
                format!("sufficient inputs for {action}")
            }
            WaitFor::DeltaToAcquire { item, qty, .. } => format!("acquire {qty} more of {item}"),
            WaitFor::AnyOf(list) => {
                let parts: Vec<String> = list.iter().map(|w| w.description()).collect();
                format!("any of [{}]", parts.join(", "))
            }
        }
    }

    pub fn is_satisfied(&self, state: &GameState, registries: &Registries) -> bool {
        match self {
            WaitFor::InventoryValueAtLeast { policy, target } => {
                policy.effective_credits(state, registries) >= *target
            }
            WaitFor::SkillXpAtLeast { skill, target_xp } => state.skills.xp(*skill) >= *target_xp,
            WaitFor::MasteryXpAtLeast { action, target_xp } => {
                state.action_state(*action).mastery_xp >= *target_xp
            }
            WaitFor::InventoryFractionAtLeast { threshold } => {
                state.inventory.fraction_full() >= *threshold
            }
            WaitFor::InventoryFull => state.inventory.is_full(),
            WaitFor::Goal => false, // resolved externally with access to the Goal
            WaitFor::InputsDepleted { item } => state.inventory.count(*item) == 0,
            WaitFor::InputsAvailable { item, min } => state.inventory.count(*item) >= *min,
            WaitFor::InventoryOfItemAtLeast { item, min } => state.inventory.count(*item) >= *min,
            WaitFor::SufficientInputsForAction { inputs, .. } => inputs
                .iter()
                .all(|(item, qty)| state.inventory.count(*item) >= *qty),
            WaitFor::DeltaToAcquire { item, qty, snapshot } => {
                state.inventory.count(*item) >= snapshot + qty
            }
            WaitFor::AnyOf(list) => list.iter().any(|w| w.is_satisfied(state, registries)),
        }
    }

    /// Estimated ticks until satisfied under the current rate model.
    /// `None` means infinity (no positive progress projected).
    pub fn estimate_ticks(&self, state: &GameState, rates: &Rates, registries: &Registries) -> Option<u64> {
        if self.is_satisfied(state, registries) {
            return Some(0);
        }
        let ceil_div = |remaining: f64, rate: f64| -> Option<u64> {
            if rate <= 0.0 {
                None
            } else {
                Some((remaining / rate).ceil().max(0.0) as u64)
            }
        };
        match self {
            WaitFor::InventoryValueAtLeast { policy, target } => {
                let current = policy.effective_credits(state, registries) as f64;
                ceil_div(*target as f64 - current, rates.currency_per_tick)
            }
            WaitFor::SkillXpAtLeast { skill, target_xp } => {
                if rates.skill == Some(*skill) {
                    ceil_div(target_xp - state.skills.xp(*skill), rates.xp_per_tick)
                } else {
                    None
                }
            }
            WaitFor::MasteryXpAtLeast { action, target_xp } => {
                if rates.mastery_action == Some(*action) {
                    ceil_div(
                        target_xp - state.action_state(*action).mastery_xp,
                        rates.mastery_xp_per_tick,
                    )
                } else {
                    None
                }
            }
            WaitFor::InventoryFractionAtLeast { threshold } => {
                let remaining_stacks = (*threshold * state.inventory.capacity as f64)
                    - state.inventory.distinct_stacks() as f64;
                if remaining_stacks <= 0.0 {
                    Some(0)
                } else {
                    None // distinct-stack arrival isn't rate-modelable without a per-item schedule
                }
            }
            WaitFor::InventoryFull => None,
            WaitFor::Goal => None,
            WaitFor::InputsDepleted { item } => {
                let rate = rates.consumed_per_tick.get(item).copied().unwrap_or(0.0);
                ceil_div(state.inventory.count(*item) as f64, rate)
            }
            WaitFor::InputsAvailable { item, min } => {
                let rate = rates.produced_per_tick.get(item).copied().unwrap_or(0.0);
                ceil_div(*min as f64 - state.inventory.count(*item) as f64, rate)
            }
            WaitFor::InventoryOfItemAtLeast { item, min } => {
                let rate = rates.produced_per_tick.get(item).copied().unwrap_or(0.0);
                ceil_div(*min as f64 - state.inventory.count(*item) as f64, rate)
            }
            WaitFor::SufficientInputsForAction { inputs, .. } => inputs
                .iter()
                .filter_map(|(item, qty)| {
                    let rate = rates.produced_per_tick.get(item).copied().unwrap_or(0.0);
                    ceil_div(*qty as f64 - state.inventory.count(*item) as f64, rate)
                })
                .max(),
            WaitFor::DeltaToAcquire { item, qty, snapshot } => {
                let rate = rates.produced_per_tick.get(item).copied().unwrap_or(0.0);
                ceil_div((snapshot + qty) as f64 - state.inventory.count(*item) as f64, rate)
            }
            WaitFor::AnyOf(list) => list
                .iter()
                .filter_map(|w| w.estimate_ticks(state, rates, registries))
                .min(),
        }
    }
}

/// Converts a macro stop-rule into its equivalent WaitFor (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub enum StopRule {
    StopAtNextBoundary { skill: Skill, next_unlock_xp: Option<f64> },
    StopAtGoal,
    StopAtLevel { skill: Skill, level: u32 },
    StopWhenUpgradeAffordable { policy: SellPolicy, cost: u64 },
    StopWhenInputsDepleted { item: ItemId },
}

impl StopRule {
    pub fn to_wait_for(&self) -> WaitFor {
        match self {
            StopRule::StopAtNextBoundary { skill, next_unlock_xp } => WaitFor::SkillXpAtLeast {
                skill: *skill,
                target_xp: next_unlock_xp.unwrap_or(f64::INFINITY),
            },
            StopRule::StopAtGoal => WaitFor::Goal,
            StopRule::StopAtLevel { skill, level } => WaitFor::SkillXpAtLeast {
                skill: *skill,
                target_xp: start_xp_for_level(*level),
            },
            StopRule::StopWhenUpgradeAffordable { policy, cost } => WaitFor::InventoryValueAtLeast {
                policy: policy.clone(),
                target: *cost,
            },
            StopRule::StopWhenInputsDepleted { item } => WaitFor::InputsDepleted { item: *item },
        }
    }
}

/// Result of the wait-delta selector: the soonest positive tick delta at
/// which something interesting changes, and why.
#[derive(Debug, Clone)]
pub struct WaitDelta {
    pub delta_ticks: u64,
    pub wait_for: WaitFor,
}

/// Watched categories the enumerator hands to the wait-delta selector
/// (spec §4.7, items 2-8).
#[derive(Debug, Clone, Default)]
pub struct WatchedCategories {
    pub upgrade_affordability: Vec<(WaitFor, bool)>, // (wait, already_affordable)
    pub locked_activities: Vec<WaitFor>,
    pub inventory_full_watch: bool,
    pub inputs_depleted: Vec<WaitFor>,
    pub inputs_available: Vec<WaitFor>,
    pub next_unlock_level: Option<WaitFor>,
    pub next_mastery_boundary: Option<WaitFor>,
}

/// Computes the minimum positive wait delta, or `None` if the state is a
/// dead end (no positive progress projected anywhere).
pub fn next_decision_delta(
    state: &GameState,
    goal: &Goal,
    rates: &Rates,
    registries: &Registries,
    watched: &WatchedCategories,
    inventory_full_now: bool,
) -> Option<WaitDelta> {
    if goal.is_satisfied(state, registries) {
        return Some(WaitDelta { delta_ticks: 0, wait_for: WaitFor::Goal });
    }
    if watched.upgrade_affordability.iter().any(|(_, affordable)| *affordable) || inventory_full_now {
        return Some(WaitDelta {
            delta_ticks: 0,
            wait_for: WaitFor::InventoryFull,
        });
    }

    let goal_rate = match rates.skill {
        Some(skill) if goal.relevant_skills().contains(&skill) => rates.xp_per_tick,
        _ => rates.currency_per_tick,
    };
    let remaining = goal.remaining(state, registries);
    let ticks_to_goal = if goal_rate > 0.0 {
        Some((remaining / goal_rate).ceil() as u64)
    } else {
        None
    };

    let mut candidates: Vec<(u64, WaitFor)> = Vec::new();
    if let Some(t) = ticks_to_goal {
        candidates.push((t, WaitFor::Goal));
    }
    for (wait, _) in &watched.upgrade_affordability {
        if let Some(t) = wait.estimate_ticks(state, rates, registries) {
            candidates.push((t, wait.clone()));
        }
    }
    for wait in &watched.locked_activities {
        if let Some(t) = wait.estimate_ticks(state, rates, registries) {
            candidates.push((t, wait.clone()));
        }
    }
    if watched.inventory_full_watch {
        if let Some(t) = estimate_ticks_until_inventory_full(state, rates) {
            candidates.push((t, WaitFor::InventoryFull));
        }
    }
    for wait in &watched.inputs_depleted {
        if let Some(t) = wait.estimate_ticks(state, rates, registries) {
            candidates.push((t, wait.clone()));
        }
    }
    for wait in &watched.inputs_available {
        if let Some(t) = wait.estimate_ticks(state, rates, registries) {
            candidates.push((t, wait.clone()));
        }
    }
    if let Some(wait) = &watched.next_unlock_level {
        if let Some(t) = wait.estimate_ticks(state, rates, registries) {
            candidates.push((t, wait.clone()));
        }
    }
    if let Some(wait) = &watched.next_mastery_boundary {
        if let Some(t) = wait.estimate_ticks(state, rates, registries) {
            candidates.push((t, wait.clone()));
        }
    }

    candidates
        .into_iter()
        .filter(|(t, _)| *t > 0)
        .min_by_key(|(t, _)| *t)
        .map(|(delta_ticks, wait_for)| WaitDelta { delta_ticks, wait_for })
}

fn estimate_ticks_until_inventory_full(state: &GameState, rates: &Rates) -> Option<u64> {
    if state.inventory.is_full() {
        return Some(0);
    }
    // A new stack appears only when production targets an item not
    // already held; approximate with the fastest-producing new item.
    let slack = (state.inventory.capacity - state.inventory.distinct_stacks()) as f64;
    if slack <= 0.0 {
        return Some(0);
    }
    let fastest_new_item_rate = rates
        .produced_per_tick
        .iter()
        .filter(|(item, _)| state.inventory.count(**item) == 0)
        .map(|(_, rate)| *rate)
        .fold(0.0_f64, f64::max);
    if fastest_new_item_rate <= 0.0 {
        None
    } else {
        Some((slack / fastest_new_item_rate).ceil() as u64)
    }
}
