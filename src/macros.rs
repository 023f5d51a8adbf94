//! Macro primitives (spec §4.6): composite plan steps the search treats
//! as a single atomic unit, plus the prerequisite resolver that expands
//! a macro into the chain of sub-macros it depends on.

use std::collections::{HashMap, HashSet};

use crate::error::PrereqError;
use crate::registries::Registries;
use crate::sell_policy::SellPolicySpec;
use crate::state::GameState;
use crate::types::{ActionId, ItemId, Skill};
use crate::wait::{StopRule, WaitFor};

const MAX_PREREQ_DEPTH: u32 = 8;

/// Default cap on how many times the coupled produce/consume loop (spec
/// §4.6) may fall back to selling inventory to recover stalled inputs
/// before giving up.
pub const DEFAULT_MAX_RECOVERY_ATTEMPTS: u32 = 3;

/// A composite plan step (spec §4.6). Each variant names its own
/// stop rule; the executor runs the underlying activity until that
/// rule is satisfied.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroSpec {
    TrainSkillUntil {
        skill: Skill,
        target_level: u32,
        /// The specific action to train with, if the caller already
        /// picked one; `None` lets the executor choose the best unlocked
        /// action for `skill` at dispatch time.
        action: Option<ActionId>,
        /// Extra stop conditions (beyond reaching `target_level`) the
        /// executor should also watch for, e.g. an unlock boundary.
        watched_stops: Vec<WaitFor>,
    },
    TrainConsumingSkillUntil {
        skill: Skill,
        target_level: u32,
        action: ActionId,
        recipe: Option<u16>,
        /// Which action produces each input item the recipe consumes,
        /// so the coupled loop can switch to a producer without
        /// re-resolving prerequisites every cycle.
        producer_by_input_item: HashMap<ItemId, ActionId>,
        /// How many units of each input to stock up on before switching
        /// back to the consuming action.
        buffer_target: u64,
        /// Sell policy applied when the coupled loop needs to recover
        /// from a full inventory mid-production.
        sell_policy_spec: SellPolicySpec,
        /// Recovery-sell attempts allowed before the loop gives up as
        /// `NoProgressPossible`.
        max_recovery_attempts: u32,
        watched_stops: Vec<WaitFor>,
    },
    AcquireItem { item: ItemId, qty: u64 },
    EnsureStock { item: ItemId, qty: u64 },
}

impl MacroSpec {
    pub fn stop_rule(&self) -> StopRule {
        match *self {
            MacroSpec::TrainSkillUntil { skill, target_level, .. } => {
                StopRule::StopAtLevel { skill, level: target_level }
            }
            MacroSpec::TrainConsumingSkillUntil { skill, target_level, .. } => {
                StopRule::StopAtLevel { skill, level: target_level }
            }
            MacroSpec::AcquireItem { item, .. } | MacroSpec::EnsureStock { item, .. } => {
                StopRule::StopWhenInputsDepleted { item }
            }
        }
    }

    pub fn description(&self) -> String {
        match self {
            MacroSpec::TrainSkillUntil { skill, target_level, .. } => {
                format!("train {skill:?} to level {target_level}")
            }
            MacroSpec::TrainConsumingSkillUntil { skill, target_level, action, .. } => {
                format!("train {skill:?} to level {target_level} via {action}")
            }
            MacroSpec::AcquireItem { item, qty } => format!("acquire {qty} of {item}"),
            MacroSpec::EnsureStock { item, qty } => format!("ensure stock of {qty} {item}"),
        }
    }
}

/// Outcome of resolving a macro's prerequisites (spec §4.6).
#[derive(Debug, Clone, PartialEq)]
pub enum PrereqOutcome {
    Ready,
    NeedsMacros(Vec<MacroSpec>),
    Unknown(String),
}

/// For consuming skills, walks the recipe graph backward from `macro_spec`
/// and determines whether its inputs are already satisfiable, or which
/// sub-macros (recursively) must run first. Cycle and depth-limit
/// detection guard against malformed recipe graphs (spec §4.6).
pub fn ensure_executable(
    macro_spec: &MacroSpec,
    state: &GameState,
    registries: &Registries,
) -> Result<PrereqOutcome, PrereqError> {
    let mut visiting = HashSet::new();
    resolve(macro_spec, state, registries, &mut visiting, 0)
}

fn resolve(
    macro_spec: &MacroSpec,
    state: &GameState,
    registries: &Registries,
    visiting: &mut HashSet<ActionId>,
    depth: u32,
) -> Result<PrereqOutcome, PrereqError> {
    if depth > MAX_PREREQ_DEPTH {
        return Err(PrereqError::DepthLimitExceeded(MAX_PREREQ_DEPTH));
    }

    let (action_id, recipe, qty) = match *macro_spec {
        MacroSpec::TrainSkillUntil { .. } => return Ok(PrereqOutcome::Ready),
        MacroSpec::TrainConsumingSkillUntil { action, recipe, .. } => (action, recipe, 1),
        MacroSpec::AcquireItem { item, qty } | MacroSpec::EnsureStock { item, qty } => {
            match find_producer(item, registries) {
                Some(action) => (action.id, None, qty),
                None => return Err(PrereqError::NoProducer(item)),
            }
        }
    };

    if !visiting.insert(action_id) {
        return Err(PrereqError::Cycle(action_id));
    }

    let action = registries
        .actions
        .by_id(action_id)
        .ok_or(PrereqError::NoProducer(ItemId::new(0, 0)))?;

    let mut needed = Vec::new();
    for &(input_item, input_qty) in action.inputs_for(recipe) {
        let have = state.inventory.count(input_item);
        let required = input_qty as u64 * qty.max(1);
        if have >= required {
            continue;
        }
        let deficit = required - have;
        let sub_macro = MacroSpec::AcquireItem { item: input_item, qty: deficit };
        match resolve(&sub_macro, state, registries, visiting, depth + 1)? {
            PrereqOutcome::Ready => needed.push(sub_macro),
            PrereqOutcome::NeedsMacros(mut chain) => {
                chain.push(sub_macro);
                needed.extend(chain);
            }
            unknown @ PrereqOutcome::Unknown(_) => {
                visiting.remove(&action_id);
                return Ok(unknown);
            }
        }
    }

    visiting.remove(&action_id);

    if needed.is_empty() {
        Ok(PrereqOutcome::Ready)
    } else {
        Ok(PrereqOutcome::NeedsMacros(needed))
    }
}

pub(crate) fn find_producer<'a>(
    item: ItemId,
    registries: &'a Registries,
) -> Option<&'a crate::registries::Action> {
    registries
        .actions
        .all()
        .find(|a| a.outputs.iter().any(|(out_item, _)| *out_item == item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registries::{Action, ActionRegistry, ItemRegistry, Recipe, ShopRegistry};

    fn logs_and_planks() -> (ItemId, ItemId, Registries) {
        let log = ItemId::new(1, 1);
        let plank = ItemId::new(1, 2);
        let chop = Action {
            id: ActionId::new(0, 1),
            skill: Skill::Woodcutting,
            unlock_level: 1,
            mean_duration_ticks: 5.0,
            xp: 10.0,
            mastery_xp: 1.0,
            outputs: vec![(log, 1)],
            recipes: vec![Recipe { id: 0, inputs: vec![] }],
            is_skill_action: true,
            thieving: None,
        };
        let craft = Action {
            id: ActionId::new(0, 2),
            skill: Skill::Smithing,
            unlock_level: 1,
            mean_duration_ticks: 5.0,
            xp: 10.0,
            mastery_xp: 1.0,
            outputs: vec![(plank, 1)],
            recipes: vec![Recipe { id: 0, inputs: vec![(log, 2)] }],
            is_skill_action: true,
            thieving: None,
        };
        let registries = Registries::new(
            ActionRegistry::build(vec![chop, craft]),
            ItemRegistry::build(vec![]),
            ShopRegistry::build(vec![]),
        );
        (log, plank, registries)
    }

    fn train_smithing(log: ItemId) -> MacroSpec {
        MacroSpec::TrainConsumingSkillUntil {
            skill: Skill::Smithing,
            target_level: 2,
            action: ActionId::new(0, 2),
            recipe: None,
            producer_by_input_item: HashMap::from([(log, ActionId::new(0, 1))]),
            buffer_target: 10,
            sell_policy_spec: SellPolicySpec::ReserveConsumingInputs,
            max_recovery_attempts: DEFAULT_MAX_RECOVERY_ATTEMPTS,
            watched_stops: vec![],
        }
    }

    #[test]
    fn ready_when_inputs_already_held() {
        let (log, _plank, registries) = logs_and_planks();
        let state = GameState::new(10, 10).with_item(log, 10);
        let m = train_smithing(log);
        let outcome = ensure_executable(&m, &state, &registries).unwrap();
        assert_eq!(outcome, PrereqOutcome::Ready);
    }

    #[test]
    fn needs_sub_macro_when_input_missing() {
        let (log, _plank, registries) = logs_and_planks();
        let state = GameState::new(10, 10);
        let m = train_smithing(log);
        let outcome = ensure_executable(&m, &state, &registries).unwrap();
        match outcome {
            PrereqOutcome::NeedsMacros(chain) => {
                assert!(chain.iter().any(|c| matches!(c, MacroSpec::AcquireItem { item, .. } if *item == log)));
            }
            other => panic!("expected NeedsMacros, got {other:?}"),
        }
    }

    #[test]
    fn missing_producer_is_an_error() {
        let (_log, _plank, registries) = logs_and_planks();
        let state = GameState::new(10, 10);
        let m = MacroSpec::AcquireItem { item: ItemId::new(9, 9), qty: 1 };
        let err = ensure_executable(&m, &state, &registries).unwrap_err();
        assert!(matches!(err, PrereqError::NoProducer(_)));
    }
}
