use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{ActionId, ItemId, Skill};

/// A recipe is a named set of inputs an action can be configured to
/// consume (e.g. a smithing action that can be pointed at different ore
/// bars). Most actions have exactly one, unnamed, recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: u16,
    pub inputs: Vec<(ItemId, u32)>,
}

/// Thieving-only success-model parameters (spec §4.1).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThievingParams {
    pub perception: f64,
    pub max_gold: f64,
    pub max_hit: f64,
    pub stun_ticks: u32,
}

/// Read-only catalog entry for a single action (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub skill: Skill,
    pub unlock_level: u32,
    /// Base mean duration in ticks, before shop duration modifiers.
    pub mean_duration_ticks: f64,
    pub xp: f64,
    pub mastery_xp: f64,
    pub outputs: Vec<(ItemId, u32)>,
    pub recipes: Vec<Recipe>,
    pub is_skill_action: bool,
    pub thieving: Option<ThievingParams>,
}

impl Action {
    pub fn is_combat(&self) -> bool {
        !self.is_skill_action
    }

    pub fn has_inputs(&self) -> bool {
        self.recipes.iter().any(|r| !r.inputs.is_empty())
    }

    /// Inputs for the given recipe selection, or the first recipe if none
    /// is selected (spec: "optional recipe selection").
    pub fn inputs_for(&self, recipe_id: Option<u16>) -> &[(ItemId, u32)] {
        let recipe = match recipe_id {
            Some(id) => self.recipes.iter().find(|r| r.id == id),
            None => self.recipes.first(),
        };
        recipe.map(|r| r.inputs.as_slice()).unwrap_or(&[])
    }
}

/// Immutable, process-wide catalog of actions, keyed by id and by skill.
/// Built once by the external loader and shared read-only thereafter.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    by_id: HashMap<ActionId, Action>,
    by_skill: HashMap<Skill, Vec<ActionId>>,
}

impl ActionRegistry {
    pub fn build(actions: Vec<Action>) -> Self {
        let mut by_id = HashMap::with_capacity(actions.len());
        let mut by_skill: HashMap<Skill, Vec<ActionId>> = HashMap::new();
        for action in actions {
            by_skill.entry(action.skill).or_default().push(action.id);
            by_id.insert(action.id, action);
        }
        for ids in by_skill.values_mut() {
            ids.sort_by_key(|id| by_id[id].unlock_level);
        }
        Self { by_id, by_skill }
    }

    pub fn by_id(&self, id: ActionId) -> Option<&Action> {
        self.by_id.get(&id)
    }

    pub fn for_skill(&self, skill: Skill) -> impl Iterator<Item = &Action> {
        self.by_skill
            .get(&skill)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.by_id.get(id))
    }

    pub fn all(&self) -> impl Iterator<Item = &Action> {
        self.by_id.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(id: u32, skill: Skill, unlock: u32) -> Action {
        Action {
            id: ActionId::new(0, id),
            skill,
            unlock_level: unlock,
            mean_duration_ticks: 10.0,
            xp: 5.0,
            mastery_xp: 1.0,
            outputs: vec![],
            recipes: vec![],
            is_skill_action: true,
            thieving: None,
        }
    }

    #[test]
    fn for_skill_is_sorted_by_unlock_level() {
        let reg = ActionRegistry::build(vec![
            action(1, Skill::Woodcutting, 30),
            action(2, Skill::Woodcutting, 1),
            action(3, Skill::Woodcutting, 15),
        ]);
        let ids: Vec<_> = reg
            .for_skill(Skill::Woodcutting)
            .map(|a| a.unlock_level)
            .collect();
        assert_eq!(ids, vec![1, 15, 30]);
    }

    #[test]
    fn by_id_misses_return_none() {
        let reg = ActionRegistry::build(vec![action(1, Skill::Fishing, 1)]);
        assert!(reg.by_id(ActionId::new(0, 99)).is_none());
    }
}
