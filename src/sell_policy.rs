//! Sell policy (spec §4.4): which inventory items count toward
//! "effective credits" versus are reserved as production inputs.

use std::collections::HashSet;

use crate::registries::Registries;
use crate::state::GameState;
use crate::types::{ItemId, Skill};

/// A concrete policy: always sell-all, or sell everything except a
/// fixed keep-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SellPolicy {
    SellAll,
    SellExcept(HashSet<ItemId>),
}

impl SellPolicy {
    /// Items this policy reserves rather than sells.
    pub fn keep_set(&self) -> HashSet<ItemId> {
        match self {
            SellPolicy::SellAll => HashSet::new(),
            SellPolicy::SellExcept(keep) => keep.clone(),
        }
    }

    /// Primary currency plus the sell value of every stack not in the
    /// keep set.
    pub fn effective_credits(&self, state: &GameState, registries: &Registries) -> u64 {
        let keep_vec: Vec<ItemId> = self.keep_set().into_iter().collect();
        state.gp() + state.inventory.sell_value(&registries.items, &keep_vec)
    }
}

/// A *spec* for deriving a concrete `SellPolicy` from a state and goal,
/// rather than the policy itself (spec §4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SellPolicySpec {
    SellAll,
    ReserveConsumingInputs,
}

impl SellPolicySpec {
    pub fn resolve(
        &self,
        registries: &Registries,
        consuming_skills: &[Skill],
    ) -> SellPolicy {
        match self {
            SellPolicySpec::SellAll => SellPolicy::SellAll,
            SellPolicySpec::ReserveConsumingInputs => {
                let mut keep = HashSet::new();
                for &skill in consuming_skills {
                    for action in registries.actions.for_skill(skill) {
                        for recipe in &action.recipes {
                            for (item, _) in &recipe.inputs {
                                keep.insert(*item);
                            }
                        }
                    }
                }
                SellPolicy::SellExcept(keep)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registries::{Action, ActionRegistry, Item, ItemRegistry, Recipe, ShopRegistry};
    use crate::types::ActionId;

    fn registries() -> Registries {
        let log = ItemId::new(1, 1);
        let action = Action {
            id: ActionId::new(0, 1),
            skill: Skill::Firemaking,
            unlock_level: 1,
            mean_duration_ticks: 5.0,
            xp: 10.0,
            mastery_xp: 1.0,
            outputs: vec![],
            recipes: vec![Recipe {
                id: 0,
                inputs: vec![(log, 1)],
            }],
            is_skill_action: true,
            thieving: None,
        };
        Registries::new(
            ActionRegistry::build(vec![action]),
            ItemRegistry::build(vec![Item {
                id: log,
                sell_price: 5,
            }]),
            ShopRegistry::build(vec![]),
        )
    }

    #[test]
    fn reserve_consuming_inputs_keeps_unlocked_action_inputs() {
        let registries = registries();
        let policy = SellPolicySpec::ReserveConsumingInputs
            .resolve(&registries, &[Skill::Firemaking]);
        match policy {
            SellPolicy::SellExcept(keep) => assert!(keep.contains(&ItemId::new(1, 1))),
            _ => panic!("expected SellExcept"),
        }
    }

    #[test]
    fn sell_all_has_empty_keep_set() {
        let policy = SellPolicySpec::SellAll.resolve(&registries(), &[Skill::Firemaking]);
        assert_eq!(policy, SellPolicy::SellAll);
    }

    #[test]
    fn effective_credits_includes_sellable_inventory() {
        let registries = registries();
        let mut state = GameState::new(10, 10).with_gp(100);
        state.inventory.add(ItemId::new(1, 1), 4);
        let credits = SellPolicy::SellAll.effective_credits(&state, &registries);
        assert_eq!(credits, 100 + 20);
    }
}
