//! Unlock-boundary computation (spec §4.8): the set of skill levels at
//! which some action or skill-relevant shop purchase becomes available,
//! used by `WatchSet` to detect "unlock boundary" segment transitions.

use std::collections::HashMap;

use crate::registries::Registries;
use crate::types::Skill;

/// For every skill, the sorted, deduplicated list of levels at which an
/// action unlocks or a skill-relevant purchase's `unlock_requirements`
/// are met.
pub fn compute_unlock_boundaries(registries: &Registries) -> HashMap<Skill, Vec<u32>> {
    let mut boundaries: HashMap<Skill, Vec<u32>> = HashMap::new();

    for action in registries.actions.all() {
        if action.unlock_level > 0 {
            boundaries.entry(action.skill).or_default().push(action.unlock_level);
        }
    }

    for purchase in registries.shop.all() {
        for &(skill, level) in &purchase.unlock_requirements {
            boundaries.entry(skill).or_default().push(level);
        }
    }

    for levels in boundaries.values_mut() {
        levels.sort_unstable();
        levels.dedup();
    }

    boundaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registries::{Action, ActionRegistry, ItemRegistry, Recipe, ShopPurchase, CostDescriptor, ShopRegistry};
    use crate::types::{ActionId, ItemId, ShopPurchaseId};

    #[test]
    fn collects_action_unlock_levels_per_skill() {
        let action_a = Action {
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
        let action_b = Action {
            unlock_level: 20,
            ..action_a.clone()
        };
        let registries = Registries::new(
            ActionRegistry::build(vec![action_a, action_b]),
            ItemRegistry::build(vec![]),
            ShopRegistry::build(vec![]),
        );
        let boundaries = compute_unlock_boundaries(&registries);
        assert_eq!(boundaries.get(&Skill::Woodcutting), Some(&vec![1, 20]));
    }

    #[test]
    fn includes_purchase_unlock_requirements() {
        let purchase = ShopPurchase {
            id: ShopPurchaseId::new(0, 1),
            name: "Axe".into(),
            unlock_requirements: vec![(Skill::Woodcutting, 30)],
            purchase_requirements: vec![],
            buy_limit: 1,
            is_unlimited: false,
            cost: CostDescriptor::Fixed(vec![1000]),
            duration_multiplier: 0.1,
            affected_skills: vec![Skill::Woodcutting],
        };
        let registries = Registries::new(
            ActionRegistry::build(vec![]),
            ItemRegistry::build(vec![]),
            ShopRegistry::build(vec![purchase]),
        );
        let boundaries = compute_unlock_boundaries(&registries);
        assert_eq!(boundaries.get(&Skill::Woodcutting), Some(&vec![30]));
    }
}
