use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Skill, ShopPurchaseId};

/// Cost of a purchase. Bank slots reprice with each purchase already
/// made (`cost(n)` depends on `n`); everything else is a fixed list of
/// currency amounts (spec §3: "bank-slot pricing is dynamic").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CostDescriptor {
    Fixed(Vec<u64>),
    BankSlot { base: u64, growth_per_slot: u64 },
}

impl CostDescriptor {
    /// Cost of the `owned`-th unit of this purchase (0-indexed).
    pub fn cost_at(&self, owned: u32) -> u64 {
        match self {
            CostDescriptor::Fixed(costs) => costs
                .get(owned as usize)
                .copied()
                .or_else(|| costs.last().copied())
                .unwrap_or(0),
            CostDescriptor::BankSlot {
                base,
                growth_per_slot,
            } => base + (*growth_per_slot) * (owned as u64),
        }
    }

    /// The enumerator restricts candidate *purchases* to exactly one
    /// currency component (spec §9 open question); dynamic bank-slot
    /// pricing is multi-component and so is watch-only unless this
    /// returns true.
    pub fn has_single_currency_component(&self) -> bool {
        matches!(self, CostDescriptor::Fixed(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopPurchase {
    pub id: ShopPurchaseId,
    pub name: String,
    pub unlock_requirements: Vec<(Skill, u32)>,
    pub purchase_requirements: Vec<(Skill, u32)>,
    pub buy_limit: u32,
    pub is_unlimited: bool,
    pub cost: CostDescriptor,
    /// Multiplicative modifier applied to mean action duration for
    /// `affected_skills`, e.g. 0.1 for a 10% speed boost. 0.0 if this
    /// purchase is not a skill-duration upgrade.
    pub duration_multiplier: f64,
    pub affected_skills: Vec<Skill>,
}

impl ShopPurchase {
    pub fn is_skill_upgrade(&self) -> bool {
        self.duration_multiplier != 0.0 && !self.affected_skills.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShopRegistry {
    by_id: HashMap<ShopPurchaseId, ShopPurchase>,
    /// All ids sorted by `ShopPurchaseId`, so `all`/`for_skill` iterate in
    /// a process-independent order (spec §5 determinism).
    ordered_ids: Vec<ShopPurchaseId>,
    by_skill: HashMap<Skill, Vec<ShopPurchaseId>>,
}

impl ShopRegistry {
    pub fn build(purchases: Vec<ShopPurchase>) -> Self {
        let mut by_id = HashMap::with_capacity(purchases.len());
        let mut by_skill: HashMap<Skill, Vec<ShopPurchaseId>> = HashMap::new();
        for purchase in purchases {
            for &skill in &purchase.affected_skills {
                by_skill.entry(skill).or_default().push(purchase.id);
            }
            by_id.insert(purchase.id, purchase);
        }
        let mut ordered_ids: Vec<ShopPurchaseId> = by_id.keys().copied().collect();
        ordered_ids.sort();
        for ids in by_skill.values_mut() {
            ids.sort();
        }
        Self {
            by_id,
            ordered_ids,
            by_skill,
        }
    }

    pub fn by_id(&self, id: ShopPurchaseId) -> Option<&ShopPurchase> {
        self.by_id.get(&id)
    }

    pub fn all(&self) -> impl Iterator<Item = &ShopPurchase> {
        self.ordered_ids.iter().filter_map(|id| self.by_id.get(id))
    }

    pub fn for_skill(&self, skill: Skill) -> impl Iterator<Item = &ShopPurchase> {
        self.by_skill
            .get(&skill)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.by_id.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_cost_clamps_to_last_entry() {
        let cost = CostDescriptor::Fixed(vec![100, 200, 300]);
        assert_eq!(cost.cost_at(0), 100);
        assert_eq!(cost.cost_at(5), 300);
    }

    #[test]
    fn bank_slot_cost_grows_linearly() {
        let cost = CostDescriptor::BankSlot {
            base: 1000,
            growth_per_slot: 500,
        };
        assert_eq!(cost.cost_at(0), 1000);
        assert_eq!(cost.cost_at(4), 3000);
        assert!(!cost.has_single_currency_component());
    }

    fn purchase(local: u32, skills: Vec<Skill>) -> ShopPurchase {
        ShopPurchase {
            id: ShopPurchaseId::new(0, local),
            name: format!("purchase-{local}"),
            unlock_requirements: vec![],
            purchase_requirements: vec![],
            buy_limit: 1,
            is_unlimited: false,
            cost: CostDescriptor::Fixed(vec![10]),
            duration_multiplier: -0.1,
            affected_skills: skills,
        }
    }

    #[test]
    fn for_skill_and_all_are_sorted_by_id() {
        let reg = ShopRegistry::build(vec![
            purchase(5, vec![Skill::Woodcutting]),
            purchase(1, vec![Skill::Woodcutting]),
            purchase(3, vec![Skill::Woodcutting]),
        ]);
        let ids: Vec<_> = reg.for_skill(Skill::Woodcutting).map(|p| p.id.local).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        let all_ids: Vec<_> = reg.all().map(|p| p.id.local).collect();
        assert_eq!(all_ids, vec![1, 3, 5]);
    }
}
