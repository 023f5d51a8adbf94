use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::ItemId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub sell_price: u64,
}

/// Immutable catalog of items. Identifiers unknown to this registry are
/// ignored by the advancer (spec §4.2: "no synthesis").
#[derive(Debug, Clone, Default)]
pub struct ItemRegistry {
    by_id: HashMap<ItemId, Item>,
}

impl ItemRegistry {
    pub fn build(items: Vec<Item>) -> Self {
        let by_id = items.into_iter().map(|item| (item.id, item)).collect();
        Self { by_id }
    }

    pub fn by_id(&self, id: ItemId) -> Option<&Item> {
        self.by_id.get(&id)
    }

    pub fn sell_price(&self, id: ItemId) -> u64 {
        self.by_id.get(&id).map(|i| i.sell_price).unwrap_or(0)
    }

    pub fn all(&self) -> impl Iterator<Item = &Item> {
        self.by_id.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_item_has_zero_sell_price() {
        let reg = ItemRegistry::build(vec![]);
        assert_eq!(reg.sell_price(ItemId::new(0, 1)), 0);
    }
}
