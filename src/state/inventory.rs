use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::types::ItemId;

/// One (item, count) stack. Count is always `>= 1`; a stack that would
/// reach zero is removed from the inventory entirely (spec invariant:
/// "each inventory stack count >= 1").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    pub item: ItemId,
    pub count: u64,
}

/// Ordered sequence of stacks bounded by a declared capacity (spec §3).
/// Backed by `smallvec` since most real inventories stay within a
/// handful of distinct item types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    stacks: SmallVec<[Stack; 12]>,
    pub capacity: usize,
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self {
            stacks: SmallVec::new(),
            capacity,
        }
    }

    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn count(&self, item: ItemId) -> u64 {
        self.stacks
            .iter()
            .find(|s| s.item == item)
            .map(|s| s.count)
            .unwrap_or(0)
    }

    pub fn distinct_stacks(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_full(&self) -> bool {
        self.distinct_stacks() >= self.capacity
    }

    pub fn fraction_full(&self) -> f64 {
        if self.capacity == 0 {
            return 1.0;
        }
        self.distinct_stacks() as f64 / self.capacity as f64
    }

    /// Adds `amount` of `item`, creating a new stack if needed. Returns
    /// `false` (no-op) if a new stack would be required but the
    /// inventory is already at capacity.
    #[must_use]
    pub fn add(&mut self, item: ItemId, amount: u64) -> bool {
        if amount == 0 {
            return true;
        }
        if let Some(stack) = self.stacks.iter_mut().find(|s| s.item == item) {
            stack.count += amount;
            return true;
        }
        if self.is_full() {
            return false;
        }
        self.stacks.push(Stack { item, count: amount });
        true
    }

    /// Removes up to `amount` of `item`, clamping to what is available.
    /// Returns the amount actually removed.
    pub fn remove(&mut self, item: ItemId, amount: u64) -> u64 {
        let Some(idx) = self.stacks.iter().position(|s| s.item == item) else {
            return 0;
        };
        let removed = amount.min(self.stacks[idx].count);
        self.stacks[idx].count -= removed;
        if self.stacks[idx].count == 0 {
            self.stacks.remove(idx);
        }
        removed
    }

    pub fn sell_value(&self, items: &crate::registries::ItemRegistry, keep: &[ItemId]) -> u64 {
        self.stacks
            .iter()
            .filter(|s| !keep.contains(&s.item))
            .map(|s| items.sell_price(s.item) * s.count)
            .sum()
    }

    pub fn sell_all(&mut self, items: &crate::registries::ItemRegistry, keep: &[ItemId]) -> u64 {
        let mut total = 0;
        self.stacks.retain(|s| {
            if keep.contains(&s.item) {
                true
            } else {
                total += items.sell_price(s.item) * s.count;
                false
            }
        });
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(n: u32) -> ItemId {
        ItemId::new(0, n)
    }

    #[test]
    fn add_rejects_new_stack_at_capacity() {
        let mut inv = Inventory::new(1);
        assert!(inv.add(item(1), 5));
        assert!(!inv.add(item(2), 1));
        assert_eq!(inv.count(item(1)), 5);
        assert_eq!(inv.count(item(2)), 0);
    }

    #[test]
    fn add_to_existing_stack_never_blocked_by_capacity() {
        let mut inv = Inventory::new(1);
        assert!(inv.add(item(1), 5));
        assert!(inv.add(item(1), 3));
        assert_eq!(inv.count(item(1)), 8);
    }

    #[test]
    fn remove_clears_empty_stacks() {
        let mut inv = Inventory::new(4);
        inv.add(item(1), 3);
        assert_eq!(inv.remove(item(1), 10), 3);
        assert_eq!(inv.distinct_stacks(), 0);
    }

    #[test]
    fn fraction_full_tracks_distinct_stacks_not_counts() {
        let mut inv = Inventory::new(4);
        inv.add(item(1), 1000);
        assert_eq!(inv.fraction_full(), 0.25);
    }
}
