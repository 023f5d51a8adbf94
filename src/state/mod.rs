pub mod inventory;
pub mod skills;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use inventory::{Inventory, Stack};
pub use skills::{SkillState, level_for_xp, start_xp_for_level};

use crate::types::{ActionId, ItemId, Skill, ShopPurchaseId};

/// A newtype over currency identifiers; `GP` is the always-present
/// primary currency (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CurrencyId(pub u16);

impl CurrencyId {
    pub const GP: CurrencyId = CurrencyId(0);
}

/// Per-action progression: mastery XP, an optional recipe selection, and
/// an optional resource/respawn counter (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionState {
    pub mastery_xp: f64,
    pub recipe: Option<u16>,
    pub resource_counter: Option<u32>,
}

impl ActionState {
    pub fn mastery_level(&self) -> u32 {
        skills::level_for_xp(self.mastery_xp)
    }
}

/// The currently running action, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveAction {
    pub id: ActionId,
    pub remaining_ticks: u32,
    pub total_ticks: u32,
    pub stunned: bool,
}

/// Immutable snapshot of the whole simulated game. Advancement always
/// returns a new `GameState`; nothing here is mutated in place from the
/// outside (spec §3 ownership).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub currencies: HashMap<CurrencyId, u64>,
    pub skills: SkillState,
    pub action_state: HashMap<ActionId, ActionState>,
    pub inventory: Inventory,
    pub shop_state: HashMap<ShopPurchaseId, u32>,
    pub hp: u32,
    pub max_hp: u32,
    pub active_action: Option<ActiveAction>,
    /// Wall-clock timestamp, used only for welcome-back bookkeeping by
    /// the (out-of-scope) surrounding application.
    pub wall_clock_secs: u64,
}

impl GameState {
    pub fn new(inventory_capacity: usize, max_hp: u32) -> Self {
        Self {
            currencies: HashMap::new(),
            skills: SkillState::default(),
            action_state: HashMap::new(),
            inventory: Inventory::new(inventory_capacity),
            shop_state: HashMap::new(),
            hp: max_hp,
            max_hp,
            active_action: None,
            wall_clock_secs: 0,
        }
    }

    pub fn gp(&self) -> u64 {
        self.currencies.get(&CurrencyId::GP).copied().unwrap_or(0)
    }

    pub fn currency(&self, currency: CurrencyId) -> u64 {
        self.currencies.get(&currency).copied().unwrap_or(0)
    }

    pub fn action_state(&self, action: ActionId) -> ActionState {
        self.action_state.get(&action).cloned().unwrap_or_default()
    }

    pub fn purchase_count(&self, purchase: ShopPurchaseId) -> u32 {
        self.shop_state.get(&purchase).copied().unwrap_or(0)
    }

    /// Checks the invariants listed in spec §3. Debug-only — never
    /// relied on for correctness in release builds.
    pub fn debug_assert_invariants(&self) {
        debug_assert!(self.hp <= self.max_hp, "hp {} exceeds max {}", self.hp, self.max_hp);
        debug_assert!(
            self.inventory.distinct_stacks() <= self.inventory.capacity,
            "inventory over capacity"
        );
        for stack in self.inventory.stacks() {
            debug_assert!(stack.count >= 1, "zero-count stack for {:?}", stack.item);
        }
        if let Some(active) = self.active_action {
            debug_assert!(
                active.remaining_ticks <= active.total_ticks,
                "active action remaining exceeds total"
            );
        }
    }

    pub fn with_item(mut self, item: ItemId, count: u64) -> Self {
        self.inventory.add(item, count);
        self
    }

    pub fn with_gp(mut self, amount: u64) -> Self {
        self.currencies.insert(CurrencyId::GP, amount);
        self
    }
}

/// The mutation surface the external ticker uses to build a successor
/// state (spec §6: `StateBuilder`). A thin wrapper so the ticker never
/// needs direct field access to `GameState`.
pub struct StateBuilder {
    state: GameState,
}

impl StateBuilder {
    pub fn new(state: GameState) -> Self {
        Self { state }
    }

    pub fn set_active_action(&mut self, id: ActionId, total_ticks: u32) {
        self.state.active_action = Some(ActiveAction {
            id,
            remaining_ticks: total_ticks,
            total_ticks,
            stunned: false,
        });
    }

    pub fn clear_active_action(&mut self) {
        self.state.active_action = None;
    }

    pub fn tick_active_action(&mut self) {
        if let Some(active) = self.state.active_action.as_mut() {
            active.remaining_ticks = active.remaining_ticks.saturating_sub(1);
        }
    }

    pub fn set_stunned(&mut self, stunned: bool) {
        if let Some(active) = self.state.active_action.as_mut() {
            active.stunned = stunned;
        }
    }

    pub fn add_item(&mut self, item: ItemId, amount: u64) -> bool {
        self.state.inventory.add(item, amount)
    }

    pub fn remove_item(&mut self, item: ItemId, amount: u64) -> u64 {
        self.state.inventory.remove(item, amount)
    }

    pub fn adjust_currency(&mut self, currency: CurrencyId, delta: i64) {
        let entry = self.state.currencies.entry(currency).or_insert(0);
        *entry = (*entry as i64 + delta).max(0) as u64;
    }

    pub fn apply_xp(&mut self, skill: Skill, amount: f64) {
        self.state.skills.add_xp(skill, amount.max(0.0));
    }

    pub fn apply_mastery_xp(&mut self, action: ActionId, amount: f64) {
        let entry = self.state.action_state.entry(action).or_default();
        entry.mastery_xp += amount.max(0.0);
    }

    pub fn adjust_hp(&mut self, delta: i64) {
        let hp = (self.state.hp as i64 + delta).clamp(0, self.state.max_hp as i64);
        self.state.hp = hp as u32;
    }

    pub fn finalize(self) -> GameState {
        self.state
    }
}
