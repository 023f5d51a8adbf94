//! Error taxonomy for the solver core (spec §7).
//!
//! The core never panics across its public API: every failure path is a
//! reified variant here. Internal precondition checks (negative
//! deltaTicks, monotone-XP) are `debug_assert!`s, not `Result`s — they
//! are debug aids only and must never be relied on for correctness.

use thiserror::Error;

use crate::types::{ActionId, ItemId, ShopPurchaseId};

/// Why a `solve()` call failed to produce a plan, independent of the
/// search-progress diagnostics carried alongside it in `SolverFailure`.
#[derive(Debug, Clone, Error)]
pub enum SolverFailureReason {
    #[error("no path to goal found within budget")]
    NoPathToGoal,
    #[error("exceeded max expanded nodes ({expanded}/{max})")]
    ExceededMaxExpandedNodes { expanded: usize, max: usize },
    #[error("exceeded max queue size ({size}/{max})")]
    ExceededMaxQueueSize { size: usize, max: usize },
    #[error("prerequisite for {action} unresolvable: {reason}")]
    PrerequisiteUnresolvable { action: ActionId, reason: PrereqError },
}

/// Why a `solve()` call failed, plus the diagnostics the caller needs to
/// judge how close it got (spec §7): nodes expanded and enqueued, and the
/// best fractional progress toward the goal any visited state reached.
#[derive(Debug, Clone, Error)]
#[error("{reason} (expanded {expanded_nodes}, enqueued {enqueued_nodes}, best progress {best_progress:.3})")]
pub struct SolverFailure {
    pub reason: SolverFailureReason,
    pub expanded_nodes: usize,
    pub enqueued_nodes: usize,
    pub best_progress: f64,
}

/// Why `ensureExecutable` could not produce a ready-to-run macro list.
#[derive(Debug, Clone, Error)]
pub enum PrereqError {
    #[error("no producer for item {0}")]
    NoProducer(ItemId),
    #[error("cycle detected resolving prerequisites for {0}")]
    Cycle(ActionId),
    #[error("prerequisite depth limit ({0}) exceeded")]
    DepthLimitExceeded(u32),
}

/// Non-fatal reasons execution of a plan stopped before completion.
/// Deaths are deliberately absent: they are absorbed by the state
/// advancer's death-cycle model and never surface as a boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplanBoundary {
    #[error("goal reached")]
    GoalReached,
    #[error("inputs depleted for {action}: missing {missing_item}")]
    InputsDepleted {
        action: ActionId,
        missing_item: ItemId,
    },
    #[error("inventory full")]
    InventoryFull,
    #[error("wait condition satisfied early")]
    WaitConditionSatisfied,
    #[error("upgrade {purchase} affordable early at cost {cost}")]
    UpgradeAffordableEarly { purchase: ShopPurchaseId, cost: u64 },
    #[error("unexpected unlock of action {0}")]
    UnexpectedUnlock(ActionId),
}

/// Errors that indicate an invalid plan or a bug in the solver rather
/// than an expected runtime condition.
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    #[error("cannot afford purchase {purchase}: cost {cost}, available {available}")]
    CannotAfford {
        purchase: ShopPurchaseId,
        cost: u64,
        available: u64,
    },
    #[error("action {action} unavailable: {reason}")]
    ActionUnavailable { action: ActionId, reason: String },
    #[error("no progress possible: {0}")]
    NoProgressPossible(String),
}
