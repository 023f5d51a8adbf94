#![warn(clippy::all)]
#![deny(rust_2018_idioms)]

pub mod advance;
pub mod cache;
pub mod candidates;
pub mod error;
pub mod executor;
pub mod goal;
pub mod macros;
pub mod plan;
pub mod profiling;
pub mod rates;
pub mod registries;
pub mod search;
pub mod sell_policy;
pub mod state;
pub mod types;
pub mod unlock;
pub mod wait;
pub mod watch;

pub use advance::{advance, advance_deterministic, advance_expected, advance_full_sim, StopReason, Ticker};
pub use error::{ExecutionError, PrereqError, ReplanBoundary, SolverFailure, SolverFailureReason};
pub use executor::{execute_plan, PlanExecutionOutcome, PlanExecutionResult};
pub use goal::{Goal, PersistentGoal};
pub use plan::{Plan, SegmentMarker, Step};
pub use profiling::{CacheStats, DominanceStats, SolveProfile};
pub use registries::Registries;
pub use search::{solve, SolverConfig, SolverOutcome};
pub use state::GameState;
pub use types::{ActionId, Id, ItemId, NamespaceId, ShopPurchaseId, Skill};
pub use watch::{SegmentConfig, WatchSet};
