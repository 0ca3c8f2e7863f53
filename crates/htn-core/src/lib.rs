// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! htn-core: hierarchical task network planning.
//!
//! A [`Domain`] declares primitive actions, execution-time commands, and
//! methods that refine tasks, single-relation goals, and multigoals into
//! subtasks. A [`Planner`] turns a [`State`] plus a todo list into a [`Plan`]
//! with one of three strategies:
//!
//! - [`Planner::find_plan`]: backtracking depth-first decomposition, methods
//!   tried in declaration order;
//! - [`Planner::find_plan_gbfs`] / [`Planner::find_plan_astar`]: best-first
//!   search over `(state, todo)` nodes guided by a heuristic;
//! - [`Planner::run_lazy_lookahead`]: plan, execute with commands, and replan
//!   when the world deviates from the model.
//!
//! Planning is deterministic: identical inputs produce identical plans.
#![forbid(unsafe_code)]

mod domain;
mod error;
mod lookahead;
mod multigoal;
mod planner;
mod search;
mod split;
mod state;
mod todo;
mod value;

/// Domain tables and callables.
pub use domain::{
    Action, ActionFn, Command, Domain, DomainRegistry, DomainSummary, GoalMethod, GoalMethodFn,
    MultigoalMethod, MultigoalMethodFn, Outcome, TaskMethod, TaskMethodFn,
};
/// Error enums for registration and planning.
pub use error::{CallableKind, DomainError, PlanError};
/// Execution driver.
pub use lookahead::{LookaheadOutcome, LookaheadReport};
pub use multigoal::Multigoal;
/// Depth-first planner and its bounds.
pub use planner::{Planner, PlannerConfig, SearchStats, DEFAULT_MAX_DEPTH};
/// Heuristic search.
pub use search::{unit_cost, CostFn, Heuristic, SearchMode};
pub use split::{split_goals, split_goals_method, SPLIT_GOALS};
pub use state::{Relation, State};
pub use todo::{Call, Goal, Listed, Plan, Todo};
pub use value::Value;
