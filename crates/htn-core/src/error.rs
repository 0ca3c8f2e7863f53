// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types for domain registration and planning.
//!
//! Search dead ends (failed preconditions, inapplicable methods, failed
//! verifications, exhaustion) are not errors; they drive backtracking and
//! surface as `Ok(None)`. The variants here mark domain-authoring bugs or an
//! exceeded search budget and abort the planning call immediately.

use std::fmt;

use thiserror::Error;

/// Which kind of callable an arity or contract error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableKind {
    /// Planning-time action.
    Action,
    /// Execution-time command.
    Command,
    /// Task method.
    TaskMethod,
    /// Goal method.
    GoalMethod,
    /// Multigoal method.
    MultigoalMethod,
    /// Search heuristic or cost function.
    Heuristic,
}

impl fmt::Display for CallableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Action => "action",
            Self::Command => "command",
            Self::TaskMethod => "task method",
            Self::GoalMethod => "goal method",
            Self::MultigoalMethod => "multigoal method",
            Self::Heuristic => "heuristic",
        })
    }
}

/// Errors raised while building or selecting domains.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// An action with this name was already declared.
    #[error("duplicate action: {0}")]
    DuplicateAction(String),
    /// A command for this action name was already declared.
    #[error("duplicate command: {0}")]
    DuplicateCommand(String),
    /// No domain with this name has been created.
    #[error("unknown domain: {0}")]
    UnknownDomain(String),
}

/// Configuration errors and budget violations raised during planning.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A todo item names an action that the domain does not declare.
    #[error("unknown action: {0}")]
    UnknownAction(String),
    /// A task has no declared methods.
    #[error("no methods declared for task: {0}")]
    UnknownTask(String),
    /// A goal names a relation with no declared goal methods.
    #[error("no goal methods declared for relation: {0}")]
    UnknownRelation(String),
    /// A multigoal needs refinement but the domain has no multigoal methods.
    #[error("no multigoal methods declared (needed for multigoal {0})")]
    NoMultigoalMethods(String),
    /// Argument count does not match the declared arity.
    #[error("{kind} {name} expects {expected} argument(s), got {got}")]
    ArityMismatch {
        /// Callable kind.
        kind: CallableKind,
        /// Callable name.
        name: String,
        /// Declared arity.
        expected: usize,
        /// Supplied argument count.
        got: usize,
    },
    /// A callable returned an outcome its role does not permit.
    #[error("{kind} {name} broke its contract: {detail}")]
    ContractViolation {
        /// Callable kind.
        kind: CallableKind,
        /// Callable (or heuristic) name.
        name: String,
        /// What went wrong.
        detail: String,
    },
    /// Decomposition went deeper than the configured limit.
    #[error("search depth exceeded limit of {0}")]
    DepthLimit(usize),
    /// More nodes were expanded than the configured budget allows.
    #[error("node budget of {0} expansions exhausted")]
    NodeBudgetExhausted(usize),
}
