// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Todo items: the things a plan must accomplish, in order.

use std::fmt;
use std::sync::Arc;

use crate::multigoal::Multigoal;
use crate::state::State;
use crate::value::{write_joined, Value};

/// A named call with positional arguments (an action or task invocation).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Call {
    /// Action or task name.
    pub name: String,
    /// Positional arguments.
    pub args: Vec<Value>,
}

impl Call {
    /// Creates a call.
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        write_joined(f, &self.args)?;
        f.write_str(")")
    }
}

/// Ordered action sequence returned by the planners.
pub type Plan = Vec<Call>;

/// A single-relation goal: `relation[key] == value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Goal {
    /// Relation name; selects the goal methods.
    pub relation: String,
    /// Entity id.
    pub key: Value,
    /// Desired value.
    pub value: Value,
}

impl Goal {
    /// Creates a goal.
    pub fn new(relation: impl Into<String>, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Self {
            relation: relation.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// True when `state` already has the desired value.
    pub fn holds_in(&self, state: &State) -> bool {
        state.holds(&self.relation, &self.key, &self.value)
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] = {}", self.relation, self.key, self.value)
    }
}

/// One entry of a todo list. Left-to-right order is the order of achievement.
#[derive(Debug, Clone, PartialEq)]
pub enum Todo {
    /// Primitive action, applied directly.
    Action(Call),
    /// Compound task, refined by task methods.
    Task(Call),
    /// Single-relation goal, refined by that relation's goal methods.
    Goal(Goal),
    /// Conjunctive goal, refined by multigoal methods.
    Multigoal(Arc<Multigoal>),
    /// Inserted by the planner after a goal method's subtasks.
    VerifyGoal {
        /// Goal the method claimed to achieve.
        goal: Goal,
        /// Method under verification.
        method: String,
        /// Depth at which the method was chosen.
        depth: usize,
    },
    /// Inserted by the planner after a multigoal method's subtasks.
    VerifyMultigoal {
        /// Multigoal the method claimed to achieve.
        goal: Arc<Multigoal>,
        /// Method under verification.
        method: String,
        /// Depth at which the method was chosen.
        depth: usize,
    },
}

impl Todo {
    /// Primitive action call.
    pub fn action(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self::Action(Call::new(name, args))
    }

    /// Compound task call.
    pub fn task(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self::Task(Call::new(name, args))
    }

    /// Goal assertion `relation[key] == value`.
    pub fn goal(relation: impl Into<String>, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Self::Goal(Goal::new(relation, key, value))
    }

    /// Multigoal item.
    pub fn multigoal(goal: impl Into<Arc<Multigoal>>) -> Self {
        Self::Multigoal(goal.into())
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Action(_) => "action",
            Self::Task(_) => "task",
            Self::Goal(_) => "goal",
            Self::Multigoal(_) => "multigoal",
            Self::VerifyGoal { .. } => "verify-goal",
            Self::VerifyMultigoal { .. } => "verify-multigoal",
        }
    }

    /// `Some(true/false)` for goal-like items, `None` for actions and tasks
    /// (whose completion cannot be read off a state).
    pub fn holds_in(&self, state: &State) -> Option<bool> {
        match self {
            Self::Goal(goal) | Self::VerifyGoal { goal, .. } => Some(goal.holds_in(state)),
            Self::Multigoal(goal) | Self::VerifyMultigoal { goal, .. } => {
                Some(state.satisfies(goal))
            }
            Self::Action(_) | Self::Task(_) => None,
        }
    }
}

impl fmt::Display for Todo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(call) | Self::Task(call) => write!(f, "{call}"),
            Self::Goal(goal) => write!(f, "{goal}"),
            Self::Multigoal(goal) => write!(f, "<multigoal {}>", goal.name()),
            Self::VerifyGoal { goal, method, .. } => write!(f, "verify-goal[{method}]({goal})"),
            Self::VerifyMultigoal { goal, method, .. } => {
                write!(f, "verify-multigoal[{method}](<multigoal {}>)", goal.name())
            }
        }
    }
}

/// Display adapter for slices (`[a, b, c]`), used in log fields.
pub struct Listed<'a, T>(pub &'a [T]);

impl<T: fmt::Display> fmt::Display for Listed<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        write_joined(f, self.0)?;
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    #[test]
    fn display_reads_like_a_plan() {
        let plan: Plan = vec![
            Call::new("unstack", args!["a", "b"]),
            Call::new("putdown", args!["a"]),
        ];
        assert_eq!(Listed(&plan).to_string(), "[unstack(a, b), putdown(a)]");
        assert_eq!(Todo::goal("pos", "a", "table").to_string(), "pos[a] = table");
    }

    #[test]
    fn goal_like_items_report_satisfaction() {
        let state = State::new("s").with_relation("loc", [("alice", "park")]);
        assert_eq!(Todo::goal("loc", "alice", "park").holds_in(&state), Some(true));
        assert_eq!(Todo::goal("loc", "alice", "home").holds_in(&state), Some(false));
        assert_eq!(Todo::task("travel", args!["alice", "park"]).holds_in(&state), None);
        let mg = Multigoal::new("g").with_goal("loc", "alice", "park");
        assert_eq!(Todo::multigoal(mg).holds_in(&state), Some(true));
    }
}
