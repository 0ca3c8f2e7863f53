// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Built-in multigoal method that splits a multigoal into its open goals.

use std::sync::Arc;

use crate::domain::{MultigoalMethod, Outcome};
use crate::multigoal::Multigoal;
use crate::state::State;
use crate::todo::Todo;

/// Name under which [`split_goals_method`] is declared.
pub const SPLIT_GOALS: &str = "split_goals";

/// Achieves the unsatisfied goals of `goal` one at a time (in relation/key
/// order), then revisits the multigoal in case a later goal undid an earlier
/// one. Returns an empty decomposition when nothing is left to do.
pub fn split_goals(state: &State, goal: &Arc<Multigoal>) -> Outcome {
    let open = goal.unsatisfied(state);
    if open.is_empty() {
        return Outcome::Decomposed(Vec::new());
    }
    let mut subtasks: Vec<Todo> = open.into_iter().map(Todo::Goal).collect();
    subtasks.push(Todo::Multigoal(Arc::clone(goal)));
    Outcome::Decomposed(subtasks)
}

/// [`split_goals`] packaged for `Domain::declare_multigoal_methods`.
pub fn split_goals_method() -> MultigoalMethod {
    MultigoalMethod::new(SPLIT_GOALS, split_goals)
}
