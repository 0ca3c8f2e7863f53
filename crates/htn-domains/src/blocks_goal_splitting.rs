// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Blocks world solved by splitting multigoals into single goals.
//!
//! There is no stacking algorithm here; [`split_goals`](htn_core::split_goals)
//! achieves one `pos`/`clear` goal at a time and retries the multigoal until it
//! holds. Plans are valid but much longer than the other blocks domains'.

use std::sync::Arc;

use htn_core::{
    args, split_goals_method, Domain, DomainError, GoalMethod, Multigoal, Outcome, State, Todo, Value,
};

use crate::blocks::{self, hand_empty, is_clear, pos, CLEAR, HAND, POS, TABLE};

/// Catalog name.
pub const NAME: &str = "blocks_goal_splitting";

/// `[goal]` as a multigoal item.
pub fn todo(goal: &Arc<Multigoal>) -> Vec<Todo> {
    vec![Todo::multigoal(Arc::clone(goal))]
}

fn m_move1(state: &State, block: &Value, dest: &Value) -> Outcome {
    if dest.is(HAND) || !hand_empty(state) {
        return Outcome::Failure;
    }
    let mut subgoals = Vec::with_capacity(4);
    if !dest.is(TABLE) {
        subgoals.push(Todo::goal(CLEAR, dest, true));
    }
    subgoals.extend([
        Todo::goal(CLEAR, block, true),
        Todo::goal(POS, block, HAND),
        Todo::goal(POS, block, dest),
    ]);
    Outcome::Decomposed(subgoals)
}

fn m_hold(state: &State, block: &Value, dest: &Value) -> Outcome {
    if !dest.is(HAND) || !is_clear(state, block) || !hand_empty(state) {
        return Outcome::Failure;
    }
    match pos(state, block) {
        Some(under) if under.is(TABLE) => {
            Outcome::Decomposed(vec![Todo::action("pickup", args![block])])
        }
        Some(under) => Outcome::Decomposed(vec![Todo::action("unstack", args![block, under])]),
        None => Outcome::Failure,
    }
}

fn m_put(state: &State, block: &Value, dest: &Value) -> Outcome {
    if dest.is(HAND) || !pos(state, block).is_some_and(|p| p.is(HAND)) {
        return Outcome::Failure;
    }
    if dest.is(TABLE) {
        Outcome::Decomposed(vec![Todo::action("putdown", args![block])])
    } else if is_clear(state, dest) {
        Outcome::Decomposed(vec![Todo::action("stack", args![block, dest])])
    } else {
        Outcome::Failure
    }
}

/// `clear[b] = true`: move whatever is on `b` to the table.
fn m_make_clear(state: &State, block: &Value, truth: &Value) -> Outcome {
    if truth.as_bool() != Some(true) {
        return Outcome::Failure;
    }
    if block.is(TABLE) || is_clear(state, block) {
        return Outcome::Decomposed(Vec::new());
    }
    let above = state
        .relation(POS)
        .and_then(|on| on.iter().find(|(_, under)| *under == block))
        .map(|(top, _)| top.clone());
    match above {
        Some(top) => Outcome::Decomposed(vec![
            Todo::goal(CLEAR, &top, true),
            Todo::goal(POS, top, TABLE),
        ]),
        None => Outcome::Failure,
    }
}

/// The goal-splitting blocks domain.
pub fn domain() -> Result<Domain, DomainError> {
    let mut domain = Domain::new(NAME);
    blocks::declare_actions(&mut domain)?;
    domain.declare_goal_methods(
        POS,
        [
            GoalMethod::new("m_move1", m_move1),
            GoalMethod::new("m_hold", m_hold),
            GoalMethod::new("m_put", m_put),
        ],
    );
    domain.declare_goal_methods(CLEAR, [GoalMethod::new("m_make_clear", m_make_clear)]);
    domain.declare_multigoal_methods([split_goals_method()]);
    Ok(domain)
}
