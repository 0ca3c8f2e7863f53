// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Blocks world with goal methods for `pos` and one multigoal method.

use std::sync::Arc;

use htn_core::{
    args, Domain, DomainError, GoalMethod, Multigoal, MultigoalMethod, Outcome, State, Todo, Value,
};

use crate::blocks::{self, hand_empty, is_clear, pos, HAND, POS, TABLE};

/// Catalog name.
pub const NAME: &str = "blocks_goals";

/// `[goal]` as a multigoal item.
pub fn todo(goal: &Arc<Multigoal>) -> Vec<Todo> {
    vec![Todo::multigoal(Arc::clone(goal))]
}

/// `pos[b] = hand`: pick `b` up or unstack it.
fn m_take(state: &State, block: &Value, dest: &Value) -> Outcome {
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

/// `pos[b] = dest` while holding `b`: put it down or stack it.
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

/// `pos[b] = dest` with an empty hand: take `b`, then place it.
fn m_move1(state: &State, block: &Value, dest: &Value) -> Outcome {
    if dest.is(HAND) || !is_clear(state, block) || !hand_empty(state) {
        return Outcome::Failure;
    }
    Outcome::Decomposed(vec![
        Todo::goal(POS, block, HAND),
        Todo::goal(POS, block, dest),
    ])
}

/// The blocks-world goal domain.
pub fn domain() -> Result<Domain, DomainError> {
    let mut domain = Domain::new(NAME);
    blocks::declare_actions(&mut domain)?;
    domain.declare_goal_methods(
        POS,
        [
            GoalMethod::new("m_take", m_take),
            GoalMethod::new("m_put", m_put),
            GoalMethod::new("m_move1", m_move1),
        ],
    );
    domain.declare_multigoal_methods([MultigoalMethod::new(
        "m_moveblocks",
        |state: &State, goal: &Arc<Multigoal>| {
            let subtasks = match blocks::next_move(state, goal) {
                Some((block, dest)) => vec![
                    Todo::goal(POS, block, dest),
                    Todo::multigoal(Arc::clone(goal)),
                ],
                None => Vec::new(),
            };
            Outcome::Decomposed(subtasks)
        },
    )]);
    Ok(domain)
}
