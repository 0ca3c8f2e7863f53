// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Blocks world with task methods only.
//!
//! `move_blocks(goal)` picks the next move, `move_one(b, dest)` splits it into
//! `get(b)` and `put(b, dest)`, and those choose between the two primitive
//! actions each.

use std::sync::Arc;

use htn_core::{args, Domain, DomainError, Multigoal, Outcome, State, TaskMethod, Todo, Value};

use crate::blocks::{self, is_clear, pos, HAND, HOLDING, TABLE};

/// Catalog name.
pub const NAME: &str = "blocks_tasks";

/// `[move_blocks(goal)]`.
pub fn todo(goal: &Arc<Multigoal>) -> Vec<Todo> {
    vec![Todo::task("move_blocks", args![Arc::clone(goal)])]
}

/// The blocks-world task domain.
pub fn domain() -> Result<Domain, DomainError> {
    domain_named(NAME)
}

/// The same domain under another name.
pub fn domain_named(name: &str) -> Result<Domain, DomainError> {
    let mut domain = Domain::new(name);
    blocks::declare_actions(&mut domain)?;
    domain.declare_task_methods(
        "move_blocks",
        [TaskMethod::new("m_moveb", 1, |state: &State, args: &[Value]| {
            let Some(goal) = args.first().and_then(Value::as_multigoal) else {
                return Outcome::Failure;
            };
            let subtasks = match blocks::next_move(state, goal) {
                Some((block, dest)) => vec![
                    Todo::task("move_one", args![block, dest]),
                    Todo::task("move_blocks", args![Arc::clone(goal)]),
                ],
                None => Vec::new(),
            };
            Outcome::Decomposed(subtasks)
        })],
    );
    domain.declare_task_methods(
        "move_one",
        [TaskMethod::new("m_move1", 2, |_: &State, args: &[Value]| {
            let [block, dest] = args else {
                return Outcome::Failure;
            };
            Outcome::Decomposed(vec![
                Todo::task("get", args![block]),
                Todo::task("put", args![block, dest]),
            ])
        })],
    );
    domain.declare_task_methods(
        "get",
        [TaskMethod::new("m_get", 1, |state: &State, args: &[Value]| {
            let [block] = args else {
                return Outcome::Failure;
            };
            if !is_clear(state, block) {
                return Outcome::Failure;
            }
            match pos(state, block) {
                Some(under) if under.is(TABLE) => {
                    Outcome::Decomposed(vec![Todo::action("pickup", args![block])])
                }
                Some(under) => {
                    Outcome::Decomposed(vec![Todo::action("unstack", args![block, under])])
                }
                None => Outcome::Failure,
            }
        })],
    );
    domain.declare_task_methods(
        "put",
        [TaskMethod::new("m_put", 2, |state: &State, args: &[Value]| {
            let [block, dest] = args else {
                return Outcome::Failure;
            };
            if state.get(HOLDING, HAND) != Some(block) {
                return Outcome::Failure;
            }
            let action = if dest.is(TABLE) {
                Todo::action("putdown", args![block])
            } else {
                Todo::action("stack", args![block, dest])
            };
            Outcome::Decomposed(vec![action])
        })],
    );
    Ok(domain)
}
