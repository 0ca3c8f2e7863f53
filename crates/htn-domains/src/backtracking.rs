// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! A flag that `putv` sets and `getv` checks.
//!
//! `put_it` has three methods and only the second and third leave the flag in
//! a usable state, so solving `[put_it, need*]` exercises backtracking both
//! inside a method's subtasks and across later tasks.

use htn_core::{args, Action, Domain, DomainError, Outcome, State, TaskMethod, Todo, Value};

use crate::Problem;

/// Catalog name.
pub const NAME: &str = "backtracking";

const FLAG: &str = "flag";
const CURRENT: &str = "current";

fn putv(mut state: State, args: &[Value]) -> Outcome {
    let Some(value) = args.first() else {
        return Outcome::Failure;
    };
    state.set(FLAG, CURRENT, value.clone());
    Outcome::Applied(state)
}

fn getv(state: State, args: &[Value]) -> Outcome {
    let wanted = args.first();
    if wanted.is_some() && state.get(FLAG, CURRENT) == wanted {
        Outcome::Applied(state)
    } else {
        Outcome::Failure
    }
}

fn put_then_get(put: i64, get: i64) -> TaskMethod {
    let name = if put == get {
        format!("m{put}")
    } else {
        "m_err".to_owned()
    };
    TaskMethod::new(name, 0, move |_: &State, _: &[Value]| {
        Outcome::Decomposed(vec![
            Todo::action("putv", args![put]),
            Todo::action("getv", args![get]),
        ])
    })
}

fn need(value: i64) -> TaskMethod {
    TaskMethod::new(format!("m_need{value}"), 0, move |_: &State, _: &[Value]| {
        Outcome::Decomposed(vec![Todo::action("getv", args![value])])
    })
}

/// The backtracking domain.
pub fn domain() -> Result<Domain, DomainError> {
    let mut domain = Domain::new(NAME);
    domain.declare_actions([Action::new("putv", 1, putv), Action::new("getv", 1, getv)])?;
    domain.declare_task_methods(
        "put_it",
        [put_then_get(0, 1), put_then_get(0, 0), put_then_get(1, 1)],
    );
    domain.declare_task_methods("need0", [need(0)]);
    domain.declare_task_methods("need1", [need(1)]);
    domain.declare_task_methods("need01", [need(0), need(1)]);
    domain.declare_task_methods("need10", [need(1), need(0)]);
    Ok(domain)
}

/// Flag unset (`-1`).
pub fn initial_state() -> State {
    State::new("state0").with_relation(FLAG, [(CURRENT, -1)])
}

/// `[put_it, need]` for each of the four `need*` tasks.
pub fn problems() -> Vec<Problem> {
    ["need0", "need01", "need10", "need1"]
        .into_iter()
        .map(|need| {
            Problem::new(
                need,
                initial_state(),
                vec![Todo::task("put_it", args![]), Todo::task(need, args![])],
            )
        })
        .collect()
}
