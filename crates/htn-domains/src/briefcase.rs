// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Carrying objects between rooms in a briefcase.
//!
//! `move_briefcases(goal)` organises the current room and then switches to
//! another one. Depth-first search wanders between rooms forever; the domain
//! is meant for best-first search with [`heuristic`].

use std::collections::BTreeSet;
use std::sync::Arc;

use htn_core::{
    args, Action, Domain, DomainError, Multigoal, Outcome, State, TaskMethod, Todo, Value,
};

use crate::Problem;

/// Catalog name.
pub const NAME: &str = "briefcase";

/// Where each object, and the briefcase, is.
pub const LOC: &str = "loc";
/// The briefcase itself, as a `loc` key and as an object location.
pub const BRIEFCASE: &str = "briefcase";
/// Rooms.
pub const LOCATIONS: [&str; 3] = ["l1", "l2", "l3"];
/// Things to carry.
pub const OBJECTS: [&str; 2] = ["o1", "o2"];

fn is_location(v: &Value) -> bool {
    v.as_str().is_some_and(|s| LOCATIONS.contains(&s))
}

fn is_object(v: &Value) -> bool {
    v.as_str().is_some_and(|s| OBJECTS.contains(&s))
}

fn loc<'s>(state: &'s State, key: &str) -> Option<&'s Value> {
    state.get(LOC, key)
}

fn move_briefcase(mut state: State, args: &[Value]) -> Outcome {
    let [from, to] = args else { return Outcome::Failure };
    if !is_location(from) || !is_location(to) || from == to || loc(&state, BRIEFCASE) != Some(from) {
        return Outcome::Failure;
    }
    state.set(LOC, BRIEFCASE, to.clone());
    Outcome::Applied(state)
}

fn take_out(mut state: State, args: &[Value]) -> Outcome {
    let [x, l] = args else { return Outcome::Failure };
    if !is_object(x) || !is_location(l) {
        return Outcome::Failure;
    }
    if !state.get(LOC, x).is_some_and(|v| v.is(BRIEFCASE)) || loc(&state, BRIEFCASE) != Some(l) {
        return Outcome::Failure;
    }
    state.set(LOC, x.clone(), l.clone());
    Outcome::Applied(state)
}

fn put_in(mut state: State, args: &[Value]) -> Outcome {
    let [x, l] = args else { return Outcome::Failure };
    if !is_object(x) || !is_location(l) {
        return Outcome::Failure;
    }
    if state.get(LOC, x) != Some(l) || loc(&state, BRIEFCASE) != Some(l) {
        return Outcome::Failure;
    }
    state.set(LOC, x.clone(), BRIEFCASE);
    Outcome::Applied(state)
}

fn goal_arg(args: &[Value]) -> Option<&Arc<Multigoal>> {
    match args {
        [goal] => goal.as_multigoal(),
        _ => None,
    }
}

/// Unload what belongs here, load what belongs elsewhere.
fn organize(state: &State, args: &[Value]) -> Outcome {
    let (Some(goal), Some(here)) = (goal_arg(args), loc(state, BRIEFCASE)) else {
        return Outcome::Failure;
    };
    let mut subtasks = Vec::new();
    for obj in OBJECTS {
        let at = state.get(LOC, obj);
        let wanted = goal.get(LOC, obj);
        if at.is_some_and(|v| v.is(BRIEFCASE)) && wanted == Some(here) {
            subtasks.push(Todo::action("take_out", args![obj, here]));
        } else if at == Some(here) && wanted != Some(here) {
            subtasks.push(Todo::action("put_in", args![obj, here]));
        }
    }
    Outcome::Decomposed(subtasks)
}

fn do_nothing(state: &State, args: &[Value]) -> Outcome {
    let Some(goal) = goal_arg(args) else {
        return Outcome::Failure;
    };
    if OBJECTS.iter().all(|obj| goal.get(LOC, *obj) == state.get(LOC, *obj)) {
        Outcome::Decomposed(Vec::new())
    } else {
        Outcome::Failure
    }
}

fn move_to(room: &'static str) -> TaskMethod {
    TaskMethod::new(format!("move_to_{room}"), 1, move |state: &State, args: &[Value]| {
        let (Some(goal), Some(here)) = (goal_arg(args), loc(state, BRIEFCASE)) else {
            return Outcome::Failure;
        };
        if here.is(room) {
            return Outcome::Failure;
        }
        Outcome::Decomposed(vec![
            Todo::action("move", args![here, room]),
            Todo::task("move_briefcases", args![Arc::clone(goal)]),
        ])
    })
}

/// The briefcase domain.
pub fn domain() -> Result<Domain, DomainError> {
    let mut domain = Domain::new(NAME);
    domain.declare_actions([
        Action::new("move", 2, move_briefcase),
        Action::new("take_out", 2, take_out),
        Action::new("put_in", 2, put_in),
    ])?;
    domain.declare_task_methods("organize", [TaskMethod::new("organize", 1, organize)]);
    domain.declare_task_methods(
        "switch_rooms",
        std::iter::once(TaskMethod::new("do_nothing", 1, do_nothing))
            .chain(LOCATIONS.into_iter().map(move_to)),
    );
    domain.declare_task_methods(
        "move_briefcases",
        [TaskMethod::new("move_briefcases", 1, |_: &State, args: &[Value]| {
            let Some(goal) = goal_arg(args) else {
                return Outcome::Failure;
            };
            Outcome::Decomposed(vec![
                Todo::task("organize", args![Arc::clone(goal)]),
                Todo::task("switch_rooms", args![Arc::clone(goal)]),
            ])
        })],
    );
    Ok(domain)
}

/// Number of rooms that still need a visit: every room where an object lies
/// out of place and every room an object must reach. Reads the goal from the
/// first task in `todo`.
#[allow(clippy::cast_precision_loss)]
pub fn heuristic(state: &State, todo: &[Todo]) -> f64 {
    let goal = todo.iter().find_map(|item| match item {
        Todo::Task(call) => Some(call.args.first().and_then(Value::as_multigoal)),
        _ => None,
    });
    let Some(Some(goal)) = goal else { return 0.0 };
    let mut unsolved = BTreeSet::new();
    for obj in OBJECTS {
        let (Some(at), Some(wanted)) = (state.get(LOC, obj), goal.get(LOC, obj)) else {
            continue;
        };
        if at.is(BRIEFCASE) {
            unsolved.insert(wanted.clone());
        } else if at != wanted {
            unsolved.insert(at.clone());
            unsolved.insert(wanted.clone());
        }
    }
    unsolved.len() as f64
}

/// Briefcase in l1, o1 in l2, o2 in l3.
pub fn initial_state() -> State {
    State::new("state0").with_relation(LOC, [("o1", "l2"), ("o2", "l3"), (BRIEFCASE, "l1")])
}

/// o1 to l1, o2 to l2.
pub fn goal() -> Multigoal {
    Multigoal::new("goal").with_relation(LOC, [("o1", "l1"), ("o2", "l2")])
}

/// `deliver`: move both objects to their rooms.
pub fn problems() -> Vec<Problem> {
    vec![Problem::new(
        "deliver",
        initial_state(),
        vec![Todo::task("move_briefcases", args![Arc::new(goal())])],
    )]
}
