// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Getting people to the park with a `travel(p, y)` task.
//!
//! The planner's `call_taxi` always works, but the command that stands in
//! for it at execution time only succeeds half the time, so lazy lookahead
//! has to replan until a taxi shows up.

use htn_core::{args, Command, Domain, DomainError, Outcome, State, TaskMethod, Todo, Value};
use rand::Rng;
use tracing::info;

use crate::travel::{self, Town, CASH, LOC, OWE};
use crate::Problem;

/// Catalog name.
pub const NAME: &str = "simple_tasks";

/// Homes, a park, and a station.
pub(crate) static TOWN: Town = Town {
    locations: &["home_a", "home_b", "park", "station"],
    distances: &[
        ("home_a", "park", 8),
        ("home_b", "park", 2),
        ("station", "home_a", 1),
        ("station", "home_b", 7),
        ("home_a", "home_b", 7),
        ("station", "park", 9),
    ],
};

/// The travel-by-task domain. `seed` drives the unreliable taxi command.
pub fn domain(seed: u64) -> Result<Domain, DomainError> {
    let mut domain = Domain::new(NAME);
    travel::declare_actions(&mut domain, &TOWN)?;

    let rng = travel::shared_rng(seed);
    domain.declare_commands([Command::new(
        "call_taxi",
        2,
        move |state: State, args: &[Value]| {
            let [p, x] = args else {
                return Outcome::Failure;
            };
            if !(travel::is_person(p) && TOWN.is_location(x)) {
                return Outcome::Failure;
            }
            if travel::with_rng(&rng, |r| r.gen_bool(0.5)) {
                info!(person = %p, "call_taxi succeeded");
                Outcome::Applied(travel::board(state, p, x, "taxi1"))
            } else {
                info!(person = %p, "call_taxi failed: no taxi came");
                Outcome::Failure
            }
        },
    )])?;

    domain.declare_task_methods(
        "travel",
        [
            TaskMethod::new("do_nothing", 2, |state: &State, args: &[Value]| {
                let [p, y] = args else {
                    return Outcome::Failure;
                };
                if travel::is_person(p) && TOWN.is_location(y) && state.get(LOC, p) == Some(y) {
                    Outcome::Decomposed(Vec::new())
                } else {
                    Outcome::Failure
                }
            }),
            TaskMethod::new("travel_by_foot", 2, |state: &State, args: &[Value]| match args {
                [p, y] => travel::decomposed(travel::by_foot(state, &TOWN, p, y)),
                _ => Outcome::Failure,
            }),
            TaskMethod::new("travel_by_taxi", 2, |state: &State, args: &[Value]| match args {
                [p, y] => travel::decomposed(travel::by_taxi(state, &TOWN, p, y)),
                _ => Outcome::Failure,
            }),
        ],
    );
    Ok(domain)
}

/// Alice at home with 20, Bob at home with 15; taxi1 at the park.
pub fn initial_state() -> State {
    State::new("state0")
        .with_relation(
            LOC,
            [
                ("alice", "home_a"),
                ("bob", "home_b"),
                ("taxi1", "park"),
                ("taxi2", "station"),
            ],
        )
        .with_relation(CASH, [("alice", 20.0), ("bob", 15.0)])
        .with_relation(OWE, [("alice", 0.0), ("bob", 0.0)])
}

/// `alice`: Alice to the park. `alice_then_bob`: then Bob as well.
pub fn problems() -> Vec<Problem> {
    vec![
        Problem::new(
            "alice",
            initial_state(),
            vec![Todo::task("travel", args!["alice", "park"])],
        ),
        Problem::new(
            "alice_then_bob",
            initial_state(),
            vec![
                Todo::task("travel", args!["alice", "park"]),
                Todo::task("travel", args!["bob", "park"]),
            ],
        ),
    ]
}
