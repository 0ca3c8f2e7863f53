// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Getting people to the park with `loc` goals.
//!
//! Same actions as [`simple_tasks`](crate::simple_tasks) on a slightly bigger
//! map. At execution time whichever taxi is free answers the call. The model
//! always expects taxi1, so a call answered by taxi2 is a deviation, and the
//! replanned trip finishes the ride already under way.

use std::sync::Arc;

use htn_core::{
    split_goals_method, Command, Domain, DomainError, GoalMethod, Multigoal, Outcome, State, Todo,
    Value,
};
use rand::Rng;
use tracing::info;

use crate::travel::{self, Town, CASH, LOC, OWE, TAXIS};
use crate::Problem;

/// Catalog name.
pub const NAME: &str = "simple_goals";

static TOWN: Town = Town {
    locations: &["home_a", "home_b", "park", "station", "downtown"],
    distances: &[
        ("home_a", "park", 8),
        ("home_b", "park", 2),
        ("station", "home_a", 1),
        ("station", "home_b", 7),
        ("downtown", "home_a", 3),
        ("downtown", "home_b", 7),
        ("station", "downtown", 2),
    ],
};

/// The travel-by-goal domain. `seed` picks which taxi answers each call.
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
            let taxi = TAXIS[travel::with_rng(&rng, |r| r.gen_range(0..TAXIS.len()))];
            info!(person = %p, taxi, "call_taxi: taxi chosen at random");
            Outcome::Applied(travel::board(state, p, x, taxi))
        },
    )])?;

    domain.declare_goal_methods(
        LOC,
        [
            GoalMethod::new("travel_by_foot", |state: &State, p: &Value, y: &Value| {
                travel::decomposed(travel::by_foot(state, &TOWN, p, y))
            }),
            GoalMethod::new("travel_by_taxi", |state: &State, p: &Value, y: &Value| {
                travel::decomposed(travel::by_taxi(state, &TOWN, p, y))
            }),
            GoalMethod::new("finish_ride", |state: &State, p: &Value, y: &Value| {
                travel::decomposed(travel::in_taxi(state, &TOWN, p, y))
            }),
        ],
    );
    domain.declare_multigoal_methods([split_goals_method()]);
    Ok(domain)
}

/// Taxi1 downtown, taxi2 at the station. Only Alice has a fare account.
pub fn initial_state() -> State {
    State::new("state0")
        .with_relation(
            LOC,
            [
                ("alice", "home_a"),
                ("bob", "home_b"),
                ("taxi1", "downtown"),
                ("taxi2", "station"),
            ],
        )
        .with_relation(CASH, [("alice", 20.0), ("bob", 15.0)])
        .with_relation(OWE, [("alice", 0.0)])
}

/// Alice and Bob both at the park at once.
pub fn goal3() -> Multigoal {
    Multigoal::new("goal3").with_relation(LOC, [("alice", "park"), ("bob", "park")])
}

/// `alice`, `alice_then_bob` (two goals in sequence), `goal3` (one multigoal).
pub fn problems() -> Vec<Problem> {
    vec![
        Problem::new("alice", initial_state(), vec![Todo::goal(LOC, "alice", "park")]),
        Problem::new(
            "alice_then_bob",
            initial_state(),
            vec![Todo::goal(LOC, "alice", "park"), Todo::goal(LOC, "bob", "park")],
        ),
        Problem::new("goal3", initial_state(), vec![Todo::multigoal(Arc::new(goal3()))]),
    ]
}
