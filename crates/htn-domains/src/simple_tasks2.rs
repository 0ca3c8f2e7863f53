// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The `travel(p, y)` task again, with taxis that may be in bad repair.
//!
//! Either taxi can answer a call. A taxi whose `taxi_condition` is `"bad"`
//! picks its passenger up but breaks down before the ride. The planner does
//! not look at taxi conditions when it plans a fresh trip, only when a
//! passenger already sits in a taxi and the ride has to be finished.

use htn_core::{args, Command, Domain, DomainError, Outcome, State, TaskMethod, Todo, Value};
use rand::Rng;
use tracing::info;

use crate::simple_tasks::TOWN;
use crate::travel::{self, CASH, LOC, OWE, TAXIS};
use crate::Problem;

/// Catalog name.
pub const NAME: &str = "simple_tasks2";

/// `"good"` or `"bad"` for every taxi.
pub const TAXI_CONDITION: &str = "taxi_condition";

fn in_good_repair(state: &State, taxi: &Value) -> bool {
    state.get(TAXI_CONDITION, taxi).is_some_and(|c| c.is("good"))
}

fn taxi_of<'s>(state: &'s State, p: &Value) -> Option<&'s Value> {
    state.get(LOC, p).filter(|v| travel::is_taxi(v))
}

/// The travel domain with unreliable taxis. `seed` picks which taxi answers
/// each call.
pub fn domain(seed: u64) -> Result<Domain, DomainError> {
    let mut domain = Domain::new(NAME);
    travel::declare_actions(&mut domain, &TOWN)?;

    let rng = travel::shared_rng(seed);
    domain.declare_commands([
        Command::new("call_taxi", 2, move |state: State, args: &[Value]| {
            let [p, x] = args else {
                return Outcome::Failure;
            };
            if !(travel::is_person(p) && TOWN.is_location(x)) {
                return Outcome::Failure;
            }
            let taxi = TAXIS[travel::with_rng(&rng, |r| r.gen_range(0..TAXIS.len()))];
            info!(person = %p, taxi, "call_taxi: taxi chosen at random");
            Outcome::Applied(travel::board(state, p, x, taxi))
        }),
        Command::new("ride_taxi", 2, |state: State, args: &[Value]| {
            let [p, y] = args else {
                return Outcome::Failure;
            };
            let broken = taxi_of(&state, p).filter(|t| !in_good_repair(&state, t)).cloned();
            if let Some(taxi) = broken {
                info!(person = %p, %taxi, "ride_taxi failed: taxi broke down");
                return Outcome::Failure;
            }
            travel::ride(state, &TOWN, p, y)
        }),
    ])?;

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
            TaskMethod::new("finish_ride", 2, |state: &State, args: &[Value]| match args {
                [p, y] if taxi_of(state, p).is_some_and(|t| in_good_repair(state, t)) => {
                    travel::decomposed(travel::in_taxi(state, &TOWN, p, y))
                }
                _ => Outcome::Failure,
            }),
        ],
    );
    Ok(domain)
}

fn state_with_taxis(name: &str, condition: &str) -> State {
    State::new(name)
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
        .with_relation(TAXI_CONDITION, TAXIS.map(|t| (t, condition)))
}

/// Both taxis in good repair.
pub fn good_taxis() -> State {
    state_with_taxis("state0a", "good")
}

/// Both taxis about to break down.
pub fn bad_taxis() -> State {
    state_with_taxis("state0b", "bad")
}

/// Alice to the park, once per fleet.
pub fn problems() -> Vec<Problem> {
    let trip = || vec![Todo::task("travel", args!["alice", "park"])];
    vec![
        Problem::new("good_taxis", good_taxis(), trip()),
        Problem::new("bad_taxis", bad_taxis(), trip()),
    ]
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)]
    use super::*;

    #[test]
    fn conditions_cover_every_taxi() {
        for taxi in TAXIS {
            assert!(in_good_repair(&good_taxis(), &taxi.into()));
            assert!(!in_good_repair(&bad_taxis(), &taxi.into()));
        }
    }

    #[test]
    fn broken_taxi_cannot_ride() {
        let Ok(domain) = domain(0) else {
            panic!("domain builds");
        };
        let boarded = travel::board(bad_taxis(), &"alice".into(), &"home_a".into(), "taxi2");
        let ride = domain.command("ride_taxi").map(|c| c.apply(boarded.clone(), &args!["alice", "park"]));
        assert!(matches!(ride, Some(Outcome::Failure)));
        let model = domain.action("ride_taxi").map(|a| a.apply(boarded, &args!["alice", "park"]));
        assert!(matches!(model, Some(Outcome::Applied(_))));
    }
}
