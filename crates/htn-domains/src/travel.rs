// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Walking and taxi rides shared by the two travel domains.

use std::sync::{Arc, Mutex, PoisonError};

use htn_core::{args, Action, Domain, DomainError, Outcome, State, Todo, Value};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Where everyone is.
pub const LOC: &str = "loc";
/// Money on hand.
pub const CASH: &str = "cash";
/// Unpaid fare.
pub const OWE: &str = "owe";

pub const PEOPLE: [&str; 2] = ["alice", "bob"];
pub const TAXIS: [&str; 2] = ["taxi1", "taxi2"];

/// Static layout of a town: its locations and the symmetric distances between
/// some pairs of them.
#[derive(Debug)]
pub struct Town {
    pub locations: &'static [&'static str],
    pub distances: &'static [(&'static str, &'static str, i64)],
}

impl Town {
    pub fn is_location(&self, v: &Value) -> bool {
        v.as_str().is_some_and(|s| self.locations.contains(&s))
    }

    /// Distance between two locations in either direction; `None` if the town
    /// does not list the pair.
    pub fn distance(&self, x: &Value, y: &Value) -> Option<i64> {
        let (x, y) = (x.as_str()?, y.as_str()?);
        self.distances
            .iter()
            .find(|(a, b, _)| (*a == x && *b == y) || (*a == y && *b == x))
            .map(|(_, _, d)| *d)
    }
}

/// Taxi fares are quite low.
#[allow(clippy::cast_precision_loss)]
pub fn taxi_rate(dist: i64) -> f64 {
    0.5_f64.mul_add(dist as f64, 1.5)
}

pub fn is_person(v: &Value) -> bool {
    v.as_str().is_some_and(|s| PEOPLE.contains(&s))
}

pub fn is_taxi(v: &Value) -> bool {
    v.as_str().is_some_and(|s| TAXIS.contains(&s))
}

pub fn money(state: &State, relation: &str, person: &Value) -> Option<f64> {
    state.get(relation, person).and_then(Value::as_f64)
}

/// Seeded generator shared by a domain's commands.
pub type SharedRng = Arc<Mutex<StdRng>>;

pub fn shared_rng(seed: u64) -> SharedRng {
    Arc::new(Mutex::new(StdRng::seed_from_u64(seed)))
}

pub fn with_rng<T>(rng: &SharedRng, f: impl FnOnce(&mut StdRng) -> T) -> T {
    let mut guard = rng.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

/// Puts `person` into `taxi` at `at`.
pub fn board(mut state: State, person: &Value, at: &Value, taxi: &str) -> State {
    state.set(LOC, taxi, at.clone());
    state.set(LOC, person.clone(), taxi);
    state
}

/// `walk`, `call_taxi` (always taxi1), `ride_taxi`, `pay_driver`.
pub fn declare_actions(domain: &mut Domain, town: &'static Town) -> Result<(), DomainError> {
    domain.declare_actions([
        Action::new("walk", 3, move |mut state: State, args: &[Value]| {
            let [p, x, y] = args else {
                return Outcome::Failure;
            };
            if !(is_person(p) && town.is_location(x) && town.is_location(y)) || x == y {
                return Outcome::Failure;
            }
            if state.get(LOC, p) != Some(x) {
                return Outcome::Failure;
            }
            state.set(LOC, p.clone(), y.clone());
            Outcome::Applied(state)
        }),
        Action::new("call_taxi", 2, move |state: State, args: &[Value]| {
            let [p, x] = args else {
                return Outcome::Failure;
            };
            if !(is_person(p) && town.is_location(x)) {
                return Outcome::Failure;
            }
            Outcome::Applied(board(state, p, x, "taxi1"))
        }),
        Action::new("ride_taxi", 2, move |state: State, args: &[Value]| {
            let [p, y] = args else {
                return Outcome::Failure;
            };
            ride(state, town, p, y)
        }),
        Action::new("pay_driver", 2, pay_driver),
    ])
}

/// Drives the taxi `p` sits in to `y` and records the fare as owed.
pub fn ride(mut state: State, town: &Town, p: &Value, y: &Value) -> Outcome {
    if !is_person(p) || !town.is_location(y) {
        return Outcome::Failure;
    }
    let Some(taxi) = state.get(LOC, p).filter(|v| is_taxi(v)).cloned() else {
        return Outcome::Failure;
    };
    let Some(x) = state.get(LOC, &taxi).cloned() else {
        return Outcome::Failure;
    };
    if !town.is_location(&x) || &x == y {
        return Outcome::Failure;
    }
    let Some(dist) = town.distance(&x, y) else {
        return Outcome::Failure;
    };
    state.set(LOC, taxi, y.clone());
    state.set(OWE, p.clone(), taxi_rate(dist));
    Outcome::Applied(state)
}

fn pay_driver(mut state: State, args: &[Value]) -> Outcome {
    let [p, y] = args else {
        return Outcome::Failure;
    };
    if !is_person(p) {
        return Outcome::Failure;
    }
    let (Some(cash), Some(owe)) = (money(&state, CASH, p), money(&state, OWE, p)) else {
        return Outcome::Failure;
    };
    if cash < owe {
        return Outcome::Failure;
    }
    state.set(CASH, p.clone(), cash - owe);
    state.set(OWE, p.clone(), 0.0);
    state.set(LOC, p.clone(), y.clone());
    Outcome::Applied(state)
}

/// Subtasks for walking `p` to `y` when the trip is at most two units.
pub fn by_foot(state: &State, town: &Town, p: &Value, y: &Value) -> Option<Vec<Todo>> {
    if !is_person(p) || !town.is_location(y) {
        return None;
    }
    let x = state.get(LOC, p)?;
    if x == y || town.distance(x, y)? > 2 {
        return None;
    }
    Some(vec![Todo::action("walk", args![p, x, y])])
}

/// Subtasks for a taxi ride, if `p` can afford it.
pub fn by_taxi(state: &State, town: &Town, p: &Value, y: &Value) -> Option<Vec<Todo>> {
    if !is_person(p) || !town.is_location(y) {
        return None;
    }
    let x = state.get(LOC, p)?;
    if x == y || money(state, CASH, p)? < taxi_rate(town.distance(x, y)?) {
        return None;
    }
    Some(vec![
        Todo::action("call_taxi", args![p, x]),
        Todo::action("ride_taxi", args![p, y]),
        Todo::action("pay_driver", args![p, y]),
    ])
}

/// Subtasks for finishing a ride when `p` already sits in a taxi, as happens
/// after a different taxi than planned answered the call.
pub fn in_taxi(state: &State, town: &Town, p: &Value, y: &Value) -> Option<Vec<Todo>> {
    if !is_person(p) || !town.is_location(y) {
        return None;
    }
    let taxi = state.get(LOC, p).filter(|v| is_taxi(v))?;
    let x = state.get(LOC, taxi)?;
    if x == y || money(state, CASH, p)? < taxi_rate(town.distance(x, y)?) {
        return None;
    }
    Some(vec![
        Todo::action("ride_taxi", args![p, y]),
        Todo::action("pay_driver", args![p, y]),
    ])
}

/// Decomposition for an optional method body.
pub fn decomposed(subtasks: Option<Vec<Todo>>) -> Outcome {
    subtasks.map_or(Outcome::Failure, Outcome::Decomposed)
}

#[cfg(test)]
mod tests {
    use super::*;

    static TOWN: Town = Town {
        locations: &["home", "park"],
        distances: &[("home", "park", 4)],
    };

    #[test]
    fn distance_is_symmetric() {
        let (home, park) = (Value::from("home"), Value::from("park"));
        assert_eq!(TOWN.distance(&home, &park), Some(4));
        assert_eq!(TOWN.distance(&park, &home), Some(4));
        assert_eq!(TOWN.distance(&home, &home), None);
    }

    #[test]
    fn fare_grows_with_distance() {
        assert_eq!(taxi_rate(0), 1.5);
        assert_eq!(taxi_rate(8), 5.5);
    }

    #[test]
    fn seeded_generators_agree() {
        use rand::Rng;
        let (a, b) = (shared_rng(9), shared_rng(9));
        let draws = |rng: &SharedRng| with_rng(rng, |r| (0..8).map(|_| r.gen::<u32>()).collect::<Vec<_>>());
        assert_eq!(draws(&a), draws(&b));
    }
}
