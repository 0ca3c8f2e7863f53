// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Building a character sequence one permitted succession at a time.
//!
//! `make_string(y)` ends the sequence at `y`, either because it already does
//! or by first making a string that ends in some predecessor `x` of `y` and
//! then appending `y`.

use htn_core::{args, Action, Domain, DomainError, Outcome, State, TaskMethod, Todo, Value};

use crate::Problem;

/// Catalog name.
pub const NAME: &str = "sequence";

/// Relation holding the last character under [`LAST`].
pub const LAST_CHAR: &str = "last_char";
/// Only key of [`LAST_CHAR`].
pub const LAST: &str = "last";

/// Every character, in method order.
pub const CHARACTERS: [&str; 7] = ["START", "a", "b", "c", "aa", "bb", "END"];

/// Characters allowed directly before each character.
const PREDECESSORS: [(&str, &[&str]); 7] = [
    ("START", &[]),
    ("a", &["START"]),
    ("b", &["a"]),
    ("c", &["b", "START"]),
    ("END", &["c", "bb"]),
    ("aa", &["START"]),
    ("bb", &["aa"]),
];

fn predecessors(c: &str) -> &'static [&'static str] {
    PREDECESSORS
        .iter()
        .find(|(k, _)| *k == c)
        .map(|(_, preds)| *preds)
        .unwrap_or_default()
}

fn is_character(v: &Value) -> bool {
    v.as_str().is_some_and(|s| CHARACTERS.contains(&s))
}

/// True when `y` may directly follow `x`.
pub fn permissible(x: &str, y: &str) -> bool {
    predecessors(y).contains(&x)
}

fn append(mut state: State, args: &[Value]) -> Outcome {
    let [x, y] = args else { return Outcome::Failure };
    let (Some(xs), Some(ys)) = (x.as_str(), y.as_str()) else {
        return Outcome::Failure;
    };
    if !is_character(x) || !is_character(y) || !permissible(xs, ys) {
        return Outcome::Failure;
    }
    if state.get(LAST_CHAR, LAST) != Some(x) {
        return Outcome::Failure;
    }
    state.set(LAST_CHAR, LAST, y.clone());
    Outcome::Applied(state)
}

fn make_string_via(x: &'static str) -> TaskMethod {
    TaskMethod::new(format!("make_string_{x}"), 1, move |_: &State, args: &[Value]| {
        let [y] = args else { return Outcome::Failure };
        match y.as_str() {
            Some(ys) if is_character(y) && permissible(x, ys) => Outcome::Decomposed(vec![
                Todo::task("make_string", args![x]),
                Todo::action("append", args![x, y]),
            ]),
            _ => Outcome::Failure,
        }
    })
}

/// The sequence domain.
pub fn domain() -> Result<Domain, DomainError> {
    let mut domain = Domain::new(NAME);
    domain.declare_actions([Action::new("append", 2, append)])?;
    let do_nothing = TaskMethod::new("do_nothing", 1, |state: &State, args: &[Value]| {
        match args {
            [y] if is_character(y) && state.get(LAST_CHAR, LAST) == Some(y) => {
                Outcome::Decomposed(Vec::new())
            }
            _ => Outcome::Failure,
        }
    });
    domain.declare_task_methods(
        "make_string",
        std::iter::once(do_nothing).chain(CHARACTERS.into_iter().map(make_string_via)),
    );
    Ok(domain)
}

/// Breadth-first distance from `from` back to `to` through predecessors.
///
/// The count goes up once per dequeued character rather than once per level,
/// so on wide graphs it overestimates; `f64::INFINITY` if `to` is unreachable.
pub fn bfs_dist(from: &str, to: &str) -> f64 {
    if from == to {
        return 0.0;
    }
    let mut visited = Vec::new();
    let mut queue = std::collections::VecDeque::from([from]);
    let mut dist = 0_u32;
    while let Some(x) = queue.pop_front() {
        dist += 1;
        for &n in predecessors(x) {
            if n == to {
                return f64::from(dist);
            }
            if !visited.contains(&n) {
                visited.push(n);
                queue.push_back(n);
            }
        }
    }
    f64::INFINITY
}

/// [`bfs_dist`] from the character a leading `make_string` must reach back to
/// `START`; zero for anything else.
pub fn heuristic(_: &State, todo: &[Todo]) -> f64 {
    match todo.first() {
        Some(Todo::Task(call)) if call.name == "make_string" => call
            .args
            .first()
            .and_then(Value::as_str)
            .map_or(0.0, |c| bfs_dist(c, "START")),
        _ => 0.0,
    }
}

/// Sequence currently ends at `START`.
pub fn initial_state() -> State {
    State::new("state0").with_relation(LAST_CHAR, [(LAST, "START")])
}

/// One problem per character: build a sequence from `START` ending there.
/// Problem names are the lower-cased characters.
pub fn problems() -> Vec<Problem> {
    CHARACTERS
        .into_iter()
        .map(|c| {
            Problem::new(
                c.to_ascii_lowercase(),
                initial_state(),
                vec![Todo::task("make_string", args![c])],
            )
        })
        .collect()
}
