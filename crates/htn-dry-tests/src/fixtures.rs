// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Small synthetic planning domains for engine tests.
//!
//! - [`lights_domain`]: boolean `lit` relation with goal methods, the built-in
//!   `split_goals` multigoal method, and optional flaky commands.
//! - [`ladder_domain`]: a task with a cheap-but-long and an expensive-but-short
//!   decomposition, for comparing depth-first and A* costs.
//! - [`looping_domain`]: a task that refines into itself forever.
//!
//! Builders return the registry's [`DomainError`] instead of panicking; tests
//! unwrap them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use htn_core::{
    args, split_goals_method, Action, Call, Command, Domain, DomainError, GoalMethod, Outcome,
    State, TaskMethod, Todo, Value,
};

/// Name of the relation driven by [`lights_domain`].
pub const LIT: &str = "lit";

fn set_light(mut state: State, args: &[Value], on: bool) -> Outcome {
    let Some(light) = args.first() else {
        return Outcome::Failure;
    };
    if state.get(LIT, light).and_then(Value::as_bool) != Some(!on) {
        return Outcome::Failure;
    }
    state.set(LIT, light.clone(), on);
    Outcome::Applied(state)
}

/// `switch_on(x)` / `switch_off(x)` over `lit[x]`, a `lit` goal method, and
/// `split_goals` for multigoals. No commands are declared.
pub fn lights_domain() -> Result<Domain, DomainError> {
    let mut domain = Domain::new("lights");
    domain.declare_actions([
        Action::new("switch_on", 1, |s, args: &[Value]| set_light(s, args, true)),
        Action::new("switch_off", 1, |s, args: &[Value]| set_light(s, args, false)),
    ])?;
    domain.declare_goal_methods(
        LIT,
        [GoalMethod::new("flip", |state: &State, light: &Value, want: &Value| {
            let action = match want.as_bool() {
                Some(true) => "switch_on",
                Some(false) => "switch_off",
                None => return Outcome::Failure,
            };
            if state.get(LIT, light).is_none() {
                return Outcome::Failure;
            }
            Outcome::Decomposed(vec![Todo::action(action, args![light])])
        })],
    );
    domain.declare_multigoal_methods([split_goals_method()]);
    Ok(domain)
}

/// [`lights_domain`] whose `switch_on` command fails the first `misses` times
/// it runs (counted across clones of the domain).
pub fn flaky_lights_domain(misses: usize) -> Result<Domain, DomainError> {
    let mut domain = lights_domain()?;
    let runs = Arc::new(AtomicUsize::new(0));
    domain.declare_commands([Command::new("switch_on", 1, move |s, args: &[Value]| {
        if runs.fetch_add(1, Ordering::SeqCst) < misses {
            Outcome::Failure
        } else {
            set_light(s, args, true)
        }
    })])?;
    Ok(domain)
}

/// State with the given lights, each on or off.
pub fn lights_state(lights: &[(&str, bool)]) -> State {
    State::new("lights").with_relation(LIT, lights.iter().copied())
}

/// `reach(n)` either `jump(n)` once (declared first) or `step`s up one at a
/// time. `at[me]` counts the height.
pub fn ladder_domain() -> Result<Domain, DomainError> {
    fn bump(mut state: State, by: i64) -> Outcome {
        let at = height(&state);
        state.set("at", "me", at + by);
        Outcome::Applied(state)
    }
    let mut domain = Domain::new("ladder");
    domain.declare_actions([
        Action::new("jump", 1, |s, args: &[Value]| {
            let to = args.first().and_then(Value::as_int).unwrap_or(0);
            let at = height(&s);
            if to <= at {
                return Outcome::Failure;
            }
            bump(s, to - at)
        }),
        Action::new("step", 0, |s, _: &[Value]| bump(s, 1)),
    ])?;
    domain.declare_task_methods(
        "reach",
        [
            TaskMethod::new("by_jump", 1, |s: &State, args: &[Value]| {
                let to = args.first().and_then(Value::as_int).unwrap_or(0);
                if to <= height(s) {
                    return Outcome::Failure;
                }
                Outcome::Decomposed(vec![Todo::action("jump", args.to_vec())])
            }),
            TaskMethod::new("by_steps", 1, |s: &State, args: &[Value]| {
                let to = args.first().and_then(Value::as_int).unwrap_or(0);
                if height(s) >= to {
                    return Outcome::Decomposed(Vec::new());
                }
                Outcome::Decomposed(vec![
                    Todo::action("step", args![]),
                    Todo::task("reach", args.to_vec()),
                ])
            }),
        ],
    );
    Ok(domain)
}

/// Current `at[me]` in a ladder state.
pub fn height(state: &State) -> i64 {
    state.get("at", "me").and_then(Value::as_int).unwrap_or(0)
}

/// Ladder cost model: a jump costs `jump_cost`, a step costs 1.
pub fn ladder_cost(jump_cost: f64) -> impl Fn(&Call) -> f64 {
    move |call: &Call| if call.name == "jump" { jump_cost } else { 1.0 }
}

/// Admissible ladder heuristic: one unit per missing rung, capped by the
/// cheapest remaining jump.
pub fn ladder_heuristic(jump_cost: f64) -> impl Fn(&State, &[Todo]) -> f64 {
    move |state: &State, todo: &[Todo]| {
        let target = todo.iter().find_map(|item| match item {
            Todo::Task(call) | Todo::Action(call) if call.name != "step" => {
                call.args.first().and_then(Value::as_int)
            }
            _ => None,
        });
        #[allow(clippy::cast_precision_loss)]
        let missing = target.map_or(0, |to| (to - height(state)).max(0)) as f64;
        missing.min(jump_cost)
    }
}

/// `forever` refines into `[tick, forever]` without end.
pub fn looping_domain() -> Result<Domain, DomainError> {
    let mut domain = Domain::new("looping");
    domain.declare_actions([Action::new("tick", 0, |s, _: &[Value]| Outcome::Applied(s))])?;
    domain.declare_task_methods(
        "forever",
        [TaskMethod::new("again", 0, |_: &State, _: &[Value]| {
            Outcome::Decomposed(vec![Todo::action("tick", args![]), Todo::task("forever", args![])])
        })],
    );
    Ok(domain)
}
