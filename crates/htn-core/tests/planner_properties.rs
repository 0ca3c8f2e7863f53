// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use htn_core::{args, Call, LookaheadOutcome, Multigoal, Planner, State, Todo};
use htn_dry_tests::{lights_domain, lights_state};
use proptest::prelude::*;

const LIGHTS: [&str; 4] = ["a", "b", "c", "d"];

fn arb_lights() -> impl Strategy<Value = State> {
    prop::collection::vec(any::<bool>(), LIGHTS.len()).prop_map(|bits| {
        let pairs: Vec<_> = LIGHTS.iter().copied().zip(bits).collect();
        lights_state(&pairs)
    })
}

fn arb_target() -> impl Strategy<Value = Multigoal> {
    prop::collection::vec(prop::option::of(any::<bool>()), LIGHTS.len()).prop_map(|wants| {
        LIGHTS
            .iter()
            .zip(wants)
            .filter_map(|(light, want)| want.map(|w| (*light, w)))
            .fold(Multigoal::new("target"), |goal, (light, w)| {
                goal.with_goal("lit", light, w)
            })
    })
}

fn current(state: &State, light: &str) -> bool {
    state.get("lit", light).and_then(htn_core::Value::as_bool).unwrap_or(false)
}

proptest! {
    #[test]
    fn empty_todo_plans_to_nothing(state in arb_lights()) {
        let domain = lights_domain().unwrap();
        prop_assert_eq!(Planner::new(&domain).find_plan(&state, &[]), Ok(Some(Vec::new())));
    }

    #[test]
    fn satisfied_goal_plans_to_nothing(state in arb_lights(), pick in 0..LIGHTS.len()) {
        let domain = lights_domain().unwrap();
        let light = LIGHTS[pick];
        let todo = [Todo::goal("lit", light, current(&state, light))];
        prop_assert_eq!(Planner::new(&domain).find_plan(&state, &todo), Ok(Some(Vec::new())));
    }

    #[test]
    fn sole_failing_action_has_no_plan(state in arb_lights(), pick in 0..LIGHTS.len()) {
        let domain = lights_domain().unwrap();
        let light = LIGHTS[pick];
        // Switching a light to the state it is already in fails.
        let action = if current(&state, light) { "switch_on" } else { "switch_off" };
        let todo = [Todo::action(action, args![light])];
        prop_assert_eq!(Planner::new(&domain).find_plan(&state, &todo), Ok(None));
    }

    #[test]
    fn multigoal_plans_are_deterministic_and_valid(state in arb_lights(), target in arb_target()) {
        let domain = lights_domain().unwrap();
        let planner = Planner::new(&domain);
        let todo = [Todo::multigoal(target.clone())];
        let first = planner.find_plan(&state, &todo).unwrap();
        let second = planner.find_plan(&state, &todo).unwrap();
        prop_assert_eq!(&first, &second);

        let plan = first.unwrap();
        prop_assert_eq!(plan.len(), target.unsatisfied(&state).len());
        let end = planner.simulate(&state, &plan).unwrap().unwrap();
        prop_assert!(end.satisfies(&target));
    }

    #[test]
    fn lookahead_at_goal_leaves_state_alone(state in arb_lights(), budget in 0_usize..4) {
        let domain = lights_domain().unwrap();
        let goal = LIGHTS
            .iter()
            .fold(Multigoal::new("as-is"), |g, l| g.with_goal("lit", *l, current(&state, l)));
        let report = Planner::new(&domain)
            .run_lazy_lookahead(&state, &[Todo::multigoal(goal)], budget)
            .unwrap();
        prop_assert_eq!(report.outcome, LookaheadOutcome::Achieved);
        prop_assert_eq!(report.attempts, 0);
        prop_assert_eq!(report.state, state);
    }
}

#[test]
fn plan_reads_as_expected_calls() {
    let domain = lights_domain().unwrap();
    let state = lights_state(&[("a", false), ("b", true)]);
    let target = Multigoal::new("t").with_goal("lit", "a", true).with_goal("lit", "b", false);
    let plan = Planner::new(&domain).find_plan(&state, &[Todo::multigoal(target)]);
    assert_eq!(
        plan,
        Ok(Some(vec![
            Call::new("switch_on", args!["a"]),
            Call::new("switch_off", args!["b"]),
        ]))
    );
}
