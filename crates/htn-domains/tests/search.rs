// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Backtracking, heuristic search, and search bounds on the bundled domains.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use htn_core::{unit_cost, Call, PlanError, Planner, PlannerConfig, State, Todo};
use htn_domains::{backtracking, blocks, blocks_generator, blocks_tasks, briefcase, sequence};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn render(plan: &[Call]) -> Vec<String> {
    plan.iter().map(ToString::to_string).collect()
}

fn cost(plan: &[Call]) -> f64 {
    plan.iter().map(unit_cost).sum()
}

#[test]
fn backtracking_recovers_from_a_bad_first_method() {
    let domain = backtracking::domain().unwrap();
    let planner = Planner::new(&domain);
    for problem in backtracking::problems() {
        let plan = planner.find_plan(&problem.state, &problem.todo).unwrap().unwrap();
        let expected = if problem.name == "need1" {
            ["putv(1)", "getv(1)", "getv(1)"]
        } else {
            ["putv(0)", "getv(0)", "getv(0)"]
        };
        assert_eq!(render(&plan), expected, "{}", problem.name);
    }
}

#[test]
fn backtracking_counts_dead_ends() {
    let domain = backtracking::domain().unwrap();
    let problem = backtracking::problems().into_iter().find(|p| p.name == "need1").unwrap();
    let (plan, stats) = Planner::new(&domain)
        .find_plan_with_stats(&problem.state, &problem.todo)
        .unwrap();
    assert!(plan.is_some());
    assert!(stats.backtracks >= 2, "{stats:?}");
}

const DELIVERY: [&str; 7] = [
    "move(l1, l3)",
    "put_in(o2, l3)",
    "move(l3, l2)",
    "put_in(o1, l2)",
    "take_out(o2, l2)",
    "move(l2, l1)",
    "take_out(o1, l1)",
];

#[test]
fn briefcase_by_heuristic_search() {
    let domain = briefcase::domain().unwrap();
    let planner = Planner::new(&domain);
    let problem = briefcase::problems().remove(0);
    let gbfs = planner
        .find_plan_gbfs(&problem.state, &problem.todo, &briefcase::heuristic, None)
        .unwrap()
        .unwrap();
    assert_eq!(render(&gbfs), DELIVERY);
    let astar = planner
        .find_plan_astar(&problem.state, &problem.todo, &briefcase::heuristic, None)
        .unwrap()
        .unwrap();
    assert_eq!(render(&astar), DELIVERY);

    let end = planner.simulate(&problem.state, &astar).unwrap().unwrap();
    assert!(end.satisfies(&briefcase::goal()));
}

#[test]
fn briefcase_depth_first_runs_into_the_depth_limit() {
    let domain = briefcase::domain().unwrap();
    let config = PlannerConfig {
        max_depth: Some(60),
        node_budget: None,
    };
    let problem = briefcase::problems().remove(0);
    let result = Planner::with_config(&domain, config).find_plan(&problem.state, &problem.todo);
    assert_eq!(result, Err(PlanError::DepthLimit(60)));
}

#[test]
fn briefcase_node_budget_stops_the_search() {
    let domain = briefcase::domain().unwrap();
    let config = PlannerConfig {
        max_depth: None,
        node_budget: Some(3),
    };
    let problem = briefcase::problems().remove(0);
    let result = Planner::with_config(&domain, config).find_plan_astar(
        &problem.state,
        &problem.todo,
        &briefcase::heuristic,
        None,
    );
    assert_eq!(result, Err(PlanError::NodeBudgetExhausted(3)));
}

#[test]
fn sequences_are_the_same_under_every_strategy() {
    let expected: [(&str, &[&str]); 7] = [
        ("start", &[]),
        ("a", &["append(START, a)"]),
        ("b", &["append(START, a)", "append(a, b)"]),
        ("c", &["append(START, c)"]),
        ("aa", &["append(START, aa)"]),
        ("bb", &["append(START, aa)", "append(aa, bb)"]),
        ("end", &["append(START, c)", "append(c, END)"]),
    ];
    let domain = sequence::domain().unwrap();
    let planner = Planner::new(&domain);
    for (name, plan) in expected {
        let problem = sequence::problems().into_iter().find(|p| p.name == name).unwrap();
        let dfs = planner.find_plan(&problem.state, &problem.todo).unwrap().unwrap();
        let gbfs = planner
            .find_plan_gbfs(&problem.state, &problem.todo, &sequence::heuristic, None)
            .unwrap()
            .unwrap();
        let astar = planner
            .find_plan_astar(&problem.state, &problem.todo, &sequence::heuristic, None)
            .unwrap()
            .unwrap();
        assert_eq!(render(&dfs), plan, "{name}");
        assert_eq!(gbfs, dfs, "{name}");
        assert_eq!(astar, dfs, "{name}");
    }
}

#[test]
fn planning_is_repeatable() {
    let domain = briefcase::domain().unwrap();
    let planner = Planner::new(&domain);
    let problem = briefcase::problems().remove(0);
    let runs: Vec<_> = (0..3)
        .map(|_| planner.find_plan_astar(&problem.state, &problem.todo, &briefcase::heuristic, None))
        .collect();
    assert!(runs.windows(2).all(|w| w[0] == w[1]));
}

fn generated(seed: u64, n: usize) -> (State, Vec<Todo>, htn_core::Multigoal) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (state, goal) = blocks_generator::random_problem(&mut rng, "gen", n, 0.5);
    let todo = blocks_tasks::todo(&Arc::new(goal.clone()));
    (state, todo, goal)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn generated_blocks_problems_are_solved(seed in any::<u64>(), n in 1usize..=6) {
        let (state, todo, goal) = generated(seed, n);
        let domain = blocks_tasks::domain().unwrap();
        let planner = Planner::new(&domain);
        let plan = planner.find_plan(&state, &todo).unwrap().unwrap();
        let end = planner.simulate(&state, &plan).unwrap().unwrap();
        prop_assert!(end.satisfies(&goal));
        prop_assert!(plan.len() <= 2 * 2 * n);
        prop_assert_eq!(blocks::heuristic(&end, &todo), 0.0);
    }

    #[test]
    fn astar_never_costs_more_than_depth_first(seed in any::<u64>(), n in 1usize..=6) {
        let (state, todo, _) = generated(seed, n);
        let domain = blocks_tasks::domain().unwrap();
        let planner = Planner::new(&domain);
        let dfs = planner.find_plan(&state, &todo).unwrap().unwrap();
        let zero = |_: &State, _: &[Todo]| 0.0;
        let astar = planner.find_plan_astar(&state, &todo, &zero, None).unwrap().unwrap();
        prop_assert!(cost(&astar) <= cost(&dfs));
    }

    #[test]
    fn sequence_astar_never_costs_more(pick in 0..sequence::CHARACTERS.len()) {
        let domain = sequence::domain().unwrap();
        let planner = Planner::new(&domain);
        let todo = [Todo::task("make_string", htn_core::args![sequence::CHARACTERS[pick]])];
        let state = sequence::initial_state();
        let dfs = planner.find_plan(&state, &todo).unwrap().unwrap();
        let astar = planner
            .find_plan_astar(&state, &todo, &sequence::heuristic, None)
            .unwrap()
            .unwrap();
        prop_assert!(cost(&astar) <= cost(&dfs));
    }
}
