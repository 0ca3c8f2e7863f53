// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! htn-domains: worked planning domains for `htn-core`.
//!
//! Every module builds a [`Domain`] and a handful of named [`Problem`]s. The
//! [`catalog`] ties them together for tools that pick a domain by name.
//! Domains with randomised commands or generators take a `seed`; the same
//! seed always reproduces the same behaviour.
#![forbid(unsafe_code)]

use htn_core::{Domain, DomainError, State, Todo};

pub mod backtracking;
pub mod blocks;
pub mod blocks_generator;
pub mod blocks_goal_splitting;
pub mod blocks_goals;
pub mod blocks_limited_stacks;
pub mod blocks_tasks;
pub mod briefcase;
pub mod sequence;
pub mod simple_goals;
pub mod simple_tasks;
pub mod simple_tasks2;
mod travel;

/// A named starting state plus the todo list to achieve from it.
#[derive(Debug, Clone)]
pub struct Problem {
    /// Name used to select the problem.
    pub name: String,
    /// Initial state.
    pub state: State,
    /// Items to accomplish, in order.
    pub todo: Vec<Todo>,
}

impl Problem {
    /// Creates a problem.
    pub fn new(name: impl Into<String>, state: State, todo: Vec<Todo>) -> Self {
        Self {
            name: name.into(),
            state,
            todo,
        }
    }
}

/// Heuristic shipped with a domain for best-first search.
pub type HeuristicFn = fn(&State, &[Todo]) -> f64;

/// One catalog row: how to build a domain and its problems.
#[derive(Debug, Clone, Copy)]
pub struct DomainEntry {
    /// Domain name, equal to the built [`Domain::name`].
    pub name: &'static str,
    /// One-line description.
    pub about: &'static str,
    build: fn(u64) -> Result<Domain, DomainError>,
    problems: fn(u64) -> Vec<Problem>,
    /// Domain-specific heuristic, if the domain ships one.
    pub heuristic: Option<HeuristicFn>,
}

impl DomainEntry {
    /// Builds the domain; `seed` drives any randomised commands.
    ///
    /// # Errors
    /// [`DomainError`] if the domain declares an action or command twice.
    pub fn domain(&self, seed: u64) -> Result<Domain, DomainError> {
        (self.build)(seed)
    }

    /// All named problems; `seed` drives generated ones.
    pub fn problems(&self, seed: u64) -> Vec<Problem> {
        (self.problems)(seed)
    }

    /// The problem called `name`, if any.
    pub fn problem(&self, name: &str, seed: u64) -> Option<Problem> {
        self.problems(seed).into_iter().find(|p| p.name == name)
    }
}

/// Every bundled domain, in listing order.
pub fn catalog() -> Vec<DomainEntry> {
    vec![
        DomainEntry {
            name: backtracking::NAME,
            about: "putv/getv chain that forces the planner to backtrack",
            build: |_| backtracking::domain(),
            problems: |_| backtracking::problems(),
            heuristic: None,
        },
        DomainEntry {
            name: blocks_tasks::NAME,
            about: "blocks world solved with task methods",
            build: |_| blocks_tasks::domain(),
            problems: |_| blocks::problems(blocks_tasks::todo),
            heuristic: Some(blocks::heuristic),
        },
        DomainEntry {
            name: blocks_goals::NAME,
            about: "blocks world solved with goal and multigoal methods",
            build: |_| blocks_goals::domain(),
            problems: |_| blocks::problems(blocks_goals::todo),
            heuristic: Some(blocks::heuristic),
        },
        DomainEntry {
            name: blocks_goal_splitting::NAME,
            about: "blocks world solved by splitting multigoals",
            build: |_| blocks_goal_splitting::domain(),
            problems: |_| blocks::problems(blocks_goal_splitting::todo),
            heuristic: Some(blocks::heuristic),
        },
        DomainEntry {
            name: blocks_generator::NAME,
            about: "seeded random blocks-world problems for the task methods",
            build: |_| blocks_tasks::domain_named(blocks_generator::NAME),
            problems: blocks_generator::problems,
            heuristic: Some(blocks::heuristic),
        },
        DomainEntry {
            name: blocks_limited_stacks::NAME,
            about: "blocks world with a fixed number of stacks and no hand",
            build: |_| blocks_limited_stacks::domain(),
            problems: blocks_limited_stacks::problems,
            heuristic: Some(blocks_limited_stacks::heuristic),
        },
        DomainEntry {
            name: simple_tasks::NAME,
            about: "travel by foot or taxi with task methods; the taxi may not come",
            build: simple_tasks::domain,
            problems: |_| simple_tasks::problems(),
            heuristic: None,
        },
        DomainEntry {
            name: simple_tasks2::NAME,
            about: "travel task methods with random taxis that may break down",
            build: simple_tasks2::domain,
            problems: |_| simple_tasks2::problems(),
            heuristic: None,
        },
        DomainEntry {
            name: simple_goals::NAME,
            about: "travel by foot or taxi with goal methods; a random taxi answers",
            build: simple_goals::domain,
            problems: |_| simple_goals::problems(),
            heuristic: None,
        },
        DomainEntry {
            name: briefcase::NAME,
            about: "carry objects between rooms in a briefcase",
            build: |_| briefcase::domain(),
            problems: |_| briefcase::problems(),
            heuristic: Some(briefcase::heuristic),
        },
        DomainEntry {
            name: sequence::NAME,
            about: "build a character sequence from permitted successions",
            build: |_| sequence::domain(),
            problems: |_| sequence::problems(),
            heuristic: Some(sequence::heuristic),
        },
    ]
}

/// Catalog entry named `name`.
pub fn entry(name: &str) -> Option<DomainEntry> {
    catalog().into_iter().find(|e| e.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_names_match_built_domains() {
        for entry in catalog() {
            let built = entry.domain(0).map(|d| d.name().to_owned());
            assert_eq!(built, Ok(entry.name.to_owned()));
            assert!(!entry.problems(0).is_empty(), "{} has no problems", entry.name);
        }
    }

    #[test]
    fn problem_names_are_unique_per_domain() {
        for entry in catalog() {
            let mut names: Vec<_> = entry.problems(3).into_iter().map(|p| p.name).collect();
            let count = names.len();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), count, "duplicate problem in {}", entry.name);
        }
    }

    #[test]
    fn every_entry_builds_for_several_seeds() {
        for entry in catalog() {
            for seed in [0, 1, 42] {
                let built = entry.domain(seed);
                assert!(built.is_ok(), "{} failed to build: {:?}", entry.name, built.err());
            }
        }
    }

    #[test]
    fn lookup_by_name() {
        assert!(entry("briefcase").is_some());
        assert!(entry("nope").is_none());
        let sequence = entry("sequence");
        assert!(sequence.and_then(|e| e.problem("end", 0)).is_some());
    }
}
