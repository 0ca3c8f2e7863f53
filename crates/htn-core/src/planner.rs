// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Backtracking depth-first decomposition.
//!
//! The planner pops the first todo item and dispatches on its kind: actions
//! are applied, tasks/goals/multigoals are refined by the domain's methods in
//! declaration order, and verification markers check that a goal method did
//! what it claimed. The first branch that empties the todo list wins; a failed
//! branch only retries its own alternatives (structural backtracking).
//!
//! Dead ends surface as `Ok(None)`. Domain-authoring errors and exceeded
//! budgets surface as [`PlanError`] and abort the whole call.

use std::slice;
use std::sync::Arc;

use tracing::{debug, info, instrument, trace};

use crate::domain::{Action, Domain, GoalMethod, MultigoalMethod, Outcome, TaskMethod};
use crate::error::{CallableKind, PlanError};
use crate::multigoal::Multigoal;
use crate::state::State;
use crate::todo::{Call, Goal, Listed, Plan, Todo};

/// Default recursion limit for [`PlannerConfig::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 1_000;

/// Search bounds shared by every planning strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Deepest decomposition allowed before [`PlanError::DepthLimit`].
    /// `None` disables the check.
    pub max_depth: Option<usize>,
    /// Maximum number of node expansions before
    /// [`PlanError::NodeBudgetExhausted`]. `None` means unbounded.
    pub node_budget: Option<usize>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_depth: Some(DEFAULT_MAX_DEPTH),
            node_budget: None,
        }
    }
}

/// Counters recorded during one planning call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Todo items dispatched (DFS) or nodes popped (heuristic search).
    pub expansions: usize,
    /// Alternatives abandoned after their subtree failed.
    pub backtracks: usize,
    /// Deepest recursion level reached.
    pub max_depth: usize,
}

/// Plans against one domain with fixed bounds.
#[derive(Debug, Clone, Copy)]
pub struct Planner<'d> {
    domain: &'d Domain,
    config: PlannerConfig,
}

impl<'d> Planner<'d> {
    /// Planner over `domain` with default bounds.
    pub fn new(domain: &'d Domain) -> Self {
        Self::with_config(domain, PlannerConfig::default())
    }

    /// Planner over `domain` with explicit bounds.
    pub fn with_config(domain: &'d Domain, config: PlannerConfig) -> Self {
        Self { domain, config }
    }

    /// Domain being planned against.
    pub fn domain(&self) -> &'d Domain {
        self.domain
    }

    /// Active bounds.
    pub fn config(&self) -> PlannerConfig {
        self.config
    }

    /// Finds a plan achieving `todo` from `state` by depth-first decomposition.
    ///
    /// # Errors
    /// Unknown names, arity mismatches, contract violations, or an exceeded
    /// depth/node budget.
    pub fn find_plan(&self, state: &State, todo: &[Todo]) -> Result<Option<Plan>, PlanError> {
        self.find_plan_with_stats(state, todo).map(|(plan, _)| plan)
    }

    /// [`find_plan`](Self::find_plan) plus search counters.
    ///
    /// # Errors
    /// Same as [`find_plan`](Self::find_plan).
    #[instrument(skip_all, fields(domain = %self.domain.name(), state = %state.name()))]
    pub fn find_plan_with_stats(
        &self,
        state: &State,
        todo: &[Todo],
    ) -> Result<(Option<Plan>, SearchStats), PlanError> {
        info!(todo = %Listed(todo), "find_plan");
        let mut dfs = Dfs {
            domain: self.domain,
            config: self.config,
            stats: SearchStats::default(),
        };
        let mut plan = Plan::new();
        let found = dfs.seek(state, todo, &mut plan, 0)?;
        let result = found.then_some(plan);
        match &result {
            Some(plan) => info!(plan = %Listed(plan), expansions = dfs.stats.expansions, "plan found"),
            None => info!(expansions = dfs.stats.expansions, "no plan"),
        }
        Ok((result, dfs.stats))
    }

    /// Applies `plan` with the domain's action models.
    ///
    /// Returns `Ok(None)` if some action's precondition fails along the way.
    ///
    /// # Errors
    /// Unknown actions, arity mismatches, or an action that returns subtasks.
    pub fn simulate(&self, state: &State, plan: &[Call]) -> Result<Option<State>, PlanError> {
        let mut current = state.clone();
        for call in plan {
            let action = self.action(&call.name)?;
            match run_action(CallableKind::Action, action, current, call)? {
                Some(next) => current = next,
                None => {
                    debug!(call = %call, "simulation failed");
                    return Ok(None);
                }
            }
        }
        Ok(Some(current))
    }

    pub(crate) fn action(&self, name: &str) -> Result<&'d Action, PlanError> {
        self.domain
            .action(name)
            .ok_or_else(|| PlanError::UnknownAction(name.to_owned()))
    }
}

struct Dfs<'d> {
    domain: &'d Domain,
    config: PlannerConfig,
    stats: SearchStats,
}

impl Dfs<'_> {
    fn seek(
        &mut self,
        state: &State,
        todo: &[Todo],
        plan: &mut Plan,
        depth: usize,
    ) -> Result<bool, PlanError> {
        self.stats.max_depth = self.stats.max_depth.max(depth);
        let Some((item, rest)) = todo.split_first() else {
            debug!(depth, "todo list empty");
            return Ok(true);
        };
        check_bounds(&self.config, depth, self.stats.expansions)?;
        self.stats.expansions += 1;
        debug!(depth, item = %item, rest = rest.len(), "seek");

        let mark = plan.len();
        for step in expand(self.domain, state, item, depth)? {
            let found = match step? {
                Step::Apply { state: next, call } => {
                    plan.push(call);
                    self.seek(&next, rest, plan, depth + 1)?
                }
                Step::Skip => self.seek(state, rest, plan, depth + 1)?,
                Step::Refine { subtasks, .. } => {
                    let mut next = subtasks;
                    next.extend_from_slice(rest);
                    self.seek(state, &next, plan, depth + 1)?
                }
            };
            if found {
                return Ok(true);
            }
            plan.truncate(mark);
            self.stats.backtracks += 1;
            trace!(depth, item = %item, "backtracking");
        }
        Ok(false)
    }
}

pub(crate) fn check_bounds(
    config: &PlannerConfig,
    depth: usize,
    expansions: usize,
) -> Result<(), PlanError> {
    if let Some(limit) = config.max_depth {
        if depth > limit {
            return Err(PlanError::DepthLimit(limit));
        }
    }
    if let Some(budget) = config.node_budget {
        if expansions >= budget {
            return Err(PlanError::NodeBudgetExhausted(budget));
        }
    }
    Ok(())
}

/// One way to consume the head of a todo list.
pub(crate) enum Step {
    /// An action applied cleanly.
    Apply { state: State, call: Call },
    /// Satisfied goal or passed verification; the state is unchanged.
    Skip,
    /// A method's subtasks (plus verification marker) replace the item.
    Refine { method: String, subtasks: Vec<Todo> },
}

/// Lazily yields the alternatives for one todo item in declaration order.
pub(crate) struct Expansion<'a> {
    state: &'a State,
    depth: usize,
    source: Source<'a>,
}

enum Source<'a> {
    Ready(Option<Step>),
    Task {
        call: &'a Call,
        methods: slice::Iter<'a, TaskMethod>,
    },
    Goal {
        goal: &'a Goal,
        methods: slice::Iter<'a, GoalMethod>,
    },
    Multigoal {
        goal: &'a Arc<Multigoal>,
        methods: slice::Iter<'a, MultigoalMethod>,
    },
}

/// Starts expanding `item`.
///
/// Name lookups and action arity checks happen here; method arity checks
/// happen as each method is tried.
pub(crate) fn expand<'a>(
    domain: &'a Domain,
    state: &'a State,
    item: &'a Todo,
    depth: usize,
) -> Result<Expansion<'a>, PlanError> {
    let source = match item {
        Todo::Action(call) => {
            let action = domain
                .action(&call.name)
                .ok_or_else(|| PlanError::UnknownAction(call.name.clone()))?;
            let applied = run_action(CallableKind::Action, action, state.clone(), call)?;
            if applied.is_none() {
                trace!(depth, action = %call, "action failed");
            }
            Source::Ready(applied.map(|state| Step::Apply {
                state,
                call: call.clone(),
            }))
        }
        Todo::Task(call) => {
            let methods = domain
                .task_methods(&call.name)
                .ok_or_else(|| PlanError::UnknownTask(call.name.clone()))?;
            Source::Task {
                call,
                methods: methods.iter(),
            }
        }
        Todo::Goal(goal) => {
            if goal.holds_in(state) {
                trace!(depth, goal = %goal, "goal already achieved");
                Source::Ready(Some(Step::Skip))
            } else {
                let methods = domain
                    .goal_methods(&goal.relation)
                    .ok_or_else(|| PlanError::UnknownRelation(goal.relation.clone()))?;
                Source::Goal {
                    goal,
                    methods: methods.iter(),
                }
            }
        }
        Todo::Multigoal(goal) => {
            if state.satisfies(goal) {
                trace!(depth, multigoal = goal.name(), "multigoal already achieved");
                Source::Ready(Some(Step::Skip))
            } else {
                let methods = domain.multigoal_methods();
                if methods.is_empty() {
                    return Err(PlanError::NoMultigoalMethods(goal.name().to_owned()));
                }
                Source::Multigoal {
                    goal,
                    methods: methods.iter(),
                }
            }
        }
        Todo::VerifyGoal { goal, method, .. } => {
            verified(goal.holds_in(state), depth, method, &goal.to_string())
        }
        Todo::VerifyMultigoal { goal, method, .. } => {
            verified(state.satisfies(goal), depth, method, goal.name())
        }
    };
    Ok(Expansion {
        state,
        depth,
        source,
    })
}

fn verified(holds: bool, depth: usize, method: &str, target: &str) -> Source<'static> {
    if holds {
        trace!(depth, method, target, "verified");
        Source::Ready(Some(Step::Skip))
    } else {
        debug!(depth, method, target, "method did not achieve its goal");
        Source::Ready(None)
    }
}

impl Iterator for Expansion<'_> {
    type Item = Result<Step, PlanError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (state, depth) = (self.state, self.depth);
        match &mut self.source {
            Source::Ready(step) => step.take().map(Ok),
            Source::Task { call, methods } => {
                for method in methods.by_ref() {
                    if let Err(err) = check_arity(
                        CallableKind::TaskMethod,
                        method.name(),
                        method.arity(),
                        call.args.len(),
                    ) {
                        return Some(Err(err));
                    }
                    let outcome = method.apply(state, &call.args);
                    match refined(CallableKind::TaskMethod, method.name(), outcome, depth) {
                        Ok(None) => {}
                        Ok(Some(subtasks)) => {
                            return Some(Ok(Step::Refine {
                                method: method.name().to_owned(),
                                subtasks,
                            }));
                        }
                        Err(err) => return Some(Err(err)),
                    }
                }
                None
            }
            Source::Goal { goal, methods } => {
                for method in methods.by_ref() {
                    let outcome = method.apply(state, &goal.key, &goal.value);
                    match refined(CallableKind::GoalMethod, method.name(), outcome, depth) {
                        Ok(None) => {}
                        Ok(Some(mut subtasks)) => {
                            subtasks.push(Todo::VerifyGoal {
                                goal: (*goal).clone(),
                                method: method.name().to_owned(),
                                depth,
                            });
                            return Some(Ok(Step::Refine {
                                method: method.name().to_owned(),
                                subtasks,
                            }));
                        }
                        Err(err) => return Some(Err(err)),
                    }
                }
                None
            }
            Source::Multigoal { goal, methods } => {
                for method in methods.by_ref() {
                    let outcome = method.apply(state, goal);
                    match refined(CallableKind::MultigoalMethod, method.name(), outcome, depth) {
                        Ok(None) => {}
                        Ok(Some(mut subtasks)) => {
                            subtasks.push(Todo::VerifyMultigoal {
                                goal: Arc::clone(goal),
                                method: method.name().to_owned(),
                                depth,
                            });
                            return Some(Ok(Step::Refine {
                                method: method.name().to_owned(),
                                subtasks,
                            }));
                        }
                        Err(err) => return Some(Err(err)),
                    }
                }
                None
            }
        }
    }
}

fn refined(
    kind: CallableKind,
    name: &str,
    outcome: Outcome,
    depth: usize,
) -> Result<Option<Vec<Todo>>, PlanError> {
    match outcome {
        Outcome::Failure => {
            trace!(depth, method = name, "not applicable");
            Ok(None)
        }
        Outcome::Decomposed(subtasks) => {
            trace!(depth, method = name, subtasks = %Listed(&subtasks), "applying method");
            Ok(Some(subtasks))
        }
        Outcome::Applied(_) => Err(PlanError::ContractViolation {
            kind,
            name: name.to_owned(),
            detail: "returned a state instead of subtasks".into(),
        }),
    }
}

/// Arity-checks and runs an action or command on `state`.
///
/// `Ok(None)` means the precondition failed.
pub(crate) fn run_action(
    kind: CallableKind,
    action: &Action,
    state: State,
    call: &Call,
) -> Result<Option<State>, PlanError> {
    check_arity(kind, action.name(), action.arity(), call.args.len())?;
    match action.apply(state, &call.args) {
        Outcome::Applied(next) => Ok(Some(next)),
        Outcome::Failure => Ok(None),
        Outcome::Decomposed(_) => Err(PlanError::ContractViolation {
            kind,
            name: action.name().to_owned(),
            detail: "returned subtasks instead of a state".into(),
        }),
    }
}

fn check_arity(kind: CallableKind, name: &str, expected: usize, got: usize) -> Result<(), PlanError> {
    if expected == got {
        Ok(())
    } else {
        Err(PlanError::ArityMismatch {
            kind,
            name: name.to_owned(),
            expected,
            got,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::split::split_goals_method;

    fn counter_domain() -> Domain {
        let mut domain = Domain::new("counter");
        let inc = Action::new("inc", 0, |mut s: State, _: &[crate::Value]| {
            let n = s.get("n", "x").and_then(crate::Value::as_int).unwrap_or(0);
            s.set("n", "x", n + 1);
            Outcome::Applied(s)
        });
        let _ = domain.declare_actions([inc]);
        domain
    }

    #[test]
    fn empty_todo_is_an_empty_plan() {
        let domain = Domain::new("empty");
        let plan = Planner::new(&domain).find_plan(&State::new("s"), &[]);
        assert_eq!(plan, Ok(Some(Vec::new())));
    }

    #[test]
    fn unknown_action_is_a_configuration_error() {
        let domain = Domain::new("empty");
        let todo = [Todo::action("fly", args![])];
        assert_eq!(
            Planner::new(&domain).find_plan(&State::new("s"), &todo),
            Err(PlanError::UnknownAction("fly".into()))
        );
    }

    #[test]
    fn action_arity_is_checked() {
        let domain = counter_domain();
        let todo = [Todo::action("inc", args![1])];
        assert!(matches!(
            Planner::new(&domain).find_plan(&State::new("s"), &todo),
            Err(PlanError::ArityMismatch { expected: 0, got: 1, .. })
        ));
    }

    #[test]
    fn depth_limit_stops_runaway_recursion() {
        let mut domain = counter_domain();
        domain.declare_task_methods(
            "forever",
            [TaskMethod::new("again", 0, |_, _| {
                Outcome::Decomposed(vec![Todo::action("inc", args![]), Todo::task("forever", args![])])
            })],
        );
        let planner = Planner::with_config(
            &domain,
            PlannerConfig {
                max_depth: Some(50),
                node_budget: None,
            },
        );
        let result = planner.find_plan(&State::new("s"), &[Todo::task("forever", args![])]);
        assert_eq!(result, Err(PlanError::DepthLimit(50)));
    }

    #[test]
    fn node_budget_is_enforced() {
        let domain = counter_domain();
        let todo = vec![Todo::action("inc", args![]); 5];
        let planner = Planner::with_config(
            &domain,
            PlannerConfig {
                max_depth: None,
                node_budget: Some(3),
            },
        );
        assert_eq!(
            planner.find_plan(&State::new("s"), &todo),
            Err(PlanError::NodeBudgetExhausted(3))
        );
    }

    #[test]
    fn stats_count_expansions() {
        let domain = counter_domain();
        let todo = vec![Todo::action("inc", args![]); 3];
        let (plan, stats) = Planner::new(&domain)
            .find_plan_with_stats(&State::new("s"), &todo)
            .unwrap_or_default();
        assert_eq!(plan.map(|p| p.len()), Some(3));
        assert_eq!(stats.expansions, 3);
        assert_eq!(stats.max_depth, 3);
        assert_eq!(stats.backtracks, 0);
    }

    #[test]
    fn method_returning_state_breaks_contract() {
        let mut domain = Domain::new("bad");
        domain.declare_task_methods(
            "t",
            [TaskMethod::new("m", 0, |s: &State, _: &[crate::Value]| Outcome::Applied(s.clone()))],
        );
        assert!(matches!(
            Planner::new(&domain).find_plan(&State::new("s"), &[Todo::task("t", args![])]),
            Err(PlanError::ContractViolation {
                kind: CallableKind::TaskMethod,
                ..
            })
        ));
    }

    /// `set(k, v)` writes `x[k] = v`. The `x` goal methods are tried in
    /// order: `liar` always writes 99, `honest` writes the wanted value.
    fn liar_domain() -> Domain {
        let mut domain = Domain::new("liar");
        let set = Action::new("set", 2, |mut s: State, args: &[crate::Value]| {
            s.set("x", args[0].clone(), args[1].clone());
            Outcome::Applied(s)
        });
        let _ = domain.declare_actions([set]);
        domain.declare_goal_methods(
            "x",
            [
                GoalMethod::new("liar", |_: &State, key: &crate::Value, _: &crate::Value| {
                    Outcome::Decomposed(vec![Todo::action("set", args![key, 99])])
                }),
                GoalMethod::new("honest", |_: &State, key: &crate::Value, value: &crate::Value| {
                    Outcome::Decomposed(vec![Todo::action("set", args![key, value])])
                }),
            ],
        );
        domain
    }

    #[test]
    fn failed_goal_verification_falls_through_to_next_method() {
        let domain = liar_domain();
        let (plan, stats) = Planner::new(&domain)
            .find_plan_with_stats(&State::new("s"), &[Todo::goal("x", "a", 1)])
            .unwrap_or_default();
        assert_eq!(plan, Some(vec![Call::new("set", args!["a", 1])]));
        assert!(stats.backtracks >= 1, "{stats:?}");
    }

    #[test]
    fn failed_multigoal_verification_falls_through_to_next_method() {
        let mut domain = liar_domain();
        domain.declare_multigoal_methods([
            MultigoalMethod::new("shrug", |_: &State, _: &Arc<Multigoal>| {
                Outcome::Decomposed(Vec::new())
            }),
            split_goals_method(),
        ]);
        let goal = Multigoal::new("g").with_goal("x", "a", 1);
        let (plan, stats) = Planner::new(&domain)
            .find_plan_with_stats(&State::new("s"), &[Todo::multigoal(goal)])
            .unwrap_or_default();
        assert_eq!(plan, Some(vec![Call::new("set", args!["a", 1])]));
        assert!(stats.backtracks >= 1, "{stats:?}");
    }

    #[test]
    fn simulate_applies_plan() {
        let domain = counter_domain();
        let plan = vec![Call::new("inc", args![]), Call::new("inc", args![])];
        let end = Planner::new(&domain).simulate(&State::new("s"), &plan);
        let n = end.ok().flatten().and_then(|s| s.get("n", "x").cloned());
        assert_eq!(n, Some(2.into()));
    }
}
