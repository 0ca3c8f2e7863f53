// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lazy-lookahead execution: plan, execute with commands, replan on deviation.

use std::fmt;

use tracing::{debug, info, instrument, warn};

use crate::error::{CallableKind, PlanError};
use crate::planner::{run_action, Planner};
use crate::state::State;
use crate::todo::{Call, Listed, Plan, Todo};

/// How a lookahead run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookaheadOutcome {
    /// The todo list was accomplished (an empty plan, or goals that hold).
    Achieved,
    /// The planner found no plan from the live state.
    Unreachable,
    /// Every planning attempt was used without reaching the goal.
    ///
    /// A clean run of a plan for task items is confirmed by one extra replan
    /// that does not count as an attempt, so a single attempt is enough when
    /// nothing deviates.
    BudgetExhausted,
}

impl fmt::Display for LookaheadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Achieved => "achieved",
            Self::Unreachable => "unreachable",
            Self::BudgetExhausted => "replan budget exhausted",
        })
    }
}

/// Result of [`Planner::run_lazy_lookahead`].
#[derive(Debug, Clone, PartialEq)]
pub struct LookaheadReport {
    /// Live state after the last executed command.
    pub state: State,
    /// Why the driver stopped.
    pub outcome: LookaheadOutcome,
    /// Planning attempts made. Confirming replans after a clean run are not
    /// counted.
    pub attempts: usize,
    /// Calls whose commands ran successfully, in execution order.
    pub executed: Plan,
    /// Steps where the world did not behave as the action model predicted.
    pub deviations: usize,
}

/// Goal-only todo lists can be checked against a state directly.
fn achieved(state: &State, todo: &[Todo]) -> bool {
    todo.iter().all(|item| item.holds_in(state) == Some(true))
}

impl Planner<'_> {
    /// Plans from `state`, executes the plan with the domain's commands, and
    /// replans whenever execution deviates from the model, making at most
    /// `max_replans` planning attempts.
    ///
    /// Actions without a declared command execute their planning model.
    ///
    /// # Errors
    /// Any [`PlanError`] raised while planning or executing.
    #[instrument(skip_all, fields(domain = %self.domain().name(), max_replans = max_replans))]
    pub fn run_lazy_lookahead(
        &self,
        state: &State,
        todo: &[Todo],
        max_replans: usize,
    ) -> Result<LookaheadReport, PlanError> {
        info!(todo = %Listed(todo), "lazy lookahead");
        let mut report = LookaheadReport {
            state: state.clone(),
            outcome: LookaheadOutcome::BudgetExhausted,
            attempts: 0,
            executed: Plan::new(),
            deviations: 0,
        };
        if achieved(state, todo) {
            report.outcome = LookaheadOutcome::Achieved;
            return Ok(report);
        }

        // Plan found by a confirming replan, used by the next attempt.
        let mut carried: Option<Option<Plan>> = None;
        while report.attempts < max_replans {
            report.attempts += 1;
            let found = match carried.take() {
                Some(found) => found,
                None => self.find_plan(&report.state, todo)?,
            };
            let Some(plan) = found else {
                info!(attempt = report.attempts, "no plan from live state");
                report.outcome = LookaheadOutcome::Unreachable;
                return Ok(report);
            };
            if plan.is_empty() {
                report.outcome = LookaheadOutcome::Achieved;
                return Ok(report);
            }
            info!(attempt = report.attempts, plan = %Listed(&plan), "executing");
            if !self.execute(&plan, &mut report)? {
                continue;
            }
            if achieved(&report.state, todo) {
                report.outcome = LookaheadOutcome::Achieved;
                return Ok(report);
            }
            // Tasks have no state test. An empty replan after a clean run
            // confirms them without spending an attempt.
            let confirm = self.find_plan(&report.state, todo)?;
            if confirm.as_ref().is_some_and(Vec::is_empty) {
                debug!(attempt = report.attempts, "confirming replan is empty");
                report.outcome = LookaheadOutcome::Achieved;
                return Ok(report);
            }
            carried = Some(confirm);
        }
        warn!(attempts = report.attempts, "replan budget exhausted");
        Ok(report)
    }

    /// Runs `plan` against the live state; `false` on the first deviation.
    fn execute(&self, plan: &[Call], report: &mut LookaheadReport) -> Result<bool, PlanError> {
        for call in plan {
            let action = self.action(&call.name)?;
            let Some(predicted) =
                run_action(CallableKind::Action, action, report.state.clone(), call)?
            else {
                warn!(call = %call, "precondition no longer holds");
                report.deviations += 1;
                return Ok(false);
            };
            let (kind, command) = match self.domain().command(&call.name) {
                Some(command) => (CallableKind::Command, command),
                None => (CallableKind::Action, action),
            };
            let Some(actual) = run_action(kind, command, report.state.clone(), call)? else {
                warn!(call = %call, "command failed");
                report.deviations += 1;
                return Ok(false);
            };
            report.executed.push(call.clone());
            let diverged = actual != predicted;
            report.state = actual;
            if diverged {
                warn!(call = %call, "command result differs from the action model");
                report.deviations += 1;
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)]
    use super::*;
    use crate::args;
    use crate::domain::{Action, Command, Domain, GoalMethod, Outcome, TaskMethod};
    use crate::Value;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// `flip(x)` sets `lit[x] = true`; its command fails the first `misses` times.
    fn switchboard(misses: usize) -> Domain {
        let mut domain = Domain::new("switchboard");
        let flip = |mut s: State, args: &[Value]| {
            s.set("lit", args[0].clone(), true);
            Outcome::Applied(s)
        };
        let _ = domain.declare_actions([Action::new("flip", 1, flip)]);
        let calls = Arc::new(AtomicUsize::new(0));
        let _ = domain.declare_commands([Command::new("flip", 1, move |s, args| {
            if calls.fetch_add(1, Ordering::SeqCst) < misses {
                Outcome::Failure
            } else {
                flip(s, args)
            }
        })]);
        domain.declare_goal_methods(
            "lit",
            [GoalMethod::new("flip_it", |_, key, _| {
                Outcome::Decomposed(vec![Todo::action("flip", args![key])])
            })],
        );
        domain
    }

    #[test]
    fn goal_already_true_needs_no_attempts() {
        let domain = switchboard(0);
        let state = State::new("s").with_relation("lit", [("a", true)]);
        for budget in [0, 1, 5] {
            let report = Planner::new(&domain).run_lazy_lookahead(
                &state,
                &[Todo::goal("lit", "a", true)],
                budget,
            );
            let report = report.ok();
            assert_eq!(report.as_ref().map(|r| r.outcome), Some(LookaheadOutcome::Achieved));
            assert_eq!(report.map(|r| r.state), Some(state.clone()));
        }
    }

    #[test]
    fn failed_command_triggers_replanning() {
        let domain = switchboard(2);
        let report = Planner::new(&domain)
            .run_lazy_lookahead(&State::new("s"), &[Todo::goal("lit", "a", true)], 5)
            .ok();
        let Some(report) = report else {
            panic!("lookahead errored");
        };
        assert_eq!(report.outcome, LookaheadOutcome::Achieved);
        assert_eq!(report.attempts, 3);
        assert_eq!(report.deviations, 2);
        assert_eq!(report.executed.len(), 1);
        assert!(report.state.holds("lit", &"a".into(), &true.into()));
    }

    #[test]
    fn budget_exhaustion_is_reported() {
        let domain = switchboard(10);
        let report = Planner::new(&domain)
            .run_lazy_lookahead(&State::new("s"), &[Todo::goal("lit", "a", true)], 3)
            .ok();
        assert_eq!(
            report.map(|r| (r.outcome, r.attempts)),
            Some((LookaheadOutcome::BudgetExhausted, 3))
        );
    }

    /// `light(x)` flips `x` unless it is already lit; `blink(x)` always flips.
    fn with_light_tasks(mut domain: Domain) -> Domain {
        domain.declare_task_methods(
            "light",
            [TaskMethod::new("flip_if_dark", 1, |s: &State, args: &[Value]| {
                if s.holds("lit", &args[0], &true.into()) {
                    Outcome::Decomposed(Vec::new())
                } else {
                    Outcome::Decomposed(vec![Todo::action("flip", args![args[0].clone()])])
                }
            })],
        );
        domain.declare_task_methods(
            "blink",
            [TaskMethod::new("flip_always", 1, |_: &State, args: &[Value]| {
                Outcome::Decomposed(vec![Todo::action("flip", args![args[0].clone()])])
            })],
        );
        domain
    }

    #[test]
    fn clean_task_run_is_confirmed_within_one_attempt() {
        let domain = with_light_tasks(switchboard(0));
        let report = Planner::new(&domain)
            .run_lazy_lookahead(&State::new("s"), &[Todo::task("light", args!["a"])], 1)
            .ok();
        assert_eq!(
            report.as_ref().map(|r| (r.outcome, r.attempts, r.executed.len())),
            Some((LookaheadOutcome::Achieved, 1, 1))
        );
    }

    #[test]
    fn unconfirmed_task_plan_carries_into_the_next_attempt() {
        let domain = with_light_tasks(switchboard(0));
        let report = Planner::new(&domain)
            .run_lazy_lookahead(&State::new("s"), &[Todo::task("blink", args!["a"])], 2)
            .ok();
        assert_eq!(
            report.map(|r| (r.outcome, r.attempts, r.executed.len(), r.deviations)),
            Some((LookaheadOutcome::BudgetExhausted, 2, 2, 0))
        );
    }

    #[test]
    fn zero_budget_returns_input_state() {
        let domain = switchboard(0);
        let state = State::new("s");
        let report = Planner::new(&domain)
            .run_lazy_lookahead(&state, &[Todo::goal("lit", "a", true)], 0)
            .ok();
        assert_eq!(
            report.map(|r| (r.outcome, r.attempts, r.state)),
            Some((LookaheadOutcome::BudgetExhausted, 0, state))
        );
    }
}
