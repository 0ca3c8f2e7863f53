// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Greedy best-first and A* search over decomposition nodes.
//!
//! A node is a `(state, todo, plan, cost)` tuple. Expanding a node consumes the
//! head of its todo list exactly as the depth-first planner does, but every
//! non-failing alternative becomes a child on the frontier instead of being
//! explored immediately. There is no visited set; the node budget bounds
//! runaway searches.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use tracing::{debug, info, instrument, trace};

use crate::error::{CallableKind, PlanError};
use crate::planner::{check_bounds, expand, Planner, SearchStats, Step};
use crate::state::State;
use crate::todo::{Call, Listed, Plan, Todo};

/// Estimate of remaining cost for a `(state, todo)` node.
pub type Heuristic<'a> = dyn Fn(&State, &[Todo]) -> f64 + 'a;

/// Cost of executing one action; [`unit_cost`] when omitted.
pub type CostFn<'a> = dyn Fn(&Call) -> f64 + 'a;

/// Frontier ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Priority is `h(node)`.
    #[default]
    Greedy,
    /// Priority is `g(node) + h(node)`.
    AStar,
}

/// Every action costs 1.
pub fn unit_cost(_: &Call) -> f64 {
    1.0
}

struct Node {
    state: State,
    todo: Vec<Todo>,
    plan: Plan,
    cost: f64,
    depth: usize,
}

/// Frontier entry. The heap pops the lowest priority first and breaks ties by
/// insertion order.
struct Queued {
    priority: OrderedFloat<f64>,
    seq: usize,
    node: Node,
}

impl Queued {
    fn key(&self) -> (OrderedFloat<f64>, usize) {
        (self.priority, self.seq)
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

/// Min-priority frontier with a running sequence number.
#[derive(Default)]
struct Frontier {
    heap: BinaryHeap<Queued>,
    pushed: usize,
}

impl Frontier {
    fn push(&mut self, priority: f64, node: Node) {
        self.heap.push(Queued {
            priority: OrderedFloat(priority),
            seq: self.pushed,
            node,
        });
        self.pushed += 1;
    }

    fn pop(&mut self) -> Option<Queued> {
        self.heap.pop()
    }
}

impl Planner<'_> {
    /// Greedy best-first search guided by `heuristic`.
    ///
    /// # Errors
    /// As [`plan_heuristic`](Self::plan_heuristic).
    pub fn find_plan_gbfs(
        &self,
        state: &State,
        todo: &[Todo],
        heuristic: &Heuristic<'_>,
        cost: Option<&CostFn<'_>>,
    ) -> Result<Option<Plan>, PlanError> {
        self.plan_heuristic(state, todo, heuristic, cost, SearchMode::Greedy)
    }

    /// A* search guided by `heuristic`.
    ///
    /// With nonnegative costs and an admissible heuristic the returned plan has
    /// minimal total cost among all decompositions.
    ///
    /// # Errors
    /// As [`plan_heuristic`](Self::plan_heuristic).
    pub fn find_plan_astar(
        &self,
        state: &State,
        todo: &[Todo],
        heuristic: &Heuristic<'_>,
        cost: Option<&CostFn<'_>>,
    ) -> Result<Option<Plan>, PlanError> {
        self.plan_heuristic(state, todo, heuristic, cost, SearchMode::AStar)
    }

    /// Best-first search with the given frontier ordering.
    ///
    /// # Errors
    /// Configuration errors as for [`find_plan`](Self::find_plan), a NaN
    /// heuristic value, or an exhausted node budget.
    pub fn plan_heuristic(
        &self,
        state: &State,
        todo: &[Todo],
        heuristic: &Heuristic<'_>,
        cost: Option<&CostFn<'_>>,
        mode: SearchMode,
    ) -> Result<Option<Plan>, PlanError> {
        self.plan_heuristic_with_stats(state, todo, heuristic, cost, mode)
            .map(|(plan, _)| plan)
    }

    /// [`plan_heuristic`](Self::plan_heuristic) plus search counters.
    ///
    /// # Errors
    /// As [`plan_heuristic`](Self::plan_heuristic).
    #[instrument(skip_all, fields(domain = %self.domain().name(), state = %state.name(), mode = ?mode))]
    pub fn plan_heuristic_with_stats(
        &self,
        state: &State,
        todo: &[Todo],
        heuristic: &Heuristic<'_>,
        cost: Option<&CostFn<'_>>,
        mode: SearchMode,
    ) -> Result<(Option<Plan>, SearchStats), PlanError> {
        info!(todo = %Listed(todo), "heuristic search");
        let cost = cost.unwrap_or(&unit_cost);
        let config = self.config();
        let mut stats = SearchStats::default();
        let mut frontier = Frontier::default();

        let root = Node {
            state: state.clone(),
            todo: todo.to_vec(),
            plan: Plan::new(),
            cost: 0.0,
            depth: 0,
        };
        frontier.push(node_priority(heuristic, mode, &root)?, root);

        while let Some(Queued {
            priority: OrderedFloat(priority),
            seq,
            node,
        }) = frontier.pop()
        {
            stats.max_depth = stats.max_depth.max(node.depth);
            let Some((item, rest)) = node.todo.split_first() else {
                info!(plan = %Listed(&node.plan), cost = node.cost, expansions = stats.expansions, "plan found");
                return Ok((Some(node.plan), stats));
            };
            check_bounds(&config, node.depth, stats.expansions)?;
            stats.expansions += 1;
            debug!(seq, priority, depth = node.depth, item = %item, "expanding");

            let mut children = 0_usize;
            for step in expand(self.domain(), &node.state, item, node.depth)? {
                let child = match step? {
                    Step::Apply { state, call } => {
                        let mut plan = node.plan.clone();
                        let step_cost = cost(&call);
                        plan.push(call);
                        Node {
                            state,
                            todo: rest.to_vec(),
                            plan,
                            cost: node.cost + step_cost,
                            depth: node.depth + 1,
                        }
                    }
                    Step::Skip => Node {
                        state: node.state.clone(),
                        todo: rest.to_vec(),
                        plan: node.plan.clone(),
                        cost: node.cost,
                        depth: node.depth + 1,
                    },
                    Step::Refine { method, subtasks } => {
                        trace!(seq, method = %method, "queueing refinement");
                        let mut todo = subtasks;
                        todo.extend_from_slice(rest);
                        Node {
                            state: node.state.clone(),
                            todo,
                            plan: node.plan.clone(),
                            cost: node.cost,
                            depth: node.depth + 1,
                        }
                    }
                };
                frontier.push(node_priority(heuristic, mode, &child)?, child);
                children += 1;
            }
            if children == 0 {
                stats.backtracks += 1;
                trace!(seq, "dead end");
            }
        }
        info!(expansions = stats.expansions, "frontier exhausted");
        Ok((None, stats))
    }
}

fn node_priority(heuristic: &Heuristic<'_>, mode: SearchMode, node: &Node) -> Result<f64, PlanError> {
    let h = heuristic(&node.state, &node.todo);
    if h.is_nan() {
        return Err(PlanError::ContractViolation {
            kind: CallableKind::Heuristic,
            name: "heuristic".into(),
            detail: format!("returned NaN for todo {}", Listed(&node.todo)),
        });
    }
    Ok(match mode {
        SearchMode::Greedy => h,
        SearchMode::AStar => node.cost + h,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::domain::{Action, Domain, Outcome, TaskMethod};
    use crate::Value;

    /// `reach(n)`: either one expensive `jump` or `n` cheap `step`s.
    fn ladder() -> Domain {
        let mut domain = Domain::new("ladder");
        let bump = |s: State, by: i64| {
            let mut s = s;
            let at = s.get("at", "me").and_then(Value::as_int).unwrap_or(0);
            s.set("at", "me", at + by);
            Outcome::Applied(s)
        };
        let _ = domain.declare_actions([
            Action::new("jump", 1, move |s, args: &[Value]| {
                bump(s, args[0].as_int().unwrap_or(0))
            }),
            Action::new("step", 0, move |s, _| bump(s, 1)),
        ]);
        domain.declare_task_methods(
            "reach",
            [
                TaskMethod::new("by_jump", 1, |_, args: &[Value]| {
                    Outcome::Decomposed(vec![Todo::action("jump", args.to_vec())])
                }),
                TaskMethod::new("by_steps", 1, |s: &State, args: &[Value]| {
                    let at = s.get("at", "me").and_then(Value::as_int).unwrap_or(0);
                    let goal = args[0].as_int().unwrap_or(0);
                    if at >= goal {
                        return Outcome::Decomposed(Vec::new());
                    }
                    Outcome::Decomposed(vec![
                        Todo::action("step", args![]),
                        Todo::task("reach", args.to_vec()),
                    ])
                }),
            ],
        );
        domain
    }

    fn jump_cost(call: &Call) -> f64 {
        if call.name == "jump" {
            10.0
        } else {
            1.0
        }
    }

    #[test]
    fn astar_prefers_cheaper_decomposition() {
        let domain = ladder();
        let planner = Planner::new(&domain);
        let todo = [Todo::task("reach", args![3])];
        let zero = |_: &State, _: &[Todo]| 0.0;
        let dfs = planner.find_plan(&State::new("s"), &todo);
        assert_eq!(dfs, Ok(Some(vec![Call::new("jump", args![3])])));
        let astar = planner.find_plan_astar(&State::new("s"), &todo, &zero, Some(&jump_cost));
        assert_eq!(astar.ok().flatten().map(|p| p.len()), Some(3));
    }

    #[test]
    fn nan_heuristic_is_rejected() {
        let domain = ladder();
        let nan = |_: &State, _: &[Todo]| f64::NAN;
        let result = Planner::new(&domain).find_plan_gbfs(
            &State::new("s"),
            &[Todo::task("reach", args![1])],
            &nan,
            None,
        );
        assert!(matches!(
            result,
            Err(PlanError::ContractViolation {
                kind: CallableKind::Heuristic,
                ..
            })
        ));
    }

    #[test]
    fn empty_todo_pops_immediately() {
        let domain = Domain::new("empty");
        let zero = |_: &State, _: &[Todo]| 0.0;
        let (plan, stats) = Planner::new(&domain)
            .plan_heuristic_with_stats(&State::new("s"), &[], &zero, None, SearchMode::AStar)
            .unwrap_or_default();
        assert_eq!(plan, Some(Vec::new()));
        assert_eq!(stats.expansions, 0);
    }

    #[test]
    fn frontier_pops_lowest_priority_then_oldest() {
        let node = |depth| Node {
            state: State::new("s"),
            todo: Vec::new(),
            plan: Plan::new(),
            cost: 0.0,
            depth,
        };
        let mut frontier = Frontier::default();
        for (depth, priority) in [(0, 2.0), (1, 1.0), (2, f64::INFINITY), (3, 1.0), (4, 2.0)] {
            frontier.push(priority, node(depth));
        }
        let order: Vec<usize> = std::iter::from_fn(|| frontier.pop())
            .map(|q| q.node.depth)
            .collect();
        assert_eq!(order, vec![1, 3, 0, 4, 2]);
    }

    #[test]
    fn infinite_heuristic_sorts_last() {
        let domain = ladder();
        // Penalise the jump branch; greedy search must then take the steps.
        let h = |_: &State, todo: &[Todo]| match todo.first() {
            Some(Todo::Action(call)) if call.name == "jump" => f64::INFINITY,
            _ => 0.0,
        };
        let plan = Planner::new(&domain).find_plan_gbfs(
            &State::new("s"),
            &[Todo::task("reach", args![2])],
            &h,
            None,
        );
        assert_eq!(
            plan,
            Ok(Some(vec![Call::new("step", args![]), Call::new("step", args![])]))
        );
    }
}
