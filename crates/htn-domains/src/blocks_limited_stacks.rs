// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Blocks world with a fixed number of stacks and no hand.
//!
//! Besides `pos` and `clear`, a state records `stacks[i]`: the blocks of stack
//! `i`, bottom first. An empty stack is a free spot on the table, and a block
//! can only go down on the table where such a spot exists. Every action moves
//! one clear block to the top of another stack.
//!
//! - `make_clear(b, avoid)` unburies `b` without putting anything on the
//!   stacks listed in `avoid`. Its five methods differ in where the blocks
//!   above `b` go: spread over every other stack, alternated between the two
//!   neighbouring or the two lowest stacks, or dumped on one neighbour or the
//!   lowest stack.
//! - `put_on_table(b, goal)` frees a stack when none is empty by dissolving
//!   one whose bottom block does not belong on the table in `goal`.
//! - The multigoal methods build the goal towers level by level or one tower
//!   at a time. Neither ever moves a block that already sits in its final
//!   place, so the number of stacks is the only limit they have to respect.

use std::sync::Arc;

use htn_core::{
    args, Action, Domain, DomainError, GoalMethod, Multigoal, MultigoalMethod, Outcome, Relation,
    State, TaskMethod, Todo, Value,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::blocks::{self, is_clear, pos, CLEAR, POS, TABLE};
use crate::{blocks_generator, Problem};

/// Catalog name.
pub const NAME: &str = "blocks_limited_stacks";

/// Stack contents, bottom first, keyed by stack index.
pub const STACKS: &str = "stacks";

/// `(block count, stack count)` of the generated catalog problems.
pub const GENERATED: [(usize, usize); 2] = [(5, 3), (8, 4)];

fn stacks(state: &State) -> Vec<&[Value]> {
    state
        .relation(STACKS)
        .map(|all| all.values().map(|s| s.as_list().unwrap_or(&[])).collect())
        .unwrap_or_default()
}

fn stack_of(state: &State, block: &Value) -> Option<usize> {
    stacks(state).iter().position(|s| s.contains(block))
}

fn block_above(state: &State, block: &Value) -> Option<Value> {
    let all = stacks(state);
    let stack = all.iter().find(|s| s.contains(block))?;
    let at = stack.iter().position(|b| b == block)?;
    stack.get(at + 1).cloned()
}

fn first_empty(state: &State) -> Option<usize> {
    stacks(state).iter().position(|s| s.is_empty())
}

fn bottom(state: &State, stack: usize) -> Option<Value> {
    stacks(state).get(stack).and_then(|s| s.first()).cloned()
}

fn index(v: &Value) -> Option<usize> {
    v.as_int().and_then(|i| usize::try_from(i).ok())
}

fn indices(list: &Value) -> Vec<usize> {
    list.as_list()
        .map(|items| items.iter().filter_map(index).collect())
        .unwrap_or_default()
}

fn avoiding(stacks: impl IntoIterator<Item = usize>) -> Value {
    Value::List(stacks.into_iter().map(Value::from).collect())
}

/// Stacks other than `block`'s own and those in `avoid`.
fn eligible(state: &State, block: &Value, avoid: &[usize]) -> Vec<usize> {
    let own = stack_of(state, block);
    (0..stacks(state).len())
        .filter(|i| Some(*i) != own && !avoid.contains(i))
        .collect()
}

/// `candidates` from lowest to highest stack, by index among equals.
fn by_height(state: &State, mut candidates: Vec<usize>) -> Vec<usize> {
    let all = stacks(state);
    candidates.sort_by_key(|&i| (all.get(i).map_or(0, |s| s.len()), i));
    candidates
}

/// Nearest eligible stacks to the left and right of `block`'s, wrapping around.
fn neighbours(state: &State, block: &Value, targets: &[usize]) -> (Option<usize>, Option<usize>) {
    let n = stacks(state).len();
    let Some(own) = stack_of(state, block) else {
        return (None, None);
    };
    let left = (1..n).map(|k| (own + n - k) % n).find(|i| targets.contains(i));
    let right = (1..n).map(|k| (own + k) % n).find(|i| targets.contains(i));
    (left, right)
}

fn belongs_on_table(goal: &Multigoal, block: &Value) -> bool {
    goal.get(POS, block).is_some_and(|want| want.is(TABLE))
}

// ---------------------------------------------------------------------------
// Actions

/// Takes `block` off the top of its stack.
fn lift(state: &mut State, block: &Value) -> Option<()> {
    let i = stack_of(state, block)?;
    let mut stack = stacks(state).get(i)?.to_vec();
    if stack.pop().as_ref() != Some(block) {
        return None;
    }
    state.set(STACKS, i, stack);
    if let Some(under) = pos(state, block).filter(|u| !u.is(TABLE)).cloned() {
        state.set(CLEAR, under, true);
    }
    Some(())
}

/// Puts a lifted `block` on top of stack `i`, or on the table if it is empty.
fn drop_on(state: &mut State, block: &Value, i: usize) -> Option<()> {
    let mut stack = stacks(state).get(i)?.to_vec();
    if let Some(top) = stack.last() {
        state.set(POS, block.clone(), top.clone());
        state.set(CLEAR, top.clone(), false);
    } else {
        state.set(POS, block.clone(), TABLE);
    }
    stack.push(block.clone());
    state.set(STACKS, i, stack);
    Some(())
}

fn move_to(mut state: State, block: &Value, i: usize) -> Outcome {
    if !is_clear(&state, block) || stack_of(&state, block) == Some(i) || i >= stacks(&state).len() {
        return Outcome::Failure;
    }
    match lift(&mut state, block).and_then(|()| drop_on(&mut state, block, i)) {
        Some(()) => Outcome::Applied(state),
        None => Outcome::Failure,
    }
}

fn move_to_stack(state: State, args: &[Value]) -> Outcome {
    let [b, i] = args else { return Outcome::Failure };
    match index(i) {
        Some(i) => move_to(state, b, i),
        None => Outcome::Failure,
    }
}

fn stack(state: State, args: &[Value]) -> Outcome {
    let [b, c] = args else { return Outcome::Failure };
    if b == c || !pos(&state, b).is_some_and(|p| p.is(TABLE)) || !is_clear(&state, c) {
        return Outcome::Failure;
    }
    match stack_of(&state, c) {
        Some(i) => move_to(state, b, i),
        None => Outcome::Failure,
    }
}

fn unstack(state: State, args: &[Value]) -> Outcome {
    let [b, c] = args else { return Outcome::Failure };
    if c.is(TABLE) || pos(&state, b) != Some(c) {
        return Outcome::Failure;
    }
    match first_empty(&state) {
        Some(i) => move_to(state, b, i),
        None => Outcome::Failure,
    }
}

fn restack(state: State, args: &[Value]) -> Outcome {
    let [b, c, d] = args else { return Outcome::Failure };
    if c.is(TABLE) || b == d || pos(&state, b) != Some(c) || !is_clear(&state, d) {
        return Outcome::Failure;
    }
    match stack_of(&state, d) {
        Some(i) => move_to(state, b, i),
        None => Outcome::Failure,
    }
}

/// `move_to_stack`, `stack`, `unstack`, `restack`.
pub fn declare_actions(domain: &mut Domain) -> Result<(), DomainError> {
    domain.declare_actions([
        Action::new("move_to_stack", 2, move_to_stack),
        Action::new("stack", 2, stack),
        Action::new("unstack", 2, unstack),
        Action::new("restack", 3, restack),
    ])
}

// ---------------------------------------------------------------------------
// Clearing a block

fn done() -> Outcome {
    Outcome::Decomposed(Vec::new())
}

fn m_distribute(state: &State, args: &[Value]) -> Outcome {
    let [block, avoid] = args else { return Outcome::Failure };
    if is_clear(state, block) {
        return done();
    }
    match stack_of(state, block) {
        Some(own) => Outcome::Decomposed(vec![Todo::task(
            "make_clear_distribute",
            args![block, avoid, own + 1],
        )]),
        None => Outcome::Failure,
    }
}

/// Sends the block above `block` to the first eligible stack at or after
/// `next`, after doing the same for everything above it one stack further on.
fn m_distribute_aux(state: &State, args: &[Value]) -> Outcome {
    let [block, avoid, next] = args else { return Outcome::Failure };
    if is_clear(state, block) {
        return done();
    }
    let (Some(next), Some(above)) = (index(next), block_above(state, block)) else {
        return Outcome::Failure;
    };
    let targets = eligible(state, block, &indices(avoid));
    let n = stacks(state).len();
    let Some(dest) = (0..n).map(|k| (next + k) % n).find(|i| targets.contains(i)) else {
        return Outcome::Failure;
    };
    Outcome::Decomposed(vec![
        Todo::task("make_clear_distribute", args![&above, avoid, dest + 1]),
        Todo::action("move_to_stack", args![above, dest]),
    ])
}

fn m_split_to_nbr(state: &State, args: &[Value]) -> Outcome {
    let [block, avoid] = args else { return Outcome::Failure };
    if is_clear(state, block) {
        return done();
    }
    let targets = eligible(state, block, &indices(avoid));
    match neighbours(state, block, &targets) {
        (Some(left), Some(right)) if left != right => Outcome::Decomposed(vec![Todo::task(
            "make_clear_split",
            args![block, left, right, true],
        )]),
        _ => Outcome::Failure,
    }
}

fn m_split_to_smallest(state: &State, args: &[Value]) -> Outcome {
    let [block, avoid] = args else { return Outcome::Failure };
    if is_clear(state, block) {
        return done();
    }
    match by_height(state, eligible(state, block, &indices(avoid))).as_slice() {
        [first, second, ..] => Outcome::Decomposed(vec![Todo::task(
            "make_clear_split",
            args![block, *first, *second, true],
        )]),
        _ => Outcome::Failure,
    }
}

/// Alternates the blocks above `block` between two stacks, the topmost first.
fn m_split(state: &State, args: &[Value]) -> Outcome {
    let [block, first, second, even] = args else { return Outcome::Failure };
    if is_clear(state, block) {
        return done();
    }
    let (Some(even), Some(above)) = (even.as_bool(), block_above(state, block)) else {
        return Outcome::Failure;
    };
    let dest = if even { first } else { second };
    Outcome::Decomposed(vec![
        Todo::task("make_clear_split", args![&above, first, second, !even]),
        Todo::action("move_to_stack", args![above, dest]),
    ])
}

fn m_dump_to_nbr(state: &State, args: &[Value]) -> Outcome {
    let [block, avoid] = args else { return Outcome::Failure };
    if is_clear(state, block) {
        return done();
    }
    let targets = eligible(state, block, &indices(avoid));
    match neighbours(state, block, &targets).0 {
        Some(left) => Outcome::Decomposed(vec![Todo::task("make_clear_dump", args![block, left])]),
        None => Outcome::Failure,
    }
}

fn m_dump_to_smallest(state: &State, args: &[Value]) -> Outcome {
    let [block, avoid] = args else { return Outcome::Failure };
    if is_clear(state, block) {
        return done();
    }
    match by_height(state, eligible(state, block, &indices(avoid))).first() {
        Some(&lowest) => {
            Outcome::Decomposed(vec![Todo::task("make_clear_dump", args![block, lowest])])
        }
        None => Outcome::Failure,
    }
}

/// Moves everything above `block` onto one stack, the topmost first.
fn m_dump(state: &State, args: &[Value]) -> Outcome {
    let [block, dest] = args else { return Outcome::Failure };
    if is_clear(state, block) {
        return done();
    }
    match block_above(state, block) {
        Some(above) => Outcome::Decomposed(vec![
            Todo::task("make_clear_dump", args![&above, dest]),
            Todo::action("move_to_stack", args![above, dest]),
        ]),
        None => Outcome::Failure,
    }
}

/// `make_clear(block, [stack of other])`, with the stack looked up when the
/// task comes up rather than when it was queued.
fn m_clear_for(state: &State, args: &[Value]) -> Outcome {
    let [block, other] = args else { return Outcome::Failure };
    match stack_of(state, other) {
        Some(i) => Outcome::Decomposed(vec![Todo::task("make_clear", args![block, avoiding([i])])]),
        None => Outcome::Failure,
    }
}

fn m_move_one(state: &State, args: &[Value]) -> Outcome {
    let [block, dest] = args else { return Outcome::Failure };
    let Some(start) = pos(state, block) else {
        return Outcome::Failure;
    };
    if start == dest {
        return done();
    }
    let step = if start.is(TABLE) {
        Todo::action("stack", args![block, dest])
    } else if dest.is(TABLE) {
        Todo::action("unstack", args![block, start])
    } else {
        Todo::action("restack", args![block, start, dest])
    };
    Outcome::Decomposed(vec![step])
}

// ---------------------------------------------------------------------------
// Freeing a spot on the table

fn goal_arg(args: &[Value]) -> Option<(&Value, &Arc<Multigoal>)> {
    match args {
        [block, goal] => Some((block, goal.as_multigoal()?)),
        _ => None,
    }
}

fn m_already_on_table(state: &State, args: &[Value]) -> Outcome {
    match goal_arg(args) {
        Some((block, _)) if pos(state, block).is_some_and(|p| p.is(TABLE)) => done(),
        _ => Outcome::Failure,
    }
}

fn m_into_empty_stack(state: &State, args: &[Value]) -> Outcome {
    let (Some((block, _)), Some(free)) = (goal_arg(args), first_empty(state)) else {
        return Outcome::Failure;
    };
    Outcome::Decomposed(vec![
        Todo::task("make_clear", args![block, avoiding([free])]),
        Todo::action("move_to_stack", args![block, free]),
    ])
}

/// No stack is free: dissolve the lowest other stack whose bottom block does
/// not belong on the table.
fn m_dissolve_other_stack(state: &State, args: &[Value]) -> Outcome {
    let Some((block, goal)) = goal_arg(args) else {
        return Outcome::Failure;
    };
    let Some(own) = stack_of(state, block) else {
        return Outcome::Failure;
    };
    if first_empty(state).is_some() {
        return Outcome::Failure;
    }
    let others = (0..stacks(state).len()).filter(|&i| i != own).collect();
    let victim = by_height(state, others)
        .into_iter()
        .find(|&i| bottom(state, i).is_some_and(|b| !belongs_on_table(goal, &b)));
    match victim {
        Some(victim) => Outcome::Decomposed(vec![
            Todo::task("dissolve_stack", args![victim, avoiding([own])]),
            Todo::task("put_on_table", args![block, Arc::clone(goal)]),
        ]),
        None => Outcome::Failure,
    }
}

/// No stack is free and only `block`'s own stack may go: park `block` on the
/// lowest other stack, dissolve its old stack, then come back for it.
fn m_dissolve_own_stack(state: &State, args: &[Value]) -> Outcome {
    let Some((block, goal)) = goal_arg(args) else {
        return Outcome::Failure;
    };
    let Some(own) = stack_of(state, block) else {
        return Outcome::Failure;
    };
    if first_empty(state).is_some() || bottom(state, own).is_some_and(|b| belongs_on_table(goal, &b)) {
        return Outcome::Failure;
    }
    let others = (0..stacks(state).len()).filter(|&i| i != own).collect();
    let Some(&park) = by_height(state, others).first() else {
        return Outcome::Failure;
    };
    Outcome::Decomposed(vec![
        Todo::task("make_clear", args![block, avoiding([])]),
        Todo::action("move_to_stack", args![block, park]),
        Todo::task("dissolve_stack", args![own, avoiding([park])]),
        Todo::task("put_on_table", args![block, Arc::clone(goal)]),
    ])
}

/// Empties stack `i` bottom block last, keeping off the stacks in `avoid`.
fn m_dissolve(state: &State, args: &[Value]) -> Outcome {
    let [i, avoid] = args else { return Outcome::Failure };
    let Some(i) = index(i) else {
        return Outcome::Failure;
    };
    let Some(base) = bottom(state, i) else {
        return done();
    };
    Outcome::Decomposed(vec![
        Todo::task("make_clear", args![&base, avoid]),
        Todo::task("move_elsewhere", args![base, avoid]),
    ])
}

fn m_move_elsewhere(state: &State, args: &[Value]) -> Outcome {
    let [block, avoid] = args else { return Outcome::Failure };
    match by_height(state, eligible(state, block, &indices(avoid))).first() {
        Some(&dest) => Outcome::Decomposed(vec![Todo::action("move_to_stack", args![block, dest])]),
        None => Outcome::Failure,
    }
}

// ---------------------------------------------------------------------------
// Goals

fn g_pos_on_block(state: &State, block: &Value, dest: &Value) -> Outcome {
    if dest.is(TABLE) || block == dest || pos(state, block).is_none() || pos(state, dest).is_none() {
        return Outcome::Failure;
    }
    Outcome::Decomposed(vec![
        Todo::task("clear_for", args![block, dest]),
        Todo::task("clear_for", args![dest, block]),
        // Clearing `dest` may have buried `block` again.
        Todo::task("clear_for", args![block, dest]),
        Todo::task("move_one", args![block, dest]),
    ])
}

fn g_pos_on_table(state: &State, block: &Value, dest: &Value) -> Outcome {
    if !dest.is(TABLE) || pos(state, block).is_none() {
        return Outcome::Failure;
    }
    let anywhere = Arc::new(Multigoal::new("anywhere"));
    Outcome::Decomposed(vec![Todo::task("put_on_table", args![block, anywhere])])
}

fn g_clear(state: &State, block: &Value, truth: &Value) -> Outcome {
    if truth.as_bool() != Some(true) || pos(state, block).is_none() {
        return Outcome::Failure;
    }
    Outcome::Decomposed(vec![Todo::task("make_clear", args![block, avoiding([])])])
}

/// Towers described by an `on` relation, bottom first, for every block it puts
/// on the table.
pub fn towers(on: &Relation) -> Vec<Vec<Value>> {
    on.iter()
        .filter(|(_, under)| under.is(TABLE))
        .map(|(base, _)| {
            let mut tower = vec![base.clone()];
            loop {
                let Some(top) = tower.last() else { break };
                let next = on
                    .iter()
                    .find(|(b, under)| *under == top && !tower.contains(b))
                    .map(|(b, _)| b.clone());
                match next {
                    Some(b) => tower.push(b),
                    None => break,
                }
            }
            tower
        })
        .collect()
}

/// The towers `goal`'s `pos` goals describe.
pub fn goal_towers(goal: &Multigoal) -> Vec<Vec<Value>> {
    goal.relation(POS).map(towers).unwrap_or_default()
}

/// Every tower base, then every second block, and so on upwards.
fn level_by_level(goal: &Arc<Multigoal>) -> Vec<Todo> {
    let towers = goal_towers(goal);
    let mut todo: Vec<Todo> = towers
        .iter()
        .filter_map(|t| t.first())
        .map(|base| Todo::task("put_on_table", args![base, Arc::clone(goal)]))
        .collect();
    let height = towers.iter().map(Vec::len).max().unwrap_or(0);
    for level in 1..height {
        for tower in &towers {
            if let (Some(below), Some(block)) = (tower.get(level - 1), tower.get(level)) {
                todo.push(Todo::goal(POS, block, below));
            }
        }
    }
    todo
}

/// Each tower from the base up before the next one starts.
fn tower_by_tower(goal: &Arc<Multigoal>) -> Vec<Todo> {
    let mut todo = Vec::new();
    for tower in goal_towers(goal) {
        let Some(base) = tower.first() else { continue };
        todo.push(Todo::task("put_on_table", args![base, Arc::clone(goal)]));
        for pair in tower.windows(2) {
            if let [below, block] = pair {
                todo.push(Todo::goal(POS, block, below));
            }
        }
    }
    todo
}

fn solve_with(
    build: fn(&Arc<Multigoal>) -> Vec<Todo>,
) -> impl Fn(&State, &[Value]) -> Outcome + Send + Sync + 'static {
    move |_: &State, args: &[Value]| {
        let Some(goal) = args.first().and_then(Value::as_multigoal) else {
            return Outcome::Failure;
        };
        let mut todo = build(goal);
        todo.push(Todo::multigoal(Arc::clone(goal)));
        Outcome::Decomposed(todo)
    }
}

/// The limited-stacks domain.
pub fn domain() -> Result<Domain, DomainError> {
    let mut domain = Domain::new(NAME);
    declare_actions(&mut domain)?;
    domain.declare_task_methods(
        "make_clear",
        [
            TaskMethod::new("m_distribute", 2, m_distribute),
            TaskMethod::new("m_split_to_nbr", 2, m_split_to_nbr),
            TaskMethod::new("m_split_to_smallest", 2, m_split_to_smallest),
            TaskMethod::new("m_dump_to_nbr", 2, m_dump_to_nbr),
            TaskMethod::new("m_dump_to_smallest", 2, m_dump_to_smallest),
        ],
    );
    domain.declare_task_methods(
        "make_clear_distribute",
        [TaskMethod::new("m_distribute_aux", 3, m_distribute_aux)],
    );
    domain.declare_task_methods("make_clear_split", [TaskMethod::new("m_split", 4, m_split)]);
    domain.declare_task_methods("make_clear_dump", [TaskMethod::new("m_dump", 2, m_dump)]);
    domain.declare_task_methods("clear_for", [TaskMethod::new("m_clear_for", 2, m_clear_for)]);
    domain.declare_task_methods("move_one", [TaskMethod::new("m_move_one", 2, m_move_one)]);
    domain.declare_task_methods(
        "put_on_table",
        [
            TaskMethod::new("m_already_on_table", 2, m_already_on_table),
            TaskMethod::new("m_into_empty_stack", 2, m_into_empty_stack),
            TaskMethod::new("m_dissolve_other_stack", 2, m_dissolve_other_stack),
            TaskMethod::new("m_dissolve_own_stack", 2, m_dissolve_own_stack),
        ],
    );
    domain.declare_task_methods("dissolve_stack", [TaskMethod::new("m_dissolve", 2, m_dissolve)]);
    domain.declare_task_methods(
        "move_elsewhere",
        [TaskMethod::new("m_move_elsewhere", 2, m_move_elsewhere)],
    );
    domain.declare_task_methods(
        "solve_goal",
        [
            TaskMethod::new("m_multi_level", 1, solve_with(level_by_level)),
            TaskMethod::new("m_multi_stack", 1, solve_with(tower_by_tower)),
        ],
    );
    domain.declare_goal_methods(
        POS,
        [
            GoalMethod::new("m_pos_on_block", g_pos_on_block),
            GoalMethod::new("m_pos_on_table", g_pos_on_table),
        ],
    );
    domain.declare_goal_methods(CLEAR, [GoalMethod::new("m_clear", g_clear)]);
    domain.declare_multigoal_methods([
        MultigoalMethod::new("m_multi_level", |_: &State, goal: &Arc<Multigoal>| {
            Outcome::Decomposed(level_by_level(goal))
        }),
        MultigoalMethod::new("m_multi_stack", |_: &State, goal: &Arc<Multigoal>| {
            Outcome::Decomposed(tower_by_tower(goal))
        }),
    ]);
    Ok(domain)
}

/// `[goal]` as a multigoal item.
pub fn todo(goal: &Arc<Multigoal>) -> Vec<Todo> {
    vec![Todo::multigoal(Arc::clone(goal))]
}

/// `[solve_goal(goal)]`.
pub fn task_todo(goal: &Arc<Multigoal>) -> Vec<Todo> {
    vec![Todo::task("solve_goal", args![Arc::clone(goal)])]
}

/// Goal blocks not yet in their final place. Each needs at least one move.
#[allow(clippy::cast_precision_loss)]
pub fn heuristic(state: &State, todo: &[Todo]) -> f64 {
    let Some(goal) = blocks::goal_in(todo) else { return 0.0 };
    let open = goal.relation(POS).map_or(0, |want| {
        want.keys()
            .filter(|b| !blocks::is_done(b, state, &goal))
            .count()
    });
    open as f64
}

/// State holding `stacks` (bottom first), padded with empty stacks up to
/// `max_stacks`.
pub fn state_from_stacks(name: &str, stacks: &[Vec<Value>], max_stacks: usize) -> State {
    let mut state = State::new(name);
    for (i, stack) in stacks.iter().enumerate() {
        let mut under = Value::from(TABLE);
        for block in stack {
            state.set(POS, block.clone(), under.clone());
            state.set(CLEAR, block.clone(), true);
            if !under.is(TABLE) {
                state.set(CLEAR, under, false);
            }
            under = block.clone();
        }
        state.set(STACKS, i, stack.clone());
    }
    for i in stacks.len()..max_stacks {
        state.set(STACKS, i, Vec::<Value>::new());
    }
    state
}

fn named(stacks: &[&[&str]]) -> Vec<Vec<Value>> {
    stacks
        .iter()
        .map(|s| s.iter().copied().map(Value::from).collect())
        .collect()
}

/// `a` on `b` on `c` in one of three stacks.
pub fn small_state() -> State {
    state_from_stacks("small", &named(&[&["c", "b", "a"]]), 3)
}

/// The same tower upside down.
pub fn small_goal() -> Multigoal {
    Multigoal::new("small").with_relation(POS, [("a", TABLE), ("b", "a"), ("c", "b")])
}

/// Eight blocks in six stacks, five of them in one tower.
pub fn simple_state() -> State {
    state_from_stacks(
        "simple",
        &named(&[&["a", "c", "e", "f", "g"], &["b"], &["d"], &["h"]]),
        6,
    )
}

/// Four towers of two.
pub fn simple_goal() -> Multigoal {
    Multigoal::new("simple").with_relation(
        POS,
        [
            ("a", TABLE),
            ("c", "a"),
            ("d", TABLE),
            ("g", "d"),
            ("e", TABLE),
            ("f", "e"),
            ("h", TABLE),
            ("b", "h"),
        ],
    )
}

/// Four stacks, none of them free.
pub fn crowded_state() -> State {
    state_from_stacks("crowded", &named(&[&["a", "b"], &["c", "d"], &["e"], &["f"]]), 4)
}

/// Every pair turned upside down, so a stack has to be dissolved first.
pub fn crowded_goal() -> Multigoal {
    Multigoal::new("crowded").with_relation(
        POS,
        [
            ("b", TABLE),
            ("a", "b"),
            ("d", TABLE),
            ("c", "d"),
            ("f", TABLE),
            ("e", "f"),
        ],
    )
}

/// Random start and goal with `n` blocks in `max_stacks` stacks.
pub fn random_problem<R: Rng>(rng: &mut R, name: &str, n: usize, max_stacks: usize) -> (State, Multigoal) {
    let likelihood = blocks_generator::STACKING_LIKELIHOOD;
    let start = blocks_generator::random_state(rng, name, n, likelihood, max_stacks);
    let target = blocks_generator::random_state(rng, "target", n, likelihood, max_stacks);
    let start_towers = start.relation(POS).map(towers).unwrap_or_default();
    let mut goal = Multigoal::new(format!("{name}_goal"));
    for (block, under) in target.relation(POS).into_iter().flatten() {
        goal.set(POS, block.clone(), under.clone());
    }
    (state_from_stacks(name, &start_towers, max_stacks), goal)
}

/// The fixed problems, `crowded` once more through `solve_goal`, and one
/// generated problem per entry of [`GENERATED`].
pub fn problems(seed: u64) -> Vec<Problem> {
    let mut out: Vec<Problem> = [
        (small_state(), small_goal()),
        (simple_state(), simple_goal()),
        (crowded_state(), crowded_goal()),
    ]
    .into_iter()
    .map(|(state, goal)| {
        let goal = Arc::new(goal);
        Problem::new(goal.name(), state, todo(&goal))
    })
    .collect();
    out.push(Problem::new(
        "crowded_task",
        crowded_state(),
        task_todo(&Arc::new(crowded_goal())),
    ));

    let mut rng = StdRng::seed_from_u64(seed);
    for (n, max_stacks) in GENERATED {
        let name = format!("random{n}");
        let (state, goal) = random_problem(&mut rng, &name, n, max_stacks);
        debug!(problem = %name, %state, goal = %goal, "generated limited-stacks problem");
        out.push(Problem::new(name, state, todo(&Arc::new(goal))));
    }
    out
}
