// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Blocks-world pieces shared by the three blocks domains.
//!
//! A state has three relations:
//!
//! - `pos[b]`: what block `b` sits on (another block, `"table"`, or `"hand"`);
//! - `clear[b]`: whether nothing sits on `b`;
//! - `holding["hand"]`: the held block, or `false`.
//!
//! The block-stacking algorithm (move a block straight to its final place if
//! possible, otherwise to the table) is driven by [`status`], and the three
//! domains differ only in how they express it: as tasks, as goals plus a
//! multigoal method, or by splitting multigoals.

use std::sync::Arc;

use htn_core::{Action, Domain, DomainError, Multigoal, Outcome, State, Todo, Value};

use crate::Problem;

/// Position relation.
pub const POS: &str = "pos";
/// Clear relation.
pub const CLEAR: &str = "clear";
/// Holding relation.
pub const HOLDING: &str = "holding";
/// The only key of [`HOLDING`], and the position of a held block.
pub const HAND: &str = "hand";
/// Bottom of every stack.
pub const TABLE: &str = "table";

pub(crate) fn is_clear(state: &State, block: &Value) -> bool {
    state.get(CLEAR, block).and_then(Value::as_bool) == Some(true)
}

pub(crate) fn hand_empty(state: &State) -> bool {
    state.get(HOLDING, HAND).and_then(Value::as_bool) == Some(false)
}

pub(crate) fn pos<'s>(state: &'s State, block: &Value) -> Option<&'s Value> {
    state.get(POS, block)
}

fn pickup(mut state: State, args: &[Value]) -> Outcome {
    let [b] = args else { return Outcome::Failure };
    if !(pos(&state, b).is_some_and(|p| p.is(TABLE)) && is_clear(&state, b) && hand_empty(&state)) {
        return Outcome::Failure;
    }
    state.set(POS, b.clone(), HAND);
    state.set(CLEAR, b.clone(), false);
    state.set(HOLDING, HAND, b.clone());
    Outcome::Applied(state)
}

fn unstack(mut state: State, args: &[Value]) -> Outcome {
    let [b, c] = args else { return Outcome::Failure };
    if c.is(TABLE) || pos(&state, b) != Some(c) || !is_clear(&state, b) || !hand_empty(&state) {
        return Outcome::Failure;
    }
    state.set(POS, b.clone(), HAND);
    state.set(CLEAR, b.clone(), false);
    state.set(HOLDING, HAND, b.clone());
    state.set(CLEAR, c.clone(), true);
    Outcome::Applied(state)
}

fn putdown(mut state: State, args: &[Value]) -> Outcome {
    let [b] = args else { return Outcome::Failure };
    if !pos(&state, b).is_some_and(|p| p.is(HAND)) {
        return Outcome::Failure;
    }
    state.set(POS, b.clone(), TABLE);
    state.set(CLEAR, b.clone(), true);
    state.set(HOLDING, HAND, false);
    Outcome::Applied(state)
}

fn stack(mut state: State, args: &[Value]) -> Outcome {
    let [b, c] = args else { return Outcome::Failure };
    if !pos(&state, b).is_some_and(|p| p.is(HAND)) || !is_clear(&state, c) {
        return Outcome::Failure;
    }
    state.set(POS, b.clone(), c.clone());
    state.set(CLEAR, b.clone(), true);
    state.set(HOLDING, HAND, false);
    state.set(CLEAR, c.clone(), false);
    Outcome::Applied(state)
}

/// `pickup`, `unstack`, `putdown`, `stack`.
pub fn declare_actions(domain: &mut Domain) -> Result<(), DomainError> {
    domain.declare_actions([
        Action::new("pickup", 1, pickup),
        Action::new("unstack", 2, unstack),
        Action::new("putdown", 1, putdown),
        Action::new("stack", 2, stack),
    ])
}

/// Every block, in key order.
pub fn all_blocks(state: &State) -> Vec<Value> {
    state
        .relation(CLEAR)
        .map(|clear| clear.keys().cloned().collect())
        .unwrap_or_default()
}

/// True when `block` and everything under it are where `goal` wants them.
pub fn is_done(block: &Value, state: &State, goal: &Multigoal) -> bool {
    let mut block = block.clone();
    // A stack can be no taller than the number of blocks.
    for _ in 0..=all_blocks(state).len() {
        if block.is(TABLE) {
            return true;
        }
        let here = pos(state, &block);
        if let Some(want) = goal.get(POS, &block) {
            if here != Some(want) {
                return false;
            }
        }
        match here {
            Some(below) if below.is(TABLE) => return true,
            Some(below) if !below.is(HAND) => block = below.clone(),
            _ => return false,
        }
    }
    false
}

/// What the stacking algorithm should do with a block next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Already in its final position.
    Done,
    /// Something sits on it.
    Inaccessible,
    /// Clear and belongs on the table (or nowhere in particular).
    MoveToTable,
    /// Clear and its destination is final and clear.
    MoveToBlock,
    /// Clear but its destination is not ready yet.
    Waiting,
}

/// Classifies `block` against `goal`.
pub fn status(block: &Value, state: &State, goal: &Multigoal) -> Status {
    if is_done(block, state, goal) {
        return Status::Done;
    }
    if !is_clear(state, block) {
        return Status::Inaccessible;
    }
    match goal.get(POS, block) {
        None => Status::MoveToTable,
        Some(dest) if dest.is(TABLE) => Status::MoveToTable,
        Some(dest) if is_done(dest, state, goal) && is_clear(state, dest) => Status::MoveToBlock,
        Some(_) => Status::Waiting,
    }
}

/// Next `(block, destination)` move of the stacking algorithm, or `None` when
/// nothing is left to move. A waiting block is only moved to the table if it
/// is not there already; moving it again would loop forever.
pub(crate) fn next_move(state: &State, goal: &Multigoal) -> Option<(Value, Value)> {
    let blocks = all_blocks(state);
    for block in &blocks {
        match status(block, state, goal) {
            Status::MoveToTable => return Some((block.clone(), Value::from(TABLE))),
            Status::MoveToBlock => {
                let dest = goal.get(POS, block)?.clone();
                return Some((block.clone(), dest));
            }
            _ => {}
        }
    }
    blocks
        .into_iter()
        .find(|block| {
            status(block, state, goal) == Status::Waiting
                && !pos(state, block).is_some_and(|p| p.is(TABLE))
        })
        .map(|block| (block, Value::from(TABLE)))
}

/// First multigoal mentioned in `todo`, either directly or as a task argument.
pub(crate) fn goal_in(todo: &[Todo]) -> Option<Arc<Multigoal>> {
    todo.iter().find_map(|item| match item {
        Todo::Multigoal(goal) | Todo::VerifyMultigoal { goal, .. } => Some(Arc::clone(goal)),
        Todo::Task(call) => call.args.iter().find_map(Value::as_multigoal).cloned(),
        _ => None,
    })
}

/// Lower bound on the actions still needed: two per block out of place, one
/// fewer if a block is already in hand. Reads the first multigoal in `todo`.
#[allow(clippy::cast_precision_loss)]
pub fn heuristic(state: &State, todo: &[Todo]) -> f64 {
    let Some(goal) = goal_in(todo) else { return 0.0 };
    let open = all_blocks(state)
        .iter()
        .filter(|b| !is_done(b, state, &goal))
        .count();
    let holding = usize::from(!hand_empty(state));
    (2 * open).saturating_sub(holding) as f64
}

/// `a` on `b`, `b` and `c` on the table.
pub fn state1() -> State {
    State::new("state1")
        .with_relation(POS, [("a", "b"), ("b", TABLE), ("c", TABLE)])
        .with_relation(CLEAR, [("a", true), ("b", false), ("c", true)])
        .with_relation(HOLDING, [(HAND, false)])
}

/// Stack `c`-`b`-`a` (with `a` explicitly on the table).
pub fn goal1a() -> Multigoal {
    Multigoal::new("goal1a").with_relation(POS, [("c", "b"), ("b", "a"), ("a", TABLE)])
}

/// Stack `c`-`b`-`a`, leaving `a` unconstrained.
pub fn goal1b() -> Multigoal {
    Multigoal::new("goal1b").with_relation(POS, [("c", "b"), ("b", "a")])
}

/// `a` on `c`, `b` on `d`.
pub fn state2() -> State {
    State::new("state2")
        .with_relation(POS, [("a", "c"), ("b", "d"), ("c", TABLE), ("d", TABLE)])
        .with_relation(CLEAR, [("a", true), ("c", false), ("b", true), ("d", false)])
        .with_relation(HOLDING, [(HAND, false)])
}

/// Swap the tops of the two stacks, fully specified.
pub fn goal2a() -> Multigoal {
    Multigoal::new("goal2a")
        .with_relation(POS, [("b", "c"), ("a", "d"), ("c", TABLE), ("d", TABLE)])
        .with_relation(CLEAR, [("a", true), ("c", false), ("b", true), ("d", false)])
        .with_relation(HOLDING, [(HAND, false)])
}

/// Swap the tops of the two stacks.
pub fn goal2b() -> Multigoal {
    Multigoal::new("goal2b").with_relation(POS, [("b", "c"), ("a", "d")])
}

/// Nineteen numbered blocks in four stacks (SHOP's `bw_large_d`).
pub fn state3() -> State {
    let on: [(i64, Value); 19] = [
        (1, Value::Int(12)),
        (12, Value::Int(13)),
        (13, Value::from(TABLE)),
        (11, Value::Int(10)),
        (10, Value::Int(5)),
        (5, Value::Int(4)),
        (4, Value::Int(14)),
        (14, Value::Int(15)),
        (15, Value::from(TABLE)),
        (9, Value::Int(8)),
        (8, Value::Int(7)),
        (7, Value::Int(6)),
        (6, Value::from(TABLE)),
        (19, Value::Int(18)),
        (18, Value::Int(17)),
        (17, Value::Int(16)),
        (16, Value::Int(3)),
        (3, Value::Int(2)),
        (2, Value::from(TABLE)),
    ];
    State::new("state3")
        .with_relation(POS, on)
        .with_relation(CLEAR, (1..=19_i64).map(|b| (b, matches!(b, 1 | 11 | 9 | 19))))
        .with_relation(HOLDING, [(HAND, false)])
}

/// Target configuration for [`state3`].
pub fn goal3() -> Multigoal {
    let on: [(i64, Value); 12] = [
        (15, Value::Int(13)),
        (13, Value::Int(8)),
        (8, Value::Int(9)),
        (9, Value::Int(4)),
        (4, Value::from(TABLE)),
        (12, Value::Int(2)),
        (2, Value::Int(3)),
        (3, Value::Int(16)),
        (16, Value::Int(11)),
        (11, Value::Int(7)),
        (7, Value::Int(6)),
        (6, Value::from(TABLE)),
    ];
    Multigoal::new("goal3")
        .with_relation(POS, on)
        .with_relation(CLEAR, [(17, true), (15, true), (12, true)])
}

/// The five standard problems, with `todo` turning each multigoal into the
/// domain's top-level todo list.
pub fn problems(todo: fn(&Arc<Multigoal>) -> Vec<Todo>) -> Vec<Problem> {
    [
        (state1(), goal1a()),
        (state1(), goal1b()),
        (state2(), goal2a()),
        (state2(), goal2b()),
        (state3(), goal3()),
    ]
    .into_iter()
    .map(|(state, goal)| {
        let goal = Arc::new(goal);
        Problem::new(goal.name(), state, todo(&goal))
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_of_state1_against_goal1a() {
        let (state, goal) = (state1(), goal1a());
        assert_eq!(status(&"a".into(), &state, &goal), Status::MoveToTable);
        assert_eq!(status(&"b".into(), &state, &goal), Status::Inaccessible);
        assert_eq!(status(&"c".into(), &state, &goal), Status::Waiting);
        assert_eq!(next_move(&state, &goal), Some(("a".into(), TABLE.into())));
    }

    #[test]
    fn goal_state_is_done_everywhere() {
        let state = State::new("done")
            .with_relation(POS, [("a", TABLE), ("b", "a"), ("c", "b")])
            .with_relation(CLEAR, [("a", false), ("b", false), ("c", true)])
            .with_relation(HOLDING, [(HAND, false)]);
        let goal = goal1a();
        assert!(all_blocks(&state).iter().all(|b| is_done(b, &state, &goal)));
        assert_eq!(next_move(&state, &goal), None);
        assert_eq!(heuristic(&state, &[Todo::multigoal(goal)]), 0.0);
    }

    #[test]
    fn held_block_is_never_done() {
        let mut state = state1();
        state.set(POS, "c", HAND);
        state.set(HOLDING, HAND, "c");
        assert!(!is_done(&"c".into(), &state, &goal1b()));
        assert!(!is_done(&"c".into(), &state, &Multigoal::new("none")));
    }

    #[test]
    fn heuristic_counts_two_per_open_block() {
        let goal = Arc::new(goal1a());
        let todo = [Todo::task("move_blocks", vec![Value::from(Arc::clone(&goal))])];
        // a, b, c all need to move in state1.
        assert_eq!(heuristic(&state1(), &todo), 6.0);
        assert_eq!(heuristic(&state1(), &[]), 0.0);
    }

    #[test]
    fn declaring_the_actions_twice_is_reported() {
        let mut domain = Domain::new("blocks");
        assert_eq!(declare_actions(&mut domain), Ok(()));
        assert_eq!(
            declare_actions(&mut domain),
            Err(DomainError::DuplicateAction("pickup".into()))
        );
    }

    #[test]
    fn actions_respect_preconditions() {
        let mut domain = Domain::new("blocks");
        assert_eq!(declare_actions(&mut domain), Ok(()));
        let unstack = domain.action("unstack");
        let ok = unstack.map(|a| a.apply(state1(), &["a".into(), "b".into()]));
        assert!(matches!(ok, Some(Outcome::Applied(_))));
        let wrong = unstack.map(|a| a.apply(state1(), &["c".into(), "b".into()]));
        assert!(matches!(wrong, Some(Outcome::Failure)));
        let pickup_covered = domain
            .action("pickup")
            .map(|a| a.apply(state1(), &["b".into()]));
        assert!(matches!(pickup_covered, Some(Outcome::Failure)));
    }
}
