// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Seeded random blocks-world states and problems.
//!
//! Blocks are numbered `0..n`. Each block after the first starts a new stack
//! with probability `1 - stacking_likelihood` (while fewer than `max_stacks`
//! stacks exist) and otherwise lands on a uniformly chosen clear block. The
//! labels are then shuffled so every block is equally likely to end up in any
//! position.

use std::sync::Arc;

use htn_core::{Multigoal, State, Value};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::blocks::{CLEAR, HAND, HOLDING, POS, TABLE};
use crate::{blocks_tasks, Problem};

/// Catalog name.
pub const NAME: &str = "blocks_generator";

/// Block counts of the generated catalog problems.
pub const SIZES: [usize; 3] = [4, 6, 8];

/// Stacking probability used for catalog problems.
pub const STACKING_LIKELIHOOD: f64 = 0.5;

/// Layout as `(on, clear)`: `on[b]` is the block under `b`, `None` for the
/// table.
type Layout = (Vec<Option<usize>>, Vec<bool>);

fn stack_blocks<R: Rng>(rng: &mut R, n: usize, stacking_likelihood: f64, max_stacks: usize) -> Layout {
    let mut on = vec![None; n];
    let mut clear = vec![true; n];
    if n == 0 {
        return (on, clear);
    }
    let mut tops = vec![0];
    for block in 1..n {
        let observed: f64 = rng.gen();
        if observed > stacking_likelihood && tops.len() < max_stacks {
            tops.push(block);
        } else {
            let i = rng.gen_range(0..tops.len());
            on[block] = Some(tops[i]);
            clear[tops[i]] = false;
            tops[i] = block;
        }
    }
    (on, clear)
}

fn permute<R: Rng>(rng: &mut R, (on, clear): Layout) -> Layout {
    let n = on.len();
    let mut perm: Vec<usize> = (0..n).collect();
    perm.shuffle(rng);
    let mut inverse = vec![0; n];
    for (i, &p) in perm.iter().enumerate() {
        inverse[p] = i;
    }
    let on = perm.iter().map(|&p| on[p].map(|under| inverse[under])).collect();
    let clear = perm.iter().map(|&p| clear[p]).collect();
    (on, clear)
}

fn block_id(b: usize) -> Value {
    Value::from(b)
}

fn under(on: Option<usize>) -> Value {
    on.map_or_else(|| Value::from(TABLE), block_id)
}

/// Random state with `n` blocks, hand empty.
pub fn random_state<R: Rng>(
    rng: &mut R,
    name: &str,
    n: usize,
    stacking_likelihood: f64,
    max_stacks: usize,
) -> State {
    let layout = stack_blocks(rng, n, stacking_likelihood, max_stacks.max(1));
    let (on, clear) = permute(rng, layout);
    State::new(name)
        .with_relation(POS, on.iter().enumerate().map(|(b, &u)| (block_id(b), under(u))))
        .with_relation(CLEAR, clear.iter().enumerate().map(|(b, &c)| (block_id(b), c)))
        .with_relation(HOLDING, [(HAND, false)])
}

/// Random start state and a `pos` multigoal taken from a second random state.
pub fn random_problem<R: Rng>(rng: &mut R, name: &str, n: usize, stacking_likelihood: f64) -> (State, Multigoal) {
    let start = random_state(rng, name, n, stacking_likelihood, n);
    let target = random_state(rng, "target", n, stacking_likelihood, n);
    let mut goal = Multigoal::new(format!("{name}_goal"));
    if let Some(pos) = target.relation(POS) {
        for (block, under) in pos {
            goal.set(POS, block.clone(), under.clone());
        }
    }
    (start, goal)
}

/// One task-method problem per entry of [`SIZES`], all derived from `seed`.
pub fn problems(seed: u64) -> Vec<Problem> {
    let mut rng = StdRng::seed_from_u64(seed);
    SIZES
        .into_iter()
        .map(|n| {
            let name = format!("random{n}");
            let (state, goal) = random_problem(&mut rng, &name, n, STACKING_LIKELIHOOD);
            debug!(problem = %name, %state, goal = %goal, "generated blocks problem");
            Problem::new(name, state, blocks_tasks::todo(&Arc::new(goal)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stacks_are_consistent(state: &State) -> bool {
        let Some(pos) = state.relation(POS) else {
            return false;
        };
        pos.keys().all(|block| {
            let covered = pos.values().filter(|under| *under == block).count();
            let clear = state.get(CLEAR, block).and_then(Value::as_bool);
            covered <= 1 && clear == Some(covered == 0)
        })
    }

    #[test]
    fn same_seed_same_state() {
        let a = random_state(&mut StdRng::seed_from_u64(5), "a", 10, 0.5, 10);
        let b = random_state(&mut StdRng::seed_from_u64(5), "b", 10, 0.5, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn generated_states_are_well_formed() {
        let mut rng = StdRng::seed_from_u64(11);
        for n in 0..12 {
            let state = random_state(&mut rng, "s", n, 0.7, 3);
            assert!(stacks_are_consistent(&state), "bad stacks: {state}");
            let on_table = state
                .relation(POS)
                .map_or(0, |pos| pos.values().filter(|u| u.is(TABLE)).count());
            assert!(on_table <= 3);
            assert_eq!(on_table == 0, n == 0);
        }
    }

    #[test]
    fn never_stacking_puts_everything_on_the_table() {
        let state = random_state(&mut StdRng::seed_from_u64(1), "flat", 5, -1.0, 5);
        let pos = state.relation(POS).cloned().unwrap_or_default();
        assert!(pos.values().all(|u| u.is(TABLE)));
    }

    #[test]
    fn catalog_problems_are_reproducible() {
        let names: Vec<_> = problems(0).into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["random4", "random6", "random8"]);
        assert_eq!(problems(7)[2].state, problems(7)[2].state);
    }
}
