//! Epsilon-greedy action selection

use rand::Rng;

use super::q_table::QTable;
use super::state_key::StateKey;
use crate::game::Direction;

/// Pick an action for `state` from the three non-reversing moves.
///
/// With probability `epsilon` a uniformly random valid move is returned.
/// Otherwise the move with the highest Q-value wins, missing entries counting
/// as 0. Ties go to the first maximum in `valid_actions` order, which is the
/// canonical Up, Down, Left, Right order. A state with nothing stored yet is
/// treated like exploration.
pub fn choose_action<R: Rng + ?Sized>(
    q_table: &QTable,
    state: &StateKey,
    valid_actions: &[Direction; 3],
    epsilon: f64,
    rng: &mut R,
) -> Direction {
    if rng.gen_bool(epsilon.clamp(0.0, 1.0)) {
        return random_action(valid_actions, rng);
    }

    if q_table.actions(state).is_none() {
        return random_action(valid_actions, rng);
    }

    greedy_action(q_table, state, valid_actions)
}

/// Highest-valued action with first-wins tie-breaking
pub fn greedy_action(
    q_table: &QTable,
    state: &StateKey,
    valid_actions: &[Direction; 3],
) -> Direction {
    let mut best = valid_actions[0];
    let mut best_value = q_table.get(state, best);

    for &action in &valid_actions[1..] {
        let value = q_table.get(state, action);
        if value > best_value {
            best = action;
            best_value = value;
        }
    }

    best
}

fn random_action<R: Rng + ?Sized>(valid_actions: &[Direction; 3], rng: &mut R) -> Direction {
    valid_actions[rng.gen_range(0..valid_actions.len())]
}
