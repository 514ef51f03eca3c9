//! Q-learning update rule

use super::q_table::QTable;
use super::state_key::StateKey;
use crate::game::Direction;

/// One-step Q-learning with a fixed learning rate and discount
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QLearner {
    pub learning_rate: f64,
    pub discount_factor: f64,
}

impl QLearner {
    pub fn new(learning_rate: f64, discount_factor: f64) -> Self {
        Self {
            learning_rate,
            discount_factor,
        }
    }

    /// Q(s,a) ← Q(s,a) + α[r + γ max Q(s',·) - Q(s,a)]
    ///
    /// The max over the next state only looks at stored entries and is 0 when
    /// the next state has none. Returns the new value.
    pub fn update(
        &self,
        table: &mut QTable,
        state: StateKey,
        action: Direction,
        reward: f64,
        next_state: &StateKey,
    ) -> f64 {
        let current = table.get(&state, action);
        let max_future = table.max_value(next_state);
        let td_error = reward + self.discount_factor * max_future - current;
        let new_value = current + self.learning_rate * td_error;
        table.set(state, action, new_value);
        new_value
    }
}

/// Exploration after one more learning tick
pub fn decayed_exploration(rate: f64, decay: f64, floor: f64) -> f64 {
    (rate * decay).max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(danger_straight: bool) -> StateKey {
        StateKey {
            danger_straight,
            danger_left: false,
            danger_right: false,
            heading: Direction::Up,
            food_left: true,
            food_right: false,
            food_up: false,
            food_down: false,
        }
    }

    #[test]
    fn test_update_from_empty_table() {
        let mut table = QTable::new();
        let learner = QLearner::new(0.5, 0.9);

        let value = learner.update(&mut table, key(false), Direction::Left, 10.0, &key(true));

        assert!((value - 5.0).abs() < 1e-12);
        assert_eq!(table.get(&key(false), Direction::Left), value);
    }

    #[test]
    fn test_update_uses_best_next_value() {
        let mut table = QTable::new();
        table.set(key(true), Direction::Up, 2.0);
        table.set(key(true), Direction::Left, 4.0);
        table.set(key(false), Direction::Right, 1.0);
        let learner = QLearner::new(0.1, 0.5);

        // 1 + 0.1 * (-1 + 0.5 * 4 - 1) = 1.0
        let value = learner.update(&mut table, key(false), Direction::Right, -1.0, &key(true));
        assert!((value - 1.0).abs() < 1e-12);

        // 1 + 0.1 * (3 + 2 - 1) = 1.4
        let value = learner.update(&mut table, key(false), Direction::Right, 3.0, &key(true));
        assert!((value - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_zero_learning_rate_leaves_value_unchanged() {
        let mut table = QTable::new();
        table.set(key(false), Direction::Up, 7.25);
        table.set(key(true), Direction::Up, 100.0);
        let learner = QLearner::new(0.0, 0.9);

        for reward in [-100.0, -0.1, 0.0, 10.1] {
            learner.update(&mut table, key(false), Direction::Up, reward, &key(true));
            assert_eq!(table.get(&key(false), Direction::Up), 7.25);
        }
    }

    #[test]
    fn test_exploration_decay_respects_floor() {
        assert!((decayed_exploration(1.0, 0.5, 0.01) - 0.5).abs() < 1e-12);
        assert_eq!(decayed_exploration(0.011, 0.5, 0.01), 0.01);

        let mut rate = 1.0;
        for _ in 0..10_000 {
            rate = decayed_exploration(rate, 0.995, 0.01);
        }
        assert_eq!(rate, 0.01);
    }
}
