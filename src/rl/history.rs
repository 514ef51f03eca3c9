use serde::{Deserialize, Serialize};

use super::state_key::StateKey;
use crate::game::Direction;

/// One recorded agent step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: StateKey,
    pub action: Direction,
    pub reward: f64,
    pub next_state: StateKey,
}

/// Transitions of the episode in progress
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeHistory {
    transitions: Vec<Transition>,
}

impl EpisodeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    pub fn clear(&mut self) {
        self.transitions.clear();
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Times `state` was the starting state among the last `window` transitions
    pub fn recent_occurrences(&self, state: &StateKey, window: usize) -> usize {
        let start = self.transitions.len().saturating_sub(window);
        self.transitions[start..]
            .iter()
            .filter(|t| t.state == *state)
            .count()
    }

    /// The agent is looping when `state` already appears more than once in the window
    pub fn is_looping(&self, state: &StateKey, window: usize) -> bool {
        self.recent_occurrences(state, window) > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(heading: Direction) -> StateKey {
        StateKey {
            danger_straight: false,
            danger_left: false,
            danger_right: false,
            heading,
            food_left: false,
            food_right: false,
            food_up: true,
            food_down: false,
        }
    }

    fn push(history: &mut EpisodeHistory, heading: Direction) {
        history.push(Transition {
            state: key(heading),
            action: heading,
            reward: -0.1,
            next_state: key(heading),
        });
    }

    #[test]
    fn test_no_loop_on_first_or_single_occurrence() {
        let mut history = EpisodeHistory::new();
        assert!(!history.is_looping(&key(Direction::Up), 5));

        push(&mut history, Direction::Up);
        push(&mut history, Direction::Left);
        assert!(!history.is_looping(&key(Direction::Up), 5));
    }

    #[test]
    fn test_loop_when_key_seen_twice_in_window() {
        let mut history = EpisodeHistory::new();
        for heading in [
            Direction::Up,
            Direction::Left,
            Direction::Up,
            Direction::Down,
            Direction::Right,
        ] {
            push(&mut history, heading);
        }

        assert_eq!(history.recent_occurrences(&key(Direction::Up), 5), 2);
        assert!(history.is_looping(&key(Direction::Up), 5));
        assert!(!history.is_looping(&key(Direction::Left), 5));
    }

    #[test]
    fn test_old_occurrences_leave_the_window() {
        let mut history = EpisodeHistory::new();
        push(&mut history, Direction::Up);
        push(&mut history, Direction::Up);
        for _ in 0..4 {
            push(&mut history, Direction::Down);
        }

        // Only one of the two Up states is among the last five
        assert_eq!(history.recent_occurrences(&key(Direction::Up), 5), 1);
        assert!(!history.is_looping(&key(Direction::Up), 5));
    }

    #[test]
    fn test_clear() {
        let mut history = EpisodeHistory::new();
        push(&mut history, Direction::Up);
        history.clear();
        assert!(history.is_empty());
    }
}
