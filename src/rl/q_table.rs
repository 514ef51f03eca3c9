//! Tabular action-value store

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::state_key::StateKey;
use crate::game::Direction;

/// Q-values per state, per action
///
/// Any (state, action) pair that has never been written reads as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    values: HashMap<StateKey, HashMap<Direction, f64>>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Q-value for a state-action pair
    pub fn get(&self, state: &StateKey, action: Direction) -> f64 {
        self.values
            .get(state)
            .and_then(|actions| actions.get(&action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Stored values for a state, if the state has ever been updated
    pub fn actions(&self, state: &StateKey) -> Option<&HashMap<Direction, f64>> {
        self.values.get(state).filter(|actions| !actions.is_empty())
    }

    pub fn set(&mut self, state: StateKey, action: Direction, value: f64) {
        self.values.entry(state).or_default().insert(action, value);
    }

    /// Largest stored value for a state, or 0 when nothing is stored.
    ///
    /// Only stored entries count, so a state whose every recorded action is
    /// negative yields a negative maximum.
    pub fn max_value(&self, state: &StateKey) -> f64 {
        self.actions(state)
            .and_then(|actions| actions.values().copied().reduce(f64::max))
            .unwrap_or(0.0)
    }

    /// Number of distinct states seen
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of stored (state, action) values
    pub fn entry_count(&self) -> usize {
        self.values.values().map(HashMap::len).sum()
    }

    /// Serialize the whole table to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Restore a table from bytes written by [`QTable::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(heading: Direction) -> StateKey {
        StateKey {
            danger_straight: false,
            danger_left: true,
            danger_right: false,
            heading,
            food_left: false,
            food_right: true,
            food_up: true,
            food_down: false,
        }
    }

    #[test]
    fn test_missing_values_default_to_zero() {
        let table = QTable::new();
        assert_eq!(table.get(&key(Direction::Up), Direction::Left), 0.0);
        assert_eq!(table.max_value(&key(Direction::Up)), 0.0);
        assert!(table.actions(&key(Direction::Up)).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_set_get() {
        let mut table = QTable::new();
        table.set(key(Direction::Up), Direction::Left, 1.5);
        table.set(key(Direction::Up), Direction::Right, -2.0);

        assert_eq!(table.get(&key(Direction::Up), Direction::Left), 1.5);
        assert_eq!(table.get(&key(Direction::Up), Direction::Right), -2.0);
        assert_eq!(table.get(&key(Direction::Down), Direction::Left), 0.0);
        assert_eq!(table.len(), 1);
        assert_eq!(table.entry_count(), 2);
    }

    #[test]
    fn test_max_value_of_negative_entries() {
        let mut table = QTable::new();
        table.set(key(Direction::Left), Direction::Up, -3.0);
        table.set(key(Direction::Left), Direction::Down, -1.0);

        assert_eq!(table.max_value(&key(Direction::Left)), -1.0);
    }

    #[test]
    fn test_bytes_preserve_exact_values() {
        let mut table = QTable::new();
        table.set(key(Direction::Up), Direction::Up, 0.1 + 0.2);
        table.set(key(Direction::Right), Direction::Down, -100.900_000_000_000_01);

        let bytes = table.to_bytes().unwrap();
        let restored = QTable::from_bytes(&bytes).unwrap();

        assert_eq!(restored, table);
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        assert!(QTable::from_bytes(&[0xff, 0x01, 0x02]).is_err());
    }
}
