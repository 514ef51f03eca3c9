use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::config::HyperParameters;
use super::history::Transition;
use super::learner::{QLearner, decayed_exploration};

/// Persisted record of one agent
///
/// Stored as `<name>.json`. `history` holds the transitions of the last
/// finished episode. It is informational only: a missing, null or
/// differently shaped history loads as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: String,
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub exploration_rate: f64,
    pub exploration_decay: f64,
    pub min_exploration_rate: f64,
    /// Completed learning-mode episodes
    pub learning_cycles: u64,
    #[serde(default, deserialize_with = "lenient_history")]
    pub history: Vec<Transition>,
}

fn lenient_history<'de, D>(deserializer: D) -> Result<Vec<Transition>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|err| {
        debug!(error = %err, "discarding unreadable episode history");
        Vec::new()
    }))
}

impl AgentProfile {
    pub fn new(name: impl Into<String>, params: &HyperParameters) -> Self {
        Self {
            name: name.into(),
            learning_rate: params.learning_rate,
            discount_factor: params.discount_factor,
            exploration_rate: params.exploration_rate,
            exploration_decay: params.exploration_decay,
            min_exploration_rate: params.min_exploration_rate,
            learning_cycles: 0,
            history: Vec::new(),
        }
    }

    pub fn learner(&self) -> QLearner {
        QLearner::new(self.learning_rate, self.discount_factor)
    }

    /// Apply one tick of exploration decay
    pub fn decay_exploration(&mut self) {
        self.exploration_rate = decayed_exploration(
            self.exploration_rate,
            self.exploration_decay,
            self.min_exploration_rate,
        );
    }
}
