//! Q-learning hyperparameters and reward shaping constants

use serde::{Deserialize, Serialize};

/// Exploration rate used when an agent plays without learning-mode decay
pub const STATIC_EXPLORATION_RATE: f64 = 0.1;

/// How an agent session treats its profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentMode {
    /// Exploration decays every tick and completed episodes count as learning cycles
    Learning,
    /// Fixed exploration rate, profile counters are left untouched
    Static,
}

impl AgentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentMode::Learning => "learning",
            AgentMode::Static => "static",
        }
    }
}

/// Hyperparameters an agent is created with
///
/// These are copied into the agent's profile on creation. After that the
/// profile is the source of truth; `exploration_rate` in particular keeps
/// decaying across sessions.
///
/// # Example
///
/// ```rust
/// use q_snake::rl::HyperParameters;
///
/// let params = HyperParameters {
///     learning_rate: 0.2,
///     ..Default::default()
/// };
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperParameters {
    /// Step size of the Q-value update (alpha)
    ///
    /// Default: 0.1
    pub learning_rate: f64,

    /// Weight of the best next-state value (gamma)
    ///
    /// Default: 0.9
    pub discount_factor: f64,

    /// Initial probability of taking a random action (epsilon)
    ///
    /// Default: 1.0
    pub exploration_rate: f64,

    /// Multiplier applied to epsilon after every learning-mode tick
    ///
    /// Default: 0.995
    pub exploration_decay: f64,

    /// Floor epsilon never decays below
    ///
    /// Default: 0.01
    pub min_exploration_rate: f64,
}

impl Default for HyperParameters {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.9,
            exploration_rate: 1.0,
            exploration_decay: 0.995,
            min_exploration_rate: 0.01,
        }
    }
}

impl HyperParameters {
    /// Validate configuration parameters
    ///
    /// A learning rate of zero is allowed: the table is then frozen.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.learning_rate) {
            return Err(format!(
                "learning_rate must be in [0, 1], got {}",
                self.learning_rate
            ));
        }

        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(format!(
                "discount_factor must be in [0, 1], got {}",
                self.discount_factor
            ));
        }

        if !(0.0..=1.0).contains(&self.exploration_rate) {
            return Err(format!(
                "exploration_rate must be in [0, 1], got {}",
                self.exploration_rate
            ));
        }

        if !(self.exploration_decay > 0.0 && self.exploration_decay <= 1.0) {
            return Err(format!(
                "exploration_decay must be in (0, 1], got {}",
                self.exploration_decay
            ));
        }

        if !(0.0..=1.0).contains(&self.min_exploration_rate) {
            return Err(format!(
                "min_exploration_rate must be in [0, 1], got {}",
                self.min_exploration_rate
            ));
        }

        if self.min_exploration_rate > self.exploration_rate {
            return Err(format!(
                "min_exploration_rate ({}) cannot exceed exploration_rate ({})",
                self.min_exploration_rate, self.exploration_rate
            ));
        }

        Ok(())
    }
}

/// Reward shaping constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Base reward for eating food
    pub food_reward: f64,
    /// Base reward for an ordinary move
    pub step_penalty: f64,
    /// Base reward for a collision
    pub death_penalty: f64,
    /// Added when the head ends strictly closer to the food
    pub closer_bonus: f64,
    /// Added when the head ends strictly farther from the food
    pub farther_penalty: f64,
    /// Added when the current state repeats within the loop window
    pub loop_penalty: f64,
    /// Number of most recent transitions inspected for loops
    pub loop_window: usize,
    /// Added on every step, the terminal one included
    pub survival_bonus: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            food_reward: 10.0,
            step_penalty: -0.1,
            death_penalty: -100.0,
            closer_bonus: 1.0,
            farther_penalty: -1.0,
            loop_penalty: -5.0,
            loop_window: 5,
            survival_bonus: 0.1,
        }
    }
}

impl RewardConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.loop_window < 2 {
            return Err(format!(
                "loop_window must be at least 2 to see a repeat, got {}",
                self.loop_window
            ));
        }

        let values = [
            self.food_reward,
            self.step_penalty,
            self.death_penalty,
            self.closer_bonus,
            self.farther_penalty,
            self.loop_penalty,
            self.survival_bonus,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err("reward values must be finite".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hyperparameters() {
        let params = HyperParameters::default();
        assert_eq!(params.learning_rate, 0.1);
        assert_eq!(params.discount_factor, 0.9);
        assert_eq!(params.exploration_rate, 1.0);
        assert_eq!(params.exploration_decay, 0.995);
        assert_eq!(params.min_exploration_rate, 0.01);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_zero_learning_rate_is_valid() {
        let params = HyperParameters {
            learning_rate: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validation_out_of_range() {
        let mut params = HyperParameters::default();
        params.learning_rate = 1.5;
        assert!(params.validate().is_err());

        let mut params = HyperParameters::default();
        params.discount_factor = -0.1;
        assert!(params.validate().is_err());

        let mut params = HyperParameters::default();
        params.exploration_decay = 0.0;
        assert!(params.validate().is_err());

        let mut params = HyperParameters::default();
        params.exploration_rate = 0.05;
        params.min_exploration_rate = 0.1;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_nan() {
        for field in 0..5 {
            let mut params = HyperParameters::default();
            match field {
                0 => params.learning_rate = f64::NAN,
                1 => params.discount_factor = f64::NAN,
                2 => params.exploration_rate = f64::NAN,
                3 => params.exploration_decay = f64::NAN,
                _ => params.min_exploration_rate = f64::NAN,
            }
            assert!(params.validate().is_err(), "NaN accepted: {params:?}");
        }
    }

    #[test]
    fn test_default_rewards() {
        let rewards = RewardConfig::default();
        assert_eq!(rewards.food_reward, 10.0);
        assert_eq!(rewards.step_penalty, -0.1);
        assert_eq!(rewards.death_penalty, -100.0);
        assert_eq!(rewards.loop_penalty, -5.0);
        assert_eq!(rewards.loop_window, 5);
        assert_eq!(rewards.survival_bonus, 0.1);
        assert!(rewards.validate().is_ok());
    }

    #[test]
    fn test_reward_validation() {
        let rewards = RewardConfig {
            loop_window: 1,
            ..Default::default()
        };
        assert!(rewards.validate().is_err());

        let rewards = RewardConfig {
            food_reward: f64::NAN,
            ..Default::default()
        };
        assert!(rewards.validate().is_err());
    }
}
