//! Reward shaping applied before every Q-value update

use std::cmp::Ordering;

use super::config::RewardConfig;
use crate::game::{Position, StepResult};

/// What happened on one move, as far as the reward is concerned
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    pub ate_food: bool,
    pub collided: bool,
    pub head_before: Position,
    pub head_after: Position,
    /// Food the snake was heading for before the move
    pub food: Position,
}

impl MoveOutcome {
    pub fn from_step(result: &StepResult, head_after: Position) -> Self {
        Self {
            ate_food: result.info.ate_food,
            collided: result.collided(),
            head_before: result.info.previous_head,
            head_after,
            food: result.info.previous_food,
        }
    }
}

/// Base reward for the move: collision beats food beats an ordinary move
pub fn base_reward(config: &RewardConfig, outcome: &MoveOutcome) -> f64 {
    if outcome.collided {
        config.death_penalty
    } else if outcome.ate_food {
        config.food_reward
    } else {
        config.step_penalty
    }
}

/// +closer/-farther depending on how the head's distance to the food changed.
///
/// Not applied when the food was eaten: the target is gone and the freshly
/// spawned food says nothing about the move.
pub fn distance_shaping(config: &RewardConfig, outcome: &MoveOutcome) -> f64 {
    if outcome.ate_food {
        return 0.0;
    }

    let before = outcome.head_before.distance_squared(outcome.food);
    let after = outcome.head_after.distance_squared(outcome.food);

    match after.cmp(&before) {
        Ordering::Less => config.closer_bonus,
        Ordering::Greater => config.farther_penalty,
        Ordering::Equal => 0.0,
    }
}

/// Full shaped reward: base, distance, loop penalty, then the survival bonus
pub fn shape_reward(config: &RewardConfig, outcome: &MoveOutcome, looping: bool) -> f64 {
    let mut reward = base_reward(config, outcome);
    reward += distance_shaping(config, outcome);

    if looping {
        reward += config.loop_penalty;
    }

    // Also paid on the terminal step
    reward + config.survival_bonus
}
