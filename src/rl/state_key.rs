use serde::{Deserialize, Serialize};

use crate::game::{Direction, GameEngine, GameState};

/// Discrete state the agent learns over
///
/// Flags are relative to the head, so every board where the snake sees the
/// same danger and food layout shares one key regardless of where on the grid
/// it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey {
    /// Moving on in the current heading ends the game
    pub danger_straight: bool,
    /// Turning left ends the game
    pub danger_left: bool,
    /// Turning right ends the game
    pub danger_right: bool,
    /// Current heading
    pub heading: Direction,
    pub food_left: bool,
    pub food_right: bool,
    pub food_up: bool,
    pub food_down: bool,
}

/// Encode the current game state into a lookup key
pub fn encode_state(state: &GameState) -> StateKey {
    let heading = state.heading();
    let head = state.snake.head();
    let food = state.food;

    StateKey {
        danger_straight: GameEngine::would_collide(state, heading),
        danger_left: GameEngine::would_collide(state, heading.turn_left()),
        danger_right: GameEngine::would_collide(state, heading.turn_right()),
        heading,
        food_left: food.x < head.x,
        food_right: food.x > head.x,
        food_up: food.y < head.y,
        food_down: food.y > head.y,
    }
}
