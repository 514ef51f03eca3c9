use super::reward::MoveOutcome;
use super::state_key::{StateKey, encode_state};
use crate::game::{Direction, GameConfig, GameEngine, GameState};

/// Snake environment for the tabular agent
///
/// Wraps the game engine and exposes it the way the agent sees it:
/// - Discrete observations ([`StateKey`])
/// - Three valid actions per tick (no 180-degree turns)
/// - Step outcomes carrying what reward shaping needs
pub struct SnakeEnvironment {
    engine: GameEngine,
    state: GameState,
}

/// Result of one environment step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvStep {
    pub outcome: MoveOutcome,
    pub terminated: bool,
}

impl SnakeEnvironment {
    /// Create a new Snake environment
    pub fn new(config: GameConfig) -> Self {
        Self::from_engine(GameEngine::new(config))
    }

    /// Create an environment with reproducible food placement
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::from_engine(GameEngine::with_seed(config, seed))
    }

    fn from_engine(mut engine: GameEngine) -> Self {
        let state = engine.reset();
        Self { engine, state }
    }

    /// Start a new episode and return its first observation
    pub fn reset(&mut self) -> StateKey {
        self.state = self.engine.reset();
        self.observe()
    }

    pub fn observe(&self) -> StateKey {
        encode_state(&self.state)
    }

    /// Moves the agent may choose from this tick
    pub fn valid_actions(&self) -> [Direction; 3] {
        self.state.heading().valid_moves()
    }

    /// Apply a move. Reversals must already have been filtered out.
    pub fn step(&mut self, action: Direction) -> EnvStep {
        let result = self.engine.step(&mut self.state, action);
        EnvStep {
            outcome: MoveOutcome::from_step(&result, self.state.snake.head()),
            terminated: result.terminated,
        }
    }

    /// Get reference to current game state
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Replace the current game state, e.g. to set up a scenario
    pub fn set_state(&mut self, state: GameState) {
        self.state = state;
    }

    pub fn is_done(&self) -> bool {
        !self.state.is_alive
    }
}
