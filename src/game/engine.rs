use super::{
    action::Direction,
    config::GameConfig,
    state::{CollisionType, GameState, Position, Snake},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Information about a step
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    /// Whether the snake ate food this step
    pub ate_food: bool,
    /// Type of collision if one occurred
    pub collision_type: Option<CollisionType>,
    /// Head position before the move
    pub previous_head: Position,
    /// Food the snake was heading for when the move started
    pub previous_food: Position,
}

/// Result of a game step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Whether the game has terminated
    pub terminated: bool,
    /// Additional information about the step
    pub info: StepInfo,
}

impl StepResult {
    pub fn collided(&self) -> bool {
        self.info.collision_type.is_some()
    }
}

/// The game engine that handles all game logic
pub struct GameEngine {
    config: GameConfig,
    rng: StdRng,
}

impl GameEngine {
    /// Create a new game engine with the given configuration
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create an engine whose food placement is reproducible
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Reset the game to initial state
    pub fn reset(&mut self) -> GameState {
        let snake = Snake::new(
            self.config.start,
            Direction::Right,
            self.config.initial_snake_length,
        );

        let food = self.spawn_food();

        GameState::new(snake, food, self.config.grid_width, self.config.grid_height)
    }

    /// Execute one step of the game.
    ///
    /// The direction is applied as given; refusing a 180-degree turn is the
    /// caller's job.
    pub fn step(&mut self, state: &mut GameState, direction: Direction) -> StepResult {
        let previous_head = state.snake.head();
        let previous_food = state.food;

        if !state.is_alive {
            return StepResult {
                terminated: true,
                info: StepInfo {
                    ate_food: false,
                    collision_type: None,
                    previous_head,
                    previous_food,
                },
            };
        }

        let new_head = previous_head.moved_in_direction(direction);
        let ate_food = new_head == state.food;
        let collision_type = Self::check_collision(state, new_head, ate_food);

        state.snake.advance(direction, ate_food);
        state.steps += 1;

        if ate_food {
            state.score += 1;
            state.food = self.spawn_food();
        }

        if collision_type.is_some() {
            state.is_alive = false;
        }

        StepResult {
            terminated: collision_type.is_some(),
            info: StepInfo {
                ate_food,
                collision_type,
                previous_head,
                previous_food,
            },
        }
    }

    /// One-step lookahead: would moving in `direction` end the game?
    pub fn would_collide(state: &GameState, direction: Direction) -> bool {
        let new_head = state.snake.head().moved_in_direction(direction);
        let grows = new_head == state.food;
        Self::check_collision(state, new_head, grows).is_some()
    }

    /// Check if the new head position causes a collision
    fn check_collision(state: &GameState, pos: Position, grows: bool) -> Option<CollisionType> {
        if !state.is_in_bounds(pos) {
            return Some(CollisionType::Wall);
        }

        if state.snake.would_hit_body(pos, grows) {
            return Some(CollisionType::SelfCollision);
        }

        None
    }

    /// Spawn food on a random cell, never on row or column 0.
    ///
    /// The snake's body is not avoided, so food can land underneath it.
    fn spawn_food(&mut self) -> Position {
        let x = self.rng.gen_range(1..self.config.grid_width) as i32;
        let y = self.rng.gen_range(1..self.config.grid_height) as i32;
        Position::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(snake: Snake, food: Position) -> GameState {
        GameState::new(snake, food, 64, 48)
    }

    #[test]
    fn test_reset() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 7);
        let state = engine.reset();

        assert!(state.is_alive);
        assert_eq!(state.score, 0);
        assert_eq!(state.steps, 0);
        assert_eq!(
            state.snake.body,
            vec![Position::new(10, 5), Position::new(9, 5), Position::new(8, 5)]
        );
        assert_eq!(state.snake.direction, Direction::Right);
    }

    #[test]
    fn test_food_never_spawns_on_origin_row_or_column() {
        let mut engine = GameEngine::with_seed(GameConfig::new(12, 10), 42);
        for _ in 0..500 {
            let state = engine.reset();
            assert!(state.food.x >= 1 && state.food.x < 12);
            assert!(state.food.y >= 1 && state.food.y < 10);
        }
    }

    #[test]
    fn test_basic_movement() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 1);
        let mut state = state_with(
            Snake::new(Position::new(10, 5), Direction::Right, 3),
            Position::new(30, 30),
        );

        let result = engine.step(&mut state, Direction::Down);

        assert!(!result.terminated);
        assert!(!result.info.ate_food);
        assert_eq!(result.info.previous_head, Position::new(10, 5));
        assert_eq!(state.steps, 1);
        assert_eq!(state.snake.head(), Position::new(10, 6));
        assert_eq!(state.snake.len(), 3);
        assert_eq!(state.snake.direction, Direction::Down);
    }

    #[test]
    fn test_food_consumption() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 3);
        let mut state = state_with(
            Snake::new(Position::new(10, 5), Direction::Right, 3),
            Position::new(11, 5),
        );

        let result = engine.step(&mut state, Direction::Right);

        assert!(result.info.ate_food);
        assert!(!result.terminated);
        assert_eq!(result.info.previous_food, Position::new(11, 5));
        assert_eq!(state.score, 1);
        assert_eq!(
            state.snake.body,
            vec![
                Position::new(11, 5),
                Position::new(10, 5),
                Position::new(9, 5),
                Position::new(8, 5)
            ]
        );
    }

    #[test]
    fn test_wall_collision() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 5);
        let mut state = state_with(
            Snake::new(Position::new(0, 5), Direction::Left, 3),
            Position::new(5, 5),
        );
        // Snake::new lays the body out behind a left-moving head
        assert_eq!(state.snake.body[1], Position::new(1, 5));

        let result = engine.step(&mut state, Direction::Left);

        assert!(result.terminated);
        assert!(!state.is_alive);
        assert_eq!(result.info.collision_type, Some(CollisionType::Wall));
        assert_eq!(state.snake.head(), Position::new(-1, 5));
    }

    #[test]
    fn test_self_collision() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 9);
        let snake = Snake::new(Position::new(5, 5), Direction::Right, 5);
        let mut state = state_with(snake, Position::new(30, 30));

        engine.step(&mut state, Direction::Down);
        engine.step(&mut state, Direction::Left);
        let result = engine.step(&mut state, Direction::Up);

        assert!(result.terminated);
        assert_eq!(
            result.info.collision_type,
            Some(CollisionType::SelfCollision)
        );
    }

    #[test]
    fn test_moving_into_vacated_tail_is_safe() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 11);
        let snake = Snake::from_cells(
            vec![
                Position::new(5, 5),
                Position::new(6, 5),
                Position::new(6, 6),
                Position::new(5, 6),
            ],
            Direction::Left,
        );
        let mut state = state_with(snake, Position::new(30, 30));

        assert!(!GameEngine::would_collide(&state, Direction::Down));
        let result = engine.step(&mut state, Direction::Down);
        assert!(!result.terminated);
        assert_eq!(state.snake.head(), Position::new(5, 6));
    }

    #[test]
    fn test_reversal_is_not_filtered_by_engine() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 13);
        let mut state = state_with(
            Snake::new(Position::new(10, 5), Direction::Right, 3),
            Position::new(30, 30),
        );

        let result = engine.step(&mut state, Direction::Left);

        assert!(result.terminated);
        assert_eq!(
            result.info.collision_type,
            Some(CollisionType::SelfCollision)
        );
    }

    #[test]
    fn test_would_collide_does_not_mutate() {
        let state = state_with(
            Snake::new(Position::new(0, 5), Direction::Left, 3),
            Position::new(5, 5),
        );
        let before = state.clone();

        assert!(GameEngine::would_collide(&state, Direction::Left));
        assert!(!GameEngine::would_collide(&state, Direction::Up));
        assert_eq!(state, before);
    }

    #[test]
    fn test_food_may_spawn_under_snake() {
        // Known limitation: food placement ignores the body. On a grid where
        // the only spawnable cell is covered by the snake, food still lands there.
        let config = GameConfig {
            grid_width: 2,
            grid_height: 2,
            initial_snake_length: 1,
            start: Position::new(1, 1),
        };
        let mut engine = GameEngine::with_seed(config, 17);
        let state = engine.reset();

        assert_eq!(state.food, Position::new(1, 1));
        assert!(state.is_occupied_by_snake(state.food));
    }

    #[test]
    fn test_terminated_game_no_update() {
        let mut engine = GameEngine::with_seed(GameConfig::default(), 19);
        let mut state = engine.reset();
        state.is_alive = false;
        let steps_before = state.steps;

        let result = engine.step(&mut state, Direction::Right);

        assert!(result.terminated);
        assert_eq!(state.steps, steps_before);
    }
}
