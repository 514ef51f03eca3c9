use serde::{Deserialize, Serialize};

use super::state::Position;

/// Configuration for the game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Width of the game grid in cells
    pub grid_width: usize,
    /// Height of the game grid in cells
    pub grid_height: usize,
    /// Initial length of the snake
    pub initial_snake_length: usize,
    /// Cell the snake's head starts on each episode
    pub start: Position,
}

impl Default for GameConfig {
    fn default() -> Self {
        // 640x480 playfield at 10 units per cell
        Self {
            grid_width: 64,
            grid_height: 48,
            initial_snake_length: 3,
            start: Position::new(10, 5),
        }
    }
}

impl GameConfig {
    /// Create a new configuration with custom grid size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid_width: width,
            grid_height: height,
            ..Default::default()
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(20, 15)
    }

    /// Check that the starting snake fits on the grid and food has room to spawn
    pub fn validate(&self) -> Result<(), String> {
        if self.grid_width < 2 || self.grid_height < 2 {
            return Err(format!(
                "grid must be at least 2x2, got {}x{}",
                self.grid_width, self.grid_height
            ));
        }

        if self.initial_snake_length == 0 {
            return Err("initial_snake_length must be at least 1".to_string());
        }

        let tail_x = self.start.x - (self.initial_snake_length as i32 - 1);
        if tail_x < 0
            || self.start.x >= self.grid_width as i32
            || self.start.y < 0
            || self.start.y >= self.grid_height as i32
        {
            return Err(format!(
                "starting snake at ({}, {}) with length {} does not fit a {}x{} grid",
                self.start.x,
                self.start.y,
                self.initial_snake_length,
                self.grid_width,
                self.grid_height
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.grid_width, 64);
        assert_eq!(config.grid_height, 48);
        assert_eq!(config.initial_snake_length, 3);
        assert_eq!(config.start, Position::new(10, 5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_config() {
        let config = GameConfig::new(15, 15);
        assert_eq!(config.grid_width, 15);
        assert_eq!(config.grid_height, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_start_outside_grid_is_rejected() {
        let config = GameConfig::new(8, 8);
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.initial_snake_length = 12;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_degenerate_grid_is_rejected() {
        let mut config = GameConfig::new(1, 10);
        config.start = Position::new(0, 0);
        config.initial_snake_length = 1;
        assert!(config.validate().is_err());
    }
}
