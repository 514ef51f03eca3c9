//! Q Snake - the Snake game with a tabular Q-learning agent
//!
//! This library provides:
//! - Core game logic on a cell grid (game module)
//! - Q-learning agents with on-disk profiles and Q-tables (rl module)
//! - Training statistics and the shared high score list (metrics module)
//! - TUI rendering and keyboard input (render, input modules)
//! - Execution modes: human play, headless training, watching an agent (modes module)

pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod render;
pub mod rl;
