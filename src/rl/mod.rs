//! Tabular Q-learning for the Snake game
//!
//! Provides:
//! - Compact danger/heading/food state keys
//! - A sparse Q-table with bincode persistence
//! - Epsilon-greedy action selection and the Q-learning update
//! - Reward shaping (food, death, distance, loop detection)
//! - Named agents stored on disk between sessions

pub mod agent;
pub mod config;
pub mod environment;
pub mod history;
pub mod learner;
pub mod persistence;
pub mod policy;
pub mod profile;
pub mod q_table;
pub mod reward;
pub mod state_key;

pub use agent::{QAgent, TickOutcome};
pub use config::{AgentMode, HyperParameters, RewardConfig, STATIC_EXPLORATION_RATE};
pub use environment::{EnvStep, SnakeEnvironment};
pub use history::{EpisodeHistory, Transition};
pub use learner::QLearner;
pub use persistence::{AgentStore, StoreError};
pub use profile::AgentProfile;
pub use q_table::QTable;
pub use reward::{MoveOutcome, shape_reward};
pub use state_key::{StateKey, encode_state};
