//! Headless training mode
//!
//! Runs a stored agent for a fixed number of episodes without a terminal UI.
//! Each episode ends with the agent's bookkeeping (profile, Q-table and
//! leaderboard), and rolling statistics are logged every `log_frequency`
//! episodes.
//!
//! # Example
//!
//! ```rust,no_run
//! use q_snake::metrics::Leaderboard;
//! use q_snake::modes::{TrainConfig, TrainMode};
//! use q_snake::rl::AgentStore;
//!
//! let store = AgentStore::new("agents");
//! let leaderboard = Leaderboard::new("high_scores.json");
//! let config = TrainConfig::new("viper", 500);
//!
//! let mut train_mode = TrainMode::new(config, store, leaderboard)?;
//! train_mode.run();
//! # Ok::<(), q_snake::rl::StoreError>(())
//! ```

use tracing::{debug, info};

use crate::game::GameConfig;
use crate::metrics::leaderboard::today;
use crate::metrics::{Leaderboard, TrainingStats};
use crate::rl::{AgentMode, AgentStore, QAgent, RewardConfig, SnakeEnvironment, StoreError};

/// Configuration for training mode
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub agent_name: String,

    /// Learning updates exploration and counts cycles; static plays at a
    /// fixed exploration rate
    pub mode: AgentMode,

    pub num_episodes: usize,

    /// Log training progress every N episodes
    pub log_frequency: usize,

    /// Cut an episode short after this many moves
    pub max_steps_per_episode: Option<u32>,

    pub game_config: GameConfig,
    pub rewards: RewardConfig,

    /// Seed for food placement and exploration
    pub seed: Option<u64>,
}

impl TrainConfig {
    /// Learning-mode configuration with defaults
    pub fn new(agent_name: impl Into<String>, num_episodes: usize) -> Self {
        Self {
            agent_name: agent_name.into(),
            mode: AgentMode::Learning,
            num_episodes,
            log_frequency: 100,
            max_steps_per_episode: None,
            game_config: GameConfig::default(),
            rewards: RewardConfig::default(),
            seed: None,
        }
    }
}

/// Totals for one finished episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeReport {
    pub reward: f64,
    pub steps: u32,
    pub score: u32,
    /// Name the score was filed under on the leaderboard
    pub entry_name: String,
}

pub struct TrainMode {
    agent: QAgent,
    env: SnakeEnvironment,
    store: AgentStore,
    leaderboard: Leaderboard,
    stats: TrainingStats,
    config: TrainConfig,
}

impl TrainMode {
    /// Load the named agent. Fails with [`StoreError::NotFound`] (or
    /// `Corrupt`) when there is no usable profile.
    pub fn new(
        config: TrainConfig,
        store: AgentStore,
        leaderboard: Leaderboard,
    ) -> Result<Self, StoreError> {
        let agent = QAgent::open(
            &store,
            &config.agent_name,
            config.mode,
            config.rewards.clone(),
            config.seed,
        )?;

        let env = match config.seed {
            Some(seed) => SnakeEnvironment::with_seed(config.game_config.clone(), seed),
            None => SnakeEnvironment::new(config.game_config.clone()),
        };

        // 100-episode rolling window
        let stats = TrainingStats::new(100);

        Ok(Self {
            agent,
            env,
            store,
            leaderboard,
            stats,
            config,
        })
    }

    /// Run every configured episode and return the final statistics
    pub fn run(&mut self) -> &TrainingStats {
        self.log_header();

        for episode in 0..self.config.num_episodes {
            let report = self.run_episode();

            self.stats
                .record_episode(report.reward, report.steps as usize, report.score);
            self.stats.record_agent(
                self.agent.epsilon(),
                self.agent.q_table().len(),
            );

            debug!(
                episode = episode + 1,
                score = report.score,
                steps = report.steps,
                reward = report.reward,
                entry = %report.entry_name,
                "episode finished"
            );

            if (episode + 1) % self.config.log_frequency.max(1) == 0 {
                info!(
                    "[Episode {}/{}] {}",
                    episode + 1,
                    self.config.num_episodes,
                    self.stats.format_summary()
                );
            }
        }

        info!(
            agent = %self.config.agent_name,
            learning_cycles = self.agent.profile().learning_cycles,
            "training session complete: {}",
            self.stats.format_summary()
        );

        &self.stats
    }

    /// Play one episode to the end and file it
    pub fn run_episode(&mut self) -> EpisodeReport {
        self.env.reset();
        self.agent.begin_episode();

        let mut reward = 0.0;
        loop {
            let outcome = self.agent.tick(&mut self.env);
            reward += outcome.reward;

            if outcome.terminated {
                break;
            }
            if let Some(limit) = self.config.max_steps_per_episode {
                if self.env.state().steps >= limit {
                    debug!(limit, "episode hit the step limit");
                    break;
                }
            }
        }

        let state = self.env.state();
        let (score, steps) = (state.score, state.steps);
        let entry_name = self
            .agent
            .finish_episode(&self.store, &self.leaderboard, score, today());

        EpisodeReport {
            reward,
            steps,
            score,
            entry_name,
        }
    }

    pub fn agent(&self) -> &QAgent {
        &self.agent
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    fn log_header(&self) {
        let profile = self.agent.profile();
        info!(
            agent = %profile.name,
            mode = self.config.mode.as_str(),
            episodes = self.config.num_episodes,
            grid = %format!(
                "{}x{}",
                self.config.game_config.grid_width, self.config.game_config.grid_height
            ),
            learning_rate = profile.learning_rate,
            discount_factor = profile.discount_factor,
            exploration_rate = self.agent.epsilon(),
            learning_cycles = profile.learning_cycles,
            "starting training session"
        );
    }
}
