//! Tabular Q-learning agent
//!
//! [`QAgent`] owns everything one agent session mutates: the profile, the
//! Q-table and the current episode's history. Policy and learner only borrow
//! the table for the duration of a call.

use chrono::NaiveDate;
use rand::{SeedableRng, rngs::StdRng};
use tracing::{error, info};

use super::config::{AgentMode, RewardConfig, STATIC_EXPLORATION_RATE};
use super::environment::SnakeEnvironment;
use super::history::{EpisodeHistory, Transition};
use super::learner::QLearner;
use super::persistence::{AgentStore, StoreError};
use super::policy::choose_action;
use super::profile::AgentProfile;
use super::q_table::QTable;
use super::reward::shape_reward;
use super::state_key::StateKey;
use crate::game::Direction;
use crate::metrics::leaderboard::{Leaderboard, agent_entry_name};

/// What one agent tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    pub action: Direction,
    pub reward: f64,
    pub ate_food: bool,
    pub terminated: bool,
}

pub struct QAgent {
    profile: AgentProfile,
    q_table: QTable,
    learner: QLearner,
    rewards: RewardConfig,
    mode: AgentMode,
    history: EpisodeHistory,
    rng: StdRng,
}

impl QAgent {
    pub fn new(profile: AgentProfile, q_table: QTable, mode: AgentMode, rewards: RewardConfig) -> Self {
        Self::with_rng(profile, q_table, mode, rewards, StdRng::from_entropy())
    }

    /// Agent whose exploration draws are reproducible
    pub fn with_seed(
        profile: AgentProfile,
        q_table: QTable,
        mode: AgentMode,
        rewards: RewardConfig,
        seed: u64,
    ) -> Self {
        Self::with_rng(profile, q_table, mode, rewards, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        profile: AgentProfile,
        q_table: QTable,
        mode: AgentMode,
        rewards: RewardConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            learner: profile.learner(),
            profile,
            q_table,
            rewards,
            mode,
            history: EpisodeHistory::new(),
            rng,
        }
    }

    /// Load an agent by name. Fails only when the profile is missing or
    /// unreadable; a missing Q-table starts empty.
    pub fn open(
        store: &AgentStore,
        name: &str,
        mode: AgentMode,
        rewards: RewardConfig,
        seed: Option<u64>,
    ) -> Result<Self, StoreError> {
        let profile = store.load_profile(name)?;
        let q_table = store.load_q_table(name);

        info!(
            agent = name,
            mode = mode.as_str(),
            learning_cycles = profile.learning_cycles,
            exploration_rate = profile.exploration_rate,
            states = q_table.len(),
            "loaded agent"
        );

        Ok(match seed {
            Some(seed) => Self::with_seed(profile, q_table, mode, rewards, seed),
            None => Self::new(profile, q_table, mode, rewards),
        })
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn mode(&self) -> AgentMode {
        self.mode
    }

    pub fn history(&self) -> &EpisodeHistory {
        &self.history
    }

    /// Exploration rate the policy uses right now
    pub fn epsilon(&self) -> f64 {
        match self.mode {
            AgentMode::Learning => self.profile.exploration_rate,
            AgentMode::Static => STATIC_EXPLORATION_RATE,
        }
    }

    /// Forget the previous episode's transitions
    pub fn begin_episode(&mut self) {
        self.history.clear();
    }

    pub fn select_action(&mut self, state: &StateKey, valid_actions: &[Direction; 3]) -> Direction {
        let epsilon = self.epsilon();
        choose_action(&self.q_table, state, valid_actions, epsilon, &mut self.rng)
    }

    /// Play and learn from one move
    ///
    /// The table is updated in both modes; exploration only decays while
    /// learning.
    pub fn tick(&mut self, env: &mut SnakeEnvironment) -> TickOutcome {
        let state = env.observe();
        let valid_actions = env.valid_actions();
        let action = self.select_action(&state, &valid_actions);

        let step = env.step(action);

        let looping = self.history.is_looping(&state, self.rewards.loop_window);
        let reward = shape_reward(&self.rewards, &step.outcome, looping);
        let next_state = env.observe();

        self.learner
            .update(&mut self.q_table, state, action, reward, &next_state);
        self.history.push(Transition {
            state,
            action,
            reward,
            next_state,
        });

        if self.mode == AgentMode::Learning {
            self.profile.decay_exploration();
        }

        TickOutcome {
            action,
            reward,
            ate_food: step.outcome.ate_food,
            terminated: step.terminated,
        }
    }

    /// Episode bookkeeping after the terminal tick
    ///
    /// Learning mode counts the cycle and saves the profile. The Q-table is
    /// always saved, then the score goes on the leaderboard. Storage failures
    /// are logged; the in-memory agent stays usable. Returns the leaderboard
    /// name the score was filed under.
    pub fn finish_episode(
        &mut self,
        store: &AgentStore,
        leaderboard: &Leaderboard,
        score: u32,
        date: NaiveDate,
    ) -> String {
        if self.mode == AgentMode::Learning {
            self.profile.learning_cycles += 1;
            self.profile.history = self.history.transitions().to_vec();
            if let Err(err) = store.save_profile(&self.profile) {
                error!(agent = %self.profile.name, error = %err, "failed to save agent profile");
            }
        }

        if let Err(err) = store.save_q_table(&self.profile.name, &self.q_table) {
            error!(agent = %self.profile.name, error = %err, "failed to save Q-table");
        }

        let entry_name = agent_entry_name(&self.profile.name, self.profile.learning_cycles, date);
        if let Err(err) = leaderboard.submit(score, entry_name.clone()) {
            error!(entry = %entry_name, error = ?err, "failed to record high score");
        }

        entry_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameConfig, GameState, Position, Snake};
    use crate::rl::config::HyperParameters;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn agent(mode: AgentMode, params: HyperParameters) -> QAgent {
        QAgent::with_seed(
            AgentProfile::new("tester", &params),
            QTable::new(),
            mode,
            RewardConfig::default(),
            99,
        )
    }

    fn scenario(head: Position, heading: Direction, food: Position) -> SnakeEnvironment {
        let mut env = SnakeEnvironment::with_seed(GameConfig::default(), 5);
        env.set_state(GameState::new(Snake::new(head, heading, 3), food, 64, 48));
        env
    }

    #[test]
    fn test_static_mode_uses_fixed_epsilon() {
        let params = HyperParameters {
            exploration_rate: 0.9,
            ..Default::default()
        };
        assert_eq!(agent(AgentMode::Static, params.clone()).epsilon(), 0.1);
        assert_eq!(agent(AgentMode::Learning, params).epsilon(), 0.9);
    }

    #[test]
    fn test_eating_food_scenario() {
        // Greedy agent that already prefers RIGHT in this state
        let mut env = scenario(Position::new(10, 5), Direction::Right, Position::new(11, 5));
        let mut agent = agent(
            AgentMode::Learning,
            HyperParameters {
                exploration_rate: 0.0,
                min_exploration_rate: 0.0,
                ..Default::default()
            },
        );
        agent.q_table.set(env.observe(), Direction::Right, 1.0);

        let outcome = agent.tick(&mut env);

        assert_eq!(outcome.action, Direction::Right);
        assert!(outcome.ate_food);
        assert!(!outcome.terminated);
        assert!((outcome.reward - 10.1).abs() < 1e-9);
        assert_eq!(env.state().snake.len(), 4);
        assert_eq!(env.state().score, 1);
    }

    #[test]
    fn test_wall_collision_scenario() {
        // At the left wall heading left, with LEFT valued highest
        let mut env = scenario(Position::new(0, 5), Direction::Left, Position::new(5, 5));
        let mut agent = agent(
            AgentMode::Learning,
            HyperParameters {
                exploration_rate: 0.0,
                min_exploration_rate: 0.0,
                ..Default::default()
            },
        );
        let state = env.observe();
        agent.q_table.set(state, Direction::Up, -50.0);
        agent.q_table.set(state, Direction::Down, -50.0);
        agent.q_table.set(state, Direction::Left, 1.0);

        let outcome = agent.tick(&mut env);

        assert_eq!(outcome.action, Direction::Left);
        assert!(outcome.terminated);
        assert_eq!(env.state().snake.head(), Position::new(-1, 5));
        // Death, moved away from food, survival bonus
        assert!((outcome.reward - (-100.0 - 1.0 + 0.1)).abs() < 1e-9);
        // 1.0 + 0.1 * (-100.9 + 0.9 * 0 - 1.0)
        let updated = agent.q_table().get(&state, Direction::Left);
        assert!((updated - (1.0 + 0.1 * (-101.9))).abs() < 1e-9);
    }

    #[test]
    fn test_loop_penalty_applies_to_revisited_state() {
        let mut env = SnakeEnvironment::with_seed(GameConfig::default(), 6);
        let mut agent = agent(AgentMode::Static, HyperParameters::default());
        let state = env.observe();
        for _ in 0..2 {
            agent.history.push(Transition {
                state,
                action: Direction::Right,
                reward: 0.0,
                next_state: state,
            });
        }

        let outcome = agent.tick(&mut env);
        let without_loop = {
            let mut fresh = SnakeEnvironment::with_seed(GameConfig::default(), 6);
            let step = fresh.step(outcome.action);
            shape_reward(&RewardConfig::default(), &step.outcome, false)
        };

        assert!((outcome.reward - (without_loop - 5.0)).abs() < 1e-9);
    }

    #[test]
    fn test_tick_records_history_and_decays() {
        let mut env = SnakeEnvironment::with_seed(GameConfig::default(), 8);
        let mut agent = agent(AgentMode::Learning, HyperParameters::default());
        agent.begin_episode();

        let before = agent.profile().exploration_rate;
        let outcome = agent.tick(&mut env);

        assert_eq!(agent.history().len(), 1);
        assert_eq!(agent.history().transitions()[0].action, outcome.action);
        assert_eq!(agent.history().transitions()[0].reward, outcome.reward);
        assert!(agent.profile().exploration_rate < before);
        assert!(!agent.q_table().is_empty());
    }

    #[test]
    fn test_static_mode_updates_table_without_decay() {
        let mut env = SnakeEnvironment::with_seed(GameConfig::default(), 8);
        let mut agent = agent(AgentMode::Static, HyperParameters::default());

        agent.tick(&mut env);

        assert_eq!(agent.profile().exploration_rate, 1.0);
        assert_eq!(agent.q_table().len(), 1);
    }

    #[test]
    fn test_finish_episode_learning_persists_everything() {
        let temp_dir = TempDir::new().unwrap();
        let store = AgentStore::new(temp_dir.path().join("agents"));
        let board = Leaderboard::new(temp_dir.path().join("high_scores.json"));
        store.create_agent("tester", &HyperParameters::default()).unwrap();

        let mut agent = QAgent::open(
            &store,
            "tester",
            AgentMode::Learning,
            RewardConfig::default(),
            Some(1),
        )
        .unwrap();
        let mut env = SnakeEnvironment::with_seed(GameConfig::default(), 1);
        agent.begin_episode();
        while !agent.tick(&mut env).terminated {}

        let name = agent.finish_episode(&store, &board, 3, date());

        assert_eq!(name, "tester-1-20240102");
        let saved = store.load_profile("tester").unwrap();
        assert_eq!(saved.learning_cycles, 1);
        assert_eq!(saved.history.len(), agent.history().len());
        assert!((saved.exploration_rate - agent.profile().exploration_rate).abs() < 1e-12);
        assert_eq!(&store.load_q_table("tester"), agent.q_table());
        assert_eq!(board.read()[0].name, "tester-1-20240102");
        assert_eq!(board.read()[0].score, 3);
    }

    #[test]
    fn test_finish_episode_static_leaves_profile_alone() {
        let temp_dir = TempDir::new().unwrap();
        let store = AgentStore::new(temp_dir.path());
        let board = Leaderboard::new(temp_dir.path().join("high_scores.json"));
        store.create_agent("tester", &HyperParameters::default()).unwrap();

        let mut agent =
            QAgent::open(&store, "tester", AgentMode::Static, RewardConfig::default(), Some(2))
                .unwrap();
        let mut env = SnakeEnvironment::with_seed(GameConfig::default(), 2);
        agent.tick(&mut env);

        let name = agent.finish_episode(&store, &board, 0, date());

        assert_eq!(name, "tester-0-20240102");
        assert_eq!(store.load_profile("tester").unwrap().learning_cycles, 0);
        assert!(!store.load_q_table("tester").is_empty());
    }

    #[test]
    fn test_open_missing_agent_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = AgentStore::new(temp_dir.path());

        let result = QAgent::open(&store, "nobody", AgentMode::Learning, RewardConfig::default(), None);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_save_failure_is_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the agents directory should be
        let blocker = temp_dir.path().join("agents");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = AgentStore::new(&blocker);
        let board = Leaderboard::new(temp_dir.path().join("high_scores.json"));

        let mut agent = agent(AgentMode::Learning, HyperParameters::default());
        let mut env = SnakeEnvironment::with_seed(GameConfig::default(), 3);
        agent.tick(&mut env);

        let name = agent.finish_episode(&store, &board, 1, date());

        assert_eq!(name, "tester-1-20240102");
        assert_eq!(agent.profile().learning_cycles, 1);
        // Agent keeps working after the failed save
        agent.begin_episode();
        let mut env = SnakeEnvironment::with_seed(GameConfig::default(), 4);
        agent.tick(&mut env);
        assert_eq!(agent.history().len(), 1);
    }
}
