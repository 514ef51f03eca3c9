//! Training statistics tracking for the Q-learning agent
//!
//! Rolling windows over episode reward, length and score, plus the agent's
//! current exploration rate and Q-table size.

use std::collections::VecDeque;

/// Training statistics tracker with rolling averages
///
/// # Example
///
/// ```rust
/// use q_snake::metrics::TrainingStats;
///
/// let mut stats = TrainingStats::new(100);
///
/// stats.record_episode(15.5, 150, 5);
/// stats.record_agent(0.42, 87);
///
/// println!("Mean reward: {}", stats.mean_episode_reward());
/// println!("{}", stats.format_summary());
/// ```
#[derive(Debug, Clone)]
pub struct TrainingStats {
    /// Episode rewards (rolling window)
    episode_rewards: VecDeque<f64>,

    /// Episode lengths in steps (rolling window)
    episode_lengths: VecDeque<usize>,

    /// Episode scores (rolling window)
    episode_scores: VecDeque<u32>,

    exploration_rate: f64,
    q_table_states: usize,

    total_episodes: usize,
    total_steps: usize,
    best_score: u32,

    window_size: usize,
}

impl TrainingStats {
    /// Create a tracker averaging over the last `window_size` episodes
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            episode_rewards: VecDeque::with_capacity(window_size),
            episode_lengths: VecDeque::with_capacity(window_size),
            episode_scores: VecDeque::with_capacity(window_size),
            exploration_rate: 0.0,
            q_table_states: 0,
            total_episodes: 0,
            total_steps: 0,
            best_score: 0,
            window_size,
        }
    }

    /// Record the completion of an episode
    ///
    /// # Example
    ///
    /// ```rust
    /// use q_snake::metrics::TrainingStats;
    ///
    /// let mut stats = TrainingStats::new(100);
    /// stats.record_episode(15.5, 150, 5);
    ///
    /// assert_eq!(stats.total_episodes(), 1);
    /// assert_eq!(stats.total_steps(), 150);
    /// ```
    pub fn record_episode(&mut self, reward: f64, length: usize, score: u32) {
        Self::push_deque(&mut self.episode_rewards, reward, self.window_size);
        Self::push_deque(&mut self.episode_lengths, length, self.window_size);
        Self::push_deque(&mut self.episode_scores, score, self.window_size);
        self.total_episodes += 1;
        self.total_steps += length;
        self.best_score = self.best_score.max(score);
    }

    /// Snapshot of the agent after an episode
    pub fn record_agent(&mut self, exploration_rate: f64, q_table_states: usize) {
        self.exploration_rate = exploration_rate;
        self.q_table_states = q_table_states;
    }

    /// Mean reward over the window, 0.0 before the first episode
    pub fn mean_episode_reward(&self) -> f64 {
        if self.episode_rewards.is_empty() {
            0.0
        } else {
            self.episode_rewards.iter().sum::<f64>() / self.episode_rewards.len() as f64
        }
    }

    pub fn mean_episode_length(&self) -> f64 {
        let sum: usize = self.episode_lengths.iter().sum();
        if self.episode_lengths.is_empty() {
            0.0
        } else {
            sum as f64 / self.episode_lengths.len() as f64
        }
    }

    pub fn mean_episode_score(&self) -> f64 {
        let sum: u32 = self.episode_scores.iter().sum();
        if self.episode_scores.is_empty() {
            0.0
        } else {
            sum as f64 / self.episode_scores.len() as f64
        }
    }

    pub fn exploration_rate(&self) -> f64 {
        self.exploration_rate
    }

    pub fn q_table_states(&self) -> usize {
        self.q_table_states
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// One-line summary of the current statistics
    ///
    /// `Episodes: 1 | Steps: 150 | Reward: 15.50 | Score: 5.00 | Best: 5 | Len: 150.0 | Epsilon: 0.4200 | States: 87`
    pub fn format_summary(&self) -> String {
        format!(
            "Episodes: {} | Steps: {} | Reward: {:.2} | Score: {:.2} | Best: {} | Len: {:.1} | Epsilon: {:.4} | States: {}",
            self.total_episodes,
            self.total_steps,
            self.mean_episode_reward(),
            self.mean_episode_score(),
            self.best_score,
            self.mean_episode_length(),
            self.exploration_rate,
            self.q_table_states,
        )
    }

    fn push_deque<T>(deque: &mut VecDeque<T>, value: T, window_size: usize) {
        if deque.len() >= window_size {
            deque.pop_front();
        }
        deque.push_back(value);
    }
}
