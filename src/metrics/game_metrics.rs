use std::time::{Duration, Instant};

/// Scoreboard for one terminal session
///
/// Tracks the clock of the game in progress plus totals over every game
/// finished since the window opened. Nothing here is persisted; the shared
/// high score file lives in [`crate::metrics::Leaderboard`].
#[derive(Debug, Clone)]
pub struct GameMetrics {
    game_started: Instant,
    game_time: Duration,
    games: u32,
    best: Option<u32>,
    last: Option<u32>,
    total_score: u64,
}

impl GameMetrics {
    pub fn new() -> Self {
        Self {
            game_started: Instant::now(),
            game_time: Duration::ZERO,
            games: 0,
            best: None,
            last: None,
            total_score: 0,
        }
    }

    /// Refresh the clock of the running game
    pub fn tick(&mut self) {
        self.game_time = self.game_started.elapsed();
    }

    pub fn start_game(&mut self) {
        self.game_started = Instant::now();
        self.game_time = Duration::ZERO;
    }

    /// File a finished game. Returns true when it beat every earlier game of
    /// the session; the first game always does.
    pub fn finish_game(&mut self, score: u32) -> bool {
        self.games += 1;
        self.last = Some(score);
        self.total_score += u64::from(score);

        let improved = self.best.is_none_or(|best| score > best);
        if improved {
            self.best = Some(score);
        }
        improved
    }

    pub fn games(&self) -> u32 {
        self.games
    }

    pub fn best(&self) -> u32 {
        self.best.unwrap_or(0)
    }

    pub fn last(&self) -> Option<u32> {
        self.last
    }

    /// Mean score over finished games
    pub fn average(&self) -> Option<f64> {
        (self.games > 0).then(|| self.total_score as f64 / f64::from(self.games))
    }

    pub fn game_time(&self) -> Duration {
        self.game_time
    }

    /// Game clock as `MM:SS`. Minutes keep counting past an hour.
    pub fn clock(&self) -> String {
        let secs = self.game_time.as_secs();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

impl Default for GameMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock() {
        let mut metrics = GameMetrics::new();
        assert_eq!(metrics.clock(), "00:00");

        metrics.game_time = Duration::from_millis(125_900);
        assert_eq!(metrics.clock(), "02:05");

        metrics.game_time = Duration::from_secs(3661);
        assert_eq!(metrics.clock(), "61:01");
    }

    #[test]
    fn test_finish_game_reports_new_best() {
        let mut metrics = GameMetrics::new();
        assert_eq!(metrics.best(), 0);
        assert_eq!(metrics.last(), None);

        // A zero first game still sets the session best
        assert!(metrics.finish_game(0));
        assert!(metrics.finish_game(7));
        assert!(!metrics.finish_game(7));
        assert!(!metrics.finish_game(2));

        assert_eq!(metrics.best(), 7);
        assert_eq!(metrics.last(), Some(2));
        assert_eq!(metrics.games(), 4);
    }

    #[test]
    fn test_average() {
        let mut metrics = GameMetrics::new();
        assert_eq!(metrics.average(), None);

        metrics.finish_game(3);
        metrics.finish_game(4);
        assert_eq!(metrics.average(), Some(3.5));
    }

    #[test]
    fn test_start_game_resets_clock_but_not_totals() {
        let mut metrics = GameMetrics::new();
        metrics.finish_game(5);
        metrics.game_time = Duration::from_secs(30);

        metrics.start_game();
        metrics.tick();
        assert!(metrics.game_time() < Duration::from_secs(30));
        assert_eq!(metrics.games(), 1);
        assert_eq!(metrics.best(), 5);
    }
}
