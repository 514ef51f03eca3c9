//! Watch mode: a stored agent playing in the terminal
//!
//! The agent keeps learning while it plays (in learning mode) or plays at a
//! fixed exploration rate (static mode). After the requested number of
//! episodes the game-over screen waits for another round or quit.
//!
//! # Controls
//!
//! - 1-4: Speed (1=slow, 2=normal, 3=fast, 4=turbo)
//! - +/-: Step the speed up or down
//! - R: Play another episode once the session has finished
//! - Q/Esc: Quit

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    io::{Stderr, stderr},
    time::Duration,
};
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::info;

use crate::game::GameConfig;
use crate::input::{InputHandler, KeyAction};
use crate::metrics::GameMetrics;
use crate::metrics::Leaderboard;
use crate::metrics::leaderboard::today;
use crate::render::{Overlay, Renderer};
use crate::rl::{AgentMode, AgentStore, QAgent, RewardConfig, SnakeEnvironment, StoreError};

/// Playback speed settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchSpeed {
    /// 5 moves per second
    Slow,
    /// 10 moves per second
    Normal,
    /// 30 moves per second
    Fast,
    /// 100 moves per second
    Turbo,
}

impl WatchSpeed {
    /// Learning sessions run at full speed, static ones at playing speed
    pub fn default_for(mode: AgentMode) -> Self {
        match mode {
            AgentMode::Learning => Self::Turbo,
            AgentMode::Static => Self::Normal,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        match self {
            Self::Slow => Duration::from_millis(200),
            Self::Normal => Duration::from_millis(100),
            Self::Fast => Duration::from_millis(33),
            Self::Turbo => Duration::from_millis(10),
        }
    }

    pub fn faster(&self) -> Self {
        match self {
            Self::Slow => Self::Normal,
            Self::Normal => Self::Fast,
            Self::Fast | Self::Turbo => Self::Turbo,
        }
    }

    pub fn slower(&self) -> Self {
        match self {
            Self::Turbo => Self::Fast,
            Self::Fast => Self::Normal,
            Self::Normal | Self::Slow => Self::Slow,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slow => "Slow",
            Self::Normal => "Normal",
            Self::Fast => "Fast",
            Self::Turbo => "Turbo",
        }
    }
}

/// Where the session is between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    /// All requested episodes played; waiting for R or Q
    AwaitingInput,
    Exit,
}

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub agent_name: String,
    pub mode: AgentMode,
    /// Episodes to play before waiting for input
    pub episodes: usize,
    pub game_config: GameConfig,
    pub rewards: RewardConfig,
    pub seed: Option<u64>,
}

impl WatchConfig {
    pub fn new(agent_name: impl Into<String>, mode: AgentMode) -> Self {
        Self {
            agent_name: agent_name.into(),
            mode,
            episodes: 1,
            game_config: GameConfig::default(),
            rewards: RewardConfig::default(),
            seed: None,
        }
    }
}

pub struct WatchMode {
    agent: QAgent,
    env: SnakeEnvironment,
    store: AgentStore,
    leaderboard: Leaderboard,
    renderer: Renderer,
    input_handler: InputHandler,
    metrics: GameMetrics,
    session: SessionState,
    speed: WatchSpeed,
    /// Episodes to play this session; grows by one on every restart
    target_episodes: usize,
    completed_episodes: usize,
}

impl WatchMode {
    pub fn new(
        config: WatchConfig,
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

        let mut env = match config.seed {
            Some(seed) => SnakeEnvironment::with_seed(config.game_config.clone(), seed),
            None => SnakeEnvironment::new(config.game_config.clone()),
        };
        env.reset();

        let mut mode = Self {
            agent,
            env,
            store,
            leaderboard,
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            metrics: GameMetrics::new(),
            session: SessionState::Running,
            speed: WatchSpeed::default_for(config.mode),
            target_episodes: config.episodes,
            completed_episodes: 0,
        };
        if config.episodes == 0 {
            mode.session = SessionState::AwaitingInput;
        }
        mode.agent.begin_episode();

        Ok(mode)
    }

    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        let result = self.run_watch_loop(&mut terminal).await;

        self.cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_watch_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        let mut tick_timer = interval(self.speed.tick_interval());
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Render at 30 FPS
        let mut render_timer = interval(Duration::from_millis(33));

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event, &mut tick_timer);
                    }
                }

                _ = tick_timer.tick() => {
                    self.advance();
                }

                _ = render_timer.tick() => {
                    if self.session == SessionState::Running {
                        self.metrics.tick();
                    }
                    let overlay = self.overlay();
                    terminal.draw(|frame| {
                        self.renderer.render(frame, self.env.state(), &self.metrics, &overlay);
                    }).context("Failed to draw frame")?;
                }

                _ = &mut ctrl_c => {
                    self.session = SessionState::Exit;
                }
            }

            if self.session == SessionState::Exit {
                break;
            }
        }

        info!(
            agent = %self.agent.profile().name,
            episodes = self.completed_episodes,
            best = self.metrics.best(),
            "watch session ended"
        );

        Ok(())
    }

    /// One agent move, plus episode bookkeeping when it ends the game
    fn advance(&mut self) {
        if self.session != SessionState::Running {
            return;
        }

        let outcome = self.agent.tick(&mut self.env);
        if !outcome.terminated {
            return;
        }

        let score = self.env.state().score;
        let entry = self
            .agent
            .finish_episode(&self.store, &self.leaderboard, score, today());
        let session_best = self.metrics.finish_game(score);
        self.completed_episodes += 1;
        info!(
            episode = self.completed_episodes,
            score,
            session_best,
            steps = self.env.state().steps,
            entry = %entry,
            "episode finished"
        );

        if self.completed_episodes < self.target_episodes {
            self.start_episode();
        } else {
            self.session = SessionState::AwaitingInput;
        }
    }

    fn start_episode(&mut self) {
        self.env.reset();
        self.agent.begin_episode();
        self.metrics.start_game();
        self.session = SessionState::Running;
    }

    fn handle_event(&mut self, event: Event, tick_timer: &mut Interval) {
        if let Event::Key(key) = event {
            if key.kind != KeyEventKind::Press {
                return;
            }

            let speed = match key.code {
                KeyCode::Char('1') => Some(WatchSpeed::Slow),
                KeyCode::Char('2') => Some(WatchSpeed::Normal),
                KeyCode::Char('3') => Some(WatchSpeed::Fast),
                KeyCode::Char('4') => Some(WatchSpeed::Turbo),
                _ => None,
            };
            if let Some(speed) = speed {
                self.change_speed(speed, tick_timer);
                return;
            }

            match self.input_handler.handle_key_event(key) {
                KeyAction::Quit => self.session = SessionState::Exit,
                KeyAction::Restart => self.restart(),
                KeyAction::SpeedUp => self.change_speed(self.speed.faster(), tick_timer),
                KeyAction::SpeedDown => self.change_speed(self.speed.slower(), tick_timer),
                _ => {}
            }
        }
    }

    /// Queue one more episode once the session is waiting
    fn restart(&mut self) {
        if self.session == SessionState::AwaitingInput {
            self.target_episodes = self.completed_episodes + 1;
            self.start_episode();
        }
    }

    fn change_speed(&mut self, speed: WatchSpeed, tick_timer: &mut Interval) {
        self.speed = speed;
        *tick_timer = interval(speed.tick_interval());
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    }

    fn overlay(&self) -> Overlay {
        let profile = self.agent.profile();
        let episode = (self.completed_episodes + 1).min(self.target_episodes.max(1));

        Overlay {
            title: format!(" {} ", profile.name),
            fields: vec![
                ("Mode", self.agent.mode().as_str().to_string()),
                ("Episode", format!("{}/{}", episode, self.target_episodes)),
                ("Epsilon", format!("{:.3}", self.agent.epsilon())),
                ("States", self.agent.q_table().len().to_string()),
                ("Speed", self.speed.as_str().to_string()),
            ],
            controls: vec![
                ("1-4", "speed"),
                ("+/-", "faster/slower"),
                ("R", "next episode"),
                ("Q", "quit"),
            ],
        }
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}
