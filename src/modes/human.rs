use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info};

use crate::game::{Direction, GameConfig, GameEngine, GameState};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::{GameMetrics, Leaderboard};
use crate::render::{Overlay, Renderer};

/// 10 moves per second
const TICK_INTERVAL: Duration = Duration::from_millis(100);

pub struct HumanMode {
    engine: GameEngine,
    state: GameState,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    overlay: Overlay,
    leaderboard: Leaderboard,
    player_name: Option<String>,
    should_quit: bool,
    pending_direction: Option<Direction>,
}

impl HumanMode {
    /// Scores are only filed when a `player_name` is given
    pub fn new(config: GameConfig, leaderboard: Leaderboard, player_name: Option<String>) -> Self {
        let mut engine = GameEngine::new(config);
        let state = engine.reset();

        let mut overlay = Overlay::human();
        if let Some(name) = &player_name {
            overlay.fields.push(("Player", name.clone()));
        }

        Self {
            engine,
            state,
            metrics: GameMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            overlay,
            leaderboard,
            player_name,
            should_quit: false,
            pending_direction: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        let result = self.run_game_loop(&mut terminal).await;

        self.cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();
        let mut tick_timer = interval(TICK_INTERVAL);

        // Render at 30 FPS
        let mut render_timer = interval(Duration::from_millis(33));

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event);
                    }
                }

                _ = tick_timer.tick() => {
                    if self.state.is_alive {
                        self.update_game();
                    }
                }

                _ = render_timer.tick() => {
                    if self.state.is_alive {
                        self.metrics.tick();
                    }
                    terminal.draw(|frame| {
                        self.renderer.render(frame, &self.state, &self.metrics, &self.overlay);
                    }).context("Failed to draw frame")?;
                }

                _ = &mut ctrl_c => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            if key.kind != KeyEventKind::Press {
                return;
            }

            match self.input_handler.handle_key_event(key) {
                KeyAction::Turn(direction) => self.queue_turn(direction),
                KeyAction::Restart => self.reset_game(),
                KeyAction::Quit => self.should_quit = true,
                _ => {}
            }
        }
    }

    /// Remember a turn for the next tick. Reversing onto the neck is ignored.
    fn queue_turn(&mut self, direction: Direction) {
        if !direction.is_opposite(self.state.heading()) {
            self.pending_direction = Some(direction);
        }
    }

    fn update_game(&mut self) {
        let direction = self
            .pending_direction
            .take()
            .unwrap_or_else(|| self.state.heading());

        let result = self.engine.step(&mut self.state, direction);

        if result.terminated {
            self.on_game_over();
        }
    }

    fn on_game_over(&mut self) {
        let score = self.state.score;
        let session_best = self.metrics.finish_game(score);
        info!(score, steps = self.state.steps, session_best, "game over");

        if let Some(name) = &self.player_name {
            if let Err(err) = self.leaderboard.submit(score, name.clone()) {
                error!(error = ?err, "failed to record high score");
            }
        }
    }

    fn reset_game(&mut self) {
        self.state = self.engine.reset();
        self.metrics.start_game();
        self.pending_direction = None;
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
