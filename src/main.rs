use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use q_snake::game::GameConfig;
use q_snake::input::prompt_hyperparameters;
use q_snake::metrics::Leaderboard;
use q_snake::modes::{HumanMode, TrainConfig, TrainMode, WatchConfig, WatchMode};
use q_snake::rl::{AgentMode, AgentStore, HyperParameters, StoreError};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "q_snake")]
#[command(version, about = "Snake game with a tabular Q-learning agent")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Grid width in cells
    #[arg(long, global = true, default_value = "64")]
    width: usize,

    /// Grid height in cells
    #[arg(long, global = true, default_value = "48")]
    height: usize,

    /// Directory holding agent profiles and Q-tables
    #[arg(long, global = true, default_value = "agents")]
    agents_dir: PathBuf,

    /// High score file
    #[arg(long, global = true, default_value = "high_scores.json")]
    scores_file: PathBuf,

    /// Seed for food placement and exploration
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log file used while a terminal UI is running
    #[arg(long, global = true, default_value = "q_snake.log")]
    log_file: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Play snake with keyboard controls
    Human {
        /// Record the final score under this name
        #[arg(long)]
        name: Option<String>,
    },
    /// Create a new agent
    CreateAgent(CreateAgentArgs),
    /// List stored agents
    ListAgents,
    /// Run an agent headless for a number of episodes
    Train {
        name: String,
        #[arg(long, value_enum, default_value = "learning")]
        mode: ModeArg,
        #[arg(long, default_value = "100")]
        episodes: usize,
        /// Log a progress summary every N episodes
        #[arg(long, default_value = "100")]
        log_frequency: usize,
        /// End an episode after this many moves
        #[arg(long)]
        max_steps: Option<u32>,
    },
    /// Watch an agent play in the terminal
    Watch {
        name: String,
        #[arg(long, value_enum, default_value = "learning")]
        mode: ModeArg,
        /// Episodes to play before waiting for R or Q
        #[arg(long, default_value = "1")]
        episodes: usize,
    },
    /// Show the high score list
    Scores,
}

#[derive(Args)]
struct CreateAgentArgs {
    name: String,

    /// Prompt for each hyperparameter on stdin
    #[arg(long)]
    interactive: bool,

    #[arg(long)]
    learning_rate: Option<f64>,
    #[arg(long)]
    discount_factor: Option<f64>,
    #[arg(long)]
    exploration_rate: Option<f64>,
    #[arg(long)]
    exploration_decay: Option<f64>,
    #[arg(long)]
    min_exploration_rate: Option<f64>,
}

impl CreateAgentArgs {
    fn hyperparameters(&self) -> HyperParameters {
        let defaults = HyperParameters::default();
        HyperParameters {
            learning_rate: self.learning_rate.unwrap_or(defaults.learning_rate),
            discount_factor: self.discount_factor.unwrap_or(defaults.discount_factor),
            exploration_rate: self.exploration_rate.unwrap_or(defaults.exploration_rate),
            exploration_decay: self.exploration_decay.unwrap_or(defaults.exploration_decay),
            min_exploration_rate: self
                .min_exploration_rate
                .unwrap_or(defaults.min_exploration_rate),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Decay exploration and count learning cycles
    Learning,
    /// Fixed exploration rate, profile left as is
    Static,
}

impl From<ModeArg> for AgentMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Learning => AgentMode::Learning,
            ModeArg::Static => AgentMode::Static,
        }
    }
}

/// Headless commands log to stdout
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .try_init();
}

/// Terminal UI modes own the screen, so logs go to a file
fn init_file_tracing(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {:?}", path))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Print "not found" for a missing agent; anything else is a real error
fn report_missing_agent(err: StoreError, name: &str) -> Result<()> {
    if err.is_missing_agent() {
        info!(agent = name, error = %err, "agent unavailable");
        println!("Agent {name} not found.");
        Ok(())
    } else {
        Err(err).with_context(|| format!("Failed to load agent {name}"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let game_config = GameConfig::new(cli.width, cli.height);
    game_config.validate().map_err(|e| anyhow!(e))?;

    let store = AgentStore::new(&cli.agents_dir);
    let leaderboard = Leaderboard::new(&cli.scores_file);

    match cli.command {
        Command::Human { name } => {
            init_file_tracing(&cli.log_file)?;
            let mut human_mode = HumanMode::new(game_config, leaderboard, name);
            human_mode.run().await?;
        }
        Command::CreateAgent(args) => {
            init_tracing();
            let params = if args.interactive {
                let stdin = io::stdin();
                let mut stdout = io::stdout();
                prompt_hyperparameters(&mut stdin.lock(), &mut stdout, &args.hyperparameters())?
            } else {
                args.hyperparameters()
            };

            let profile = store
                .create_agent(&args.name, &params)
                .with_context(|| format!("Failed to create agent {}", args.name))?;
            info!(agent = %profile.name, dir = ?store.dir(), "created agent");
            println!("Agent {} created.", profile.name);
        }
        Command::ListAgents => {
            init_tracing();
            let agents = store.list_agents().context("Failed to list agents")?;
            let mut stdout = io::stdout().lock();
            if agents.is_empty() {
                writeln!(stdout, "No agents found.")?;
            }
            for (i, agent) in agents.iter().enumerate() {
                writeln!(stdout, "{}. {}", i + 1, agent)?;
            }
        }
        Command::Train {
            name,
            mode,
            episodes,
            log_frequency,
            max_steps,
        } => {
            init_tracing();
            let config = TrainConfig {
                mode: mode.into(),
                log_frequency,
                max_steps_per_episode: max_steps,
                game_config,
                seed: cli.seed,
                ..TrainConfig::new(name.clone(), episodes)
            };

            match TrainMode::new(config, store, leaderboard) {
                Ok(mut train_mode) => {
                    let stats = train_mode.run();
                    println!("{}", stats.format_summary());
                }
                Err(err) => return report_missing_agent(err, &name),
            }
        }
        Command::Watch {
            name,
            mode,
            episodes,
        } => {
            init_file_tracing(&cli.log_file)?;
            let config = WatchConfig {
                episodes,
                game_config,
                seed: cli.seed,
                ..WatchConfig::new(name.clone(), mode.into())
            };

            match WatchMode::new(config, store, leaderboard) {
                Ok(mut watch_mode) => watch_mode.run().await?,
                Err(err) => return report_missing_agent(err, &name),
            }
        }
        Command::Scores => {
            init_tracing();
            let entries = leaderboard.read();
            let mut stdout = io::stdout().lock();
            if entries.is_empty() {
                writeln!(stdout, "No high scores yet.")?;
            }
            for (i, entry) in entries.iter().enumerate() {
                writeln!(stdout, "{}. {:<32} {:>5}", i + 1, entry.name, entry.score)?;
            }
        }
    }

    Ok(())
}
