//! Flappy Rooms - flap-to-survive in the terminal
//!
//! Entry point for the `flappy` binary. It handles:
//! - Local solo and two-player matches on a half-block terminal canvas
//! - The Supabase-backed room lobby
//! - Password login and the saved session
//! - Best score and history, remote with a local fallback

mod app;
mod assets;
mod auth;
mod config;
mod game;
mod lobby;
mod store;
mod tui;
mod util;

use std::fs::OpenOptions;
use std::sync::Mutex;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::app::{commands, AppState};
use crate::config::Config;
use crate::game::{Difficulty, PlayMode};

#[derive(Parser)]
#[command(name = "flappy", version, about = "Flap between the pipes, alone or in a room")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a local match
    Play {
        /// Two actors on one keyboard
        #[arg(long)]
        duo: bool,
        /// easy, normal or hard
        #[arg(long)]
        difficulty: Option<Difficulty>,
        /// Obstacle seed
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List rooms, newest first
    Lobby {
        /// Keep listing as rooms change
        #[arg(long)]
        watch: bool,
    },
    /// Create or join a room
    #[command(subcommand)]
    Room(RoomCommand),
    /// Sign in with email and password
    Login(Credentials),
    /// Create an account
    Register(Credentials),
    /// Forget the saved session
    Logout,
    /// Show best score and recent history
    Scores,
}

#[derive(Subcommand)]
enum RoomCommand {
    /// Create a waiting room
    Create,
    /// Join a room by id and play
    Join { id: Uuid },
}

#[derive(Args)]
struct Credentials {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config)?;

    info!(data_dir = %config.data_dir.display(), online = config.supabase.is_some(), "Starting flappy");

    let state = AppState::new(config);

    match cli.command {
        Command::Play {
            duo,
            difficulty,
            seed,
        } => {
            let mode = if duo { PlayMode::Duo } else { PlayMode::Solo };
            let difficulty = difficulty.unwrap_or(state.config.difficulty);
            commands::play(&state, mode, difficulty, seed, None).await
        }
        Command::Lobby { watch: true } => lobby::watch(&state).await,
        Command::Lobby { watch: false } => lobby::list(&state).await,
        Command::Room(RoomCommand::Create) => lobby::create(&state).await,
        Command::Room(RoomCommand::Join { id }) => lobby::join(&state, id).await,
        Command::Login(c) => commands::login(&state, &c.email, &c.password).await,
        Command::Register(c) => commands::register(&state, &c.email, &c.password).await,
        Command::Logout => commands::logout(&state).await,
        Command::Scores => commands::scores(&state).await,
    }
}

/// Initialize tracing/logging into the log file; the terminal belongs to the game
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    if let Some(parent) = config.log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file));

    if config.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    }
    Ok(())
}
