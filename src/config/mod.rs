//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;

use crate::game::Difficulty;
use crate::util::time::SIMULATION_TPS;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log filter directive (trace, debug, info, warn, error)
    pub log_level: String,
    /// JSON log lines instead of plain text
    pub log_json: bool,
    /// Local cache, saved session and log file live here
    pub data_dir: PathBuf,
    /// Tracing output file
    pub log_file: PathBuf,
    /// Sprite directory
    pub assets_dir: PathBuf,
    pub difficulty: Difficulty,
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Fixed obstacle seed, random when unset
    pub seed: Option<u64>,
    /// Remote persistence, disabled when unset
    pub supabase: Option<SupabaseConfig>,
}

/// Supabase project settings
#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    /// Supabase project URL
    pub url: String,
    /// Supabase anonymous key
    pub anon_key: String,
    /// Supabase JWT secret for local token verification
    pub jwt_secret: Option<String>,
    /// Access token overriding the saved session
    pub access_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Load configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("FLAPPY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let log_file = lookup("FLAPPY_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("flappy.log"));

        let difficulty = match lookup("FLAPPY_DIFFICULTY") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid("FLAPPY_DIFFICULTY", value))?,
            None => Difficulty::default(),
        };

        let tick_rate = match lookup("FLAPPY_TICK_RATE") {
            Some(value) => match value.parse::<u32>() {
                Ok(rate) if (1..=240).contains(&rate) => rate,
                _ => return Err(ConfigError::Invalid("FLAPPY_TICK_RATE", value)),
            },
            None => SIMULATION_TPS,
        };

        let seed = match lookup("FLAPPY_SEED") {
            Some(value) => Some(
                value
                    .parse()
                    .map_err(|_| ConfigError::Invalid("FLAPPY_SEED", value))?,
            ),
            None => None,
        };

        let supabase = match (lookup("SUPABASE_URL"), lookup("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(SupabaseConfig {
                url,
                anon_key,
                jwt_secret: lookup("SUPABASE_JWT_SECRET"),
                access_token: lookup("SUPABASE_ACCESS_TOKEN"),
            }),
            (Some(_), None) => return Err(ConfigError::Missing("SUPABASE_ANON_KEY")),
            (None, Some(_)) => return Err(ConfigError::Missing("SUPABASE_URL")),
            (None, None) => None,
        };

        Ok(Self {
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            data_dir,
            log_file,
            assets_dir: lookup("FLAPPY_ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("assets")),
            difficulty,
            tick_rate,
            seed,
            supabase,
        })
    }

    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}

fn default_data_dir() -> PathBuf {
    env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".flappy-rooms")
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: '{1}'")]
    Invalid(&'static str, String),
}
