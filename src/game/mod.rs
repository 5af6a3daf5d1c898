//! Game simulation modules

pub mod collision;
pub mod field;
pub mod input;
pub mod r#match;
pub mod obstacles;
pub mod physics;
pub mod render;
pub mod session;
pub mod snapshot;

pub use physics::Difficulty;
pub use r#match::{GameMatch, MatchCommand};
pub use session::{MatchSession, MatchState};

use serde::{Deserialize, Serialize};

/// How many actors a match runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// One actor, every binding flaps it
    Solo,
    /// Two actors sharing a keyboard or touch screen
    Duo,
}

impl PlayMode {
    pub fn actor_count(self) -> usize {
        match self {
            Self::Solo => 1,
            Self::Duo => 2,
        }
    }
}

/// Why an actor went down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    Ground,
    Obstacle,
}

/// Things that happened during a tick or an input (sound cues, persistence triggers)
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Ready/GameOver -> Playing
    Started { mode: PlayMode },
    /// An actor flapped
    Flap { slot: usize },
    /// An obstacle was cleared; `score` is the new total
    Passed { score: u32 },
    /// An actor died
    ActorDown { slot: usize, cause: DeathCause },
    /// Playing -> GameOver with the frozen score
    MatchOver { score: u32 },
}
