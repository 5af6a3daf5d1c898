//! Data store modules: Supabase tables and the local score cache

pub mod keeper;
pub mod local;
pub mod players;
pub mod rooms;
pub mod scores;
pub mod supabase;

pub use keeper::{ScoreKeeper, Scoreboard};
pub use local::{CachedScores, LocalScoreCache};
pub use players::PlayerStore;
pub use rooms::{Room, RoomError, RoomStore};
pub use supabase::{SupabaseClient, SupabaseError};
