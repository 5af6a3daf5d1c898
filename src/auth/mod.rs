//! User identity: Supabase password auth, saved sessions and token checks

pub mod identity;
pub mod jwt;
pub mod session;

pub use identity::{Identity, IdentityProvider};
pub use session::SavedSession;

use crate::store::SupabaseError;

/// Authentication error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Not signed in. Run `flappy login` first.")]
    NotSignedIn,

    #[error("Check {0} for a confirmation link, then log in")]
    ConfirmationRequired(String),

    #[error(transparent)]
    Supabase(#[from] SupabaseError),

    #[error("Session file I/O failed: {0}")]
    SessionIo(#[from] std::io::Error),

    #[error("Session file is not valid JSON: {0}")]
    SessionFormat(#[from] serde_json::Error),
}
