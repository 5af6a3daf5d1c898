//! Application wiring and account commands

pub mod commands;
pub mod state;

pub use state::AppState;
