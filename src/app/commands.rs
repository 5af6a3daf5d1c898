//! Local play and account commands

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{session, SavedSession};
use crate::game::r#match::MatchOptions;
use crate::game::{Difficulty, MatchSession, MatchState, PlayMode};
use crate::store::players::default_display_name;
use crate::store::CachedScores;
use crate::tui;

use super::AppState;

/// Play a match in the terminal and report the result
pub async fn play(
    state: &AppState,
    mode: PlayMode,
    difficulty: Difficulty,
    seed: Option<u64>,
    room_id: Option<Uuid>,
) -> anyhow::Result<()> {
    let seed = seed.or(state.config.seed).unwrap_or_else(rand::random);
    info!(?mode, ?difficulty, seed, room_id = ?room_id, "Starting match");

    let session = MatchSession::new(mode, difficulty, seed)?;
    let options = MatchOptions {
        tick_rate: state.config.tick_rate,
        room_id,
    };
    let last = tui::play(
        session,
        state.keeper.clone(),
        state.config.assets_dir.clone(),
        options,
    )
    .await?;

    if last.state == MatchState::GameOver {
        println!("Last score: {}", last.show_score);
    }
    if let Some(best) = last.best {
        println!("Best: {}", best);
    }
    Ok(())
}

pub async fn login(state: &AppState, email: &str, password: &str) -> anyhow::Result<()> {
    let client = state.require_supabase()?;
    let saved = session::sign_in(client, email, password).await?;
    finish_sign_in(state, saved).await
}

pub async fn register(state: &AppState, email: &str, password: &str) -> anyhow::Result<()> {
    let client = state.require_supabase()?;
    let saved = session::sign_up(client, email, password).await?;
    finish_sign_in(state, saved).await
}

async fn finish_sign_in(state: &AppState, saved: SavedSession) -> anyhow::Result<()> {
    let session_file = state.identity.session_file();
    session_file.save(&saved).await?;
    debug!(path = %session_file.path().display(), "Session saved");

    let Some(identity) = state.identity.refresh().await else {
        anyhow::bail!("Signed in, but the access token could not be verified");
    };

    let name = default_display_name(saved.email.as_deref());
    match state.players_for(&identity)?.ensure(identity.user_id, &name).await {
        Ok(player) => info!(user_id = %player.id, "Player profile ready"),
        Err(e) => warn!(error = %e, "Failed to ensure player profile"),
    }

    println!(
        "Signed in as {}",
        saved.email.as_deref().unwrap_or("unknown email")
    );
    Ok(())
}

pub async fn logout(state: &AppState) -> anyhow::Result<()> {
    if state.identity.session_file().remove().await? {
        info!("Signed out");
        println!("Signed out");
    } else {
        println!("Not signed in");
    }
    state.identity.refresh().await;
    Ok(())
}

pub async fn scores(state: &AppState) -> anyhow::Result<()> {
    let board = state.keeper.board().await;
    print!("{}", format_board(&board));
    Ok(())
}

/// Best score and recent history as printed by `scores`
pub fn format_board(board: &CachedScores) -> String {
    let best = board
        .best
        .map_or_else(|| "-".to_string(), |b| b.to_string());
    let mut out = format!("Best: {}\n", best);
    if board.history.is_empty() {
        out.push_str("No games played yet\n");
    } else {
        for (i, score) in board.history.iter().enumerate() {
            out.push_str(&format!("{:>2}. {}\n", i + 1, score));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_board_prints_a_dash() {
        assert_eq!(
            format_board(&CachedScores::default()),
            "Best: -\nNo games played yet\n"
        );
    }

    #[test]
    fn history_is_numbered_newest_first() {
        let board = CachedScores {
            best: Some(8),
            history: vec![2, 8],
        };
        assert_eq!(format_board(&board), "Best: 8\n 1. 2\n 2. 8\n");
    }
}
