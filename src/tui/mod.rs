//! Terminal host: raw-mode screen, event stream and the match driver

pub mod canvas;
pub mod events;

use std::io::{self, Stdout};
use std::path::PathBuf;

use anyhow::Context;
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture, EventStream},
    execute, terminal,
};
use futures::StreamExt;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::assets::Assets;
use crate::game::r#match::MatchOptions;
use crate::game::snapshot::SessionSnapshot;
use crate::game::{GameMatch, MatchCommand, MatchSession};
use crate::store::ScoreKeeper;

use canvas::{TerminalCanvas, Viewport};
use events::{translate, HostAction};

/// Raw mode and the alternate screen, restored on drop
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(
            io::stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::DisableLineWrap,
            EnableMouseCapture,
        )?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let restored = execute!(
            io::stdout(),
            DisableMouseCapture,
            terminal::EnableLineWrap,
            cursor::Show,
            terminal::LeaveAlternateScreen,
        )
        .and_then(|_| terminal::disable_raw_mode());
        if let Err(e) = restored {
            warn!(error = %e, "Failed to restore terminal");
        }
    }
}

/// Run one match in the terminal until the user quits.
/// Returns the last snapshot the match published.
pub async fn play(
    session: MatchSession,
    keeper: ScoreKeeper,
    assets_dir: PathBuf,
    options: MatchOptions,
) -> anyhow::Result<SessionSnapshot> {
    let (logical_w, logical_h) = (session.field().width, session.field().height);

    let guard = TerminalGuard::enter().context("failed to prepare the terminal")?;
    let (cols, rows) = terminal::size()?;
    let mut viewport = Viewport::fit(cols, rows, logical_w, logical_h);
    let canvas: TerminalCanvas<Stdout> =
        TerminalCanvas::new(io::stdout(), cols, rows, logical_w, logical_h);

    let (assets_tx, assets_rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = assets_tx.send(Assets::load(&assets_dir).await);
    });

    let (game_match, handle) = GameMatch::new(session, canvas, keeper, options);
    let task = tokio::spawn(game_match.with_assets(assets_rx).run());
    let snapshots = handle.snapshots();

    let mut events = EventStream::new();
    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Terminal event stream failed");
                break;
            }
        };

        match translate(&event, &viewport) {
            Some(HostAction::Quit) => {
                info!("Quit requested");
                break;
            }
            Some(HostAction::Command(command)) => {
                if let MatchCommand::Resize { cols, rows } = command {
                    viewport = Viewport::fit(cols, rows, logical_w, logical_h);
                }
                if !handle.send(command).await {
                    break;
                }
            }
            None => {}
        }
    }

    handle.stop();
    let result = task.await;
    drop(guard);

    let session = result.context("match task panicked")??;
    info!(ticks = session.tick_count(), "Terminal released");
    let last = snapshots.borrow().clone();
    Ok(last)
}
