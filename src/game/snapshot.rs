//! Session snapshots published to observers at state-machine boundaries

use serde::Serialize;
use tokio::sync::watch;

use crate::util::time::unix_millis;

use super::render::Hud;
use super::session::{MatchSession, MatchState};

/// What a UI needs outside the hot loop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: MatchState,
    pub score: u32,
    pub show_score: u32,
    pub best: Option<u32>,
    pub history: Vec<u32>,
    /// Simulation ticks since the match started
    pub tick: u64,
    /// Capture time (Unix millis)
    pub captured_at: u64,
}

/// Builds and publishes snapshots over a watch channel
pub struct SnapshotPublisher {
    tx: watch::Sender<SessionSnapshot>,
    published: u64,
}

impl SnapshotPublisher {
    pub fn new(session: &MatchSession, hud: &Hud) -> (Self, watch::Receiver<SessionSnapshot>) {
        let (tx, rx) = watch::channel(Self::build(session, hud));
        (Self { tx, published: 0 }, rx)
    }

    pub fn build(session: &MatchSession, hud: &Hud) -> SessionSnapshot {
        SessionSnapshot {
            state: session.state(),
            score: session.score(),
            show_score: session.show_score(),
            best: hud.best,
            history: hud.history.clone(),
            tick: session.tick_count(),
            captured_at: unix_millis(),
        }
    }

    /// Publish the current state. Observers are optional.
    pub fn publish(&mut self, session: &MatchSession, hud: &Hud) {
        self.tx.send_replace(Self::build(session, hud));
        self.published += 1;
    }

    pub fn published(&self) -> u64 {
        self.published
    }
}
