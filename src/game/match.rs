//! Match task: the fixed-rate tick loop that owns a session
//!
//! One task owns the [`MatchSession`] and its render target. It multiplexes
//! host commands, persistence results, a late asset load, a shutdown signal
//! and the simulation ticker. The ticker branch is only armed while the
//! session is Playing, so leaving Playing drops the pending tick and starting
//! again resets the ticker.
//!
//! Board loads and score writes run as separate tasks and may finish in any
//! order. Each one carries the generation it was issued with, and a result
//! older than the board already shown is dropped.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::assets::Assets;
use crate::store::{CachedScores, ScoreKeeper, Scoreboard};
use crate::util::time::{frames_between, tick_period};

use super::input::{InputEvent, InputRouter};
use super::render::{render_frame, DisplayError, Hud, RenderTarget};
use super::session::MatchSession;
use super::snapshot::{SessionSnapshot, SnapshotPublisher};
use super::GameEvent;

/// Messages from the host to the match task
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchCommand {
    Input(InputEvent),
    /// Start or restart regardless of bindings
    Start,
    /// The display changed size, in terminal cells
    Resize { cols: u16, rows: u16 },
}

/// Per-match settings
#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    pub tick_rate: u32,
    /// Room the scores belong to
    pub room_id: Option<Uuid>,
}

/// Handle to a running match
pub struct MatchHandle {
    command_tx: mpsc::Sender<MatchCommand>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    shutdown_tx: watch::Sender<bool>,
}

impl MatchHandle {
    /// Queue a command. False once the match has ended.
    pub async fn send(&self, command: MatchCommand) -> bool {
        self.command_tx.send(command).await.is_ok()
    }

    pub fn snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// End the match loop
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// The match task
pub struct GameMatch<T: RenderTarget, K: Scoreboard = ScoreKeeper> {
    session: MatchSession,
    router: InputRouter,
    target: T,
    assets: Assets,
    assets_rx: Option<oneshot::Receiver<Assets>>,
    hud: Hud,
    keeper: K,
    options: MatchOptions,
    command_rx: mpsc::Receiver<MatchCommand>,
    shutdown_rx: watch::Receiver<bool>,
    board_tx: mpsc::Sender<(u64, CachedScores)>,
    board_rx: mpsc::Receiver<(u64, CachedScores)>,
    /// Last board generation handed out
    issued: u64,
    /// Generation of the board in `hud`
    applied: u64,
    publisher: SnapshotPublisher,
}

impl<T: RenderTarget, K: Scoreboard> GameMatch<T, K> {
    /// Create a new match
    pub fn new(
        session: MatchSession,
        target: T,
        keeper: K,
        options: MatchOptions,
    ) -> (Self, MatchHandle) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (board_tx, board_rx) = mpsc::channel(8);

        let hud = Hud::default();
        let (publisher, snapshot_rx) = SnapshotPublisher::new(&session, &hud);
        let router = InputRouter::new(session.mode(), session.field());

        let handle = MatchHandle {
            command_tx,
            snapshot_rx,
            shutdown_tx,
        };

        let game_match = Self {
            session,
            router,
            target,
            assets: Assets::default(),
            assets_rx: None,
            hud,
            keeper,
            options,
            command_rx,
            shutdown_rx,
            board_tx,
            board_rx,
            issued: 0,
            applied: 0,
            publisher,
        };

        (game_match, handle)
    }

    /// Sprites arriving after the loop started
    pub fn with_assets(mut self, assets_rx: oneshot::Receiver<Assets>) -> Self {
        self.assets_rx = Some(assets_rx);
        self
    }

    /// Run until stopped. Returns the final session.
    pub async fn run(mut self) -> Result<MatchSession, DisplayError> {
        info!(
            mode = ?self.session.mode(),
            seed = self.session.seed(),
            room_id = ?self.options.room_id,
            "Match task started"
        );

        self.spawn_board_load();
        self.draw()?;

        let period = tick_period(self.options.tick_rate);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();
        let mut assets_rx = self.assets_rx.take();

        loop {
            let was_playing = self.session.is_playing();

            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }

                command = self.command_rx.recv() => {
                    let Some(command) = command else { break };
                    self.handle_command(command);
                }

                Some((generation, board)) = self.board_rx.recv() => {
                    self.apply_board(generation, board);
                }

                loaded = recv_assets(&mut assets_rx), if assets_rx.is_some() => {
                    assets_rx = None;
                    if let Some(assets) = loaded {
                        debug!("Assets ready");
                        self.assets = assets;
                    }
                }

                now = ticker.tick(), if self.session.is_playing() => {
                    let dt = frames_between(now.saturating_duration_since(last_tick));
                    last_tick = now;
                    let events = self.session.tick(dt);
                    self.handle_events(&events);
                }
            }

            if !was_playing && self.session.is_playing() {
                ticker.reset();
                last_tick = Instant::now();
            }

            self.draw()?;
        }

        info!(
            ticks = self.session.tick_count(),
            score = self.session.score(),
            snapshots = self.publisher.published(),
            "Match task stopped"
        );
        Ok(self.session)
    }

    fn handle_command(&mut self, command: MatchCommand) {
        let event = match command {
            MatchCommand::Input(input) => self.router.dispatch(&mut self.session, &input),
            MatchCommand::Start => self.session.start(),
            MatchCommand::Resize { cols, rows } => {
                self.target.resize(cols, rows);
                None
            }
        };
        if let Some(event) = event {
            self.handle_events(&[event]);
        }
    }

    fn handle_events(&mut self, events: &[GameEvent]) {
        for event in events {
            debug!(?event, "Game event");
            match event {
                GameEvent::Started { .. } => self.publisher.publish(&self.session, &self.hud),
                GameEvent::MatchOver { score } => {
                    info!(
                        score,
                        elapsed_secs = self.session.elapsed_secs(),
                        speed = self.session.speed(),
                        "Match over"
                    );
                    self.publisher.publish(&self.session, &self.hud);
                    self.spawn_record(*score);
                }
                _ => {}
            }
        }
    }

    fn apply_board(&mut self, generation: u64, board: CachedScores) {
        if generation <= self.applied {
            debug!(generation, applied = self.applied, "Dropping stale board");
            return;
        }
        self.applied = generation;
        self.hud = Hud::from(board);
        self.publisher.publish(&self.session, &self.hud);
    }

    fn next_generation(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn spawn_board_load(&mut self) {
        let generation = self.next_generation();
        let keeper = self.keeper.clone();
        let board_tx = self.board_tx.clone();
        tokio::spawn(async move {
            let board = keeper.board().await;
            let _ = board_tx.send((generation, board)).await;
        });
    }

    /// Persist off the loop; a result arriving after shutdown is dropped
    fn spawn_record(&mut self, score: u32) {
        let generation = self.next_generation();
        let keeper = self.keeper.clone();
        let board_tx = self.board_tx.clone();
        let room_id = self.options.room_id;
        tokio::spawn(async move {
            let board = keeper.record(score, room_id).await;
            let _ = board_tx.send((generation, board)).await;
        });
    }

    fn draw(&mut self) -> Result<(), DisplayError> {
        render_frame(&self.session, &self.assets, &self.hud, &mut self.target);
        self.target.present()
    }
}

async fn recv_assets(rx: &mut Option<oneshot::Receiver<Assets>>) -> Option<Assets> {
    match rx {
        Some(rx) => rx.await.ok(),
        None => std::future::pending().await,
    }
}
