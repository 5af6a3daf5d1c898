//! Match session: the Ready / Playing / GameOver state machine and the tick

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::util::time::{frames_to_secs, MAX_FRAME_DELTA};

use super::collision::CollisionSystem;
use super::field::Playfield;
use super::obstacles::{Obstacle, ObstacleGenerator, ObstacleStats};
use super::physics::{Actor, BoundaryContact, Difficulty, PhysicsSystem, PhysicsTier};
use super::{DeathCause, GameEvent, PlayMode};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    /// Waiting for the first start impulse
    Ready,
    /// Simulation running
    Playing,
    /// Everyone is down, score frozen
    GameOver,
}

/// Tunables a session is built from
#[derive(Debug, Clone, Copy)]
pub struct SessionSetup {
    pub field: Playfield,
    pub tier: PhysicsTier,
    pub obstacles: ObstacleStats,
}

impl SessionSetup {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self {
            field: Playfield::default(),
            tier: PhysicsTier::for_difficulty(difficulty),
            obstacles: ObstacleStats::default(),
        }
    }
}

/// Invalid session tunables
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SetupError {
    #[error("a gap of {gap_height} with margin {gap_margin} does not fit above the ground at {ground_y}")]
    GapDoesNotFit {
        gap_height: f32,
        gap_margin: f32,
        ground_y: f32,
    },
}

/// State for one play-through, owned by the match loop
pub struct MatchSession {
    mode: PlayMode,
    field: Playfield,
    tier: PhysicsTier,
    generator: ObstacleGenerator,
    state: MatchState,
    actors: Vec<Actor>,
    obstacles: Vec<Obstacle>,
    tick: u64,
    elapsed_secs: f32,
    speed: f32,
    score: u32,
    show_score: u32,
    seed: u64,
}

impl MatchSession {
    pub fn new(mode: PlayMode, difficulty: Difficulty, seed: u64) -> Result<Self, SetupError> {
        Self::with_setup(mode, SessionSetup::for_difficulty(difficulty), seed)
    }

    /// Session from custom tunables. Rejects a playfield too small for the gap.
    pub fn with_setup(mode: PlayMode, setup: SessionSetup, seed: u64) -> Result<Self, SetupError> {
        if !setup.obstacles.fits(&setup.field) {
            return Err(SetupError::GapDoesNotFit {
                gap_height: setup.obstacles.gap_height,
                gap_margin: setup.obstacles.gap_margin,
                ground_y: setup.field.ground_y(),
            });
        }

        let generator = ObstacleGenerator::new(setup.obstacles, ChaCha8Rng::seed_from_u64(seed));
        let actors = spawn_actors(mode, &setup.field);
        let speed = setup.obstacles.speed_at(0.0);

        Ok(Self {
            mode,
            field: setup.field,
            tier: setup.tier,
            generator,
            state: MatchState::Ready,
            actors,
            obstacles: Vec::new(),
            tick: 0,
            elapsed_secs: 0.0,
            speed,
            score: 0,
            show_score: 0,
            seed,
        })
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == MatchState::Playing
    }

    pub fn field(&self) -> &Playfield {
        &self.field
    }

    pub fn obstacle_stats(&self) -> &ObstacleStats {
        self.generator.stats()
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Score frozen at the last Playing -> GameOver edge
    pub fn show_score(&self) -> u32 {
        self.show_score
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed_secs
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Ready/GameOver -> Playing with a full reset. Ignored while Playing.
    pub fn start(&mut self) -> Option<GameEvent> {
        if self.state == MatchState::Playing {
            return None;
        }

        self.actors = spawn_actors(self.mode, &self.field);
        self.obstacles.clear();
        self.generator.reset();
        self.tick = 0;
        self.elapsed_secs = 0.0;
        self.speed = self.generator.stats().speed_at(0.0);
        self.score = 0;
        self.show_score = 0;
        self.state = MatchState::Playing;

        info!(mode = ?self.mode, seed = self.seed, "Match started");
        Some(GameEvent::Started { mode: self.mode })
    }

    /// Context-dependent primary action: start, flap or restart
    pub fn primary_action(&mut self, slot: usize) -> Option<GameEvent> {
        match self.state {
            MatchState::Ready | MatchState::GameOver => self.start(),
            MatchState::Playing => {
                let tier = self.tier;
                let actor = self.actors.iter_mut().find(|a| a.slot == slot && a.alive)?;
                PhysicsSystem::apply_impulse(actor, &tier);
                Some(GameEvent::Flap { slot })
            }
        }
    }

    /// Advance the simulation by `dt_frames`. No-op unless Playing.
    pub fn tick(&mut self, dt_frames: f32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.state != MatchState::Playing {
            return events;
        }

        let dt = if dt_frames.is_finite() {
            dt_frames.clamp(0.0, MAX_FRAME_DELTA)
        } else {
            1.0
        };

        self.tick += 1;
        self.elapsed_secs += frames_to_secs(dt);
        self.speed = self.generator.stats().speed_at(self.elapsed_secs);

        // Physics and boundaries
        for actor in self.actors.iter_mut().filter(|a| a.alive) {
            PhysicsSystem::integrate(actor, &self.tier, dt);
            if PhysicsSystem::apply_bounds(actor, &self.field) == BoundaryContact::Ground {
                events.push(GameEvent::ActorDown {
                    slot: actor.slot,
                    cause: DeathCause::Ground,
                });
            }
        }

        // Obstacles
        if self
            .generator
            .advance(&mut self.obstacles, &self.field, self.speed, dt)
        {
            trace!(tick = self.tick, count = self.obstacles.len(), "Obstacle spawned");
        }

        let width = self.generator.stats().width;
        for actor in self.actors.iter_mut().filter(|a| a.alive) {
            if CollisionSystem::hits_any(actor, &self.obstacles, &self.field, width) {
                actor.alive = false;
                events.push(GameEvent::ActorDown {
                    slot: actor.slot,
                    cause: DeathCause::Obstacle,
                });
            }
        }

        // Shared score keyed off the leading live actor
        if let Some(lead_x) = CollisionSystem::leading_x(&self.actors) {
            let passed =
                CollisionSystem::score_passes(&mut self.obstacles, lead_x, self.speed * dt, width);
            for _ in 0..passed {
                self.score += 1;
                events.push(GameEvent::Passed { score: self.score });
            }
        }

        for event in &events {
            if let GameEvent::ActorDown { slot, cause } = event {
                debug!(slot, ?cause, tick = self.tick, "Actor down");
            }
        }

        if self.actors.iter().all(|a| !a.alive) {
            self.state = MatchState::GameOver;
            self.show_score = self.score;
            info!(score = self.show_score, ticks = self.tick, "Match over");
            events.push(GameEvent::MatchOver { score: self.show_score });
        }

        events
    }
}

fn spawn_actors(mode: PlayMode, field: &Playfield) -> Vec<Actor> {
    (0..mode.actor_count())
        .map(|slot| Actor::spawn(slot, field))
        .collect()
}
