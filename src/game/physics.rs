//! Actor physics: gravity, flap impulse and playfield bounds

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::field::Playfield;

/// Difficulty tiers selectable per run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Floaty, gentle flaps
    Easy,
    #[default]
    Normal,
    /// Heavy, sharp flaps
    Hard,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "normal" => Ok(Self::Normal),
            "hard" => Ok(Self::Hard),
            other => Err(format!("unknown difficulty '{}' (easy, normal, hard)", other)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
        };
        f.write_str(name)
    }
}

/// Physics constants per difficulty tier, in world units per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsTier {
    /// Downward acceleration per frame
    pub gravity: f32,
    /// Velocity set by a flap (negative is up)
    pub impulse: f32,
    /// Speed cap in either direction
    pub terminal_velocity: f32,
}

impl PhysicsTier {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                gravity: 0.5,
                impulse: -8.0,
                terminal_velocity: 30.0,
            },
            Difficulty::Normal => Self {
                gravity: 0.6,
                impulse: -9.0,
                terminal_velocity: 30.0,
            },
            Difficulty::Hard => Self {
                gravity: 0.7,
                impulse: -10.0,
                terminal_velocity: 30.0,
            },
        }
    }
}

/// Display identity of an actor slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorColor {
    Yellow,
    Coral,
}

impl ActorColor {
    pub fn for_slot(slot: usize) -> Self {
        if slot == 0 {
            Self::Yellow
        } else {
            Self::Coral
        }
    }
}

/// A controllable flying entity
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub slot: usize,
    pub color: ActorColor,
    /// Horizontal position, fixed per slot
    pub x: f32,
    /// Vertical center position
    pub y: f32,
    pub vel_y: f32,
    pub alive: bool,
}

impl Actor {
    /// Spawn an actor for a slot, vertically centered and at rest
    pub fn spawn(slot: usize, field: &Playfield) -> Self {
        Self {
            slot,
            color: ActorColor::for_slot(slot),
            x: field.slot_x(slot),
            y: field.spawn_y(),
            vel_y: 0.0,
            alive: true,
        }
    }

    pub fn top(&self, field: &Playfield) -> f32 {
        self.y - field.actor_half()
    }

    pub fn bottom(&self, field: &Playfield) -> f32 {
        self.y + field.actor_half()
    }
}

/// Which boundary an actor touched this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryContact {
    None,
    /// Clamped against the top of the playfield
    Ceiling,
    /// Hit the ground and died
    Ground,
}

/// Physics system for integrating actors
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Apply gravity to velocity, then velocity to position.
    /// Dead actors do not move.
    pub fn integrate(actor: &mut Actor, tier: &PhysicsTier, dt_frames: f32) {
        if !actor.alive {
            return;
        }

        actor.vel_y = (actor.vel_y + tier.gravity * dt_frames)
            .clamp(-tier.terminal_velocity, tier.terminal_velocity);
        actor.y += actor.vel_y * dt_frames;
    }

    /// Flap: overwrite velocity with the tier impulse
    pub fn apply_impulse(actor: &mut Actor, tier: &PhysicsTier) {
        actor.vel_y = tier.impulse;
    }

    /// Soft ceiling, lethal floor
    pub fn apply_bounds(actor: &mut Actor, field: &Playfield) -> BoundaryContact {
        if !actor.alive {
            return BoundaryContact::None;
        }

        // NaN compares false everywhere, so catch it before the range checks
        if !actor.y.is_finite() || actor.y >= field.floor_limit() {
            actor.alive = false;
            return BoundaryContact::Ground;
        }

        if actor.y < field.ceiling_limit() {
            actor.y = field.ceiling_limit();
            actor.vel_y = 0.0;
            return BoundaryContact::Ceiling;
        }

        BoundaryContact::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal() -> PhysicsTier {
        PhysicsTier::for_difficulty(Difficulty::Normal)
    }

    #[test]
    fn gravity_applies_before_position() {
        let field = Playfield::default();
        let mut actor = Actor::spawn(0, &field);
        PhysicsSystem::integrate(&mut actor, &normal(), 1.0);
        assert_eq!(actor.vel_y, 0.6);
        assert_eq!(actor.y, 300.6);
    }

    #[test]
    fn impulse_overwrites_velocity() {
        let field = Playfield::default();
        let mut actor = Actor::spawn(0, &field);
        actor.vel_y = 14.0;
        PhysicsSystem::apply_impulse(&mut actor, &normal());
        assert_eq!(actor.vel_y, -9.0);
    }

    #[test]
    fn dead_actors_stay_put() {
        let field = Playfield::default();
        let mut actor = Actor::spawn(0, &field);
        actor.alive = false;
        PhysicsSystem::integrate(&mut actor, &normal(), 1.0);
        assert_eq!(actor.y, 300.0);
        assert_eq!(actor.vel_y, 0.0);
    }

    #[test]
    fn velocity_is_capped() {
        let field = Playfield::default();
        let mut actor = Actor::spawn(0, &field);
        actor.vel_y = 29.9;
        PhysicsSystem::integrate(&mut actor, &normal(), 3.0);
        assert_eq!(actor.vel_y, 30.0);
    }

    #[test]
    fn ceiling_clamps_without_killing() {
        let field = Playfield::default();
        let mut actor = Actor::spawn(0, &field);
        actor.y = 10.0;
        actor.vel_y = -9.0;
        let contact = PhysicsSystem::apply_bounds(&mut actor, &field);
        assert_eq!(contact, BoundaryContact::Ceiling);
        assert!(actor.alive);
        assert_eq!(actor.y, field.ceiling_limit());
        assert_eq!(actor.vel_y, 0.0);
    }

    #[test]
    fn floor_is_lethal_at_the_limit() {
        let field = Playfield::default();
        let mut actor = Actor::spawn(0, &field);
        actor.y = field.floor_limit();
        assert_eq!(PhysicsSystem::apply_bounds(&mut actor, &field), BoundaryContact::Ground);
        assert!(!actor.alive);
    }

    #[test]
    fn non_finite_position_counts_as_ground() {
        let field = Playfield::default();
        let mut actor = Actor::spawn(0, &field);
        actor.y = f32::NAN;
        assert_eq!(PhysicsSystem::apply_bounds(&mut actor, &field), BoundaryContact::Ground);
        assert!(!actor.alive);
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("HARD".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("brutal".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::Easy.to_string(), "easy");
    }
}
