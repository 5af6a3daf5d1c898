//! Input routing: keys and touches to per-actor primary actions

use super::field::Playfield;
use super::session::MatchSession;
use super::{GameEvent, PlayMode};

/// Keys the game cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    ArrowUp,
    W,
    Enter,
    Other,
}

/// A discrete input from the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key(Key),
    /// Tap or click at a logical x position
    Touch { x: f32 },
}

/// Maps input events to actor slots for the current mode
#[derive(Debug, Clone, Copy)]
pub struct InputRouter {
    mode: PlayMode,
    width: f32,
}

impl InputRouter {
    pub fn new(mode: PlayMode, field: &Playfield) -> Self {
        Self {
            mode,
            width: field.width,
        }
    }

    /// Which actor slot an event targets, or None for unbound input
    pub fn route(&self, event: &InputEvent) -> Option<usize> {
        match (self.mode, event) {
            (PlayMode::Solo, InputEvent::Key(Key::Space | Key::ArrowUp)) => Some(0),
            (PlayMode::Solo, InputEvent::Touch { .. }) => Some(0),
            (PlayMode::Duo, InputEvent::Key(Key::Space | Key::W)) => Some(0),
            (PlayMode::Duo, InputEvent::Key(Key::ArrowUp | Key::Enter)) => Some(1),
            (PlayMode::Duo, InputEvent::Touch { x }) => Some(if *x < self.width / 2.0 { 0 } else { 1 }),
            _ => None,
        }
    }

    /// Route and apply: start/restart outside Playing, flap inside
    pub fn dispatch(&self, session: &mut MatchSession, event: &InputEvent) -> Option<GameEvent> {
        let slot = self.route(event)?;
        session.primary_action(slot)
    }
}

/// Prompt text naming the bindings of a mode
pub fn key_hint(mode: PlayMode) -> &'static str {
    match mode {
        PlayMode::Solo => "[Space] or [Up]",
        PlayMode::Duo => "P1 [Space]/[W]  P2 [Up]/[Enter]",
    }
}
