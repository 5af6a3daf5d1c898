//! Terminal events to match commands

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

use crate::game::input::{InputEvent, Key};
use crate::game::MatchCommand;

use super::canvas::Viewport;

/// What the host loop should do with a terminal event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostAction {
    Command(MatchCommand),
    Quit,
}

fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

fn game_key(code: KeyCode) -> Key {
    match code {
        KeyCode::Char(' ') => Key::Space,
        KeyCode::Up => Key::ArrowUp,
        KeyCode::Char('w') | KeyCode::Char('W') => Key::W,
        KeyCode::Enter => Key::Enter,
        _ => Key::Other,
    }
}

/// Translate one terminal event. None for events the game ignores.
pub fn translate(event: &Event, viewport: &Viewport) -> Option<HostAction> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => {
            if is_quit(key) {
                return Some(HostAction::Quit);
            }
            // Held keys auto-repeat; one flap per press
            if key.kind == KeyEventKind::Repeat {
                return None;
            }
            if matches!(key.code, KeyCode::Char('r') | KeyCode::Char('R')) {
                return Some(HostAction::Command(MatchCommand::Start));
            }
            match game_key(key.code) {
                Key::Other => None,
                k => Some(HostAction::Command(MatchCommand::Input(InputEvent::Key(k)))),
            }
        }
        Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
            Some(HostAction::Command(MatchCommand::Input(InputEvent::Touch {
                x: viewport.logical_x(mouse.column),
            })))
        }
        Event::Resize(cols, rows) => Some(HostAction::Command(MatchCommand::Resize {
            cols: *cols,
            rows: *rows,
        })),
        _ => None,
    }
}
