//! Lobby: listing, watching, creating and joining rooms

use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::app::{commands, AppState};
use crate::auth::{AuthError, Identity};
use crate::game::PlayMode;
use crate::store::rooms::{RoomStatus, ROOM_CAPACITY};
use crate::store::{Room, RoomError};

/// Pause before falling back to the lobby after a failed join
pub const NOT_FOUND_REDIRECT: Duration = Duration::from_secs(2);

/// Poll period of `lobby --watch`
pub const WATCH_PERIOD: Duration = Duration::from_secs(2);

/// One line per room for the terminal listing
pub fn format_room(room: &Room) -> String {
    let status = match room.status {
        RoomStatus::Waiting => "waiting",
        RoomStatus::Playing => "playing",
    };
    format!(
        "{:<10} {:<8} {}/{}  {}",
        room.name,
        status,
        room.players.len(),
        ROOM_CAPACITY,
        room.id
    )
}

pub fn format_rooms(rooms: &[Room]) -> String {
    if rooms.is_empty() {
        return "No rooms yet. Create one with `flappy room create`.\n".to_string();
    }
    rooms.iter().map(|r| format_room(r) + "\n").collect()
}

/// Signed-in user, or a login prompt
async fn require_identity(state: &AppState) -> anyhow::Result<Identity> {
    state.require_supabase()?;
    match state.identity.current().await {
        Some(identity) => Ok(identity),
        None => Err(AuthError::NotSignedIn.into()),
    }
}

pub async fn list(state: &AppState) -> anyhow::Result<()> {
    let rooms = state.rooms()?.list().await?;
    print!("{}", format_rooms(&rooms));
    Ok(())
}

/// Re-print the room list on every change until Ctrl-C
pub async fn watch(state: &AppState) -> anyhow::Result<()> {
    let rooms = state.rooms()?;
    let subscription = rooms.watch(WATCH_PERIOD, |rooms| {
        println!("-- {} --", chrono::Local::now().format("%H:%M:%S"));
        print!("{}", format_rooms(rooms));
    });

    tokio::signal::ctrl_c().await?;
    subscription.cancel();
    Ok(())
}

pub async fn create(state: &AppState) -> anyhow::Result<()> {
    let identity = require_identity(state).await?;
    let room = state.rooms_for(&identity)?.create(identity.user_id).await?;
    println!("Created {} ({})", room.name, room.id);
    println!("Share the id; join with `flappy room join {}`", room.id);
    Ok(())
}

/// Join a room and play a two-actor match scored against it
pub async fn join(state: &AppState, room_id: Uuid) -> anyhow::Result<()> {
    let identity = require_identity(state).await?;
    let rooms = state.rooms_for(&identity)?;

    let room = match rooms.join(room_id, identity.user_id).await {
        Ok(room) => room,
        Err(RoomError::NotFound(id)) => {
            warn!(room_id = %id, "Room not found");
            println!("Room not found. Returning to the lobby...");
            tokio::time::sleep(NOT_FOUND_REDIRECT).await;
            return list(state).await;
        }
        Err(e) => return Err(e.into()),
    };

    info!(room_id = %room.id, players = room.players.len(), "Entering room");
    println!("Room {} ({}/{} players)", room.name, room.players.len(), ROOM_CAPACITY);

    commands::play(
        state,
        PlayMode::Duo,
        state.config.difficulty,
        None,
        Some(room.id),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn room_lines_show_occupancy() {
        let room = Room {
            id: Uuid::nil(),
            name: "Room-4821".to_string(),
            owner: Uuid::nil(),
            players: vec![Uuid::nil()],
            status: RoomStatus::Waiting,
            created_at: Utc::now(),
        };
        assert_eq!(
            format_room(&room),
            format!("Room-4821  waiting  1/2  {}", Uuid::nil())
        );
    }

    #[test]
    fn empty_lobby_suggests_creating() {
        assert!(format_rooms(&[]).contains("room create"));
    }
}
