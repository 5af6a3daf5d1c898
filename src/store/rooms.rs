//! Multiplayer rooms

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::supabase::{Subscription, SupabaseClient, SupabaseError};

/// Players a room admits
pub const ROOM_CAPACITY: usize = 2;

const TABLE: &str = "rooms";
const LIST_QUERY: &str = "select=*&order=created_at.desc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    #[default]
    Waiting,
    Playing,
}

impl RoomStatus {
    pub fn for_player_count(count: usize) -> Self {
        if count >= ROOM_CAPACITY {
            Self::Playing
        } else {
            Self::Waiting
        }
    }
}

/// Room row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub owner: Uuid,
    #[serde(default)]
    pub players: Vec<Uuid>,
    #[serde(default)]
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
}

/// Patch applied when a player joins
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomAdmission {
    pub players: Vec<Uuid>,
    pub status: RoomStatus,
}

impl Room {
    pub fn is_full(&self) -> bool {
        self.players.len() >= ROOM_CAPACITY
    }

    /// Player list after `user` joins. None when the user is already in.
    pub fn admit(&self, user: Uuid) -> Result<Option<RoomAdmission>, RoomError> {
        if self.players.contains(&user) {
            return Ok(None);
        }
        if self.is_full() {
            return Err(RoomError::Full(self.id));
        }

        let mut players = self.players.clone();
        players.push(user);
        Ok(Some(RoomAdmission {
            status: RoomStatus::for_player_count(players.len()),
            players,
        }))
    }
}

/// `Room-NNNN` with a four-digit suffix
pub fn generate_room_name<R: Rng>(rng: &mut R) -> String {
    format!("Room-{}", rng.gen_range(1000..=9999))
}

/// Room store operations
#[derive(Clone)]
pub struct RoomStore {
    client: SupabaseClient,
}

impl RoomStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// All rooms, newest first
    pub async fn list(&self) -> Result<Vec<Room>, SupabaseError> {
        self.client.get(TABLE, LIST_QUERY).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Room>, SupabaseError> {
        self.client.get_one(TABLE, &format!("id=eq.{}", id)).await
    }

    /// Create a waiting room owned by (and containing) `owner`
    pub async fn create(&self, owner: Uuid) -> Result<Room, SupabaseError> {
        let room = Room {
            id: Uuid::new_v4(),
            name: generate_room_name(&mut rand::thread_rng()),
            owner,
            players: vec![owner],
            status: RoomStatus::Waiting,
            created_at: Utc::now(),
        };
        let created: Room = self.client.insert(TABLE, &room).await?;
        info!(room_id = %created.id, name = %created.name, "Room created");
        Ok(created)
    }

    /// Add `user` to a room
    pub async fn join(&self, id: Uuid, user: Uuid) -> Result<Room, RoomError> {
        let room = self.get(id).await?.ok_or(RoomError::NotFound(id))?;

        let Some(admission) = room.admit(user)? else {
            return Ok(room);
        };

        let rows: Vec<Room> = self
            .client
            .update(TABLE, &format!("id=eq.{}", id), &admission)
            .await?;
        let joined = rows.into_iter().next().ok_or(RoomError::NotFound(id))?;
        info!(room_id = %id, user_id = %user, players = joined.players.len(), "Joined room");
        Ok(joined)
    }

    /// Watch the room list, newest first
    pub fn watch<F>(&self, period: Duration, on_change: F) -> Subscription
    where
        F: FnMut(&[Room]) + Send + 'static,
    {
        self.client.subscribe(TABLE, LIST_QUERY, period, on_change)
    }
}

/// Room errors
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("Room {0} not found")]
    NotFound(Uuid),

    #[error("Room {0} is full")]
    Full(Uuid),

    #[error(transparent)]
    Store(#[from] SupabaseError),
}
