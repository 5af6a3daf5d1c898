//! Player profiles

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::supabase::{SupabaseClient, SupabaseError};

/// Player row, keyed by the auth user id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub display_name: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
struct NewPlayer<'a> {
    id: Uuid,
    display_name: &'a str,
}

/// Display name derived from an email address
pub fn default_display_name(email: Option<&str>) -> String {
    email
        .and_then(|e| e.split('@').next())
        .filter(|local| !local.is_empty())
        .unwrap_or("player")
        .to_string()
}

/// Player store operations
#[derive(Clone)]
pub struct PlayerStore {
    client: SupabaseClient,
}

impl PlayerStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<Option<Player>, SupabaseError> {
        self.client
            .get_one("players", &format!("id=eq.{}", user_id))
            .await
    }

    /// Get or create the player row
    pub async fn ensure(&self, user_id: Uuid, display_name: &str) -> Result<Player, SupabaseError> {
        match self.get(user_id).await? {
            Some(player) => Ok(player),
            None => {
                let row = NewPlayer {
                    id: user_id,
                    display_name,
                };
                self.client.insert("players", &row).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_uses_the_email_local_part() {
        assert_eq!(default_display_name(Some("ana@example.com")), "ana");
        assert_eq!(default_display_name(Some("@example.com")), "player");
        assert_eq!(default_display_name(None), "player");
    }
}
