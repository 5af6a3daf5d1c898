//! Score records

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::supabase::{SupabaseClient, SupabaseError};

const TABLE: &str = "scores";

/// Score row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub score: u32,
    pub room_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// New score for insertion
#[derive(Debug, Clone, Serialize)]
pub struct NewScore {
    pub user_id: Uuid,
    pub score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct ScoreOnly {
    score: u32,
}

/// Score store operations
#[derive(Clone)]
pub struct ScoreStore {
    client: SupabaseClient,
}

impl ScoreStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    pub async fn record(
        &self,
        user_id: Uuid,
        score: u32,
        room_id: Option<Uuid>,
    ) -> Result<ScoreRecord, SupabaseError> {
        let row = NewScore {
            user_id,
            score,
            room_id,
        };
        self.client.insert(TABLE, &row).await
    }

    /// Highest recorded score
    pub async fn best(&self, user_id: Uuid) -> Result<Option<u32>, SupabaseError> {
        let query = format!("select=score&user_id=eq.{}&order=score.desc&limit=1", user_id);
        let rows: Vec<ScoreOnly> = self.client.get(TABLE, &query).await?;
        Ok(rows.first().map(|r| r.score))
    }

    /// Most recent scores, newest first
    pub async fn history(&self, user_id: Uuid, limit: usize) -> Result<Vec<u32>, SupabaseError> {
        let query = format!(
            "select=score&user_id=eq.{}&order=created_at.desc&limit={}",
            user_id, limit
        );
        let rows: Vec<ScoreOnly> = self.client.get(TABLE, &query).await?;
        Ok(rows.into_iter().map(|r| r.score).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solo_scores_omit_the_room() {
        let row = NewScore {
            user_id: Uuid::nil(),
            score: 4,
            room_id: None,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["score"], 4);
        assert!(json.get("room_id").is_none());
    }
}
