//! Best-score bookkeeping across the local cache and Supabase
//!
//! Every finished match lands in the local cache first. When a user is signed
//! in the score is also inserted remotely and the board is read back from the
//! `scores` table. Remote failures are logged and the cached board is used, so
//! a failed write never wipes the displayed best.

use std::future::Future;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::{Identity, IdentityProvider};

use super::local::{CachedScores, LocalScoreCache, HISTORY_CAP};
use super::scores::ScoreStore;
use super::supabase::SupabaseError;

#[derive(Clone)]
pub struct ScoreKeeper {
    local: LocalScoreCache,
    identity: Option<IdentityProvider>,
}

impl ScoreKeeper {
    pub fn new(local: LocalScoreCache, identity: Option<IdentityProvider>) -> Self {
        Self { local, identity }
    }

    pub fn local_only(local: LocalScoreCache) -> Self {
        Self::new(local, None)
    }

    /// Current best and history
    pub async fn board(&self) -> CachedScores {
        let cached = self.cached().await;
        self.with_remote(cached).await
    }

    /// Store a finished match and return the updated board
    pub async fn record(&self, score: u32, room_id: Option<Uuid>) -> CachedScores {
        let cached = match self.local.record(score).await {
            Ok(scores) => scores,
            Err(e) => {
                warn!(score, path = %self.local.path().display(), error = %e, "Failed to write local score cache");
                let mut scores = self.cached().await;
                scores.push(score);
                scores
            }
        };

        if let Some((identity, store)) = self.remote().await {
            match store.record(identity.user_id, score, room_id).await {
                Ok(record) => debug!(score, record_id = %record.id, "Score stored"),
                Err(e) => warn!(score, error = %e, "Failed to store score remotely"),
            }
        }

        self.with_remote(cached).await
    }

    async fn cached(&self) -> CachedScores {
        self.local.load().await.unwrap_or_else(|e| {
            warn!(path = %self.local.path().display(), error = %e, "Failed to read local score cache");
            CachedScores::default()
        })
    }

    async fn remote(&self) -> Option<(Identity, ScoreStore)> {
        let provider = self.identity.as_ref()?;
        let identity = provider.current().await?;
        let client = provider.client_for(&identity)?;
        Some((identity, ScoreStore::new(client)))
    }

    /// Prefer the remote board, fall back to `cached`
    async fn with_remote(&self, cached: CachedScores) -> CachedScores {
        let Some((identity, store)) = self.remote().await else {
            return cached;
        };

        match fetch_board(&store, identity.user_id).await {
            Ok(remote) => {
                let best = match (remote.best, cached.best) {
                    (Some(r), Some(c)) => Some(r.max(c)),
                    (r, c) => r.or(c),
                };
                if best != cached.best {
                    let synced = CachedScores {
                        best,
                        history: cached.history.clone(),
                    };
                    if let Err(e) = self.local.save(&synced).await {
                        warn!(error = %e, "Failed to sync local score cache");
                    }
                }
                CachedScores {
                    best,
                    history: remote.history,
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to load scores, using local cache");
                cached
            }
        }
    }
}

/// Where a match loads its board and records finished scores
pub trait Scoreboard: Clone + Send + Sync + 'static {
    fn board(&self) -> impl Future<Output = CachedScores> + Send;

    fn record(&self, score: u32, room_id: Option<Uuid>) -> impl Future<Output = CachedScores> + Send;
}

impl Scoreboard for ScoreKeeper {
    fn board(&self) -> impl Future<Output = CachedScores> + Send {
        ScoreKeeper::board(self)
    }

    fn record(&self, score: u32, room_id: Option<Uuid>) -> impl Future<Output = CachedScores> + Send {
        ScoreKeeper::record(self, score, room_id)
    }
}

async fn fetch_board(store: &ScoreStore, user_id: Uuid) -> Result<CachedScores, SupabaseError> {
    Ok(CachedScores {
        best: store.best(user_id).await?,
        history: store.history(user_id, HISTORY_CAP).await?,
    })
}
