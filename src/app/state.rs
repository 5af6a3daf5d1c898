//! Application state shared across commands

use std::sync::Arc;

use crate::auth::{Identity, IdentityProvider};
use crate::config::Config;
use crate::store::{LocalScoreCache, PlayerStore, RoomStore, ScoreKeeper, SupabaseClient};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Present when Supabase is configured
    pub supabase: Option<SupabaseClient>,
    pub identity: IdentityProvider,
    pub keeper: ScoreKeeper,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        let supabase = config
            .supabase
            .as_ref()
            .map(|s| SupabaseClient::new(&s.url, &s.anon_key));

        let identity = IdentityProvider::from_config(&config, supabase.clone());
        let local = LocalScoreCache::in_dir(&config.data_dir);
        let keeper = if supabase.is_some() {
            ScoreKeeper::new(local, Some(identity.clone()))
        } else {
            ScoreKeeper::local_only(local)
        };

        Self {
            config,
            supabase,
            identity,
            keeper,
        }
    }

    /// Supabase client or a user-facing error
    pub fn require_supabase(&self) -> anyhow::Result<&SupabaseClient> {
        self.supabase
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Online play needs SUPABASE_URL and SUPABASE_ANON_KEY"))
    }

    /// Room store acting as the signed-in user
    pub fn rooms_for(&self, identity: &Identity) -> anyhow::Result<RoomStore> {
        let client = self.require_supabase()?.clone();
        Ok(RoomStore::new(client.with_access_token(identity.access_token.clone())))
    }

    pub fn players_for(&self, identity: &Identity) -> anyhow::Result<PlayerStore> {
        let client = self.require_supabase()?.clone();
        Ok(PlayerStore::new(client.with_access_token(identity.access_token.clone())))
    }

    /// Anonymous room store for listing
    pub fn rooms(&self) -> anyhow::Result<RoomStore> {
        Ok(RoomStore::new(self.require_supabase()?.clone()))
    }
}
