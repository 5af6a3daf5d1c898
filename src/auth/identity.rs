//! Current-user resolution

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::store::SupabaseClient;
use crate::util::time::unix_secs;

use super::jwt::verify_jwt;
use super::session::{AuthUser, SessionFile};

/// An authenticated user
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub access_token: String,
}

/// Resolves the signed-in user once per process, on demand again via `refresh`
#[derive(Clone)]
pub struct IdentityProvider {
    inner: Arc<Inner>,
}

struct Inner {
    client: Option<SupabaseClient>,
    jwt_secret: Option<String>,
    configured_token: Option<String>,
    session_file: SessionFile,
    resolved: Mutex<Option<Option<Identity>>>,
}

impl IdentityProvider {
    pub fn new(
        client: Option<SupabaseClient>,
        jwt_secret: Option<String>,
        configured_token: Option<String>,
        session_file: SessionFile,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                jwt_secret,
                configured_token,
                session_file,
                resolved: Mutex::new(None),
            }),
        }
    }

    pub fn from_config(config: &Config, client: Option<SupabaseClient>) -> Self {
        let supabase = config.supabase.as_ref();
        Self::new(
            client,
            supabase.and_then(|s| s.jwt_secret.clone()),
            supabase.and_then(|s| s.access_token.clone()),
            SessionFile::new(config.session_file()),
        )
    }

    pub fn session_file(&self) -> &SessionFile {
        &self.inner.session_file
    }

    /// Signed-in user, resolved on first use
    pub async fn current(&self) -> Option<Identity> {
        let mut resolved = self.inner.resolved.lock().await;
        if let Some(identity) = resolved.as_ref() {
            return identity.clone();
        }
        let identity = self.resolve().await;
        *resolved = Some(identity.clone());
        identity
    }

    pub async fn current_user_id(&self) -> Option<Uuid> {
        self.current().await.map(|i| i.user_id)
    }

    /// Re-check the user, e.g. after signing in or out
    pub async fn refresh(&self) -> Option<Identity> {
        let mut resolved = self.inner.resolved.lock().await;
        let identity = self.resolve().await;
        *resolved = Some(identity.clone());
        identity
    }

    /// A client acting as the given user
    pub fn client_for(&self, identity: &Identity) -> Option<SupabaseClient> {
        self.inner
            .client
            .clone()
            .map(|c| c.with_access_token(identity.access_token.clone()))
    }

    async fn resolve(&self) -> Option<Identity> {
        let token = match &self.inner.configured_token {
            Some(token) => token.clone(),
            None => match self.inner.session_file.load().await {
                Ok(Some(session)) => session.access_token,
                Ok(None) => {
                    debug!("No saved session");
                    return None;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read saved session");
                    return None;
                }
            },
        };

        if let Some(secret) = &self.inner.jwt_secret {
            return match verify_jwt(&token, secret, unix_secs()) {
                Ok(claims) => {
                    info!(user_id = %claims.sub, "Identity verified locally");
                    Some(Identity {
                        user_id: claims.sub,
                        email: claims.email,
                        access_token: token,
                    })
                }
                Err(e) => {
                    warn!(error = %e, "Access token rejected");
                    None
                }
            };
        }

        let client = self.inner.client.clone()?;
        match client
            .with_access_token(token.clone())
            .auth_get::<AuthUser>("user")
            .await
        {
            Ok(user) => {
                info!(user_id = %user.id, "Identity verified by auth server");
                Some(Identity {
                    user_id: user.id,
                    email: user.email,
                    access_token: token,
                })
            }
            Err(e) => {
                warn!(error = %e, "Failed to verify access token");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::sign_for_test;
    use crate::auth::session::SavedSession;
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn session_file() -> SessionFile {
        let dir = std::env::temp_dir().join(format!("flappy-identity-{}", Uuid::new_v4()));
        SessionFile::new(dir.join("session.json"))
    }

    fn token_for(user: Uuid, exp: u64) -> String {
        sign_for_test(&json!({ "sub": user, "exp": exp }), SECRET)
    }

    #[tokio::test]
    async fn configured_token_is_verified_with_the_secret() {
        let user = Uuid::new_v4();
        let provider = IdentityProvider::new(
            None,
            Some(SECRET.to_string()),
            Some(token_for(user, unix_secs() + 600)),
            session_file(),
        );
        assert_eq!(provider.current_user_id().await, Some(user));
    }

    #[tokio::test]
    async fn expired_token_means_signed_out() {
        let provider = IdentityProvider::new(
            None,
            Some(SECRET.to_string()),
            Some(token_for(Uuid::new_v4(), 1)),
            session_file(),
        );
        assert_eq!(provider.current().await, None);
    }

    #[tokio::test]
    async fn resolution_is_cached_until_refresh() {
        let file = session_file();
        let provider =
            IdentityProvider::new(None, Some(SECRET.to_string()), None, file.clone());
        assert_eq!(provider.current().await, None);

        let user = Uuid::new_v4();
        file.save(&SavedSession {
            user_id: user,
            email: None,
            access_token: token_for(user, unix_secs() + 600),
            refresh_token: None,
            expires_at: None,
        })
        .await
        .unwrap();

        assert_eq!(provider.current().await, None);
        assert_eq!(provider.refresh().await.map(|i| i.user_id), Some(user));
        assert_eq!(provider.current_user_id().await, Some(user));
    }

    #[tokio::test]
    async fn without_secret_or_server_nobody_is_signed_in() {
        let provider = IdentityProvider::new(None, None, Some("token".to_string()), session_file());
        assert_eq!(provider.current().await, None);
    }
}
