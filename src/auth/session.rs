//! Password sign-in and the saved session file

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::store::SupabaseClient;

use super::AuthError;

/// Session persisted between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSession {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds
    #[serde(default)]
    pub expires_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: AuthUser,
}

/// Sign-up answers with a session, or only a user when email confirmation is on
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(AuthUser),
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

impl From<TokenResponse> for SavedSession {
    fn from(token: TokenResponse) -> Self {
        Self {
            user_id: token.user.id,
            email: token.user.email,
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token
                .expires_in
                .map(|secs| chrono::Utc::now().timestamp() + secs),
        }
    }
}

pub async fn sign_in(
    client: &SupabaseClient,
    email: &str,
    password: &str,
) -> Result<SavedSession, AuthError> {
    let token: TokenResponse = client
        .auth_post("token?grant_type=password", &Credentials { email, password })
        .await?;
    info!(user_id = %token.user.id, "Signed in");
    Ok(token.into())
}

pub async fn sign_up(
    client: &SupabaseClient,
    email: &str,
    password: &str,
) -> Result<SavedSession, AuthError> {
    let response: SignUpResponse = client
        .auth_post("signup", &Credentials { email, password })
        .await?;
    match response {
        SignUpResponse::Session(token) => {
            info!(user_id = %token.user.id, "Registered");
            Ok(token.into())
        }
        SignUpResponse::User(user) => {
            info!(user_id = %user.id, "Registered, awaiting email confirmation");
            Err(AuthError::ConfirmationRequired(email.to_string()))
        }
    }
}

/// The session file on disk
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Option<SavedSession>, AuthError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, session: &SavedSession) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(session)?).await?;
        Ok(())
    }

    /// Forget the saved session. Returns false if there was none.
    pub async fn remove(&self) -> Result<bool, AuthError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_file() -> SessionFile {
        let dir = std::env::temp_dir().join(format!("flappy-session-{}", Uuid::new_v4()));
        SessionFile::new(dir.join("session.json"))
    }

    #[tokio::test]
    async fn save_load_remove() {
        let file = temp_file();
        assert_eq!(file.load().await.unwrap(), None);

        let session = SavedSession {
            user_id: Uuid::new_v4(),
            email: Some("a@b.c".to_string()),
            access_token: "tok".to_string(),
            refresh_token: None,
            expires_at: Some(10),
        };
        file.save(&session).await.unwrap();
        assert_eq!(file.load().await.unwrap(), Some(session));

        assert!(file.remove().await.unwrap());
        assert!(!file.remove().await.unwrap());
    }

    #[test]
    fn sign_up_distinguishes_pending_confirmation() {
        let id = Uuid::new_v4();
        let pending: SignUpResponse =
            serde_json::from_value(json!({ "id": id, "email": "a@b.c" })).unwrap();
        assert!(matches!(pending, SignUpResponse::User(u) if u.id == id));

        let session: SignUpResponse = serde_json::from_value(json!({
            "access_token": "tok",
            "refresh_token": "ref",
            "expires_in": 3600,
            "user": { "id": id, "email": "a@b.c" }
        }))
        .unwrap();
        let SignUpResponse::Session(token) = session else {
            panic!("expected a session");
        };
        let saved = SavedSession::from(token);
        assert_eq!(saved.user_id, id);
        assert!(saved.expires_at.unwrap() > chrono::Utc::now().timestamp());
    }
}
