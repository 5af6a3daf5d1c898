//! Supabase REST client (PostgREST + GoTrue) using the anon key
//!
//! Requests carry the project anon key as `apikey` and, once a user has signed
//! in, the user's access token as the bearer so row-level security applies to
//! that user. Without a token the anon key doubles as the bearer.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Supabase client for database and auth operations
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: None,
        }
    }

    /// Same client, acting as the user owning `token`
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Get the REST API URL for a table
    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", bearer))
            .header("Content-Type", "application/json")
    }

    async fn send(request: RequestBuilder) -> Result<Response, SupabaseError> {
        let response = request.send().await.map_err(SupabaseError::Request)?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Query rows: `query` is a PostgREST filter/order string
    pub async fn get<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
    ) -> Result<Vec<T>, SupabaseError> {
        let url = format!("{}?{}", self.rest_url(table), query);
        let response = Self::send(self.authed(self.client.get(&url))).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }

    /// Query expecting at most a single row
    pub async fn get_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
    ) -> Result<Option<T>, SupabaseError> {
        let url = format!("{}?{}", self.rest_url(table), query);
        let request = self
            .authed(self.client.get(&url))
            .header("Accept", "application/vnd.pgrst.object+json");

        let response = request.send().await.map_err(SupabaseError::Request)?;
        if response.status() == StatusCode::NOT_ACCEPTABLE {
            // No rows found
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map(Some).map_err(SupabaseError::Parse)
    }

    /// Insert a row and return the stored representation
    pub async fn insert<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        data: &T,
    ) -> Result<R, SupabaseError> {
        let request = self
            .authed(self.client.post(self.rest_url(table)))
            .header("Prefer", "return=representation")
            .json(data);
        let response = Self::send(request).await?;

        // PostgREST returns an array, get first element
        let rows: Vec<R> = response.json().await.map_err(SupabaseError::Parse)?;
        rows.into_iter().next().ok_or(SupabaseError::NoRowReturned)
    }

    /// Patch matching rows and return them
    pub async fn update<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
        data: &T,
    ) -> Result<Vec<R>, SupabaseError> {
        let url = format!("{}?{}", self.rest_url(table), query);
        let request = self
            .authed(self.client.patch(&url))
            .header("Prefer", "return=representation")
            .json(data);
        let response = Self::send(request).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }

    /// POST to a GoTrue endpoint, e.g. `token?grant_type=password`
    pub async fn auth_post<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, SupabaseError> {
        let request = self.authed(self.client.post(self.auth_url(path))).json(body);
        let response = Self::send(request).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }

    /// GET a GoTrue endpoint, e.g. `user`
    pub async fn auth_get<R: DeserializeOwned>(&self, path: &str) -> Result<R, SupabaseError> {
        let response = Self::send(self.authed(self.client.get(self.auth_url(path)))).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }

    /// Watch a query by polling it every `period`. `on_change` runs with the
    /// full row set on the first successful poll and whenever it differs from
    /// the previous one. Poll failures are logged and retried next period.
    pub fn subscribe<T, F>(
        &self,
        table: &str,
        query: &str,
        period: Duration,
        mut on_change: F,
    ) -> Subscription
    where
        T: DeserializeOwned + PartialEq + Send + 'static,
        F: FnMut(&[T]) + Send + 'static,
    {
        let client = self.clone();
        let table = table.to_string();
        let query = query.to_string();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last: Option<Vec<T>> = None;

            loop {
                ticker.tick().await;
                match client.get::<T>(&table, &query).await {
                    Ok(rows) => {
                        if last.as_ref() != Some(&rows) {
                            debug!(table = %table, rows = rows.len(), "Subscription change");
                            on_change(&rows);
                            last = Some(rows);
                        }
                    }
                    Err(e) => warn!(table = %table, error = %e, "Subscription poll failed"),
                }
            }
        });

        Subscription { handle }
    }
}

/// A live query watch. Dropping it cancels the watch.
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Supabase errors
#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(reqwest::Error),

    #[error("No row returned from insert")]
    NoRowReturned,
}
