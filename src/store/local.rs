//! Local best-score cache, a small JSON key-value file

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Entries kept in the history list
pub const HISTORY_CAP: usize = 10;

/// Cached scores, stored under fixed keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedScores {
    #[serde(rename = "flappy_highscore", default)]
    pub best: Option<u32>,
    /// Most recent first
    #[serde(rename = "flappy_scorehistory", default)]
    pub history: Vec<u32>,
}

impl CachedScores {
    /// Fold a finished match into the cache
    pub fn push(&mut self, score: u32) {
        self.best = Some(self.best.map_or(score, |b| b.max(score)));
        self.history.insert(0, score);
        self.history.truncate(HISTORY_CAP);
    }
}

#[derive(Debug, Clone)]
pub struct LocalScoreCache {
    path: PathBuf,
}

impl LocalScoreCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache file inside a data directory
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join("scores.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cache. A missing file is an empty cache.
    pub async fn load(&self) -> Result<CachedScores, CacheError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CachedScores::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, scores: &CachedScores) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(scores)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Record a score and return the updated cache
    pub async fn record(&self, score: u32) -> Result<CachedScores, CacheError> {
        let mut scores = self.load().await?;
        scores.push(score);
        self.save(&scores).await?;
        Ok(scores)
    }
}

/// Cache errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
