/// Sources of candidate recordings
///
/// A catalog hands the engine an ordered, already de-duplicated list of
/// recent videos. [`youtube::YouTubeCatalog`] talks to the YouTube Data API;
/// [`FileCatalog`] replays a JSON file for offline runs.

pub mod youtube;

pub use youtube::{watch_url, YouTubeCatalog};

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

/// A published recording that may belong in a lecture slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateVideo {
    pub external_id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
}

/// Trait for candidate sources
#[async_trait]
pub trait VideoCatalog: Send + Sync {
    async fn fetch_recent(&self) -> Result<Vec<CandidateVideo>>;
    fn name(&self) -> &str;
}

/// Append `extra` to `primary`, skipping ids already present. Order is kept.
pub fn merge_candidates(
    primary: Vec<CandidateVideo>,
    extra: Vec<CandidateVideo>,
) -> Vec<CandidateVideo> {
    let mut seen = HashSet::new();
    primary
        .into_iter()
        .chain(extra)
        .filter(|video| seen.insert(video.external_id.clone()))
        .collect()
}

/// Candidates read from a JSON array on disk
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl VideoCatalog for FileCatalog {
    async fn fetch_recent(&self) -> Result<Vec<CandidateVideo>> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let videos: Vec<CandidateVideo> = serde_json::from_str(&content)?;
        info!("📼 Loaded {} candidates from {}", videos.len(), self.path.display());
        Ok(merge_candidates(videos, Vec::new()))
    }

    fn name(&self) -> &str {
        "file"
    }
}
