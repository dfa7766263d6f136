/// YouTube Data API catalog: channel search plus the uploads playlist
use super::{merge_candidates, CandidateVideo, VideoCatalog};
use crate::config::YouTubeConfig;
use crate::error::{MonitorError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Public watch URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(rename = "publishedAt")]
    published_at: DateTime<Utc>,
    #[serde(rename = "resourceId")]
    resource_id: Option<ResourceId>,
}

#[derive(Debug, Deserialize)]
struct ResourceId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    #[serde(rename = "contentDetails")]
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(rename = "relatedPlaylists")]
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: Snippet,
}

/// Recent uploads of one channel
pub struct YouTubeCatalog {
    config: YouTubeConfig,
    client: Client,
}

impl YouTubeCatalog {
    pub fn new(config: YouTubeConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() || config.channel_id.trim().is_empty() {
            return Err(MonitorError::Config(
                "YouTube API key and channel id are required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }

    fn endpoint(&self, resource: &str, params: &[(&str, String)]) -> Result<Url> {
        let base = format!("{}/{}", self.config.api_base.trim_end_matches('/'), resource);
        let mut url = Url::parse(&base)
            .map_err(|e| MonitorError::Config(format!("invalid API base {}: {}", base, e)))?;
        url.query_pairs_mut()
            .append_pair("key", &self.config.api_key)
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        Ok(url)
    }

    async fn get_json(&self, url: &Url) -> Result<Value> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let body: Value = response.json().await?;

        if let Some(message) = api_error_message(&body) {
            return Err(MonitorError::Api(message));
        }
        if !status.is_success() {
            return Err(MonitorError::Api(format!("HTTP status {}", status)));
        }
        Ok(body)
    }

    /// GET with up to `max_retries` attempts and 2^attempt backoff
    async fn get_with_retry<T: DeserializeOwned>(&self, url: &Url, context: &str) -> Result<T> {
        let attempts = self.config.max_retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            debug!("🔄 {} - Attempt {}/{}", context, attempt, attempts);
            match self.get_json(url).await {
                Ok(body) => {
                    debug!("✅ {} successful", context);
                    return Ok(serde_json::from_value(body)?);
                }
                Err(e) => {
                    warn!("⚠️ {} attempt {} failed: {}", context, attempt, e);
                    last_error = e.to_string();
                    if attempt < attempts {
                        let wait = backoff_delay_ms(self.config.backoff_base_ms, attempt);
                        debug!("⏳ Waiting {}ms before retry...", wait);
                        tokio::time::sleep(Duration::from_millis(wait)).await;
                    }
                }
            }
        }

        error!("❌ All {} attempts failed after {} tries", context, attempts);
        Err(MonitorError::RetriesExhausted {
            context: context.to_string(),
            attempts,
            last_error,
        })
    }

    async fn search_recent(&self, published_after: DateTime<Utc>) -> Result<Vec<CandidateVideo>> {
        let url = self.endpoint(
            "search",
            &[
                ("channelId", self.config.channel_id.clone()),
                ("part", "snippet".to_string()),
                ("order", "date".to_string()),
                ("type", "video".to_string()),
                ("maxResults", self.config.search_max_results.to_string()),
                ("publishedAfter", published_after.to_rfc3339()),
            ],
        )?;
        let response: SearchResponse = self.get_with_retry(&url, "YouTube Search API").await?;
        Ok(search_candidates(response))
    }

    async fn recent_uploads(&self, published_after: DateTime<Utc>) -> Result<Vec<CandidateVideo>> {
        let url = self.endpoint(
            "channels",
            &[
                ("id", self.config.channel_id.clone()),
                ("part", "contentDetails".to_string()),
            ],
        )?;
        let channels: ChannelResponse = self.get_with_retry(&url, "YouTube Channel API").await?;
        let Some(playlist_id) = uploads_playlist_id(channels) else {
            debug!("Channel has no uploads playlist");
            return Ok(Vec::new());
        };

        let url = self.endpoint(
            "playlistItems",
            &[
                ("playlistId", playlist_id),
                ("part", "snippet".to_string()),
                ("maxResults", self.config.playlist_max_results.to_string()),
            ],
        )?;
        let playlist: PlaylistResponse = self.get_with_retry(&url, "YouTube Playlist API").await?;
        Ok(playlist_candidates(playlist, published_after))
    }
}

#[async_trait]
impl VideoCatalog for YouTubeCatalog {
    async fn fetch_recent(&self) -> Result<Vec<CandidateVideo>> {
        let window = ChronoDuration::try_hours(self.config.recency_hours).ok_or_else(|| {
            MonitorError::Config(format!(
                "recency_hours {} is out of range",
                self.config.recency_hours
            ))
        })?;
        let published_after = Utc::now()
            .checked_sub_signed(window)
            .ok_or_else(|| MonitorError::Config("recency window reaches before year 0".to_string()))?;
        info!("🔍 Fetching videos published after {}", published_after.to_rfc3339());

        let searched = self.search_recent(published_after).await?;
        info!("Found {} videos from search API", searched.len());

        let uploads = match self.recent_uploads(published_after).await {
            Ok(uploads) => {
                info!("Found {} recent videos from uploads playlist", uploads.len());
                uploads
            }
            Err(e) => {
                warn!("Could not fetch uploads playlist, using search results only: {}", e);
                Vec::new()
            }
        };

        let merged = merge_candidates(searched, uploads);
        info!("Total unique videos after merge: {}", merged.len());
        Ok(merged)
    }

    fn name(&self) -> &str {
        "youtube"
    }
}

/// `base * 2^attempt`, saturating instead of overflowing
fn backoff_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt))
}

fn api_error_message(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    Some(
        error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown API error")
            .to_string(),
    )
}

fn search_candidates(response: SearchResponse) -> Vec<CandidateVideo> {
    response
        .items
        .into_iter()
        .filter_map(|item| {
            Some(CandidateVideo {
                external_id: item.id.video_id?,
                title: item.snippet.title,
                published_at: item.snippet.published_at,
            })
        })
        .collect()
}

fn uploads_playlist_id(response: ChannelResponse) -> Option<String> {
    response
        .items
        .into_iter()
        .next()?
        .content_details
        .related_playlists
        .uploads
}

fn playlist_candidates(response: PlaylistResponse, published_after: DateTime<Utc>) -> Vec<CandidateVideo> {
    response
        .items
        .into_iter()
        .filter(|item| item.snippet.published_at > published_after)
        .filter_map(|item| {
            let video_id = item.snippet.resource_id?.video_id?;
            Some(CandidateVideo {
                external_id: video_id,
                title: item.snippet.title,
                published_at: item.snippet.published_at,
            })
        })
        .collect()
}
