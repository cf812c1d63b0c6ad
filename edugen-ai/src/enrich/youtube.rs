//! YouTube Data API search client

use super::{SearchBackend, SearchCandidate};
use crate::model::{classify_status, BackendError};
use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("edugen-ai/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl SearchItem {
    /// Channel and playlist hits carry no video id and are dropped
    fn into_candidate(self) -> Option<SearchCandidate> {
        let thumbnails = self.snippet.thumbnails;
        let thumbnail = thumbnails
            .high
            .or(thumbnails.medium)
            .or(thumbnails.default)
            .map(|t| t.url)
            .unwrap_or_default();
        Some(SearchCandidate {
            id: self.id.video_id?,
            title: self.snippet.title,
            description: self.snippet.description,
            channel_title: self.snippet.channel_title,
            thumbnail,
        })
    }
}

/// Video search over `youtube/v3/search`
///
/// Holds the service search key; there is no per-call override for it.
pub struct YouTubeSearchClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl YouTubeSearchClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BackendError::Unavailable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl SearchBackend for YouTubeSearchClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchCandidate>, BackendError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            BackendError::Unauthorized("video search key is not configured (set YOUTUBE_API_KEY)".to_string())
        })?;

        let url = format!("{}/youtube/v3/search", self.base_url.trim_end_matches('/'));
        let max_results = max_results.to_string();
        let params = [
            ("part", "snippet"),
            ("q", query),
            ("type", "video"),
            ("maxResults", max_results.as_str()),
            ("key", api_key),
        ];

        tracing::debug!(query, "Searching videos");

        let response = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(format!("video search network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(classify_status(status.as_u16(), format!("video search: {}", message)));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(format!("video search: {}", e)))?;

        let candidates: Vec<SearchCandidate> = parsed
            .items
            .into_iter()
            .filter_map(SearchItem::into_candidate)
            .collect();

        tracing::info!(query, results = candidates.len(), "Video search complete");
        Ok(candidates)
    }
}
