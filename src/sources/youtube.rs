//! YouTube Data API v3 client
//!
//! Resolves the watched channel's uploads playlist once per session and reads
//! the newest playlist item on every fetch. API keys are tried in the order
//! they are configured; a key is skipped when the platform rejects it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use super::VideoSource;
use crate::config::YouTubeConfig;
use crate::models::VideoUpload;
use crate::utils::error::{FetchError, ParseError};
use crate::utils::mask_secret;

/// Key and playlist accepted by the last successful login
#[derive(Debug, Clone)]
struct Session {
    api_key: String,
    uploads_playlist: String,
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemsResponse {
    items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    published_at: DateTime<Utc>,
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

/// Video source backed by the YouTube Data API
pub struct YouTubeClient {
    client: Client,
    base_url: String,
    channel_id: String,
    api_keys: Vec<String>,
    session: Mutex<Option<Session>>,
}

impl YouTubeClient {
    /// Create a client for the configured channel
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &YouTubeConfig, timeout: Duration) -> Result<Self, FetchError> {
        Self::with_base_url(&config.api_base, config, timeout)
    }

    /// Create a client against a custom API base URL (mock servers)
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn with_base_url(
        base_url: &str,
        config: &YouTubeConfig,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            channel_id: config.channel_id.clone(),
            api_keys: config
                .api_keys
                .iter()
                .filter(|k| !k.trim().is_empty())
                .cloned()
                .collect(),
            session: Mutex::new(None),
        })
    }

    /// Log in with the first accepted API key and resolve the uploads playlist
    ///
    /// # Errors
    ///
    /// Returns `FetchError::AuthExhausted` when every key is rejected
    async fn login(&self) -> Result<Session, FetchError> {
        let url = format!("{}/channels", self.base_url);
        let mut last_reason = String::from("no API keys configured");

        for key in &self.api_keys {
            info!(key = %mask_secret(key, 8), "Connecting to YouTube");

            let response = self
                .client
                .get(&url)
                .query(&[
                    ("part", "id,contentDetails"),
                    ("id", self.channel_id.as_str()),
                    ("maxResults", "1"),
                    ("key", key.as_str()),
                ])
                .send()
                .await
                .map_err(FetchError::from_request)?;

            let status = response.status();
            if !status.is_success() {
                error!(status = status.as_u16(), key = %mask_secret(key, 8), "YouTube rejected API key");
                last_reason = format!("HTTP {}", status.as_u16());
                continue;
            }

            let body = response.text().await.map_err(FetchError::from_request)?;
            let channels: ChannelListResponse = ParseError::decode("channels", &body)?;
            let channel = channels
                .items
                .into_iter()
                .next()
                .ok_or_else(|| FetchError::Empty(format!("channel {} not found", self.channel_id)))?;

            let session = Session {
                api_key: key.clone(),
                uploads_playlist: channel.content_details.related_playlists.uploads,
            };
            info!(playlist = %session.uploads_playlist, "Logged in on YouTube");
            return Ok(session);
        }

        Err(FetchError::AuthExhausted {
            attempts: self.api_keys.len() as u32,
            reason: last_reason,
        })
    }

    /// Return the cached session, logging in when there is none
    async fn ensure_session(&self) -> Result<Session, FetchError> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }

        debug!("No YouTube session, logging in");
        let session = self.login().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    async fn clear_session(&self) {
        *self.session.lock().await = None;
    }
}

#[async_trait]
impl VideoSource for YouTubeClient {
    fn name(&self) -> &str {
        "youtube"
    }

    #[instrument(skip(self), fields(channel = %self.channel_id))]
    async fn latest_video(&self) -> Result<VideoUpload, FetchError> {
        let session = self.ensure_session().await?;

        let response = self
            .client
            .get(format!("{}/playlistItems", self.base_url))
            .query(&[
                ("part", "id,snippet"),
                ("playlistId", session.uploads_playlist.as_str()),
                ("maxResults", "1"),
                ("key", session.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(FetchError::from_request)?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            warn!(status = status.as_u16(), "YouTube session rejected, dropping it");
            self.clear_session().await;
            return Err(FetchError::Unauthorized(format!("HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            return Err(FetchError::ServerError(status.as_u16()));
        }

        let body = response.text().await.map_err(FetchError::from_request)?;
        let playlist: PlaylistItemsResponse = ParseError::decode("playlistItems", &body)?;
        let item = playlist.items.into_iter().next().ok_or_else(|| {
            FetchError::Empty(format!("no uploads on channel {}", self.channel_id))
        })?;

        let upload = VideoUpload {
            id: item.snippet.resource_id.video_id,
            title: item.snippet.title,
            published_at: item.snippet.published_at,
        };
        debug!(video_id = %upload.id, "Latest video on YouTube");
        Ok(upload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_playlist_item() {
        let body = r#"{
            "items": [{
                "id": "UExJdGVt",
                "snippet": {
                    "title": "Ep1",
                    "publishedAt": "2024-03-01T12:00:00Z",
                    "resourceId": {"kind": "youtube#video", "videoId": "abc"}
                }
            }]
        }"#;

        let parsed: PlaylistItemsResponse = ParseError::decode("playlistItems", body).unwrap();
        let snippet = &parsed.items[0].snippet;
        assert_eq!(snippet.resource_id.video_id, "abc");
        assert_eq!(snippet.title, "Ep1");
    }

    #[test]
    fn test_decode_rejects_missing_video_id() {
        let body = r#"{"items": [{"snippet": {"title": "Ep1", "publishedAt": "2024-03-01T12:00:00Z", "resourceId": {}}}]}"#;
        let result = ParseError::decode::<PlaylistItemsResponse>("playlistItems", body);
        assert!(matches!(result, Err(ParseError::Malformed { what: "playlistItems", .. })));
    }

    #[test]
    fn test_decode_uploads_playlist() {
        let body = r#"{"items": [{"id": "UC1", "contentDetails": {"relatedPlaylists": {"uploads": "UU1"}}}]}"#;
        let parsed: ChannelListResponse = ParseError::decode("channels", body).unwrap();
        assert_eq!(parsed.items[0].content_details.related_playlists.uploads, "UU1");
    }

    #[test]
    fn test_blank_keys_are_dropped() {
        let config = YouTubeConfig {
            channel_id: "UC1".to_string(),
            api_keys: vec!["".to_string(), "k1".to_string(), "  ".to_string()],
            ..Default::default()
        };
        let client = YouTubeClient::new(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(client.api_keys, vec!["k1".to_string()]);
    }
}
