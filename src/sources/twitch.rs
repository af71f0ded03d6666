//! Twitch Helix client
//!
//! Keeps an app access token obtained through the client-credentials grant.
//! Before every live check the token is validated; an invalid or missing token
//! triggers a login retried on a fixed interval. When the retries run out the
//! check fails with [`FetchError::AuthExhausted`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::LiveSource;
use crate::config::TwitchConfig;
use crate::models::LiveStatus;
use crate::utils::error::{FetchError, ParseError};
use crate::utils::mask_secret;
use crate::utils::retry::{with_retry, RetryConfig};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct StreamsResponse {
    data: Vec<Stream>,
}

#[derive(Debug, Deserialize)]
struct Stream {
    #[serde(rename = "type")]
    kind: String,
    title: String,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
}

/// Live source backed by the Twitch Helix API
pub struct TwitchClient {
    client: Client,
    api_base: String,
    auth_base: String,
    channel: String,
    client_id: String,
    client_secret: String,
    retry: RetryConfig,
    token: Mutex<Option<String>>,
}

impl TwitchClient {
    /// Create a client for the configured channel
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(
        config: &TwitchConfig,
        retry: RetryConfig,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            auth_base: config.auth_base.trim_end_matches('/').to_string(),
            channel: config.channel.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            retry,
            token: Mutex::new(None),
        })
    }

    /// Check a token against the validation endpoint
    async fn validate(&self, token: &str) -> Result<bool, FetchError> {
        let response = self
            .client
            .get(format!("{}/validate", self.auth_base))
            .header("Authorization", format!("OAuth {token}"))
            .header("Client-Id", &self.client_id)
            .send()
            .await
            .map_err(FetchError::from_request)?;

        if response.status().is_success() {
            return Ok(true);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        info!(status = status, body = %body, "Twitch login expired");
        Ok(false)
    }

    /// Single client-credentials login attempt
    async fn request_token(&self) -> Result<String, FetchError> {
        let response = self
            .client
            .post(format!("{}/token", self.auth_base))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(FetchError::from_request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::ServerError(status.as_u16()));
        }

        let body = response.text().await.map_err(FetchError::from_request)?;
        let token: TokenResponse = ParseError::decode("token", &body)?;
        Ok(token.access_token)
    }

    /// Log in, retrying on the configured fixed interval
    ///
    /// # Errors
    ///
    /// Returns `FetchError::AuthExhausted` once every attempt has failed
    async fn login(&self) -> Result<String, FetchError> {
        debug!("Logging in on Twitch");

        let token = with_retry(&self.retry, || self.request_token())
            .await
            .map_err(|e| FetchError::AuthExhausted {
                attempts: self.retry.total_attempts(),
                reason: e.to_string(),
            })?;

        debug!(token = %mask_secret(&token, 4), "Logged in on Twitch");
        Ok(token)
    }

    /// Return a validated token, logging in again when needed
    async fn ensure_token(&self) -> Result<String, FetchError> {
        let mut guard = self.token.lock().await;

        if let Some(token) = guard.as_ref() {
            if self.validate(token).await? {
                return Ok(token.clone());
            }
        }

        *guard = None;
        let token = self.login().await?;
        *guard = Some(token.clone());
        Ok(token)
    }
}

#[async_trait]
impl LiveSource for TwitchClient {
    fn name(&self) -> &str {
        "twitch"
    }

    #[instrument(skip(self), fields(channel = %self.channel))]
    async fn check_live(&self) -> Result<LiveStatus, FetchError> {
        let token = self.ensure_token().await?;

        let response = self
            .client
            .get(format!("{}/streams", self.api_base))
            .query(&[("user_login", self.channel.as_str())])
            .header("Client-Id", &self.client_id)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(FetchError::from_request)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("Twitch rejected the access token");
            *self.token.lock().await = None;
            return Err(FetchError::Unauthorized(format!(
                "could not fetch Twitch channel {}",
                self.channel
            )));
        }
        if !status.is_success() {
            return Err(FetchError::ServerError(status.as_u16()));
        }

        let body = response.text().await.map_err(FetchError::from_request)?;
        let streams: StreamsResponse = ParseError::decode("streams", &body)?;

        let status = match streams.data.into_iter().next() {
            Some(stream) if stream.kind == "live" => LiveStatus::live(stream.title, stream.started_at),
            _ => LiveStatus::offline(),
        };
        debug!(is_live = status.is_live, "Checked Twitch status");
        Ok(status)
    }
}
