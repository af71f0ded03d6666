//! Discord REST channel
//!
//! Posts announcements and operator reports through the Discord HTTP API
//! (v10) with a bot token, and exposes the moderation calls the bot needs.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::{ChannelError, ChannelResult, DeliveryStatus, MessageRef, Messenger, UserRef};
use crate::config::DiscordConfig;
use crate::utils::truncate_text;

/// Discord rejects message content longer than this
const MAX_CONTENT_CHARS: usize = 2000;

const USER_AGENT: &str = concat!("DiscordBot (herald, ", env!("CARGO_PKG_VERSION"), ")");

#[derive(Debug, Deserialize)]
struct PostedMessage {
    id: String,
}

/// Discord notification channel
///
/// # Example
///
/// ```rust,ignore
/// use herald::notifications::{DiscordChannel, Messenger};
///
/// let channel = DiscordChannel::new(&config.discord, config.request_timeout())?;
/// channel.announce("New video on YouTube @everyone!").await?;
/// ```
pub struct DiscordChannel {
    client: Client,
    api_base: String,
    token: String,
    announce_channel_id: u64,
    operator_channel_id: u64,
}

impl DiscordChannel {
    /// Create a new Discord channel
    pub fn new(config: &DiscordConfig, timeout: Duration) -> ChannelResult<Self> {
        if config.token.is_empty() {
            return Err(ChannelError::InvalidConfig("bot token cannot be empty".to_string()));
        }
        if !config.api_base.starts_with("http://") && !config.api_base.starts_with("https://") {
            return Err(ChannelError::InvalidConfig(
                "API base must start with http:// or https://".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ChannelError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            announce_channel_id: config.announce_channel_id,
            operator_channel_id: config.operator_channel_id,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Bot {}", self.token))
    }

    /// Map a non-success response to a channel error
    async fn check(response: Response) -> ChannelResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ChannelError::RateLimited(body));
        }
        Err(ChannelError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    /// Post `text` to a channel, returning the new message ID
    async fn post_message(&self, channel_id: u64, text: &str) -> ChannelResult<String> {
        let payload = serde_json::json!({
            "content": truncate_text(text, MAX_CONTENT_CHARS),
            "allowed_mentions": { "parse": ["everyone"] },
        });

        let request = self
            .client
            .post(format!("{}/channels/{channel_id}/messages", self.api_base));
        let response = self.authorized(request).json(&payload).send().await?;
        let response = Self::check(response).await?;

        let posted: PostedMessage = response.json().await?;
        tracing::info!(channel_id = channel_id, message_id = %posted.id, "Message delivered to Discord");
        Ok(posted.id)
    }
}

#[async_trait]
impl Messenger for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    async fn announce(&self, text: &str) -> ChannelResult<DeliveryStatus> {
        let id = self.post_message(self.announce_channel_id, text).await?;
        Ok(DeliveryStatus::success_with_message("discord", format!("message {id}")))
    }

    async fn notify_operators(&self, text: &str) -> ChannelResult<DeliveryStatus> {
        let id = self.post_message(self.operator_channel_id, text).await?;
        Ok(DeliveryStatus::success_with_message("discord", format!("message {id}")))
    }

    async fn delete_message(&self, message: &MessageRef) -> ChannelResult<DeliveryStatus> {
        let request = self.client.delete(format!(
            "{}/channels/{}/messages/{}",
            self.api_base, message.channel_id, message.message_id
        ));
        let response = self.authorized(request).send().await?;
        Self::check(response).await?;

        tracing::warn!(
            channel_id = message.channel_id,
            message_id = message.message_id,
            "Deleted message"
        );
        Ok(DeliveryStatus::success("discord"))
    }

    async fn kick_user(&self, user: &UserRef, reason: &str) -> ChannelResult<DeliveryStatus> {
        let request = self.client.delete(format!(
            "{}/guilds/{}/members/{}",
            self.api_base, user.guild_id, user.user_id
        ));
        let response = self
            .authorized(request)
            .header("X-Audit-Log-Reason", encode_audit_reason(reason))
            .send()
            .await?;
        Self::check(response).await?;

        tracing::warn!(guild_id = user.guild_id, user_id = user.user_id, reason = %reason, "Kicked user");
        Ok(DeliveryStatus::success_with_message("discord", reason))
    }

    async fn health_check(&self) -> ChannelResult<bool> {
        let request = self.client.get(format!("{}/users/@me", self.api_base));
        match self.authorized(request).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::warn!(error = %e, "Discord health check failed");
                Ok(false)
            }
        }
    }
}

/// Percent-encode an audit log reason so it is a valid header value
fn encode_audit_reason(reason: &str) -> String {
    let mut encoded = String::with_capacity(reason.len());
    for byte in reason.bytes() {
        match byte {
            b'%' => encoded.push_str("%25"),
            0x20..=0x7e => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
