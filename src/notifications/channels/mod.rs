//! Messaging channels for announcements and operator reports
//!
//! This module defines the [`Messenger`] trait the relay talks to and the
//! concrete channels: Discord over REST, and a log-only channel for dry runs.

pub mod discord;
pub mod log;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur during channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid channel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Platform refused the request
    #[error("Rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error
    #[error("Channel error: {0}")]
    Other(String),
}

/// Response from delivering a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatus {
    /// Whether the message was successfully delivered
    pub success: bool,
    /// Channel that delivered (or failed to deliver) the message
    pub channel: String,
    /// Optional message about the delivery
    pub message: Option<String>,
    /// Timestamp of delivery attempt
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl DeliveryStatus {
    /// Create a successful delivery status
    pub fn success(channel: impl Into<String>) -> Self {
        Self {
            success: true,
            channel: channel.into(),
            message: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a successful delivery status with a message
    pub fn success_with_message(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            channel: channel.into(),
            message: Some(message.into()),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "SUCCESS" } else { "FAILED" };
        write!(f, "[{status}] {}", self.channel)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

/// A message posted on the messaging platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel_id: u64,
    pub message_id: u64,
}

/// A guild member on the messaging platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub guild_id: u64,
    pub user_id: u64,
}

/// Outbound side of the messaging platform
///
/// `announce` targets the public channel; `notify_operators` targets the
/// private operator channel.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &str;

    /// Post a public announcement
    async fn announce(&self, text: &str) -> ChannelResult<DeliveryStatus>;

    /// Post a report to the operators
    async fn notify_operators(&self, text: &str) -> ChannelResult<DeliveryStatus>;

    /// Delete a posted message
    async fn delete_message(&self, message: &MessageRef) -> ChannelResult<DeliveryStatus>;

    /// Remove a member from the guild
    async fn kick_user(&self, user: &UserRef, reason: &str) -> ChannelResult<DeliveryStatus>;

    /// Check if the channel is available
    async fn health_check(&self) -> ChannelResult<bool> {
        Ok(true)
    }
}
