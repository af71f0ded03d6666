//! Log-only channel used for dry runs

use async_trait::async_trait;
use tracing::info;

use super::{ChannelResult, DeliveryStatus, MessageRef, Messenger, UserRef};

/// Messenger that writes every outbound call to the log instead of sending it
#[derive(Debug, Default, Clone)]
pub struct LogChannel;

impl LogChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Messenger for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn announce(&self, text: &str) -> ChannelResult<DeliveryStatus> {
        info!(target: "herald::dry_run", text = %text, "Announcement");
        Ok(DeliveryStatus::success_with_message("log", "dry run"))
    }

    async fn notify_operators(&self, text: &str) -> ChannelResult<DeliveryStatus> {
        info!(target: "herald::dry_run", text = %text, "Operator report");
        Ok(DeliveryStatus::success_with_message("log", "dry run"))
    }

    async fn delete_message(&self, message: &MessageRef) -> ChannelResult<DeliveryStatus> {
        info!(
            target: "herald::dry_run",
            channel_id = message.channel_id,
            message_id = message.message_id,
            "Delete message"
        );
        Ok(DeliveryStatus::success_with_message("log", "dry run"))
    }

    async fn kick_user(&self, user: &UserRef, reason: &str) -> ChannelResult<DeliveryStatus> {
        info!(
            target: "herald::dry_run",
            guild_id = user.guild_id,
            user_id = user.user_id,
            reason = %reason,
            "Kick user"
        );
        Ok(DeliveryStatus::success_with_message("log", "dry run"))
    }
}
