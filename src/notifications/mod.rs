//! Announcements and operator reports
//!
//! This module turns poll outcomes into actions and delivers the resulting
//! messages through a [`Messenger`].
//!
//! # Architecture
//!
//! ```text
//! PollOutcome ──▶ AnnouncementDecider ──▶ Action
//!                                           │
//!                                           ▼
//!                               ┌───────────────────────┐
//!                               │  NotificationManager  │
//!                               │  - announcements      │
//!                               │  - operator reports   │
//!                               │  - report dedup       │
//!                               └───────────────────────┘
//!                                           │
//!                               ┌───────────┴───────────┐
//!                               ▼                       ▼
//!                         ┌──────────┐            ┌──────────┐
//!                         │ Discord  │            │   Log    │
//!                         │ Channel  │            │ Channel  │
//!                         └──────────┘            └──────────┘
//! ```
//!
//! Delivery is fire-and-forget: failures are logged and never retried.

pub mod channels;
pub mod decider;
mod manager;

use std::fmt;

use crate::models::{LiveRecord, VideoRecord};

// Re-exports
pub use channels::discord::DiscordChannel;
pub use channels::log::LogChannel;
pub use channels::{ChannelError, DeliveryStatus, MessageRef, Messenger, UserRef};
pub use decider::{Action, AnnouncementDecider};
pub use manager::NotificationManager;

/// Public announcement of new content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    /// A new upload on the video platform
    Video(VideoRecord),
    /// A new live session on the streaming platform
    Live {
        record: LiveRecord,
        channel: String,
    },
}

impl Announcement {
    pub fn video(record: VideoRecord) -> Self {
        Self::Video(record)
    }

    pub fn live(record: LiveRecord, channel: impl Into<String>) -> Self {
        Self::Live {
            record,
            channel: channel.into(),
        }
    }

    /// Source kind for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Video(_) => "video",
            Self::Live { .. } => "live",
        }
    }

    /// Render the fixed message template
    pub fn render(&self) -> String {
        match self {
            Self::Video(video) => format!(
                "New video on YouTube @everyone!\n**{}**\n{}",
                video.title,
                video.link()
            ),
            Self::Live { record, channel } => format!(
                "{channel} is live on Twitch @everyone!\n**{}**\n{}",
                record.title,
                LiveRecord::link(channel)
            ),
        }
    }
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
