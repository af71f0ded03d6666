//! herald - YouTube and Twitch announcements for Discord
//!
//! A relay that polls a video platform and a live-streaming platform for new
//! content from one channel and announces it on a Discord server.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Records, persisted state and upstream value shapes
//! - [`sources`] - YouTube and Twitch clients behind fetch traits
//! - [`poller`] - Cooldown-gated polling and new-content detection
//! - [`notifications`] - Announcement decisions and Discord delivery
//! - [`storage`] - Persisted state backends (JSON, SQLite, memory)
//! - [`scheduler`] - Tick loop with the do-not-disturb cadence
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use herald::config::Config;
//! use herald::poller::{LivePoller, VideoPoller};
//! use herald::scheduler::{Scheduler, SchedulerSettings};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let timeout = config.request_timeout();
//!
//!     let video = herald::sources::YouTubeClient::new(&config.youtube, timeout)?;
//!     let live = herald::sources::TwitchClient::new(&config.twitch, config.auth_retry(), timeout)?;
//!     let messenger = herald::notifications::DiscordChannel::new(&config.discord, timeout)?;
//!
//!     let mut scheduler = Scheduler::new(
//!         VideoPoller::new(Box::new(video), config.youtube.cooldown_hours),
//!         LivePoller::new(Box::new(live), config.twitch.cooldown_hours),
//!         herald::storage::open_store(&config.storage)?,
//!         herald::notifications::NotificationManager::new(Box::new(messenger)),
//!         SchedulerSettings::from_config(&config)?,
//!     );
//!     scheduler.restore().await?;
//!     scheduler.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod notifications;
pub mod poller;
pub mod scheduler;
pub mod sources;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, HeraldErrorTrait, Result};
    pub use crate::models::{LiveRecord, LiveStatus, PersistedState, VideoRecord, VideoUpload};
    pub use crate::notifications::{Announcement, Messenger, NotificationManager};
    pub use crate::poller::{LivePoller, PollOutcome, VideoPoller};
    pub use crate::scheduler::{Scheduler, SchedulerSettings, SchedulerState};
    pub use crate::sources::{LiveSource, VideoSource};
    pub use crate::storage::StateStore;
}

// Direct re-exports for convenience
pub use models::{LiveRecord, PersistedState, VideoRecord};
