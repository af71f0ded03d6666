//! Upstream content sources
//!
//! The pollers only see the two traits defined here. Concrete clients for the
//! YouTube Data API and the Twitch Helix API live in the submodules; tests swap
//! in scripted fakes.

pub mod twitch;
pub mod youtube;

use async_trait::async_trait;

use crate::models::{LiveStatus, VideoUpload};
use crate::utils::error::FetchError;

pub use twitch::TwitchClient;
pub use youtube::YouTubeClient;

/// Source of the latest uploaded video
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Source name for logs
    fn name(&self) -> &str;

    /// Fetch the most recent upload of the watched channel
    async fn latest_video(&self) -> Result<VideoUpload, FetchError>;
}

/// Source of the current live-stream status
#[async_trait]
pub trait LiveSource: Send + Sync {
    /// Source name for logs
    fn name(&self) -> &str;

    /// Check whether the watched channel is live right now
    ///
    /// Implementations ensure a valid session first and return
    /// [`FetchError::AuthExhausted`] when re-login gives up.
    async fn check_live(&self) -> Result<LiveStatus, FetchError>;
}
