// Core data structures for the herald relay

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base URL for video deep links
pub const VIDEO_LINK_BASE: &str = "https://www.youtube.com/watch?v=";

/// Base URL for live channel links
pub const LIVE_LINK_BASE: &str = "https://www.twitch.tv/";

/// Latest known video upload
///
/// Equality is by `id` alone: the same upload re-observed later with a
/// different title or timestamp is still the same video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    /// When this relay last confirmed the upload (not the upload time)
    pub observed_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, observed_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            observed_at,
        }
    }

    /// Build the candidate record for a fetched upload
    pub fn observed(upload: &VideoUpload, now: DateTime<Utc>) -> Self {
        Self::new(upload.id.clone(), upload.title.clone(), now)
    }

    /// Deep link to the video
    pub fn link(&self) -> String {
        format!("{VIDEO_LINK_BASE}{}", self.id)
    }
}

impl PartialEq for VideoRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for VideoRecord {}

impl std::fmt::Display for VideoRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.id, self.title)
    }
}

/// Latest known live session
///
/// `started_at` doubles as the identity key: two records are the same
/// session iff they started at the same recorded instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveRecord {
    pub started_at: DateTime<Utc>,
    pub title: String,
}

impl LiveRecord {
    pub fn new(started_at: DateTime<Utc>, title: impl Into<String>) -> Self {
        Self {
            started_at,
            title: title.into(),
        }
    }

    /// Channel link; live links are not session specific
    pub fn link(channel: &str) -> String {
        format!("{LIVE_LINK_BASE}{channel}")
    }

    /// Whether this session started strictly after `other`
    pub fn is_newer_than(&self, other: &LiveRecord) -> bool {
        self.started_at > other.started_at
    }
}

impl PartialEq for LiveRecord {
    fn eq(&self, other: &Self) -> bool {
        self.started_at == other.started_at
    }
}

impl Eq for LiveRecord {}

impl std::fmt::Display for LiveRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.started_at.format("%Y-%m-%d %H:%M"), self.title)
    }
}

/// The durable "last known" pair, one slot per source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub video: Option<VideoRecord>,
    #[serde(default)]
    pub live: Option<LiveRecord>,
}

impl PersistedState {
    pub fn new(video: Option<VideoRecord>, live: Option<LiveRecord>) -> Self {
        Self { video, live }
    }

    /// Copy of this state with the video slot replaced
    pub fn with_video(&self, video: VideoRecord) -> Self {
        Self {
            video: Some(video),
            live: self.live.clone(),
        }
    }

    /// Copy of this state with the live slot replaced
    pub fn with_live(&self, live: LiveRecord) -> Self {
        Self {
            video: self.video.clone(),
            live: Some(live),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.video.is_none() && self.live.is_none()
    }
}

/// Latest upload as reported by the video platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUpload {
    pub id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
}

/// Current channel status as reported by the streaming platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveStatus {
    pub is_live: bool,
    pub title: String,
    /// Upstream start time, when reported; informational only
    pub started_at: Option<DateTime<Utc>>,
}

impl LiveStatus {
    pub fn offline() -> Self {
        Self {
            is_live: false,
            title: String::new(),
            started_at: None,
        }
    }

    pub fn live(title: impl Into<String>, started_at: Option<DateTime<Utc>>) -> Self {
        Self {
            is_live: true,
            title: title.into(),
            started_at,
        }
    }
}
