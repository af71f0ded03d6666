//! Per-source polling
//!
//! A poller decides whether its stored record is due for a re-check, performs
//! at most one upstream call, and classifies the result as a [`PollOutcome`].
//! Pollers never touch persisted state or the messenger; what to do with an
//! outcome is up to [`crate::notifications::decider`].

pub mod freshness;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{LiveRecord, VideoRecord};
use crate::sources::{LiveSource, VideoSource};
use crate::utils::error::FetchError;

pub use freshness::is_stale;

/// Result of polling one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<R> {
    /// Not stale, or the upstream still reports the stored content
    Unchanged,
    /// Content that differs from the stored record
    New(R),
    /// Live source reports no active session
    Offline,
    /// Upstream call failed; the message is meant for operators
    FetchFailed(String),
}

impl<R> PollOutcome<R> {
    pub fn is_new(&self) -> bool {
        matches!(self, Self::New(_))
    }
}

/// Polls the video platform for the latest upload
pub struct VideoPoller {
    source: Box<dyn VideoSource>,
    cooldown_hours: f64,
}

impl VideoPoller {
    pub fn new(source: Box<dyn VideoSource>, cooldown_hours: f64) -> Self {
        Self {
            source,
            cooldown_hours,
        }
    }

    pub fn cooldown_hours(&self) -> f64 {
        self.cooldown_hours
    }

    /// Poll for a new video
    ///
    /// Every fetch failure, key exhaustion included, is reported as
    /// [`PollOutcome::FetchFailed`].
    pub async fn poll(&self, stored: Option<&VideoRecord>, now: DateTime<Utc>) -> PollOutcome<VideoRecord> {
        if !is_stale(stored, self.cooldown_hours, now) {
            debug!(source = self.source.name(), "Waiting for video cooldown");
            return PollOutcome::Unchanged;
        }

        let upload = match self.source.latest_video().await {
            Ok(upload) => upload,
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "Video fetch failed");
                return PollOutcome::FetchFailed(format!(
                    "Could not fetch latest video from {}: {e}",
                    self.source.name()
                ));
            }
        };

        let candidate = VideoRecord::observed(&upload, now);
        match stored {
            Some(current) if *current == candidate => {
                debug!(video_id = %candidate.id, "No new video");
                PollOutcome::Unchanged
            }
            _ => {
                info!(video_id = %candidate.id, title = %candidate.title, "New video detected");
                PollOutcome::New(candidate)
            }
        }
    }
}

/// Polls the live platform for an active session
pub struct LivePoller {
    source: Box<dyn LiveSource>,
    cooldown_hours: f64,
}

impl LivePoller {
    pub fn new(source: Box<dyn LiveSource>, cooldown_hours: f64) -> Self {
        Self {
            source,
            cooldown_hours,
        }
    }

    pub fn cooldown_hours(&self) -> f64 {
        self.cooldown_hours
    }

    /// Poll for a new live session
    ///
    /// The candidate's start time is the local `now`, not the upstream start.
    ///
    /// # Errors
    ///
    /// Returns `Error::AuthExhausted` when the source gives up logging in;
    /// any other failure is a [`PollOutcome::FetchFailed`] value.
    pub async fn poll(
        &self,
        stored: Option<&LiveRecord>,
        now: DateTime<Utc>,
    ) -> Result<PollOutcome<LiveRecord>> {
        if !is_stale(stored, self.cooldown_hours, now) {
            debug!(source = self.source.name(), "Waiting for live cooldown");
            return Ok(PollOutcome::Unchanged);
        }

        let status = match self.source.check_live().await {
            Ok(status) => status,
            Err(FetchError::AuthExhausted { attempts, reason }) => {
                return Err(Error::AuthExhausted { attempts, reason });
            }
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "Live check failed");
                return Ok(PollOutcome::FetchFailed(format!(
                    "Could not fetch live status from {}: {e}",
                    self.source.name()
                )));
            }
        };

        if !status.is_live {
            debug!(source = self.source.name(), "Channel is offline");
            return Ok(PollOutcome::Offline);
        }

        let candidate = LiveRecord::new(now, status.title);
        match stored {
            Some(current) if !candidate.is_newer_than(current) => Ok(PollOutcome::Unchanged),
            _ => {
                info!(
                    title = %candidate.title,
                    upstream_started_at = ?status.started_at,
                    "New live session detected"
                );
                Ok(PollOutcome::New(candidate))
            }
        }
    }
}
