//! Notification manager for announcement and report delivery

use super::channels::Messenger;
use super::Announcement;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Routes announcements and operator reports to a messenger
///
/// Delivery failures are logged and swallowed; nothing here returns an
/// error to the caller.
pub struct NotificationManager {
    messenger: Box<dyn Messenger>,

    /// Deduplication: last send time per report text
    last_reported: HashMap<String, DateTime<Utc>>,

    /// Minimum time between identical operator reports (minutes, 0 disables)
    dedup_window_minutes: i64,
}

impl NotificationManager {
    /// Create a new notification manager
    pub fn new(messenger: Box<dyn Messenger>) -> Self {
        Self {
            messenger,
            last_reported: HashMap::new(),
            dedup_window_minutes: 0,
        }
    }

    /// Set deduplication window in minutes
    pub fn with_dedup_window(mut self, minutes: i64) -> Self {
        self.dedup_window_minutes = minutes;
        self
    }

    pub fn messenger(&self) -> &dyn Messenger {
        self.messenger.as_ref()
    }

    /// Dedup window as a duration; saturates for out-of-range minute counts
    fn dedup_window(&self) -> Duration {
        Duration::try_minutes(self.dedup_window_minutes.max(0)).unwrap_or(Duration::MAX)
    }

    /// Check if a report should be deduplicated
    fn should_deduplicate(&self, message: &str, now: DateTime<Utc>) -> bool {
        if self.dedup_window_minutes <= 0 {
            return false;
        }
        match self.last_reported.get(message) {
            Some(&last_time) => now - last_time < self.dedup_window(),
            None => false,
        }
    }

    /// Post a public announcement; returns whether it was delivered
    pub async fn announce(&self, announcement: &Announcement) -> bool {
        match self.messenger.announce(&announcement.render()).await {
            Ok(status) => {
                tracing::info!(kind = announcement.kind(), status = %status, "Announcement sent");
                status.success
            }
            Err(e) => {
                tracing::error!(
                    kind = announcement.kind(),
                    channel = self.messenger.name(),
                    error = %e,
                    "Failed to send announcement"
                );
                false
            }
        }
    }

    /// Send a report to the operators; returns whether it was delivered
    pub async fn report(&mut self, message: &str, now: DateTime<Utc>) -> bool {
        if self.should_deduplicate(message, now) {
            tracing::debug!(message = %message, "Suppressing duplicate operator report");
            return false;
        }

        match self.messenger.notify_operators(message).await {
            Ok(status) => {
                self.last_reported.insert(message.to_string(), now);
                status.success
            }
            Err(e) => {
                tracing::error!(
                    channel = self.messenger.name(),
                    error = %e,
                    "Failed to notify operators"
                );
                false
            }
        }
    }

    /// Drop dedup entries older than the window
    pub fn cleanup(&mut self, now: DateTime<Utc>) {
        let window = self.dedup_window();
        self.last_reported.retain(|_, sent| now - *sent < window);
    }
}
