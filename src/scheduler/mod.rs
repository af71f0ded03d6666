//! Polling scheduler
//!
//! One repeating timer drives everything. Each tick evaluates the
//! do-not-disturb window, switches between the two cadences, and polls the
//! video source then the live source in sequence.
//!
//! # State machine
//!
//! ```text
//!            DND active (skip polling)
//!   ┌────────┐ ─────────────────────────▶ ┌───────┐
//!   │ Normal │                            │ Quiet │
//!   └────────┘ ◀───────────────────────── └───────┘
//!            DND over (poll on that tick)
//! ```
//!
//! `Normal` ticks every poll interval; `Quiet` ticks every DND interval.
//! Ticks never overlap. Shutdown is only observed while sleeping between
//! ticks, so an in-flight tick always completes.

pub mod dnd;
pub mod error;

use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::Result;
use crate::models::PersistedState;
use crate::notifications::{Action, Announcement, AnnouncementDecider, NotificationManager};
use crate::poller::{LivePoller, VideoPoller};
use crate::storage::StateStore;

pub use dnd::DndWindow;
pub use error::{SchedulerError, SchedulerResult};

/// Cadence the scheduler is currently running at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Normal,
    Quiet,
}

impl SchedulerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Quiet => "quiet",
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Timing and identity settings for a [`Scheduler`]
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub poll_interval: Duration,
    pub dnd_interval: Duration,
    pub dnd: Option<DndWindow>,
    /// Live channel name used in announcements
    pub live_channel: String,
}

impl SchedulerSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            poll_interval: config.poll_interval(),
            dnd_interval: config.dnd_interval(),
            dnd: DndWindow::from_config(&config.schedule)?,
            live_channel: config.twitch.channel.clone(),
        })
    }
}

/// What happened during one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// State after the tick
    pub state: SchedulerState,
    pub dnd_active: bool,
    /// False when the tick only switched into `Quiet`
    pub polled: bool,
    pub video_action: Option<&'static str>,
    pub live_action: Option<&'static str>,
    pub announced: usize,
    pub reported: usize,
    pub persist_failures: usize,
}

impl TickReport {
    fn new(state: SchedulerState, dnd_active: bool, polled: bool) -> Self {
        Self {
            state,
            dnd_active,
            polled,
            video_action: None,
            live_action: None,
            announced: 0,
            reported: 0,
            persist_failures: 0,
        }
    }
}

/// Owns the pollers, the in-memory state and the collaborators
pub struct Scheduler {
    video: VideoPoller,
    live: LivePoller,
    decider: AnnouncementDecider,
    store: Box<dyn StateStore>,
    notifier: NotificationManager,
    settings: SchedulerSettings,
    state: PersistedState,
    mode: SchedulerState,
}

impl Scheduler {
    pub fn new(
        video: VideoPoller,
        live: LivePoller,
        store: Box<dyn StateStore>,
        notifier: NotificationManager,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            video,
            live,
            decider: AnnouncementDecider::new(),
            store,
            notifier,
            settings,
            state: PersistedState::default(),
            mode: SchedulerState::Normal,
        }
    }

    /// Load the persisted state; call once before the first tick
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` when the store cannot be read
    pub async fn restore(&mut self) -> Result<&PersistedState> {
        self.state = self.store.load().await?;
        info!(
            store = self.store.name(),
            video = ?self.state.video.as_ref().map(|v| v.to_string()),
            live = ?self.state.live.as_ref().map(|l| l.to_string()),
            "Loaded persisted state"
        );
        Ok(&self.state)
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn mode(&self) -> SchedulerState {
        self.mode
    }

    /// Interval to sleep before the next tick
    pub fn current_interval(&self) -> Duration {
        match self.mode {
            SchedulerState::Normal => self.settings.poll_interval,
            SchedulerState::Quiet => self.settings.dnd_interval,
        }
    }

    fn dnd_active(&self, now: DateTime<Utc>) -> bool {
        self.settings.dnd.as_ref().is_some_and(|w| w.is_active(now))
    }

    /// Run one scheduled tick
    ///
    /// # Errors
    ///
    /// Returns `Error::AuthExhausted` when the live platform login gives up.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<TickReport> {
        let dnd_active = self.dnd_active(now);

        match (dnd_active, self.mode) {
            (true, SchedulerState::Normal) => {
                self.mode = SchedulerState::Quiet;
                info!(
                    interval_secs = self.current_interval().as_secs(),
                    "Entering do-not-disturb"
                );
                return Ok(TickReport::new(self.mode, true, false));
            }
            (false, SchedulerState::Quiet) => {
                self.mode = SchedulerState::Normal;
                info!(
                    interval_secs = self.current_interval().as_secs(),
                    "Leaving do-not-disturb"
                );
            }
            _ => {}
        }

        self.notifier.cleanup(now);
        self.poll_sources(now, dnd_active).await
    }

    /// Poll both sources once without any state transition
    ///
    /// Do-not-disturb still suppresses announcements.
    pub async fn poll_once(&mut self, now: DateTime<Utc>) -> Result<TickReport> {
        let dnd_active = self.dnd_active(now);
        self.poll_sources(now, dnd_active).await
    }

    async fn poll_sources(&mut self, now: DateTime<Utc>, dnd_active: bool) -> Result<TickReport> {
        let mut report = TickReport::new(self.mode, dnd_active, true);

        let outcome = self.video.poll(self.state.video.as_ref(), now).await;
        let action = self.decider.decide_video(outcome, dnd_active);
        report.video_action = Some(action.as_str());
        match action {
            Action::PersistAndAnnounce(record) => {
                let next = self.state.with_video(record.clone());
                self.persist(next, now, &mut report).await;
                if self.notifier.announce(&Announcement::video(record)).await {
                    report.announced += 1;
                }
            }
            Action::SuppressedByDnd(record) => {
                info!(video_id = %record.id, "New video held back during do-not-disturb");
            }
            Action::ReportFailure(message) => {
                if self.notifier.report(&message, now).await {
                    report.reported += 1;
                }
            }
            Action::Noop => {}
        }

        let outcome = match self.live.poll(self.state.live.as_ref(), now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Live platform login exhausted");
                self.notifier
                    .report(&format!("Giving up on Twitch login: {e}"), now)
                    .await;
                return Err(e);
            }
        };
        let action = self.decider.decide_live(outcome, dnd_active);
        report.live_action = Some(action.as_str());
        match action {
            Action::PersistAndAnnounce(record) => {
                let next = self.state.with_live(record.clone());
                self.persist(next, now, &mut report).await;
                let announcement = Announcement::live(record, self.settings.live_channel.clone());
                if self.notifier.announce(&announcement).await {
                    report.announced += 1;
                }
            }
            Action::SuppressedByDnd(record) => {
                info!(started_at = %record.started_at, "New live session held back during do-not-disturb");
            }
            Action::ReportFailure(message) => {
                if self.notifier.report(&message, now).await {
                    report.reported += 1;
                }
            }
            Action::Noop => {}
        }

        debug!(
            state = %report.state,
            video = ?report.video_action,
            live = ?report.live_action,
            "Tick complete"
        );
        Ok(report)
    }

    /// Advance the in-memory state and save it
    ///
    /// A failed save is reported to the operators; the in-memory state keeps
    /// the new value either way.
    async fn persist(&mut self, next: PersistedState, now: DateTime<Utc>, report: &mut TickReport) {
        self.state = next;

        if let Err(e) = self.store.save(&self.state).await {
            report.persist_failures += 1;
            error!(store = self.store.name(), error = %e, "Could not persist state");
            if self
                .notifier
                .report(&format!("Could not update state: {e}"), now)
                .await
            {
                report.reported += 1;
            }
        }
    }

    /// Tick until `shutdown` resolves or a tick fails
    ///
    /// # Errors
    ///
    /// Returns the first fatal tick error (`Error::AuthExhausted`).
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            poll_interval_secs = self.settings.poll_interval.as_secs(),
            dnd_interval_secs = self.settings.dnd_interval.as_secs(),
            dnd = ?self.settings.dnd.map(|w| w.to_string()),
            "Scheduler started"
        );

        loop {
            self.tick(Utc::now()).await?;

            let interval = self.current_interval();
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping scheduler");
                    return Ok(());
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }
}
