//! Mapping from poll outcomes to actions

use crate::models::{LiveRecord, VideoRecord};
use crate::poller::PollOutcome;

/// What the scheduler should do with a poll outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<R> {
    /// Persist the record, then announce it
    PersistAndAnnounce(R),
    /// New content seen during do-not-disturb; nothing is persisted or sent
    SuppressedByDnd(R),
    /// Nothing to do
    Noop,
    /// Tell the operators a fetch failed
    ReportFailure(String),
}

impl<R> Action<R> {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PersistAndAnnounce(_) => "persist_and_announce",
            Self::SuppressedByDnd(_) => "suppressed_by_dnd",
            Self::Noop => "noop",
            Self::ReportFailure(_) => "report_failure",
        }
    }
}

/// Stateless decision rules for both sources
///
/// During do-not-disturb new content of either kind is held back without
/// being persisted, so it is detected again on the first tick after the window.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnnouncementDecider;

impl AnnouncementDecider {
    pub fn new() -> Self {
        Self
    }

    pub fn decide_video(&self, outcome: PollOutcome<VideoRecord>, dnd_active: bool) -> Action<VideoRecord> {
        match outcome {
            PollOutcome::New(record) if dnd_active => Action::SuppressedByDnd(record),
            PollOutcome::New(record) => Action::PersistAndAnnounce(record),
            PollOutcome::FetchFailed(message) => Action::ReportFailure(message),
            PollOutcome::Unchanged | PollOutcome::Offline => Action::Noop,
        }
    }

    pub fn decide_live(&self, outcome: PollOutcome<LiveRecord>, dnd_active: bool) -> Action<LiveRecord> {
        match outcome {
            PollOutcome::New(record) if dnd_active => Action::SuppressedByDnd(record),
            PollOutcome::New(record) => Action::PersistAndAnnounce(record),
            PollOutcome::FetchFailed(message) => Action::ReportFailure(message),
            PollOutcome::Unchanged | PollOutcome::Offline => Action::Noop,
        }
    }
}
