//! Common test utilities
//!
//! Scripted fakes for the upstream sources and the messenger. Every fake is
//! `Clone` and shares its state, so a test keeps one handle and gives a boxed
//! clone to the code under test.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use herald::models::{LiveStatus, VideoUpload};
use herald::notifications::channels::{ChannelError, ChannelResult, DeliveryStatus};
use herald::notifications::{MessageRef, Messenger, NotificationManager, UserRef};
use herald::poller::{LivePoller, VideoPoller};
use herald::scheduler::{DndWindow, Scheduler, SchedulerSettings};
use herald::sources::{LiveSource, VideoSource};
use herald::storage::MemoryStateStore;
use herald::utils::error::FetchError;

pub const COOLDOWN_HOURS: f64 = 6.0;

/// Fixed instant outside the Sao Paulo DND window (12:00 local)
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap()
}

/// Instant inside the Sao Paulo DND window (03:00 local)
pub fn night() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 2, 6, 0, 0).unwrap()
}

pub fn upload(id: &str, title: &str) -> VideoUpload {
    VideoUpload {
        id: id.to_string(),
        title: title.to_string(),
        published_at: t0(),
    }
}

/// One scripted upstream answer
#[derive(Debug, Clone)]
pub enum Step<T> {
    Ok(T),
    ServerError(u16),
    AuthExhausted(u32),
}

impl<T: Clone> Step<T> {
    fn resolve(&self) -> Result<T, FetchError> {
        match self {
            Self::Ok(value) => Ok(value.clone()),
            Self::ServerError(status) => Err(FetchError::ServerError(*status)),
            Self::AuthExhausted(attempts) => Err(FetchError::AuthExhausted {
                attempts: *attempts,
                reason: "Server error: 500".to_string(),
            }),
        }
    }
}

/// Queue of answers; the last one repeats forever
#[derive(Debug)]
struct Script<T> {
    steps: Mutex<VecDeque<Step<T>>>,
    calls: AtomicUsize,
}

impl<T: Clone> Script<T> {
    fn new(steps: Vec<Step<T>>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
        }
    }

    fn next(&self) -> Result<T, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut steps = self.steps.lock().unwrap();
        let step = if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps.front().cloned().expect("script has no steps")
        };
        step.resolve()
    }

    fn push(&self, step: Step<T>) {
        let mut steps = self.steps.lock().unwrap();
        steps.clear();
        steps.push_back(step);
    }
}

#[derive(Clone)]
pub struct FakeVideoSource {
    script: Arc<Script<VideoUpload>>,
}

impl FakeVideoSource {
    pub fn new(steps: Vec<Step<VideoUpload>>) -> Self {
        Self {
            script: Arc::new(Script::new(steps)),
        }
    }

    pub fn always(id: &str, title: &str) -> Self {
        Self::new(vec![Step::Ok(upload(id, title))])
    }

    /// Replace the script with a single repeating answer
    pub fn set(&self, step: Step<VideoUpload>) {
        self.script.push(step);
    }

    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoSource for FakeVideoSource {
    fn name(&self) -> &str {
        "fake-video"
    }

    async fn latest_video(&self) -> Result<VideoUpload, FetchError> {
        self.script.next()
    }
}

#[derive(Clone)]
pub struct FakeLiveSource {
    script: Arc<Script<LiveStatus>>,
}

impl FakeLiveSource {
    pub fn new(steps: Vec<Step<LiveStatus>>) -> Self {
        Self {
            script: Arc::new(Script::new(steps)),
        }
    }

    pub fn offline() -> Self {
        Self::new(vec![Step::Ok(LiveStatus::offline())])
    }

    pub fn live(title: &str) -> Self {
        Self::new(vec![Step::Ok(LiveStatus::live(title, None))])
    }

    pub fn set(&self, step: Step<LiveStatus>) {
        self.script.push(step);
    }

    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LiveSource for FakeLiveSource {
    fn name(&self) -> &str {
        "fake-live"
    }

    async fn check_live(&self) -> Result<LiveStatus, FetchError> {
        self.script.next()
    }
}

/// Messenger that records every call
#[derive(Clone, Default)]
pub struct RecordingMessenger {
    announcements: Arc<Mutex<Vec<String>>>,
    reports: Arc<Mutex<Vec<String>>>,
    fail_announce: Arc<Mutex<bool>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn announcements(&self) -> Vec<String> {
        self.announcements.lock().unwrap().clone()
    }

    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().unwrap().clone()
    }

    pub fn fail_announcements(&self, fail: bool) {
        *self.fail_announce.lock().unwrap() = fail;
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    fn name(&self) -> &str {
        "recording"
    }

    async fn announce(&self, text: &str) -> ChannelResult<DeliveryStatus> {
        if *self.fail_announce.lock().unwrap() {
            return Err(ChannelError::Other("announce channel offline".to_string()));
        }
        self.announcements.lock().unwrap().push(text.to_string());
        Ok(DeliveryStatus::success("recording"))
    }

    async fn notify_operators(&self, text: &str) -> ChannelResult<DeliveryStatus> {
        self.reports.lock().unwrap().push(text.to_string());
        Ok(DeliveryStatus::success("recording"))
    }

    async fn delete_message(&self, _message: &MessageRef) -> ChannelResult<DeliveryStatus> {
        Ok(DeliveryStatus::success("recording"))
    }

    async fn kick_user(&self, _user: &UserRef, _reason: &str) -> ChannelResult<DeliveryStatus> {
        Ok(DeliveryStatus::success("recording"))
    }
}

/// Everything a scheduler test needs to inspect
pub struct Harness {
    pub video: FakeVideoSource,
    pub live: FakeLiveSource,
    pub store: MemoryStateStore,
    pub messenger: RecordingMessenger,
}

impl Harness {
    pub fn new(video: FakeVideoSource, live: FakeLiveSource) -> Self {
        Self {
            video,
            live,
            store: MemoryStateStore::new(),
            messenger: RecordingMessenger::new(),
        }
    }

    pub fn with_store(mut self, store: MemoryStateStore) -> Self {
        self.store = store;
        self
    }

    pub fn settings(dnd: bool) -> SchedulerSettings {
        SchedulerSettings {
            poll_interval: Duration::from_millis(10),
            dnd_interval: Duration::from_millis(20),
            dnd: dnd.then(|| DndWindow::parse("00,09", "America/Sao_Paulo").unwrap()),
            live_channel: "some_channel".to_string(),
        }
    }

    /// Build a scheduler over clones of the fakes
    pub fn scheduler(&self, dnd: bool) -> Scheduler {
        Scheduler::new(
            VideoPoller::new(Box::new(self.video.clone()), COOLDOWN_HOURS),
            LivePoller::new(Box::new(self.live.clone()), COOLDOWN_HOURS),
            Box::new(self.store.clone()),
            NotificationManager::new(Box::new(self.messenger.clone())),
            Self::settings(dnd),
        )
    }
}
