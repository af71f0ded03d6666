//! End-to-end relay tests
//!
//! Real clients and a JSON store, driven tick by tick with explicit times.

use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;
use wiremock::MockServer;

use herald::storage::{JsonStateStore, StateStore};

use super::fixtures::{
    build_scheduler, config, hits, live_body, mount_discord, mount_twitch, mount_youtube,
    offline_body, posted_to, ANNOUNCE_CHANNEL, OPERATOR_CHANNEL, YOUTUBE_PREFIX,
};

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap()
}

#[tokio::test]
async fn test_new_video_reaches_discord_and_disk() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let state_path = dir.path().join("state.json");
    mount_youtube(&server, "abc", "Ep1").await;
    mount_twitch(&server, offline_body()).await;
    mount_discord(&server).await;

    let config = config(&server, &state_path);
    let mut scheduler = build_scheduler(&config);
    scheduler.restore().await.unwrap();

    let report = scheduler.tick(t0()).await.unwrap();
    assert_eq!(report.announced, 1);

    let announcements = posted_to(&server, ANNOUNCE_CHANNEL).await;
    assert_eq!(announcements.len(), 1);
    assert!(announcements[0].contains("Ep1"));
    assert!(announcements[0].contains("abc"));
    assert!(posted_to(&server, OPERATOR_CHANNEL).await.is_empty());

    let saved = JsonStateStore::new(&state_path).load().await.unwrap();
    assert_eq!(saved.video.map(|v| v.id), Some("abc".to_string()));
    assert!(saved.live.is_none());
}

#[tokio::test]
async fn test_live_session_announced_with_channel_link() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_youtube(&server, "abc", "Ep1").await;
    mount_twitch(&server, live_body("Ranked grind")).await;
    mount_discord(&server).await;

    let mut scheduler = build_scheduler(&config(&server, &dir.path().join("state.json")));
    scheduler.tick(t0()).await.unwrap();

    let announcements = posted_to(&server, ANNOUNCE_CHANNEL).await;
    assert_eq!(announcements.len(), 2);
    let live = announcements
        .iter()
        .find(|a| a.contains("twitch.tv"))
        .expect("live announcement");
    assert!(live.contains("Ranked grind"));
    assert!(live.contains("https://www.twitch.tv/some_channel"));
    assert!(live.contains("@everyone"));
}

#[tokio::test]
async fn test_cooldown_avoids_upstream_calls() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_youtube(&server, "abc", "Ep1").await;
    mount_twitch(&server, live_body("Ranked grind")).await;
    mount_discord(&server).await;

    let mut scheduler = build_scheduler(&config(&server, &dir.path().join("state.json")));
    scheduler.tick(t0()).await.unwrap();
    let playlist_calls = hits(&server, &format!("{YOUTUBE_PREFIX}/playlistItems")).await;
    let stream_calls = hits(&server, "/helix/streams").await;

    for minutes in [1, 30, 120, 300] {
        scheduler.tick(t0() + Duration::minutes(minutes)).await.unwrap();
    }

    assert_eq!(hits(&server, &format!("{YOUTUBE_PREFIX}/playlistItems")).await, playlist_calls);
    assert_eq!(hits(&server, "/helix/streams").await, stream_calls);
    assert_eq!(posted_to(&server, ANNOUNCE_CHANNEL).await.len(), 2);
}

#[tokio::test]
async fn test_restart_resumes_from_disk() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let state_path = dir.path().join("state.json");
    mount_youtube(&server, "abc", "Ep1").await;
    mount_twitch(&server, offline_body()).await;
    mount_discord(&server).await;

    let config = config(&server, &state_path);
    {
        let mut scheduler = build_scheduler(&config);
        scheduler.restore().await.unwrap();
        scheduler.tick(t0()).await.unwrap();
    }

    let mut restarted = build_scheduler(&config);
    let restored = restarted.restore().await.unwrap();
    assert_eq!(restored.video.as_ref().map(|v| v.id.as_str()), Some("abc"));

    restarted.tick(t0() + Duration::hours(7)).await.unwrap();
    assert_eq!(posted_to(&server, ANNOUNCE_CHANNEL).await.len(), 1);
}
