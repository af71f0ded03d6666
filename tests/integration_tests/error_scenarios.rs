//! Error scenario integration tests
//!
//! Tests failure modes of the platforms:
//! 1. Live platform login exhaustion
//! 2. Video platform outages and timeouts
//! 3. Messaging platform rejections

use chrono::{TimeZone, Utc};
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use herald::error::Error;
use herald::storage::{JsonStateStore, StateStore};

use super::fixtures::{
    build_scheduler, channels_body, config, hits, mount_discord, mount_twitch, mount_youtube,
    offline_body, playlist_body, posted_to, ANNOUNCE_CHANNEL, DISCORD_PREFIX, OAUTH_PREFIX,
    OPERATOR_CHANNEL, YOUTUBE_PREFIX,
};

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap()
}

// ============================================================================
// Live platform
// ============================================================================

#[tokio::test]
async fn test_login_exhaustion_stops_the_relay() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_youtube(&server, "abc", "Ep1").await;
    mount_discord(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{OAUTH_PREFIX}/token")))
        .respond_with(ResponseTemplate::new(500))
        .expect(6)
        .mount(&server)
        .await;

    let mut scheduler = build_scheduler(&config(&server, &dir.path().join("state.json")));
    let err = scheduler.tick(t0()).await.unwrap_err();

    assert!(matches!(err, Error::AuthExhausted { attempts: 6, .. }));
    let reports = posted_to(&server, OPERATOR_CHANNEL).await;
    assert_eq!(reports.len(), 1);
    assert!(reports[0].starts_with("Giving up on Twitch login"));
}

#[tokio::test]
async fn test_run_until_returns_login_exhaustion() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_youtube(&server, "abc", "Ep1").await;
    mount_discord(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{OAUTH_PREFIX}/token")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": 400,
            "message": "invalid client secret"
        })))
        .mount(&server)
        .await;

    let mut scheduler = build_scheduler(&config(&server, &dir.path().join("state.json")));
    let result = scheduler.run_until(std::future::pending::<()>()).await;

    assert!(matches!(result, Err(Error::AuthExhausted { .. })));
    assert_eq!(hits(&server, "/oauth2/token").await, 6);
}

// ============================================================================
// Video platform
// ============================================================================

#[tokio::test]
async fn test_video_outage_is_reported_and_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_twitch(&server, offline_body()).await;
    mount_discord(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("{YOUTUBE_PREFIX}/channels")))
        .respond_with(ResponseTemplate::new(200).set_body_json(channels_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{YOUTUBE_PREFIX}/playlistItems")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{YOUTUBE_PREFIX}/playlistItems")))
        .respond_with(ResponseTemplate::new(200).set_body_json(playlist_body("abc", "Ep1")))
        .mount(&server)
        .await;

    let mut scheduler = build_scheduler(&config(&server, &dir.path().join("state.json")));

    let report = scheduler.tick(t0()).await.unwrap();
    assert_eq!(report.video_action, Some("report_failure"));
    let reports = posted_to(&server, OPERATOR_CHANNEL).await;
    assert!(reports[0].contains("Could not fetch latest video"));
    assert!(reports[0].contains("503"));

    // Nothing stored, so the next tick fetches again
    let report = scheduler.tick(t0() + chrono::Duration::minutes(1)).await.unwrap();
    assert_eq!(report.announced, 1);
    assert_eq!(posted_to(&server, ANNOUNCE_CHANNEL).await.len(), 1);
}

#[tokio::test]
async fn test_video_timeout_is_reported() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_twitch(&server, offline_body()).await;
    mount_discord(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("{YOUTUBE_PREFIX}/channels")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(channels_body())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let mut scheduler = build_scheduler(&config(&server, &dir.path().join("state.json")));
    let report = scheduler.tick(t0()).await.unwrap();

    assert_eq!(report.video_action, Some("report_failure"));
    let reports = posted_to(&server, OPERATOR_CHANNEL).await;
    assert!(reports[0].contains("Request timeout"));
}

// ============================================================================
// Messaging platform
// ============================================================================

#[tokio::test]
async fn test_discord_rejection_keeps_state() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let state_path = dir.path().join("state.json");
    mount_youtube(&server, "abc", "Ep1").await;
    mount_twitch(&server, offline_body()).await;

    Mock::given(method("POST"))
        .and(path_regex(format!(r"^{DISCORD_PREFIX}/channels/\d+/messages$")))
        .respond_with(ResponseTemplate::new(403).set_body_string("Missing Access"))
        .mount(&server)
        .await;

    let mut scheduler = build_scheduler(&config(&server, &state_path));
    let report = scheduler.tick(t0()).await.unwrap();

    assert_eq!(report.announced, 0);
    let saved = JsonStateStore::new(&state_path).load().await.unwrap();
    assert_eq!(saved.video.map(|v| v.id), Some("abc".to_string()));
}

#[tokio::test]
async fn test_unwritable_state_is_reported() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_youtube(&server, "abc", "Ep1").await;
    mount_twitch(&server, offline_body()).await;
    mount_discord(&server).await;

    // The state path is an existing directory, so the final rename fails
    let state_path = dir.path().join("state.json");
    std::fs::create_dir_all(&state_path).unwrap();

    let mut scheduler = build_scheduler(&config(&server, &state_path));
    let report = scheduler.tick(t0()).await.unwrap();

    assert_eq!(report.persist_failures, 1);
    assert_eq!(posted_to(&server, ANNOUNCE_CHANNEL).await.len(), 1);
    let reports = posted_to(&server, OPERATOR_CHANNEL).await;
    assert!(reports.iter().any(|r| r.starts_with("Could not update state")));
}
