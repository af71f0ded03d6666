//! Test fixtures for integration tests
//!
//! Provides platform payloads, a config pointing every client at one mock
//! server, and a scheduler builder.

use serde_json::{json, Value};
use std::path::Path;

use herald::config::{Config, StorageBackend};
use herald::notifications::{DiscordChannel, NotificationManager};
use herald::poller::{LivePoller, VideoPoller};
use herald::scheduler::{Scheduler, SchedulerSettings};
use herald::sources::{TwitchClient, YouTubeClient};
use herald::storage::open_store;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ANNOUNCE_CHANNEL: u64 = 111;
pub const OPERATOR_CHANNEL: u64 = 222;
pub const YOUTUBE_CHANNEL: &str = "UCchannel";
pub const UPLOADS_PLAYLIST: &str = "UUchannel";
pub const TWITCH_CHANNEL: &str = "some_channel";

pub const YOUTUBE_PREFIX: &str = "/youtube/v3";
pub const HELIX_PREFIX: &str = "/helix";
pub const OAUTH_PREFIX: &str = "/oauth2";
pub const DISCORD_PREFIX: &str = "/discord/api/v10";

/// Config with every API base on `server` and DND disabled
pub fn config(server: &MockServer, state_path: &Path) -> Config {
    let mut config = Config::default();

    config.discord.token = "bot-token".to_string();
    config.discord.announce_channel_id = ANNOUNCE_CHANNEL;
    config.discord.operator_channel_id = OPERATOR_CHANNEL;
    config.discord.api_base = format!("{}{DISCORD_PREFIX}", server.uri());

    config.youtube.channel_id = YOUTUBE_CHANNEL.to_string();
    config.youtube.api_keys = vec!["key-1".to_string()];
    config.youtube.api_base = format!("{}{YOUTUBE_PREFIX}", server.uri());

    config.twitch.channel = TWITCH_CHANNEL.to_string();
    config.twitch.client_id = "client-id".to_string();
    config.twitch.client_secret = "client-secret".to_string();
    config.twitch.auth_retry_interval_secs = 0;
    config.twitch.api_base = format!("{}{HELIX_PREFIX}", server.uri());
    config.twitch.auth_base = format!("{}{OAUTH_PREFIX}", server.uri());

    config.schedule.dnd_enabled = false;
    config.storage.backend = StorageBackend::Json;
    config.storage.path = state_path.to_path_buf();
    config.request_timeout_secs = 2;

    config
}

/// Wire the production components from `config`
pub fn build_scheduler(config: &Config) -> Scheduler {
    config.validate().expect("fixture config should be valid");
    let timeout = config.request_timeout();

    let video = YouTubeClient::new(&config.youtube, timeout).unwrap();
    let live = TwitchClient::new(&config.twitch, config.auth_retry(), timeout).unwrap();
    let discord = DiscordChannel::new(&config.discord, timeout).unwrap();

    Scheduler::new(
        VideoPoller::new(Box::new(video), config.youtube.cooldown_hours),
        LivePoller::new(Box::new(live), config.twitch.cooldown_hours),
        open_store(&config.storage).unwrap(),
        NotificationManager::new(Box::new(discord)),
        SchedulerSettings::from_config(config).unwrap(),
    )
}

pub fn channels_body() -> Value {
    json!({
        "items": [{
            "id": YOUTUBE_CHANNEL,
            "contentDetails": {"relatedPlaylists": {"uploads": UPLOADS_PLAYLIST}}
        }]
    })
}

pub fn playlist_body(video_id: &str, title: &str) -> Value {
    json!({
        "items": [{
            "snippet": {
                "publishedAt": "2024-03-01T12:00:00Z",
                "title": title,
                "resourceId": {"kind": "youtube#video", "videoId": video_id}
            }
        }]
    })
}

pub fn live_body(title: &str) -> Value {
    json!({
        "data": [{
            "user_login": TWITCH_CHANNEL,
            "type": "live",
            "title": title,
            "started_at": "2024-03-01T22:00:00Z"
        }]
    })
}

pub fn offline_body() -> Value {
    json!({"data": [], "pagination": {}})
}

pub async fn mount_youtube(server: &MockServer, video_id: &str, title: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{YOUTUBE_PREFIX}/channels")))
        .respond_with(ResponseTemplate::new(200).set_body_json(channels_body()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{YOUTUBE_PREFIX}/playlistItems")))
        .respond_with(ResponseTemplate::new(200).set_body_json(playlist_body(video_id, title)))
        .mount(server)
        .await;
}

pub async fn mount_twitch(server: &MockServer, streams: Value) {
    Mock::given(method("POST"))
        .and(path(format!("{OAUTH_PREFIX}/token")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "app-token"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{OAUTH_PREFIX}/validate")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"client_id": "client-id"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{HELIX_PREFIX}/streams")))
        .respond_with(ResponseTemplate::new(200).set_body_json(streams))
        .mount(server)
        .await;
}

pub async fn mount_discord(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path_regex(format!(r"^{DISCORD_PREFIX}/channels/\d+/messages$")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "9001"})))
        .mount(server)
        .await;
}

/// Message contents posted to `channel_id`, in order
pub async fn posted_to(server: &MockServer, channel_id: u64) -> Vec<String> {
    let target = format!("{DISCORD_PREFIX}/channels/{channel_id}/messages");
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == "POST" && r.url.path() == target)
        .filter_map(|r| serde_json::from_slice::<Value>(&r.body).ok())
        .filter_map(|body| body["content"].as_str().map(String::from))
        .collect()
}

/// Number of requests received on `request_path`
pub async fn hits(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}
