//! Configuration management for the herald relay
//!
//! This module handles loading and validating configuration from a TOML file
//! and environment variables. The resulting [`Config`] is immutable and passed
//! into the scheduler, pollers and clients at construction time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::scheduler::dnd::DndWindow;
use crate::utils::mask_secret;
use crate::utils::retry::RetryConfig;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Messaging platform configuration
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Video platform configuration
    #[serde(default)]
    pub youtube: YouTubeConfig,

    /// Live-streaming platform configuration
    #[serde(default)]
    pub twitch: TwitchConfig,

    /// Polling cadence and do-not-disturb window
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Persisted state backend
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Log announcements instead of sending them
    #[serde(default)]
    pub dry_run: bool,

    /// Timeout for every upstream HTTP request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Messaging platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token
    pub token: String,

    /// Public channel receiving announcements
    pub announce_channel_id: u64,

    /// Operator-only channel receiving failure reports
    pub operator_channel_id: u64,

    /// Guild the bot moderates (needed for kicks)
    pub guild_id: Option<u64>,

    /// REST API base URL
    pub api_base: String,

    /// Suppress identical operator reports within this window (0 disables)
    pub operator_dedup_minutes: i64,
}

/// Video platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTubeConfig {
    /// Watched channel ID
    pub channel_id: String,

    /// API keys, tried in order until one is accepted
    pub api_keys: Vec<String>,

    /// Hours before a confirmed video is re-checked
    pub cooldown_hours: f64,

    /// Data API base URL
    pub api_base: String,
}

/// Live-streaming platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitchConfig {
    /// Watched channel login name
    pub channel: String,

    /// Application client ID
    pub client_id: String,

    /// Application client secret
    pub client_secret: String,

    /// Hours before a confirmed live session is re-checked
    pub cooldown_hours: f64,

    /// Login retries after the first failed attempt
    pub auth_max_retries: u32,

    /// Fixed sleep between login attempts, in seconds
    pub auth_retry_interval_secs: u64,

    /// Helix API base URL
    pub api_base: String,

    /// OAuth2 base URL
    pub auth_base: String,
}

/// Polling cadence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Interval between ticks outside do-not-disturb, in seconds
    pub poll_interval_secs: u64,

    /// Interval between ticks during do-not-disturb, in minutes
    pub dnd_interval_minutes: u64,

    /// Enable the do-not-disturb window
    pub dnd_enabled: bool,

    /// Inclusive hour range as "start,end" (e.g. "00,09")
    pub dnd_hours: String,

    /// IANA timezone the hour range is evaluated in
    pub timezone: String,
}

/// Persisted state backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Json,
    Sqlite,
}

impl FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::config(format!("unknown storage backend '{other}'"))),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend kind
    pub backend: StorageBackend,

    /// File path of the JSON document or SQLite database
    pub path: PathBuf,

    /// Days of history kept by the SQLite backend
    pub retention_days: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

fn default_request_timeout() -> u64 {
    30
}

/// Upper bound for `storage.retention_days` (about a century)
pub const MAX_RETENTION_DAYS: i64 = 36_500;

impl Default for Config {
    fn default() -> Self {
        Self {
            discord: DiscordConfig::default(),
            youtube: YouTubeConfig::default(),
            twitch: TwitchConfig::default(),
            schedule: ScheduleConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            dry_run: false,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            announce_channel_id: 0,
            operator_channel_id: 0,
            guild_id: None,
            api_base: String::from("https://discord.com/api/v10"),
            operator_dedup_minutes: 0,
        }
    }
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            channel_id: String::new(),
            api_keys: Vec::new(),
            cooldown_hours: 6.0,
            api_base: String::from("https://www.googleapis.com/youtube/v3"),
        }
    }
}

impl Default for TwitchConfig {
    fn default() -> Self {
        Self {
            channel: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            cooldown_hours: 6.0,
            auth_max_retries: 5,
            auth_retry_interval_secs: 10,
            api_base: String::from("https://api.twitch.tv/helix"),
            auth_base: String::from("https://id.twitch.tv/oauth2"),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            dnd_interval_minutes: 15,
            dnd_enabled: true,
            dnd_hours: String::from("00,09"),
            timezone: String::from("America/Sao_Paulo"),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Json,
            path: PathBuf::from("data/state.json"),
            retention_days: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// Read and parse an optional environment variable
///
/// A present but unparsable value is a configuration error rather than a
/// silent fallback to the default.
fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::config(format!("{key} has an invalid value '{raw}'"))),
        Err(_) => Ok(None),
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = env_parse("DISCORD_ANNOUNCE_CHANNEL_ID")? {
            config.discord.announce_channel_id = v;
        }
        if let Some(v) = env_parse("DISCORD_OPERATOR_CHANNEL_ID")? {
            config.discord.operator_channel_id = v;
        }
        config.discord.guild_id = env_parse("DISCORD_GUILD_ID")?;
        if let Some(v) = env_parse("HERALD_OPERATOR_DEDUP_MINUTES")? {
            config.discord.operator_dedup_minutes = v;
        }

        if let Some(v) = env_string("YOUTUBE_CHANNEL_ID") {
            config.youtube.channel_id = v;
        }
        if let Some(v) = env_parse("HERALD_VIDEO_COOLDOWN_HOURS")? {
            config.youtube.cooldown_hours = v;
        }

        if let Some(v) = env_string("TWITCH_CHANNEL") {
            config.twitch.channel = v;
        }
        if let Some(v) = env_parse("HERALD_LIVE_COOLDOWN_HOURS")? {
            config.twitch.cooldown_hours = v;
        }
        if let Some(v) = env_parse("HERALD_AUTH_MAX_RETRIES")? {
            config.twitch.auth_max_retries = v;
        }
        if let Some(v) = env_parse("HERALD_AUTH_RETRY_INTERVAL_SECS")? {
            config.twitch.auth_retry_interval_secs = v;
        }

        if let Some(v) = env_parse("HERALD_POLL_INTERVAL_SECS")? {
            config.schedule.poll_interval_secs = v;
        }
        if let Some(v) = env_parse("HERALD_DND_INTERVAL_MINUTES")? {
            config.schedule.dnd_interval_minutes = v;
        }
        if let Some(v) = env_parse("HERALD_DND_ENABLED")? {
            config.schedule.dnd_enabled = v;
        }
        if let Some(v) = env_string("HERALD_DND_HOURS") {
            config.schedule.dnd_hours = v;
        }
        if let Some(v) = env_string("HERALD_TIMEZONE") {
            config.schedule.timezone = v;
        }

        if let Some(v) = env_parse("HERALD_STORAGE_BACKEND")? {
            config.storage.backend = v;
        }
        if let Some(v) = env_string("HERALD_STORAGE_PATH") {
            config.storage.path = PathBuf::from(v);
        }
        if let Some(v) = env_parse("HERALD_RETENTION_DAYS")? {
            config.storage.retention_days = v;
        }

        if let Some(v) = env_string("HERALD_LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Some(v) = env_string("HERALD_LOG_FORMAT") {
            config.logging.format = v;
        }
        if let Some(v) = env_parse("HERALD_DRY_RUN")? {
            config.dry_run = v;
        }
        if let Some(v) = env_parse("HERALD_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout_secs = v;
        }

        config.apply_env_secrets();
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read config file {}: {e}", path.display()))
        })?;

        Self::from_toml(&content)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("invalid TOML: {e}")))
    }

    /// Read from `path` when given, otherwise from the environment
    ///
    /// Secrets found in the environment always override file values. The
    /// result is not validated.
    pub fn read(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let mut config = Self::from_file(path)?;
                config.apply_env_secrets();
                Ok(config)
            }
            None => Self::from_env(),
        }
    }

    /// Read and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay credentials from the environment
    pub fn apply_env_secrets(&mut self) {
        if let Some(v) = env_string("DISCORD_TOKEN") {
            self.discord.token = v;
        }
        if let Some(v) = env_string("TWITCH_CLIENT_ID") {
            self.twitch.client_id = v;
        }
        if let Some(v) = env_string("TWITCH_CLIENT_SECRET") {
            self.twitch.client_secret = v;
        }
        if let Some(v) = env_string("YOUTUBE_API_KEYS") {
            self.youtube.api_keys = split_list(&v);
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("discord.token", self.discord.token.as_str()),
            ("youtube.channel_id", self.youtube.channel_id.as_str()),
            ("twitch.channel", self.twitch.channel.as_str()),
            ("twitch.client_id", self.twitch.client_id.as_str()),
            ("twitch.client_secret", self.twitch.client_secret.as_str()),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::config(format!("{name} is missing")));
            }
        }

        if self.discord.announce_channel_id == 0 {
            return Err(Error::config("discord.announce_channel_id is missing"));
        }
        if self.discord.operator_channel_id == 0 {
            return Err(Error::config("discord.operator_channel_id is missing"));
        }

        if self.youtube.api_keys.iter().all(|k| k.trim().is_empty()) {
            return Err(Error::config("youtube.api_keys is missing"));
        }

        for (name, hours) in [
            ("youtube.cooldown_hours", self.youtube.cooldown_hours),
            ("twitch.cooldown_hours", self.twitch.cooldown_hours),
        ] {
            if !hours.is_finite() || hours < 0.0 {
                return Err(Error::config(format!("{name} must be a non-negative number")));
            }
        }

        if self.schedule.poll_interval_secs == 0 {
            return Err(Error::config("schedule.poll_interval_secs must be greater than 0"));
        }
        if self.schedule.dnd_interval_minutes == 0 {
            return Err(Error::config("schedule.dnd_interval_minutes must be greater than 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::config("request_timeout_secs must be greater than 0"));
        }
        if !(1..=MAX_RETENTION_DAYS).contains(&self.storage.retention_days) {
            return Err(Error::config(format!(
                "storage.retention_days must be between 1 and {MAX_RETENTION_DAYS}"
            )));
        }

        DndWindow::from_config(&self.schedule)
            .map_err(|e| Error::config(format!("schedule: {e}")))?;

        Ok(())
    }

    /// Interval between ticks outside do-not-disturb
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.poll_interval_secs)
    }

    /// Interval between ticks during do-not-disturb
    #[must_use]
    pub fn dnd_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.dnd_interval_minutes.saturating_mul(60))
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Retry policy for the live platform login
    #[must_use]
    pub fn auth_retry(&self) -> RetryConfig {
        RetryConfig::fixed(
            self.twitch.auth_max_retries,
            Duration::from_secs(self.twitch.auth_retry_interval_secs),
        )
    }

    /// Log the effective configuration with secrets masked
    pub fn log_summary(&self) {
        tracing::info!(
            twitch_channel = %self.twitch.channel,
            youtube_channel = %self.youtube.channel_id,
            poll_interval_secs = self.schedule.poll_interval_secs,
            dnd_interval_minutes = self.schedule.dnd_interval_minutes,
            dnd_hours = %self.schedule.dnd_hours,
            timezone = %self.schedule.timezone,
            "Schedule configuration"
        );
        tracing::info!(
            video_cooldown_hours = self.youtube.cooldown_hours,
            live_cooldown_hours = self.twitch.cooldown_hours,
            auth_max_retries = self.twitch.auth_max_retries,
            "Cooldown configuration"
        );
        tracing::info!(
            discord_token = %mask_secret(&self.discord.token, 4),
            twitch_client_id = %mask_secret(&self.twitch.client_id, 4),
            youtube_keys = self.youtube.api_keys.len(),
            storage = ?self.storage.backend,
            storage_path = %self.storage.path.display(),
            dry_run = self.dry_run,
            "Credentials and storage"
        );
    }
}
