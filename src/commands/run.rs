use anyhow::{Context, Result};
use chrono::Utc;

use herald::config::Config;
use herald::notifications::{DiscordChannel, LogChannel, Messenger, NotificationManager};
use herald::poller::{LivePoller, VideoPoller};
use herald::scheduler::{Scheduler, SchedulerSettings};
use herald::sources::{TwitchClient, YouTubeClient};
use herald::storage::open_store;

/// Wire the scheduler from configuration
///
/// A dry run logs announcements and reports instead of posting them; state
/// is still persisted.
pub fn build_scheduler(config: &Config, dry_run: bool) -> Result<Scheduler> {
    let timeout = config.request_timeout();

    let video = YouTubeClient::new(&config.youtube, timeout)
        .context("Failed to create YouTube client")?;
    let live = TwitchClient::new(&config.twitch, config.auth_retry(), timeout)
        .context("Failed to create Twitch client")?;

    let messenger: Box<dyn Messenger> = if dry_run {
        tracing::warn!("Dry run: messages are logged, not sent");
        Box::new(LogChannel::new())
    } else {
        Box::new(
            DiscordChannel::new(&config.discord, timeout)
                .context("Failed to create Discord channel")?,
        )
    };
    let notifier = NotificationManager::new(messenger)
        .with_dedup_window(config.discord.operator_dedup_minutes);

    let store = open_store(&config.storage).context("Failed to open state store")?;

    Ok(Scheduler::new(
        VideoPoller::new(Box::new(video), config.youtube.cooldown_hours),
        LivePoller::new(Box::new(live), config.twitch.cooldown_hours),
        store,
        notifier,
        SchedulerSettings::from_config(config)?,
    ))
}

/// Resolve on Ctrl-C; never resolves if the handler cannot be installed
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Run the scheduler until Ctrl-C or a fatal error
pub async fn run(config: Config, dry_run: bool) -> Result<()> {
    let mut scheduler = build_scheduler(&config, dry_run)?;
    scheduler
        .restore()
        .await
        .context("Failed to load persisted state")?;

    scheduler
        .run_until(shutdown_signal())
        .await
        .context("Scheduler stopped")?;

    Ok(())
}

/// Poll both sources once and exit
pub async fn once(config: Config, dry_run: bool) -> Result<()> {
    let mut scheduler = build_scheduler(&config, dry_run)?;
    scheduler
        .restore()
        .await
        .context("Failed to load persisted state")?;

    let report = scheduler.poll_once(Utc::now()).await?;

    println!("Poll complete");
    println!("=============");
    println!("  DND active:       {}", report.dnd_active);
    println!("  Video:            {}", report.video_action.unwrap_or("-"));
    println!("  Live:             {}", report.live_action.unwrap_or("-"));
    println!("  Announced:        {}", report.announced);
    println!("  Reported:         {}", report.reported);
    println!("  Persist failures: {}", report.persist_failures);

    Ok(())
}
