use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use herald::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "herald",
    version,
    about = "Announce new YouTube uploads and Twitch live sessions on Discord",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (TOML); environment variables are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the config file
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll and announce until Ctrl-C
    Run {
        /// Log messages instead of sending them
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// Poll both sources once and exit
    Once {
        /// Log messages instead of sending them
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// Print the persisted state
    State,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.command {
        Commands::State => Config::read(cli.config.as_deref())?,
        _ => Config::load(cli.config.as_deref())?,
    };

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "herald starting");

    match cli.command {
        Commands::Run { dry_run } => {
            config.log_summary();
            let dry_run = dry_run || config.dry_run;
            tracing::info!(dry_run = %dry_run, "Starting run command");
            commands::run(config, dry_run).await?;
        }

        Commands::Once { dry_run } => {
            config.log_summary();
            let dry_run = dry_run || config.dry_run;
            tracing::info!(dry_run = %dry_run, "Starting once command");
            commands::once(config, dry_run).await?;
        }

        Commands::State => {
            commands::show_state(config).await?;
        }
    }

    tracing::info!("herald stopped");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("herald=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| tracing_subscriber::EnvFilter::try_new(format!("herald={level},warn")))?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
