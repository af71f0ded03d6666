use anyhow::{Context, Result};

use herald::config::Config;
use herald::storage::open_store;

/// Print the persisted state as JSON
pub async fn show_state(config: Config) -> Result<()> {
    let store = open_store(&config.storage).context("Failed to open state store")?;
    let state = store.load().await.context("Failed to load persisted state")?;

    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
