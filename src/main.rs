//! TicShare Client Core
//!
//! The state-synchronization and session engine behind the TicShare private
//! cloud client: collections loaded from a path-addressed remote document
//! store, optimistic local mutations with asynchronous write-through, and a
//! single-account session gating per-account data. Run headless, it restores
//! a session, loads the collections and reports status.

mod client;
mod config;
mod errors;
mod models;
mod notify;
mod quota;
mod remote;
mod session;
mod store;
mod upload;
mod workflow;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use client::Client;
use config::Config;
use remote::{HttpRemoteStore, MemoryRemoteStore, RemoteStore};
use session::MemoryTabStorage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting TicShare client core");
    tracing::info!("Remote store: {}", config.remote_base_url);
    tracing::info!("Upload ceiling: {} bytes", config.max_upload_bytes);
    tracing::info!("Quota capacity: {} bytes", config.quota_capacity_bytes);

    // Wire the engine against the real HTTP document store, or an empty
    // in-memory one for offline runs.
    let remote: Arc<dyn RemoteStore> = if config.remote_base_url == "memory" {
        Arc::new(MemoryRemoteStore::new())
    } else {
        Arc::new(HttpRemoteStore::new(&config.remote_base_url))
    };
    let client = Client::new(config, remote, Box::new(MemoryTabStorage::new()));

    // Activation: restore the session and fetch the collections once. A
    // failed load is not fatal; the engine keeps its local defaults.
    if let Err(e) = client.activate().await {
        tracing::warn!("Activation load failed, continuing with defaults: {}", e);
    }

    let directory = client.directory().await;
    tracing::info!("Account directory loaded with {} entries", directory.len());
    for entry in &directory {
        tracing::info!("  {} ({})", entry.display_name, entry.id);
    }

    match client.active_account() {
        Some(id) => tracing::info!("Active session: {}", id),
        None => tracing::info!("No persisted session; authentication required"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
