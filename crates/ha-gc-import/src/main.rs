//! Garbage collection YAML import
//!
//! Usage: `ha-gc-import [CONFIG_DIR]`
//!
//! Reads `configuration.yaml` from the config directory (default `.`), runs
//! every `garbage_collection` sensor through the import flow and stores the
//! created entries in `.storage/core.config_entries`. Log level follows
//! `RUST_LOG`, default `info`.

use anyhow::{Context, Result};
use ha_config_entries::{ConfigEntries, ConfigEntriesFlowManager, Storage};
use ha_garbage_collection::async_import_yaml;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    info!("Importing garbage collection sensors from {}", config_dir.display());

    let storage = Arc::new(Storage::new(&config_dir));
    let entries = Arc::new(ConfigEntries::new(storage));
    entries
        .load()
        .await
        .context("loading config entries")?;
    info!("Loaded {} config entries", entries.len());

    let flows = ConfigEntriesFlowManager::new(entries.clone());
    let summary = async_import_yaml(&entries, &flows, config_dir.join("configuration.yaml"))
        .await
        .context("importing configuration.yaml")?;

    for title in &summary.created {
        info!("Created entry {}", title);
    }
    for flow_id in &summary.pending {
        warn!("Flow {} is waiting on a form and was not stored", flow_id);
    }
    info!(
        "Import finished: {} created, {} skipped, {} pending, {} failed",
        summary.created.len(),
        summary.skipped.len(),
        summary.pending.len(),
        summary.failed.len()
    );

    Ok(())
}
