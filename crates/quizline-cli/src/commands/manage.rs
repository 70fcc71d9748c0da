//! The `quizline rename`, `delete`, `prune` and `clear` commands.

use std::path::PathBuf;

use anyhow::Result;

use quizline_core::model::{AttemptId, AttemptPatch};

pub async fn rename(
    config_path: Option<PathBuf>,
    store_path: Option<PathBuf>,
    id: AttemptId,
    name: String,
) -> Result<()> {
    let name = name.trim().to_string();
    anyhow::ensure!(!name.is_empty(), "name must not be empty");

    let (_, store) = super::open(config_path, store_path).await?;
    let patch = AttemptPatch {
        participant_name: Some(name),
        ..Default::default()
    };
    let updated = store.update(id, patch).await?;
    println!(
        "Attempt #{} now belongs to {}.",
        updated.id, updated.participant_name
    );
    Ok(())
}

pub async fn delete(
    config_path: Option<PathBuf>,
    store_path: Option<PathBuf>,
    id: AttemptId,
) -> Result<()> {
    let (_, store) = super::open(config_path, store_path).await?;
    if store.delete(id).await? {
        println!("Deleted attempt #{id}.");
    } else {
        println!("No attempt #{id}; nothing deleted.");
    }
    Ok(())
}

pub async fn prune(
    config_path: Option<PathBuf>,
    store_path: Option<PathBuf>,
    retention_days: Option<u32>,
) -> Result<()> {
    let (config, store) = super::open(config_path, store_path).await?;
    let retention = match retention_days {
        Some(days) => chrono::Duration::days(i64::from(days)),
        None => config.retention(),
    };

    let removed = store.prune_older_than(retention).await?;
    println!(
        "Removed {removed} attempt(s) older than {} day(s).",
        retention.num_days()
    );
    Ok(())
}

pub async fn clear(config_path: Option<PathBuf>, store_path: Option<PathBuf>, yes: bool) -> Result<()> {
    anyhow::ensure!(yes, "refusing to clear the store without --yes");

    let (_, store) = super::open(config_path, store_path).await?;
    store.clear().await?;
    println!("Store cleared.");
    Ok(())
}
