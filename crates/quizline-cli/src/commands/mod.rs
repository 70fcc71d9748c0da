//! Subcommand implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use quizline_core::traits::AttemptStore;
use quizline_store::config::{create_store, load_config_from, QuizlineConfig, StoreConfig};

pub mod characters;
pub mod history;
pub mod init;
pub mod leaderboard;
pub mod manage;
pub mod play;
pub mod validate;

/// Load the config (with `--store` applied) and open its store.
pub async fn open(
    config_path: Option<PathBuf>,
    store_path: Option<PathBuf>,
) -> Result<(QuizlineConfig, Arc<dyn AttemptStore>)> {
    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(path) = store_path {
        config.store = StoreConfig::File { path };
    }
    let store = create_store(&config.store).await?;
    tracing::debug!(store = store.name(), "attempt store ready");
    Ok((config, store))
}
