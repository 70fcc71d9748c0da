//! Configuration and store factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizline_core::engine::EngineConfig;
use quizline_core::store::MemoryStore;
use quizline_core::traits::AttemptStore;

use crate::file::JsonFileStore;

/// Environment variable that overrides the file store path.
pub const STORE_PATH_ENV: &str = "QUIZLINE_STORE_PATH";

/// Which attempt store backend to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Attempts vanish when the process exits.
    Memory,
    File {
        #[serde(default = "default_store_path")]
        path: PathBuf,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./quizline-data/attempts.json")
}

/// Top-level quizline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizlineConfig {
    /// Where attempts are kept.
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default = "default_seconds_per_question")]
    pub seconds_per_question: u32,
    #[serde(default = "default_time_boost")]
    pub time_boost_secs: u32,
    /// Delay before a revealed answer moves on, in milliseconds.
    #[serde(default = "default_reveal_delay")]
    pub reveal_delay_ms: u64,
    /// Delay between a timeout and the automatic skip, in milliseconds.
    #[serde(default = "default_timeout_grace")]
    pub timeout_grace_ms: u64,
    #[serde(default = "default_feedback")]
    pub feedback_ms: u64,
    #[serde(default = "default_alert")]
    pub alert_ms: u64,
    /// Attempts older than this many days are pruned.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Question bank file; the built-in bank when unset.
    #[serde(default)]
    pub bank: Option<PathBuf>,
    /// Fixed shuffle seed.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_seconds_per_question() -> u32 {
    30
}
fn default_time_boost() -> u32 {
    15
}
fn default_reveal_delay() -> u64 {
    1500
}
fn default_timeout_grace() -> u64 {
    1000
}
fn default_feedback() -> u64 {
    2000
}
fn default_alert() -> u64 {
    3000
}
fn default_retention_days() -> u32 {
    30
}

impl Default for QuizlineConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            seconds_per_question: default_seconds_per_question(),
            time_boost_secs: default_time_boost(),
            reveal_delay_ms: default_reveal_delay(),
            timeout_grace_ms: default_timeout_grace(),
            feedback_ms: default_feedback(),
            alert_ms: default_alert(),
            retention_days: default_retention_days(),
            bank: None,
            seed: None,
        }
    }
}

impl QuizlineConfig {
    /// Engine settings derived from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            seconds_per_question: self.seconds_per_question,
            time_boost_secs: self.time_boost_secs,
            reveal_delay: Duration::from_millis(self.reveal_delay_ms),
            timeout_grace: Duration::from_millis(self.timeout_grace_ms),
            feedback_duration: Duration::from_millis(self.feedback_ms),
            alert_duration: Duration::from_millis(self.alert_ms),
            seed: self.seed,
            ..EngineConfig::default()
        }
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizline.toml` in the current directory
/// 2. `~/.config/quizline/config.toml`
///
/// `QUIZLINE_STORE_PATH` overrides the store path and switches to the file
/// backend.
pub fn load_config() -> Result<QuizlineConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizlineConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizline.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<QuizlineConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => QuizlineConfig::default(),
    };

    if let StoreConfig::File { path } = &mut config.store {
        *path = PathBuf::from(resolve_env_vars(&path.to_string_lossy()));
    }

    if let Ok(path) = std::env::var(STORE_PATH_ENV) {
        if !path.is_empty() {
            config.store = StoreConfig::File {
                path: PathBuf::from(path),
            };
        }
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizline"))
}

/// Create a store instance from its configuration.
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn AttemptStore>> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreConfig::File { path } => {
            let store = JsonFileStore::open(path)
                .await
                .with_context(|| format!("failed to open attempt store: {}", path.display()))?;
            Ok(Arc::new(store))
        }
    }
}
