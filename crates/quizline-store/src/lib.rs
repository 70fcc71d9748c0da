//! quizline-store: Local attempt store backends.
//!
//! Implements the `AttemptStore` trait over a single JSON file, and provides
//! the configuration layer that picks a backend.

pub mod config;
pub mod file;

pub use config::{create_store, load_config, load_config_from, QuizlineConfig, StoreConfig};
pub use file::JsonFileStore;
