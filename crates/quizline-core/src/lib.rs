//! quizline-core: Quiz session engine, powers, and attempt storage contract.
//!
//! This crate defines the data model, the session state machine and its
//! timer-driven engine, and the store trait that the rest of quizline builds
//! on.

pub mod bank;
pub mod engine;
pub mod error;
pub mod leaderboard;
pub mod model;
pub mod power;
pub mod session;
pub mod statistics;
pub mod store;
pub mod traits;
