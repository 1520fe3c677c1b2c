//! # LexQuest Progress Engine (lexq-engine)
//!
//! Gamified vocabulary progression: XP, coins, streaks, daily quests and a
//! shop, persisted to a local SQLite store and mirrored to a per-user remote
//! document.
//!
//! **Architecture:** a single engine task owns the [`progress::ProgressState`];
//! callers send commands through an [`EngineHandle`]. State transitions are
//! pure functions in [`progress`], so they are tested without any runtime.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod identity;
pub mod profile;
pub mod progress;
pub mod quiz;
pub mod store;
pub mod sync;

pub use engine::{Engine, EngineBuilder, EngineHandle, EngineSettings, EngineStatus};
pub use error::{EngineError, Result};
