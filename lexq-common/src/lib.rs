//! # LexQuest Common Library
//!
//! Shared code for the LexQuest workspace including:
//! - Error type and result alias
//! - Configuration loading and root folder resolution
//! - Event types (LexqEvent enum) and the EventBus
//! - Calendar date helpers

pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
