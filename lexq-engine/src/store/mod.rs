//! Replicas of the progress state
//!
//! - `local`: durable key-value blob store, written through on every mutation
//! - `remote`: per-user profile store, written on a debounce

pub mod local;
pub mod remote;

pub use local::{LocalStore, MemoryLocalStore, SqliteLocalStore, PROGRESS_KEY};
pub use remote::{HttpProfileStore, MemoryProfileStore, RemoteProfileStore};
