//! Durable local store
//!
//! One serialized state blob under a fixed namespaced key. The SQLite
//! implementation keeps it in a single `kv_store` table.

use async_trait::async_trait;
use lexq_common::{Error, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};

use crate::progress::ProgressState;

/// Key under which the progress blob is stored
pub const PROGRESS_KEY: &str = "lexquest.progress.v1";

/// Key-value blob persistence
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// SQLite-backed local store
pub struct SqliteLocalStore {
    pool: SqlitePool,
}

impl SqliteLocalStore {
    /// Open (creating if needed) the database file
    pub async fn open(db_path: &Path) -> Result<Self> {
        let newly_created = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect(&db_url)
            .await?;

        if newly_created {
            info!("Initialized new database: {}", db_path.display());
        } else {
            info!("Opened existing database: {}", db_path.display());
        }

        sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
        sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

        Self::with_pool(pool).await
    }

    /// Private in-memory database, single connection
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(lexq_common::time::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Process-local store for tests and throwaway sessions
#[derive(Default)]
pub struct MemoryLocalStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| Error::Internal(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| Error::Internal(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Load the persisted progress, falling back to a fresh default
///
/// A missing blob means first launch. An unreadable or malformed blob is
/// discarded with a warning; the next write replaces it.
pub async fn load_progress(store: &dyn LocalStore, catalog_len: usize) -> ProgressState {
    let mut state = match store.get(PROGRESS_KEY).await {
        Ok(Some(blob)) => match ProgressState::from_json(&blob) {
            Ok(state) => state,
            Err(e) => {
                warn!("Discarding persisted progress: {}", e);
                ProgressState::default()
            }
        },
        Ok(None) => {
            info!("No persisted progress found, starting fresh");
            ProgressState::default()
        }
        Err(e) => {
            warn!("Local store read failed, starting fresh: {}", e);
            ProgressState::default()
        }
    };
    state.normalize(catalog_len);
    state
}

/// Write the full state blob
pub async fn save_progress(store: &dyn LocalStore, state: &ProgressState) -> crate::error::Result<()> {
    let blob = state.to_json()?;
    store.set(PROGRESS_KEY, &blob).await?;
    Ok(())
}
