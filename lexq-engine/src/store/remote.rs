//! Remote profile store
//!
//! Keyed by user id under an application namespace:
//! `{base_url}/artifacts/{app_id}/users/{uid}/data/profile`

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use crate::error::RemoteError;
use crate::progress::ProgressState;

const USER_AGENT: &str = concat!("LexQuest/", env!("CARGO_PKG_VERSION"));

/// Per-user progress snapshots held off-device
#[async_trait]
pub trait RemoteProfileStore: Send + Sync {
    /// Fetch the stored snapshot; `Ok(None)` when the user has none yet
    async fn load(&self, uid: &str) -> Result<Option<ProgressState>, RemoteError>;

    /// Overwrite the stored snapshot
    async fn save(&self, uid: &str, state: &ProgressState) -> Result<(), RemoteError>;
}

/// HTTP/JSON remote store
pub struct HttpProfileStore {
    http_client: reqwest::Client,
    base_url: String,
    app_id: String,
    api_key: Option<String>,
}

impl HttpProfileStore {
    pub fn new(
        base_url: &str,
        app_id: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id: app_id.to_string(),
            api_key,
        })
    }

    /// Document URL for a user
    pub fn profile_url(&self, uid: &str) -> String {
        format!(
            "{}/artifacts/{}/users/{}/data/profile",
            self.base_url, self.app_id, uid
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl RemoteProfileStore for HttpProfileStore {
    async fn load(&self, uid: &str) -> Result<Option<ProgressState>, RemoteError> {
        let url = self.profile_url(uid);
        debug!(%url, "Loading remote profile");

        let response = self
            .authorize(self.http_client.get(&url))
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status(status.as_u16(), body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        ProgressState::from_json(&body)
            .map(Some)
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn save(&self, uid: &str, state: &ProgressState) -> Result<(), RemoteError> {
        let url = self.profile_url(uid);
        debug!(%url, xp = state.xp, "Saving remote profile");

        let response = self
            .authorize(self.http_client.put(&url))
            .json(state)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(RemoteError::Status(status.as_u16(), body))
        }
    }
}

/// In-process remote store with failure injection
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<String, ProgressState>>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    load_delay: Mutex<Duration>,
    loads: AtomicUsize,
    saves: AtomicUsize,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user's remote snapshot
    pub fn insert(&self, uid: &str, state: ProgressState) {
        if let Ok(mut profiles) = self.profiles.lock() {
            profiles.insert(uid.to_string(), state);
        }
    }

    pub fn get(&self, uid: &str) -> Option<ProgressState> {
        self.profiles.lock().ok()?.get(uid).cloned()
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Simulated network latency for loads
    pub fn set_load_delay(&self, delay: Duration) {
        if let Ok(mut guard) = self.load_delay.lock() {
            *guard = delay;
        }
    }

    /// Load attempts so far, including failed ones
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Save attempts so far, including failed ones
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteProfileStore for MemoryProfileStore {
    async fn load(&self, uid: &str) -> Result<Option<ProgressState>, RemoteError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let delay = self.load_delay.lock().map(|d| *d).unwrap_or_default();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("injected load failure".to_string()));
        }
        Ok(self.get(uid))
    }

    async fn save(&self, uid: &str, state: &ProgressState) -> Result<(), RemoteError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("injected save failure".to_string()));
        }
        self.insert(uid, state.clone());
        Ok(())
    }
}
