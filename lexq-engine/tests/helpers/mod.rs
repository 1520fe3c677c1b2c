//! Shared harness for lexq-engine integration tests
//!
//! Wires an engine to in-memory stores, a fixed clock and a host-driven
//! identity provider. Tests run on paused tokio time, so sleeping past the
//! debounce window is instant and deterministic.

#![allow(dead_code)]

use chrono::NaiveDate;
use lexq_common::events::{EventBus, LexqEvent};
use lexq_common::time::FixedClock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use lexq_engine::catalog::Catalog;
use lexq_engine::identity::LocalIdentityProvider;
use lexq_engine::progress::ProgressState;
use lexq_engine::store::local::{load_progress, save_progress};
use lexq_engine::store::{MemoryLocalStore, MemoryProfileStore};
use lexq_engine::{Engine, EngineHandle, EngineSettings};

pub const DEBOUNCE: Duration = Duration::from_millis(2000);

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
}

pub struct TestEngine {
    pub engine: EngineHandle,
    pub local: Arc<MemoryLocalStore>,
    pub remote: Arc<MemoryProfileStore>,
    pub identity: Arc<LocalIdentityProvider>,
    pub clock: Arc<FixedClock>,
    pub events: broadcast::Receiver<LexqEvent>,
}

pub struct TestEngineBuilder {
    identity: LocalIdentityProvider,
    local_state: Option<ProgressState>,
    remote: Arc<MemoryProfileStore>,
    with_remote: bool,
}

impl TestEngineBuilder {
    /// Known user `uid` signed in from the start
    pub fn signed_in(uid: &str) -> Self {
        Self::with_identity(LocalIdentityProvider::signed_in(uid))
    }

    /// Starts signed out; the engine requests anonymous sign-in
    pub fn signed_out() -> Self {
        Self::with_identity(LocalIdentityProvider::signed_out())
    }

    pub fn with_identity(identity: LocalIdentityProvider) -> Self {
        Self {
            identity,
            local_state: None,
            remote: Arc::new(MemoryProfileStore::new()),
            with_remote: true,
        }
    }

    /// Persist `state` locally before the engine starts
    pub fn local_state(mut self, state: ProgressState) -> Self {
        self.local_state = Some(state);
        self
    }

    /// Seed the remote snapshot for `uid`
    pub fn remote_state(self, uid: &str, state: ProgressState) -> Self {
        self.remote.insert(uid, state);
        self
    }

    /// Every remote load fails until cleared on the store
    pub fn failing_loads(self) -> Self {
        self.remote.set_fail_loads(true);
        self
    }

    /// Remote loads take `delay` to answer
    pub fn slow_loads(self, delay: Duration) -> Self {
        self.remote.set_load_delay(delay);
        self
    }

    pub fn without_remote(mut self) -> Self {
        self.with_remote = false;
        self
    }

    pub async fn start(self) -> TestEngine {
        let local = Arc::new(MemoryLocalStore::new());
        if let Some(state) = &self.local_state {
            save_progress(local.as_ref(), state).await.unwrap();
        }

        let clock = Arc::new(FixedClock::new(today()));
        let identity = Arc::new(self.identity);
        let bus = Arc::new(EventBus::new(1024));
        let events = bus.subscribe();

        let mut builder = Engine::builder(Catalog::builtin(), local.clone())
            .identity(identity.clone())
            .clock(clock.clone())
            .events(bus)
            .settings(EngineSettings {
                debounce: DEBOUNCE,
                rollover_check: Duration::from_secs(60),
            })
            .rng_seed(7);
        if self.with_remote {
            builder = builder.remote(self.remote.clone());
        }

        let engine = builder.start().await.unwrap();

        TestEngine {
            engine,
            local,
            remote: self.remote,
            identity,
            clock,
            events,
        }
    }
}

impl TestEngine {
    /// Let spawned network calls and identity events run to completion
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    /// Sleep past the debounce quiet period
    pub async fn past_debounce(&self) {
        tokio::time::sleep(DEBOUNCE + Duration::from_millis(100)).await;
    }

    /// Progress currently persisted in the local store
    pub async fn persisted(&self) -> ProgressState {
        load_progress(self.local.as_ref(), Catalog::builtin().len()).await
    }

    /// Drain events received so far
    pub fn drain_events(&mut self) -> Vec<LexqEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

pub fn state_with_xp(xp: u32, coins: u32) -> ProgressState {
    ProgressState {
        xp,
        coins,
        last_login_date: Some(today()),
        streak: 1,
        ..ProgressState::default()
    }
}
