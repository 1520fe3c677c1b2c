//! Progression state engine
//!
//! The engine task exclusively owns the authoritative `ProgressState`.
//! Callers talk to it through an [`EngineHandle`] mailbox; each command runs
//! to completion before the next one is read. Every state change is written
//! through to the local store before the reply is sent, and a remote save is
//! scheduled on a single debounce slot.
//!
//! Remote loads/saves and anonymous sign-in run as spawned tasks that report
//! back to the engine, so local mutations keep applying while they are in
//! flight.

mod actor;

use chrono::NaiveDate;
use lexq_common::config::SyncConfig;
use lexq_common::events::{EventBus, LexqEvent, ShopItem, SyncStatus};
use lexq_common::time::{Clock, SystemClock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::info;

use crate::catalog::{Catalog, Term};
use crate::error::{EngineError, Result};
use crate::identity::{Identity, IdentityProvider};
use crate::profile::ProfileSummary;
use crate::progress::{ProgressState, StateDelta};
use crate::store::local::{load_progress, save_progress, LocalStore};
use crate::store::remote::RemoteProfileStore;
use actor::EngineActor;

/// Mailbox depth for pending commands
const COMMAND_BUFFER: usize = 64;

/// Engine timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Quiet period before a remote save
    pub debounce: Duration,
    /// Interval between calendar-day checks
    pub rollover_check: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

impl EngineSettings {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            rollover_check: Duration::from_secs(config.rollover_check_secs),
        }
    }
}

/// Point-in-time view of the engine's sync side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub sync: SyncStatus,
    pub identity: Option<Identity>,
    /// Anonymous sign-in failed earlier in this session
    pub offline: bool,
    /// A debounced remote save is waiting to fire
    pub save_pending: bool,
}

pub(crate) enum Command {
    RecordReview {
        known: bool,
        reply: oneshot::Sender<StateDelta>,
    },
    ToggleFavorite {
        reply: oneshot::Sender<StateDelta>,
    },
    RemoveFavorite {
        term_id: String,
        reply: oneshot::Sender<StateDelta>,
    },
    Purchase {
        item: ShopItem,
        cost: u32,
        reply: oneshot::Sender<Result<StateDelta>>,
    },
    CompleteQuiz {
        correct_count: u32,
        reply: oneshot::Sender<StateDelta>,
    },
    ClaimQuest {
        id: String,
        reply: oneshot::Sender<Result<StateDelta>>,
    },
    ApplyDailyRollover {
        /// None means "today" per the engine clock
        today: Option<NaiveDate>,
        reply: oneshot::Sender<StateDelta>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    RetrySync {
        reply: oneshot::Sender<Result<()>>,
    },
    Snapshot {
        reply: oneshot::Sender<ProgressState>,
    },
    Status {
        reply: oneshot::Sender<EngineStatus>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Entry point for assembling and starting an engine
pub struct Engine;

impl Engine {
    pub fn builder(catalog: Catalog, local: Arc<dyn LocalStore>) -> EngineBuilder {
        EngineBuilder {
            catalog: Arc::new(catalog),
            local,
            remote: None,
            identity: None,
            clock: Arc::new(SystemClock),
            events: Arc::new(EventBus::default()),
            settings: EngineSettings::default(),
            rng_seed: None,
        }
    }
}

pub struct EngineBuilder {
    catalog: Arc<Catalog>,
    local: Arc<dyn LocalStore>,
    remote: Option<Arc<dyn RemoteProfileStore>>,
    identity: Option<Arc<dyn IdentityProvider>>,
    clock: Arc<dyn Clock>,
    events: Arc<EventBus>,
    settings: EngineSettings,
    rng_seed: Option<u64>,
}

impl EngineBuilder {
    pub fn remote(mut self, remote: Arc<dyn RemoteProfileStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn identity(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(provider);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Deterministic term selection for tests
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Load local progress, run the daily rollover and spawn the engine task
    pub async fn start(self) -> Result<EngineHandle> {
        let mut state = load_progress(self.local.as_ref(), self.catalog.len()).await;

        let today = self.clock.today();
        let rollover = state.apply_daily_rollover(today);
        if rollover.changed {
            save_progress(self.local.as_ref(), &state).await?;
        }
        for notice in rollover.notices {
            self.events.emit_lossy(LexqEvent::notice(notice));
        }

        info!(
            xp = state.xp,
            streak = state.streak,
            terms = self.catalog.len(),
            "Progress engine starting"
        );

        let identity_rx = self.identity.as_ref().map(|provider| provider.subscribe());
        let rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let actor = EngineActor::new(
            state,
            Arc::clone(&self.catalog),
            self.local,
            self.remote,
            self.identity,
            Arc::clone(&self.clock),
            Arc::clone(&self.events),
            self.settings,
            rng,
            rx,
            identity_rx,
        );
        tokio::spawn(actor.run());

        Ok(EngineHandle {
            tx,
            catalog: self.catalog,
            clock: self.clock,
            events: self.events,
        })
    }
}

/// Cloneable handle to a running engine
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
    catalog: Arc<Catalog>,
    clock: Arc<dyn Clock>,
    events: Arc<EventBus>,
}

impl EngineHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| EngineError::EngineStopped)?;
        rx.await.map_err(|_| EngineError::EngineStopped)
    }

    /// Mark the current term known or unknown and move on
    pub async fn record_review(&self, known: bool) -> Result<StateDelta> {
        self.request(|reply| Command::RecordReview { known, reply }).await
    }

    pub async fn toggle_favorite(&self) -> Result<StateDelta> {
        self.request(|reply| Command::ToggleFavorite { reply }).await
    }

    pub async fn remove_favorite(&self, term_id: &str) -> Result<StateDelta> {
        let term_id = term_id.to_string();
        self.request(|reply| Command::RemoveFavorite { term_id, reply })
            .await
    }

    /// Buy `item` for `cost` coins
    pub async fn purchase(&self, item: ShopItem, cost: u32) -> Result<StateDelta> {
        self.request(|reply| Command::Purchase { item, cost, reply })
            .await?
    }

    pub async fn complete_quiz(&self, correct_count: u32) -> Result<StateDelta> {
        self.request(|reply| Command::CompleteQuiz {
            correct_count,
            reply,
        })
        .await
    }

    pub async fn claim_quest(&self, id: &str) -> Result<StateDelta> {
        let id = id.to_string();
        self.request(|reply| Command::ClaimQuest { id, reply }).await?
    }

    /// Run the rollover for the engine clock's current date
    pub async fn apply_daily_rollover(&self) -> Result<StateDelta> {
        self.request(|reply| Command::ApplyDailyRollover { today: None, reply })
            .await
    }

    /// Run the rollover for an explicit date
    pub async fn apply_daily_rollover_on(&self, today: NaiveDate) -> Result<StateDelta> {
        self.request(|reply| Command::ApplyDailyRollover {
            today: Some(today),
            reply,
        })
        .await
    }

    /// Wipe all progress in both stores
    pub async fn reset(&self) -> Result<()> {
        self.request(|reply| Command::Reset { reply }).await
    }

    /// Re-issue the remote save immediately
    pub async fn retry_sync(&self) -> Result<()> {
        self.request(|reply| Command::RetrySync { reply }).await?
    }

    pub async fn snapshot(&self) -> Result<ProgressState> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn status(&self) -> Result<EngineStatus> {
        self.request(|reply| Command::Status { reply }).await
    }

    pub async fn sync_status(&self) -> Result<SyncStatus> {
        Ok(self.status().await?.sync)
    }

    pub async fn profile(&self) -> Result<ProfileSummary> {
        let state = self.snapshot().await?;
        Ok(ProfileSummary::build(&state, &self.catalog, self.clock.today()))
    }

    /// The term the cursor points at
    pub async fn current_term(&self) -> Result<Option<Term>> {
        let state = self.snapshot().await?;
        Ok(self.catalog.get(state.cursor).cloned())
    }

    /// Flush any pending remote save, wait for in-flight calls, then stop
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LexqEvent> {
        self.events.subscribe()
    }
}
