//! Engine task: owns the state and serializes every input

use chrono::NaiveDate;
use lexq_common::events::{EventBus, LexqEvent, MergeOutcome, Notice, SyncStatus};
use lexq_common::time::Clock;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::{Command, EngineSettings, EngineStatus};
use crate::catalog::Catalog;
use crate::error::{EngineError, IdentityError, RemoteError, Result};
use crate::identity::{Identity, IdentityEvent, IdentityProvider};
use crate::progress::{ProgressState, StateDelta};
use crate::store::local::{save_progress, LocalStore};
use crate::store::remote::RemoteProfileStore;
use crate::sync::{debounce, reconcile, DebounceSlot, SyncTracker};

/// Result of a spawned network call, reported back to the engine task
enum Completion {
    Loaded {
        uid: String,
        result: std::result::Result<Option<ProgressState>, RemoteError>,
    },
    Saved {
        uid: String,
        result: std::result::Result<(), RemoteError>,
    },
    AnonymousSignIn(std::result::Result<(), IdentityError>),
}

pub(super) struct EngineActor {
    state: ProgressState,
    catalog: Arc<Catalog>,
    local: Arc<dyn LocalStore>,
    remote: Option<Arc<dyn RemoteProfileStore>>,
    identity_provider: Option<Arc<dyn IdentityProvider>>,
    clock: Arc<dyn Clock>,
    events: Arc<EventBus>,
    sync: SyncTracker,
    debounce: DebounceSlot,
    rollover_check: Duration,
    identity: Option<Identity>,
    offline: bool,
    rng: StdRng,
    commands: mpsc::Receiver<Command>,
    identity_rx: Option<mpsc::UnboundedReceiver<IdentityEvent>>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    /// Remote loads/saves not yet reported back
    in_flight: usize,
    /// Uid whose login load has not been reconciled yet; remote saves wait for it
    pending_load: Option<String>,
}

impl EngineActor {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        state: ProgressState,
        catalog: Arc<Catalog>,
        local: Arc<dyn LocalStore>,
        remote: Option<Arc<dyn RemoteProfileStore>>,
        identity_provider: Option<Arc<dyn IdentityProvider>>,
        clock: Arc<dyn Clock>,
        events: Arc<EventBus>,
        settings: EngineSettings,
        rng: StdRng,
        commands: mpsc::Receiver<Command>,
        identity_rx: Option<mpsc::UnboundedReceiver<IdentityEvent>>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            state,
            catalog,
            local,
            remote,
            identity_provider,
            clock,
            sync: SyncTracker::new(Arc::clone(&events)),
            events,
            debounce: DebounceSlot::new(settings.debounce),
            rollover_check: settings.rollover_check,
            identity: None,
            offline: false,
            rng,
            commands,
            identity_rx,
            completions_tx,
            completions_rx,
            in_flight: 0,
            pending_load: None,
        }
    }

    pub(super) async fn run(mut self) {
        let mut rollover_tick = tokio::time::interval(self.rollover_check);
        rollover_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately; startup already ran the rollover
        rollover_tick.tick().await;

        loop {
            let deadline = self.debounce.deadline();

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => {
                        if let Some(reply) = self.handle_command(command).await {
                            self.drain().await;
                            let _ = reply.send(());
                            break;
                        }
                    }
                    None => {
                        debug!("All engine handles dropped");
                        self.drain().await;
                        break;
                    }
                },
                event = next_identity_event(&mut self.identity_rx) => match event {
                    Some(event) => self.handle_identity(event),
                    None => self.identity_rx = None,
                },
                Some(completion) = self.completions_rx.recv() => {
                    self.handle_completion(completion).await;
                }
                _ = debounce::sleep_until(deadline), if deadline.is_some() => {
                    self.debounce.cancel();
                    self.spawn_save();
                }
                _ = rollover_tick.tick() => {
                    let today = self.clock.today();
                    let delta = self.state.apply_daily_rollover(today);
                    self.commit(&delta).await;
                }
            }
        }

        info!("Progress engine stopped");
    }

    /// Apply one command; returns the reply channel when it asks to stop
    async fn handle_command(&mut self, command: Command) -> Option<oneshot::Sender<()>> {
        match command {
            Command::RecordReview { known, reply } => {
                let today = self.clock.today();
                let delta = self
                    .state
                    .record_review(known, &self.catalog, today, &mut self.rng);
                self.commit(&delta).await;
                let _ = reply.send(delta);
            }
            Command::ToggleFavorite { reply } => {
                let delta = self.state.toggle_favorite(&self.catalog);
                self.commit(&delta).await;
                let _ = reply.send(delta);
            }
            Command::RemoveFavorite { term_id, reply } => {
                let delta = self.state.remove_favorite(&term_id);
                self.commit(&delta).await;
                let _ = reply.send(delta);
            }
            Command::Purchase { item, cost, reply } => {
                let result = self.state.purchase(item, cost).map_err(EngineError::from);
                let _ = reply.send(self.settle(result).await);
            }
            Command::CompleteQuiz {
                correct_count,
                reply,
            } => {
                let today = self.clock.today();
                let delta = self.state.complete_quiz(correct_count, today);
                self.commit(&delta).await;
                let _ = reply.send(delta);
            }
            Command::ClaimQuest { id, reply } => {
                let result = self.state.claim_quest(&id).map_err(EngineError::from);
                let _ = reply.send(self.settle(result).await);
            }
            Command::ApplyDailyRollover { today, reply } => {
                let today: NaiveDate = today.unwrap_or_else(|| self.clock.today());
                let delta = self.state.apply_daily_rollover(today);
                self.commit(&delta).await;
                let _ = reply.send(delta);
            }
            Command::Reset { reply } => {
                self.reset().await;
                let _ = reply.send(());
            }
            Command::RetrySync { reply } => {
                let _ = reply.send(self.retry_sync());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.state.clone());
            }
            Command::Status { reply } => {
                let _ = reply.send(EngineStatus {
                    sync: self.sync.status(),
                    identity: self.identity.clone(),
                    offline: self.offline,
                    save_pending: self.debounce.is_armed(),
                });
            }
            Command::Shutdown { reply } => return Some(reply),
        }
        None
    }

    /// Commit a fallible transition or surface its error as a notice
    async fn settle(&mut self, result: Result<StateDelta>) -> Result<StateDelta> {
        match result {
            Ok(delta) => {
                self.commit(&delta).await;
                Ok(delta)
            }
            Err(e) => {
                debug!("Action rejected: {}", e);
                self.publish(&Notice::ActionFailed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Publish notices; on change write through locally and arm the remote save
    async fn commit(&mut self, delta: &StateDelta) {
        for notice in &delta.notices {
            self.publish(notice);
        }
        if !delta.changed {
            return;
        }

        self.persist_local().await;
        if self.pending_load.is_none() && self.remote_target().is_some() {
            self.debounce.arm();
        }
    }

    async fn persist_local(&mut self) {
        match save_progress(self.local.as_ref(), &self.state).await {
            Ok(()) => self.events.emit_lossy(LexqEvent::StateSaved {
                xp: self.state.xp,
                coins: self.state.coins,
                timestamp: chrono::Utc::now(),
            }),
            Err(e) => error!("Local persistence failed: {}", e),
        }
    }

    fn publish(&self, notice: &Notice) {
        debug!(%notice, "Notice");
        self.events.emit_lossy(LexqEvent::notice(notice.clone()));
    }

    async fn reset(&mut self) {
        info!("Resetting all progress");
        self.state = ProgressState::default();
        self.state.normalize(self.catalog.len());
        self.persist_local().await;
        self.events.emit_lossy(LexqEvent::ProgressReset {
            timestamp: chrono::Utc::now(),
        });

        self.debounce.cancel();
        self.spawn_save();
    }

    fn retry_sync(&mut self) -> Result<()> {
        if self.remote_target().is_none() {
            return Err(EngineError::SyncUnavailable(
                "no signed-in user with a remote store".to_string(),
            ));
        }
        if self.pending_load.is_some() {
            return Err(EngineError::SyncUnavailable(
                "remote profile still loading".to_string(),
            ));
        }
        info!("Manual sync retry");
        self.debounce.cancel();
        self.spawn_save();
        Ok(())
    }

    /// Remote store and uid when a known user is signed in
    fn remote_target(&self) -> Option<(Arc<dyn RemoteProfileStore>, String)> {
        let identity = self.identity.as_ref().filter(|id| id.is_known())?;
        let remote = self.remote.as_ref()?;
        Some((Arc::clone(remote), identity.uid.clone()))
    }

    /// Push the current state; the snapshot is taken now, not when the call runs
    fn spawn_save(&mut self) {
        let Some((remote, uid)) = self.remote_target() else {
            return;
        };
        let snapshot = self.state.clone();
        let tx = self.completions_tx.clone();

        self.in_flight += 1;
        self.sync.set(SyncStatus::Saving);
        debug!(%uid, xp = snapshot.xp, "Remote save started");

        tokio::spawn(async move {
            let result = remote.save(&uid, &snapshot).await;
            let _ = tx.send(Completion::Saved { uid, result });
        });
    }

    fn spawn_load(&mut self, uid: String) {
        let Some(remote) = self.remote.as_ref().map(Arc::clone) else {
            return;
        };
        let tx = self.completions_tx.clone();

        self.in_flight += 1;
        self.pending_load = Some(uid.clone());
        self.debounce.cancel();
        self.sync.set(SyncStatus::Saving);
        info!(%uid, "Loading remote profile");

        tokio::spawn(async move {
            let result = remote.load(&uid).await;
            let _ = tx.send(Completion::Loaded { uid, result });
        });
    }

    fn handle_identity(&mut self, event: IdentityEvent) {
        match event {
            IdentityEvent::SignedIn { uid, is_anonymous } => {
                info!(%uid, is_anonymous, "Signed in");
                self.events.emit_lossy(LexqEvent::IdentityChanged {
                    uid: Some(uid.clone()),
                    is_anonymous,
                    timestamp: chrono::Utc::now(),
                });
                self.identity = Some(Identity {
                    uid: uid.clone(),
                    is_anonymous,
                });

                if is_anonymous {
                    self.pending_load = None;
                    self.debounce.cancel();
                    self.sync.set(SyncStatus::Idle);
                } else {
                    self.spawn_load(uid);
                }
            }
            IdentityEvent::SignedOut => {
                info!("Signed out");
                self.identity = None;
                self.pending_load = None;
                self.debounce.cancel();
                self.sync.set(SyncStatus::Idle);
                self.events.emit_lossy(LexqEvent::IdentityChanged {
                    uid: None,
                    is_anonymous: false,
                    timestamp: chrono::Utc::now(),
                });
                self.request_anonymous_sign_in();
            }
        }
    }

    fn request_anonymous_sign_in(&mut self) {
        if self.offline {
            debug!("Offline mode: not requesting anonymous sign-in");
            return;
        }
        let Some(provider) = self.identity_provider.as_ref().map(Arc::clone) else {
            return;
        };
        let tx = self.completions_tx.clone();

        tokio::spawn(async move {
            let result = provider.sign_in_anonymously().await;
            let _ = tx.send(Completion::AnonymousSignIn(result));
        });
    }

    async fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Loaded { uid, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                if self.pending_load.as_deref() == Some(uid.as_str()) {
                    self.pending_load = None;
                }
                if !self.is_current_user(&uid) {
                    debug!(%uid, "Ignoring remote profile for previous identity");
                    return;
                }
                match result {
                    Ok(remote) => self.apply_remote(remote).await,
                    Err(e) => {
                        warn!(%uid, "Remote load failed, keeping local progress: {}", e);
                        self.sync.set(SyncStatus::SyncFailed);
                    }
                }
            }
            Completion::Saved { uid, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                match result {
                    Ok(()) => {
                        debug!(%uid, "Remote save complete");
                        self.sync.set(SyncStatus::Synced);
                    }
                    Err(e) => {
                        warn!(%uid, "Remote save failed: {}", e);
                        self.sync.set(SyncStatus::SyncFailed);
                    }
                }
            }
            Completion::AnonymousSignIn(Ok(())) => debug!("Anonymous sign-in requested"),
            Completion::AnonymousSignIn(Err(e)) => {
                warn!("Running in offline mode for this session: {}", e);
                self.offline = true;
            }
        }
    }

    fn is_current_user(&self, uid: &str) -> bool {
        self.identity
            .as_ref()
            .is_some_and(|id| id.is_known() && id.uid == uid)
    }

    /// Merge a freshly loaded remote snapshot against the current local state
    async fn apply_remote(&mut self, remote: Option<ProgressState>) {
        let remote_xp = remote.as_ref().map(|s| s.xp);
        let remote_current = remote.as_ref() == Some(&self.state);
        let merged = reconcile(&self.state, remote);
        info!(
            outcome = ?merged.outcome,
            local_xp = self.state.xp,
            ?remote_xp,
            "Reconciled remote profile"
        );

        match merged.outcome {
            MergeOutcome::FirstSync => {
                self.state = merged.state;
                self.spawn_save();
            }
            MergeOutcome::RemoteWins => {
                self.state = merged.state;
                self.state.normalize(self.catalog.len());
                self.persist_local().await;
                self.sync.set(SyncStatus::Synced);

                // The remote copy may predate today
                let today = self.clock.today();
                let delta = self.state.apply_daily_rollover(today);
                self.commit(&delta).await;
            }
            MergeOutcome::LocalWins => {
                let changed = self.state != merged.state;
                self.state = merged.state;
                if changed {
                    self.persist_local().await;
                }
                // A stale remote copy stays `Saving` until the armed save lands
                if remote_current && !changed {
                    self.sync.set(SyncStatus::Synced);
                } else {
                    self.debounce.arm();
                }
            }
        }

        self.events.emit_lossy(LexqEvent::ProgressMerged {
            outcome: merged.outcome,
            xp: self.state.xp,
            timestamp: chrono::Utc::now(),
        });
    }

    fn try_next_identity_event(&mut self) -> Option<IdentityEvent> {
        self.identity_rx.as_mut()?.try_recv().ok()
    }

    /// Flush the debounce slot and wait until no remote call is in flight
    ///
    /// Identity events already queued are applied first, so a login that
    /// raced the shutdown still loads and saves.
    async fn drain(&mut self) {
        loop {
            while let Some(event) = self.try_next_identity_event() {
                self.handle_identity(event);
            }
            if self.debounce.cancel() {
                self.spawn_save();
            }
            if self.in_flight == 0 {
                break;
            }
            match self.completions_rx.recv().await {
                Some(completion) => self.handle_completion(completion).await,
                None => break,
            }
        }
    }
}

async fn next_identity_event(
    rx: &mut Option<mpsc::UnboundedReceiver<IdentityEvent>>,
) -> Option<IdentityEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
