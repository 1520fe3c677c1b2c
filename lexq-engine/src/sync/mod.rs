//! Local/remote reconciliation protocol
//!
//! Status machine: `Idle`, `Saving`, `Synced`, `SyncFailed`. Every remote
//! load or save enters `Saving` and settles on `Synced` or `SyncFailed`.
//! Failures never touch the in-memory state.

pub mod debounce;
pub mod reconcile;

pub use debounce::DebounceSlot;
pub use reconcile::{reconcile, Reconciliation};

use lexq_common::events::{EventBus, LexqEvent, SyncStatus};
use std::sync::Arc;
use tracing::debug;

/// Current sync status, published on the event bus when it changes
pub struct SyncTracker {
    status: SyncStatus,
    events: Arc<EventBus>,
}

impl SyncTracker {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            status: SyncStatus::Idle,
            events,
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn set(&mut self, new_status: SyncStatus) {
        if new_status == self.status {
            return;
        }
        let old_status = std::mem::replace(&mut self.status, new_status);
        debug!(%old_status, %new_status, "Sync status changed");
        self.events.emit_lossy(LexqEvent::SyncStatusChanged {
            old_status,
            new_status,
            timestamp: chrono::Utc::now(),
        });
    }
}
