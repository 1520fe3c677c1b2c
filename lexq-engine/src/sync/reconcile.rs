//! Login reconciliation: higher XP wins wholesale
//!
//! The replica with strictly greater XP becomes the authoritative state in
//! its entirety. Fields are never mixed between replicas, so XP, coins and
//! quest progress always come from the same snapshot.

use lexq_common::events::MergeOutcome;

use crate::progress::ProgressState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub state: ProgressState,
    pub outcome: MergeOutcome,
}

impl Reconciliation {
    /// True when the authoritative state differs from the local copy
    pub fn replaces_local(&self) -> bool {
        self.outcome == MergeOutcome::RemoteWins
    }
}

/// Choose the authoritative state between the local copy and a remote snapshot
///
/// A winner with an empty quest set gets fresh quests before it is accepted.
pub fn reconcile(local: &ProgressState, remote: Option<ProgressState>) -> Reconciliation {
    let (mut state, outcome) = match remote {
        None => (local.clone(), MergeOutcome::FirstSync),
        Some(remote) if remote.xp > local.xp => (remote, MergeOutcome::RemoteWins),
        Some(_) => (local.clone(), MergeOutcome::LocalWins),
    };
    state.ensure_tasks();

    Reconciliation { state, outcome }
}
