//! Progression state model
//!
//! `ProgressState` is the single authoritative aggregate. It is mutated only
//! through the transition functions in [`transitions`] and the daily rollover
//! in [`rollover`]; stores hold serialized snapshots of it.

pub mod quests;
pub mod rollover;
pub mod transitions;

pub use quests::{Quest, QuestCategory};

use chrono::NaiveDate;
use lexq_common::events::Notice;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::EngineError;

/// XP needed per level
pub const XP_PER_LEVEL: u32 = 100;

/// Active purchased modifiers
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Boosts {
    pub streak_shield_active: bool,
    pub double_xp_charges_remaining: u32,
}

/// The user's full learning progress
///
/// Serialized as a camelCase JSON record. Readers tolerate missing fields;
/// a missing, null or empty `tasks` list is replaced with fresh quests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressState {
    pub xp: u32,
    pub coins: u32,
    pub streak: u32,
    pub learned: BTreeSet<String>,
    pub favorites: Vec<String>,
    pub cursor: usize,
    pub last_login_date: Option<NaiveDate>,
    #[serde(deserialize_with = "null_as_empty")]
    pub tasks: Vec<Quest>,
    pub boosts: Boosts,
    pub daily_xp_log: BTreeMap<NaiveDate, u32>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Quest>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Quest>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for ProgressState {
    /// First-launch template: zero progress, fresh quests, no login yet
    fn default() -> Self {
        Self {
            xp: 0,
            coins: 0,
            streak: 0,
            learned: BTreeSet::new(),
            favorites: Vec::new(),
            cursor: 0,
            last_login_date: None,
            tasks: quests::fresh_quests(),
            boosts: Boosts::default(),
            daily_xp_log: BTreeMap::new(),
        }
    }
}

impl ProgressState {
    /// Derived level, never stored
    pub fn level(&self) -> u32 {
        level_for_xp(self.xp)
    }

    pub fn is_favorite(&self, term_id: &str) -> bool {
        self.favorites.iter().any(|f| f == term_id)
    }

    pub fn quest(&self, id: &str) -> Option<&Quest> {
        self.tasks.iter().find(|q| q.id == id)
    }

    /// Decode a persisted blob and apply the migration rules
    pub fn from_json(blob: &str) -> Result<Self, EngineError> {
        let mut state: ProgressState = serde_json::from_str(blob)
            .map_err(|e| EngineError::MalformedPersistedState(e.to_string()))?;
        state.ensure_tasks();
        Ok(state)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string(self).map_err(|e| EngineError::Common(e.into()))
    }

    /// Regenerate quests when the set is empty; returns true if it did
    pub fn ensure_tasks(&mut self) -> bool {
        if self.tasks.is_empty() {
            self.tasks = quests::fresh_quests();
            true
        } else {
            false
        }
    }

    /// Restore invariants that depend on the catalog
    ///
    /// Keeps `cursor` a valid index and drops duplicate favorites while
    /// preserving first-seen order.
    pub fn normalize(&mut self, catalog_len: usize) {
        self.ensure_tasks();

        if catalog_len == 0 || self.cursor >= catalog_len {
            self.cursor = 0;
        }

        let mut seen = BTreeSet::new();
        self.favorites.retain(|f| seen.insert(f.clone()));
    }

    /// Accumulate XP into today's activity log
    fn log_xp(&mut self, today: NaiveDate, amount: u32) {
        if amount == 0 {
            return;
        }
        let entry = self.daily_xp_log.entry(today).or_insert(0);
        *entry = entry.saturating_add(amount);
    }
}

/// `floor(xp / 100) + 1`
pub fn level_for_xp(xp: u32) -> u32 {
    xp / XP_PER_LEVEL + 1
}

/// Outcome of a transition: whether state changed and what to tell the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateDelta {
    pub changed: bool,
    pub notices: Vec<Notice>,
}

impl StateDelta {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn changed_with(notices: Vec<Notice>) -> Self {
        Self {
            changed: true,
            notices,
        }
    }
}
