//! Shared type definitions carried inside events
//!
//! Supporting types for sync status, shop items and user-visible notices.

use serde::{Deserialize, Serialize};

/// Remote synchronization status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub enum SyncStatus {
    /// No remote activity yet (anonymous, offline or not signed in)
    #[default]
    Idle,
    /// Remote load or save in flight
    Saving,
    /// Last remote operation succeeded
    Synced,
    /// Last remote operation failed; manual retry available
    SyncFailed,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Idle => write!(f, "Idle"),
            SyncStatus::Saving => write!(f, "Saving"),
            SyncStatus::Synced => write!(f, "Synced"),
            SyncStatus::SyncFailed => write!(f, "SyncFailed"),
        }
    }
}

/// Purchasable boosts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ShopItem {
    /// Preserves the streak across one missed day
    StreakShield,
    /// Grants 20 charges of doubled XP
    DoubleXp,
}

impl ShopItem {
    pub const ALL: [ShopItem; 2] = [ShopItem::StreakShield, ShopItem::DoubleXp];

    /// Listed shop price in coins
    pub fn price(self) -> u32 {
        match self {
            ShopItem::StreakShield => 200,
            ShopItem::DoubleXp => 350,
        }
    }
}

impl std::fmt::Display for ShopItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShopItem::StreakShield => write!(f, "streak-shield"),
            ShopItem::DoubleXp => write!(f, "double-xp"),
        }
    }
}

impl std::str::FromStr for ShopItem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "streak-shield" | "shield" | "freeze" => Ok(ShopItem::StreakShield),
            "double-xp" | "double" => Ok(ShopItem::DoubleXp),
            other => Err(format!("unknown shop item: {}", other)),
        }
    }
}

/// Which replica won a login reconciliation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum MergeOutcome {
    /// Remote snapshot had strictly more XP and replaced local state
    RemoteWins,
    /// Local state kept (remote XP equal or lower)
    LocalWins,
    /// No remote snapshot existed; local state pushed
    FirstSync,
}

/// Transient user-visible notification produced by a transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    XpGained { amount: u32 },
    QuestReady { id: String, description: String },
    QuestClaimed { id: String, coins: u32 },
    StreakProtected { streak: u32 },
    FavoriteAdded { term: String },
    FavoriteRemoved { term: String },
    Purchased { item: ShopItem },
    QuizCompleted { xp: u32 },
    /// A recoverable action failure (insufficient funds, not eligible, ...)
    ActionFailed { reason: String },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::XpGained { amount } => write!(f, "+{} XP", amount),
            Notice::QuestReady { description, .. } => write!(f, "Quest ready: {}", description),
            Notice::QuestClaimed { coins, .. } => write!(f, "+{} coins", coins),
            Notice::StreakProtected { streak } => write!(f, "Streak protected at {}", streak),
            Notice::FavoriteAdded { term } => write!(f, "Added {} to favorites", term),
            Notice::FavoriteRemoved { term } => write!(f, "Removed {} from favorites", term),
            Notice::Purchased { item } => write!(f, "Purchased {}", item),
            Notice::QuizCompleted { xp } => write!(f, "Quiz complete! +{} XP", xp),
            Notice::ActionFailed { reason } => write!(f, "{}", reason),
        }
    }
}
