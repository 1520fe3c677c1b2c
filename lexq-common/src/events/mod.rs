//! Event types for the LexQuest event system
//!
//! Provides shared event definitions and the EventBus used by the engine
//! to publish notices and sync status to any attached front end.

mod shared_types;

pub use shared_types::{MergeOutcome, Notice, ShopItem, SyncStatus};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// LexQuest event types
///
/// Events are broadcast via EventBus and can be serialized for transmission
/// to a UI process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LexqEvent {
    /// A transition produced a user-visible notice
    Notice {
        notice: Notice,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Remote sync status changed
    ///
    /// Triggers:
    /// - UI: update sync indicator, show retry button on SyncFailed
    SyncStatusChanged {
        old_status: SyncStatus,
        new_status: SyncStatus,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// State written to the local durable store
    StateSaved {
        xp: u32,
        coins: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Identity provider reported a change
    IdentityChanged {
        /// None when signed out or offline
        uid: Option<String>,
        is_anonymous: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Login reconciliation finished
    ProgressMerged {
        outcome: MergeOutcome,
        xp: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// User wiped all progress
    ProgressReset {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl LexqEvent {
    /// Event type name, matching the serde tag
    pub fn event_type(&self) -> &str {
        match self {
            LexqEvent::Notice { .. } => "Notice",
            LexqEvent::SyncStatusChanged { .. } => "SyncStatusChanged",
            LexqEvent::StateSaved { .. } => "StateSaved",
            LexqEvent::IdentityChanged { .. } => "IdentityChanged",
            LexqEvent::ProgressMerged { .. } => "ProgressMerged",
            LexqEvent::ProgressReset { .. } => "ProgressReset",
        }
    }

    pub fn notice(notice: Notice) -> Self {
        LexqEvent::Notice {
            notice,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Broadcast bus for LexqEvent
///
/// Slow subscribers lose the oldest events (broadcast channel semantics);
/// the engine never blocks on a subscriber.
pub struct EventBus {
    tx: broadcast::Sender<LexqEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<LexqEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: LexqEvent) -> Result<usize, broadcast::error::SendError<LexqEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: LexqEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_emit_without_subscribers_fails() {
        let bus = EventBus::new(4);
        assert!(bus.emit(LexqEvent::ProgressReset { timestamp: chrono::Utc::now() }).is_err());
        // Lossy variant must not panic
        bus.emit_lossy(LexqEvent::ProgressReset { timestamp: chrono::Utc::now() });
    }

    #[test]
    fn test_eventbus_multiple_subscribers() {
        let bus = Arc::new(EventBus::new(10));
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(LexqEvent::SyncStatusChanged {
            old_status: SyncStatus::Saving,
            new_status: SyncStatus::Synced,
            timestamp: chrono::Utc::now(),
        })
        .expect("emit should succeed");

        assert_eq!(rx1.try_recv().unwrap().event_type(), "SyncStatusChanged");
        assert_eq!(rx2.try_recv().unwrap().event_type(), "SyncStatusChanged");
    }

    #[test]
    fn test_notice_event_serialization() {
        let event = LexqEvent::notice(Notice::XpGained { amount: 20 });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Notice");
        assert_eq!(json["notice"]["kind"], "xp_gained");
        assert_eq!(json["notice"]["amount"], 20);
    }

    #[test]
    fn test_shop_item_parse_and_price() {
        assert_eq!("streak-shield".parse::<ShopItem>().unwrap(), ShopItem::StreakShield);
        assert_eq!("double-xp".parse::<ShopItem>().unwrap(), ShopItem::DoubleXp);
        assert!("potion".parse::<ShopItem>().is_err());
        assert_eq!(ShopItem::StreakShield.price(), 200);
        assert_eq!(ShopItem::DoubleXp.price(), 350);
    }
}
