//! Daily quest tracker
//!
//! Quests advance as a side effect of other transitions and are replaced
//! wholesale from the templates at each daily rollover.

use lexq_common::events::Notice;
use serde::{Deserialize, Serialize};

use super::StateDelta;

/// Which kind of activity advances a quest
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum QuestCategory {
    VocabularyLearned,
    XpEarned,
    QuizCompleted,
    PurchaseMade,
}

/// A daily objective with a one-time claimable reward
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    pub description: String,
    pub target_count: u32,
    pub current_count: u32,
    pub reward_coins: u32,
    pub category: QuestCategory,
    pub claimed: bool,
}

impl Quest {
    pub fn is_complete(&self) -> bool {
        self.current_count >= self.target_count
    }

    /// Complete and not yet claimed
    pub fn is_claimable(&self) -> bool {
        self.is_complete() && !self.claimed
    }
}

struct QuestTemplate {
    id: &'static str,
    description: &'static str,
    target_count: u32,
    reward_coins: u32,
    category: QuestCategory,
}

const QUEST_TEMPLATES: [QuestTemplate; 4] = [
    QuestTemplate {
        id: "learn_words",
        description: "Learn 5 new words",
        target_count: 5,
        reward_coins: 50,
        category: QuestCategory::VocabularyLearned,
    },
    QuestTemplate {
        id: "earn_xp",
        description: "Earn 100 XP",
        target_count: 100,
        reward_coins: 40,
        category: QuestCategory::XpEarned,
    },
    QuestTemplate {
        id: "finish_quiz",
        description: "Finish a quiz",
        target_count: 1,
        reward_coins: 60,
        category: QuestCategory::QuizCompleted,
    },
    QuestTemplate {
        id: "visit_shop",
        description: "Buy an item from the shop",
        target_count: 1,
        reward_coins: 30,
        category: QuestCategory::PurchaseMade,
    },
];

/// Fresh quest set: all counters at zero, nothing claimed
pub fn fresh_quests() -> Vec<Quest> {
    QUEST_TEMPLATES
        .iter()
        .map(|t| Quest {
            id: t.id.to_string(),
            description: t.description.to_string(),
            target_count: t.target_count,
            current_count: 0,
            reward_coins: t.reward_coins,
            category: t.category,
            claimed: false,
        })
        .collect()
}

/// Advance every open quest of `category` by `amount`, clamped to target
///
/// Quests already at target or already claimed are left alone. A quest that
/// reaches its target through this call produces a `QuestReady` notice.
pub fn advance(tasks: &mut [Quest], category: QuestCategory, amount: u32, delta: &mut StateDelta) {
    if amount == 0 {
        return;
    }

    for quest in tasks
        .iter_mut()
        .filter(|q| q.category == category && !q.claimed && q.current_count < q.target_count)
    {
        quest.current_count = quest
            .current_count
            .saturating_add(amount)
            .min(quest.target_count);
        delta.changed = true;

        if quest.current_count == quest.target_count {
            delta.notices.push(Notice::QuestReady {
                id: quest.id.clone(),
                description: quest.description.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quest(id: &str, category: QuestCategory, target: u32) -> Quest {
        Quest {
            id: id.to_string(),
            description: format!("{} quest", id),
            target_count: target,
            current_count: 0,
            reward_coins: 10,
            category,
            claimed: false,
        }
    }

    #[test]
    fn test_fresh_quests_start_empty() {
        let quests = fresh_quests();
        assert_eq!(quests.len(), 4);
        assert!(quests.iter().all(|q| q.current_count == 0 && !q.claimed && q.target_count > 0));
    }

    #[test]
    fn test_advance_clamps_and_notifies_once() {
        let mut tasks = vec![quest("xp", QuestCategory::XpEarned, 100)];
        let mut delta = StateDelta::default();

        advance(&mut tasks, QuestCategory::XpEarned, 80, &mut delta);
        assert_eq!(tasks[0].current_count, 80);
        assert!(delta.notices.is_empty());

        advance(&mut tasks, QuestCategory::XpEarned, 80, &mut delta);
        assert_eq!(tasks[0].current_count, 100);
        assert_eq!(delta.notices.len(), 1);

        // Already at target: untouched, no second notice
        advance(&mut tasks, QuestCategory::XpEarned, 80, &mut delta);
        assert_eq!(tasks[0].current_count, 100);
        assert_eq!(delta.notices.len(), 1);
    }

    #[test]
    fn test_advance_moves_all_matching_quests() {
        let mut tasks = vec![
            quest("a", QuestCategory::QuizCompleted, 1),
            quest("b", QuestCategory::QuizCompleted, 3),
            quest("c", QuestCategory::PurchaseMade, 1),
        ];
        let mut delta = StateDelta::default();

        advance(&mut tasks, QuestCategory::QuizCompleted, 1, &mut delta);

        assert_eq!(tasks[0].current_count, 1);
        assert_eq!(tasks[1].current_count, 1);
        assert_eq!(tasks[2].current_count, 0);
        assert!(delta.changed);
    }

    #[test]
    fn test_advance_skips_claimed() {
        let mut tasks = vec![quest("a", QuestCategory::PurchaseMade, 2)];
        tasks[0].current_count = 1;
        tasks[0].claimed = true;
        let mut delta = StateDelta::default();

        advance(&mut tasks, QuestCategory::PurchaseMade, 1, &mut delta);

        assert_eq!(tasks[0].current_count, 1);
        assert!(!delta.changed);
    }
}
