//! Transition functions over `ProgressState`
//!
//! Each transition runs to completion under exclusive ownership of the
//! state. Failing transitions return an error before touching any field.

use chrono::NaiveDate;
use lexq_common::events::{Notice, ShopItem};
use rand::Rng;
use tracing::{debug, warn};

use super::quests::{self, QuestCategory};
use super::{ProgressState, StateDelta};
use crate::catalog::Catalog;
use crate::error::{ClaimError, PurchaseError};

/// Base XP for a known review
pub const REVIEW_XP: u32 = 10;
/// Coins for a known review
pub const REVIEW_COINS: u32 = 5;
/// XP per correct quiz answer
pub const QUIZ_XP_PER_CORRECT: u32 = 5;
/// Questions in one quiz
pub const QUIZ_QUESTIONS: u32 = 20;
/// Double-XP charges consumed by a quiz
pub const QUIZ_CHARGE_COST: u32 = 20;
/// Charges granted by one double-XP purchase
pub const DOUBLE_XP_CHARGES: u32 = 20;
/// Flat XP bonus for claiming a quest
pub const CLAIM_XP_BONUS: u32 = 10;

impl ProgressState {
    /// Record a review of the current term and move to the next one
    ///
    /// A known term earns XP and coins, and is added to `learned` on first
    /// success. The cursor then moves to the next unlearned term scanning
    /// forward circularly, or to a random term once everything is learned.
    pub fn record_review<R: Rng + ?Sized>(
        &mut self,
        known: bool,
        catalog: &Catalog,
        today: NaiveDate,
        rng: &mut R,
    ) -> StateDelta {
        if catalog.is_empty() {
            warn!("Review ignored: vocabulary catalog is empty");
            return StateDelta::unchanged();
        }
        if self.cursor >= catalog.len() {
            self.cursor = 0;
        }

        let mut delta = StateDelta::changed_with(Vec::new());

        if known {
            let reward = self.boosted_reward(REVIEW_XP, 1);
            self.xp = self.xp.saturating_add(reward);
            self.coins = self.coins.saturating_add(REVIEW_COINS);
            self.log_xp(today, reward);

            if let Some(term) = catalog.get(self.cursor) {
                if self.learned.insert(term.id().to_string()) {
                    debug!(term = term.id(), "Term newly learned");
                    quests::advance(&mut self.tasks, QuestCategory::VocabularyLearned, 1, &mut delta);
                }
            }
            quests::advance(&mut self.tasks, QuestCategory::XpEarned, reward, &mut delta);

            delta.notices.insert(0, Notice::XpGained { amount: reward });
        }

        self.cursor = self.next_cursor(catalog, rng);
        delta
    }

    /// Add or remove the current term from favorites
    pub fn toggle_favorite(&mut self, catalog: &Catalog) -> StateDelta {
        let Some(term) = catalog.get(self.cursor) else {
            return StateDelta::unchanged();
        };
        let id = term.id().to_string();

        if let Some(pos) = self.favorites.iter().position(|f| *f == id) {
            self.favorites.remove(pos);
            StateDelta::changed_with(vec![Notice::FavoriteRemoved { term: id }])
        } else {
            self.favorites.push(id.clone());
            StateDelta::changed_with(vec![Notice::FavoriteAdded { term: id }])
        }
    }

    /// Remove a favorite by id; no-op when absent
    pub fn remove_favorite(&mut self, term_id: &str) -> StateDelta {
        let before = self.favorites.len();
        self.favorites.retain(|f| f != term_id);

        if self.favorites.len() == before {
            StateDelta::unchanged()
        } else {
            StateDelta::changed_with(vec![Notice::FavoriteRemoved {
                term: term_id.to_string(),
            }])
        }
    }

    /// Buy a boost from the shop
    pub fn purchase(&mut self, item: ShopItem, cost: u32) -> Result<StateDelta, PurchaseError> {
        if self.coins < cost {
            return Err(PurchaseError::InsufficientFunds {
                needed: cost,
                available: self.coins,
            });
        }
        if item == ShopItem::StreakShield && self.boosts.streak_shield_active {
            return Err(PurchaseError::AlreadyActive);
        }

        self.coins -= cost;
        match item {
            ShopItem::StreakShield => self.boosts.streak_shield_active = true,
            ShopItem::DoubleXp => {
                self.boosts.double_xp_charges_remaining = self
                    .boosts
                    .double_xp_charges_remaining
                    .saturating_add(DOUBLE_XP_CHARGES)
            }
        }

        let mut delta = StateDelta::changed_with(vec![Notice::Purchased { item }]);
        quests::advance(&mut self.tasks, QuestCategory::PurchaseMade, 1, &mut delta);
        Ok(delta)
    }

    /// Credit a finished quiz
    ///
    /// `correct_count` above the quiz length is clamped.
    pub fn complete_quiz(&mut self, correct_count: u32, today: NaiveDate) -> StateDelta {
        let correct = correct_count.min(QUIZ_QUESTIONS);
        let reward = self.boosted_reward(correct * QUIZ_XP_PER_CORRECT, QUIZ_CHARGE_COST);

        self.xp = self.xp.saturating_add(reward);
        self.log_xp(today, reward);

        let mut delta = StateDelta::changed_with(vec![Notice::QuizCompleted { xp: reward }]);
        quests::advance(&mut self.tasks, QuestCategory::QuizCompleted, 1, &mut delta);
        quests::advance(&mut self.tasks, QuestCategory::XpEarned, reward, &mut delta);
        delta
    }

    /// Claim a completed quest's reward
    pub fn claim_quest(&mut self, id: &str) -> Result<StateDelta, ClaimError> {
        let quest = self
            .tasks
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or_else(|| ClaimError::NotFound(id.to_string()))?;

        if !quest.is_claimable() {
            return Err(ClaimError::NotEligible(id.to_string()));
        }

        quest.claimed = true;
        let coins = quest.reward_coins;
        self.coins = self.coins.saturating_add(coins);
        self.xp = self.xp.saturating_add(CLAIM_XP_BONUS);

        Ok(StateDelta::changed_with(vec![Notice::QuestClaimed {
            id: id.to_string(),
            coins,
        }]))
    }

    /// Apply the double-XP boost to `base`, consuming `charge_cost` charges
    fn boosted_reward(&mut self, base: u32, charge_cost: u32) -> u32 {
        if self.boosts.double_xp_charges_remaining > 0 {
            self.boosts.double_xp_charges_remaining =
                self.boosts.double_xp_charges_remaining.saturating_sub(charge_cost);
            base.saturating_mul(2)
        } else {
            base
        }
    }

    fn next_cursor<R: Rng + ?Sized>(&self, catalog: &Catalog, rng: &mut R) -> usize {
        let len = catalog.len();
        (1..=len)
            .map(|step| (self.cursor + step) % len)
            .find(|&idx| {
                catalog
                    .get(idx)
                    .is_some_and(|term| !self.learned.contains(term.id()))
            })
            .unwrap_or_else(|| rng.gen_range(0..len))
    }
}
