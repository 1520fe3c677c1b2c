//! Daily rollover policy
//!
//! Runs once per local calendar day: updates the streak, consumes the
//! streak shield on a missed day, and replaces the quest set. Unclaimed
//! quest rewards from the previous day are forfeited.

use chrono::NaiveDate;
use lexq_common::events::Notice;
use lexq_common::time::is_previous_day;
use tracing::info;

use super::quests;
use super::{ProgressState, StateDelta};

impl ProgressState {
    /// Apply the rollover for `today`; no-op if it already ran today
    pub fn apply_daily_rollover(&mut self, today: NaiveDate) -> StateDelta {
        if self.last_login_date == Some(today) {
            return StateDelta::unchanged();
        }

        let mut delta = StateDelta::changed_with(Vec::new());
        let consecutive = self
            .last_login_date
            .is_some_and(|last| is_previous_day(last, today));

        if consecutive {
            self.streak = self.streak.saturating_add(1);
        } else if self.boosts.streak_shield_active {
            self.boosts.streak_shield_active = false;
            delta.notices.push(Notice::StreakProtected { streak: self.streak });
            info!(streak = self.streak, "Streak shield consumed");
        } else {
            self.streak = 1;
        }

        self.tasks = quests::fresh_quests();
        self.last_login_date = Some(today);

        info!(%today, streak = self.streak, "Daily rollover applied");
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_consecutive_day_extends_streak_and_resets_quests() {
        let mut state = ProgressState {
            streak: 3,
            last_login_date: Some(day(9)),
            ..ProgressState::default()
        };
        state.tasks[0].current_count = 5;
        state.tasks[1].claimed = true;

        state.apply_daily_rollover(day(10));

        assert_eq!(state.streak, 4);
        assert_eq!(state.last_login_date, Some(day(10)));
        assert!(state.tasks.iter().all(|q| q.current_count == 0 && !q.claimed));
    }

    #[test]
    fn test_same_day_is_noop() {
        let mut state = ProgressState::default();
        state.apply_daily_rollover(day(10));
        let after_first = state.clone();

        let delta = state.apply_daily_rollover(day(10));

        assert!(!delta.changed);
        assert_eq!(state, after_first);
    }

    #[test]
    fn test_missed_day_resets_streak() {
        let mut state = ProgressState {
            streak: 8,
            last_login_date: Some(day(7)),
            ..ProgressState::default()
        };
        state.apply_daily_rollover(day(10));
        assert_eq!(state.streak, 1);
    }

    #[test]
    fn test_shield_preserves_streak_once() {
        let mut state = ProgressState {
            streak: 6,
            last_login_date: Some(day(8)),
            ..ProgressState::default()
        };
        state.boosts.streak_shield_active = true;

        let delta = state.apply_daily_rollover(day(10));

        assert_eq!(state.streak, 6);
        assert!(!state.boosts.streak_shield_active);
        assert_eq!(delta.notices, vec![Notice::StreakProtected { streak: 6 }]);

        // Next gap without a shield resets
        state.apply_daily_rollover(day(12));
        assert_eq!(state.streak, 1);
    }

    #[test]
    fn test_first_launch_starts_streak() {
        let mut state = ProgressState::default();
        state.apply_daily_rollover(day(1));
        assert_eq!(state.streak, 1);
    }

    #[test]
    fn test_rollover_discards_unclaimed_complete_quests() {
        let mut state = ProgressState {
            coins: 10,
            last_login_date: Some(day(9)),
            ..ProgressState::default()
        };
        for quest in &mut state.tasks {
            quest.current_count = quest.target_count;
        }

        state.apply_daily_rollover(day(10));

        assert_eq!(state.coins, 10);
        assert!(state.tasks.iter().all(|q| q.current_count == 0));
    }
}
