//! Profile statistics derived from progress state

use chrono::NaiveDate;
use lexq_common::time::trailing_days;
use serde::Serialize;

use crate::catalog::{Catalog, Term};
use crate::progress::{level_for_xp, ProgressState, XP_PER_LEVEL};

/// Days shown in the activity history
pub const ACTIVITY_DAYS: usize = 7;

/// Title shown next to the level
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Rank {
    Intern,
    Apprentice,
    Expert,
    Master,
}

impl Rank {
    pub fn for_level(level: u32) -> Self {
        match level {
            0..=2 => Rank::Intern,
            3..=10 => Rank::Apprentice,
            11..=30 => Rank::Expert,
            _ => Rank::Master,
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rank::Intern => write!(f, "Intern"),
            Rank::Apprentice => write!(f, "Apprentice"),
            Rank::Expert => write!(f, "Expert"),
            Rank::Master => write!(f, "Master"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub xp: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProfileSummary {
    pub level: u32,
    pub rank: Rank,
    pub xp: u32,
    /// XP earned inside the current level
    pub xp_into_level: u32,
    pub coins: u32,
    pub streak: u32,
    pub learned_count: usize,
    pub total_terms: usize,
    pub learned_percent: u32,
    /// Oldest first, ending today
    pub weekly_activity: Vec<DailyActivity>,
    #[serde(skip)]
    pub favorites: Vec<Term>,
}

impl ProfileSummary {
    pub fn build(state: &ProgressState, catalog: &Catalog, today: NaiveDate) -> Self {
        let level = level_for_xp(state.xp);

        let weekly_activity = trailing_days(today, ACTIVITY_DAYS)
            .into_iter()
            .map(|date| DailyActivity {
                date,
                xp: state.daily_xp_log.get(&date).copied().unwrap_or(0),
            })
            .collect();

        let favorites = state
            .favorites
            .iter()
            .filter_map(|id| catalog.find(id).cloned())
            .collect();

        Self {
            level,
            rank: Rank::for_level(level),
            xp: state.xp,
            xp_into_level: state.xp % XP_PER_LEVEL,
            coins: state.coins,
            streak: state.streak,
            learned_count: state.learned.len(),
            total_terms: catalog.len(),
            learned_percent: learned_percent(state.learned.len(), catalog.len()),
            weekly_activity,
            favorites,
        }
    }
}

fn learned_percent(learned: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((learned * 100 / total) as u32).min(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_thresholds() {
        assert_eq!(Rank::for_level(1), Rank::Intern);
        assert_eq!(Rank::for_level(2), Rank::Intern);
        assert_eq!(Rank::for_level(3), Rank::Apprentice);
        assert_eq!(Rank::for_level(11), Rank::Expert);
        assert_eq!(Rank::for_level(31), Rank::Master);
    }

    #[test]
    fn test_summary_fields() {
        let catalog = Catalog::parse("A|a;B|b;C|c;D|d");
        let today = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        let mut state = ProgressState {
            xp: 345,
            ..ProgressState::default()
        };
        state.learned.insert("A".into());
        state.favorites = vec!["C".into(), "gone".into()];
        state.daily_xp_log.insert(today, 40);
        state.daily_xp_log.insert(NaiveDate::from_ymd_opt(2024, 4, 4).unwrap(), 15);
        state.daily_xp_log.insert(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 99);

        let summary = ProfileSummary::build(&state, &catalog, today);

        assert_eq!(summary.level, 4);
        assert_eq!(summary.rank, Rank::Apprentice);
        assert_eq!(summary.xp_into_level, 45);
        assert_eq!(summary.learned_percent, 25);
        assert_eq!(summary.weekly_activity.len(), 7);
        assert_eq!(summary.weekly_activity[0].xp, 15);
        assert_eq!(summary.weekly_activity[6], DailyActivity { date: today, xp: 40 });
        assert_eq!(summary.favorites.len(), 1);
        assert_eq!(summary.favorites[0].source, "C");
    }

    #[test]
    fn test_learned_percent_caps_at_hundred() {
        assert_eq!(learned_percent(12, 10), 100);
        assert_eq!(learned_percent(0, 0), 0);
    }
}
