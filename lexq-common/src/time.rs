//! Calendar date utilities
//!
//! Progress is tracked per local calendar day. The engine never reads the
//! system clock directly; it asks a [`Clock`] so tests can pin the date.

use chrono::{DateTime, Local, NaiveDate, Utc};
use std::sync::{Arc, Mutex};

/// Source of "today" in the observer's local calendar
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Clock backed by the system local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Manually controlled clock for tests and simulations
#[derive(Debug, Clone)]
pub struct FixedClock {
    date: Arc<Mutex<NaiveDate>>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Arc::new(Mutex::new(date)),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        if let Ok(mut guard) = self.date.lock() {
            *guard = date;
        }
    }

    /// Move the clock forward by whole days
    pub fn advance_days(&self, days: u64) {
        if let Ok(mut guard) = self.date.lock() {
            if let Some(next) = guard.checked_add_days(chrono::Days::new(days)) {
                *guard = next;
            }
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        match self.date.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// True when `earlier` is exactly the calendar day before `later`
pub fn is_previous_day(earlier: NaiveDate, later: NaiveDate) -> bool {
    later.pred_opt() == Some(earlier)
}

/// The `n` calendar days ending at `today`, oldest first
pub fn trailing_days(today: NaiveDate, n: usize) -> Vec<NaiveDate> {
    (0..n as u64)
        .rev()
        .filter_map(|back| today.checked_sub_days(chrono::Days::new(back)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_previous_day_across_month_boundary() {
        assert!(is_previous_day(date(2024, 2, 29), date(2024, 3, 1)));
        assert!(is_previous_day(date(2023, 12, 31), date(2024, 1, 1)));
    }

    #[test]
    fn test_previous_day_rejects_gaps_and_same_day() {
        assert!(!is_previous_day(date(2024, 3, 1), date(2024, 3, 1)));
        assert!(!is_previous_day(date(2024, 2, 28), date(2024, 3, 1)));
        assert!(!is_previous_day(date(2024, 3, 2), date(2024, 3, 1)));
    }

    #[test]
    fn test_trailing_days_oldest_first() {
        let days = trailing_days(date(2024, 3, 2), 3);
        assert_eq!(days, vec![date(2024, 2, 29), date(2024, 3, 1), date(2024, 3, 2)]);
    }

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::new(date(2024, 1, 31));
        clock.advance_days(1);
        assert_eq!(clock.today(), date(2024, 2, 1));
        clock.set(date(2025, 6, 1));
        assert_eq!(clock.today(), date(2025, 6, 1));
    }

    #[test]
    fn test_now_returns_valid_timestamp() {
        // Should be a reasonable timestamp (after year 2000)
        assert!(now().timestamp() > 946_684_800);
    }
}
