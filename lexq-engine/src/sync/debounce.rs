//! Single-slot debounce timer
//!
//! At most one pending deadline. Re-arming replaces it, so a burst of
//! mutations produces one fire after the burst goes quiet.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct DebounceSlot {
    quiet_period: Duration,
    deadline: Option<Instant>,
}

impl DebounceSlot {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            deadline: None,
        }
    }

    /// (Re)start the quiet period from now
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.quiet_period);
    }

    /// Drop the pending deadline; returns whether one was pending
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }
}

/// Sleep until `deadline`, or forever when there is none
pub async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_rearm_pushes_deadline_back() {
        let mut slot = DebounceSlot::new(Duration::from_millis(2000));
        slot.arm();
        let first = slot.deadline().unwrap();

        tokio::time::advance(Duration::from_millis(500)).await;
        slot.arm();

        assert_eq!(slot.deadline().unwrap() - first, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_clears_slot() {
        let mut slot = DebounceSlot::new(Duration::from_millis(100));
        assert!(!slot.cancel());
        slot.arm();
        assert!(slot.is_armed());
        assert!(slot.cancel());
        assert!(!slot.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_until_fires_at_deadline() {
        let mut slot = DebounceSlot::new(Duration::from_secs(2));
        slot.arm();
        let start = Instant::now();

        sleep_until(slot.deadline()).await;

        assert!(Instant::now() - start >= Duration::from_secs(2));
    }
}
