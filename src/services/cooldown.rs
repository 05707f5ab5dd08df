use std::time::Duration;

use crate::models::Watch;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3600);

/// Minimum spacing between two notifications for the same watch.
#[derive(Debug, Clone, Copy)]
pub struct CooldownPolicy {
    window: Duration,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl CooldownPolicy {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// `now` is unix seconds. A clock that went backwards keeps the watch muted.
    pub fn may_notify(&self, watch: &Watch, now: i64) -> bool {
        match watch.last_alerted_at {
            None => true,
            Some(last) => {
                let window = i64::try_from(self.window.as_secs()).unwrap_or(i64::MAX);
                now.saturating_sub(last) >= window
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, WatchId};

    fn watch(last_alerted_at: Option<i64>) -> Watch {
        Watch {
            id: WatchId(7),
            owner: "u".into(),
            destination: "d".into(),
            symbol: "AAPL".into(),
            target_price: 100.0,
            direction: Direction::Above,
            active: true,
            created_at: 0,
            last_checked_at: None,
            last_alerted_at,
            alert_count: 0,
        }
    }

    #[test]
    fn never_alerted_may_notify() {
        assert!(CooldownPolicy::default().may_notify(&watch(None), 0));
    }

    #[test]
    fn window_is_half_open() {
        let t = 1_700_000_000;
        let policy = CooldownPolicy::new(Duration::from_secs(3600));
        let w = watch(Some(t));

        assert!(!policy.may_notify(&w, t));
        assert!(!policy.may_notify(&w, t + 600));
        assert!(!policy.may_notify(&w, t + 3599));
        assert!(policy.may_notify(&w, t + 3600));
        assert!(policy.may_notify(&w, t + 86_400));
    }

    #[test]
    fn zero_window_always_allows() {
        let policy = CooldownPolicy::new(Duration::ZERO);
        assert!(policy.may_notify(&watch(Some(10)), 10));
    }
}
