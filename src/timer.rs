//! Countdown for levels with a `timeLimit`.
//!
//! The clock is driven by the host: call [`LevelTimer::advance`] with the time that
//! passed since the last call. Nothing here reads the wall clock.

use std::time::Duration;
use tracing::warn;

/// Remaining time at or below which the display should warn the player.
pub const LOW_TIME_THRESHOLD: Duration = Duration::from_secs(10);

/// Per-level countdown. Starts stopped; expires once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelTimer {
    limit: Duration,
    remaining: Duration,
    running: bool,
    expired: bool,
}

impl LevelTimer {
    /// A stopped timer holding the full `limit_secs`.
    pub fn new(limit_secs: u32) -> Self {
        let limit = Duration::from_secs(u64::from(limit_secs));
        Self {
            limit,
            remaining: limit,
            running: false,
            expired: false,
        }
    }

    /// Lets [`advance`](Self::advance) count down. Does nothing once expired.
    pub fn start(&mut self) {
        if !self.expired {
            self.running = true;
        }
    }

    /// Freezes the remaining time.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Counts down by `elapsed`. Returns `true` on the call that runs out the clock
    /// and never again for this timer.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if !self.running || self.expired {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(elapsed);
        if self.remaining.is_zero() {
            self.running = false;
            self.expired = true;
            warn!(limit_secs = self.limit.as_secs(), "time is up");
            return true;
        }
        false
    }

    /// The full time allowed for the level.
    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Time left on the clock.
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Whether the clock is counting down.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the clock has run out.
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Whether the remaining time is at or under [`LOW_TIME_THRESHOLD`].
    pub fn is_low(&self) -> bool {
        self.remaining <= LOW_TIME_THRESHOLD
    }

    /// `m:ss`, rounding partial seconds up so the display reaches `0:00` only on expiry.
    pub fn display(&self) -> String {
        let secs = self.remaining.as_secs() + u64::from(self.remaining.subsec_nanos() > 0);
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_exactly_once() {
        let mut timer = LevelTimer::new(2);
        timer.start();
        assert!(!timer.advance(Duration::from_secs(1)));
        assert!(timer.advance(Duration::from_secs(5)));
        assert!(!timer.advance(Duration::from_secs(1)));
        assert!(timer.is_expired());
        assert_eq!(timer.remaining(), Duration::ZERO);
    }

    #[test]
    fn paused_clock_does_not_move() {
        let mut timer = LevelTimer::new(30);
        assert!(!timer.advance(Duration::from_secs(10)));
        assert_eq!(timer.remaining(), Duration::from_secs(30));
    }

    #[test]
    fn display_formats_minutes_and_seconds() {
        let mut timer = LevelTimer::new(75);
        assert_eq!(timer.display(), "1:15");
        timer.start();
        timer.advance(Duration::from_millis(65_500));
        assert_eq!(timer.display(), "0:10");
        assert!(timer.is_low());
    }
}
