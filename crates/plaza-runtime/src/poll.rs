#![forbid(unsafe_code)]

//! Fixed-interval poll timer driven by an external clock.
//!
//! The timer never reads wall time. Callers pass the current monotonic time
//! (usually from the web layer's deterministic clock) and ask whether a poll
//! is due. Missed intervals collapse into a single poll.

use std::time::Duration;

/// Fires at most once per `interval` while armed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTimer {
    interval: Duration,
    last_fire: Option<Duration>,
}

impl PollTimer {
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fire: None,
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.last_fire.is_some()
    }

    /// Start counting from `now`. Re-arming an armed timer restarts the interval.
    pub fn arm(&mut self, now: Duration) {
        self.last_fire = Some(now);
        tracing::trace!(now_ms = now.as_millis() as u64, "poll timer armed");
    }

    pub fn disarm(&mut self) {
        if self.last_fire.take().is_some() {
            tracing::trace!("poll timer disarmed");
        }
    }

    /// Returns `true` (and restarts the interval) when a poll is due.
    pub fn due(&mut self, now: Duration) -> bool {
        let Some(last) = self.last_fire else {
            return false;
        };
        if now.saturating_sub(last) < self.interval {
            return false;
        }
        self.last_fire = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn disarmed_timer_never_fires() {
        let mut timer = PollTimer::new(ms(3000));
        assert!(!timer.due(ms(10_000)));
    }

    #[test]
    fn fires_once_per_interval() {
        let mut timer = PollTimer::new(ms(3000));
        timer.arm(ms(0));
        assert!(!timer.due(ms(2999)));
        assert!(timer.due(ms(3000)));
        assert!(!timer.due(ms(3001)));
        assert!(timer.due(ms(6000)));
    }

    #[test]
    fn missed_intervals_collapse() {
        let mut timer = PollTimer::new(ms(1000));
        timer.arm(ms(0));
        assert!(timer.due(ms(5500)));
        assert!(!timer.due(ms(6000)));
        assert!(timer.due(ms(6500)));
    }

    #[test]
    fn disarm_stops_and_rearm_restarts() {
        let mut timer = PollTimer::new(ms(1000));
        timer.arm(ms(0));
        timer.disarm();
        assert!(!timer.is_armed());
        assert!(!timer.due(ms(2000)));
        timer.arm(ms(2000));
        assert!(!timer.due(ms(2500)));
        assert!(timer.due(ms(3000)));
    }
}
