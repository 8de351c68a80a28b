//! Countdown timer for timed practice activities.
//!
//! A stopwatch with a fixed budget: no pause, no resume. Expiry is reported
//! but never enforced; only submitting ends an activity.

use chrono::{DateTime, Duration, Utc};

/// Reading section budget.
pub const READING_DURATION_SECS: i64 = 35 * 60;
/// Integrated writing budget.
pub const INTEGRATED_DURATION_SECS: i64 = 20 * 60;
/// Independent writing budget.
pub const INDEPENDENT_DURATION_SECS: i64 = 30 * 60;

/// Where an activity is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    NotStarted,
    Running,
    Expired,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityTimer {
    duration: Duration,
    started_at: Option<DateTime<Utc>>,
    submitted: bool,
}

impl ActivityTimer {
    /// A stopped timer with the given budget.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started_at: None,
            submitted: false,
        }
    }

    /// Shorthand for [`ActivityTimer::new`] with a budget in seconds.
    pub fn from_secs(secs: i64) -> Self {
        Self::new(Duration::seconds(secs))
    }

    /// Begin timing at `now`. Restarting a running timer resets the clock.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.started_at = Some(now);
        self.submitted = false;
    }

    /// Mark the activity as submitted. Terminal.
    pub fn submit(&mut self) {
        if self.started_at.is_some() {
            self.submitted = true;
        }
    }

    /// Whether [`submit`](Self::submit) has been called since the last start.
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// The full time budget.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// When the clock was last started, `None` if never.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Time since start, zero before start or if the clock went backwards.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        match self.started_at {
            Some(start) => (now - start).max(Duration::zero()),
            None => Duration::zero(),
        }
    }

    /// Time left, saturating at zero.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        if self.started_at.is_none() {
            return self.duration;
        }
        (self.duration - self.elapsed(now)).max(Duration::zero())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.started_at.is_some() && self.elapsed(now) >= self.duration
    }

    pub fn status(&self, now: DateTime<Utc>) -> TimerStatus {
        if self.started_at.is_none() {
            TimerStatus::NotStarted
        } else if self.submitted {
            TimerStatus::Submitted
        } else if self.is_expired(now) {
            TimerStatus::Expired
        } else {
            TimerStatus::Running
        }
    }
}

/// Render a number of seconds as `MM:SS`. Negative input shows `00:00`.
pub fn format_clock(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn expiry_boundary() {
        let mut timer = ActivityTimer::from_secs(1200);
        timer.start(t0());

        assert!(!timer.is_expired(t0()));
        assert!(!timer.is_expired(t0() + Duration::seconds(1199)));
        assert!(timer.is_expired(t0() + Duration::seconds(1200)));
        assert!(timer.is_expired(t0() + Duration::seconds(5000)));
    }

    #[test]
    fn remaining_saturates_at_zero() {
        let mut timer = ActivityTimer::from_secs(60);
        timer.start(t0());
        assert_eq!(timer.remaining(t0() + Duration::seconds(15)).num_seconds(), 45);
        assert_eq!(timer.remaining(t0() + Duration::seconds(600)), Duration::zero());
    }

    #[test]
    fn clock_going_backwards_counts_as_no_time() {
        let mut timer = ActivityTimer::from_secs(60);
        timer.start(t0());
        assert_eq!(timer.elapsed(t0() - Duration::seconds(10)), Duration::zero());
        assert_eq!(timer.remaining(t0() - Duration::seconds(10)).num_seconds(), 60);
    }

    #[test]
    fn state_machine() {
        let mut timer = ActivityTimer::from_secs(READING_DURATION_SECS);
        assert_eq!(timer.status(t0()), TimerStatus::NotStarted);
        assert!(!timer.is_expired(t0()));

        // Submitting before start is ignored.
        timer.submit();
        assert_eq!(timer.status(t0()), TimerStatus::NotStarted);

        timer.start(t0());
        assert_eq!(timer.status(t0()), TimerStatus::Running);
        let late = t0() + Duration::seconds(READING_DURATION_SECS);
        assert_eq!(timer.status(late), TimerStatus::Expired);

        timer.submit();
        assert_eq!(timer.status(late), TimerStatus::Submitted);
        assert_eq!(
            timer.status(late + Duration::hours(3)),
            TimerStatus::Submitted
        );
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(35 * 60), "35:00");
        assert_eq!(format_clock(-4), "00:00");
    }
}
