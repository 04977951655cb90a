//! Operation stopwatch behind the machine panel.
//!
//! Time is only ever folded at status changes, so the displayed values are a
//! pure function of the stored instants and `now`. Missed display ticks never
//! lose time.

use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running { segment_start: Instant },
}

/// Values shown on the panel at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackerSnapshot {
    pub operation_elapsed: Duration,
    pub status_elapsed: Duration,
    pub running: bool,
}

#[derive(Clone, Debug)]
pub struct ElapsedTracker {
    accumulated: Duration,
    state: TimerState,
    status_started: Option<Instant>,
    status_seed: Duration,
}

impl ElapsedTracker {
    /// Idle tracker resuming from server totals.
    pub fn new(accumulated: Duration, status_seed: Duration) -> Self {
        Self {
            accumulated,
            state: TimerState::Idle,
            status_started: None,
            status_seed,
        }
    }

    /// Tracker seeded from the operation's `duration_total_min` and
    /// `duration_shift_min` fields.
    pub fn from_minutes(total_min: Option<f64>, shift_min: Option<f64>) -> Self {
        Self::new(minutes(total_min), minutes(shift_min))
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    /// Operation time folded so far, excluding the open segment.
    pub fn accumulated(&self) -> Duration {
        self.accumulated
    }

    /// Switch to a new status at `now`.
    pub fn select_status(&mut self, has_timer: bool, now: Instant) {
        if let TimerState::Running { segment_start } = self.state {
            self.accumulated += now.saturating_duration_since(segment_start);
        }
        self.state = if has_timer {
            TimerState::Running { segment_start: now }
        } else {
            TimerState::Idle
        };
        self.status_started = Some(now);
    }

    pub fn snapshot(&self, now: Instant) -> TrackerSnapshot {
        let operation_elapsed = match self.state {
            TimerState::Running { segment_start } => {
                self.accumulated + now.saturating_duration_since(segment_start)
            }
            TimerState::Idle => self.accumulated,
        };
        let status_elapsed = match self.status_started {
            Some(started) => now.saturating_duration_since(started),
            None => self.status_seed,
        };
        TrackerSnapshot {
            operation_elapsed,
            status_elapsed,
            running: self.is_running(),
        }
    }
}

fn minutes(value: Option<f64>) -> Duration {
    match value {
        Some(min) if min.is_finite() && min > 0.0 => Duration::from_secs_f64(min * 60.0),
        _ => Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: Duration = Duration::from_secs(1);

    #[test]
    fn starts_idle_with_seeds() {
        let tracker = ElapsedTracker::from_minutes(Some(10.0), Some(2.5));
        let now = Instant::now();
        let snap = tracker.snapshot(now + 30 * SEC);
        assert!(!snap.running);
        assert_eq!(snap.operation_elapsed, Duration::from_millis(600_000));
        assert_eq!(snap.status_elapsed, Duration::from_millis(150_000));
    }

    #[test]
    fn negative_or_missing_minutes_seed_zero() {
        let tracker = ElapsedTracker::from_minutes(None, Some(-3.0));
        let snap = tracker.snapshot(Instant::now());
        assert_eq!(snap.operation_elapsed, Duration::ZERO);
        assert_eq!(snap.status_elapsed, Duration::ZERO);
    }

    #[test]
    fn has_timer_switch_folds_and_restarts_segment() {
        let t0 = Instant::now();
        let mut tracker = ElapsedTracker::new(Duration::ZERO, Duration::ZERO);
        tracker.select_status(true, t0);
        tracker.select_status(true, t0 + 7 * SEC);
        assert_eq!(tracker.accumulated(), 7 * SEC);
        assert_eq!(
            tracker.state(),
            TimerState::Running {
                segment_start: t0 + 7 * SEC
            }
        );
        let snap = tracker.snapshot(t0 + 10 * SEC);
        assert_eq!(snap.operation_elapsed, 10 * SEC);
        assert_eq!(snap.status_elapsed, 3 * SEC);
    }

    #[test]
    fn no_timer_switch_freezes() {
        let t0 = Instant::now();
        let mut tracker = ElapsedTracker::new(Duration::from_millis(600_000), Duration::ZERO);
        tracker.select_status(true, t0);
        tracker.select_status(false, t0 + 5 * SEC);
        assert!(!tracker.is_running());
        let snap = tracker.snapshot(t0 + 60 * SEC);
        assert_eq!(snap.operation_elapsed, Duration::from_millis(605_000));
        assert_eq!(snap.status_elapsed, 55 * SEC);
    }

    #[test]
    fn zero_gap_switches_keep_time() {
        let t0 = Instant::now();
        let mut tracker = ElapsedTracker::new(SEC, Duration::ZERO);
        tracker.select_status(true, t0);
        tracker.select_status(true, t0 + 2 * SEC);
        tracker.select_status(false, t0 + 2 * SEC);
        tracker.select_status(true, t0 + 2 * SEC);
        assert_eq!(tracker.snapshot(t0 + 2 * SEC).operation_elapsed, 3 * SEC);
    }

    #[test]
    fn snapshot_before_segment_start_saturates() {
        let t0 = Instant::now();
        let mut tracker = ElapsedTracker::new(SEC, Duration::ZERO);
        tracker.select_status(true, t0 + 5 * SEC);
        let snap = tracker.snapshot(t0);
        assert_eq!(snap.operation_elapsed, SEC);
        assert_eq!(snap.status_elapsed, Duration::ZERO);
    }
}
