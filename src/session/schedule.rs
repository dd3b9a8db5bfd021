//! Periodic telemetry schedule

/// Session seconds between two rounds of `STATS_UPDATE` records
pub const STATS_INTERVAL: f64 = 1.0;

/// Decides on each simulation tick whether a telemetry round is due.
///
/// The threshold advances by exactly one interval per round, so a late tick
/// does not shift the schedule; several overdue rounds catch up one per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSchedule {
    interval: f64,
    next: f64,
}

impl StatsSchedule {
    pub fn new(interval: f64) -> Self {
        Self { interval, next: 0.0 }
    }

    /// Returns `true` if a round is due at session time `now`
    pub fn due(&mut self, now: f64) -> bool {
        if now < self.next {
            return false;
        }
        self.next += self.interval;
        true
    }

    /// Session time of the next round
    pub fn next_due(&self) -> f64 {
        self.next
    }

    /// Start over from session time zero (new run)
    pub fn reset(&mut self) {
        self.next = 0.0;
    }
}

impl Default for StatsSchedule {
    fn default() -> Self {
        Self::new(STATS_INTERVAL)
    }
}
