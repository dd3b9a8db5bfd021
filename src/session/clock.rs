//! Session clocks

use std::time::Instant;

use parking_lot::Mutex;

/// Source of the two time readings stamped on every record.
///
/// Implementations are read on the producer's thread at the moment an event
/// is logged, never later in the writer thread.
pub trait SessionClock: Send + Sync {
    /// Logical session time in seconds (may pause, e.g. between stages)
    fn time(&self) -> f64;

    /// Real elapsed run time in seconds
    fn stopwatch(&self) -> f64;
}

/// Clock where both readings are wall time since creation
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    started: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionClock for WallClock {
    fn time(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn stopwatch(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// Clock driven by the host, which pushes readings as its simulation ticks
#[derive(Debug, Default)]
pub struct ManualClock {
    readings: Mutex<(f64, f64)>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both readings
    pub fn set(&self, time: f64, stopwatch: f64) {
        *self.readings.lock() = (time, stopwatch);
    }

    /// Advance both readings by `seconds`
    pub fn advance(&self, seconds: f64) {
        let mut readings = self.readings.lock();
        readings.0 += seconds;
        readings.1 += seconds;
    }
}

impl SessionClock for ManualClock {
    fn time(&self) -> f64 {
        self.readings.lock().0
    }

    fn stopwatch(&self) -> f64 {
        self.readings.lock().1
    }
}
