use super::Clock;
use embedded_hal::delay::DelayNs;
use std::time::{Duration, Instant};

/// [`Clock`] reading wall-clock time, for hosted targets.
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: Instant,
}

impl StdClock {
    /// Starts counting from now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now_ms(&mut self) -> u32 {
        self.origin.elapsed().as_millis() as u32
    }
}

/// `DelayNs` that puts the current thread to sleep.
///
/// Sleeps are at least as long as requested, usually a little longer.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}
