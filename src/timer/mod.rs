//! Time sources for the offload driver.
//!
//! The driver never blocks on the link. It polls, sleeps for a short interval
//! through an `embedded_hal::delay::DelayNs`, and checks a [`Clock`] to decide
//! when a wait has run out. Both are injected, so tests can drive time by hand.
//!
//! Two clocks are provided:
//! - `MillisClock` (feature `timer-isr`): a millisecond counter advanced from a
//!   1 kHz timer interrupt, shared through `critical_section`.
//! - `StdClock` (feature `std`): wall-clock time from `std::time::Instant`.
//!
//! Timestamps are `u32` milliseconds and all arithmetic wraps, so a counter
//! rolling over in the middle of a wait is harmless.

#[cfg(feature = "std")]
mod delay;
#[cfg(feature = "std")]
pub use delay::*;

#[cfg(feature = "timer-isr")]
mod isr;
#[cfg(feature = "timer-isr")]
pub use isr::*;

#[cfg(feature = "timer-isr")]
mod macros;

/// A monotonic millisecond clock.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch. May wrap.
    fn now_ms(&mut self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &mut C {
    fn now_ms(&mut self) -> u32 {
        (**self).now_ms()
    }
}

/// Measures elapsed time against a [`Clock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopwatch {
    start: u32,
}

impl Stopwatch {
    /// Starts measuring from the clock's current time.
    pub fn start<C: Clock + ?Sized>(clock: &mut C) -> Self {
        Self {
            start: clock.now_ms(),
        }
    }

    /// Milliseconds since [`start`](Stopwatch::start).
    pub fn elapsed_ms<C: Clock + ?Sized>(&self, clock: &mut C) -> u32 {
        clock.now_ms().wrapping_sub(self.start)
    }

    /// Whether at least `timeout_ms` have passed.
    pub fn expired<C: Clock + ?Sized>(&self, clock: &mut C, timeout_ms: u32) -> bool {
        self.elapsed_ms(clock) >= timeout_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ManualClock(u32);

    impl Clock for ManualClock {
        fn now_ms(&mut self) -> u32 {
            self.0
        }
    }

    #[test]
    fn test_stopwatch_measures_elapsed() {
        let mut clock = ManualClock(100);
        let watch = Stopwatch::start(&mut clock);
        clock.0 = 350;
        assert_eq!(watch.elapsed_ms(&mut clock), 250);
        assert!(!watch.expired(&mut clock, 251));
        assert!(watch.expired(&mut clock, 250));
    }

    #[test]
    fn test_stopwatch_survives_rollover() {
        let mut clock = ManualClock(u32::MAX - 10);
        let watch = Stopwatch::start(&mut clock);
        clock.0 = 20;
        assert_eq!(watch.elapsed_ms(&mut clock), 31);
        assert!(!watch.expired(&mut clock, 5_000));
    }
}
