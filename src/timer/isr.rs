use super::Clock;
use core::cell::Cell;
use critical_section::Mutex;

/// A millisecond counter shared between a timer interrupt and the main loop.
pub type MillisCounter = Mutex<Cell<u32>>;

/// Used to initialize a global static [`MillisCounter`].
///
/// # Example
/// ```rust
/// use ldpc_offload::timer::{MillisCounter, millis_counter_init};
///
/// static MILLIS: MillisCounter = millis_counter_init();
/// ```
pub const fn millis_counter_init() -> MillisCounter {
    Mutex::new(Cell::new(0))
}

/// Advances the counter by one millisecond. Call this from a 1 kHz timer interrupt.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIM2() {
///     millis_tick(&MILLIS);
/// }
/// ```
pub fn millis_tick(counter: &MillisCounter) {
    critical_section::with(|cs| {
        let millis = counter.borrow(cs);
        millis.set(millis.get().wrapping_add(1));
    });
}

/// Reads the counter.
pub fn millis(counter: &MillisCounter) -> u32 {
    critical_section::with(|cs| counter.borrow(cs).get())
}

/// [`Clock`] backed by a global [`MillisCounter`].
#[derive(Clone, Copy)]
pub struct MillisClock {
    counter: &'static MillisCounter,
}

impl MillisClock {
    /// Reads time from `counter`, which a timer interrupt must keep advancing.
    pub fn new(counter: &'static MillisCounter) -> Self {
        Self { counter }
    }
}

impl core::fmt::Debug for MillisClock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MillisClock")
            .field("now_ms", &millis(self.counter))
            .finish()
    }
}

impl Clock for MillisClock {
    fn now_ms(&mut self) -> u32 {
        millis(self.counter)
    }
}
