/// Declares a static global [`MillisCounter`](crate::timer::MillisCounter).
///
/// # Arguments
/// - `$name`: The name of the static to declare
///
/// # Example
/// ```rust
/// ldpc_offload::init_millis_clock!(MILLIS);
///
/// let clock = ldpc_offload::timer::MillisClock::new(&MILLIS);
/// ```
#[macro_export]
macro_rules! init_millis_clock {
    ( $name:ident ) => {
        pub static $name: $crate::timer::MillisCounter = $crate::timer::millis_counter_init();
    };
}

/// Advances a counter declared with `init_millis_clock!` by one millisecond.
///
/// This macro is intended to be invoked from a 1 kHz timer ISR.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIM2() {
///     tick_millis!(MILLIS);
/// }
/// ```
#[macro_export]
macro_rules! tick_millis {
    ( $name:ident ) => {
        $crate::timer::millis_tick(&$name)
    };
}
