//! # ldpc-offload
//!
//! A portable, no_std Rust host for offloading LDPC encoding to a remote
//! encoder device over a serial link.
//!
//! The host converts a user message into bytes, waits for the device to
//! announce itself, sends the message length, receives the code parameters
//! `K` and `N`, then streams the message block by block while collecting the
//! encoded output. Every wait is bounded by a timeout.
//!
//! This crate provides:
//! - `embedded-hal` / `embedded-hal-nb` based transport and timing
//! - bounded `heapless` buffers, so no allocator is needed
//! - a millisecond clock driven from a timer interrupt through `critical-section`
//! - an interactive console matching the classic serial menu
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Disables `#![no_std]` and adds `StdClock` / `StdDelay` |
//! | `timer-isr` (default) | Millisecond counter ticked from a timer ISR |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ldpc_offload::driver::OffloadDriver;
//! use ldpc_offload::encoding::Message;
//! use ldpc_offload::link::SerialLink;
//! use ldpc_offload::session::Session;
//! use ldpc_offload::timer::MillisClock;
//!
//! ldpc_offload::init_millis_clock!(MILLIS);
//!
//! let link = SerialLink::<_>::new(uart);
//! let mut driver = OffloadDriver::new(link, MillisClock::new(&MILLIS), delay);
//!
//! let mut session = Session::new(Message::hex("AB CD EF 12")?);
//! let summary = driver.run(&mut session)?;
//! ```
//!
//! The timer interrupt then only has to call `tick_millis!(MILLIS)` once per
//! millisecond.
//!
//! ## Integration Notes
//!
//! - The device link is expected to run at 115200 baud, 8N1
//! - Outgoing bytes are paced (10 ms by default), so the device never has to
//!   buffer more than one byte
//! - Only one session can be in flight per driver
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(any(feature = "std", test)), no_std)]

#[cfg(feature = "timer-isr")]
pub use critical_section;

pub use heapless;
pub use nb;

#[macro_use]
mod fmt;

pub mod console;
pub mod consts;
pub mod driver;
pub mod dump;
pub mod encoding;
pub mod error;
pub mod framing;
pub mod link;
pub mod segment;
pub mod session;
pub mod timer;

#[cfg(test)]
mod testing;
