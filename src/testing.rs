//! Test doubles: simulated time and a scripted encoder device.
//!
//! Time only moves when the code under test sleeps through [`SimDelay`], so
//! every timeout path runs instantly and deterministically.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;

use crate::link::Link;
use crate::timer::Clock;

const NANOS_PER_MILLI: u64 = 1_000_000;

/// Shared simulated time, in nanoseconds.
#[derive(Debug, Clone, Default)]
pub(crate) struct SimTime(Rc<Cell<u64>>);

impl SimTime {
    fn now_ns(&self) -> u64 {
        self.0.get()
    }

    fn advance_ns(&self, ns: u64) {
        self.0.set(self.0.get() + ns);
    }
}

/// [`Clock`] reading simulated time.
#[derive(Debug, Clone)]
pub(crate) struct SimClock(SimTime);

impl Clock for SimClock {
    fn now_ms(&mut self) -> u32 {
        (self.0.now_ns() / NANOS_PER_MILLI) as u32
    }
}

/// `DelayNs` that advances simulated time instead of sleeping.
#[derive(Debug, Clone)]
pub(crate) struct SimDelay(SimTime);

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance_ns(ns as u64);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.advance_ns(ms as u64 * NANOS_PER_MILLI);
    }
}

#[derive(Debug)]
struct Response {
    after_writes: usize,
    delay_ms: u32,
    bytes: Vec<u8>,
}

/// A scripted encoder device on the far end of a [`Link`].
///
/// Bytes can be queued up front, at a fixed simulated time, or in response to
/// the host having written a given number of bytes.
#[derive(Debug, Default)]
pub(crate) struct FakeLink {
    time: SimTime,
    inbox: VecDeque<(u64, u8)>,
    written: Vec<u8>,
    responses: Vec<Response>,
    fail_writes_after: Option<usize>,
    fail_reads: bool,
}

impl FakeLink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Clock and delay sharing this link's simulated time.
    pub(crate) fn sim(&self) -> (SimClock, SimDelay) {
        (SimClock(self.time.clone()), SimDelay(self.time.clone()))
    }

    /// Makes `bytes` readable right away.
    pub(crate) fn queue(&mut self, bytes: &[u8]) {
        let now = self.time.now_ns();
        self.inbox.extend(bytes.iter().map(|&b| (now, b)));
    }

    /// Makes `bytes` readable once simulated time reaches `at_ms`.
    pub(crate) fn queue_at(&mut self, at_ms: u32, bytes: &[u8]) {
        let at = at_ms as u64 * NANOS_PER_MILLI;
        self.inbox.extend(bytes.iter().map(|&b| (at, b)));
    }

    /// Makes `bytes` readable `delay_ms` after the host's `after_writes`-th write.
    pub(crate) fn respond_after(&mut self, after_writes: usize, delay_ms: u32, bytes: &[u8]) {
        self.responses.push(Response {
            after_writes,
            delay_ms,
            bytes: bytes.to_vec(),
        });
    }

    /// Accepts `n` writes, then rejects every later one.
    pub(crate) fn fail_writes_after(&mut self, n: usize) {
        self.fail_writes_after = Some(n);
    }

    /// Reports every read as a transport error.
    pub(crate) fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Everything the host has written.
    pub(crate) fn written(&self) -> &[u8] {
        &self.written
    }

    /// Queued bytes the host has not read, ready or not.
    pub(crate) fn remaining(&self) -> usize {
        self.inbox.len()
    }
}

impl Link for FakeLink {
    type Error = ();

    fn write(&mut self, byte: u8) -> nb::Result<(), ()> {
        if self
            .fail_writes_after
            .is_some_and(|limit| self.written.len() >= limit)
        {
            return Err(nb::Error::Other(()));
        }
        self.written.push(byte);
        let count = self.written.len();
        let now = self.time.now_ns();
        for response in self.responses.iter().filter(|r| r.after_writes == count) {
            let at = now + response.delay_ms as u64 * NANOS_PER_MILLI;
            self.inbox.extend(response.bytes.iter().map(|&b| (at, b)));
        }
        Ok(())
    }

    fn bytes_available(&mut self) -> usize {
        let now = self.time.now_ns();
        self.inbox.iter().take_while(|(at, _)| *at <= now).count()
    }

    fn read(&mut self) -> nb::Result<u8, ()> {
        if self.bytes_available() == 0 {
            return Err(nb::Error::WouldBlock);
        }
        if self.fail_reads {
            return Err(nb::Error::Other(()));
        }
        match self.inbox.pop_front() {
            Some((_, byte)) => Ok(byte),
            None => Err(nb::Error::WouldBlock),
        }
    }
}
