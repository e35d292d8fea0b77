//! Offload driver for a remote LDPC encoder.
//!
//! This module provides the [`OffloadDriver`] struct, which runs the host side
//! of the offload exchange over a byte-oriented [`Link`]. It needs only a link,
//! a millisecond [`Clock`], and an `embedded-hal` delay, so it runs the same
//! on bare metal and on a hosted target.
//!
//! ## Exchange
//!
//! 1. Wait for the device's sync tag (bounded by the tag timeout).
//! 2. Announce the calculation bit-length as a big-endian `u16`.
//! 3. Wait for `K` and `N` (bounded by the parameter timeout).
//! 4. For each block, send `K_bytes` bytes and collect `N_bytes` encoded bytes
//!    (each block bounded by its own timeout).
//!
//! Every byte written is followed by a pacing delay. Reads poll the link, sleep
//! for a short interval, and check the clock, so no step can wait longer than
//! its timeout (plus one poll interval).
//!
//! ## Example
//!
//! ```rust
//! # use ldpc_offload::link::Link;
//! # struct Silent;
//! # impl Link for Silent {
//! #     type Error = ();
//! #     fn write(&mut self, _: u8) -> nb::Result<(), ()> { Ok(()) }
//! #     fn bytes_available(&mut self) -> usize { 0 }
//! #     fn read(&mut self) -> nb::Result<u8, ()> { Err(nb::Error::WouldBlock) }
//! # }
//! use ldpc_offload::driver::{OffloadConfig, OffloadDriver};
//! use ldpc_offload::encoding::Message;
//! use ldpc_offload::error::OffloadError;
//! use ldpc_offload::session::Session;
//! use ldpc_offload::timer::{StdClock, StdDelay};
//!
//! let config = OffloadConfig::default().with_tag_timeout_ms(20);
//! let mut driver = OffloadDriver::with_config(Silent, StdClock::new(), StdDelay, config);
//!
//! let mut session = Session::new(Message::text("Hi").unwrap());
//! assert_eq!(driver.run(&mut session), Err(OffloadError::TagTimeout));
//! ```
//!
//! ## Design Notes
//!
//! Read errors reported by the link are logged and otherwise treated as "no
//! byte yet". A corrupted or dropped byte therefore surfaces as a timeout, the
//! only failure signal the protocol has.

use embedded_hal::delay::DelayNs;

use crate::consts::{
    BLOCK_POLL_MS, BLOCK_TIMEOUT_MS, PARAM_POLL_MS, PARAM_TIMEOUT_MS, PARAMS_LEN, TAG_POLL_MS,
    TAG_TIMEOUT_MS, WRITE_PACING_MS,
};
use crate::error::{OffloadError, Result, Stage};
use crate::framing::{Params, TagMatcher, decode_params, encode_u16};
use crate::link::Link;
use crate::session::{Session, SessionState, Summary};
use crate::timer::{Clock, Stopwatch};

/// Timing of the offload exchange. All values are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct OffloadConfig {
    /// Upper bound on the wait for the sync tag.
    pub tag_timeout_ms: u32,
    /// Upper bound on the wait for `K` and `N`.
    pub param_timeout_ms: u32,
    /// Upper bound on the wait for one block of encoded bytes. Re-armed for every block.
    pub block_timeout_ms: u32,
    /// Delay after every byte written to the device.
    pub write_pacing_ms: u32,
    /// Sleep between polls while waiting for the sync tag.
    pub tag_poll_ms: u32,
    /// Sleep between polls while waiting for `K` and `N`.
    pub param_poll_ms: u32,
    /// Sleep between polls while waiting for encoded bytes.
    pub block_poll_ms: u32,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            tag_timeout_ms: TAG_TIMEOUT_MS,
            param_timeout_ms: PARAM_TIMEOUT_MS,
            block_timeout_ms: BLOCK_TIMEOUT_MS,
            write_pacing_ms: WRITE_PACING_MS,
            tag_poll_ms: TAG_POLL_MS,
            param_poll_ms: PARAM_POLL_MS,
            block_poll_ms: BLOCK_POLL_MS,
        }
    }
}

impl OffloadConfig {
    /// Sets the sync tag timeout.
    pub fn with_tag_timeout_ms(mut self, ms: u32) -> Self {
        self.tag_timeout_ms = ms;
        self
    }

    /// Sets the parameter timeout.
    pub fn with_param_timeout_ms(mut self, ms: u32) -> Self {
        self.param_timeout_ms = ms;
        self
    }

    /// Sets the per-block timeout.
    pub fn with_block_timeout_ms(mut self, ms: u32) -> Self {
        self.block_timeout_ms = ms;
        self
    }

    /// Sets the delay after each written byte.
    pub fn with_write_pacing_ms(mut self, ms: u32) -> Self {
        self.write_pacing_ms = ms;
        self
    }
}

/// Host side of the LDPC offload exchange.
///
/// ## Type Parameters
///
/// - `L`: the [`Link`] to the encoder device
/// - `C`: a [`Clock`] used to bound every wait
/// - `D`: an [`embedded_hal::delay::DelayNs`] used for pacing and polling
///
/// The peripherals are public so they can be inspected (or mocks checked)
/// between sessions.
#[derive(Debug)]
pub struct OffloadDriver<L, C, D>
where
    L: Link,
    C: Clock,
    D: DelayNs,
{
    /// Link to the encoder device
    pub link: L,
    /// Time source
    pub clock: C,
    /// Sleep provider
    pub delay: D,
    config: OffloadConfig,
}

impl<L, C, D> OffloadDriver<L, C, D>
where
    L: Link,
    C: Clock,
    D: DelayNs,
{
    /// Creates a driver with the default timing.
    pub fn new(link: L, clock: C, delay: D) -> Self {
        Self::with_config(link, clock, delay, OffloadConfig::default())
    }

    /// Creates a driver with custom timing.
    pub fn with_config(link: L, clock: C, delay: D, config: OffloadConfig) -> Self {
        Self {
            link,
            clock,
            delay,
            config,
        }
    }

    /// Current timing.
    pub fn config(&self) -> &OffloadConfig {
        &self.config
    }

    /// Replaces the timing used by later steps.
    pub fn set_config(&mut self, config: OffloadConfig) {
        self.config = config;
    }

    /// Gives back the peripherals.
    pub fn release(self) -> (L, C, D) {
        (self.link, self.clock, self.delay)
    }

    /// Runs a complete exchange for `session`.
    ///
    /// The session is reset first, so its state and output always reflect
    /// this run only. On failure it is left in [`SessionState::Failed`] with
    /// whatever encoded bytes had arrived.
    ///
    /// # Errors
    /// The first [`OffloadError`] hit by any step. Nothing is retried.
    pub fn run(&mut self, session: &mut Session) -> Result<Summary> {
        session.reset();
        info!(
            "starting LDPC offload: {} bits, {} bits for calculation",
            session.message().bits(),
            session.message().calculation_bits()
        );
        self.wait_for_tag(session)?;
        self.send_length(session)?;
        let params = self.receive_params(session)?;
        debug!("negotiated K={}, N={}", params.k, params.n);
        self.transfer_blocks(session)
    }

    /// Scans the link for the sync tag.
    ///
    /// Bytes are consumed one per poll. Anything that breaks the tag sequence
    /// restarts the match.
    ///
    /// # Errors
    /// [`OffloadError::TagTimeout`] if the tag is not seen within the tag timeout.
    pub fn wait_for_tag(&mut self, session: &mut Session) -> Result<()> {
        session.set_state(SessionState::WaitingForTag);
        debug!("waiting for encoder tag");
        let mut matcher = TagMatcher::new();
        let timer = Stopwatch::start(&mut self.clock);
        while !timer.expired(&mut self.clock, self.config.tag_timeout_ms) {
            if self.link.bytes_available() > 0 {
                if let Some(byte) = self.read_byte() {
                    if matcher.push(byte) {
                        info!("tag received");
                        return Ok(());
                    }
                }
            }
            self.delay.delay_ms(self.config.tag_poll_ms);
        }
        warn!("timeout waiting for tag");
        Err(session.fail(OffloadError::TagTimeout))
    }

    /// Announces the calculation bit-length to the device.
    ///
    /// No acknowledgment is expected.
    ///
    /// # Errors
    /// [`OffloadError::WriteFailure`] if the link rejects a byte.
    pub fn send_length(&mut self, session: &mut Session) -> Result<()> {
        let bits = session.message().calculation_bits();
        for byte in encode_u16(bits) {
            self.write_paced(byte, Stage::Length)
                .map_err(|err| session.fail(err))?;
        }
        info!("sent message length: {} bits", bits);
        session.set_state(SessionState::WaitingForParams);
        Ok(())
    }

    /// Waits for the device to announce `K` and `N`, then lays out the blocks.
    ///
    /// # Errors
    /// - [`OffloadError::ParamTimeout`] if 4 bytes do not arrive within the parameter timeout.
    /// - [`OffloadError::InvalidParameters`] if `K` or `N` is zero.
    /// - [`OffloadError::CapacityExceeded`] if the encoded output would not fit.
    pub fn receive_params(&mut self, session: &mut Session) -> Result<Params> {
        session.set_state(SessionState::WaitingForParams);
        debug!("waiting for K and N");
        let mut raw = [0u8; PARAMS_LEN];
        let mut filled = 0;
        let timer = Stopwatch::start(&mut self.clock);
        while !timer.expired(&mut self.clock, self.config.param_timeout_ms) {
            if self.link.bytes_available() >= PARAMS_LEN - filled {
                while filled < PARAMS_LEN {
                    match self.read_byte() {
                        Some(byte) => {
                            raw[filled] = byte;
                            filled += 1;
                        }
                        None => break,
                    }
                }
                if filled == PARAMS_LEN {
                    let params = decode_params(raw);
                    info!("received parameters: K={}, N={}", params.k, params.n);
                    let plan = session.negotiate(params).map_err(|err| session.fail(err))?;
                    if plan.unsent_bytes() > 0 {
                        warn!(
                            "calculation length covers {} bytes, {} message bytes will not be sent",
                            plan.payload_len(),
                            plan.unsent_bytes()
                        );
                    }
                    return Ok(params);
                }
            }
            self.delay.delay_ms(self.config.param_poll_ms);
        }
        warn!("timeout waiting for parameters");
        Err(session.fail(OffloadError::ParamTimeout))
    }

    /// Sends every block and collects its encoded bytes.
    ///
    /// Blocks are strictly sequential: block `i + 1` is not started until all
    /// of block `i`'s encoded bytes have arrived.
    ///
    /// # Errors
    /// - [`OffloadError::BlockTimeout`] if a block's encoded bytes do not all
    ///   arrive within the block timeout. Later blocks are not attempted.
    /// - [`OffloadError::WriteFailure`] if the link rejects a payload byte.
    /// - [`OffloadError::NotNegotiated`] if [`receive_params`](Self::receive_params)
    ///   has not succeeded for this session.
    ///
    /// Output from an earlier transfer of the same session is discarded first.
    pub fn transfer_blocks(&mut self, session: &mut Session) -> Result<Summary> {
        let plan = match session.plan() {
            Some(plan) => *plan,
            None => return Err(session.fail(OffloadError::NotNegotiated)),
        };
        session.clear_encoded();
        let blocks = plan.blocks();
        let n_bytes = plan.n_bytes();
        info!(
            "sending {} blocks of {} bytes each, expecting {} bytes back per block",
            blocks,
            plan.k_bytes(),
            n_bytes
        );

        for block in 0..blocks {
            session.set_state(SessionState::Encoding { block });
            debug!("sending block {}/{}", block + 1, blocks);
            for offset in 0..plan.k_bytes() {
                let byte = plan.payload_byte(session.message().bytes(), block, offset);
                self.write_paced(byte, Stage::Payload)
                    .map_err(|err| session.fail(err))?;
            }

            let timer = Stopwatch::start(&mut self.clock);
            let mut received = 0;
            while received < n_bytes
                && !timer.expired(&mut self.clock, self.config.block_timeout_ms)
            {
                while received < n_bytes && self.link.bytes_available() > 0 {
                    match self.read_byte() {
                        Some(byte) => {
                            session.push_encoded(byte);
                            received += 1;
                        }
                        None => break,
                    }
                }
                if received < n_bytes {
                    self.delay.delay_ms(self.config.block_poll_ms);
                }
            }

            if received < n_bytes {
                warn!(
                    "timeout receiving encoded data for block {} ({}/{} bytes)",
                    block + 1,
                    received,
                    n_bytes
                );
                return Err(session.fail(OffloadError::BlockTimeout {
                    block,
                    received,
                    expected: n_bytes,
                }));
            }
            debug!("received {} encoded bytes for block {}", received, block + 1);
        }

        session.set_state(SessionState::Done);
        info!("encoding completed: {} blocks", blocks);
        Ok(Summary::new(&plan, session.encoded().len()))
    }

    /// Writes one byte, then waits out the pacing delay.
    fn write_paced(&mut self, byte: u8, stage: Stage) -> Result<()> {
        if nb::block!(self.link.write(byte)).is_err() {
            error!("link write failed");
            return Err(OffloadError::WriteFailure { stage });
        }
        self.delay.delay_ms(self.config.write_pacing_ms);
        Ok(())
    }

    /// Reads one byte, treating link errors as "nothing yet".
    fn read_byte(&mut self) -> Option<u8> {
        match self.link.read() {
            Ok(byte) => {
                trace!("rx {}", byte);
                Some(byte)
            }
            Err(nb::Error::WouldBlock) => None,
            Err(nb::Error::Other(_)) => {
                warn!("link read error");
                None
            }
        }
    }
}
