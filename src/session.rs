//! State of a single offload attempt.
//!
//! A [`Session`] owns everything one encode command produces: the message,
//! the negotiated parameters, and the encoded output. It is created fresh for
//! each command and advanced by [`OffloadDriver`](crate::driver::OffloadDriver).
//! Because a failed session is a separate value, its partial output can never
//! be mistaken for the result of an earlier, successful run.

use heapless::Vec;

use crate::consts::MAX_ENCODED_LEN;
use crate::encoding::Message;
use crate::error::{OffloadError, Result};
use crate::framing::Params;
use crate::segment::BlockPlan;

/// Bounded buffer collecting the encoded output of one session.
pub type EncodedBuffer = Vec<u8, MAX_ENCODED_LEN>;

/// Where a session is in the offload exchange.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum SessionState {
    /// Not started.
    #[default]
    Idle,
    /// Scanning the link for the sync tag.
    WaitingForTag,
    /// Length announced; waiting for `K` and `N`.
    WaitingForParams,
    /// Transferring the given block.
    Encoding {
        /// Zero-based index of the block in flight.
        block: u16,
    },
    /// All blocks encoded.
    Done,
    /// Stopped by an error.
    Failed(OffloadError),
}

impl core::fmt::Display for SessionState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SessionState::Idle => f.write_str("idle"),
            SessionState::WaitingForTag => f.write_str("waiting for tag"),
            SessionState::WaitingForParams => f.write_str("waiting for parameters"),
            SessionState::Encoding { block } => write!(f, "encoding block {}", block + 1),
            SessionState::Done => f.write_str("done"),
            SessionState::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Figures reported after a successful session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Summary {
    /// Negotiated code parameters.
    pub params: Params,
    /// Number of blocks transferred.
    pub blocks: u16,
    /// Real message length in bits.
    pub message_bits: u16,
    /// Bit length announced to the device.
    pub calculation_bits: u16,
    /// Encoded output length in bytes.
    pub encoded_bytes: usize,
    /// Encoded output length in bits (`blocks * N`).
    pub encoded_bits: u32,
}

impl Summary {
    pub(crate) fn new(plan: &BlockPlan, encoded_bytes: usize) -> Self {
        Self {
            params: plan.params(),
            blocks: plan.blocks(),
            message_bits: plan.message_bits(),
            calculation_bits: plan.calculation_bits(),
            encoded_bytes,
            encoded_bits: plan.encoded_bits(),
        }
    }
}

/// One offload attempt and everything it produced.
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    message: Message,
    plan: Option<BlockPlan>,
    encoded: EncodedBuffer,
}

impl Session {
    /// Starts a session for `message`.
    pub fn new(message: Message) -> Self {
        Self {
            state: SessionState::Idle,
            message,
            plan: None,
            encoded: EncodedBuffer::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The message being offloaded.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Parameters received from the device, once negotiated.
    pub fn params(&self) -> Option<Params> {
        self.plan.map(|plan| plan.params())
    }

    /// Block layout, once parameters are negotiated.
    pub fn plan(&self) -> Option<&BlockPlan> {
        self.plan.as_ref()
    }

    /// Encoded bytes received so far.
    ///
    /// After a failure this holds exactly the bytes that arrived before it.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// Whether every block was encoded.
    pub fn is_done(&self) -> bool {
        self.state == SessionState::Done
    }

    /// The error the session stopped with, if any.
    pub fn error(&self) -> Option<OffloadError> {
        match self.state {
            SessionState::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Final figures, once the session is done.
    pub fn summary(&self) -> Option<Summary> {
        if !self.is_done() {
            return None;
        }
        self.plan.map(|plan| Summary::new(&plan, self.encoded.len()))
    }

    /// Returns to [`SessionState::Idle`], dropping any negotiated state and output.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.plan = None;
        self.encoded.clear();
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    /// Marks the session failed and hands the error back for propagation.
    pub(crate) fn fail(&mut self, err: OffloadError) -> OffloadError {
        self.state = SessionState::Failed(err);
        err
    }

    /// Lays out the block transfer for `params`.
    ///
    /// Any previous plan and encoded output are dropped, so stale bytes can
    /// never shift the layout of the new transfer.
    pub(crate) fn negotiate(&mut self, params: Params) -> Result<BlockPlan> {
        self.plan = None;
        self.encoded.clear();
        let plan = BlockPlan::new(
            params,
            self.message.calculation_bits(),
            self.message.bits(),
        )?;
        self.plan = Some(plan);
        Ok(plan)
    }

    pub(crate) fn clear_encoded(&mut self) {
        self.encoded.clear();
    }

    pub(crate) fn push_encoded(&mut self, byte: u8) {
        // Capacity was checked when the plan was made.
        let _ = self.encoded.push(byte);
    }
}
