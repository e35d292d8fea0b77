//! Errors raised by an offload session.
//!
//! Every variant is fatal to the session it occurs in. The driver never retries
//! on its own; the caller reports the failure and starts a fresh session.

/// The protocol step a link write failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Stage {
    /// Writing the 2-byte bit-length announcement.
    Length,
    /// Writing block payload bytes.
    Payload,
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Stage::Length => f.write_str("message length"),
            Stage::Payload => f.write_str("message data"),
        }
    }
}

/// Why an offload session failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum OffloadError {
    /// The submitted message was blank, or converted to zero bits.
    #[error("no message entered")]
    EmptyInput,

    /// The device never sent the sync tag.
    #[error("timeout waiting for the encoder tag")]
    TagTimeout,

    /// The device never sent the `K`/`N` parameters.
    #[error("timeout waiting for LDPC parameters")]
    ParamTimeout,

    /// The device sent a zero `K` or `N`.
    #[error("invalid LDPC parameters (K={k}, N={n})")]
    InvalidParameters {
        /// Information bits per block, as received.
        k: u16,
        /// Codeword bits per block, as received.
        n: u16,
    },

    /// Blocks were requested before `K` and `N` were received.
    #[error("block transfer started before LDPC parameters were negotiated")]
    NotNegotiated,

    /// The negotiated block layout would not fit into the encoded buffer.
    #[error("encoded output needs {required} bytes, buffer holds {capacity}")]
    CapacityExceeded {
        /// Bytes the device would return for all blocks.
        required: usize,
        /// Capacity of the encoded buffer.
        capacity: usize,
    },

    /// Fewer than `expected` encoded bytes arrived for a block before its timeout.
    #[error("timeout receiving encoded data for block {block} ({received}/{expected} bytes)")]
    BlockTimeout {
        /// Zero-based index of the block that stalled.
        block: u16,
        /// Encoded bytes received for that block.
        received: usize,
        /// Encoded bytes expected per block.
        expected: usize,
    },

    /// The link rejected a write.
    #[error("failed to send {stage}")]
    WriteFailure {
        /// Which step the write belonged to.
        stage: Stage,
    },
}

/// Result alias for offload operations.
pub type Result<T> = core::result::Result<T, OffloadError>;
