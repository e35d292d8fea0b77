//! Constants used across the LDPC offload protocol.
//!
//! This module defines the wire-level constants of the offload exchange
//! (sync tag, buffer capacities) and the default timing used by
//! [`OffloadConfig`](crate::driver::OffloadConfig).
//!
//! ## Key Concepts
//!
//! - **Sync tag**: The 4 bytes the encoder device emits when it is ready for a new exchange.
//! - **Buffers**: The message buffer holds the user's input; the encoded buffer holds
//!   the device's output and is twice as large.
//! - **Timeouts**: Each waiting step has its own upper bound. The block timeout is re-armed
//!   for every block, so a slow but steady device is tolerated.
//! - **Pacing**: Every byte written to the device is followed by a short delay, because the
//!   device's receive path cannot be assumed to buffer faster than it drains.

/// The sync tag the encoder device emits to signal readiness.
pub const SYNC_TAG: [u8; SYNC_TAG_LEN] = [0xde, 0xad, 0xc0, 0xde];

/// Length (in bytes) of [`SYNC_TAG`].
pub const SYNC_TAG_LEN: usize = 4;

/// Length (in bytes) of the parameter reply: `K` then `N`, each a big-endian `u16`.
pub const PARAMS_LEN: usize = 4;

/// Capacity (in bytes) of the message buffer.
pub const MAX_MESSAGE_LEN: usize = 1024;

/// Capacity (in bytes) of the encoded output buffer.
///
/// Encoded data is larger than its input, so this is twice [`MAX_MESSAGE_LEN`].
pub const MAX_ENCODED_LEN: usize = MAX_MESSAGE_LEN * 2;

/// Maximum number of bytes accepted from a text-mode message.
///
/// One byte short of the buffer capacity.
pub const MAX_TEXT_LEN: usize = MAX_MESSAGE_LEN - 1;

/// How long to wait for the sync tag, in milliseconds.
pub const TAG_TIMEOUT_MS: u32 = 5_000;

/// How long to wait for the `K`/`N` reply, in milliseconds.
pub const PARAM_TIMEOUT_MS: u32 = 3_000;

/// How long to wait for a single block of encoded bytes, in milliseconds.
pub const BLOCK_TIMEOUT_MS: u32 = 3_000;

/// Delay after every byte written to the device, in milliseconds.
pub const WRITE_PACING_MS: u32 = 10;

/// Sleep between link polls while waiting for the sync tag.
pub const TAG_POLL_MS: u32 = 1;

/// Sleep between link polls while waiting for the parameter reply.
pub const PARAM_POLL_MS: u32 = 10;

/// Sleep between link polls while waiting for encoded bytes.
pub const BLOCK_POLL_MS: u32 = 1;

/// Baud rate the encoder device's UART is expected to run at (8N1).
pub const LINK_BAUD: u32 = 115_200;
