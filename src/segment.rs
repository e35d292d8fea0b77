//! Block segmentation arithmetic.
//!
//! Once the device has announced `K` and `N`, the message is cut into `C`
//! blocks of `K_bytes = ceil(K/8)` bytes, and each block comes back as
//! `N_bytes = ceil(N/8)` encoded bytes:
//!
//! ```text
//! C = ceil(calculation_bits / K)
//! payload sent    = C * K_bytes
//! encoded received = C * N_bytes
//! ```
//!
//! The block count follows the *calculation* length (which a manual override
//! can make longer or shorter than the message), while the bytes sent follow
//! the *actual* message: any index at or past `ceil(message_bits/8)` is sent
//! as zero padding.

use crate::consts::MAX_ENCODED_LEN;
use crate::error::{OffloadError, Result};
use crate::framing::Params;

/// Layout of the block transfer for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct BlockPlan {
    params: Params,
    calculation_bits: u16,
    message_bits: u16,
    k_bytes: usize,
    n_bytes: usize,
    blocks: u16,
}

impl BlockPlan {
    /// Lays out the transfer of a `message_bits` long message, announced to the
    /// device as `calculation_bits`.
    ///
    /// # Errors
    /// - [`OffloadError::InvalidParameters`] if `K` or `N` is zero.
    /// - [`OffloadError::EmptyInput`] if `calculation_bits` is zero.
    /// - [`OffloadError::CapacityExceeded`] if the encoded output would not fit
    ///   into the encoded buffer.
    pub fn new(params: Params, calculation_bits: u16, message_bits: u16) -> Result<Self> {
        if params.k == 0 || params.n == 0 {
            return Err(OffloadError::InvalidParameters {
                k: params.k,
                n: params.n,
            });
        }
        if calculation_bits == 0 {
            return Err(OffloadError::EmptyInput);
        }
        let k_bytes = params.k.div_ceil(8) as usize;
        let n_bytes = params.n.div_ceil(8) as usize;
        let blocks = calculation_bits.div_ceil(params.k);
        let required = blocks as usize * n_bytes;
        if required > MAX_ENCODED_LEN {
            return Err(OffloadError::CapacityExceeded {
                required,
                capacity: MAX_ENCODED_LEN,
            });
        }
        Ok(Self {
            params,
            calculation_bits,
            message_bits,
            k_bytes,
            n_bytes,
            blocks,
        })
    }

    /// The negotiated code parameters.
    pub fn params(&self) -> Params {
        self.params
    }

    /// Bit length the block count is derived from.
    pub fn calculation_bits(&self) -> u16 {
        self.calculation_bits
    }

    /// Real message length in bits.
    pub fn message_bits(&self) -> u16 {
        self.message_bits
    }

    /// Bytes sent per block, `ceil(K/8)`.
    pub fn k_bytes(&self) -> usize {
        self.k_bytes
    }

    /// Bytes received per block, `ceil(N/8)`.
    pub fn n_bytes(&self) -> usize {
        self.n_bytes
    }

    /// Number of blocks, `ceil(calculation_bits/K)`.
    pub fn blocks(&self) -> u16 {
        self.blocks
    }

    /// Real message length in bytes; indices past this are padding.
    pub fn message_bytes(&self) -> usize {
        self.message_bits.div_ceil(8) as usize
    }

    /// Total bytes sent to the device.
    pub fn payload_len(&self) -> usize {
        self.blocks as usize * self.k_bytes
    }

    /// Total encoded bytes expected back.
    pub fn encoded_len(&self) -> usize {
        self.blocks as usize * self.n_bytes
    }

    /// Total encoded bits expected back.
    pub fn encoded_bits(&self) -> u32 {
        self.blocks as u32 * self.params.n as u32
    }

    /// Message bytes that fall past the last block and are never sent.
    ///
    /// Non-zero only when a manual override declares fewer bits than the message holds.
    pub fn unsent_bytes(&self) -> usize {
        self.message_bytes().saturating_sub(self.payload_len())
    }

    /// The byte sent at `offset` within `block`.
    ///
    /// This is the stored message byte while the absolute index is inside the
    /// message, and `0` past it.
    pub fn payload_byte(&self, message: &[u8], block: u16, offset: usize) -> u8 {
        let index = block as usize * self.k_bytes + offset;
        if index < self.message_bytes() {
            message.get(index).copied().unwrap_or(0)
        } else {
            0
        }
    }

    /// Iterates over the `K_bytes` bytes sent for `block`.
    pub fn block_payload<'a>(
        &self,
        message: &'a [u8],
        block: u16,
    ) -> impl Iterator<Item = u8> + 'a {
        let plan = *self;
        (0..self.k_bytes).map(move |offset| plan.payload_byte(message, block, offset))
    }
}
