//! Wire encodings for the offload exchange.
//!
//! The exchange with the encoder device is a fixed sequence of raw bytes with
//! no length prefixes or checksums:
//!
//! ```text
//! device -> host : DE AD C0 DE              sync tag
//! host -> device : LEN_HI LEN_LO            calculation bit-length, u16 BE
//! device -> host : K_HI K_LO N_HI N_LO      LDPC parameters, u16 BE each
//! host -> device : K_bytes payload          } repeated for each block
//! device -> host : N_bytes encoded          }
//! ```
//!
//! Everything here is pure. The only stateful piece is [`TagMatcher`], which
//! tracks how much of the sync tag has been seen so far.

pub use crate::consts::SYNC_TAG;
use crate::consts::{PARAMS_LEN, SYNC_TAG_LEN};

/// Encodes a `u16` as two bytes, most significant first.
pub fn encode_u16(value: u16) -> [u8; 2] {
    [(value >> 8) as u8, (value & 0xff) as u8]
}

/// Decodes two bytes, most significant first, into a `u16`.
pub fn decode_u16(bytes: [u8; 2]) -> u16 {
    ((bytes[0] as u16) << 8) | bytes[1] as u16
}

/// LDPC code parameters announced by the encoder device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Params {
    /// Information bits per block.
    pub k: u16,
    /// Codeword bits per block.
    pub n: u16,
}

impl Params {
    /// Decodes the 4-byte parameter reply: `K` then `N`, both big-endian.
    pub fn decode(bytes: [u8; PARAMS_LEN]) -> Self {
        Self {
            k: decode_u16([bytes[0], bytes[1]]),
            n: decode_u16([bytes[2], bytes[3]]),
        }
    }

    /// Encodes the parameters the way the device sends them.
    pub fn encode(&self) -> [u8; PARAMS_LEN] {
        let [k_hi, k_lo] = encode_u16(self.k);
        let [n_hi, n_lo] = encode_u16(self.n);
        [k_hi, k_lo, n_hi, n_lo]
    }
}

/// Decodes the 4-byte parameter reply. Shorthand for [`Params::decode`].
pub fn decode_params(bytes: [u8; PARAMS_LEN]) -> Params {
    Params::decode(bytes)
}

/// Incremental matcher for [`SYNC_TAG`].
///
/// Bytes are fed one at a time. A byte that does not extend the partial match
/// resets it to zero, and that byte is not reconsidered as the start of a new
/// match. So `DE AD DE AD C0 DE` does not match: the second `DE` only resets.
#[derive(Debug, Clone, Default)]
pub struct TagMatcher {
    index: usize,
}

impl TagMatcher {
    /// Creates a matcher with nothing matched yet.
    pub fn new() -> Self {
        Self { index: 0 }
    }

    /// Feeds one byte. Returns `true` when it completes the tag.
    ///
    /// After a complete match the matcher starts over.
    pub fn push(&mut self, byte: u8) -> bool {
        if byte == SYNC_TAG[self.index] {
            self.index += 1;
            if self.index == SYNC_TAG_LEN {
                self.index = 0;
                return true;
            }
        } else {
            self.index = 0;
        }
        false
    }

    /// Number of tag bytes matched so far.
    pub fn matched(&self) -> usize {
        self.index
    }

    /// Discards any partial match.
    pub fn reset(&mut self) {
        self.index = 0;
    }
}
