//! Conversion of user input into the message buffer sent to the encoder.
//!
//! The device consumes raw bytes, so both input modes end up as a byte buffer
//! plus a bit count (always a multiple of 8).
//!
//! ## Text mode
//!
//! Each input byte is stored as-is. Input longer than
//! [`MAX_TEXT_LEN`] is truncated silently.
//!
//! ## Hex mode
//!
//! Whitespace is dropped, then consecutive 2-character pairs are parsed as
//! bytes, case-insensitively. A trailing odd nibble is dropped, and parsing
//! stops once the buffer is full.
//!
//! Pairs are parsed leniently rather than validated: the value is whatever
//! a C `strtol(pair, NULL, 16)` would make of them, truncated to a byte.
//! In practice `"G1"` becomes `0x00`, `"1G"` becomes `0x01`, and `"-1"`
//! becomes `0xFF`.
//!
//! ## Limitations
//!
//! - Multi-byte UTF-8 characters are stored byte by byte in text mode.
//! - There is no way to express a message that is not a whole number of bytes,
//!   except through the manual bit-length override of [`InputMode::HexManual`].

use heapless::Vec;

use crate::consts::{MAX_MESSAGE_LEN, MAX_TEXT_LEN};
use crate::error::{OffloadError, Result};

/// Bounded buffer holding the message of one session.
pub type MessageBuffer = Vec<u8, MAX_MESSAGE_LEN>;

/// How the user's message is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum InputMode {
    /// Plain text, one byte per character.
    Text,
    /// Hex byte pairs, e.g. `"AB CD EF 12"`.
    Hex,
    /// Hex byte pairs, with a user-declared bit length used for the block count.
    HexManual,
}

impl InputMode {
    /// Whether the message should be displayed as hex rather than text.
    pub fn is_hex(&self) -> bool {
        !matches!(self, InputMode::Text)
    }
}

/// Stores `text` into `buffer`, one byte per input byte.
///
/// # Returns
/// The message length in bits.
pub fn text_to_bits(text: &[u8], buffer: &mut MessageBuffer) -> u16 {
    buffer.clear();
    let len = text.len().min(MAX_TEXT_LEN);
    let _ = buffer.extend_from_slice(&text[..len]);
    (len * 8) as u16
}

/// Parses hex pairs from `hex` into `buffer`.
///
/// # Returns
/// The message length in bits.
pub fn hex_to_bits(hex: &str, buffer: &mut MessageBuffer) -> u16 {
    buffer.clear();
    let mut digits = hex.bytes().filter(|b| !b.is_ascii_whitespace());
    while !buffer.is_full() {
        let (Some(hi), Some(lo)) = (digits.next(), digits.next()) else {
            break;
        };
        let _ = buffer.push(parse_hex_pair(hi, lo));
    }
    (buffer.len() * 8) as u16
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Lenient two-character hex parse, as `strtol` with base 16 would do it.
fn parse_hex_pair(first: u8, second: u8) -> u8 {
    match (first, hex_digit(first), hex_digit(second)) {
        (_, Some(hi), Some(lo)) => (hi << 4) | lo,
        (_, Some(hi), None) => hi,
        (b'+', None, Some(lo)) => lo,
        (b'-', None, Some(lo)) => lo.wrapping_neg(),
        _ => 0,
    }
}

/// A converted user message, ready to be offloaded.
#[derive(Debug, Clone)]
pub struct Message {
    buf: MessageBuffer,
    bits: u16,
    mode: InputMode,
    manual_bits: Option<u16>,
}

impl Message {
    /// Converts user input according to `mode`.
    ///
    /// The input is trimmed first. `manual_bits` is only honored for
    /// [`InputMode::HexManual`]; a manual length of zero counts as no override.
    ///
    /// # Errors
    /// [`OffloadError::EmptyInput`] if the trimmed input is blank or converts
    /// to zero bits (e.g. a lone hex nibble).
    pub fn new(mode: InputMode, input: &str, manual_bits: Option<u16>) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(OffloadError::EmptyInput);
        }
        let mut buf = MessageBuffer::new();
        let bits = match mode {
            InputMode::Text => text_to_bits(input.as_bytes(), &mut buf),
            InputMode::Hex | InputMode::HexManual => hex_to_bits(input, &mut buf),
        };
        if bits == 0 {
            return Err(OffloadError::EmptyInput);
        }
        let manual_bits = match mode {
            InputMode::HexManual => manual_bits.filter(|&b| b > 0),
            _ => None,
        };
        Ok(Self {
            buf,
            bits,
            mode,
            manual_bits,
        })
    }

    /// Text message.
    pub fn text(input: &str) -> Result<Self> {
        Self::new(InputMode::Text, input, None)
    }

    /// Hex message.
    pub fn hex(input: &str) -> Result<Self> {
        Self::new(InputMode::Hex, input, None)
    }

    /// Hex message whose block count is computed from `bits` instead of its real length.
    pub fn hex_with_length(input: &str, bits: u16) -> Result<Self> {
        Self::new(InputMode::HexManual, input, Some(bits))
    }

    /// The stored message bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Real message length in bits.
    pub fn bits(&self) -> u16 {
        self.bits
    }

    /// Real message length in bytes.
    pub fn byte_len(&self) -> usize {
        self.buf.len()
    }

    /// The input mode the message was converted with.
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// The manual bit-length override, if any.
    pub fn manual_bits(&self) -> Option<u16> {
        self.manual_bits
    }

    /// The bit length announced to the device and used for the block count.
    pub fn calculation_bits(&self) -> u16 {
        self.manual_bits.unwrap_or(self.bits)
    }
}
