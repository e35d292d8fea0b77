//! Human-readable renderings of message and encoded buffers.
//!
//! Both renderers implement [`core::fmt::Display`], so they work with any
//! `core::fmt::Write` sink without allocating.

use core::fmt;

const GROUP_LEN: usize = 4;
const LINE_LEN: usize = 16;

/// Uppercase hex, grouped by 4 bytes, 16 bytes per line.
///
/// Every line ends with a newline, including a trailing partial one.
/// An empty slice renders as nothing.
///
/// ```rust
/// use ldpc_offload::dump::HexDump;
///
/// let rendered = format!("{}", HexDump(&[0xde, 0xad, 0xc0, 0xde, 0x01]));
/// assert_eq!(rendered, "DEADC0DE 01\n");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            write!(f, "{:02X}", byte)?;
            let count = i + 1;
            if count % LINE_LEN == 0 {
                f.write_str("\n")?;
            } else if count % GROUP_LEN == 0 {
                f.write_str(" ")?;
            }
        }
        if self.0.len() % LINE_LEN != 0 {
            f.write_str("\n")?;
        }
        Ok(())
    }
}

/// Printable ASCII on one line; anything else is shown as `.`.
#[derive(Debug, Clone, Copy)]
pub struct AsciiDump<'a>(pub &'a [u8]);

impl fmt::Display for AsciiDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.0 {
            let c = if (32..=126).contains(&byte) {
                byte as char
            } else {
                '.'
            };
            write!(f, "{}", c)?;
        }
        f.write_str("\n")
    }
}
