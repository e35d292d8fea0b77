//! Interactive menu for driving offload sessions over a text terminal.
//!
//! The [`Console`] is fed one line of user input at a time and writes its
//! replies to any [`core::fmt::Write`] sink, so the same menu runs over a USB
//! serial port, a semihosting channel, or a test `String`.
//!
//! ```text
//! LDPC Encoder Client Menu:
//! 1 - Encode text message
//! 2 - Encode hex message
//! 3 - Encode hex message with manual bit length
//! 4 - Check system status
//! 5 - Show last encoding results
//! Enter your choice (1-5):
//! ```
//!
//! Only the last *successful* session is kept for choice 5. A failed run
//! updates the status report (choice 4) but never replaces the results shown.

use core::fmt::{self, Write};

use embedded_hal::delay::DelayNs;

use crate::consts::LINK_BAUD;
use crate::driver::OffloadDriver;
use crate::dump::{AsciiDump, HexDump};
use crate::encoding::{InputMode, Message};
use crate::error::{OffloadError, Stage};
use crate::framing::Params;
use crate::link::Link;
use crate::session::{Session, SessionState};
use crate::timer::Clock;

/// A menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum MenuChoice {
    /// `1`: encode a text message.
    EncodeText,
    /// `2`: encode a hex message.
    EncodeHex,
    /// `3`: encode a hex message with a manual bit length.
    EncodeHexManual,
    /// `4`: report the state of the last session.
    Status,
    /// `5`: show the last successful results.
    ShowLast,
}

impl MenuChoice {
    /// Maps a menu key to its entry.
    pub fn parse(key: char) -> Option<Self> {
        match key {
            '1' => Some(MenuChoice::EncodeText),
            '2' => Some(MenuChoice::EncodeHex),
            '3' => Some(MenuChoice::EncodeHexManual),
            '4' => Some(MenuChoice::Status),
            '5' => Some(MenuChoice::ShowLast),
            _ => None,
        }
    }
}

/// What the console expects on its next line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Prompt {
    /// A menu key. Only the first character of the line is used.
    Choice,
    /// A manual bit length, for [`MenuChoice::EncodeHexManual`].
    ManualLength,
    /// The message to encode.
    Message {
        /// How the line is converted.
        mode: InputMode,
        /// Manual bit length entered beforehand, if any.
        manual_bits: Option<u16>,
    },
}

/// Figures from the most recent session, successful or not.
#[derive(Debug, Clone, Copy, Default)]
struct LastAttempt {
    state: SessionState,
    params: Option<Params>,
    message_bits: u16,
}

/// Line-driven front end for an [`OffloadDriver`].
#[derive(Debug)]
pub struct Console {
    prompt: Prompt,
    last_attempt: LastAttempt,
    last_success: Option<Session>,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    /// Creates a console waiting for a menu choice.
    pub fn new() -> Self {
        Self {
            prompt: Prompt::Choice,
            last_attempt: LastAttempt::default(),
            last_success: None,
        }
    }

    /// What the next line will be read as.
    pub fn prompt(&self) -> Prompt {
        self.prompt
    }

    /// The last session that completed every block.
    pub fn last_session(&self) -> Option<&Session> {
        self.last_success.as_ref()
    }

    /// Writes the start-up banner and the menu.
    pub fn start<W: Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "LDPC Encoder Client Started")?;
        writeln!(out, "==================================")?;
        writeln!(out, "Configuration:")?;
        writeln!(out, "Encoder link: {} baud", LINK_BAUD)?;
        writeln!(out)?;
        write_menu(out)
    }

    /// Handles one line of user input.
    ///
    /// Encoding runs to completion (or failure) inside this call.
    ///
    /// # Errors
    /// Only errors from `out`. Offload failures are reported on `out`.
    pub fn feed_line<L, C, D, W>(
        &mut self,
        line: &str,
        driver: &mut OffloadDriver<L, C, D>,
        out: &mut W,
    ) -> fmt::Result
    where
        L: Link,
        C: Clock,
        D: DelayNs,
        W: Write,
    {
        match self.prompt {
            Prompt::Choice => self.choose(line, out),
            Prompt::ManualLength => {
                let bits = parse_lenient_u16(line);
                writeln!(out, "Manual message length set to: {} bits", bits)?;
                self.ask_message(InputMode::HexManual, Some(bits), out)
            }
            Prompt::Message { mode, manual_bits } => {
                self.prompt = Prompt::Choice;
                self.encode(line, mode, manual_bits, driver, out)?;
                writeln!(out)?;
                write_menu(out)
            }
        }
    }

    fn choose<W: Write>(&mut self, line: &str, out: &mut W) -> fmt::Result {
        let Some(key) = line.chars().next() else {
            return Ok(());
        };
        writeln!(out)?;
        match MenuChoice::parse(key) {
            Some(MenuChoice::EncodeText) => {
                writeln!(out, "Text encoding mode selected")?;
                return self.ask_message(InputMode::Text, None, out);
            }
            Some(MenuChoice::EncodeHex) => {
                writeln!(out, "Hex encoding mode selected")?;
                return self.ask_message(InputMode::Hex, None, out);
            }
            Some(MenuChoice::EncodeHexManual) => {
                writeln!(out, "Hex encoding mode with manual bit length selected")?;
                writeln!(out, "Enter message length: ")?;
                self.prompt = Prompt::ManualLength;
                return Ok(());
            }
            Some(MenuChoice::Status) => self.write_status(out)?,
            Some(MenuChoice::ShowLast) => self.write_last_results(out)?,
            None => writeln!(out, "Invalid choice!")?,
        }
        writeln!(out)?;
        write_menu(out)
    }

    fn ask_message<W: Write>(
        &mut self,
        mode: InputMode,
        manual_bits: Option<u16>,
        out: &mut W,
    ) -> fmt::Result {
        writeln!(out, "Enter your message:")?;
        match mode {
            InputMode::Text => writeln!(out, "(Type your text message and press Enter)")?,
            InputMode::Hex | InputMode::HexManual => {
                writeln!(out, "(Enter hex bytes, e.g., 'AB CD EF 12' and press Enter)")?
            }
        }
        self.prompt = Prompt::Message { mode, manual_bits };
        Ok(())
    }

    fn encode<L, C, D, W>(
        &mut self,
        line: &str,
        mode: InputMode,
        manual_bits: Option<u16>,
        driver: &mut OffloadDriver<L, C, D>,
        out: &mut W,
    ) -> fmt::Result
    where
        L: Link,
        C: Clock,
        D: DelayNs,
        W: Write,
    {
        let message = match Message::new(mode, line, manual_bits) {
            Ok(message) => message,
            Err(_) => return writeln!(out, "No message entered!"),
        };
        writeln!(out, "Message entered: {}", line.trim())?;
        writeln!(
            out,
            "Message converted to {} bits ({} bytes)",
            message.bits(),
            message.byte_len()
        )?;
        writeln!(out, "\nStarting LDPC encoding process...")?;

        let mut session = Session::new(message);
        let result = driver.run(&mut session);
        self.last_attempt = LastAttempt {
            state: session.state(),
            params: session.params(),
            message_bits: session.message().bits(),
        };

        match result {
            Ok(summary) => {
                writeln!(out, "\nEncoding completed successfully!")?;
                writeln!(out, "=================================")?;
                writeln!(
                    out,
                    "Original message ({} bits, {} bits used for calculation):",
                    summary.message_bits, summary.calculation_bits
                )?;
                write_message(session.message(), out)?;
                writeln!(
                    out,
                    "\nEncoded data ({} bits per block, {} blocks):",
                    summary.params.n, summary.blocks
                )?;
                write!(out, "{}", HexDump(session.encoded()))?;
                self.last_success = Some(session);
                Ok(())
            }
            Err(err) => {
                writeln!(out, "{}", failure_headline(err))?;
                writeln!(out, "Error: {}", err)
            }
        }
    }

    fn write_status<W: Write>(&self, out: &mut W) -> fmt::Result {
        let last = &self.last_attempt;
        let params = last.params.unwrap_or(Params { k: 0, n: 0 });
        writeln!(out, "System Status:")?;
        writeln!(out, "Current state: {}", last.state)?;
        writeln!(out, "Last K: {}, Last N: {}", params.k, params.n)?;
        writeln!(out, "Last message bits: {}", last.message_bits)
    }

    fn write_last_results<W: Write>(&self, out: &mut W) -> fmt::Result {
        let Some(session) = &self.last_success else {
            return writeln!(out, "No encoding results available yet.");
        };
        let params = session.params().unwrap_or(Params { k: 0, n: 0 });
        writeln!(out, "Last encoding results:")?;
        writeln!(
            out,
            "K={}, N={}, Message bits={}",
            params.k,
            params.n,
            session.message().bits()
        )?;
        writeln!(out, "Original message:")?;
        write_message(session.message(), out)?;
        writeln!(out, "Encoded data:")?;
        write!(out, "{}", HexDump(session.encoded()))
    }
}

fn write_menu<W: Write>(out: &mut W) -> fmt::Result {
    writeln!(out, "LDPC Encoder Client Menu:")?;
    writeln!(out, "1 - Encode text message")?;
    writeln!(out, "2 - Encode hex message")?;
    writeln!(out, "3 - Encode hex message with manual bit length")?;
    writeln!(out, "4 - Check system status")?;
    writeln!(out, "5 - Show last encoding results")?;
    writeln!(out, "Enter your choice (1-5): ")
}

/// Text input is shown as ASCII, hex input as hex.
fn write_message<W: Write>(message: &Message, out: &mut W) -> fmt::Result {
    if message.mode().is_hex() {
        write!(out, "{}", HexDump(message.bytes()))
    } else {
        write!(out, "{}", AsciiDump(message.bytes()))
    }
}

fn failure_headline(err: OffloadError) -> &'static str {
    match err {
        OffloadError::EmptyInput => "No message entered!",
        OffloadError::TagTimeout => "Failed to receive tag from microcontroller!",
        OffloadError::WriteFailure {
            stage: Stage::Length,
        } => "Failed to send message length!",
        OffloadError::ParamTimeout
        | OffloadError::InvalidParameters { .. }
        | OffloadError::NotNegotiated
        | OffloadError::CapacityExceeded { .. } => "Failed to receive LDPC parameters!",
        OffloadError::BlockTimeout { .. }
        | OffloadError::WriteFailure {
            stage: Stage::Payload,
        } => "Failed to send message data!",
    }
}

/// Parses a decimal number the forgiving way a serial monitor user expects.
///
/// Leading whitespace and an optional sign are accepted, and parsing stops at
/// the first non-digit. Anything unparsable is `0`. The result wraps to 16 bits.
pub fn parse_lenient_u16(line: &str) -> u16 {
    let line = line.trim_start();
    match line.as_bytes().first() {
        Some(b'-') => digits_value(&line[1..]).wrapping_neg(),
        Some(b'+') => digits_value(&line[1..]),
        _ => digits_value(line),
    }
}

fn digits_value(digits: &str) -> u16 {
    digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u16, |acc, d| {
            acc.wrapping_mul(10).wrapping_add((d - b'0') as u16)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeLink, SimClock, SimDelay};

    const TAG: [u8; 4] = [0xde, 0xad, 0xc0, 0xde];

    fn driver(link: FakeLink) -> OffloadDriver<FakeLink, SimClock, SimDelay> {
        let (clock, delay) = link.sim();
        OffloadDriver::new(link, clock, delay)
    }

    /// Device that encodes one hex byte with K=4, N=7.
    fn k4_n7_link() -> FakeLink {
        let mut link = FakeLink::new();
        link.queue(&TAG);
        link.respond_after(2, 0, &[0x00, 0x04, 0x00, 0x07]);
        link.respond_after(3, 0, &[0x5a]);
        link.respond_after(4, 0, &[0xc3]);
        link
    }

    fn feed(
        console: &mut Console,
        driver: &mut OffloadDriver<FakeLink, SimClock, SimDelay>,
        line: &str,
    ) -> String {
        let mut out = String::new();
        console.feed_line(line, driver, &mut out).unwrap();
        out
    }

    #[test]
    fn test_menu_choice_parse() {
        assert_eq!(MenuChoice::parse('1'), Some(MenuChoice::EncodeText));
        assert_eq!(MenuChoice::parse('3'), Some(MenuChoice::EncodeHexManual));
        assert_eq!(MenuChoice::parse('5'), Some(MenuChoice::ShowLast));
        assert_eq!(MenuChoice::parse('6'), None);
        assert_eq!(MenuChoice::parse('x'), None);
    }

    #[test]
    fn test_start_prints_banner_and_menu() {
        let mut out = String::new();
        Console::new().start(&mut out).unwrap();
        assert!(out.starts_with("LDPC Encoder Client Started\n"));
        assert!(out.contains("Encoder link: 115200 baud\n"));
        assert!(out.ends_with("Enter your choice (1-5): \n"));
    }

    #[test]
    fn test_invalid_choice_reprints_menu() {
        let mut console = Console::new();
        let mut driver = driver(FakeLink::new());
        let out = feed(&mut console, &mut driver, "9");
        assert!(out.contains("Invalid choice!\n"));
        assert!(out.ends_with("Enter your choice (1-5): \n"));
        assert_eq!(console.prompt(), Prompt::Choice);
    }

    #[test]
    fn test_empty_line_at_menu_is_ignored() {
        let mut console = Console::new();
        let mut driver = driver(FakeLink::new());
        assert_eq!(feed(&mut console, &mut driver, ""), "");
    }

    #[test]
    fn test_hex_encode_and_show_last() {
        let mut console = Console::new();
        let mut driver = driver(k4_n7_link());

        let out = feed(&mut console, &mut driver, "2");
        assert!(out.contains("Hex encoding mode selected\n"));
        assert_eq!(
            console.prompt(),
            Prompt::Message {
                mode: InputMode::Hex,
                manual_bits: None
            }
        );

        let out = feed(&mut console, &mut driver, "ab");
        assert!(out.contains("Message entered: ab\n"));
        assert!(out.contains("Message converted to 8 bits (1 bytes)\n"));
        assert!(out.contains("Encoding completed successfully!\n"));
        assert!(out.contains("Original message (8 bits, 8 bits used for calculation):\nAB\n"));
        assert!(out.contains("Encoded data (7 bits per block, 2 blocks):\n5AC3\n"));
        assert_eq!(console.prompt(), Prompt::Choice);

        let out = feed(&mut console, &mut driver, "5");
        assert!(out.contains("K=4, N=7, Message bits=8\n"));
        assert!(out.contains("Original message:\nAB\nEncoded data:\n5AC3\n"));
    }

    #[test]
    fn test_text_message_shown_as_ascii() {
        let mut link = FakeLink::new();
        link.queue(&TAG);
        link.respond_after(2, 0, &[0x00, 0x10, 0x00, 0x20]);
        link.respond_after(4, 0, &[1, 2, 3, 4]);
        let mut console = Console::new();
        let mut driver = driver(link);

        let _ = feed(&mut console, &mut driver, "1");
        let out = feed(&mut console, &mut driver, "  Hi  ");
        assert!(out.contains("Message entered: Hi\n"));
        assert!(out.contains("(16 bits, 16 bits used for calculation):\nHi\n"));
        assert!(out.contains("01020304 \n"));
    }

    #[test]
    fn test_manual_length_flow() {
        let mut link = FakeLink::new();
        link.queue(&TAG);
        link.respond_after(2, 0, &[0x00, 0x08, 0x00, 0x10]);
        link.respond_after(3, 0, &[0xaa, 0xbb]);
        link.respond_after(4, 0, &[0xcc, 0xdd]);
        let mut console = Console::new();
        let mut driver = driver(link);

        let out = feed(&mut console, &mut driver, "3");
        assert!(out.contains("Enter message length: \n"));
        assert_eq!(console.prompt(), Prompt::ManualLength);

        let out = feed(&mut console, &mut driver, "16");
        assert!(out.contains("Manual message length set to: 16 bits\n"));
        assert_eq!(
            console.prompt(),
            Prompt::Message {
                mode: InputMode::HexManual,
                manual_bits: Some(16)
            }
        );

        let out = feed(&mut console, &mut driver, "01");
        assert!(out.contains("(8 bits, 16 bits used for calculation)"));
        assert_eq!(driver.link.written(), &[0x00, 0x10, 0x01, 0x00]);
        assert!(out.contains("AABBCCDD \n"));
    }

    #[test]
    fn test_blank_message_is_rejected() {
        let mut console = Console::new();
        let mut driver = driver(FakeLink::new());
        let _ = feed(&mut console, &mut driver, "2");
        let out = feed(&mut console, &mut driver, "   ");
        assert!(out.starts_with("No message entered!\n"));
        assert!(out.ends_with("Enter your choice (1-5): \n"));
        assert!(driver.link.written().is_empty());
    }

    #[test]
    fn test_failed_run_keeps_previous_results() {
        let mut console = Console::new();
        let mut driver = driver(k4_n7_link());
        let _ = feed(&mut console, &mut driver, "2");
        let _ = feed(&mut console, &mut driver, "AB");
        assert!(console.last_session().is_some());

        // No tag this time.
        let _ = feed(&mut console, &mut driver, "1");
        let out = feed(&mut console, &mut driver, "lost");
        assert!(out.contains("Failed to receive tag from microcontroller!\n"));
        assert!(out.contains("Error: timeout waiting for the encoder tag\n"));

        let out = feed(&mut console, &mut driver, "4");
        assert!(out.contains("Current state: failed: timeout waiting for the encoder tag\n"));
        assert!(out.contains("Last K: 0, Last N: 0\n"));
        assert!(out.contains("Last message bits: 32\n"));

        let out = feed(&mut console, &mut driver, "5");
        assert!(out.contains("K=4, N=7, Message bits=8\n"));
        assert!(out.contains("5AC3\n"));
    }

    #[test]
    fn test_show_last_before_any_run() {
        let mut console = Console::new();
        let mut driver = driver(FakeLink::new());
        let out = feed(&mut console, &mut driver, "5");
        assert!(out.contains("No encoding results available yet.\n"));

        let out = feed(&mut console, &mut driver, "4");
        assert!(out.contains("Current state: idle\n"));
    }

    #[test]
    fn test_parse_lenient_u16() {
        assert_eq!(parse_lenient_u16("16"), 16);
        assert_eq!(parse_lenient_u16("  256 bits"), 256);
        assert_eq!(parse_lenient_u16("+12"), 12);
        assert_eq!(parse_lenient_u16("abc"), 0);
        assert_eq!(parse_lenient_u16(""), 0);
        assert_eq!(parse_lenient_u16("-1"), u16::MAX);
        assert_eq!(parse_lenient_u16("65537"), 1);
    }
}
