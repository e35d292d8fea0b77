//! Byte-level link to the encoder device.
//!
//! The offload driver only needs three primitives from the link: write one
//! byte, ask how many bytes are waiting, and read one byte. [`Link`] captures
//! exactly that, in the `nb` style used by `embedded-hal-nb`.
//!
//! [`SerialLink`] adapts any `embedded-hal-nb` UART. UART drivers generally
//! cannot report how many bytes are pending, so it drains the UART into a
//! small look-ahead queue and reports the queue length instead.

use embedded_hal_nb::serial::{ErrorType, Read, Write};
use heapless::Deque;

use crate::consts::PARAMS_LEN;

/// A full-duplex, byte-oriented link.
pub trait Link {
    /// Error reported by the underlying transport.
    type Error: core::fmt::Debug;

    /// Queues one byte for transmission.
    fn write(&mut self, byte: u8) -> nb::Result<(), Self::Error>;

    /// Number of received bytes that can be read without blocking.
    fn bytes_available(&mut self) -> usize;

    /// Takes one received byte, or `WouldBlock` if none is waiting.
    fn read(&mut self) -> nb::Result<u8, Self::Error>;
}

impl<T: Link + ?Sized> Link for &mut T {
    type Error = T::Error;

    fn write(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        (**self).write(byte)
    }

    fn bytes_available(&mut self) -> usize {
        (**self).bytes_available()
    }

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        (**self).read()
    }
}

/// Default look-ahead depth of a [`SerialLink`].
pub const SERIAL_LOOKAHEAD: usize = 64;

/// [`Link`] over an `embedded-hal-nb` serial port.
///
/// `N` bounds how many received bytes are buffered ahead of the reader, and
/// so the largest count [`bytes_available`](Link::bytes_available) can report.
/// It must be at least 4 for the parameter reply to ever be seen as complete,
/// and a smaller `N` is rejected at compile time:
///
/// ```rust,compile_fail
/// use embedded_hal_mock::eh1::serial::Mock;
/// use ldpc_offload::link::SerialLink;
///
/// let link: SerialLink<_, 2> = SerialLink::new(Mock::<u8>::new(&[]));
/// ```
#[derive(Debug)]
pub struct SerialLink<S, const N: usize = SERIAL_LOOKAHEAD> {
    serial: S,
    pending: Deque<u8, N>,
}

impl<S, const N: usize> SerialLink<S, N>
where
    S: Read<u8> + Write<u8>,
{
    /// Wraps a serial port.
    pub fn new(serial: S) -> Self {
        const { assert!(N >= PARAMS_LEN, "look-ahead must hold the 4-byte parameter reply") };
        Self {
            serial,
            pending: Deque::new(),
        }
    }

    /// Returns the serial port. Bytes still in the look-ahead queue are lost.
    pub fn release(self) -> S {
        self.serial
    }

    /// Moves every byte the UART has ready into the look-ahead queue.
    fn fill(&mut self) -> Result<(), <S as ErrorType>::Error> {
        while !self.pending.is_full() {
            match self.serial.read() {
                Ok(byte) => {
                    let _ = self.pending.push_back(byte);
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(e)) => return Err(e),
            }
        }
        Ok(())
    }
}

impl<S, const N: usize> Link for SerialLink<S, N>
where
    S: Read<u8> + Write<u8>,
{
    type Error = <S as ErrorType>::Error;

    fn write(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        self.serial.write(byte)
    }

    fn bytes_available(&mut self) -> usize {
        if self.fill().is_err() {
            warn!("serial read error while polling");
        }
        self.pending.len()
    }

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        match self.pending.pop_front() {
            Some(byte) => Ok(byte),
            None => self.serial.read(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::serial::{Mock as SerialMock, Transaction as SerialTransaction};

    #[test]
    fn test_available_counts_drained_bytes() {
        let serial = SerialMock::new(&[
            SerialTransaction::read(0xde),
            SerialTransaction::read(0xad),
            SerialTransaction::read_error(nb::Error::WouldBlock),
        ]);
        let mut link: SerialLink<_> = SerialLink::new(serial);

        assert_eq!(link.bytes_available(), 2);
        assert_eq!(link.read(), Ok(0xde));
        assert_eq!(link.read(), Ok(0xad));
        link.release().done();
    }

    #[test]
    fn test_lookahead_is_bounded() {
        let serial = SerialMock::new(&[
            SerialTransaction::read(1),
            SerialTransaction::read(2),
            SerialTransaction::read(3),
            SerialTransaction::read(4),
            SerialTransaction::read(5),
            SerialTransaction::read_error(nb::Error::WouldBlock),
        ]);
        let mut link: SerialLink<_, 4> = SerialLink::new(serial);

        assert_eq!(link.bytes_available(), 4);
        for expected in 1..=4 {
            assert_eq!(link.read(), Ok(expected));
        }
        // Queue empty: reads go straight to the UART.
        assert_eq!(link.read(), Ok(5));
        assert_eq!(link.bytes_available(), 0);
        link.release().done();
    }

    #[test]
    fn test_smallest_lookahead_sees_parameter_reply() {
        let serial = SerialMock::new(&[
            SerialTransaction::read(0x00),
            SerialTransaction::read(0x08),
            SerialTransaction::read(0x00),
            SerialTransaction::read(0x10),
        ]);
        let mut link: SerialLink<_, PARAMS_LEN> = SerialLink::new(serial);

        assert_eq!(link.bytes_available(), PARAMS_LEN);
        for expected in [0x00, 0x08, 0x00, 0x10] {
            assert_eq!(link.read(), Ok(expected));
        }
        link.release().done();
    }

    #[test]
    fn test_write_passes_through() {
        let serial = SerialMock::new(&[
            SerialTransaction::write(0x00),
            SerialTransaction::write(0x08),
        ]);
        let mut link: SerialLink<_> = SerialLink::new(serial);

        assert_eq!(link.write(0x00), Ok(()));
        assert_eq!(link.write(0x08), Ok(()));
        link.release().done();
    }
}
