//! `embedded-io` adapter
//!
//! Wraps any blocking port that implements `embedded_io::{Read, Write,
//! ReadReady}` (most HAL UART drivers and host serial crates do) so it can
//! be handed to the transport.

use embedded_io::{Read, ReadReady, Write};

use crate::uart::{UartRx, UartTx};

/// UART built on an `embedded-io` byte stream
#[derive(Debug)]
pub struct IoUart<T> {
    inner: T,
}

impl<T> IoUart<T> {
    /// Wrap a port
    pub const fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Borrow the wrapped port
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Consume the adapter and return the port
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Write> UartTx for IoUart<T> {
    type Error = T::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.inner.write_all(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.flush()
    }
}

impl<T: Read + ReadReady> UartRx for IoUart<T> {
    type Error = T::Error;

    fn try_read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        if !self.inner.read_ready()? {
            return Ok(None);
        }
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_io::ErrorType;

    #[derive(Default)]
    struct Loopback {
        buf: std::vec::Vec<u8>,
        flushed: bool,
    }

    impl ErrorType for Loopback {
        type Error = Infallible;
    }

    impl Write for Loopback {
        fn write(&mut self, data: &[u8]) -> Result<usize, Infallible> {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> Result<(), Infallible> {
            self.flushed = true;
            Ok(())
        }
    }

    impl Read for Loopback {
        fn read(&mut self, out: &mut [u8]) -> Result<usize, Infallible> {
            if self.buf.is_empty() || out.is_empty() {
                return Ok(0);
            }
            out[0] = self.buf.remove(0);
            Ok(1)
        }
    }

    impl ReadReady for Loopback {
        fn read_ready(&mut self) -> Result<bool, Infallible> {
            Ok(!self.buf.is_empty())
        }
    }

    #[test]
    fn test_loopback_bytes() {
        let mut uart = IoUart::new(Loopback::default());
        uart.write_blocking(&[0xE0, 0x3D, 0x1D]).unwrap();
        uart.flush().unwrap();
        assert!(uart.inner().flushed);

        assert_eq!(uart.try_read_byte(), Ok(Some(0xE0)));
        uart.discard_input().unwrap();
        assert_eq!(uart.try_read_byte(), Ok(None));
    }
}
