//! UART serial communication abstractions
//!
//! The SERVO42C talks over a half-duplex UART with no framing beyond the
//! protocol's own address and checksum bytes. The transport writes a whole
//! request, then polls for reply bytes one at a time.

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the UART
    ///
    /// Blocks until all data has been handed to the peripheral or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Wait until everything written has left the transmitter
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
///
/// Reads are polled: the caller owns the timing and yields between polls.
pub trait UartRx {
    /// Error type for receive operations
    type Error;

    /// Read one byte if one is buffered
    ///
    /// Returns `Ok(None)` when nothing is available yet. Must not block.
    fn try_read_byte(&mut self) -> Result<Option<u8>, Self::Error>;

    /// Drop any stale bytes sitting in the receive buffer
    fn discard_input(&mut self) -> Result<(), Self::Error> {
        while self.try_read_byte()?.is_some() {}
        Ok(())
    }
}

/// Combined UART interface
///
/// For UARTs that provide both TX and RX on a single peripheral with a
/// shared error type.
pub trait Uart: UartTx + UartRx<Error = <Self as UartTx>::Error> {}

// Blanket implementation
impl<T: UartTx + UartRx<Error = <T as UartTx>::Error>> Uart for T {}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl UartConfig {
    /// Link settings the SERVO42C menu calls "UART 38400"
    pub const SERVO42C: Self = Self {
        baudrate: 38_400,
        data_bits: DataBits::Eight,
        parity: Parity::None,
        stop_bits: StopBits::One,
    };

    /// Same framing at another baud rate
    pub const fn with_baudrate(self, baudrate: u32) -> Self {
        Self { baudrate, ..self }
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::SERVO42C
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
    Nine,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Buffered {
        rx: [u8; 4],
        pos: usize,
    }

    impl UartRx for Buffered {
        type Error = ();

        fn try_read_byte(&mut self) -> Result<Option<u8>, ()> {
            let byte = self.rx.get(self.pos).copied();
            if byte.is_some() {
                self.pos += 1;
            }
            Ok(byte)
        }
    }

    #[test]
    fn test_default_is_38400_8n1() {
        let config = UartConfig::default();
        assert_eq!(config.baudrate, 38_400);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
    }

    #[test]
    fn test_default_discard_drains_buffer() {
        let mut rx = Buffered {
            rx: [1, 2, 3, 4],
            pos: 1,
        };
        rx.discard_input().unwrap();
        assert_eq!(rx.try_read_byte(), Ok(None));
    }
}
