//! Request/response transport
//!
//! One call to [`Transport::send`] owns the link from the write until a
//! reply is assembled or every attempt has timed out:
//!
//! ```text
//! Idle ──discard, write, flush──▶ Receiving ──frame complete──▶ Success
//!  ▲                                 │
//!  │                                 │ inactivity > timeout,
//!  └──────── attempts left ◀─────────┘ link error
//! ```
//!
//! Nothing is carried from one call to the next. Stale input is dropped
//! before each write so a late reply to an earlier request can never be
//! taken for the current one.

use servo42c_core::LinkConfig;
use servo42c_hal::{Clock, Uart, UartConfig, UartTx};
use servo42c_protocol::{AssemblerEvent, Frame, FrameAssembler, Response};

use crate::error::TransportError;

/// Error type of the link behind a transport
pub type LinkError<U> = <U as UartTx>::Error;

/// Timing and retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportSettings {
    /// Inactivity timeout per attempt in ms
    pub timeout_ms: u32,
    /// Total attempts per request
    pub max_attempts: u8,
    /// Delay between polls of an empty receive buffer in µs
    pub poll_interval_us: u32,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 3000,
            max_attempts: 3,
            poll_interval_us: 500,
        }
    }
}

impl From<&LinkConfig> for TransportSettings {
    fn from(config: &LinkConfig) -> Self {
        Self {
            timeout_ms: config.timeout_ms,
            max_attempts: config.max_attempts,
            poll_interval_us: config.poll_interval_us,
        }
    }
}

impl TransportSettings {
    /// Longest a single [`Transport::send`] can block without link
    /// activity, in ms
    pub fn worst_case_ms(&self) -> u64 {
        self.max_attempts.max(1) as u64 * self.timeout_ms as u64
    }
}

/// UART setup matching `config`: the driver's 8N1 framing at the
/// configured baud rate
pub fn uart_config(config: &LinkConfig) -> UartConfig {
    UartConfig::SERVO42C.with_baudrate(config.baudrate)
}

/// Exclusive owner of the link to one driver address
pub struct Transport<U, C> {
    uart: U,
    clock: C,
    address: u8,
    settings: TransportSettings,
}

impl<U: Uart, C: Clock> Transport<U, C> {
    pub fn new(uart: U, clock: C, address: u8, settings: TransportSettings) -> Self {
        Self {
            uart,
            clock,
            address,
            settings,
        }
    }

    /// Address replies are expected from
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Address used for all following frames
    pub fn set_address(&mut self, address: u8) {
        self.address = address;
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: TransportSettings) {
        self.settings = settings;
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Give back the link and the clock
    pub fn release(self) -> (U, C) {
        (self.uart, self.clock)
    }

    /// Send `frame` and wait for a reply of `expected_len` bytes
    ///
    /// Timeouts and link errors are retried up to `max_attempts` times in
    /// total, resending the frame each time.
    pub fn send(
        &mut self,
        frame: &Frame,
        expected_len: u8,
    ) -> Result<Response, TransportError<LinkError<U>>> {
        let attempts = self.settings.max_attempts.max(1);
        let mut last = TransportError::NoResponse { attempts };

        for attempt in 1..=attempts {
            match self.attempt(frame, expected_len) {
                Ok(response) => return Ok(response),
                Err(TransportError::InvalidLength(len)) => {
                    return Err(TransportError::InvalidLength(len))
                }
                Err(TransportError::Link(e)) => {
                    warn!("link error on attempt {=u8}/{=u8}", attempt, attempts);
                    last = TransportError::Link(e);
                }
                Err(TransportError::NoResponse { .. }) => {
                    warn!(
                        "no reply from {=u8:X} on attempt {=u8}/{=u8}",
                        self.address,
                        attempt,
                        attempts
                    );
                    last = TransportError::NoResponse { attempts };
                }
            }
        }

        warn!("giving up on {} after {=u8} attempts", frame, attempts);
        Err(last)
    }

    fn attempt(
        &mut self,
        frame: &Frame,
        expected_len: u8,
    ) -> Result<Response, TransportError<LinkError<U>>> {
        self.uart.discard_input().map_err(TransportError::Link)?;
        self.uart
            .write_blocking(frame.as_bytes())
            .map_err(TransportError::Link)?;
        self.uart.flush().map_err(TransportError::Link)?;
        trace!("sent {}", frame);

        self.receive(expected_len, self.settings.timeout_ms)
    }

    /// Single receive attempt without writing anything
    ///
    /// Bytes are fed to a fresh assembler until a valid reply completes.
    /// Only bytes that belong to a frame (the anchoring address and what
    /// follows it) restart the inactivity timer, so a stream of noise
    /// still times out. A checksum mismatch drops the collected bytes and
    /// keeps listening within the same attempt.
    pub fn receive(
        &mut self,
        expected_len: u8,
        timeout_ms: u32,
    ) -> Result<Response, TransportError<LinkError<U>>> {
        let mut assembler = FrameAssembler::new(self.address, expected_len)
            .map_err(|_| TransportError::InvalidLength(expected_len))?;
        let mut last_activity = self.clock.now_ms();

        loop {
            match self.uart.try_read_byte().map_err(TransportError::Link)? {
                Some(byte) => match assembler.push(byte) {
                    AssemblerEvent::Complete(response) => {
                        trace!("received {}", response);
                        return Ok(response);
                    }
                    AssemblerEvent::Accepted => last_activity = self.clock.now_ms(),
                    AssemblerEvent::ChecksumMismatch => {
                        warn!("checksum mismatch from {=u8:X}, resynchronizing", self.address);
                        last_activity = self.clock.now_ms();
                    }
                    AssemblerEvent::Discarded => {}
                },
                None => self.clock.delay_us(self.settings.poll_interval_us),
            }

            if self.clock.elapsed_ms(last_activity) > timeout_ms as u64 {
                return Err(TransportError::NoResponse { attempts: 1 });
            }
        }
    }
}
