//! MKS SERVO42C UART client
//!
//! Blocking request/response client for the SERVO42C closed-loop stepper
//! driver:
//!
//! - [`transport`]: one exchange on the link, with resynchronization,
//!   inactivity timeout and bounded retries
//! - [`servo`]: typed device operations built on the transport
//!
//! The client is generic over the link ([`servo42c_hal::Uart`]) and the
//! time source ([`servo42c_hal::Clock`]), so the same code runs on a
//! microcontroller UART and on a host serial port.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to the other modules
#[macro_use]
mod fmt;

pub mod error;
pub mod servo;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_util;

pub use error::{ApplyError, Error, SetupStep, TransportError};
pub use servo::{MoveStatus, Servo42c};
pub use transport::{uart_config, Transport, TransportSettings};
