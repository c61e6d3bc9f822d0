//! Servo42c Hardware Abstraction Layer
//!
//! This crate defines the two pieces of hardware the protocol client needs:
//! a byte-serial link to the driver board and a monotonic clock to time
//! receive windows. Platform crates (or the optional adapters below) provide
//! the implementations, so the transport above can be tested on the host
//! with scripted links and simulated time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  servo42c-driver (transport + commands) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  servo42c-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┼───────────┐
//!         ▼           ▼           ▼
//!  ┌────────────┐ ┌────────┐ ┌──────────────┐
//!  │ embedded-io│ │  std   │ │ embassy-time │
//!  └────────────┘ └────────┘ └──────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication
//! - [`clock::Clock`] - Millisecond timestamps plus cooperative delays

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod uart;

#[cfg(feature = "embedded-io")]
pub mod io;

// Re-export key traits at crate root for convenience
pub use clock::Clock;
pub use uart::{Uart, UartConfig, UartRx, UartTx};
