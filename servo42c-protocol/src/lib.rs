//! MKS SERVO42C UART Protocol
//!
//! This crate defines the command/response byte protocol spoken by the
//! SERVO42C closed-loop stepper driver in `CR_UART` work mode. Every
//! exchange is one request frame followed by one reply frame of a length
//! fixed by the command.
//!
//! # Frame Layout
//!
//! ```text
//! request:  ┌─────────┬─────────┬──────────────┬──────────┐
//!           │ ADDRESS │ COMMAND │ PAYLOAD      │ CHECKSUM │
//!           │ 1B      │ 1B      │ 0, 1, 2, 5B  │ 1B       │
//!           └─────────┴─────────┴──────────────┴──────────┘
//! reply:    ┌─────────┬──────────────────────────┬──────────┐
//!           │ ADDRESS │ STATUS or VALUE          │ CHECKSUM │
//!           │ 1B      │ 1, 2, 4 or 6B            │ 1B       │
//!           └─────────┴──────────────────────────┴──────────┘
//! ```
//!
//! The checksum is the low byte of the sum of all preceding bytes.
//! Multi-byte values are big-endian. There is no start-of-frame marker:
//! the receiver synchronizes on the address byte (see [`assembler`]).

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod assembler;
pub mod checksum;
pub mod command;
pub mod frame;

pub use assembler::{AssemblerEvent, FrameAssembler};
pub use checksum::checksum;
pub use command::{Command, CommandSpec, PayloadKind, StatusOutcome, StatusSemantics};
pub use frame::{EncoderPosition, Frame, FrameError, Payload, Response, MAX_FRAME_SIZE};

/// Wire address of the driver with slave index 0
pub const BASE_ADDRESS: u8 = 0xE0;

/// Highest slave index selectable on the driver (0-9)
pub const MAX_ADDRESS_INDEX: u8 = 9;

/// Wire address for a slave index, clamped to the valid 0-9 range
pub const fn address_for_index(index: u8) -> u8 {
    let index = if index > MAX_ADDRESS_INDEX {
        MAX_ADDRESS_INDEX
    } else {
        index
    };
    BASE_ADDRESS + index
}
