//! Board-agnostic settings for the SERVO42C client
//!
//! This crate holds everything about the driver that is not wire format
//! and not I/O:
//!
//! - Typed device settings (direction, speed, modes, current) and the
//!   clamping rules that turn them into wire values
//! - Configuration type definitions with the defaults the driver is
//!   usually brought up with, optionally loaded from TOML

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod settings;

pub use config::{ConfigError, LinkConfig, Servo42cConfig, ServoConfig};
pub use settings::{
    BaudRate, Direction, EnablePinMode, MotorType, SaveState, Speed, WorkMode, ZeroMode,
};
