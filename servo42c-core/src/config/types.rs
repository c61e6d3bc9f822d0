//! Configuration type definitions
//!
//! `ServoConfig` is what gets pushed to the driver at setup,
//! `LinkConfig` is how the host talks to it.

use core::fmt;

use servo42c_protocol::{Command, MAX_ADDRESS_INDEX};

use crate::settings::{BaudRate, EnablePinMode, MAX_CURRENT_MA, MAX_TORQUE};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// TOML text could not be parsed into the config types
    Toml,
    /// A value is outside what the device accepts
    OutOfRange { field: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Toml => write!(f, "invalid TOML configuration"),
            ConfigError::OutOfRange { field } => write!(f, "{field} is out of range"),
        }
    }
}

/// Device setup values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ServoConfig {
    /// Slave address index (0-9), wire address is 0xE0 + index
    pub address: u8,
    /// Microsteps per full step
    pub microsteps: u8,
    /// Subdivision interpolation
    pub interpolation: bool,
    /// Maximum phase current in mA
    pub max_current_ma: u16,
    /// Maximum torque (0-1200)
    pub max_torque: u16,
    /// EN pin behaviour
    pub enable_mode: EnablePinMode,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            address: 0,
            microsteps: 128,
            interpolation: true,
            max_current_ma: 800,
            max_torque: 40,
            enable_mode: EnablePinMode::ActiveLow,
        }
    }
}

impl ServoConfig {
    /// Check every value against the device limits
    ///
    /// The driver clamps silently; this is for catching typos in config
    /// files before they turn into a different setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let address_ok = match Command::SetSlaveAddress.spec().limits {
            Some(limits) => limits.contains(self.address as u32),
            None => self.address <= MAX_ADDRESS_INDEX,
        };
        if !address_ok {
            return Err(ConfigError::OutOfRange { field: "address" });
        }
        if self.max_current_ma > MAX_CURRENT_MA {
            return Err(ConfigError::OutOfRange {
                field: "max_current_ma",
            });
        }
        if self.max_torque > MAX_TORQUE {
            return Err(ConfigError::OutOfRange {
                field: "max_torque",
            });
        }
        if self.microsteps == 0 {
            return Err(ConfigError::OutOfRange {
                field: "microsteps",
            });
        }
        Ok(())
    }

    /// Wire address for the configured index
    pub fn wire_address(&self) -> u8 {
        servo42c_protocol::address_for_index(self.address)
    }
}

/// Link and retry timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConfig {
    /// UART baud rate, one of the rates the driver menu offers
    pub baudrate: u32,
    /// Inactivity timeout per attempt in ms
    pub timeout_ms: u32,
    /// Total attempts per request (not re-tries)
    pub max_attempts: u8,
    /// Delay between polls of an empty receive buffer in µs
    pub poll_interval_us: u32,
    /// Status poll period while waiting for a move to finish in ms
    pub motion_poll_ms: u32,
    /// Move wait budget per step in ms
    pub motion_ms_per_step: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baudrate: 38_400,
            timeout_ms: 3000,
            max_attempts: 3,
            poll_interval_us: 500,
            motion_poll_ms: 10,
            motion_ms_per_step: 100,
        }
    }
}

impl LinkConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if BaudRate::from_bits_per_second(self.baudrate).is_none() {
            return Err(ConfigError::OutOfRange { field: "baudrate" });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "timeout_ms",
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_attempts",
            });
        }
        if self.motion_poll_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "motion_poll_ms",
            });
        }
        Ok(())
    }

    /// Worst-case time one request can block, in ms
    pub fn worst_case_ms(&self) -> u64 {
        self.max_attempts as u64 * self.timeout_ms as u64
    }
}

/// Complete configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Servo42cConfig {
    pub servo: ServoConfig,
    pub link: LinkConfig,
}

impl Servo42cConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.servo.validate()?;
        self.link.validate()
    }
}
