//! Typed device settings
//!
//! Each setting knows its wire value. Out-of-range inputs are clamped the
//! way the device documentation bounds them rather than rejected, so a
//! caller asking for 5 A gets the 3 A maximum.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest current the driver accepts, in mA
pub const MAX_CURRENT_MA: u16 = 3000;

/// Current resolution of the driver, in mA
pub const CURRENT_STEP_MA: u16 = 200;

/// Highest torque limit value (unit is device-defined)
pub const MAX_TORQUE: u16 = 1200;

/// Motor rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Direction {
    /// Forward
    #[default]
    Clockwise,
    /// Reverse
    CounterClockwise,
}

impl Direction {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }

    /// 0 = forward, 1 = reverse
    pub const fn to_wire(self) -> u8 {
        match self {
            Direction::Clockwise => 0,
            Direction::CounterClockwise => 1,
        }
    }

    /// Pack direction (bit 7) and speed (bits 0-6) into one byte
    pub const fn with_speed(self, speed: Speed) -> u8 {
        let dir_bit = match self {
            Direction::Clockwise => 0x00,
            Direction::CounterClockwise => 0x80,
        };
        dir_bit | speed.get()
    }
}

/// Motion speed, 0-127
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Speed(u8);

impl Speed {
    pub const MAX: Speed = Speed(127);

    /// Clamp into 0-127
    pub const fn new(value: u8) -> Self {
        if value > Self::MAX.0 {
            Self::MAX
        } else {
            Self(value)
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl From<u8> for Speed {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

/// Step angle of the attached motor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum MotorType {
    /// 0.9° per full step
    Deg0_9,
    /// 1.8° per full step (the common case)
    #[default]
    Deg1_8,
}

impl MotorType {
    pub const fn to_wire(self) -> u8 {
        match self {
            MotorType::Deg0_9 => 0,
            MotorType::Deg1_8 => 1,
        }
    }
}

/// Driver work mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum WorkMode {
    /// CR_OPEN: open loop, step/dir input
    Open,
    /// CR_vFOC: closed loop, step/dir input
    Vfoc,
    /// CR_UART: commands over this serial link
    #[default]
    Uart,
}

impl WorkMode {
    pub const fn to_wire(self) -> u8 {
        match self {
            WorkMode::Open => 0,
            WorkMode::Vfoc => 1,
            WorkMode::Uart => 2,
        }
    }
}

/// Behaviour of the EN pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum EnablePinMode {
    /// Pin low = motor enabled
    #[default]
    ActiveLow,
    /// Pin high = motor enabled
    ActiveHigh,
    /// Motor always enabled, pin ignored
    AlwaysOn,
}

impl EnablePinMode {
    pub const fn to_wire(self) -> u8 {
        match self {
            EnablePinMode::ActiveLow => 0,
            EnablePinMode::ActiveHigh => 1,
            EnablePinMode::AlwaysOn => 2,
        }
    }
}

/// UART baud rate selectable on the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum BaudRate {
    B9600,
    B19200,
    B25000,
    #[default]
    B38400,
    B57600,
    B115200,
}

impl BaudRate {
    /// Wire code 1-6
    pub const fn to_wire(self) -> u8 {
        match self {
            BaudRate::B9600 => 1,
            BaudRate::B19200 => 2,
            BaudRate::B25000 => 3,
            BaudRate::B38400 => 4,
            BaudRate::B57600 => 5,
            BaudRate::B115200 => 6,
        }
    }

    /// Every rate the driver menu offers
    pub const ALL: [BaudRate; 6] = [
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B25000,
        BaudRate::B38400,
        BaudRate::B57600,
        BaudRate::B115200,
    ];

    /// Rate with the given bits per second, if the driver supports it
    pub fn from_bits_per_second(bps: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|rate| rate.bits_per_second() == bps)
    }

    pub const fn bits_per_second(self) -> u32 {
        match self {
            BaudRate::B9600 => 9_600,
            BaudRate::B19200 => 19_200,
            BaudRate::B25000 => 25_000,
            BaudRate::B38400 => 38_400,
            BaudRate::B57600 => 57_600,
            BaudRate::B115200 => 115_200,
        }
    }
}

/// Return-to-zero mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ZeroMode {
    #[default]
    Disabled,
    /// Return to zero in the configured direction
    DirMode,
    /// Return to zero by the shortest way
    NearMode,
}

impl ZeroMode {
    pub const fn to_wire(self) -> u8 {
        match self {
            ZeroMode::Disabled => 0,
            ZeroMode::DirMode => 1,
            ZeroMode::NearMode => 2,
        }
    }
}

/// Power-on continuous run state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SaveState {
    /// Remember the current continuous run and resume it at power-on
    Save,
    /// Forget the stored run
    Clear,
}

impl SaveState {
    pub const fn to_wire(self) -> u8 {
        match self {
            SaveState::Save => 0xC8,
            SaveState::Clear => 0xCA,
        }
    }
}

/// Wire value for a current limit: clamped to 3000 mA, in 200 mA units
///
/// Values between steps round down.
pub const fn current_to_wire(current_ma: u16) -> u8 {
    let clamped = if current_ma > MAX_CURRENT_MA {
        MAX_CURRENT_MA
    } else {
        current_ma
    };
    (clamped / CURRENT_STEP_MA) as u8
}

/// Torque limit clamped to the device maximum
pub const fn clamp_torque(torque: u16) -> u16 {
    if torque > MAX_TORQUE {
        MAX_TORQUE
    } else {
        torque
    }
}
