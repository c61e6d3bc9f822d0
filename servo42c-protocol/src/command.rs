//! Command table
//!
//! Every SERVO42C command is one row here: opcode, request payload shape,
//! reply length, accepted value range and how to read the reply's status
//! byte. The [`Command`] enum, its [`CommandSpec`] lookup and the opcode
//! decoder are all generated from this single table, so supporting a new
//! device command means adding one row.

use crate::frame::FrameError;

/// Reply length of status-only commands
pub const STATUS_REPLY_LEN: u8 = 3;

/// Shape of a request payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadKind {
    /// `[addr, cmd, chk]`
    None,
    /// `[addr, cmd, u8, chk]`
    U8,
    /// `[addr, cmd, u16 BE, chk]`
    U16,
    /// `[addr, cmd, u8, u32 BE, chk]`
    U8U32,
}

impl PayloadKind {
    /// Number of payload bytes
    pub const fn len(self) -> usize {
        match self {
            PayloadKind::None => 0,
            PayloadKind::U8 => 1,
            PayloadKind::U16 => 2,
            PayloadKind::U8U32 => 5,
        }
    }

    /// True for commands without payload
    pub const fn is_empty(self) -> bool {
        matches!(self, PayloadKind::None)
    }

    /// Length of the complete request frame
    pub const fn frame_len(self) -> usize {
        self.len() + 3
    }
}

/// Inclusive range of accepted wire values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Limits {
    pub min: u32,
    pub max: u32,
}

impl Limits {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Clamp a value into the range
    pub const fn clamp(&self, value: u32) -> u32 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    pub const fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// How a command's reply status byte is to be read
///
/// The status byte is not a generic error code; each command assigns its
/// own meaning to 0, 1 and 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusSemantics {
    /// 1 = set success, 0 = set failed
    SetResult,
    /// 1 = calibrated, 2 = calibration failed
    Calibration,
    /// 1 = enabled, 2 = disabled
    EnableState,
    /// 1 = protected (locked), 2 = not protected
    ShaftLock,
    /// 0 = run failed, 1 = run starting, 2 = run complete
    Motion,
    /// Reply carries a value instead of a status
    Value,
}

/// Meaning of a status byte under some [`StatusSemantics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusOutcome {
    /// Success, enabled, protected, run complete
    Positive,
    /// Failure, disabled, not protected
    Negative,
    /// Motion accepted and starting
    InProgress,
    /// A status this command does not define
    Unknown(u8),
}

impl StatusSemantics {
    /// Interpret a raw status byte
    pub const fn interpret(self, status: u8) -> StatusOutcome {
        match (self, status) {
            (StatusSemantics::SetResult, 1) => StatusOutcome::Positive,
            (StatusSemantics::SetResult, 0) => StatusOutcome::Negative,
            (StatusSemantics::Calibration, 1) => StatusOutcome::Positive,
            (StatusSemantics::Calibration, 0 | 2) => StatusOutcome::Negative,
            (StatusSemantics::EnableState | StatusSemantics::ShaftLock, 1) => {
                StatusOutcome::Positive
            }
            (StatusSemantics::EnableState | StatusSemantics::ShaftLock, 2) => {
                StatusOutcome::Negative
            }
            (StatusSemantics::Motion, 0) => StatusOutcome::Negative,
            (StatusSemantics::Motion, 1) => StatusOutcome::InProgress,
            (StatusSemantics::Motion, 2) => StatusOutcome::Positive,
            (_, other) => StatusOutcome::Unknown(other),
        }
    }
}

/// Static description of one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandSpec {
    pub command: Command,
    pub payload: PayloadKind,
    /// Total reply frame length, address and checksum included
    pub response_len: u8,
    /// Accepted range of the (first) payload value, if the device documents one
    pub limits: Option<Limits>,
    pub status: StatusSemantics,
}

macro_rules! command_table {
    ($(
        $(#[$doc:meta])*
        $name:ident = $code:literal, $payload:ident, $len:literal, $limits:expr, $status:ident;
    )*) => {
        /// SERVO42C command opcodes
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[repr(u8)]
        pub enum Command {
            $( $(#[$doc])* $name = $code, )*
        }

        impl Command {
            /// Every known command, in table order
            pub const ALL: &'static [Command] = &[$(Command::$name),*];

            /// Table row for this command
            pub const fn spec(self) -> CommandSpec {
                match self {
                    $(Command::$name => CommandSpec {
                        command: Command::$name,
                        payload: PayloadKind::$payload,
                        response_len: $len,
                        limits: $limits,
                        status: StatusSemantics::$status,
                    },)*
                }
            }
        }

        impl TryFrom<u8> for Command {
            type Error = FrameError;

            fn try_from(code: u8) -> Result<Self, Self::Error> {
                match code {
                    $($code => Ok(Command::$name),)*
                    other => Err(FrameError::UnknownCommand(other)),
                }
            }
        }
    };
}

const BOOL: Option<Limits> = Some(Limits::new(0, 1));

command_table! {
    // Reads
    /// Encoder carrier and in-revolution value
    ReadEncoder = 0x30, None, 8, None, Value;
    /// Number of step pulses received
    ReadPulsesReceived = 0x33, None, 6, None, Value;
    /// Error between target and actual shaft angle
    ReadShaftAngleError = 0x39, None, 4, None, Value;
    /// State of the EN pin
    ReadEnablePin = 0x3A, None, 3, None, EnableState;
    /// Release locked-rotor protection
    ReleaseShaftLock = 0x3D, None, 3, None, SetResult;
    /// Whether locked-rotor protection has tripped
    ReadShaftLockState = 0x3E, None, 3, None, ShaftLock;
    /// Restore factory parameters
    RestoreDefaults = 0x3F, None, 3, None, SetResult;

    // Configuration writes
    /// Calibrate the encoder (motor must be unloaded)
    Calibrate = 0x80, U8, 3, None, Calibration;
    /// 0 = 0.9°, 1 = 1.8° step angle
    SetMotorType = 0x81, U8, 3, BOOL, SetResult;
    /// 0 = CR_OPEN, 1 = CR_vFOC, 2 = CR_UART
    SetWorkMode = 0x82, U8, 3, Some(Limits::new(0, 2)), SetResult;
    /// Current in 200 mA units
    SetCurrent = 0x83, U8, 3, Some(Limits::new(0, 15)), SetResult;
    /// Microsteps per full step
    SetSubdivision = 0x84, U8, 3, None, SetResult;
    /// 0 = active low, 1 = active high, 2 = always enabled
    SetEnablePinMode = 0x85, U8, 3, Some(Limits::new(0, 2)), SetResult;
    /// 0 = CW, 1 = CCW
    SetDirection = 0x86, U8, 3, BOOL, SetResult;
    SetScreenAutoOff = 0x87, U8, 3, BOOL, SetResult;
    SetShaftLockProtection = 0x88, U8, 3, BOOL, SetResult;
    SetSubdivisionInterpolation = 0x89, U8, 3, BOOL, SetResult;
    /// 1 = 9600 … 6 = 115200
    SetBaudRate = 0x8A, U8, 3, Some(Limits::new(1, 6)), SetResult;
    /// Slave index 0-9 (wire address 0xE0 + index)
    SetSlaveAddress = 0x8B, U8, 3, Some(Limits::new(0, 9)), SetResult;

    // Return-to-zero
    /// 0 = disabled, 1 = DirMode, 2 = NearMode
    SetZeroMode = 0x90, U8, 3, Some(Limits::new(0, 2)), SetResult;
    SetZeroPosition = 0x91, U8, 3, None, SetResult;
    SetZeroSpeed = 0x92, U8, 3, Some(Limits::new(0, 4)), SetResult;
    SetZeroDirection = 0x93, U8, 3, BOOL, SetResult;
    GoToZero = 0x94, U8, 3, None, SetResult;

    // Position loop
    SetPositionKp = 0xA1, U16, 3, None, SetResult;
    SetPositionKi = 0xA2, U16, 3, None, SetResult;
    SetPositionKd = 0xA3, U16, 3, None, SetResult;
    SetAcceleration = 0xA4, U16, 3, None, SetResult;
    SetMaxTorque = 0xA5, U16, 3, Some(Limits::new(0, 1200)), SetResult;

    // Motion
    SetEnable = 0xF3, U8, 3, BOOL, SetResult;
    /// Direction bit 7, speed bits 0-6
    RunContinuous = 0xF6, U8, 3, None, SetResult;
    Stop = 0xF7, None, 3, None, SetResult;
    /// Run a number of steps; direction/speed byte plus u32 step count
    RunSteps = 0xFD, U8U32, 3, None, Motion;
    /// 0xC8 = save, 0xCA = clear the power-on continuous run state
    SaveClearRunState = 0xFF, U8, 3, None, SetResult;
}

impl Command {
    /// Opcode byte
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> u8 {
        command.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_roundtrip() {
        for &command in Command::ALL {
            assert_eq!(Command::try_from(command.code()), Ok(command));
            assert_eq!(command.spec().command, command);
        }
    }

    #[test]
    fn test_unknown_opcode() {
        assert_eq!(Command::try_from(0x00), Err(FrameError::UnknownCommand(0x00)));
        assert_eq!(Command::try_from(0xA0), Err(FrameError::UnknownCommand(0xA0)));
    }

    #[test]
    fn test_reply_lengths() {
        assert_eq!(Command::ReadEncoder.spec().response_len, 8);
        assert_eq!(Command::ReadPulsesReceived.spec().response_len, 6);
        assert_eq!(Command::ReadShaftAngleError.spec().response_len, 4);
        for &command in Command::ALL {
            if command.spec().status != StatusSemantics::Value {
                assert_eq!(command.spec().response_len, STATUS_REPLY_LEN);
            }
        }
    }

    #[test]
    fn test_request_frame_lengths() {
        assert_eq!(Command::Stop.spec().payload.frame_len(), 3);
        assert_eq!(Command::SetCurrent.spec().payload.frame_len(), 4);
        assert_eq!(Command::SetAcceleration.spec().payload.frame_len(), 5);
        assert_eq!(Command::RunSteps.spec().payload.frame_len(), 8);
    }

    #[test]
    fn test_limits() {
        let baud = Command::SetBaudRate.spec().limits.unwrap();
        assert_eq!(baud.clamp(0), 1);
        assert_eq!(baud.clamp(4), 4);
        assert_eq!(baud.clamp(9), 6);

        let torque = Command::SetMaxTorque.spec().limits.unwrap();
        assert!(torque.contains(1200));
        assert!(!torque.contains(1201));
    }

    #[test]
    fn test_status_semantics() {
        use StatusOutcome::*;

        assert_eq!(StatusSemantics::SetResult.interpret(1), Positive);
        assert_eq!(StatusSemantics::SetResult.interpret(0), Negative);
        assert_eq!(StatusSemantics::SetResult.interpret(2), Unknown(2));

        assert_eq!(StatusSemantics::EnableState.interpret(1), Positive);
        assert_eq!(StatusSemantics::EnableState.interpret(2), Negative);
        assert_eq!(StatusSemantics::EnableState.interpret(0), Unknown(0));

        assert_eq!(StatusSemantics::Calibration.interpret(2), Negative);

        assert_eq!(StatusSemantics::Motion.interpret(0), Negative);
        assert_eq!(StatusSemantics::Motion.interpret(1), InProgress);
        assert_eq!(StatusSemantics::Motion.interpret(2), Positive);
    }
}
