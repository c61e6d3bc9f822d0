//! Frame encoding and decoding for the SERVO42C protocol.
//!
//! Request format:
//! - ADDRESS (1 byte): 0xE0 + slave index
//! - COMMAND (1 byte): opcode, see [`crate::command`]
//! - PAYLOAD (0, 1, 2 or 5 bytes): big-endian values
//! - CHECKSUM (1 byte): low byte of the sum of all preceding bytes
//!
//! Reply format:
//! - ADDRESS (1 byte)
//! - STATUS or VALUE (1, 2, 4 or 6 bytes)
//! - CHECKSUM (1 byte)

use heapless::Vec;

use crate::checksum::{checksum, verify};
use crate::command::{Command, PayloadKind};

/// Longest frame in either direction (run-by-steps request, encoder reply)
pub const MAX_FRAME_SIZE: usize = 8;

/// Shortest frame in either direction (address, command/status, checksum)
pub const MIN_FRAME_SIZE: usize = 3;

/// Errors that can occur during frame encoding or decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Checksum trailer does not match the frame contents
    InvalidChecksum,
    /// Frame holds fewer bytes than the requested value needs
    TooShort,
    /// Frame length outside what the protocol allows
    InvalidLength(u8),
    /// Opcode not in the command table
    UnknownCommand(u8),
    /// Payload shape does not match the command
    PayloadMismatch,
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            FrameError::InvalidChecksum => write!(f, "frame checksum mismatch"),
            FrameError::TooShort => write!(f, "frame too short for requested value"),
            FrameError::InvalidLength(len) => write!(f, "invalid frame length {len}"),
            FrameError::UnknownCommand(code) => write!(f, "unknown command 0x{code:02X}"),
            FrameError::PayloadMismatch => write!(f, "payload does not match command"),
        }
    }
}

/// Request payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Payload {
    None,
    U8(u8),
    U16(u16),
    /// Direction/speed byte plus a 32-bit count
    U8U32(u8, u32),
}

impl Payload {
    /// Shape of this payload
    pub const fn kind(&self) -> PayloadKind {
        match self {
            Payload::None => PayloadKind::None,
            Payload::U8(_) => PayloadKind::U8,
            Payload::U16(_) => PayloadKind::U16,
            Payload::U8U32(_, _) => PayloadKind::U8U32,
        }
    }
}

/// An encoded request frame
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; MAX_FRAME_SIZE],
    len: u8,
}

impl Frame {
    fn from_parts(address: u8, command: u8, payload: &[u8]) -> Self {
        let mut bytes = [0u8; MAX_FRAME_SIZE];
        let body = 2 + payload.len();
        bytes[0] = address;
        bytes[1] = command;
        bytes[2..body].copy_from_slice(payload);
        bytes[body] = checksum(&bytes[..body]);
        Self {
            bytes,
            len: (body + 1) as u8,
        }
    }

    /// `[addr, cmd, chk]`
    pub fn status_only(address: u8, command: impl Into<u8>) -> Self {
        Self::from_parts(address, command.into(), &[])
    }

    /// `[addr, cmd, value, chk]`
    pub fn with_u8(address: u8, command: impl Into<u8>, value: u8) -> Self {
        Self::from_parts(address, command.into(), &[value])
    }

    /// `[addr, cmd, value_hi, value_lo, chk]`
    pub fn with_u16(address: u8, command: impl Into<u8>, value: u16) -> Self {
        Self::from_parts(address, command.into(), &value.to_be_bytes())
    }

    /// `[addr, cmd, a, b3, b2, b1, b0, chk]`
    pub fn with_u8_u32(address: u8, command: impl Into<u8>, a: u8, b: u32) -> Self {
        let [b3, b2, b1, b0] = b.to_be_bytes();
        Self::from_parts(address, command.into(), &[a, b3, b2, b1, b0])
    }

    /// Encode any payload
    pub fn encode(address: u8, command: impl Into<u8>, payload: Payload) -> Self {
        match payload {
            Payload::None => Self::status_only(address, command),
            Payload::U8(v) => Self::with_u8(address, command, v),
            Payload::U16(v) => Self::with_u16(address, command, v),
            Payload::U8U32(a, b) => Self::with_u8_u32(address, command, a, b),
        }
    }

    /// Encode a table command, checking the payload has the shape the
    /// device expects for it
    pub fn for_command(address: u8, command: Command, payload: Payload) -> Result<Self, FrameError> {
        if payload.kind() != command.spec().payload {
            return Err(FrameError::PayloadMismatch);
        }
        Ok(Self::encode(address, command, payload))
    }

    /// Decode a request frame (used by bus sniffers and tests)
    pub fn parse(bytes: &[u8]) -> Result<Self, FrameError> {
        match bytes.len() {
            3 | 4 | 5 | 8 => {}
            other => return Err(FrameError::InvalidLength(other.min(u8::MAX as usize) as u8)),
        }
        if !verify(bytes) {
            return Err(FrameError::InvalidChecksum);
        }
        let mut frame = Self {
            bytes: [0u8; MAX_FRAME_SIZE],
            len: bytes.len() as u8,
        };
        frame.bytes[..bytes.len()].copy_from_slice(bytes);
        Ok(frame)
    }

    /// Raw bytes to put on the wire
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn address(&self) -> u8 {
        self.bytes[0]
    }

    /// Raw opcode byte
    pub fn command_code(&self) -> u8 {
        self.bytes[1]
    }

    /// Opcode looked up in the command table
    pub fn command(&self) -> Result<Command, FrameError> {
        Command::try_from(self.command_code())
    }

    pub fn checksum(&self) -> u8 {
        self.bytes[self.len as usize - 1]
    }

    /// Decode the payload bytes
    pub fn payload(&self) -> Payload {
        let p = &self.bytes[2..self.len as usize - 1];
        match *p {
            [v] => Payload::U8(v),
            [hi, lo] => Payload::U16(u16::from_be_bytes([hi, lo])),
            [a, b3, b2, b1, b0] => Payload::U8U32(a, u32::from_be_bytes([b3, b2, b1, b0])),
            _ => Payload::None,
        }
    }
}

impl core::fmt::Debug for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Frame({:02X?})", self.as_bytes())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Frame {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Frame({=[u8]:X})", self.as_bytes())
    }
}

/// Encoder reading: whole revolutions plus position inside the revolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderPosition {
    /// Signed revolution count
    pub carrier: i32,
    /// Position within the current revolution (0-0xFFFF)
    pub value: u16,
}

impl EncoderPosition {
    /// Counts per revolution of the sub-position value
    pub const COUNTS_PER_REVOLUTION: i64 = 65_536;

    /// Combined position, `carrier * 65536 + value`
    pub const fn total(&self) -> i64 {
        self.carrier as i64 * Self::COUNTS_PER_REVOLUTION + self.value as i64
    }
}

/// A checksum-validated reply frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Response {
    bytes: Vec<u8, MAX_FRAME_SIZE>,
}

impl Response {
    /// Validate a complete reply
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < MIN_FRAME_SIZE || bytes.len() > MAX_FRAME_SIZE {
            return Err(FrameError::InvalidLength(bytes.len().min(u8::MAX as usize) as u8));
        }
        if !verify(bytes) {
            return Err(FrameError::InvalidChecksum);
        }
        let bytes = Vec::from_slice(bytes).map_err(|_| FrameError::InvalidLength(bytes.len() as u8))?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn address(&self) -> u8 {
        self.bytes[0]
    }

    /// Data bytes between address and checksum
    pub fn data(&self) -> &[u8] {
        &self.bytes[1..self.bytes.len() - 1]
    }

    fn data_array<const N: usize>(&self) -> Result<[u8; N], FrameError> {
        self.data()
            .get(..N)
            .and_then(|slice| <[u8; N]>::try_from(slice).ok())
            .ok_or(FrameError::TooShort)
    }

    /// Status byte (`frame[1]`)
    pub fn status(&self) -> u8 {
        self.bytes[1]
    }

    /// Big-endian `frame[1..3]` as a signed value
    pub fn value_i16(&self) -> Result<i16, FrameError> {
        self.data_array().map(i16::from_be_bytes)
    }

    /// Big-endian `frame[1..5]` as a signed value
    pub fn value_i32(&self) -> Result<i32, FrameError> {
        self.data_array().map(i32::from_be_bytes)
    }

    /// Carrier from `frame[1..5]`, sub-position from `frame[5..7]`
    pub fn position(&self) -> Result<EncoderPosition, FrameError> {
        let [c3, c2, c1, c0, v1, v0] = self.data_array()?;
        Ok(EncoderPosition {
            carrier: i32::from_be_bytes([c3, c2, c1, c0]),
            value: u16::from_be_bytes([v1, v0]),
        })
    }
}
