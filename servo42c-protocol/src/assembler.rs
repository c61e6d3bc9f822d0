//! Reply assembly with address-anchored resynchronization
//!
//! The link has no start-of-frame marker, so the receiver anchors on the
//! slave address: bytes are dropped until one equals the address, then
//! every byte is taken (including ones that happen to equal the address)
//! until the expected reply length is reached. A full buffer with a bad
//! checksum is thrown away and the search for the address starts over.
//!
//! The assembler only sees bytes. Timing (inactivity timeout, retries)
//! belongs to the transport that feeds it.

use heapless::Vec;

use crate::checksum::verify;
use crate::frame::{FrameError, Response, MAX_FRAME_SIZE, MIN_FRAME_SIZE};

/// What happened to one pushed byte
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AssemblerEvent {
    /// Byte dropped while searching for the address
    Discarded,
    /// Byte stored, frame not complete yet
    Accepted,
    /// Expected length reached and the checksum matched
    Complete(Response),
    /// Expected length reached but the checksum did not match; the
    /// accepted bytes were dropped
    ChecksumMismatch,
}

/// Receiver state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncState {
    /// Waiting for the address byte
    Synchronizing,
    /// Address seen, collecting the rest of the frame
    Accumulating { received: u8 },
}

/// Byte-fed state machine producing validated replies
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    address: u8,
    expected_len: u8,
    buffer: Vec<u8, MAX_FRAME_SIZE>,
}

impl FrameAssembler {
    /// Create an assembler for a reply of `expected_len` bytes from `address`
    pub fn new(address: u8, expected_len: u8) -> Result<Self, FrameError> {
        if (expected_len as usize) < MIN_FRAME_SIZE || expected_len as usize > MAX_FRAME_SIZE {
            return Err(FrameError::InvalidLength(expected_len));
        }
        Ok(Self {
            address,
            expected_len,
            buffer: Vec::new(),
        })
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn expected_len(&self) -> u8 {
        self.expected_len
    }

    pub fn state(&self) -> SyncState {
        if self.buffer.is_empty() {
            SyncState::Synchronizing
        } else {
            SyncState::Accumulating {
                received: self.buffer.len() as u8,
            }
        }
    }

    /// Drop everything collected and search for the address again
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Resynchronization step: should `byte` be kept?
    ///
    /// While synchronizing only the address byte is kept. Once anchored,
    /// every byte is kept regardless of value.
    pub fn synchronize(&self, byte: u8) -> bool {
        match self.state() {
            SyncState::Synchronizing => byte == self.address,
            SyncState::Accumulating { .. } => true,
        }
    }

    /// Feed a single byte
    pub fn push(&mut self, byte: u8) -> AssemblerEvent {
        if !self.synchronize(byte) {
            return AssemblerEvent::Discarded;
        }
        if self.buffer.push(byte).is_err() {
            // Cannot happen with expected_len <= MAX_FRAME_SIZE; start over
            self.reset();
            return AssemblerEvent::ChecksumMismatch;
        }
        if self.buffer.len() < self.expected_len as usize {
            return AssemblerEvent::Accepted;
        }

        let event = if verify(&self.buffer) {
            match Response::from_bytes(&self.buffer) {
                Ok(response) => AssemblerEvent::Complete(response),
                Err(_) => AssemblerEvent::ChecksumMismatch,
            }
        } else {
            AssemblerEvent::ChecksumMismatch
        };
        self.reset();
        event
    }

    /// Feed bytes until a reply completes
    ///
    /// Returns the reply and the number of bytes consumed. Bytes after the
    /// reply are left untouched.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Option<(Response, usize)> {
        for (i, &byte) in bytes.iter().enumerate() {
            if let AssemblerEvent::Complete(response) = self.push(byte) {
                return Some((response, i + 1));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::checksum;
    use proptest::prelude::*;

    fn reply(body: &[u8]) -> std::vec::Vec<u8> {
        let mut bytes = body.to_vec();
        bytes.push(checksum(body));
        bytes
    }

    #[test]
    fn test_rejects_invalid_lengths() {
        assert_eq!(
            FrameAssembler::new(0xE0, 2).unwrap_err(),
            FrameError::InvalidLength(2)
        );
        assert_eq!(
            FrameAssembler::new(0xE0, 9).unwrap_err(),
            FrameError::InvalidLength(9)
        );
        assert!(FrameAssembler::new(0xE0, 3).is_ok());
        assert!(FrameAssembler::new(0xE0, 8).is_ok());
    }

    #[test]
    fn test_synchronize_anchors_on_address() {
        let mut assembler = FrameAssembler::new(0xE0, 3).unwrap();
        assert!(!assembler.synchronize(0x01));
        assert!(assembler.synchronize(0xE0));

        assert_eq!(assembler.push(0xE0), AssemblerEvent::Accepted);
        assert_eq!(assembler.state(), SyncState::Accumulating { received: 1 });
        // Anchored: anything goes, even a second address byte
        assert!(assembler.synchronize(0x01));
        assert!(assembler.synchronize(0xE0));
    }

    #[test]
    fn test_simple_status_reply() {
        let mut assembler = FrameAssembler::new(0xE0, 3).unwrap();
        assert_eq!(assembler.push(0xE0), AssemblerEvent::Accepted);
        assert_eq!(assembler.push(0x01), AssemblerEvent::Accepted);
        match assembler.push(0xE1) {
            AssemblerEvent::Complete(response) => assert_eq!(response.status(), 1),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(assembler.state(), SyncState::Synchronizing);
    }

    #[test]
    fn test_noise_before_frame_is_discarded() {
        let mut assembler = FrameAssembler::new(0xE0, 3).unwrap();
        for noise in [0x00, 0xFF, 0x12, 0x34] {
            assert_eq!(assembler.push(noise), AssemblerEvent::Discarded);
        }
        let (response, used) = assembler.push_bytes(&[0xE0, 0x01, 0xE1]).unwrap();
        assert_eq!(response.status(), 1);
        assert_eq!(used, 3);
    }

    #[test]
    fn test_address_valued_data_is_kept() {
        // Status byte equal to the address must not re-anchor
        let bytes = reply(&[0xE0, 0xE0]);
        let mut assembler = FrameAssembler::new(0xE0, 3).unwrap();
        let (response, _) = assembler.push_bytes(&bytes).unwrap();
        assert_eq!(response.status(), 0xE0);
    }

    #[test]
    fn test_checksum_mismatch_resyncs() {
        let mut assembler = FrameAssembler::new(0xE0, 3).unwrap();
        assembler.push(0xE0);
        assembler.push(0x01);
        assert_eq!(assembler.push(0x00), AssemblerEvent::ChecksumMismatch);
        assert_eq!(assembler.state(), SyncState::Synchronizing);

        // The next good frame still decodes
        let (response, _) = assembler.push_bytes(&[0xE0, 0x02, 0xE2]).unwrap();
        assert_eq!(response.status(), 2);
    }

    #[test]
    fn test_other_address_is_ignored() {
        let mut assembler = FrameAssembler::new(0xE3, 3).unwrap();
        assert_eq!(assembler.push_bytes(&[0xE0, 0x01, 0xE1]), None);
        assert_eq!(assembler.state(), SyncState::Synchronizing);
    }

    #[test]
    fn test_encoder_reply() {
        let bytes = reply(&[0xE0, 0x00, 0x00, 0x00, 0x02, 0x00, 0x64]);
        let mut assembler = FrameAssembler::new(0xE0, 8).unwrap();
        let (response, used) = assembler.push_bytes(&bytes).unwrap();
        assert_eq!(used, 8);
        assert_eq!(response.position().unwrap().total(), 131_172);
    }

    proptest! {
        #[test]
        fn noise_prefixed_frame_resynchronizes(
            noise in proptest::collection::vec(any::<u8>().prop_filter("not address", |b| *b != 0xE0), 0..32),
            data in proptest::collection::vec(any::<u8>(), 1..=6),
        ) {
            let mut body = std::vec![0xE0];
            body.extend_from_slice(&data);
            let frame = reply(&body);

            let mut stream = noise.clone();
            stream.extend_from_slice(&frame);

            let mut assembler = FrameAssembler::new(0xE0, frame.len() as u8).unwrap();
            let (response, used) = assembler.push_bytes(&stream).unwrap();
            prop_assert_eq!(used, stream.len());
            prop_assert_eq!(response.as_bytes(), &frame[..]);
        }
    }
}
