//! Driver error types
//!
//! Link failures, device refusals and replies that make no sense for the
//! command are kept apart so a caller never has to guess what a zero
//! meant.

use core::fmt;

use servo42c_protocol::{Command, FrameError};

/// One exchange could not be completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError<E> {
    /// The link reported an error on the last attempt
    Link(E),
    /// No valid reply within the timeout on any attempt
    NoResponse { attempts: u8 },
    /// Requested reply length is not a valid frame length
    InvalidLength(u8),
}

impl<E: fmt::Debug> fmt::Display for TransportError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Link(e) => write!(f, "link error: {e:?}"),
            TransportError::NoResponse { attempts } => {
                write!(f, "no response after {attempts} attempts")
            }
            TransportError::InvalidLength(len) => write!(f, "invalid reply length {len}"),
        }
    }
}

/// Operation error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The exchange itself failed
    Transport(TransportError<E>),
    /// The device answered with its failure status
    Rejected { command: Command, status: u8 },
    /// The device answered with a status the command does not define
    UnexpectedStatus { command: Command, status: u8 },
    /// The reply could not be decoded as the command's value
    Frame(FrameError),
}

impl<E> From<TransportError<E>> for Error<E> {
    fn from(e: TransportError<E>) -> Self {
        Error::Transport(e)
    }
}

impl<E> From<FrameError> for Error<E> {
    fn from(e: FrameError) -> Self {
        Error::Frame(e)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport(e) => write!(f, "{e}"),
            Error::Rejected { command, status } => {
                write!(f, "{command:?} rejected (status {status})")
            }
            Error::UnexpectedStatus { command, status } => {
                write!(f, "{command:?} returned unexpected status {status}")
            }
            Error::Frame(e) => write!(f, "{e}"),
        }
    }
}

impl<E> Error<E> {
    /// True when the failure came from the link rather than the device
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// Step of [`apply_config`](crate::Servo42c::apply_config)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupStep {
    SlaveAddress,
    MaxCurrent,
    MaxTorque,
    EnableMode,
    Subdivision,
    Interpolation,
}

/// Setup stopped at `step`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ApplyError<E> {
    pub step: SetupStep,
    pub error: Error<E>,
}

impl<E: fmt::Debug> fmt::Display for ApplyError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "setup failed at {:?}: {}", self.step, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e: Error<()> = Error::Transport(TransportError::NoResponse { attempts: 3 });
        assert_eq!(e.to_string(), "no response after 3 attempts");
        assert!(e.is_transport());

        let e: Error<()> = Error::Rejected {
            command: Command::SetCurrent,
            status: 0,
        };
        assert_eq!(e.to_string(), "SetCurrent rejected (status 0)");
        assert!(!e.is_transport());
    }

    #[test]
    fn test_apply_error_display() {
        let e: ApplyError<()> = ApplyError {
            step: SetupStep::MaxTorque,
            error: Error::Rejected {
                command: Command::SetMaxTorque,
                status: 0,
            },
        };
        assert_eq!(
            e.to_string(),
            "setup failed at MaxTorque: SetMaxTorque rejected (status 0)"
        );
    }
}
