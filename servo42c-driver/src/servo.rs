//! Typed SERVO42C operations
//!
//! Each method is one exchange (or, for blocking moves, one exchange plus
//! status polling). What a reply status means is looked up in the command
//! table, so a failed set is [`Error::Rejected`] and a status the command
//! never sends is [`Error::UnexpectedStatus`]; nothing is folded into a
//! zero.
//!
//! Payload values are clamped to the range the command table documents
//! before they are encoded.

use servo42c_core::settings::{clamp_torque, current_to_wire};
use servo42c_core::{
    BaudRate, Direction, EnablePinMode, LinkConfig, MotorType, SaveState, ServoConfig, Speed,
    WorkMode, ZeroMode,
};
use servo42c_hal::{Clock, Uart};
use servo42c_protocol::{
    address_for_index, Command, EncoderPosition, Frame, Payload, Response, StatusOutcome,
    BASE_ADDRESS,
};

use crate::error::{ApplyError, Error, SetupStep, TransportError};
use crate::transport::{LinkError, Transport, TransportSettings};

/// Outcome of a step move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveStatus {
    /// The driver accepted the move and reports it running
    Starting,
    /// The driver reports the move finished
    ///
    /// The driver sends this when the pulse train is done, which is not
    /// proof the shaft reached the target.
    Complete,
}

/// Shaft angle error full scale: 65535 counts per 360°
const ANGLE_ERROR_COUNTS: f32 = 65535.0;

/// Generate status-returning operations from command table rows
///
/// `name(args) => Command, PayloadVariant(wire value);`
macro_rules! status_operations {
    ($(
        $(#[$doc:meta])*
        $name:ident($($arg:ident: $ty:ty),*) => $command:ident, $payload:ident $(($wire:expr))?;
    )*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, $($arg: $ty),*) -> Result<(), Error<LinkError<U>>> {
                self.expect_success(Command::$command, Payload::$payload $(($wire))?)
            }
        )*
    };
}

/// One SERVO42C on a link
pub struct Servo42c<U, C> {
    transport: Transport<U, C>,
    motion_poll_ms: u32,
    motion_ms_per_step: u32,
}

impl<U: Uart, C: Clock> Servo42c<U, C> {
    /// Driver at slave index 0 with default link timing
    pub fn new(uart: U, clock: C) -> Self {
        Self::with_config(uart, clock, 0, &LinkConfig::default())
    }

    /// Driver at slave index `address` (0-9) with explicit link timing
    pub fn with_config(uart: U, clock: C, address: u8, link: &LinkConfig) -> Self {
        Self {
            transport: Transport::new(
                uart,
                clock,
                address_for_index(address),
                TransportSettings::from(link),
            ),
            motion_poll_ms: link.motion_poll_ms.max(1),
            motion_ms_per_step: link.motion_ms_per_step,
        }
    }

    /// Wire address frames are sent to
    pub fn address(&self) -> u8 {
        self.transport.address()
    }

    /// Slave index (0-9)
    pub fn address_index(&self) -> u8 {
        self.transport.address().wrapping_sub(BASE_ADDRESS)
    }

    pub fn transport(&self) -> &Transport<U, C> {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut Transport<U, C> {
        &mut self.transport
    }

    /// Give back the link and the clock
    pub fn release(self) -> (U, C) {
        self.transport.release()
    }

    /// Send one table command and return the raw reply
    ///
    /// The payload is clamped to the command's documented range.
    pub fn request(
        &mut self,
        command: Command,
        payload: Payload,
    ) -> Result<Response, Error<LinkError<U>>> {
        let spec = command.spec();
        let payload = match (payload, spec.limits) {
            (Payload::U8(v), Some(limits)) => Payload::U8(limits.clamp(v as u32) as u8),
            (Payload::U16(v), Some(limits)) => Payload::U16(limits.clamp(v as u32) as u16),
            (payload, _) => payload,
        };
        let frame = Frame::for_command(self.transport.address(), command, payload)?;
        Ok(self.transport.send(&frame, spec.response_len)?)
    }

    fn status_of(
        &mut self,
        command: Command,
        payload: Payload,
    ) -> Result<StatusOutcome, Error<LinkError<U>>> {
        let status = self.request(command, payload)?.status();
        Ok(command.spec().status.interpret(status))
    }

    fn expect_success(
        &mut self,
        command: Command,
        payload: Payload,
    ) -> Result<(), Error<LinkError<U>>> {
        let status = self.request(command, payload)?.status();
        match command.spec().status.interpret(status) {
            StatusOutcome::Positive => Ok(()),
            StatusOutcome::Negative => {
                debug!("{} rejected with status {=u8}", command, status);
                Err(Error::Rejected { command, status })
            }
            _ => Err(Error::UnexpectedStatus { command, status }),
        }
    }

    fn read_flag(&mut self, command: Command) -> Result<bool, Error<LinkError<U>>> {
        let status = self.request(command, Payload::None)?.status();
        match command.spec().status.interpret(status) {
            StatusOutcome::Positive => Ok(true),
            StatusOutcome::Negative => Ok(false),
            _ => Err(Error::UnexpectedStatus { command, status }),
        }
    }

    // Reads

    /// Encoder carrier and in-revolution value
    pub fn encoder_value(&mut self) -> Result<EncoderPosition, Error<LinkError<U>>> {
        Ok(self.request(Command::ReadEncoder, Payload::None)?.position()?)
    }

    /// Step pulses received since power-on
    pub fn pulses_received(&mut self) -> Result<i32, Error<LinkError<U>>> {
        Ok(self
            .request(Command::ReadPulsesReceived, Payload::None)?
            .value_i32()?)
    }

    /// Raw angle error between target and shaft, 65535 counts per turn
    pub fn shaft_angle_error(&mut self) -> Result<i16, Error<LinkError<U>>> {
        Ok(self
            .request(Command::ReadShaftAngleError, Payload::None)?
            .value_i16()?)
    }

    /// Angle error between target and shaft in degrees
    pub fn shaft_angle_error_degrees(&mut self) -> Result<f32, Error<LinkError<U>>> {
        let raw = self.shaft_angle_error()?;
        Ok(raw as f32 / ANGLE_ERROR_COUNTS * 360.0)
    }

    /// Whether the EN pin currently enables the motor
    pub fn enable_state(&mut self) -> Result<bool, Error<LinkError<U>>> {
        self.read_flag(Command::ReadEnablePin)
    }

    /// Whether locked-rotor protection has tripped
    pub fn shaft_lock_state(&mut self) -> Result<bool, Error<LinkError<U>>> {
        self.read_flag(Command::ReadShaftLockState)
    }

    status_operations! {
        /// Clear a tripped locked-rotor protection
        release_shaft_lock() => ReleaseShaftLock, None;
        /// Restore factory parameters (the driver needs recalibration after)
        restore_defaults() => RestoreDefaults, None;

        /// Calibrate the encoder; the motor must be unloaded
        calibrate() => Calibrate, U8(0);
        set_motor_type(motor: MotorType) => SetMotorType, U8(motor.to_wire());
        set_work_mode(mode: WorkMode) => SetWorkMode, U8(mode.to_wire());
        /// Phase current limit, clamped to 3000 mA in 200 mA steps
        set_max_current(current_ma: u16) => SetCurrent, U8(current_to_wire(current_ma));
        /// Microsteps per full step
        set_subdivision(microsteps: u8) => SetSubdivision, U8(microsteps);
        set_enable_mode(mode: EnablePinMode) => SetEnablePinMode, U8(mode.to_wire());
        set_direction(direction: Direction) => SetDirection, U8(direction.to_wire());
        set_screen_auto_off(enabled: bool) => SetScreenAutoOff, U8(enabled as u8);
        set_shaft_lock_protection(enabled: bool) => SetShaftLockProtection, U8(enabled as u8);
        set_subdivision_interpolation(enabled: bool) => SetSubdivisionInterpolation, U8(enabled as u8);
        /// Takes effect after the driver restarts
        set_baud_rate(baud: BaudRate) => SetBaudRate, U8(baud.to_wire());

        set_zero_mode(mode: ZeroMode) => SetZeroMode, U8(mode.to_wire());
        /// Make the current position the zero point
        set_zero_position() => SetZeroPosition, U8(0);
        /// Return-to-zero speed, 0 (fastest) to 4 (slowest)
        set_zero_speed(speed: u8) => SetZeroSpeed, U8(speed);
        set_zero_direction(direction: Direction) => SetZeroDirection, U8(direction.to_wire());
        go_to_zero() => GoToZero, U8(0);

        set_position_kp(kp: u16) => SetPositionKp, U16(kp);
        set_position_ki(ki: u16) => SetPositionKi, U16(ki);
        set_position_kd(kd: u16) => SetPositionKd, U16(kd);
        set_acceleration(acceleration: u16) => SetAcceleration, U16(acceleration);
        /// Torque limit, clamped to 1200
        set_max_torque(torque: u16) => SetMaxTorque, U16(clamp_torque(torque));

        set_enabled(enabled: bool) => SetEnable, U8(enabled as u8);
        /// Run until [`stop`](Self::stop); speed is clamped to 127
        run_continuous(direction: Direction, speed: Speed) => RunContinuous, U8(direction.with_speed(speed));
        stop() => Stop, None;
        /// Store or clear the continuous run state restored at power-on
        save_run_state(state: SaveState) => SaveClearRunState, U8(state.to_wire());
    }

    /// Change the slave address to `0xE0 + index` (index clamped to 0-9)
    ///
    /// The new address is adopted before the command goes out, so the
    /// command itself and every later frame use it.
    pub fn set_slave_address(&mut self, index: u8) -> Result<(), Error<LinkError<U>>> {
        let address = address_for_index(index);
        debug!("switching slave address to {=u8:X}", address);
        self.transport.set_address(address);
        self.expect_success(Command::SetSlaveAddress, Payload::U8(address - BASE_ADDRESS))
    }

    /// Move `steps` steps
    ///
    /// With `blocking`, a `Starting` reply is followed by polling for the
    /// driver's completion status every `motion_poll_ms` for at most
    /// `steps × motion_ms_per_step` ms. The wait is best effort: when the
    /// budget runs out the last status seen is returned, not an error.
    pub fn move_steps(
        &mut self,
        direction: Direction,
        speed: Speed,
        steps: u32,
        blocking: bool,
    ) -> Result<MoveStatus, Error<LinkError<U>>> {
        let command = Command::RunSteps;
        let payload = Payload::U8U32(direction.with_speed(speed), steps);
        let mut status = match self.status_of(command, payload)? {
            StatusOutcome::InProgress => MoveStatus::Starting,
            StatusOutcome::Positive => MoveStatus::Complete,
            StatusOutcome::Negative => {
                debug!("move of {=u32} steps rejected", steps);
                return Err(Error::Rejected { command, status: 0 });
            }
            StatusOutcome::Unknown(status) => {
                return Err(Error::UnexpectedStatus { command, status })
            }
        };

        if blocking && status == MoveStatus::Starting {
            status = self.wait_for_move(steps)?;
        }
        Ok(status)
    }

    fn wait_for_move(&mut self, steps: u32) -> Result<MoveStatus, Error<LinkError<U>>> {
        let command = Command::RunSteps;
        let response_len = command.spec().response_len;
        let budget_ms = steps as u64 * self.motion_ms_per_step as u64;
        let start = self.transport.clock().now_ms();

        loop {
            self.transport.clock_mut().delay_ms(self.motion_poll_ms);

            let elapsed = self.transport.clock().elapsed_ms(start);
            if elapsed > budget_ms {
                debug!("move wait budget of {=u64} ms used up", budget_ms);
                return Ok(MoveStatus::Starting);
            }
            let window = (budget_ms - elapsed).min(self.transport.settings().timeout_ms as u64);

            match self.transport.receive(response_len, window as u32) {
                Ok(response) => match command.spec().status.interpret(response.status()) {
                    StatusOutcome::Positive => return Ok(MoveStatus::Complete),
                    StatusOutcome::InProgress => {}
                    StatusOutcome::Negative => {
                        return Err(Error::Rejected {
                            command,
                            status: response.status(),
                        })
                    }
                    StatusOutcome::Unknown(status) => {
                        return Err(Error::UnexpectedStatus { command, status })
                    }
                },
                Err(TransportError::NoResponse { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Push a device setup in order: slave address, current, torque,
    /// enable-pin mode, subdivision, interpolation
    ///
    /// Stops at the first failing step.
    pub fn apply_config(&mut self, config: &ServoConfig) -> Result<(), ApplyError<LinkError<U>>> {
        let at = |step| move |error| ApplyError { step, error };

        self.set_slave_address(config.address)
            .map_err(at(SetupStep::SlaveAddress))?;
        self.set_max_current(config.max_current_ma)
            .map_err(at(SetupStep::MaxCurrent))?;
        self.set_max_torque(config.max_torque)
            .map_err(at(SetupStep::MaxTorque))?;
        self.set_enable_mode(config.enable_mode)
            .map_err(at(SetupStep::EnableMode))?;
        self.set_subdivision(config.microsteps)
            .map_err(at(SetupStep::Subdivision))?;
        self.set_subdivision_interpolation(config.interpolation)
            .map_err(at(SetupStep::Interpolation))?;
        Ok(())
    }
}
