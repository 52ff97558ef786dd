//! Vehicle backend trait and error types.

use crate::types::{FlightCommand, Pose};

/// Transport-level failure talking to a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Socket/communication I/O error.
    Io,
    /// No response in time.
    Timeout,
    /// Vehicle answered with an error.
    Rejected,
}

/// Why a backend refused or failed a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BackendError {
    /// `connect` has not succeeded yet.
    NotConnected,
    /// Command needs the vehicle in the air.
    NotFlying,
    /// Command needs the vehicle on the ground.
    AlreadyFlying,
    /// A takeoff or landing is still in progress.
    Busy,
    Link(LinkError),
}

impl From<LinkError> for BackendError {
    fn from(err: LinkError) -> Self {
        BackendError::Link(err)
    }
}

/// Progress reported by [`VehicleBackend::advance`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BackendEvent {
    #[default]
    None,
    /// Target altitude reached.
    TakeoffComplete,
    /// Touched down.
    Landed,
}

/// Common call surface of the simulator and the real vehicle.
///
/// The flight state machine depends only on this trait. Commands are
/// fire-and-forget: they report success or failure synchronously and are
/// never retried here. Retry, if any, belongs to the implementation.
pub trait VehicleBackend {
    fn connect(&mut self) -> Result<(), BackendError>;

    /// Begin climbing to hover height.
    fn takeoff(&mut self) -> Result<(), BackendError>;

    /// Begin descending.
    fn land(&mut self) -> Result<(), BackendError>;

    /// Cut motors immediately. Must leave the vehicle grounded and at rest.
    fn emergency(&mut self) -> Result<(), BackendError>;

    /// Hold position. Defaults to an all-neutral RC command.
    fn hover(&mut self) -> Result<(), BackendError> {
        self.set_rc(FlightCommand::NEUTRAL)
    }

    fn set_rc(&mut self, cmd: FlightCommand) -> Result<(), BackendError>;

    /// Remaining battery in percent, 0-100.
    fn battery(&self) -> u8;

    fn is_flying(&self) -> bool;

    /// Step the backend by `dt` seconds.
    fn advance(&mut self, dt: f32) -> BackendEvent;

    /// Position estimate, if the backend has one.
    fn pose(&self) -> Option<Pose> {
        None
    }
}

impl<T: VehicleBackend + ?Sized> VehicleBackend for &mut T {
    fn connect(&mut self) -> Result<(), BackendError> {
        (**self).connect()
    }

    fn takeoff(&mut self) -> Result<(), BackendError> {
        (**self).takeoff()
    }

    fn land(&mut self) -> Result<(), BackendError> {
        (**self).land()
    }

    fn emergency(&mut self) -> Result<(), BackendError> {
        (**self).emergency()
    }

    fn hover(&mut self) -> Result<(), BackendError> {
        (**self).hover()
    }

    fn set_rc(&mut self, cmd: FlightCommand) -> Result<(), BackendError> {
        (**self).set_rc(cmd)
    }

    fn battery(&self) -> u8 {
        (**self).battery()
    }

    fn is_flying(&self) -> bool {
        (**self).is_flying()
    }

    fn advance(&mut self, dt: f32) -> BackendEvent {
        (**self).advance(dt)
    }

    fn pose(&self) -> Option<Pose> {
        (**self).pose()
    }
}
