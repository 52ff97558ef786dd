//! Flight state machine.
//!
//! Owns the vehicle backend and the authoritative [`FlightState`]. Operator
//! actions are checked against the current state before anything is sent to
//! the backend; progress-driven changes (takeoff complete, touchdown,
//! battery depletion) happen only in [`FlightStateMachine::advance`].
//!
//! ```text
//! Idle --connect--> Connected --takeoff--> TakingOff --(reached height)--> Flying
//!                       ^                                                   |
//!                       +------(touchdown)------ Landing <--land/battery 0--+
//!
//! any but Idle --emergency--> EmergencyStopped --(next advance)--> Connected
//! ```

use crate::backend::{BackendError, BackendEvent, VehicleBackend};
use crate::types::{Action, FlightCommand, FlightState};

/// Policy switches for automatic behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlightPolicy {
    /// Start landing when the backend reports 0% battery while flying.
    pub auto_land_on_depletion: bool,
}

pub const DEFAULT_FLIGHT_POLICY: FlightPolicy = FlightPolicy {
    auto_land_on_depletion: true,
};

impl Default for FlightPolicy {
    fn default() -> Self {
        DEFAULT_FLIGHT_POLICY
    }
}

/// Error type for state machine operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlError {
    /// Action not valid in the current state. Nothing was sent.
    IllegalTransition { state: FlightState, action: Action },
    /// Backend refused or failed the command. State is unchanged.
    Backend(BackendError),
}

impl From<BackendError> for ControlError {
    fn from(err: BackendError) -> Self {
        ControlError::Backend(err)
    }
}

/// State machine driving a [`VehicleBackend`].
pub struct FlightStateMachine<B> {
    backend: B,
    state: FlightState,
    policy: FlightPolicy,
}

impl<B: VehicleBackend> FlightStateMachine<B> {
    pub fn new(backend: B, policy: FlightPolicy) -> Self {
        Self {
            backend,
            state: FlightState::Idle,
            policy,
        }
    }

    #[inline]
    pub fn state(&self) -> FlightState {
        self.state
    }

    pub fn policy(&self) -> &FlightPolicy {
        &self.policy
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Direct backend access. Bypasses the transition checks.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Idle -> Connected.
    pub fn connect(&mut self) -> Result<(), ControlError> {
        self.require(Action::Connect, self.state == FlightState::Idle)?;
        self.dispatch(Action::Connect, B::connect)?;
        self.transition(FlightState::Connected);
        Ok(())
    }

    /// Connected -> TakingOff.
    pub fn takeoff(&mut self) -> Result<(), ControlError> {
        self.require(Action::Takeoff, self.state == FlightState::Connected)?;
        self.dispatch(Action::Takeoff, B::takeoff)?;
        self.transition(FlightState::TakingOff);
        Ok(())
    }

    /// Flying -> Landing.
    pub fn land(&mut self) -> Result<(), ControlError> {
        self.require(Action::Land, self.state == FlightState::Flying)?;
        self.dispatch(Action::Land, B::land)?;
        self.transition(FlightState::Landing);
        Ok(())
    }

    /// Cut motors. Legal in every state except Idle, takes effect immediately.
    pub fn emergency(&mut self) -> Result<(), ControlError> {
        self.require(Action::Emergency, self.state != FlightState::Idle)?;
        self.dispatch(Action::Emergency, B::emergency)?;
        log::warn!("emergency stop in {:?}", self.state);
        self.transition(FlightState::EmergencyStopped);
        Ok(())
    }

    /// Zero all channels. Flying only.
    pub fn hover(&mut self) -> Result<(), ControlError> {
        self.require(Action::Hover, self.state.accepts_rc())?;
        self.dispatch(Action::Hover, B::hover)
    }

    /// Forward an RC command. Flying only.
    pub fn set_rc(&mut self, cmd: FlightCommand) -> Result<(), ControlError> {
        self.require(Action::SetRc, self.state.accepts_rc())?;
        self.backend.set_rc(cmd).map_err(|e| {
            log::debug!("set_rc failed: {:?}", e);
            ControlError::Backend(e)
        })
    }

    /// Step the backend by `dt` seconds and reconcile state with it.
    ///
    /// Returns the state after reconciliation.
    pub fn advance(&mut self, dt: f32) -> FlightState {
        let event = self.backend.advance(dt);

        match (self.state, event) {
            (FlightState::EmergencyStopped, _) => self.transition(FlightState::Connected),
            (FlightState::TakingOff, BackendEvent::TakeoffComplete) => {
                self.transition(FlightState::Flying)
            }
            (FlightState::Landing, BackendEvent::Landed) => self.transition(FlightState::Connected),
            _ => {}
        }

        // Backends report whole percent, so this fires once the level
        // drops below 1%.
        if self.state == FlightState::Flying
            && self.policy.auto_land_on_depletion
            && self.backend.battery() == 0
        {
            match self.backend.land() {
                Ok(()) => {
                    log::warn!("battery depleted, landing");
                    self.transition(FlightState::Landing);
                }
                Err(e) => log::error!("auto-land failed: {:?}", e),
            }
        }

        if self.state.is_airborne() && !self.backend.is_flying() {
            log::warn!("vehicle reports grounded while {:?}", self.state);
            self.transition(FlightState::Connected);
        }

        self.state
    }

    fn require(&self, action: Action, allowed: bool) -> Result<(), ControlError> {
        if allowed {
            return Ok(());
        }
        log::warn!("rejected {:?} in {:?}", action, self.state);
        Err(ControlError::IllegalTransition {
            state: self.state,
            action,
        })
    }

    fn dispatch(
        &mut self,
        action: Action,
        op: fn(&mut B) -> Result<(), BackendError>,
    ) -> Result<(), ControlError> {
        op(&mut self.backend).map_err(|e| {
            log::warn!("{:?} failed: {:?}", action, e);
            ControlError::Backend(e)
        })
    }

    fn transition(&mut self, to: FlightState) {
        if self.state != to {
            log::info!("{:?} -> {:?}", self.state, to);
            self.state = to;
        }
    }
}
