//! Telemetry snapshot and sink trait.
//!
//! The control loop produces a [`Telemetry`] snapshot on demand. Where it goes
//! (log lines, a HUD, a ground station) is up to the [`TelemetrySink`].

use crate::input::ConnectionStatus;
use crate::types::{FlightCommand, FlightState, Pose};

/// Operator-facing view of the loop at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Telemetry {
    pub state: FlightState,
    /// Battery percent, 0-100.
    pub battery: u8,
    /// Position estimate, when the backend has one.
    pub pose: Option<Pose>,
    /// Speed multiplier in tenths (1..=10).
    pub speed_tenths: u8,
    pub rc_enabled: bool,
    /// Last RC command accepted by the vehicle.
    pub last_command: Option<FlightCommand>,
    pub controller: ConnectionStatus,
}

impl Telemetry {
    /// Altitude in meters, 0 when no pose is available.
    #[must_use]
    pub fn altitude(&self) -> f32 {
        self.pose.map_or(0.0, |p| p.position[2])
    }
}

/// The sink could not take a snapshot. The loop drops it and carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryError;

/// Destination for telemetry snapshots.
pub trait TelemetrySink {
    fn publish(&mut self, telemetry: &Telemetry) -> Result<(), TelemetryError>;
}
