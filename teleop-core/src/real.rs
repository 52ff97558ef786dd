//! Physical vehicle backend over a text-command SDK link.
//!
//! The vehicle speaks a line-oriented command protocol:
//!
//! | Command | Meaning |
//! |---------|---------|
//! | `command` | enter SDK mode |
//! | `takeoff` / `land` | begin climb / descent |
//! | `emergency` | stop motors now |
//! | `stop` | hover in place |
//! | `rc a b c d` | roll, pitch, throttle, yaw in [-100, 100] |
//!
//! Sockets and reply parsing live behind [`VehicleLink`]. This backend only
//! sequences commands and reconciles its flags with polled telemetry; it does
//! no kinematics.

use core::fmt::Write;

use heapless::String;

use crate::backend::{BackendError, BackendEvent, LinkError, VehicleBackend};
use crate::types::{wrap_degrees, FlightCommand, Pose};

/// Longest command sent over the link (`rc -100 -100 -100 -100`).
pub const MAX_COMMAND_LEN: usize = 32;

/// Telemetry fields the backend reconciles against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkTelemetry {
    /// Battery percent, 0-100.
    pub battery: u8,
    /// Height above takeoff point, centimeters.
    pub height_cm: i16,
    /// Heading, degrees.
    pub yaw_deg: i16,
}

/// Transport to the vehicle.
pub trait VehicleLink {
    /// Send one command and wait for its acknowledgement.
    fn send(&mut self, command: &str) -> Result<(), LinkError>;

    /// Latest telemetry state.
    fn telemetry(&mut self) -> Result<LinkTelemetry, LinkError>;
}

/// Height thresholds for deciding takeoff and touchdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RealConfig {
    /// Takeoff is complete at or above this height.
    pub airborne_height_cm: i16,
    /// Landed at or below this height.
    pub ground_height_cm: i16,
}

pub const DEFAULT_REAL_CONFIG: RealConfig = RealConfig {
    airborne_height_cm: 30,
    ground_height_cm: 10,
};

impl Default for RealConfig {
    fn default() -> Self {
        DEFAULT_REAL_CONFIG
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Grounded,
    TakingOff,
    Flying,
    Landing,
}

/// Backend for a physical vehicle.
pub struct RealVehicle<L> {
    link: L,
    config: RealConfig,
    connected: bool,
    phase: Phase,
    telemetry: LinkTelemetry,
    telemetry_errors: u32,
}

impl<L: VehicleLink> RealVehicle<L> {
    pub fn new(link: L, config: RealConfig) -> Self {
        Self {
            link,
            config,
            connected: false,
            phase: Phase::Grounded,
            telemetry: LinkTelemetry::default(),
            telemetry_errors: 0,
        }
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Last successfully polled telemetry.
    pub fn last_telemetry(&self) -> LinkTelemetry {
        self.telemetry
    }

    /// Failed telemetry polls since connect.
    pub fn telemetry_errors(&self) -> u32 {
        self.telemetry_errors
    }

    fn require_connected(&self) -> Result<(), BackendError> {
        if self.connected {
            Ok(())
        } else {
            Err(BackendError::NotConnected)
        }
    }

    fn send(&mut self, command: &str) -> Result<(), BackendError> {
        self.link.send(command).map_err(|e| {
            log::warn!("vehicle rejected '{}': {:?}", command, e);
            BackendError::Link(e)
        })
    }

    fn poll(&mut self) -> bool {
        match self.link.telemetry() {
            Ok(t) => {
                self.telemetry = LinkTelemetry {
                    battery: t.battery.min(100),
                    ..t
                };
                true
            }
            Err(e) => {
                self.telemetry_errors = self.telemetry_errors.saturating_add(1);
                log::debug!("telemetry poll failed: {:?}", e);
                false
            }
        }
    }
}

/// Format an RC command in wire form.
pub fn format_rc(cmd: &FlightCommand) -> Result<String<MAX_COMMAND_LEN>, LinkError> {
    let mut out = String::new();
    write!(out, "rc {} {} {} {}", cmd.roll, cmd.pitch, cmd.throttle, cmd.yaw)
        .map_err(|_| LinkError::Rejected)?;
    Ok(out)
}

impl<L: VehicleLink> VehicleBackend for RealVehicle<L> {
    fn connect(&mut self) -> Result<(), BackendError> {
        self.send("command")?;
        self.connected = true;
        self.telemetry_errors = 0;
        self.poll();
        log::info!("vehicle connected, battery {}%", self.telemetry.battery);
        Ok(())
    }

    fn takeoff(&mut self) -> Result<(), BackendError> {
        self.require_connected()?;
        match self.phase {
            Phase::Grounded => {
                self.send("takeoff")?;
                self.phase = Phase::TakingOff;
                Ok(())
            }
            Phase::Flying => Err(BackendError::AlreadyFlying),
            Phase::TakingOff | Phase::Landing => Err(BackendError::Busy),
        }
    }

    fn land(&mut self) -> Result<(), BackendError> {
        self.require_connected()?;
        match self.phase {
            Phase::Flying => {
                self.send("land")?;
                self.phase = Phase::Landing;
                Ok(())
            }
            Phase::Grounded => Err(BackendError::NotFlying),
            Phase::TakingOff | Phase::Landing => Err(BackendError::Busy),
        }
    }

    fn emergency(&mut self) -> Result<(), BackendError> {
        self.require_connected()?;
        self.send("emergency")?;
        self.phase = Phase::Grounded;
        Ok(())
    }

    fn hover(&mut self) -> Result<(), BackendError> {
        self.require_connected()?;
        if self.phase != Phase::Flying {
            return Err(BackendError::NotFlying);
        }
        self.send("stop")
    }

    fn set_rc(&mut self, cmd: FlightCommand) -> Result<(), BackendError> {
        self.require_connected()?;
        if self.phase != Phase::Flying {
            return Err(BackendError::NotFlying);
        }
        let line = format_rc(&cmd)?;
        self.send(&line)
    }

    fn battery(&self) -> u8 {
        self.telemetry.battery
    }

    fn is_flying(&self) -> bool {
        self.phase != Phase::Grounded
    }

    fn advance(&mut self, _dt: f32) -> BackendEvent {
        if !self.connected || !self.poll() {
            return BackendEvent::None;
        }

        let height = self.telemetry.height_cm;
        match self.phase {
            Phase::TakingOff if height >= self.config.airborne_height_cm => {
                self.phase = Phase::Flying;
                BackendEvent::TakeoffComplete
            }
            Phase::Landing if height <= self.config.ground_height_cm => {
                self.phase = Phase::Grounded;
                BackendEvent::Landed
            }
            // The vehicle lands itself on an empty battery.
            Phase::Flying
                if self.telemetry.battery == 0 && height <= self.config.ground_height_cm =>
            {
                log::warn!("vehicle landed itself");
                self.phase = Phase::Grounded;
                BackendEvent::None
            }
            _ => BackendEvent::None,
        }
    }

    /// Height and heading from telemetry. The vehicle reports no horizontal
    /// position or velocity, so those stay zero.
    fn pose(&self) -> Option<Pose> {
        if !self.connected {
            return None;
        }
        Some(Pose {
            position: [0.0, 0.0, self.telemetry.height_cm.max(0) as f32 / 100.0],
            yaw_deg: wrap_degrees(self.telemetry.yaw_deg as f32),
            velocity: [0.0; 4],
        })
    }
}
