//! Kinematic quadrotor simulator.
//!
//! Integrates position, yaw and battery with simple first-order kinematics.
//! Velocities are fractions of full rate; at full rate the vehicle moves at
//! 1 m/s and yaws at [`SimConfig::max_yaw_rate`] degrees per second.

use core::f32::consts::PI;

use heapless::Deque;
#[cfg(not(any(test, feature = "std")))]
use micromath::F32Ext;

use crate::backend::{BackendError, BackendEvent, VehicleBackend};
use crate::types::{wrap_degrees, FlightCommand, Pose};

/// Number of RC commands kept in [`Simulator::history`].
pub const HISTORY_LEN: usize = 32;

/// Simulator tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SimConfig {
    /// Hover height reached by takeoff, meters.
    pub target_height: f32,
    /// Climb rate during takeoff, m/s.
    pub takeoff_speed: f32,
    /// Descent rate during landing, m/s.
    pub landing_speed: f32,
    /// Battery drain while flying, percent per second.
    pub battery_drain: f32,
    /// Yaw rate at full stick, degrees per second.
    pub max_yaw_rate: f32,
    /// Battery at startup, percent.
    pub initial_battery: f32,
}

pub const DEFAULT_SIM_CONFIG: SimConfig = SimConfig {
    target_height: 1.0,
    takeoff_speed: 0.5,
    landing_speed: 0.5,
    battery_drain: 0.01,
    max_yaw_rate: 30.0,
    initial_battery: 100.0,
};

impl Default for SimConfig {
    fn default() -> Self {
        DEFAULT_SIM_CONFIG
    }
}

/// Simulated vehicle phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SimPhase {
    #[default]
    Disconnected,
    Grounded,
    TakingOff,
    Flying,
    Landing,
}

/// An accepted RC command and the simulation time it arrived.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandRecord {
    /// Seconds since the simulator was created.
    pub at: f32,
    pub command: FlightCommand,
}

/// Kinematic simulator backend.
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimConfig,
    phase: SimPhase,
    position: [f32; 3],
    rotation: f32,
    velocity: [f32; 4],
    battery: f32,
    elapsed: f32,
    history: Deque<CommandRecord, HISTORY_LEN>,
}

impl Simulator {
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        Self {
            battery: config.initial_battery.clamp(0.0, 100.0),
            config,
            phase: SimPhase::Disconnected,
            position: [0.0; 3],
            rotation: 0.0,
            velocity: [0.0; 4],
            elapsed: 0.0,
            history: Deque::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    /// x, y, z in meters.
    #[must_use]
    pub fn position(&self) -> [f32; 3] {
        self.position
    }

    /// Heading in degrees, [0, 360).
    #[must_use]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// roll, pitch, throttle, yaw as fractions of full rate.
    #[must_use]
    pub fn velocity(&self) -> [f32; 4] {
        self.velocity
    }

    /// Unrounded battery level in percent.
    #[must_use]
    pub fn battery_level(&self) -> f32 {
        self.battery
    }

    /// Most recent accepted RC commands, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &CommandRecord> {
        self.history.iter()
    }

    fn record(&mut self, command: FlightCommand) {
        if self.history.is_full() {
            self.history.pop_front();
        }
        // Cannot fail: a slot was freed above.
        let _ = self.history.push_back(CommandRecord {
            at: self.elapsed,
            command,
        });
    }

    fn ground(&mut self) {
        self.position[2] = 0.0;
        self.velocity = [0.0; 4];
        self.phase = SimPhase::Grounded;
    }

    fn integrate_flight(&mut self, dt: f32) {
        self.battery = (self.battery - self.config.battery_drain * dt).max(0.0);

        let [v_roll, v_pitch, v_throttle, v_yaw] = self.velocity;
        let theta = self.rotation * (PI / 180.0);
        let (sin, cos) = (theta.sin(), theta.cos());

        self.position[0] += (v_pitch * cos + v_roll * sin) * dt;
        self.position[1] += (v_pitch * sin - v_roll * cos) * dt;
        self.position[2] += v_throttle * dt;
        if self.position[2] <= 0.0 {
            self.position[2] = 0.0;
            self.velocity[2] = 0.0;
        }

        self.rotation = wrap_degrees(self.rotation + v_yaw * self.config.max_yaw_rate * dt);
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(DEFAULT_SIM_CONFIG)
    }
}

impl VehicleBackend for Simulator {
    fn connect(&mut self) -> Result<(), BackendError> {
        if self.phase == SimPhase::Disconnected {
            self.phase = SimPhase::Grounded;
            log::info!("simulator connected, battery {}%", self.battery());
        }
        Ok(())
    }

    fn takeoff(&mut self) -> Result<(), BackendError> {
        match self.phase {
            SimPhase::Disconnected => Err(BackendError::NotConnected),
            SimPhase::Flying => Err(BackendError::AlreadyFlying),
            SimPhase::TakingOff | SimPhase::Landing => Err(BackendError::Busy),
            SimPhase::Grounded => {
                self.velocity = [0.0; 4];
                self.phase = SimPhase::TakingOff;
                Ok(())
            }
        }
    }

    fn land(&mut self) -> Result<(), BackendError> {
        match self.phase {
            SimPhase::Disconnected => Err(BackendError::NotConnected),
            SimPhase::Grounded => Err(BackendError::NotFlying),
            SimPhase::TakingOff | SimPhase::Landing => Err(BackendError::Busy),
            SimPhase::Flying => {
                self.velocity = [0.0; 4];
                self.phase = SimPhase::Landing;
                Ok(())
            }
        }
    }

    fn emergency(&mut self) -> Result<(), BackendError> {
        if self.phase == SimPhase::Disconnected {
            return Err(BackendError::NotConnected);
        }
        self.ground();
        Ok(())
    }

    fn set_rc(&mut self, cmd: FlightCommand) -> Result<(), BackendError> {
        match self.phase {
            SimPhase::Flying => {
                self.velocity = cmd.as_unit();
                self.record(cmd);
                Ok(())
            }
            SimPhase::Disconnected => Err(BackendError::NotConnected),
            SimPhase::TakingOff | SimPhase::Landing => Err(BackendError::Busy),
            SimPhase::Grounded => Err(BackendError::NotFlying),
        }
    }

    /// Truncated, so anything under 1% reads as empty.
    fn battery(&self) -> u8 {
        self.battery.clamp(0.0, 100.0) as u8
    }

    fn is_flying(&self) -> bool {
        matches!(
            self.phase,
            SimPhase::TakingOff | SimPhase::Flying | SimPhase::Landing
        )
    }

    fn advance(&mut self, dt: f32) -> BackendEvent {
        let dt = dt.max(0.0);
        self.elapsed += dt;

        match self.phase {
            SimPhase::TakingOff => {
                self.position[2] += self.config.takeoff_speed * dt;
                if self.position[2] >= self.config.target_height {
                    self.position[2] = self.config.target_height;
                    self.phase = SimPhase::Flying;
                    return BackendEvent::TakeoffComplete;
                }
            }
            SimPhase::Landing => {
                self.position[2] -= self.config.landing_speed * dt;
                if self.position[2] <= 0.0 {
                    self.ground();
                    return BackendEvent::Landed;
                }
            }
            SimPhase::Flying => self.integrate_flight(dt),
            SimPhase::Disconnected | SimPhase::Grounded => self.velocity = [0.0; 4],
        }
        BackendEvent::None
    }

    fn pose(&self) -> Option<Pose> {
        Some(Pose {
            position: self.position,
            yaw_deg: self.rotation,
            velocity: self.velocity,
        })
    }
}
