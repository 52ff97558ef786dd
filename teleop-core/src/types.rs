//! Shared flight types: FlightCommand, Channel, FlightState, Action, Pose.

/// Largest magnitude of any RC channel.
pub const CHANNEL_LIMIT: i8 = 100;

/// One of the four RC channels, in the order the vehicle expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Left/right.
    Roll = 0,
    /// Forward/back.
    Pitch = 1,
    /// Up/down.
    Throttle = 2,
    Yaw = 3,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Roll, Channel::Pitch, Channel::Throttle, Channel::Yaw];
}

/// Four-channel RC command, each in [-100, 100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlightCommand {
    pub roll: i8,
    pub pitch: i8,
    pub throttle: i8,
    pub yaw: i8,
}

impl FlightCommand {
    /// All channels centered (hover).
    pub const NEUTRAL: Self = Self {
        roll: 0,
        pitch: 0,
        throttle: 0,
        yaw: 0,
    };

    /// Build a command, clamping every channel to [-100, 100].
    #[must_use]
    pub fn new(roll: i8, pitch: i8, throttle: i8, yaw: i8) -> Self {
        let clamp = |v: i8| v.clamp(-CHANNEL_LIMIT, CHANNEL_LIMIT);
        Self {
            roll: clamp(roll),
            pitch: clamp(pitch),
            throttle: clamp(throttle),
            yaw: clamp(yaw),
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, channel: Channel) -> i8 {
        match channel {
            Channel::Roll => self.roll,
            Channel::Pitch => self.pitch,
            Channel::Throttle => self.throttle,
            Channel::Yaw => self.yaw,
        }
    }

    #[inline]
    pub fn set(&mut self, channel: Channel, value: i8) {
        let value = value.clamp(-CHANNEL_LIMIT, CHANNEL_LIMIT);
        match channel {
            Channel::Roll => self.roll = value,
            Channel::Pitch => self.pitch = value,
            Channel::Throttle => self.throttle = value,
            Channel::Yaw => self.yaw = value,
        }
    }

    /// Channels as fractions of full deflection, in [-1.0, 1.0].
    #[must_use]
    pub fn as_unit(&self) -> [f32; 4] {
        Channel::ALL.map(|c| self.get(c) as f32 / CHANNEL_LIMIT as f32)
    }
}

/// Operational state of the vehicle as tracked by the flight state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlightState {
    /// No backend connection yet.
    #[default]
    Idle,
    /// Connected and on the ground.
    Connected,
    TakingOff,
    Flying,
    Landing,
    /// Motors cut; becomes `Connected` on the next advance.
    EmergencyStopped,
}

impl FlightState {
    /// Vehicle is off the ground or on its way up or down.
    #[inline]
    #[must_use]
    pub const fn is_airborne(self) -> bool {
        matches!(
            self,
            FlightState::TakingOff | FlightState::Flying | FlightState::Landing
        )
    }

    /// RC commands are only accepted in this state.
    #[inline]
    #[must_use]
    pub const fn accepts_rc(self) -> bool {
        matches!(self, FlightState::Flying)
    }
}

/// Discrete operation requested of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    Connect,
    Takeoff,
    Land,
    Emergency,
    Hover,
    SetRc,
}

/// Vehicle position and attitude estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pose {
    /// x, y, z in meters; z is altitude above the takeoff point.
    pub position: [f32; 3],
    /// Yaw in degrees, [0, 360).
    pub yaw_deg: f32,
    /// roll, pitch, throttle, yaw as fractions of full rate.
    pub velocity: [f32; 4],
}

/// Wrap an angle in degrees into [0, 360).
#[inline]
#[must_use]
pub fn wrap_degrees(deg: f32) -> f32 {
    let wrapped = deg % 360.0;
    let wrapped = if wrapped < 0.0 { wrapped + 360.0 } else { wrapped };
    // -tiny + 360.0 rounds to 360.0 in f32
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_new_clamps() {
        let cmd = FlightCommand::new(-128, 127, 50, -100);
        assert_eq!(
            cmd,
            FlightCommand {
                roll: -100,
                pitch: 100,
                throttle: 50,
                yaw: -100,
            }
        );
    }

    #[test]
    fn test_command_channel_access() {
        let mut cmd = FlightCommand::NEUTRAL;
        cmd.set(Channel::Throttle, 120);
        assert_eq!(cmd.get(Channel::Throttle), 100);
        assert_eq!(cmd.as_unit(), [0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_airborne_states() {
        assert!(FlightState::TakingOff.is_airborne());
        assert!(FlightState::Flying.is_airborne());
        assert!(FlightState::Landing.is_airborne());
        assert!(!FlightState::Connected.is_airborne());
        assert!(!FlightState::EmergencyStopped.is_airborne());
        assert!(FlightState::Flying.accepts_rc());
        assert!(!FlightState::TakingOff.accepts_rc());
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(0.0), 0.0);
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert_eq!(wrap_degrees(370.0), 10.0);
        assert_eq!(wrap_degrees(-90.0), 270.0);
        let tiny = wrap_degrees(-1.0e-6);
        assert!((0.0..360.0).contains(&tiny));
    }
}
