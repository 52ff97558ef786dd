//! Shaped-axis to RC-channel mapping configuration.
//!
//! Which stick drives which channel, and whether it is inverted, differs
//! between controllers and pilots. The assignment is a [`ChannelMap`] table;
//! two common presets are provided.

use crate::shaper::{Axis, ShapedInput, SpeedMultiplier};
use crate::types::{Channel, FlightCommand, FlightState, CHANNEL_LIMIT};

/// Source axis for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisBinding {
    pub axis: Axis,
    /// Negate the axis, so stick-away-from-body means forward/up.
    pub invert: bool,
}

impl AxisBinding {
    #[must_use]
    pub const fn new(axis: Axis, invert: bool) -> Self {
        Self { axis, invert }
    }
}

/// Channel-to-axis mapping configuration.
///
/// Customize this at compile-time by creating your own const.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMap {
    pub roll: AxisBinding,
    pub pitch: AxisBinding,
    pub throttle: AxisBinding,
    pub yaw: AxisBinding,
}

/// Mode 2: throttle and yaw on the left stick.
///
/// - Roll -> Right Stick X
/// - Pitch -> Right Stick Y (inverted)
/// - Throttle -> Left Stick Y (inverted)
/// - Yaw -> Left Stick X
pub const DEFAULT_CHANNEL_MAP: ChannelMap = ChannelMap {
    roll: AxisBinding::new(Axis::RightX, false),
    pitch: AxisBinding::new(Axis::RightY, true),
    throttle: AxisBinding::new(Axis::LeftY, true),
    yaw: AxisBinding::new(Axis::LeftX, false),
};

/// Mode 1: pitch on the left stick, throttle on the right.
pub const MODE_1_CHANNEL_MAP: ChannelMap = ChannelMap {
    roll: AxisBinding::new(Axis::RightX, false),
    pitch: AxisBinding::new(Axis::LeftY, true),
    throttle: AxisBinding::new(Axis::RightY, true),
    yaw: AxisBinding::new(Axis::LeftX, false),
};

impl Default for ChannelMap {
    fn default() -> Self {
        DEFAULT_CHANNEL_MAP
    }
}

impl ChannelMap {
    #[must_use]
    pub fn binding(&self, channel: Channel) -> AxisBinding {
        match channel {
            Channel::Roll => self.roll,
            Channel::Pitch => self.pitch,
            Channel::Throttle => self.throttle,
            Channel::Yaw => self.yaw,
        }
    }
}

/// Scale a shaped axis value in [-1, 1] to a channel value.
///
/// Truncates toward zero after scaling by `100 * speed`.
#[inline]
#[must_use]
pub fn axis_to_channel(value: f32, invert: bool, speed: SpeedMultiplier) -> i8 {
    let value = if invert { -value } else { value };
    // tenths * 10 == 100 * speed, kept integral so the scale is exact.
    let scale = (speed.tenths() as u16 * 10) as f32;
    let limit = CHANNEL_LIMIT as i32;
    ((value * scale) as i32).clamp(-limit, limit) as i8
}

/// Map shaped stick values to a [`FlightCommand`].
#[must_use]
pub fn map_axes(input: &ShapedInput, speed: SpeedMultiplier, map: &ChannelMap) -> FlightCommand {
    let mut cmd = FlightCommand::NEUTRAL;
    for channel in Channel::ALL {
        let binding = map.binding(channel);
        cmd.set(
            channel,
            axis_to_channel(input.axis(binding.axis), binding.invert, speed),
        );
    }
    cmd
}

/// Turns shaped input into RC commands, gated on flight state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandMapper {
    map: ChannelMap,
}

impl CommandMapper {
    #[must_use]
    pub fn new(map: ChannelMap) -> Self {
        Self { map }
    }

    #[must_use]
    pub fn channel_map(&self) -> &ChannelMap {
        &self.map
    }

    /// Map without gating.
    #[must_use]
    pub fn map(&self, input: &ShapedInput, speed: SpeedMultiplier) -> FlightCommand {
        map_axes(input, speed, &self.map)
    }

    /// Command for this tick, or `None` unless RC is enabled and flying.
    #[must_use]
    pub fn command(
        &self,
        input: &ShapedInput,
        speed: SpeedMultiplier,
        state: FlightState,
    ) -> Option<FlightCommand> {
        if input.rc_enabled && state.accepts_rc() {
            Some(self.map(input, speed))
        } else {
            None
        }
    }
}
