//! Control loop configuration.
//!
//! Customize at compile-time by creating your own const, starting from
//! [`DEFAULT_CONFIG`].

use embassy_time::Duration;

use crate::machine::{FlightPolicy, DEFAULT_FLIGHT_POLICY};
use crate::mapper::{ChannelMap, DEFAULT_CHANNEL_MAP};
use crate::shaper::{ActionBindings, ShaperConfig, DEFAULT_BINDINGS, DEFAULT_SHAPER_CONFIG};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeleopConfig {
    /// Control tick period (poll/render cadence).
    pub tick_interval: Duration,
    /// Minimum spacing between RC commands.
    pub command_interval: Duration,
    /// How long shutdown keeps the loop alive waiting for touchdown.
    pub shutdown_grace: Duration,
    /// Telemetry publish period.
    pub telemetry_interval: Duration,
    /// Expected leading report ID, for transports that prefix one.
    pub report_id: Option<u8>,
    pub shaper: ShaperConfig,
    pub bindings: ActionBindings,
    pub channel_map: ChannelMap,
    pub policy: FlightPolicy,
}

/// 60 Hz ticks, 20 Hz commands, 2 s landing grace.
pub const DEFAULT_CONFIG: TeleopConfig = TeleopConfig {
    tick_interval: Duration::from_hz(60),
    command_interval: Duration::from_millis(50),
    shutdown_grace: Duration::from_secs(2),
    telemetry_interval: Duration::from_secs(1),
    report_id: None,
    shaper: DEFAULT_SHAPER_CONFIG,
    bindings: DEFAULT_BINDINGS,
    channel_map: DEFAULT_CHANNEL_MAP,
    policy: DEFAULT_FLIGHT_POLICY,
};

impl Default for TeleopConfig {
    fn default() -> Self {
        DEFAULT_CONFIG
    }
}
