//! Host application for T1d teleoperation.
//!
//! Wires the [`teleop_core`] pipeline into an Embassy executor on the host:
//!
//! - [`input`]: latest-report slot fed by the controller transport, and a
//!   scripted controller for running without hardware
//! - [`output`]: log-based telemetry sink
//! - [`runner`]: fixed-cadence control loop and shutdown landing
//!
//! # Features
//!
//! - **`mode-2`** (default): throttle and yaw on the left stick
//! - **`mode-1`**: pitch and yaw on the left stick, throttle on the right
//!
//! Set the log level with `RUST_LOG`.

// Ensure mutually exclusive stick layout features
#[cfg(all(feature = "mode-1", feature = "mode-2"))]
compile_error!("Cannot enable both `mode-1` and `mode-2` features - they assign the sticks differently");

pub mod input;
pub mod output;
pub mod runner;

use teleop_core::{ChannelMap, TeleopConfig, DEFAULT_CONFIG};

// Re-export core types for convenience
pub use teleop_core::{
    ConnectionStatus, FlightCommand, FlightState, ReportSource, Simulator, TeleopLoop, Telemetry,
    TelemetrySink, VehicleBackend,
};

pub use input::{ReportSlot, ScriptStep, ScriptedController, SlotReader};
pub use output::LogTelemetrySink;
pub use runner::{land_and_release, run};

/// Stick layout selected at build time.
#[cfg(feature = "mode-1")]
pub const CHANNEL_MAP: ChannelMap = teleop_core::MODE_1_CHANNEL_MAP;

/// Stick layout selected at build time.
#[cfg(not(feature = "mode-1"))]
pub const CHANNEL_MAP: ChannelMap = teleop_core::DEFAULT_CHANNEL_MAP;

/// Application configuration.
pub const CONFIG: TeleopConfig = TeleopConfig {
    channel_map: CHANNEL_MAP,
    ..DEFAULT_CONFIG
};
