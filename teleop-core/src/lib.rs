//! Platform-agnostic quadrotor teleoperation core.
//!
//! This crate turns decoded controller reports into flight commands and
//! drives a flight state machine over a pluggable vehicle backend. It has no
//! platform-specific dependencies and runs both in `no_std` environments and
//! on host for testing.
//!
//! # Overview
//!
//! - [`shaper`]: deadband, smoothing, button edges, speed ([`InputShaper`])
//! - [`mapper`]: axis-to-channel table ([`ChannelMap`], [`CommandMapper`])
//! - [`machine`]: flight state machine ([`FlightStateMachine`])
//! - [`backend`]: vehicle trait ([`VehicleBackend`])
//! - [`sim`]: kinematic simulator backend ([`Simulator`])
//! - [`real`]: SDK-link backend for a physical vehicle ([`RealVehicle`])
//! - [`gate`]: command rate limit ([`CommandGate`])
//! - [`input`]: controller report source trait ([`ReportSource`])
//! - [`pilot`]: the per-tick pipeline ([`TeleopLoop`])
//! - [`telemetry`]: snapshot and sink ([`Telemetry`], [`TelemetrySink`])
//! - [`config`]: compile-time configuration ([`TeleopConfig`])
//!
//! # Example
//!
//! ```rust
//! use teleop_core::{FlightState, FlightStateMachine, Simulator, DEFAULT_FLIGHT_POLICY};
//!
//! let mut sm = FlightStateMachine::new(Simulator::default(), DEFAULT_FLIGHT_POLICY);
//! sm.connect().unwrap();
//! sm.takeoff().unwrap();
//! while sm.advance(0.25) != FlightState::Flying {}
//!
//! // RC is accepted only while flying.
//! assert!(sm.set_rc(Default::default()).is_ok());
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod backend;
pub mod config;
pub mod gate;
pub mod input;
pub mod machine;
pub mod mapper;
pub mod pilot;
pub mod real;
pub mod shaper;
pub mod sim;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use backend::{BackendError, BackendEvent, LinkError, VehicleBackend};
pub use config::{TeleopConfig, DEFAULT_CONFIG};
pub use gate::CommandGate;
pub use input::{ConnectionStatus, InputError, RawReport, ReportSource};
pub use machine::{ControlError, FlightPolicy, FlightStateMachine, DEFAULT_FLIGHT_POLICY};
pub use mapper::{AxisBinding, ChannelMap, CommandMapper, DEFAULT_CHANNEL_MAP, MODE_1_CHANNEL_MAP};
pub use pilot::{TeleopLoop, TickReport};
pub use real::{LinkTelemetry, RealConfig, RealVehicle, VehicleLink, DEFAULT_REAL_CONFIG};
pub use shaper::{
    ActionBindings, Actions, Axis, ButtonAction, EdgeState, InputSample, InputShaper,
    ShapedInput, ShaperConfig, SpeedMultiplier, DEFAULT_BINDINGS, DEFAULT_SHAPER_CONFIG,
};
pub use sim::{CommandRecord, SimConfig, SimPhase, Simulator, DEFAULT_SIM_CONFIG};
pub use telemetry::{Telemetry, TelemetryError, TelemetrySink};
pub use types::{Action, Channel, FlightCommand, FlightState, Pose, CHANNEL_LIMIT};
