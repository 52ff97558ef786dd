//! Builder API for constructing raw T1d reports.
//!
//! Packs a [`ControllerState`] back into the 12-byte wire layout that
//! [`decode`](crate::decode) reads. Useful for scripted controllers and tests.
//!
//! # Example
//!
//! ```
//! use t1d_proto::{decode, Buttons, ReportBuilder};
//!
//! let report = ReportBuilder::new()
//!     .buttons(Buttons::A | Buttons::B)
//!     .left_stick(100, 900)
//!     .left_trigger(128)
//!     .build();
//!
//! let state = decode(&report).unwrap();
//! assert_eq!(state.left_stick.x, 100);
//! assert!(state.buttons.is_pressed(Buttons::B));
//! ```

use crate::decoder::{INPUT_REPORT_ID, REPORT_LEN};
use crate::types::{AnalogStick, Buttons, ControllerState, DPad, AXIS_MAX};

/// Header bytes the controller puts in front of the payload.
const REPORT_HEADER: [u8; 2] = [INPUT_REPORT_ID, 0xC5];

/// Builder for raw controller reports.
///
/// Starts from [`ControllerState::neutral()`]. Axis values above 1023 are
/// clamped.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    state: ControllerState,
}

impl ReportBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ControllerState::neutral(),
        }
    }

    /// Start from an existing snapshot.
    #[must_use]
    pub fn from_state(state: ControllerState) -> Self {
        Self { state }
    }

    /// Set the button state.
    #[must_use]
    pub fn buttons(mut self, buttons: Buttons) -> Self {
        self.state.buttons = buttons;
        self
    }

    /// Set the left stick position (raw 10-bit).
    #[must_use]
    pub fn left_stick(mut self, x: u16, y: u16) -> Self {
        self.state.left_stick = AnalogStick::new(x.min(AXIS_MAX), y.min(AXIS_MAX));
        self
    }

    /// Set the right stick position (raw 10-bit).
    #[must_use]
    pub fn right_stick(mut self, x: u16, y: u16) -> Self {
        self.state.right_stick = AnalogStick::new(x.min(AXIS_MAX), y.min(AXIS_MAX));
        self
    }

    /// Set the left trigger value.
    #[must_use]
    pub fn left_trigger(mut self, value: u8) -> Self {
        self.state.left_trigger = value;
        self
    }

    /// Set the right trigger value.
    #[must_use]
    pub fn right_trigger(mut self, value: u8) -> Self {
        self.state.right_trigger = value;
        self
    }

    /// Set the d-pad position.
    #[must_use]
    pub fn dpad(mut self, dpad: DPad) -> Self {
        self.state.dpad = dpad;
        self
    }

    /// Get the built state without packing it.
    #[must_use]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Pack the report into its wire layout.
    #[must_use]
    pub fn build(&self) -> [u8; REPORT_LEN] {
        pack(&self.state)
    }

    /// Pack the report with a leading report-ID byte.
    #[must_use]
    pub fn build_prefixed(&self, report_id: u8) -> [u8; REPORT_LEN + 1] {
        let mut out = [0u8; REPORT_LEN + 1];
        out[0] = report_id;
        out[1..].copy_from_slice(&pack(&self.state));
        out
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Pack a snapshot into the 12-byte report layout.
#[must_use]
pub fn pack(state: &ControllerState) -> [u8; REPORT_LEN] {
    let lx = state.left_stick.x.min(AXIS_MAX);
    let ly = state.left_stick.y.min(AXIS_MAX);
    let rx = state.right_stick.x.min(AXIS_MAX);
    let ry = state.right_stick.y.min(AXIS_MAX);

    let mut r = [0u8; REPORT_LEN];
    r[..2].copy_from_slice(&REPORT_HEADER);
    r[2] = (lx >> 2) as u8;
    r[3] = (((lx & 0x03) << 6) | (ly >> 4)) as u8;
    r[4] = (((ly & 0x0F) << 4) | (rx >> 6)) as u8;
    r[5] = (((rx & 0x3F) << 2) | (ry >> 8)) as u8;
    r[6] = (ry & 0xFF) as u8;
    r[7] = state.left_trigger;
    r[8] = state.right_trigger;
    r[9] = (state.buttons.raw() & 0xFF) as u8;
    r[10] = (state.buttons.raw() >> 8) as u8;
    r[11] = state.dpad.raw();
    r
}
