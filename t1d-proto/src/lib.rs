//! GameSir T1d report types, decoding, and building.
//!
//! This crate provides everything needed to turn the controller's raw input
//! report into a typed snapshot:
//!
//! - **Types**: Core data structures for representing controller state
//!   - [`Buttons`] - Button state bitfield
//!   - [`AnalogStick`] - Raw 10-bit stick position
//!   - [`DPad`] - Directional pad position
//!   - [`ControllerState`] - Complete controller snapshot
//!
//! - **Decoding**: Parse incoming reports
//!   - [`decode()`] - Decode a bare 12-byte report
//!   - [`decode_prefixed()`] - Decode a report with a leading report ID
//!   - [`MalformedReport`] - Why a report was rejected
//!
//! - **Building**: Produce raw reports
//!   - [`ReportBuilder`] - Fluent builder API
//!
//! # Report Format
//!
//! ```text
//! [hdr][hdr][lx ly rx ry packed in 5 bytes][lt][rt][buttons][buttons2][dpad]
//! ```
//!
//! Sticks are 10-bit unsigned (0-1023, center 512), triggers 8-bit.
//!
//! # Example
//!
//! ```
//! use t1d_proto::{decode, Buttons, DPad, ReportBuilder};
//!
//! let report = ReportBuilder::new()
//!     .buttons(Buttons::L1)
//!     .dpad(DPad::Up)
//!     .build();
//!
//! let state = decode(&report).unwrap();
//! assert!(state.buttons.is_pressed(Buttons::L1));
//! assert_eq!(state.dpad, DPad::Up);
//! assert!(decode(&report[..11]).is_err());
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

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod builder;
pub mod decoder;
pub mod types;

// Re-export types at crate root for convenience
pub use builder::{pack, ReportBuilder};
pub use decoder::{decode, decode_prefixed, MalformedReport, INPUT_REPORT_ID, REPORT_LEN};
pub use types::{
    normalize_axis, AnalogStick, Buttons, ControllerState, DPad, AXIS_CENTER, AXIS_MAX,
};
