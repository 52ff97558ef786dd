//! Controller report types: Buttons, AnalogStick, DPad, ControllerState.

use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// Raw stick value at rest.
pub const AXIS_CENTER: u16 = 512;

/// Largest raw stick value (10-bit).
pub const AXIS_MAX: u16 = 1023;

/// Button state represented as a bitfield.
///
/// The low byte mirrors report byte 9 and the high byte mirrors report
/// byte 10, so decoding is a mask and a shift.
///
/// # Example
///
/// ```
/// use t1d_proto::Buttons;
///
/// let buttons = Buttons::A | Buttons::L1;
/// assert!(buttons.contains(Buttons::A));
/// assert!(buttons.contains(Buttons::L1));
/// assert!(!buttons.contains(Buttons::B));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons(pub u16);

impl Buttons {
    pub const A: Self = Self(1 << 0);
    pub const B: Self = Self(1 << 1);
    pub const MENU: Self = Self(1 << 2);
    pub const X: Self = Self(1 << 3);
    pub const Y: Self = Self(1 << 4);
    pub const L1: Self = Self(1 << 6);
    pub const R1: Self = Self(1 << 7);
    pub const C1: Self = Self(1 << 10);
    pub const C2: Self = Self(1 << 11);

    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    /// Every button the T1d reports.
    pub const ALL: Self = Self(
        Self::A.0
            | Self::B.0
            | Self::MENU.0
            | Self::X.0
            | Self::Y.0
            | Self::L1.0
            | Self::R1.0
            | Self::C1.0
            | Self::C2.0,
    );

    /// Check if the given button(s) are pressed.
    #[inline]
    #[must_use]
    pub const fn contains(self, button: Buttons) -> bool {
        (self.0 & button.0) == button.0
    }

    /// Check if the given button is pressed (alias for contains).
    #[inline]
    #[must_use]
    pub const fn is_pressed(self, button: Buttons) -> bool {
        self.contains(button)
    }

    /// Set or clear button(s).
    #[inline]
    pub fn set(&mut self, button: Buttons, pressed: bool) {
        if pressed {
            self.0 |= button.0;
        } else {
            self.0 &= !button.0;
        }
    }

    /// Buttons pressed in `self` that were released in `previous`.
    #[inline]
    #[must_use]
    pub const fn rising_since(self, previous: Buttons) -> Buttons {
        Buttons(self.0 & !previous.0)
    }

    /// Get the raw u16 value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Check if no buttons are pressed.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Buttons {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Buttons {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for Buttons {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for Buttons {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

/// Analog stick with raw 10-bit X/Y axes.
///
/// Range: [0, 1023], center 512.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnalogStick {
    pub x: u16,
    pub y: u16,
}

impl AnalogStick {
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    pub const CENTERED: Self = Self {
        x: AXIS_CENTER,
        y: AXIS_CENTER,
    };

    /// Both axes scaled to [-1.0, 1.0].
    #[inline]
    #[must_use]
    pub fn normalized(self) -> (f32, f32) {
        (normalize_axis(self.x), normalize_axis(self.y))
    }
}

impl Default for AnalogStick {
    fn default() -> Self {
        Self::CENTERED
    }
}

/// Scale a raw 10-bit axis value to [-1.0, 1.0] around [`AXIS_CENTER`].
///
/// Full deflection towards zero maps to exactly -1.0; the top of the range
/// lands one step short of 1.0.
#[inline]
#[must_use]
pub fn normalize_axis(raw: u16) -> f32 {
    let centered = raw.min(AXIS_MAX) as f32 - AXIS_CENTER as f32;
    (centered / AXIS_CENTER as f32).clamp(-1.0, 1.0)
}

/// Directional pad position. The T1d only reports the four cardinal
/// directions; diagonals and anything unknown read as centered.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DPad {
    #[default]
    Centered,
    Up,
    Right,
    Down,
    Left,
}

impl DPad {
    /// Decode the d-pad byte by exact value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0x01 => DPad::Up,
            0x03 => DPad::Right,
            0x05 => DPad::Down,
            0x07 => DPad::Left,
            _ => DPad::Centered,
        }
    }

    /// Raw byte value for this position.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        match self {
            DPad::Centered => 0x00,
            DPad::Up => 0x01,
            DPad::Right => 0x03,
            DPad::Down => 0x05,
            DPad::Left => 0x07,
        }
    }
}

/// Complete controller snapshot decoded from one report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerState {
    pub left_stick: AnalogStick,
    pub right_stick: AnalogStick,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub buttons: Buttons,
    pub dpad: DPad,
}

impl ControllerState {
    /// Sticks centered, triggers released, nothing pressed.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            left_stick: AnalogStick::CENTERED,
            right_stick: AnalogStick::CENTERED,
            left_trigger: 0,
            right_trigger: 0,
            buttons: Buttons::NONE,
            dpad: DPad::Centered,
        }
    }

    /// The four stick axes normalized, in `[lx, ly, rx, ry]` order.
    #[must_use]
    pub fn normalized_axes(&self) -> [f32; 4] {
        let (lx, ly) = self.left_stick.normalized();
        let (rx, ry) = self.right_stick.normalized();
        [lx, ly, rx, ry]
    }
}
