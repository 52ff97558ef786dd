//! Report decoder for the T1d's fixed-layout input report.
//!
//! ```text
//! byte  0-1   header (ignored)
//! byte  2-6   four 10-bit stick axes, packed big-endian: lx ly rx ry
//! byte  7     left trigger
//! byte  8     right trigger
//! byte  9     A B Menu X Y - L1 R1   (bits 0..7)
//! byte 10     C1 (bit 2), C2 (bit 3)
//! byte 11     d-pad (exact value)
//! ```

use crate::types::{AnalogStick, Buttons, ControllerState, DPad};

/// Minimum report length accepted by [`decode`].
pub const REPORT_LEN: usize = 12;

/// Input-report identifier some transports prepend to the report.
pub const INPUT_REPORT_ID: u8 = 0xA1;

/// Bits of byte 9 that carry buttons (bit 5 is unused).
const BYTE9_MASK: u8 = 0b1101_1111;

/// Bits of byte 10 that carry buttons (C1, C2).
const BYTE10_MASK: u8 = 0b0000_1100;

/// Reason a report was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MalformedReport {
    /// Fewer than [`REPORT_LEN`] bytes.
    TooShort { len: usize },
    /// Prefixed report ID did not match the expected input report.
    ReportIdMismatch { expected: u8, found: u8 },
}

/// Decode a raw report into a [`ControllerState`].
///
/// Bytes past [`REPORT_LEN`] are ignored.
///
/// # Example
///
/// ```
/// use t1d_proto::{decode, Buttons};
///
/// let report = [0, 0, 0x80, 0x20, 0x02, 0x00, 0x00, 0, 0, 0x01, 0, 0];
/// let state = decode(&report).unwrap();
/// assert_eq!(state.left_stick.x, 512);
/// assert!(state.buttons.is_pressed(Buttons::A));
/// ```
pub fn decode(report: &[u8]) -> Result<ControllerState, MalformedReport> {
    if report.len() < REPORT_LEN {
        return Err(MalformedReport::TooShort { len: report.len() });
    }

    let b = report;
    let lx = ((b[2] as u16) << 2) | (b[3] as u16 >> 6);
    let ly = (((b[3] & 0x3F) as u16) << 4) | (b[4] as u16 >> 4);
    let rx = (((b[4] & 0x0F) as u16) << 6) | (b[5] as u16 >> 2);
    let ry = (((b[5] & 0x03) as u16) << 8) | b[6] as u16;

    let buttons = Buttons((b[9] & BYTE9_MASK) as u16 | ((b[10] & BYTE10_MASK) as u16) << 8);

    Ok(ControllerState {
        left_stick: AnalogStick::new(lx, ly),
        right_stick: AnalogStick::new(rx, ry),
        left_trigger: b[7],
        right_trigger: b[8],
        buttons,
        dpad: DPad::from_raw(b[11]),
    })
}

/// Decode a report that carries a leading report-ID byte.
///
/// Reports with a different ID are rejected without being decoded.
pub fn decode_prefixed(
    report: &[u8],
    expected_id: u8,
) -> Result<ControllerState, MalformedReport> {
    let (&found, rest) = report
        .split_first()
        .ok_or(MalformedReport::TooShort { len: 0 })?;

    if found != expected_id {
        return Err(MalformedReport::ReportIdMismatch {
            expected: expected_id,
            found,
        });
    }

    decode(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with(f: impl FnOnce(&mut [u8; REPORT_LEN])) -> [u8; REPORT_LEN] {
        let mut report = [0u8; REPORT_LEN];
        f(&mut report);
        report
    }

    #[test]
    fn test_decode_all_ones_axes() {
        let report = report_with(|r| r[2..=6].fill(0xFF));
        let state = decode(&report).unwrap();
        assert_eq!(state.left_stick, AnalogStick::new(1023, 1023));
        assert_eq!(state.right_stick, AnalogStick::new(1023, 1023));
    }

    #[test]
    fn test_decode_all_zero() {
        let state = decode(&[0u8; REPORT_LEN]).unwrap();
        assert_eq!(state.left_stick, AnalogStick::new(0, 0));
        assert_eq!(state.right_stick, AnalogStick::new(0, 0));
        assert_eq!(state.buttons, Buttons::NONE);
        assert_eq!(state.dpad, DPad::Centered);
    }

    #[test]
    fn test_decode_too_short() {
        for len in 0..REPORT_LEN {
            let report = [0xFFu8; REPORT_LEN];
            assert_eq!(
                decode(&report[..len]),
                Err(MalformedReport::TooShort { len })
            );
        }
    }

    #[test]
    fn test_decode_is_deterministic() {
        let report = [0x11, 0x22, 0x9C, 0x5A, 0xC3, 0x7E, 0x42, 10, 200, 0xDB, 0x0C, 0x05];
        assert_eq!(decode(&report), decode(&report));
    }

    #[test]
    fn test_decode_axis_bit_packing() {
        // lx=0x2AA ly=0x155 rx=0x3F0 ry=0x00F
        // bits: 1010101010 0101010101 1111110000 0000001111
        let report = report_with(|r| {
            r[2] = 0b1010_1010;
            r[3] = 0b1001_0101;
            r[4] = 0b0101_1111;
            r[5] = 0b1100_0000;
            r[6] = 0b0000_1111;
        });
        let state = decode(&report).unwrap();
        assert_eq!(state.left_stick.x, 0x2AA);
        assert_eq!(state.left_stick.y, 0x155);
        assert_eq!(state.right_stick.x, 0x3F0);
        assert_eq!(state.right_stick.y, 0x00F);
    }

    #[test]
    fn test_decode_triggers_and_buttons() {
        let report = report_with(|r| {
            r[7] = 17;
            r[8] = 255;
            r[9] = 0xFF;
            r[10] = 0xFF;
        });
        let state = decode(&report).unwrap();
        assert_eq!(state.left_trigger, 17);
        assert_eq!(state.right_trigger, 255);
        // Unused bits never leak into the button set.
        assert_eq!(state.buttons, Buttons::ALL);
    }

    #[test]
    fn test_decode_individual_buttons() {
        let cases = [
            (9, 0x01, Buttons::A),
            (9, 0x02, Buttons::B),
            (9, 0x04, Buttons::MENU),
            (9, 0x08, Buttons::X),
            (9, 0x10, Buttons::Y),
            (9, 0x40, Buttons::L1),
            (9, 0x80, Buttons::R1),
            (10, 0x04, Buttons::C1),
            (10, 0x08, Buttons::C2),
        ];
        for (byte, bit, button) in cases {
            let report = report_with(|r| r[byte] = bit);
            assert_eq!(decode(&report).unwrap().buttons, button);
        }
    }

    #[test]
    fn test_decode_dpad() {
        let report = report_with(|r| r[11] = 0x07);
        assert_eq!(decode(&report).unwrap().dpad, DPad::Left);
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut long = [0u8; 20];
        long[9] = 0x02;
        long[15] = 0xFF;
        assert_eq!(decode(&long).unwrap().buttons, Buttons::B);
    }

    #[test]
    fn test_decode_prefixed_checks_report_id() {
        let mut prefixed = [0u8; REPORT_LEN + 1];
        prefixed[0] = INPUT_REPORT_ID;
        prefixed[1 + 9] = 0x01;
        assert_eq!(
            decode_prefixed(&prefixed, INPUT_REPORT_ID).unwrap().buttons,
            Buttons::A
        );

        prefixed[0] = 0x02;
        assert_eq!(
            decode_prefixed(&prefixed, INPUT_REPORT_ID),
            Err(MalformedReport::ReportIdMismatch {
                expected: INPUT_REPORT_ID,
                found: 0x02
            })
        );
    }

    #[test]
    fn test_decode_prefixed_empty_and_short() {
        assert_eq!(
            decode_prefixed(&[], INPUT_REPORT_ID),
            Err(MalformedReport::TooShort { len: 0 })
        );
        assert_eq!(
            decode_prefixed(&[INPUT_REPORT_ID, 0, 0], INPUT_REPORT_ID),
            Err(MalformedReport::TooShort { len: 2 })
        );
    }
}
