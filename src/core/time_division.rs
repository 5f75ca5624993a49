/*!
`TimeDivision` tells a reader what a delta-time tick means: either a fraction of a quarter note
(PPQN, the common case) or a fraction of a SMPTE timecode second (PPS). It is parsed once from the
header chunk's `division` field and feeds the node map ([`crate::core::TimeSpecification`]), which
needs `pulses-per-quarter`/`pulses-per-second` to convert ticks into musical time.
!*/

use crate::error::{self, LibResult};
use crate::scribe::Scribe;
use snafu::{ensure, ResultExt};
use std::io::Write;

const DIVISION_TYPE_BIT: u16 = 0b1000_0000_0000_0000;

/// The SMPTE frame rates the wire format can express. `N29` is the drop-frame rate and always
/// means 29.97 fps to callers, never genuine 29 fps: the wire format has no way to distinguish the
/// two, and this crate follows the convention of assuming 29.97.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FrameRate {
    N24,
    N25,
    N29,
    N30,
}

impl FrameRate {
    fn from_wire(byte: u8) -> LibResult<Self> {
        match byte {
            24 => Ok(FrameRate::N24),
            25 => Ok(FrameRate::N25),
            29 => Ok(FrameRate::N29),
            30 => Ok(FrameRate::N30),
            _ => error::InvalidFile {
                site: site!(),
                description: format!("unsupported SMPTE frame rate: {}", byte),
            }
            .fail(),
        }
    }

    fn to_wire(self) -> u8 {
        match self {
            FrameRate::N24 => 24,
            FrameRate::N25 => 25,
            FrameRate::N29 => 29,
            FrameRate::N30 => 30,
        }
    }

    /// The frame rate as callers should reason about it: `N29` is reported as `29.97`, per the
    /// drop-frame convention.
    fn as_f64(self) -> f64 {
        match self {
            FrameRate::N24 => 24.0,
            FrameRate::N25 => 25.0,
            FrameRate::N29 => 29.97,
            FrameRate::N30 => 30.0,
        }
    }
}

/// The pulses-per-second half of a SMPTE-based `TimeDivision`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmpteDivision {
    frame_rate: FrameRate,
    /// Ticks ("subframes") per frame.
    subframes: u8,
}

impl SmpteDivision {
    /// The nominal frame rate, with `29` reported as `29.97` per the drop-frame convention.
    pub fn frames_per_second(&self) -> f64 {
        self.frame_rate.as_f64()
    }

    /// Ticks per frame.
    pub fn subframes(&self) -> u8 {
        self.subframes
    }

    /// Pulses per second: `frames_per_second * subframes`.
    pub fn pulses_per_second(&self) -> f64 {
        self.frames_per_second() * self.subframes as f64
    }
}

/// How a file's delta-times map onto musical or absolute time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimeDivision {
    /// Pulses per quarter note, `1..=32767`.
    Ppqn(u16),
    /// Pulses per second, derived from a SMPTE frame rate and subframe count.
    Pps(SmpteDivision),
}

impl Default for TimeDivision {
    fn default() -> Self {
        TimeDivision::Ppqn(480)
    }
}

impl TimeDivision {
    /// Builds a PPQN-mode division. `ppqn` must be in `1..=32767` (bit 15 is reserved to flag PPS
    /// mode on the wire).
    pub fn ppqn(ppqn: u16) -> LibResult<Self> {
        ensure!(
            ppqn > 0 && ppqn & DIVISION_TYPE_BIT == 0,
            error::InvalidFile {
                site: site!(),
                description: "ppqn must be in 1..=32767",
            }
        );
        Ok(TimeDivision::Ppqn(ppqn))
    }

    /// Pulses per quarter note, if this division is in PPQN mode.
    pub fn ppqn_value(&self) -> Option<u16> {
        match self {
            TimeDivision::Ppqn(v) => Some(*v),
            TimeDivision::Pps(_) => None,
        }
    }

    /// Pulses per second, if this division is in SMPTE/PPS mode.
    pub fn pps_value(&self) -> Option<f64> {
        match self {
            TimeDivision::Ppqn(_) => None,
            TimeDivision::Pps(s) => Some(s.pulses_per_second()),
        }
    }

    pub(crate) fn from_u16(value: u16) -> LibResult<Self> {
        if value & DIVISION_TYPE_BIT == DIVISION_TYPE_BIT {
            let upper = ((value >> 8) & 0x00FF) as u8;
            // Stored as the two's-complement negative of the frame rate; we only ever see the
            // four standard magnitudes, so a direct negate recovers the positive byte.
            let frame_rate_byte = (!upper).wrapping_add(1);
            let frame_rate = FrameRate::from_wire(frame_rate_byte)?;
            let subframes = (value & 0x00FF) as u8;
            Ok(TimeDivision::Pps(SmpteDivision {
                frame_rate,
                subframes,
            }))
        } else {
            TimeDivision::ppqn(value)
        }
    }

    pub(crate) fn to_u16(self) -> u16 {
        match self {
            TimeDivision::Ppqn(v) => v,
            TimeDivision::Pps(s) => {
                let frame_rate_byte = s.frame_rate.to_wire();
                let negated = (!frame_rate_byte).wrapping_add(1);
                DIVISION_TYPE_BIT | ((negated as u16) << 8) | s.subframes as u16
            }
        }
    }

    pub(crate) fn write<W: Write>(&self, w: &mut Scribe<W>) -> LibResult<()> {
        w.write_all(&self.to_u16().to_be_bytes()).context(wr!())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_480_ppqn() {
        assert_eq!(TimeDivision::default().ppqn_value(), Some(480));
    }

    #[test]
    fn ppqn_wire_round_trip() {
        let division = TimeDivision::ppqn(96).unwrap();
        assert_eq!(TimeDivision::from_u16(division.to_u16()).unwrap(), division);
    }

    #[test]
    fn rejects_zero_ppqn() {
        assert!(TimeDivision::ppqn(0).is_err());
    }

    #[test]
    fn smpte_29_reports_as_29_97() {
        // -29 in two's complement occupies the upper byte: 0xE3.
        let wire = 0xE328u16;
        let division = TimeDivision::from_u16(wire).unwrap();
        match division {
            TimeDivision::Pps(s) => {
                assert_eq!(s.frames_per_second(), 29.97);
                assert_eq!(s.subframes(), 40);
            }
            _ => panic!("expected Pps"),
        }
        assert_eq!(division.to_u16(), wire);
    }

    #[test]
    fn smpte_25_round_trip() {
        let division = TimeDivision::Pps(SmpteDivision {
            frame_rate: FrameRate::N25,
            subframes: 40,
        });
        let wire = division.to_u16();
        assert_eq!(TimeDivision::from_u16(wire).unwrap(), division);
    }
}
