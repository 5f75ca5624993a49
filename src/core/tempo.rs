/*!
`Tempo` is the musical-speed value object used by both the node map ([`crate::core::TimeSpecification`])
and the `SetTempo` meta event: a single beats-per-minute scalar with derived microseconds-per-quarter-note
and beats-per-second views, and a fixed 3-byte wire form.
!*/

use crate::byte_iter::ByteIter;
use crate::error::{self, LibResult};
use crate::scribe::Scribe;
use snafu::{ensure, ResultExt};
use std::io::{Read, Write};

/// The default tempo a [`crate::core::TimeSpecification`] seeds its first node with when a file
/// defines no `SetTempo` event before the first channel event: 120 BPM.
pub const DEFAULT_BPM: f64 = 120.0;

/// Microseconds per quarter note is a 24-bit wire quantity; this is its maximum representable value.
const MAX_MPQN: u32 = 0x00FF_FFFF;

/// Musical speed, expressed internally as a floating-point beats-per-minute value. The wire form
/// (microseconds per quarter note) is always an integer, so `bpm` round-trips through the wire only
/// up to the rounding of `mpqn`.
#[derive(Clone, Copy, Debug)]
pub struct Tempo {
    bpm: f64,
}

impl Default for Tempo {
    fn default() -> Self {
        Tempo { bpm: DEFAULT_BPM }
    }
}

// `Tempo` equality is defined over `bpm` alone; derive-via-field-compare would also work since
// there is only one field, but we want the comparison documented at the type, not left implicit.
impl PartialEq for Tempo {
    fn eq(&self, other: &Self) -> bool {
        self.bpm == other.bpm
    }
}

impl Tempo {
    /// Builds a `Tempo` from a beats-per-minute value. `bpm` must be strictly positive.
    pub fn from_bpm(bpm: f64) -> LibResult<Self> {
        ensure!(
            bpm > 0.0,
            error::InvalidFile {
                site: site!(),
                description: "tempo bpm must be greater than zero",
            }
        );
        Ok(Tempo { bpm })
    }

    /// Builds a `Tempo` from microseconds per quarter note, the SMF wire unit.
    pub fn from_mpqn(mpqn: u32) -> LibResult<Self> {
        ensure!(
            mpqn > 0,
            error::InvalidFile {
                site: site!(),
                description: "tempo mpqn must be greater than zero",
            }
        );
        Self::from_bpm(60_000_000.0 / mpqn as f64)
    }

    /// Beats per minute.
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Beats per second, derived from `bpm`.
    pub fn bps(&self) -> f64 {
        self.bpm / 60.0
    }

    /// Microseconds per quarter note, derived from `bpm` and rounded to the nearest integer, clamped
    /// to the 24-bit wire range.
    pub fn mpqn(&self) -> u32 {
        let raw = (60_000_000.0 / self.bpm).round();
        if raw < 1.0 {
            1
        } else if raw > MAX_MPQN as f64 {
            MAX_MPQN
        } else {
            raw as u32
        }
    }

    pub(crate) fn parse<R: Read>(iter: &mut ByteIter<R>) -> LibResult<Self> {
        let bytes = iter.read_n(3).context(io!())?;
        let mpqn = u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]);
        Self::from_mpqn(mpqn)
    }

    pub(crate) fn write<W: Write>(&self, w: &mut Scribe<W>) -> LibResult<()> {
        let bytes = self.mpqn().to_be_bytes();
        debug_assert_eq!(bytes.len(), 4);
        w.write_all(&bytes[1..]).context(wr!())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_120_bpm() {
        assert_eq!(Tempo::default().bpm(), 120.0);
        assert_eq!(Tempo::default().mpqn(), 500_000);
    }

    #[test]
    fn mpqn_round_trip() {
        let tempo = Tempo::from_mpqn(400_000).unwrap();
        assert!((tempo.bpm() - 150.0).abs() < 1e-9);
        assert_eq!(tempo.mpqn(), 400_000);
    }

    #[test]
    fn rejects_non_positive_bpm() {
        assert!(Tempo::from_bpm(0.0).is_err());
        assert!(Tempo::from_bpm(-10.0).is_err());
    }

    #[test]
    fn bps_derivation() {
        let tempo = Tempo::from_bpm(120.0).unwrap();
        assert_eq!(tempo.bps(), 2.0);
    }
}
