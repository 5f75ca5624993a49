/*!
`TimeSignature` is the musical meter in force at a point in a sequence: how many beats make up a
bar, and what note value counts as one beat. It backs both the `SetTimeSignature` meta event and
every [`crate::core::TimeNode`] in the node map, which needs it to convert absolute ticks into
bar/beat/tick triples.
!*/

use crate::byte_iter::ByteIter;
use crate::core::clocks::Clocks;
use crate::core::duration_name::DurationName;
use crate::error::{self, LibResult};
use crate::scribe::Scribe;
use snafu::{ensure, ResultExt};
use std::io::{Read, Write};

/// A musical time signature: `numerator` beats per bar, each worth `1 / 2^denominator_exponent` of
/// a whole note, plus the two bytes the MIDI file format carries for metronome and notation display
/// and which this crate otherwise ignores musically.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TimeSignature {
    numerator: u8,
    denominator: DurationName,
    /// How often the metronome should click, expressed as a MIDI clocks count.
    metronome: Clocks,
    /// The number of notated 32nd notes per quarter note. Almost always `8`.
    notated_32nds_per_quarter: u8,
}

impl Default for TimeSignature {
    /// Common time: 4/4, metronome click every quarter note, 8 32nds per quarter.
    fn default() -> Self {
        TimeSignature {
            numerator: 4,
            denominator: DurationName::Quarter,
            metronome: Clocks::Quarter,
            notated_32nds_per_quarter: 8,
        }
    }
}

impl TimeSignature {
    /// Builds a time signature from its numerator and denominator (e.g. `TimeSignature::new(3, 8,
    /// ..)` is 3/8 time), plus the metronome click rate and notated-32nds-per-quarter display hint.
    pub fn new(
        numerator: u8,
        denominator: u8,
        metronome: Clocks,
        notated_32nds_per_quarter: u8,
    ) -> LibResult<Self> {
        ensure!(
            numerator > 0,
            error::InvalidFile {
                site: site!(),
                description: "time signature numerator must be greater than zero",
            }
        );
        ensure!(
            denominator.is_power_of_two(),
            error::InvalidFile {
                site: site!(),
                description: "time signature denominator must be a power of two",
            }
        );
        let exponent = denominator.trailing_zeros() as u8;
        Ok(TimeSignature {
            numerator,
            denominator: DurationName::from_u8(exponent)?,
            metronome,
            notated_32nds_per_quarter,
        })
    }

    /// Beats per bar.
    pub fn numerator(&self) -> u8 {
        self.numerator
    }

    /// The note value counted as one beat: `4` for a quarter note, `8` for an eighth note, etc.
    pub fn denominator(&self) -> u8 {
        1u8 << (self.denominator as u8)
    }

    /// MIDI clocks per metronome click.
    pub fn metronome(&self) -> Clocks {
        self.metronome
    }

    /// Notated 32nd notes per quarter note, a notation display hint.
    pub fn notated_32nds_per_quarter(&self) -> u8 {
        self.notated_32nds_per_quarter
    }

    /// The number of quarter notes represented by one bar under this time signature, as a
    /// fraction: `numerator * 4 / denominator`. Used by the node map to derive ticks-per-bar.
    pub(crate) fn quarters_per_bar(&self) -> f64 {
        self.numerator as f64 * 4.0 / self.denominator() as f64
    }

    pub(crate) fn parse<R: Read>(iter: &mut ByteIter<R>) -> LibResult<Self> {
        let numerator = iter.read_or_die().context(io!())?;
        let denominator_exponent = iter.read_or_die().context(io!())?;
        let metronome = Clocks::new(iter.read_or_die().context(io!())?);
        let notated_32nds_per_quarter = iter.read_or_die().context(io!())?;
        Ok(TimeSignature {
            numerator,
            denominator: DurationName::from_u8(denominator_exponent)?,
            metronome,
            notated_32nds_per_quarter,
        })
    }

    pub(crate) fn write<W: Write>(&self, w: &mut Scribe<W>) -> LibResult<()> {
        write_u8!(w, self.numerator)?;
        write_u8!(w, self.denominator as u8)?;
        write_u8!(w, self.metronome.to_u8())?;
        write_u8!(w, self.notated_32nds_per_quarter)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_common_time() {
        let sig = TimeSignature::default();
        assert_eq!(sig.numerator(), 4);
        assert_eq!(sig.denominator(), 4);
    }

    #[test]
    fn three_eight_time() {
        let sig = TimeSignature::new(3, 8, Clocks::DottedQuarter, 8).unwrap();
        assert_eq!(sig.numerator(), 3);
        assert_eq!(sig.denominator(), 8);
        assert_eq!(sig.quarters_per_bar(), 1.5);
    }

    #[test]
    fn rejects_non_power_of_two_denominator() {
        assert!(TimeSignature::new(4, 3, Clocks::Quarter, 8).is_err());
    }

    #[test]
    fn rejects_zero_numerator() {
        assert!(TimeSignature::new(0, 4, Clocks::Quarter, 8).is_err());
    }
}
