use crate::core::TimeDivision;
use crate::error::LibResult;
use crate::scribe::Scribe;
use crate::Error;
use snafu::ResultExt;
use std::convert::TryFrom;
use std::io::Write;

/// The `MThd` chunk's payload: file format and time division. `ntracks` is not stored here since it
/// is derived from the sequence's events on emit and supplied directly to [`Header::write`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Header {
    format: Format,
    division: TimeDivision,
}

impl Header {
    /// Create a new `Header` object.
    pub fn new(format: Format, division: TimeDivision) -> Self {
        Self { format, division }
    }

    /// A getter for the `format` field.
    pub fn format(&self) -> Format {
        self.format
    }

    /// A getter for the `division` field.
    pub fn division(&self) -> TimeDivision {
        self.division
    }

    pub(crate) fn parse(format: u16, division: u16) -> LibResult<Self> {
        Ok(Header {
            format: Format::from_u16(format)?,
            division: TimeDivision::from_u16(division)?,
        })
    }

    pub(crate) fn write<W: Write>(&self, w: &mut Scribe<W>, ntracks: u16) -> LibResult<()> {
        write!(w, "MThd").context(wr!())?;
        w.write_all(&6u32.to_be_bytes()).context(wr!())?;
        w.write_all(&(self.format as u16).to_be_bytes())
            .context(wr!())?;
        w.write_all(&ntracks.to_be_bytes()).context(wr!())?;
        self.division.write(w)?;
        Ok(())
    }
}

/// The `SMF` header's format field: how the file's tracks relate to one another.
#[repr(u16)]
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub enum Format {
    /// The file contains a single multi-channel track.
    #[default]
    Single = 0,
    /// The file contains one or more simultaneous tracks of a sequence.
    Multi = 1,
    /// The file contains one or more sequentially independent single-track patterns.
    Sequential = 2,
}

impl Format {
    pub(crate) fn from_u16(value: u16) -> LibResult<Self> {
        match value {
            0 => Ok(Format::Single),
            1 => Ok(Format::Multi),
            2 => Ok(Format::Sequential),
            _ => crate::error::InvalidFile {
                site: site!(),
                description: format!("unknown SMF format: {}", value),
            }
            .fail(),
        }
    }
}

impl TryFrom<u16> for Format {
    type Error = Error;

    fn try_from(value: u16) -> crate::Result<Self> {
        Ok(Self::from_u16(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_round_trip() {
        for (value, format) in [
            (0u16, Format::Single),
            (1, Format::Multi),
            (2, Format::Sequential),
        ] {
            assert_eq!(Format::from_u16(value).unwrap(), format);
            assert_eq!(format as u16, value);
        }
    }

    #[test]
    fn unknown_format_rejected() {
        assert!(Format::from_u16(3).is_err());
    }
}
