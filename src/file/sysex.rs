use crate::byte_iter::ByteIter;
use crate::error::LibResult;
use crate::scribe::Scribe;
use crate::vlq::Vlq;
use snafu::ResultExt;
use std::io::{Read, Write};

/// A system exclusive event. The payload is opaque: this crate does not interpret manufacturer
/// sysex bodies, only preserves them exactly across parse/emit.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct SysexEvent {
    t: SysexEventType,
    data: Vec<u8>,
}

impl SysexEvent {
    /// Builds a sysex event from its leading status (`F0` or `F7`) and payload bytes, not
    /// including the status byte or the VarInt length.
    pub fn new(t: SysexEventType, data: Vec<u8>) -> Self {
        SysexEvent { t, data }
    }

    /// Which of the two sysex statuses (`F0` or `F7`) introduced this event.
    pub fn event_type(&self) -> SysexEventType {
        self.t
    }

    /// The opaque payload bytes, not including the status byte or the VarInt length.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn parse<R: Read>(first_byte: u8, iter: &mut ByteIter<R>) -> LibResult<Self> {
        let t = SysexEventType::from_u8(first_byte)?;
        let length = iter.read_vlq_u32().context(io!())? as usize;
        let data = iter.read_n(length).context(io!())?;
        Ok(SysexEvent { t, data })
    }

    pub(crate) fn write<W: Write>(&self, w: &mut Scribe<W>) -> LibResult<()> {
        write_u8!(w, self.t as u8)?;
        w.write_all(&Vlq::new(self.data.len() as u32).to_bytes())
            .context(wr!())?;
        w.write_all(&self.data).context(wr!())
    }
}

/// `<sysex event>` is used to specify a MIDI system exclusive message, either as one unit or in
/// packets, or as an "escape" to specify any arbitrary bytes to be transmitted.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Hash, Default)]
pub enum SysexEventType {
    /// `F0 <length> <bytes to be transmitted after F0>`.
    ///
    /// The length is stored as a variable-length quantity. It specifies the number of bytes which
    /// follow it, not including the F0 or the length itself. For instance, the transmitted message
    /// `F0 43 12 00 07 F7` would be stored in a MIDI File as `F0 05 43 12 00 07 F7`. It is required
    /// to include the `F7` at the end so that the reader of the MIDI File knows that it has read
    /// the entire message.
    #[default]
    F0 = 0xf0,

    /// `F7 <length> <all bytes to be transmitted>`.
    ///
    /// Some synthesizer manufacturers specify that their system exclusive messages are to be
    /// transmitted as little packets. An F0 sysex event is used for the first packet in a series;
    /// an F7 sysex event is used for the remainder, which do not begin with F0. A syntactic system
    /// exclusive message must always end with an F7 in the file, even if the real-life device
    /// didn't send one, so a reader knows when it has reached the end without looking ahead to the
    /// next event.
    F7 = 0xf7,
}

impl SysexEventType {
    pub(crate) fn from_u8(value: u8) -> LibResult<Self> {
        match value {
            0xF0 => Ok(SysexEventType::F0),
            0xF7 => Ok(SysexEventType::F7),
            _ => crate::error::UnknownEventStatus {
                site: site!(),
                byte: value,
            }
            .fail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scribe::ScribeSettings;
    use std::io::Cursor;

    #[test]
    fn parses_f0_sysex() {
        let bytes = [0x05u8, 0x43, 0x12, 0x00, 0x07, 0xF7];
        let cursor = Cursor::new(bytes.to_vec());
        let mut iter = ByteIter::new(std::io::Read::bytes(cursor)).unwrap();
        let event = SysexEvent::parse(0xF0, &mut iter).unwrap();
        assert_eq!(event.event_type(), SysexEventType::F0);
        assert_eq!(event.data(), &[0x43, 0x12, 0x00, 0x07, 0xF7]);
    }

    #[test]
    fn write_then_parse_round_trip() {
        let event = SysexEvent::new(SysexEventType::F7, vec![0x01, 0x02, 0x03]);
        let mut buf = Vec::new();
        {
            let mut scribe = Scribe::new(&mut buf, ScribeSettings::default());
            event.write(&mut scribe).unwrap();
        }
        assert_eq!(buf, vec![0xF7, 0x03, 0x01, 0x02, 0x03]);
        let cursor = Cursor::new(buf[1..].to_vec());
        let mut iter = ByteIter::new(std::io::Read::bytes(cursor)).unwrap();
        let parsed = SysexEvent::parse(0xF7, &mut iter).unwrap();
        assert_eq!(parsed, event);
    }
}
