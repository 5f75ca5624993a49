/*!
`MetaEvent` is the closed set of `0xFF`-prefixed meta events this crate round-trips. Every variant
parses and emits the wire form `FF <type> VarInt(length) <length bytes>`.
!*/

use crate::byte_iter::ByteIter;
use crate::core::{Tempo, TimeSignature};
use crate::error::{self, LibResult};
use crate::scribe::Scribe;
use crate::text::Text;
use crate::vlq::Vlq;
use snafu::{ensure, ResultExt};
use std::io::{Read, Write};

const META_SEQUENCE_NUMBER: u8 = 0x00;
const META_TEXT: u8 = 0x01;
const META_COPYRIGHT: u8 = 0x02;
const META_NAME: u8 = 0x03;
const META_INSTRUMENT_NAME: u8 = 0x04;
const META_LYRICS: u8 = 0x05;
const META_MARKER: u8 = 0x06;
const META_CUE_POINT: u8 = 0x07;
const META_PROGRAM_NAME: u8 = 0x08;
const META_CHANNEL_PREFIX: u8 = 0x20;
const META_END_TRACK: u8 = 0x2F;
const META_SET_TEMPO: u8 = 0x51;
const META_SMPTE_OFFSET: u8 = 0x54;
const META_SET_TIME_SIGNATURE: u8 = 0x58;
const META_SET_KEY_SIGNATURE: u8 = 0x59;
const META_PROPRIETARY_EVENT: u8 = 0x7F;

/// A meta event, as it can appear inside a Standard MIDI File track chunk. Every text-carrying
/// variant round-trips through [`Text`] (UTF-8 where possible, raw bytes otherwise). Unrecognized
/// meta-type bytes fail to parse with `UnknownMetaType`: this crate treats the event taxonomy as a
/// closed set rather than silently passing through unknown meta types.
#[derive(Clone, Debug, PartialEq)]
pub enum MetaEvent {
    /// An optional event, which must occur as the first event in a track, giving each track a
    /// unique number for use in multi-track files.
    SequenceNumber(u16),
    /// Free-form text, not otherwise categorized.
    Text(Text),
    /// A copyright notice, conventionally in the first track at time zero.
    Copyright(Text),
    /// The name of a track or, on track 0, the name of the sequence.
    Name(Text),
    /// The name of the instrument used in this track.
    ProgramName(Text),
    /// Lyric text, conventionally one syllable per event, synced to the notes it accompanies.
    Lyrics(Text),
    /// A marker, typically naming a rehearsal point or section of the piece.
    Marker(Text),
    /// A cue point, describing an action or cue to take at this point in a score or soundtrack.
    CuePoint(Text),
    /// Associates subsequent meta events (until the next such event) with a MIDI channel, for
    /// devices with multiple MIDI ports.
    ChannelPrefix(u8),
    /// Marks the end of a track. Always the last event in a track's wire encoding; not part of a
    /// caller-visible, normalized [`crate::Sequence`]'s event list.
    EndTrack,
    /// Sets the tempo in force from this point forward.
    SetTempo(Tempo),
    /// SMPTE offset for this track, as five raw bytes (`hr mn se fr ff`). Opaque: this crate does
    /// not interpret SMPTE timecode beyond round-tripping it.
    SMPTEOffset(Vec<u8>),
    /// Sets the time signature in force from this point forward.
    SetTimeSignature(TimeSignature),
    /// Sets the key signature in force from this point forward: `key` is the number of sharps
    /// (positive) or flats (negative), `scale` is `0` for major or `1` for minor.
    SetKeySignature(i8, u8),
    /// A manufacturer-specific event, opaque and preserved exactly on round-trip.
    ProprietaryEvent(Vec<u8>),
}

impl Default for MetaEvent {
    fn default() -> Self {
        MetaEvent::EndTrack
    }
}

impl MetaEvent {
    /// Parses a meta event's payload, having already consumed the `0xFF` status byte and the
    /// type byte.
    pub(crate) fn parse<R: Read>(iter: &mut ByteIter<R>, meta_type: u8) -> LibResult<Self> {
        let length = iter.read_vlq_u32().context(io!())? as usize;
        match meta_type {
            META_SEQUENCE_NUMBER => {
                ensure!(
                    length == 2,
                    error::InvalidFile {
                        site: site!(),
                        description: "SequenceNumber meta event must have a 2-byte payload",
                    }
                );
                let bytes = iter.read_n(2).context(io!())?;
                Ok(MetaEvent::SequenceNumber(u16::from_be_bytes([
                    bytes[0], bytes[1],
                ])))
            }
            META_TEXT => Ok(MetaEvent::Text(read_text(iter, length)?)),
            META_COPYRIGHT => Ok(MetaEvent::Copyright(read_text(iter, length)?)),
            META_NAME => Ok(MetaEvent::Name(read_text(iter, length)?)),
            META_PROGRAM_NAME => Ok(MetaEvent::ProgramName(read_text(iter, length)?)),
            META_LYRICS => Ok(MetaEvent::Lyrics(read_text(iter, length)?)),
            META_MARKER => Ok(MetaEvent::Marker(read_text(iter, length)?)),
            META_CUE_POINT => Ok(MetaEvent::CuePoint(read_text(iter, length)?)),
            META_CHANNEL_PREFIX => {
                ensure!(
                    length == 1,
                    error::InvalidFile {
                        site: site!(),
                        description: "ChannelPrefix meta event must have a 1-byte payload",
                    }
                );
                Ok(MetaEvent::ChannelPrefix(iter.read_or_die().context(io!())?))
            }
            META_END_TRACK => {
                ensure!(
                    length == 0,
                    error::InvalidFile {
                        site: site!(),
                        description: "EndTrack meta event must have an empty payload",
                    }
                );
                Ok(MetaEvent::EndTrack)
            }
            META_SET_TEMPO => {
                ensure!(
                    length == 3,
                    error::InvalidFile {
                        site: site!(),
                        description: "SetTempo meta event must have a 3-byte payload",
                    }
                );
                Ok(MetaEvent::SetTempo(Tempo::parse(iter)?))
            }
            META_SMPTE_OFFSET => {
                ensure!(
                    length == 5,
                    error::InvalidFile {
                        site: site!(),
                        description: "SMPTEOffset meta event must have a 5-byte payload",
                    }
                );
                Ok(MetaEvent::SMPTEOffset(iter.read_n(5).context(io!())?))
            }
            META_SET_TIME_SIGNATURE => {
                ensure!(
                    length == 4,
                    error::InvalidFile {
                        site: site!(),
                        description: "SetTimeSignature meta event must have a 4-byte payload",
                    }
                );
                Ok(MetaEvent::SetTimeSignature(TimeSignature::parse(iter)?))
            }
            META_SET_KEY_SIGNATURE => {
                ensure!(
                    length == 2,
                    error::InvalidFile {
                        site: site!(),
                        description: "SetKeySignature meta event must have a 2-byte payload",
                    }
                );
                let key = iter.read_or_die().context(io!())? as i8;
                let scale = iter.read_or_die().context(io!())?;
                Ok(MetaEvent::SetKeySignature(key, scale))
            }
            META_PROPRIETARY_EVENT => Ok(MetaEvent::ProprietaryEvent(
                iter.read_n(length).context(io!())?,
            )),
            META_INSTRUMENT_NAME => {
                // Not part of this crate's closed meta-event taxonomy; consume so that a
                // well-formed but unmodeled file still fails only on the type byte, not on a
                // subsequent desync.
                let _ = iter.read_n(length).context(io!())?;
                error::UnknownMetaType {
                    site: site!(),
                    byte: meta_type,
                }
                .fail()
            }
            _ => error::UnknownMetaType {
                site: site!(),
                byte: meta_type,
            }
            .fail(),
        }
    }

    pub(crate) fn write<W: Write>(&self, w: &mut Scribe<W>) -> LibResult<()> {
        write_u8!(w, 0xFF)?;
        match self {
            MetaEvent::SequenceNumber(n) => {
                write_meta_header(w, META_SEQUENCE_NUMBER, 2)?;
                w.write_all(&n.to_be_bytes()).context(wr!())?;
            }
            MetaEvent::Text(text) => write_text(w, META_TEXT, text)?,
            MetaEvent::Copyright(text) => write_text(w, META_COPYRIGHT, text)?,
            MetaEvent::Name(text) => write_text(w, META_NAME, text)?,
            MetaEvent::ProgramName(text) => write_text(w, META_PROGRAM_NAME, text)?,
            MetaEvent::Lyrics(text) => write_text(w, META_LYRICS, text)?,
            MetaEvent::Marker(text) => write_text(w, META_MARKER, text)?,
            MetaEvent::CuePoint(text) => write_text(w, META_CUE_POINT, text)?,
            MetaEvent::ChannelPrefix(channel) => {
                write_meta_header(w, META_CHANNEL_PREFIX, 1)?;
                write_u8!(w, *channel)?;
            }
            MetaEvent::EndTrack => {
                write_meta_header(w, META_END_TRACK, 0)?;
            }
            MetaEvent::SetTempo(tempo) => {
                write_meta_header(w, META_SET_TEMPO, 3)?;
                tempo.write(w)?;
            }
            MetaEvent::SMPTEOffset(bytes) => {
                write_meta_header(w, META_SMPTE_OFFSET, bytes.len() as u32)?;
                w.write_all(bytes).context(wr!())?;
            }
            MetaEvent::SetTimeSignature(signature) => {
                write_meta_header(w, META_SET_TIME_SIGNATURE, 4)?;
                signature.write(w)?;
            }
            MetaEvent::SetKeySignature(key, scale) => {
                write_meta_header(w, META_SET_KEY_SIGNATURE, 2)?;
                write_u8!(w, *key as u8)?;
                write_u8!(w, *scale)?;
            }
            MetaEvent::ProprietaryEvent(bytes) => {
                write_meta_header(w, META_PROPRIETARY_EVENT, bytes.len() as u32)?;
                w.write_all(bytes).context(wr!())?;
            }
        }
        Ok(())
    }
}

fn read_text<R: Read>(iter: &mut ByteIter<R>, length: usize) -> LibResult<Text> {
    let bytes = iter.read_n(length).context(io!())?;
    Ok(Text::from(bytes))
}

fn write_meta_header<W: Write>(w: &mut Scribe<W>, meta_type: u8, length: u32) -> LibResult<()> {
    write_u8!(w, meta_type)?;
    w.write_all(&Vlq::new(length).to_bytes()).context(wr!())
}

fn write_text<W: Write>(w: &mut Scribe<W>, meta_type: u8, text: &Text) -> LibResult<()> {
    let bytes = text.as_bytes();
    ensure!(
        bytes.len() as u64 <= crate::vlq::MAX_VLQ_VALUE as u64,
        error::StringTooLong {
            site: site!(),
            description: format!(
                "{} bytes exceeds the maximum VarInt-encodable length of {}",
                bytes.len(),
                crate::vlq::MAX_VLQ_VALUE
            ),
        }
    );
    write_meta_header(w, meta_type, bytes.len() as u32)?;
    w.write_all(bytes).context(wr!())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scribe::ScribeSettings;
    use std::io::Cursor;

    fn parse_bytes(bytes: &[u8]) -> MetaEvent {
        let cursor = Cursor::new(bytes[2..].to_vec());
        let mut iter = ByteIter::new(std::io::Read::bytes(cursor)).unwrap();
        MetaEvent::parse(&mut iter, bytes[1]).unwrap()
    }

    #[test]
    fn parses_end_track() {
        assert_eq!(parse_bytes(&[0xFF, 0x2F, 0x00]), MetaEvent::EndTrack);
    }

    #[test]
    fn parses_set_tempo() {
        let event = parse_bytes(&[0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]);
        match event {
            MetaEvent::SetTempo(tempo) => assert_eq!(tempo.mpqn(), 500_000),
            _ => panic!("expected SetTempo"),
        }
    }

    #[test]
    fn parses_track_name() {
        let event = parse_bytes(&[0xFF, 0x03, 0x04, b'c', b'a', b'f', b'e']);
        assert_eq!(event, MetaEvent::Name(Text::new("cafe")));
    }

    #[test]
    fn rejects_unknown_meta_type() {
        let cursor = Cursor::new(vec![0x00]);
        let mut iter = ByteIter::new(std::io::Read::bytes(cursor)).unwrap();
        assert!(MetaEvent::parse(&mut iter, 0x10).is_err());
    }

    #[test]
    fn write_then_parse_key_signature() {
        let mut buf = Vec::new();
        {
            let mut scribe = Scribe::new(&mut buf, ScribeSettings::default());
            MetaEvent::SetKeySignature(-3, 0).write(&mut scribe).unwrap();
        }
        let cursor = Cursor::new(buf[2..].to_vec());
        let mut iter = ByteIter::new(std::io::Read::bytes(cursor)).unwrap();
        let event = MetaEvent::parse(&mut iter, 0x59).unwrap();
        assert_eq!(event, MetaEvent::SetKeySignature(-3, 0));
    }
}
