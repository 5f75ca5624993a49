/*!
`ChannelEvent` is the closed set of channel voice messages this crate understands: the seven
variants needed to round-trip Standard MIDI Files. Channel mode messages, system common, and
system realtime messages are not modeled — they do not appear inside SMF track chunks.
!*/

use crate::byte_iter::ByteIter;
use crate::core::bits::{combine_14_bit, split_14_bit};
use crate::core::control::Control;
use crate::core::numbers::{Channel, ControlValue, NoteNumber, U7, Velocity};
use crate::core::program::Program;
use crate::core::status_type::StatusType;
use crate::error::{self, LibResult};
use crate::scribe::Scribe;
use snafu::{OptionExt, ResultExt};
use std::convert::TryFrom;
use std::io::{Read, Write};

/// A channel voice message, exactly as it can appear inside a Standard MIDI File track chunk.
/// The channel number is tracked alongside this value by the owning [`crate::Event`], not inside
/// it, mirroring the wire format where channel is packed into the shared status byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ChannelEvent {
    /// A note is released.
    NoteOff { note: NoteNumber, velocity: Velocity },
    /// A note is struck. A `NoteOn` with `velocity == 0` is conventionally a note-off, but this
    /// crate preserves the wire distinction rather than collapsing it.
    NoteOn { note: NoteNumber, velocity: Velocity },
    /// Polyphonic key pressure / aftertouch for a single sounding note.
    NoteAftertouch { note: NoteNumber, amount: U7 },
    /// A control change (continuous controller) message.
    ControlChange { controller: Control, value: ControlValue },
    /// Changes the instrument/patch in force for the channel.
    ProgramChange { program: Program },
    /// Channel-wide pressure / aftertouch.
    ChannelAftertouch { amount: U7 },
    /// Pitch wheel position, normalized to `[-1.0, 1.0]`, centered at `0.0`.
    PitchBend { value: f64 },
}

impl Default for ChannelEvent {
    fn default() -> Self {
        ChannelEvent::NoteOff {
            note: NoteNumber::default(),
            velocity: Velocity::default(),
        }
    }
}

const PITCH_BEND_CENTER: f64 = 8192.0;

impl ChannelEvent {
    /// Parses a channel event, having already consumed (or reused via running status) the status
    /// byte. Returns the channel packed in the status byte alongside the parsed event.
    pub(crate) fn parse<R: Read>(iter: &mut ByteIter<R>) -> LibResult<(Channel, Self)> {
        let byte = if matches!(iter.peek_or_die().context(io!())?, 0x00..=0x7F) {
            iter.set_running_status_detected();
            iter.latest_message_byte()
                .context(error::RunningStatus { site: site!() })?
        } else {
            let byte = iter.read_or_die().context(io!())?;
            iter.set_latest_message_byte(Some(byte));
            byte
        };

        let (status_type, channel) = split_status_byte(byte)?;
        let event = match status_type {
            StatusType::NoteOff => ChannelEvent::NoteOff {
                note: iter.read_or_die().context(io!())?.into(),
                velocity: iter.read_or_die().context(io!())?.into(),
            },
            StatusType::NoteOn => ChannelEvent::NoteOn {
                note: iter.read_or_die().context(io!())?.into(),
                velocity: iter.read_or_die().context(io!())?.into(),
            },
            StatusType::PolyPressure => ChannelEvent::NoteAftertouch {
                note: iter.read_or_die().context(io!())?.into(),
                amount: iter.read_or_die().context(io!())?.into(),
            },
            StatusType::ControlOrSelectChannelMode => {
                let controller_byte = iter.read_or_die().context(io!())?;
                let controller = Control::try_from_u8(controller_byte)?;
                let value: ControlValue = iter.read_or_die().context(io!())?.into();
                ChannelEvent::ControlChange {
                    controller,
                    value,
                }
            }
            StatusType::Program => {
                let program = Program::from_wire(iter.read_or_die().context(io!())?);
                ChannelEvent::ProgramChange { program }
            }
            StatusType::ChannelPressure => ChannelEvent::ChannelAftertouch {
                amount: iter.read_or_die().context(io!())?.into(),
            },
            StatusType::PitchBend => {
                let lsb = iter.read_or_die().context(io!())?;
                let msb = iter.read_or_die().context(io!())?;
                let wire = combine_14_bit(lsb, msb);
                ChannelEvent::PitchBend {
                    value: (wire as f64 - PITCH_BEND_CENTER) / PITCH_BEND_CENTER,
                }
            }
            StatusType::System => {
                return error::UnknownEventStatus {
                    site: site!(),
                    byte,
                }
                .fail()
            }
        };
        Ok((channel, event))
    }

    /// Writes this event's status byte and operand bytes. Running status is never used on emit:
    /// the status byte is always written in full.
    pub(crate) fn write<W: Write>(&self, w: &mut Scribe<W>, channel: Channel) -> LibResult<()> {
        match self {
            ChannelEvent::NoteOff { note, velocity } => {
                write_status_byte(w, StatusType::NoteOff, channel)?;
                write_u8!(w, note.get())?;
                write_u8!(w, velocity.get())?;
            }
            ChannelEvent::NoteOn { note, velocity } => {
                write_status_byte(w, StatusType::NoteOn, channel)?;
                write_u8!(w, note.get())?;
                write_u8!(w, velocity.get())?;
            }
            ChannelEvent::NoteAftertouch { note, amount } => {
                write_status_byte(w, StatusType::PolyPressure, channel)?;
                write_u8!(w, note.get())?;
                write_u8!(w, amount.get())?;
            }
            ChannelEvent::ControlChange { controller, value } => {
                write_status_byte(w, StatusType::ControlOrSelectChannelMode, channel)?;
                write_u8!(w, *controller as u8)?;
                write_u8!(w, value.get())?;
            }
            ChannelEvent::ProgramChange { program } => {
                write_status_byte(w, StatusType::Program, channel)?;
                write_u8!(w, program.to_wire())?;
            }
            ChannelEvent::ChannelAftertouch { amount } => {
                write_status_byte(w, StatusType::ChannelPressure, channel)?;
                write_u8!(w, amount.get())?;
            }
            ChannelEvent::PitchBend { value } => {
                write_status_byte(w, StatusType::PitchBend, channel)?;
                let wire = ((value + 1.0) * PITCH_BEND_CENTER).round().clamp(0.0, 16383.0) as u16;
                let (lsb, msb) = split_14_bit(wire);
                write_u8!(w, lsb)?;
                write_u8!(w, msb)?;
            }
        }
        Ok(())
    }
}

/// Splits a channel-voice status byte into its `StatusType` and `Channel` parts.
fn split_status_byte(status_byte: u8) -> LibResult<(StatusType, Channel)> {
    let status_type = StatusType::from_u8(status_byte >> 4)?;
    let channel: Channel = (status_byte & 0x0F).into();
    Ok((status_type, channel))
}

fn write_status_byte<W: Write>(
    w: &mut Scribe<W>,
    status: StatusType,
    channel: Channel,
) -> LibResult<()> {
    let byte = ((status as u8) << 4) | channel.get();
    w.write_status_byte(byte)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip_bytes(bytes: &[u8]) -> (Channel, ChannelEvent) {
        let cursor = Cursor::new(bytes.to_vec());
        let mut iter = ByteIter::new(std::io::Read::bytes(cursor)).unwrap();
        iter.read().unwrap(); // prime `current`
        ChannelEvent::parse(&mut iter).unwrap()
    }

    #[test]
    fn parses_note_on() {
        let (channel, event) = roundtrip_bytes(&[0x90, 0x3C, 0x64]);
        assert_eq!(channel.get(), 0);
        match event {
            ChannelEvent::NoteOn { note, velocity } => {
                assert_eq!(note.get(), 60);
                assert_eq!(velocity.get(), 100);
            }
            _ => panic!("expected NoteOn"),
        }
    }

    #[test]
    fn pitch_bend_known_value() {
        // wire value 8292 should decode to (8292 - 8192) / 8192
        let lsb = (8292u16 & 0x7f) as u8;
        let msb = ((8292u16 >> 7) & 0x7f) as u8;
        let (_, event) = roundtrip_bytes(&[0xE0, lsb, msb]);
        match event {
            ChannelEvent::PitchBend { value } => {
                assert!((value - (8292.0 - 8192.0) / 8192.0).abs() < 1e-9);
            }
            _ => panic!("expected PitchBend"),
        }
    }
}
