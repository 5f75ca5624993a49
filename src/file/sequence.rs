/*!
[`Sequence`] is the top-level, file-format-agnostic view of a Standard MIDI File: a flat,
chronologically ordered list of [`Event`]s plus the format and node map ([`TimeSpecification`])
that give those events meaning. Parsing collapses the wire's per-track chunk structure into this
flat list (track membership survives as `Event::track`); emitting re-derives the chunk structure,
and the `SetTempo`/`SetTimeSignature`/`ProgramChange` events the wire format requires, from the
node map and each event's stamped tempo/signature/program.
!*/

use crate::byte_iter::{ByteError, ByteIter};
use crate::core::{
    Channel, ChannelEvent, Program, Tempo, Time, TimeDivision, TimeSignature, TimeSpecification,
};
use crate::error::{self, LibError, LibResult};
use crate::file::header::{Format, Header};
use crate::file::meta_event::MetaEvent;
use crate::file::sysex::SysexEvent;
use crate::scribe::{Scribe, ScribeSettings};
use crate::vlq::Vlq;
use snafu::{ensure, ResultExt};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::rc::Rc;

/// The three kinds of event body this crate round-trips inside a track chunk. The channel number
/// for a [`ChannelEvent`] is tracked on the owning [`Event`], not here.
#[derive(Clone, Debug)]
pub enum EventKind {
    /// A channel voice message.
    Channel(ChannelEvent),
    /// A meta event.
    Meta(MetaEvent),
    /// A system exclusive event.
    SysEx(SysexEvent),
}

/// One event in a [`Sequence`]'s flat, chronological event list. `tempo`, `signature`, and
/// `program` are the musical context in force at `time`, stamped from the node map and the
/// per-channel program history by [`Sequence::update`] (and by [`Sequence::parse`], which calls
/// it implicitly while building the sequence).
#[derive(Debug)]
pub struct Event {
    time: Time,
    track: u16,
    channel: Option<Channel>,
    tempo: Tempo,
    signature: TimeSignature,
    program: Option<Program>,
    kind: EventKind,
}

impl Event {
    /// Builds a new event bound to `time`. `tempo`, `signature`, and `program` are left at their
    /// defaults; they (and this event's place in the sequence's chronological order) are only
    /// authoritative once [`Sequence::update`] has run.
    pub fn new(time: Time, track: u16, channel: Option<Channel>, kind: EventKind) -> Self {
        Event {
            time,
            track,
            channel,
            tempo: Tempo::default(),
            signature: TimeSignature::default(),
            program: None,
            kind,
        }
    }

    /// This event's position in the sequence.
    pub fn time(&self) -> &Time {
        &self.time
    }

    /// The track this event belongs to.
    pub fn track(&self) -> u16 {
        self.track
    }

    /// The channel this event applies to, for channel voice events. `None` for meta and sysex
    /// events.
    pub fn channel(&self) -> Option<Channel> {
        self.channel
    }

    /// The tempo in force at this event's position.
    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// The time signature in force at this event's position.
    pub fn signature(&self) -> TimeSignature {
        self.signature
    }

    /// The program (patch) in force on this event's channel, for channel voice events.
    pub fn program(&self) -> Option<Program> {
        self.program
    }

    /// The event body.
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }
}

/// A Standard MIDI File's worth of musical data: the file format, the time division and node map,
/// and every event across every track, flattened into one chronologically ordered list.
///
/// A normalized `Sequence` never carries `SetTempo`, `SetTimeSignature`, `ProgramChange`, or
/// `EndTrack` events in its caller-visible list: those are wire-format bookkeeping, derived from
/// the node map and each event's stamped `tempo`/`signature`/`program` on [`Sequence::bytes`], and
/// stripped back out (into the node map and program history) on [`Sequence::parse`] and
/// [`Sequence::update`].
pub struct Sequence {
    format: Format,
    specification: Rc<RefCell<TimeSpecification>>,
    events: Vec<Event>,
}

/// An event not yet folded into the node map: a raw `(cumulative, track, channel, kind)` tuple,
/// the shared currency between parsing (where `cumulative` comes from summed deltas) and
/// [`Sequence::update`] (where it comes from each existing event's already-bound `Time`).
struct Staged {
    cumulative: i64,
    track: u16,
    channel: Option<Channel>,
    kind: EventKind,
}

/// An event about to be written to the wire: a derived `SetTempo`/`SetTimeSignature`/
/// `ProgramChange`/`EndTrack`, or one of the caller-visible events, all addressed by absolute
/// cumulative ticks rather than a [`Time`].
struct MaterializedEvent {
    cumulative: i64,
    track: u16,
    channel: Option<Channel>,
    kind: EventKind,
}

/// Where a given kind of event sorts relative to others at the same cumulative tick: tempo and
/// signature changes take effect before anything else at that instant, program changes before the
/// notes they affect, and `EndTrack` always last.
fn meta_priority(kind: &EventKind) -> u8 {
    match kind {
        EventKind::Meta(MetaEvent::SetTempo(_)) => 0,
        EventKind::Meta(MetaEvent::SetTimeSignature(_)) => 1,
        EventKind::Channel(ChannelEvent::ProgramChange { .. }) => 2,
        EventKind::Meta(MetaEvent::EndTrack) => 4,
        _ => 3,
    }
}

/// Folds a flat, unsorted list of staged events onto `base` and the caller-visible `Event` list:
/// `SetTempo`/`SetTimeSignature` events are consumed into the map, `ProgramChange` events into a
/// running per-`(track, channel)` program history (seeded from `programs`), and `EndTrack` dropped
/// entirely. Every remaining event is stamped with the tempo, signature, and program in force at
/// its cumulative position.
///
/// `base` and `programs` are the already-established node map and program history to fold on top
/// of: a fresh [`TimeSpecification::new`] and an empty map for [`Sequence::parse`], but the
/// sequence's current map (cloned) and [`seed_programs`]'s output for [`Sequence::update`]/
/// [`Sequence::bytes`], so that state survives even though caller-visible events never carry a
/// `SetTempo`/`SetTimeSignature`/`ProgramChange` kind directly (those are stripped on the way in).
fn rebuild(
    mut staged: Vec<Staged>,
    base: TimeSpecification,
    mut programs: HashMap<(u16, Channel), Program>,
) -> (Rc<RefCell<TimeSpecification>>, Vec<Event>) {
    staged.sort_by_key(|s| (s.cumulative, meta_priority(&s.kind)));

    let specification = Rc::new(RefCell::new(base));
    let mut built: Vec<(i64, u16, Event)> = Vec::with_capacity(staged.len());

    for s in staged {
        match &s.kind {
            EventKind::Meta(MetaEvent::SetTempo(tempo)) => {
                specification.borrow_mut().set_tempo_at(s.cumulative, *tempo);
                continue;
            }
            EventKind::Meta(MetaEvent::SetTimeSignature(signature)) => {
                specification
                    .borrow_mut()
                    .set_signature_at(s.cumulative, *signature);
                continue;
            }
            EventKind::Meta(MetaEvent::EndTrack) => continue,
            EventKind::Channel(ChannelEvent::ProgramChange { program }) => {
                if let Some(channel) = s.channel {
                    programs.insert((s.track, channel), *program);
                }
                continue;
            }
            _ => {}
        }

        let tempo = specification.borrow().tempo_at_cumulative(s.cumulative);
        let signature = specification.borrow().signature_at_cumulative(s.cumulative);
        let program = s
            .channel
            .map(|channel| *programs.entry((s.track, channel)).or_insert_with(Program::default));
        let time = Time::from_cumulative(s.cumulative, specification.clone());

        built.push((
            s.cumulative,
            s.track,
            Event {
                time,
                track: s.track,
                channel: s.channel,
                tempo,
                signature,
                program,
                kind: s.kind,
            },
        ));
    }

    built.sort_by_key(|(cumulative, track, event)| (*cumulative, *track, meta_priority(&event.kind)));
    let events = built.into_iter().map(|(_, _, event)| event).collect();
    (specification, events)
}

/// Seeds a `(track, channel)` program history from each channel event's already-stamped `program`,
/// taking the first one seen per channel (the events are already in chronological order). Used so
/// that a second `rebuild` over the same events (from [`Sequence::update`]/[`Sequence::bytes`])
/// does not forget program history that no longer appears as an explicit `ProgramChange` kind.
fn seed_programs(events: &[Event]) -> HashMap<(u16, Channel), Program> {
    let mut programs = HashMap::new();
    for event in events {
        if let (Some(channel), Some(program)) = (event.channel, event.program) {
            programs.entry((event.track, channel)).or_insert(program);
        }
    }
    programs
}

fn read_chunk_id<R: Read>(iter: &mut ByteIter<R>) -> LibResult<String> {
    let bytes = iter.read4().context(io!())?;
    ensure!(
        bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' '),
        error::ChunkIdInvalid {
            site: site!(),
            found: bytes.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(" "),
        }
    );
    Ok(String::from_utf8(bytes.to_vec()).expect("chunk id bytes were validated as ASCII"))
}

fn read_chunk_len<R: Read>(iter: &mut ByteIter<R>) -> LibResult<u32> {
    iter.read_u32().context(io!())
}

fn read_chunk_bytes<R: Read>(iter: &mut ByteIter<R>, len: usize) -> LibResult<Vec<u8>> {
    match iter.read_n(len) {
        Ok(bytes) => Ok(bytes),
        Err(ByteError::End { .. }) => error::ChunkTruncated { site: site!() }.fail(),
        Err(other) => Err(other).context(io!()),
    }
}

fn parse_header<R: Read>(iter: &mut ByteIter<R>) -> LibResult<(Header, u16)> {
    let id = read_chunk_id(iter)?;
    ensure!(
        id == "MThd",
        error::ChunkIdMismatch {
            site: site!(),
            expected: "MThd".to_string(),
            found: id,
        }
    );
    let len = read_chunk_len(iter)?;
    ensure!(
        len == 6,
        error::InvalidFile {
            site: site!(),
            description: "MThd chunk length must be 6",
        }
    );
    let bytes = read_chunk_bytes(iter, 6)?;
    let format = u16::from_be_bytes([bytes[0], bytes[1]]);
    let ntracks = u16::from_be_bytes([bytes[2], bytes[3]]);
    let division = u16::from_be_bytes([bytes[4], bytes[5]]);
    let header = Header::parse(format, division)?;
    Ok((header, ntracks))
}

fn parse_track_body<R: Read>(
    iter: &mut ByteIter<R>,
    track: u16,
    staged: &mut Vec<Staged>,
) -> LibResult<()> {
    let mut cumulative: i64 = 0;
    loop {
        if iter.is_end() {
            return error::UnterminatedTrack { site: site!() }.fail();
        }
        let delta = iter.read_vlq_u32().context(io!())?;
        cumulative += delta as i64;
        let status = iter.peek_or_die().context(io!())?;
        let (channel, kind, is_end) = match status {
            0xFF => {
                iter.read_or_die().context(io!())?;
                let meta_type = iter.read_or_die().context(io!())?;
                let meta = MetaEvent::parse(iter, meta_type)?;
                iter.set_latest_message_byte(None);
                let is_end = matches!(meta, MetaEvent::EndTrack);
                (None, EventKind::Meta(meta), is_end)
            }
            0xF0 | 0xF7 => {
                let first = iter.read_or_die().context(io!())?;
                let sysex = SysexEvent::parse(first, iter)?;
                iter.set_latest_message_byte(None);
                (None, EventKind::SysEx(sysex), false)
            }
            _ => {
                let (channel, event) = ChannelEvent::parse(iter)?;
                (Some(channel), EventKind::Channel(event), false)
            }
        };
        staged.push(Staged {
            cumulative,
            track,
            channel,
            kind,
        });
        if is_end {
            return Ok(());
        }
    }
}

fn parse_track_events<R: Read>(
    iter: &mut ByteIter<R>,
    chunk_len: u32,
    track: u16,
    staged: &mut Vec<Staged>,
) -> LibResult<()> {
    iter.set_size_limit(chunk_len as u64);
    let result = parse_track_body(iter, track, staged);
    iter.clear_size_limit();
    match result {
        Ok(()) => Ok(()),
        Err(LibError::Io {
            source: ByteError::End { .. },
            ..
        }) => error::UnterminatedTrack { site: site!() }.fail(),
        Err(other) => Err(other),
    }
}

fn parse_tracks<R: Read>(iter: &mut ByteIter<R>, ntracks: u16) -> LibResult<Vec<Staged>> {
    let mut staged = Vec::new();
    let mut found = 0u16;
    while found < ntracks {
        ensure!(!iter.is_end(), error::ChunkTruncated { site: site!() });
        let id = read_chunk_id(iter)?;
        let len = read_chunk_len(iter)?;
        if id == "MTrk" {
            parse_track_events(iter, len, found, &mut staged)?;
            found += 1;
        } else {
            let _ = read_chunk_bytes(iter, len as usize)?;
        }
    }
    Ok(staged)
}

/// Derives the `SetTempo`/`SetTimeSignature`/`ProgramChange` events the wire format needs to
/// reproduce `specification` and each event's stamped program, and interleaves them with the
/// caller-visible events. Tempo and signature changes are placed on track 0; program changes share
/// their event's track.
fn materialize_for_emit(
    specification: &TimeSpecification,
    events: &[Event],
) -> LibResult<Vec<MaterializedEvent>> {
    let mut materialized = Vec::new();

    let mut prev_tempo = Tempo::default();
    let mut prev_signature = TimeSignature::default();
    for node in specification.nodes() {
        if node.tempo() != prev_tempo {
            materialized.push(MaterializedEvent {
                cumulative: node.cumulative(),
                track: 0,
                channel: None,
                kind: EventKind::Meta(MetaEvent::SetTempo(node.tempo())),
            });
            prev_tempo = node.tempo();
        }
        if node.signature() != prev_signature {
            materialized.push(MaterializedEvent {
                cumulative: node.cumulative(),
                track: 0,
                channel: None,
                kind: EventKind::Meta(MetaEvent::SetTimeSignature(node.signature())),
            });
            prev_signature = node.signature();
        }
    }

    let mut programs: HashMap<(u16, Channel), Program> = HashMap::new();
    for event in events {
        let cumulative = event.time.cumulative()?;
        if let (Some(channel), Some(program)) = (event.channel, event.program) {
            // Absent means "never seen", which is the default program, not an unconditional
            // mismatch -- otherwise a channel that never had an explicit `ProgramChange` would get
            // a spurious one materialized before its first event.
            let current = programs.get(&(event.track, channel)).copied().unwrap_or_default();
            if current != program {
                materialized.push(MaterializedEvent {
                    cumulative,
                    track: event.track,
                    channel: Some(channel),
                    kind: EventKind::Channel(ChannelEvent::ProgramChange { program }),
                });
                programs.insert((event.track, channel), program);
            }
        }
        materialized.push(MaterializedEvent {
            cumulative,
            track: event.track,
            channel: event.channel,
            kind: event.kind.clone(),
        });
    }

    Ok(materialized)
}

impl Sequence {
    /// Builds an empty sequence with no events.
    pub fn new(format: Format, division: TimeDivision) -> Self {
        Sequence {
            format,
            specification: Rc::new(RefCell::new(TimeSpecification::new(division))),
            events: Vec::new(),
        }
    }

    /// Parses a sequence from a Standard MIDI File byte stream.
    pub fn parse<R: Read>(r: R) -> crate::Result<Self> {
        Ok(Self::parse_inner(r)?)
    }

    /// Parses a sequence from an in-memory byte slice.
    pub fn parse_bytes(bytes: &[u8]) -> crate::Result<Self> {
        Self::parse(Cursor::new(bytes.to_vec()))
    }

    fn parse_inner<R: Read>(r: R) -> LibResult<Self> {
        let mut iter = ByteIter::new(r.bytes()).context(io!())?;
        let (header, ntracks) = parse_header(&mut iter)?;
        let staged = parse_tracks(&mut iter, ntracks)?;
        let (specification, events) = rebuild(staged, TimeSpecification::new(header.division()), HashMap::new());
        Ok(Sequence {
            format: header.format(),
            specification,
            events,
        })
    }

    /// Serializes this sequence to Standard MIDI File bytes. Equivalent to calling
    /// [`Self::update`] on a clone and then writing out its node map and event list.
    pub fn bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(self.bytes_inner()?)
    }

    fn bytes_inner(&self) -> LibResult<Vec<u8>> {
        let base = self.specification.borrow().clone();
        let programs = seed_programs(&self.events);
        let mut staged = Vec::with_capacity(self.events.len());
        for event in &self.events {
            staged.push(Staged {
                cumulative: event.time.cumulative()?,
                track: event.track,
                channel: event.channel,
                kind: event.kind.clone(),
            });
        }
        let (specification, events) = rebuild(staged, base, programs);
        let specification = specification.borrow();

        let mut materialized = materialize_for_emit(&specification, &events)?;

        if self.format == Format::Single {
            for event in &mut materialized {
                event.track = 0;
            }
        }

        let max_track = materialized.iter().map(|e| e.track).max().unwrap_or(0);
        for track in 0..=max_track {
            let end_cumulative = materialized
                .iter()
                .filter(|e| e.track == track)
                .map(|e| e.cumulative)
                .max()
                .unwrap_or(0);
            materialized.push(MaterializedEvent {
                cumulative: end_cumulative,
                track,
                channel: None,
                kind: EventKind::Meta(MetaEvent::EndTrack),
            });
        }

        materialized.sort_by_key(|e| (e.cumulative, e.track, meta_priority(&e.kind)));

        let ntracks = max_track + 1;
        let header = Header::new(self.format, specification.division());

        let mut out: Vec<u8> = Vec::new();
        {
            let mut scribe = Scribe::new(&mut out, ScribeSettings::default());
            header.write(&mut scribe, ntracks)?;
        }

        for track in 0..ntracks {
            let mut payload: Vec<u8> = Vec::new();
            {
                let mut scribe = Scribe::new(&mut payload, ScribeSettings::default());
                let mut last_cumulative: i64 = 0;
                for event in materialized.iter().filter(|e| e.track == track) {
                    let delta = (event.cumulative - last_cumulative) as u32;
                    last_cumulative = event.cumulative;
                    scribe
                        .write_all(&Vlq::new(delta).to_bytes())
                        .context(wr!())?;
                    match &event.kind {
                        EventKind::Channel(channel_event) => {
                            channel_event.write(&mut scribe, event.channel.unwrap_or_default())?
                        }
                        EventKind::Meta(meta_event) => meta_event.write(&mut scribe)?,
                        EventKind::SysEx(sysex_event) => sysex_event.write(&mut scribe)?,
                    }
                }
            }
            ensure!(
                payload.len() <= u32::MAX as usize,
                error::TrackTooLong { site: site!() }
            );
            out.write_all(b"MTrk").context(wr!())?;
            out.write_all(&(payload.len() as u32).to_be_bytes())
                .context(wr!())?;
            out.write_all(&payload).context(wr!())?;
        }

        Ok(out)
    }

    /// The file format: whether tracks play simultaneously or sequentially.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Converts this sequence to a different file format. Currently only `Single` (format 0) to
    /// `Multi` (format 1) is supported: meta events move to track 0 and channel/sysex events to
    /// track 1.
    pub fn set_format(&mut self, format: Format) -> crate::Result<()> {
        Ok(self.set_format_inner(format)?)
    }

    fn set_format_inner(&mut self, format: Format) -> LibResult<()> {
        if format == self.format {
            return Ok(());
        }
        match (self.format, format) {
            (Format::Single, Format::Multi) => {
                for event in &mut self.events {
                    event.track = match &event.kind {
                        EventKind::Meta(_) => 0,
                        EventKind::Channel(_) | EventKind::SysEx(_) => 1,
                    };
                }
                self.format = format;
                Ok(())
            }
            _ => error::FormatConversion {
                site: site!(),
                description: format!("{:?} to {:?} is not supported", self.format, format),
            }
            .fail(),
        }
    }

    /// The file's time division.
    pub fn division(&self) -> TimeDivision {
        self.specification.borrow().division()
    }

    /// The node map governing this sequence's events. Shared with every [`Time`] this sequence
    /// has handed out; rebuilt (as a new map, not mutated in place) by [`Self::update`].
    pub fn specification(&self) -> Rc<RefCell<TimeSpecification>> {
        self.specification.clone()
    }

    /// All events, in chronological order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// The events belonging to a single track, in chronological order.
    pub fn track(&self, index: u16) -> Vec<&Event> {
        self.events.iter().filter(|e| e.track == index).collect()
    }

    /// Appends a single event. Its `tempo`/`signature`/`program` and its place in chronological
    /// order are not authoritative until [`Self::update`] is called.
    pub fn append(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Appends every event from an iterator. See [`Self::append`].
    pub fn extend<I: IntoIterator<Item = Event>>(&mut self, events: I) {
        self.events.extend(events);
    }

    /// Rebuilds the node map and re-stamps every event's `tempo`, `signature`, and `program` from
    /// scratch, in chronological order. Any `SetTempo`, `SetTimeSignature`, or `ProgramChange`
    /// events the caller appended directly are folded into the node map / program history and
    /// removed from the visible event list, exactly as [`Self::parse`] does. Replaces
    /// [`Self::specification`]'s map with a freshly built one rather than mutating it in place;
    /// callers holding an older [`Rc`] from before this call should fetch a new one.
    pub fn update(&mut self) -> crate::Result<()> {
        Ok(self.update_inner()?)
    }

    fn update_inner(&mut self) -> LibResult<()> {
        let base = self.specification.borrow().clone();
        let programs = seed_programs(&self.events);
        let mut staged = Vec::with_capacity(self.events.len());
        for event in &self.events {
            staged.push(Staged {
                cumulative: event.time.cumulative()?,
                track: event.track,
                channel: event.channel,
                kind: event.kind.clone(),
            });
        }
        let (specification, events) = rebuild(staged, base, programs);
        self.specification = specification;
        self.events = events;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(format: u16, ntracks: u16, division: u16) -> Vec<u8> {
        let mut bytes = b"MThd".to_vec();
        bytes.extend_from_slice(&6u32.to_be_bytes());
        bytes.extend_from_slice(&format.to_be_bytes());
        bytes.extend_from_slice(&ntracks.to_be_bytes());
        bytes.extend_from_slice(&division.to_be_bytes());
        bytes
    }

    fn track_bytes(payload: &[u8]) -> Vec<u8> {
        let mut bytes = b"MTrk".to_vec();
        bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn minimal_empty_format_zero_round_trips() {
        let mut bytes = header_bytes(0, 1, 480);
        bytes.extend(track_bytes(&[0x00, 0xFF, 0x2F, 0x00]));

        let sequence = Sequence::parse_bytes(&bytes).unwrap();
        assert_eq!(sequence.format(), Format::Single);
        assert_eq!(sequence.events().count(), 0);
        assert_eq!(sequence.bytes().unwrap(), bytes);
    }

    #[test]
    fn single_note_on_off_round_trips() {
        let mut payload = vec![0x00, 0x90, 0x3C, 0x64]; // NoteOn ch0 note60 vel100
        payload.extend_from_slice(&[0x83, 0x60, 0x80, 0x3C, 0x00]); // delta 480, NoteOff
        payload.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]); // EndTrack

        let mut bytes = header_bytes(0, 1, 480);
        bytes.extend(track_bytes(&payload));

        let sequence = Sequence::parse_bytes(&bytes).unwrap();
        let events: Vec<_> = sequence.events().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0].kind(), EventKind::Channel(ChannelEvent::NoteOn { .. })));
        assert!(matches!(events[1].kind(), EventKind::Channel(ChannelEvent::NoteOff { .. })));
        assert_eq!(events[0].time().cumulative().unwrap(), 0);
        assert_eq!(events[1].time().cumulative().unwrap(), 480);
        assert_eq!(events[0].program().unwrap().number(), 1);

        assert_eq!(sequence.bytes().unwrap(), bytes);
    }

    #[test]
    fn tempo_change_mid_track_is_stamped() {
        let mut payload = vec![0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]; // SetTempo 500000 (120bpm)
        payload.extend_from_slice(&[0x87, 0x40, 0xFF, 0x51, 0x03, 0x06, 0x1A, 0x80]); // delta 960, SetTempo 400000 (150bpm)
        payload.extend_from_slice(&[0x00, 0x90, 0x3C, 0x64]); // NoteOn
        payload.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]); // EndTrack

        let mut bytes = header_bytes(0, 1, 480);
        bytes.extend(track_bytes(&payload));

        let sequence = Sequence::parse_bytes(&bytes).unwrap();
        let events: Vec<_> = sequence.events().collect();
        assert_eq!(events.len(), 1);
        let note_on = events[0];
        assert_eq!(note_on.time().cumulative().unwrap(), 960);
        assert!((note_on.tempo().bpm() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn three_eight_signature_is_stamped() {
        let mut payload = vec![0x00, 0xFF, 0x58, 0x04, 0x03, 0x03, 0x18, 0x08]; // SetTimeSignature 3/8
        payload.extend_from_slice(&[0x87, 0x40, 0x90, 0x3C, 0x64]); // delta 960, NoteOn
        payload.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]); // EndTrack

        let mut bytes = header_bytes(0, 1, 480);
        bytes.extend(track_bytes(&payload));

        let sequence = Sequence::parse_bytes(&bytes).unwrap();
        let events: Vec<_> = sequence.events().collect();
        assert_eq!(events.len(), 1);
        let note_on = events[0];
        assert_eq!(note_on.signature().numerator(), 3);
        assert_eq!(note_on.signature().denominator(), 8);
        assert_eq!(note_on.time().triple().unwrap(), (2, 1, 0));
    }

    #[test]
    fn format_zero_to_one_splits_meta_and_channel_tracks() {
        let mut payload = vec![0x00, 0xFF, 0x03, 0x03, b'a', b'b', b'c']; // Name "abc"
        payload.extend_from_slice(&[0x00, 0x90, 0x3C, 0x64]); // NoteOn
        payload.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]); // EndTrack

        let mut bytes = header_bytes(0, 1, 480);
        bytes.extend(track_bytes(&payload));

        let mut sequence = Sequence::parse_bytes(&bytes).unwrap();
        sequence.set_format(Format::Multi).unwrap();

        let track0 = sequence.track(0);
        let track1 = sequence.track(1);
        assert_eq!(track0.len(), 1);
        assert_eq!(track1.len(), 1);
        assert!(matches!(track0[0].kind(), EventKind::Meta(MetaEvent::Name(_))));
        assert!(matches!(track1[0].kind(), EventKind::Channel(ChannelEvent::NoteOn { .. })));

        let emitted = sequence.bytes().unwrap();
        let reparsed = Sequence::parse_bytes(&emitted).unwrap();
        assert_eq!(reparsed.format(), Format::Multi);
        assert_eq!(reparsed.track(0).len(), 1);
        assert_eq!(reparsed.track(1).len(), 1);
    }

    #[test]
    fn unsupported_format_conversion_fails() {
        let mut sequence = Sequence::new(Format::Multi, TimeDivision::ppqn(480).unwrap());
        assert!(sequence.set_format(Format::Single).is_err());
    }

    #[test]
    fn overlong_varint_is_rejected() {
        let mut bytes = header_bytes(0, 1, 480);
        // Six continuation-flagged bytes: no VarInt may be longer than five.
        bytes.extend(track_bytes(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x00]));
        assert!(Sequence::parse_bytes(&bytes).is_err());
    }

    #[test]
    fn truncated_varint_is_rejected() {
        let mut bytes = header_bytes(0, 1, 480);
        bytes.extend(track_bytes(&[0x80]));
        assert!(Sequence::parse_bytes(&bytes).is_err());
    }

    #[test]
    fn unterminated_track_is_rejected() {
        let mut bytes = header_bytes(0, 1, 480);
        bytes.extend(track_bytes(&[0x00, 0x90, 0x3C, 0x64]));
        assert!(Sequence::parse_bytes(&bytes).is_err());
    }
}
