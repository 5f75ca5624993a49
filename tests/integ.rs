mod utils;

use midi_sequence::{ChannelEvent, EventKind, Format, MetaEvent, Sequence};
use utils::enable_logging;

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

// Scenario 1: minimal empty format-0 file round-trips byte-for-byte.
#[test]
fn minimal_empty_format_zero() {
    enable_logging();
    let mut bytes = header_bytes(0, 1, 480);
    bytes.extend(track_bytes(&[0x00, 0xFF, 0x2F, 0x00]));

    let sequence = Sequence::parse_bytes(&bytes).unwrap();
    assert_eq!(sequence.format(), Format::Single);
    assert_eq!(sequence.division().ppqn_value(), Some(480));
    assert_eq!(sequence.events().count(), 0);
    assert_eq!(sequence.bytes().unwrap(), bytes);
}

// Scenario 2: a single NoteOn/NoteOff pair.
#[test]
fn single_note_on_off() {
    enable_logging();
    let mut payload = vec![0x00, 0x90, 0x3C, 0x64]; // NoteOn ch0 note60 vel100 at 0
    payload.extend_from_slice(&[0x60, 0x80, 0x3C, 0x40]); // delta 96, NoteOff vel64
    payload.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

    let mut bytes = header_bytes(0, 1, 480);
    bytes.extend(track_bytes(&payload));

    let sequence = Sequence::parse_bytes(&bytes).unwrap();
    let events: Vec<_> = sequence.events().collect();
    assert_eq!(events.len(), 2);

    let note_on = match events[0].kind() {
        EventKind::Channel(e @ ChannelEvent::NoteOn { .. }) => e,
        other => panic!("expected NoteOn, got {:?}", other),
    };
    match note_on {
        ChannelEvent::NoteOn { note, velocity } => {
            assert_eq!(note.get(), 60);
            assert_eq!(velocity.get(), 100);
        }
        _ => unreachable!(),
    }
    assert_eq!(events[0].time().cumulative().unwrap(), 0);
    assert_eq!(events[1].time().cumulative().unwrap(), 96);
    assert!(matches!(events[1].kind(), EventKind::Channel(ChannelEvent::NoteOff { .. })));

    assert_eq!(sequence.bytes().unwrap(), bytes);
}

// Scenario 3: a tempo change mid-track is folded into the node map and stamped onto later events.
#[test]
fn tempo_change_mid_track() {
    enable_logging();
    let mut payload = vec![0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]; // SetTempo 500000 mpqn (120bpm) at 0
    payload.extend_from_slice(&[0x87, 0x40, 0xFF, 0x51, 0x03, 0x06, 0x1A, 0x80]); // delta 960, SetTempo 400000 mpqn (150bpm)
    payload.extend_from_slice(&[0x83, 0x60, 0x90, 0x3C, 0x64]); // delta 480, NoteOn at cumulative 1440
    payload.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

    let mut bytes = header_bytes(0, 1, 480);
    bytes.extend(track_bytes(&payload));

    let sequence = Sequence::parse_bytes(&bytes).unwrap();
    let events: Vec<_> = sequence.events().collect();
    assert_eq!(events.len(), 1);
    let note_on = events[0];
    assert_eq!(note_on.time().cumulative().unwrap(), 1440);
    assert!((note_on.tempo().bpm() - 150.0).abs() < 1e-9);

    let spec = sequence.specification();
    assert_eq!(spec.borrow().nodes().len(), 2);
}

// Scenario 4: a 3/8 time signature governs the derived bar/beat/tick triple, right at the
// bar boundary: cumulative 719 -> (1, 3, 239); cumulative 720 -> (2, 1, 0).
#[test]
fn time_signature_edge() {
    enable_logging();
    // delta VLQ encodings: 719 = [0x85, 0x4F], 720 = [0x85, 0x50].
    for (delta_bytes, expected) in [
        (&[0x85u8, 0x4Fu8][..], (1u32, 3u32, 239u32)),
        (&[0x85, 0x50][..], (2u32, 1u32, 0u32)),
    ] {
        let mut payload = vec![0x00, 0xFF, 0x58, 0x04, 0x03, 0x03, 0x18, 0x08]; // SetTimeSignature 3/8 at 0
        payload.extend_from_slice(delta_bytes);
        payload.extend_from_slice(&[0x90, 0x3C, 0x64]); // NoteOn
        payload.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

        let mut bytes = header_bytes(0, 1, 480);
        bytes.extend(track_bytes(&payload));

        let sequence = Sequence::parse_bytes(&bytes).unwrap();
        let events: Vec<_> = sequence.events().collect();
        assert_eq!(events.len(), 1);
        let note_on = events[0];
        assert_eq!(note_on.signature().numerator(), 3);
        assert_eq!(note_on.signature().denominator(), 8);
        assert_eq!(note_on.time().triple().unwrap(), expected);
    }
}

// Scenario 5: converting a format-0 file to format 1 splits meta and channel events onto separate
// tracks, and the result still parses back to an equivalent event set.
#[test]
fn format_zero_to_one_conversion() {
    enable_logging();
    let mut payload = vec![0x00, 0xFF, 0x03, 0x03, b'a', b'b', b'c']; // Name "abc"
    payload.extend_from_slice(&[0x00, 0x90, 0x3C, 0x64]);
    payload.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

    let mut bytes = header_bytes(0, 1, 480);
    bytes.extend(track_bytes(&payload));

    let mut sequence = Sequence::parse_bytes(&bytes).unwrap();
    sequence.set_format(Format::Multi).unwrap();

    assert_eq!(sequence.track(0).len(), 1);
    assert_eq!(sequence.track(1).len(), 1);
    assert!(matches!(sequence.track(0)[0].kind(), EventKind::Meta(MetaEvent::Name(_))));
    assert!(matches!(sequence.track(1)[0].kind(), EventKind::Channel(ChannelEvent::NoteOn { .. })));

    let emitted = sequence.bytes().unwrap();
    let reparsed = Sequence::parse_bytes(&emitted).unwrap();
    assert_eq!(reparsed.format(), Format::Multi);
    assert_eq!(reparsed.track(0).len(), 1);
    assert_eq!(reparsed.track(1).len(), 1);
}

// Scenario 6: malformed VarInts are rejected with the expected failure mode.
#[test]
fn malformed_varint_rejected() {
    enable_logging();
    // Five continuation-flagged bytes: no VarInt may be longer than four payload bytes worth of
    // continuation (a sixth continuation-flagged byte is the failure).
    let mut too_long = header_bytes(0, 1, 480);
    too_long.extend(track_bytes(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x00]));
    assert!(Sequence::parse_bytes(&too_long).is_err());

    let mut truncated = header_bytes(0, 1, 480);
    truncated.extend(track_bytes(&[0x80]));
    assert!(Sequence::parse_bytes(&truncated).is_err());
}

#[test]
fn unterminated_track_rejected() {
    enable_logging();
    let mut bytes = header_bytes(0, 1, 480);
    bytes.extend(track_bytes(&[0x00, 0x90, 0x3C, 0x64]));
    assert!(Sequence::parse_bytes(&bytes).is_err());
}
