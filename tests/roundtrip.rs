mod utils;

use midi_sequence::{ChannelEvent, EventKind, Format, Sequence};
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

/// A well-formed file in canonical form (no simultaneous events out of `(cumulative, track,
/// meta-priority)` order) round-trips through parse/emit byte-for-byte.
#[test]
fn canonical_file_round_trips_exactly() {
    enable_logging();
    let mut payload = vec![0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]; // SetTempo 120bpm at 0
    payload.extend_from_slice(&[0x00, 0xFF, 0x58, 0x04, 0x04, 0x02, 0x18, 0x08]); // SetTimeSignature 4/4
    payload.extend_from_slice(&[0x00, 0xC0, 0x28]); // ProgramChange to 41 (wire 0x28)
    payload.extend_from_slice(&[0x00, 0x90, 0x3C, 0x64]); // NoteOn
    payload.extend_from_slice(&[0x83, 0x60, 0x80, 0x3C, 0x40]); // delta 480, NoteOff
    payload.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

    let mut bytes = header_bytes(0, 1, 480);
    bytes.extend(track_bytes(&payload));

    let sequence = Sequence::parse_bytes(&bytes).unwrap();
    assert_eq!(sequence.bytes().unwrap(), bytes);

    // re-parsing the emitted bytes yields an equivalent sequence.
    let reparsed = Sequence::parse_bytes(&sequence.bytes().unwrap()).unwrap();
    assert_eq!(reparsed.events().count(), sequence.events().count());
}

/// After `append` + `update`, events come back out in `(cumulative, track, meta-priority)` order,
/// and every event's stamped tempo/signature/program matches what's in force at its time.
#[test]
fn append_then_update_restores_invariants() {
    enable_logging();
    let mut sequence = Sequence::new(Format::Single, midi_sequence::TimeDivision::ppqn(480).unwrap());
    let spec = sequence.specification();

    use midi_sequence::{Channel, Event, NoteNumber, Time, Velocity};

    let later = Event::new(
        Time::from_cumulative(480, spec.clone()),
        0,
        Some(Channel::from(0u8)),
        EventKind::Channel(ChannelEvent::NoteOn {
            note: NoteNumber::from(60u8),
            velocity: Velocity::from(100u8),
        }),
    );
    let earlier = Event::new(
        Time::from_cumulative(0, spec.clone()),
        0,
        Some(Channel::from(0u8)),
        EventKind::Channel(ChannelEvent::NoteOn {
            note: NoteNumber::from(64u8),
            velocity: Velocity::from(90u8),
        }),
    );

    // appended out of order on purpose.
    sequence.append(later);
    sequence.append(earlier);
    sequence.update().unwrap();

    let events: Vec<_> = sequence.events().collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].time().cumulative().unwrap(), 0);
    assert_eq!(events[1].time().cumulative().unwrap(), 480);
}

/// Every `Time` bound to a node map round-trips through both `cumulative` and `triple`.
#[test]
fn bound_time_round_trips_both_views() {
    enable_logging();
    let sequence = Sequence::new(Format::Single, midi_sequence::TimeDivision::ppqn(480).unwrap());
    let spec = sequence.specification();

    for cumulative in [0i64, 96, 480, 719, 720, 30_720] {
        let time = midi_sequence::Time::from_cumulative(cumulative, spec.clone());
        assert_eq!(time.cumulative().unwrap(), cumulative);
        let triple = time.triple().unwrap();
        let rebuilt = midi_sequence::Time::from_triple(triple.0, triple.1, triple.2, spec.clone()).unwrap();
        assert_eq!(rebuilt.cumulative().unwrap(), cumulative);
    }
}

/// `PitchBend` values at the wire extremes decode to the documented float range and re-encode
/// to the same wire bytes.
#[test]
fn pitch_bend_extremes_round_trip() {
    enable_logging();
    for (lsb, msb, expected_wire) in [(0x00u8, 0x00u8, 0u16), (0x7Fu8, 0x7Fu8, 16383u16)] {
        let mut payload = vec![0x00, 0xE0, lsb, msb]; // PitchBend ch0
        payload.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        let mut bytes = header_bytes(0, 1, 480);
        bytes.extend(track_bytes(&payload));

        let sequence = Sequence::parse_bytes(&bytes).unwrap();
        let events: Vec<_> = sequence.events().collect();
        assert_eq!(events.len(), 1);
        match events[0].kind() {
            EventKind::Channel(ChannelEvent::PitchBend { value }) => {
                let expected = (expected_wire as f64 - 8192.0) / 8192.0;
                assert!((value - expected).abs() < 1e-9);
            }
            other => panic!("expected PitchBend, got {:?}", other),
        }
        assert_eq!(sequence.bytes().unwrap(), bytes);
    }
}
