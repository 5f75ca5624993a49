use crate::error::{self, LibResult};
use std::convert::TryFrom;
use std::fmt::{self, Display, Formatter};

/// A General MIDI program number, `1..=128`. The wire representation is the program number minus
/// one, since MIDI program-change messages carry a single zero-based data byte.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub struct Program(u8);

impl Default for Program {
    fn default() -> Self {
        // Program 1 ("Acoustic Grand Piano") is the conventional default when a track has never
        // seen a ProgramChange event.
        Program(1)
    }
}

impl Program {
    /// Builds a `Program` from its one-based number, `1..=128`.
    pub fn new(number: u8) -> LibResult<Self> {
        if !(1..=128).contains(&number) {
            return error::ProgramUndefined {
                site: site!(),
                value: number as i32,
                description: "program number must be in 1..=128",
            }
            .fail();
        }
        Ok(Program(number))
    }

    /// The one-based program number, `1..=128`.
    pub fn number(&self) -> u8 {
        self.0
    }

    /// The General MIDI instrument name for this program, if it falls within the standard
    /// 128-entry melodic instrument table.
    pub fn name(&self) -> &'static str {
        general_midi_name(self.0)
    }

    /// Builds a `Program` from its wire byte (`0..=127`), which is the program number minus one.
    pub(crate) fn from_wire(byte: u8) -> Self {
        Program(byte.saturating_add(1).min(128))
    }

    /// The wire byte for this program: the one-based number minus one.
    pub(crate) fn to_wire(self) -> u8 {
        self.0 - 1
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.name())
    }
}

impl TryFrom<u8> for Program {
    type Error = crate::Error;

    fn try_from(value: u8) -> crate::Result<Self> {
        Ok(Self::new(value)?)
    }
}

/// Returns the General MIDI instrument name for a one-based program number (`1..=128`), or
/// `"Undefined"` if out of range. This is a static data table: the General MIDI program-name
/// table and its interpretation (timbre, patch banks) are out of scope for this crate.
pub fn general_midi_name(number: u8) -> &'static str {
    const NAMES: [&str; 128] = [
        "Acoustic Grand Piano",
        "Bright Acoustic Piano",
        "Electric Grand Piano",
        "Honky-tonk Piano",
        "Electric Piano 1",
        "Electric Piano 2",
        "Harpsichord",
        "Clavi",
        "Celesta",
        "Glockenspiel",
        "Music Box",
        "Vibraphone",
        "Marimba",
        "Xylophone",
        "Tubular Bells",
        "Dulcimer",
        "Drawbar Organ",
        "Percussive Organ",
        "Rock Organ",
        "Church Organ",
        "Reed Organ",
        "Accordion",
        "Harmonica",
        "Tango Accordion",
        "Acoustic Guitar (nylon)",
        "Acoustic Guitar (steel)",
        "Electric Guitar (jazz)",
        "Electric Guitar (clean)",
        "Electric Guitar (muted)",
        "Overdriven Guitar",
        "Distortion Guitar",
        "Guitar harmonics",
        "Acoustic Bass",
        "Electric Bass (finger)",
        "Electric Bass (pick)",
        "Fretless Bass",
        "Slap Bass 1",
        "Slap Bass 2",
        "Synth Bass 1",
        "Synth Bass 2",
        "Violin",
        "Viola",
        "Cello",
        "Contrabass",
        "Tremolo Strings",
        "Pizzicato Strings",
        "Orchestral Harp",
        "Timpani",
        "String Ensemble 1",
        "String Ensemble 2",
        "Synth Strings 1",
        "Synth Strings 2",
        "Choir Aahs",
        "Voice Oohs",
        "Synth Voice",
        "Orchestra Hit",
        "Trumpet",
        "Trombone",
        "Tuba",
        "Muted Trumpet",
        "French Horn",
        "Brass Section",
        "Synth Brass 1",
        "Synth Brass 2",
        "Soprano Sax",
        "Alto Sax",
        "Tenor Sax",
        "Baritone Sax",
        "Oboe",
        "English Horn",
        "Bassoon",
        "Clarinet",
        "Piccolo",
        "Flute",
        "Recorder",
        "Pan Flute",
        "Blown Bottle",
        "Shakuhachi",
        "Whistle",
        "Ocarina",
        "Lead 1 (square)",
        "Lead 2 (sawtooth)",
        "Lead 3 (calliope)",
        "Lead 4 (chiff)",
        "Lead 5 (charang)",
        "Lead 6 (voice)",
        "Lead 7 (fifths)",
        "Lead 8 (bass + lead)",
        "Pad 1 (new age)",
        "Pad 2 (warm)",
        "Pad 3 (polysynth)",
        "Pad 4 (choir)",
        "Pad 5 (bowed)",
        "Pad 6 (metallic)",
        "Pad 7 (halo)",
        "Pad 8 (sweep)",
        "FX 1 (rain)",
        "FX 2 (soundtrack)",
        "FX 3 (crystal)",
        "FX 4 (atmosphere)",
        "FX 5 (brightness)",
        "FX 6 (goblins)",
        "FX 7 (echoes)",
        "FX 8 (sci-fi)",
        "Sitar",
        "Banjo",
        "Shamisen",
        "Koto",
        "Kalimba",
        "Bag pipe",
        "Fiddle",
        "Shanai",
        "Tinkle Bell",
        "Agogo",
        "Steel Drums",
        "Woodblock",
        "Taiko Drum",
        "Melodic Tom",
        "Synth Drum",
        "Reverse Cymbal",
        "Guitar Fret Noise",
        "Breath Noise",
        "Seashore",
        "Bird Tweet",
        "Telephone Ring",
        "Helicopter",
        "Applause",
        "Gunshot",
    ];
    match number {
        1..=128 => NAMES[(number - 1) as usize],
        _ => "Undefined",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_round_trip() {
        for number in 1..=128u8 {
            let program = Program::new(number).unwrap();
            let wire = program.to_wire();
            assert_eq!(Program::from_wire(wire).number(), number);
        }
    }

    #[test]
    fn out_of_range_rejected() {
        assert!(Program::new(0).is_err());
        // 129 cannot even be expressed on the 0..=127 wire byte, but the constructor still
        // enforces the 1..=128 domain directly.
        assert!(Program::new(129).is_err());
    }

    #[test]
    fn default_is_acoustic_grand_piano() {
        assert_eq!(Program::default().number(), 1);
        assert_eq!(Program::default().name(), "Acoustic Grand Piano");
    }
}
