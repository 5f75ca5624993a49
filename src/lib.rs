/*!
`midi_sequence` reads and writes Standard MIDI Files (SMF) as a single chronologically ordered
[`Sequence`] of events, rather than as the wire format's per-track chunk structure. Parsing
collapses tracks into one timeline where every event carries an absolute position; a
[`core::TimeSpecification`] node map lets that position be read back as ticks-from-start or as a
musical `(bar, beat, tick)` triple. Editing and re-emitting keeps events, their stamped
tempo/signature/program context, and the node map mutually consistent.

```
use midi_sequence::file::Sequence;
use midi_sequence::file::Header; // re-exported for convenience
# fn main() {}
```
!*/

#![allow(dead_code)]

#[macro_use]
mod error;
#[macro_use]
mod clamp;
#[macro_use]
mod macros;

mod byte_iter;
pub mod core;
pub mod file;
mod scribe;
mod text;
pub mod vlq;

pub use error::{Error, Result};
pub use file::{Event, EventKind, Format, Header, MetaEvent, Sequence, SysexEvent, SysexEventType};
pub use text::Text;

pub use crate::core::{
    general_midi_name, Channel, ChannelEvent, Clocks, Control, ControlValue, DurationName,
    FrameRate, KeyAccidentals, NoteNumber, Program, SmpteDivision, StatusType, Tempo, Time,
    TimeDivision, TimeNode, TimeSignature, TimeSpecification, Velocity, U7,
};
