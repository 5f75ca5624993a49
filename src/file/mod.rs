/*!
The `file` module is for types and concepts strictly related to MIDI *files*.
These are kept separate from types and concepts that are also used in realtime MIDI (`core`).
!*/

mod header;
mod meta_event;
mod sequence;
mod sysex;

pub use header::{Format, Header};
pub use meta_event::MetaEvent;
pub use sequence::{Event, EventKind, Sequence};
pub use sysex::{SysexEvent, SysexEventType};
