/*!
The `core` module is for types and concepts that are *not* strictly related to MIDI *files*.
These types and concepts could be used for realtime MIDI as well: channel messages, the musical-time
model (`Tempo`, `TimeSignature`, `TimeDivision`, `Time`/`TimeSpecification`), and the small clamped
numeric types that back them.
!*/

mod bits;
mod channel_event;
mod clocks;
mod control;
mod duration_name;
mod numbers;
mod program;
mod status_type;
mod tempo;
mod time;
mod time_division;
mod time_signature;

pub use channel_event::ChannelEvent;
pub use clocks::Clocks;
pub use control::Control;
pub use duration_name::DurationName;
pub use numbers::{Channel, ControlValue, KeyAccidentals, NoteNumber, U7, Velocity};
pub use program::{general_midi_name, Program};
pub use status_type::StatusType;
pub use tempo::Tempo;
pub use time::{Time, TimeNode, TimeSpecification};
pub use time_division::{FrameRate, SmpteDivision, TimeDivision};
pub use time_signature::TimeSignature;

pub(crate) use time::{VPN, VPQN, VPT};
