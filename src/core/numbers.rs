// channel is 0-15, displayed to users as 1-16.
clamp!(Channel, u8, 0, 15, 0, pub);

clamp!(NoteNumber, u8, 0, 127, 60, pub);
clamp!(Velocity, u8, 0, 127, 72, pub);
clamp!(U7, u8, 0, 127, 0, pub);
clamp!(ControlValue, u8, 0, 127, 0, pub);

/// A key-signature accidental count, `-7..=7` (negative = flats, positive = sharps).
clamp!(KeyAccidentals, i8, -7, 7, 0, pub);
