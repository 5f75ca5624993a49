/*!
The `macros` module provides macros for internal use.
!*/

/// Writes a single byte, mapping any I/O error through the `wr!()` snafu context selector.
macro_rules! write_u8 {
    ($w:expr, $val:expr) => {
        $w.write_all(&[$val]).context(wr!())
    };
}

/// Snafu context selector for the write-path analog of `io!()`.
macro_rules! wr {
    () => {
        crate::error::Write { site: site!() }
    };
}
