use snafu::Snafu;

/// The public Error type for this library.
#[derive(Debug, Snafu)]
pub struct Error(LibError);

/// The public Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// The internal Result type for this library.
pub(crate) type LibResult<T> = std::result::Result<T, LibError>;

/// The internal Error type for this library.
#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub(crate) enum LibError {
    #[snafu(display("Error while reading bytes: {}", source))]
    Io {
        site: String,
        source: crate::byte_iter::ByteError,
    },

    #[snafu(display("{} error while writing bytes: {}", site, source))]
    Write {
        site: String,
        source: std::io::Error,
    },

    #[snafu(display("{}: The MIDI file is invalid: {}", site, description))]
    InvalidFile { site: String, description: String },

    #[snafu(display("{}: chunk id '{}' is not valid ASCII", site, found))]
    ChunkIdInvalid { site: String, found: String },

    #[snafu(display(
        "{}: expected chunk id '{}' but found '{}'",
        site,
        expected,
        found
    ))]
    ChunkIdMismatch {
        site: String,
        expected: String,
        found: String,
    },

    #[snafu(display("{}: chunk was truncated before its declared length", site))]
    ChunkTruncated { site: String },

    #[snafu(display("{}: track ended without an EndTrack meta event", site))]
    UnterminatedTrack { site: String },

    #[snafu(display("{}: unknown event status byte {:#04X}", site, byte))]
    UnknownEventStatus { site: String, byte: u8 },

    #[snafu(display("{}: unknown meta event type {:#04X}", site, byte))]
    UnknownMetaType { site: String, byte: u8 },

    /// Reserved for a build that rejects system exclusive events outright; this implementation
    /// accepts them as opaque payloads instead, so this variant is never constructed.
    #[snafu(display("{}: system exclusive events are not supported by this build", site))]
    SysExUnsupported { site: String },

    #[snafu(display("{}: a status byte was required to establish running status", site))]
    RunningStatus { site: String },

    #[snafu(display(
        "{}: time {} is out of range for the signature in force",
        site,
        description
    ))]
    TimeOutOfRange { site: String, description: String },

    #[snafu(display(
        "{}: cannot convert a (bar, beat, tick) triple without a bound TimeSpecification",
        site
    ))]
    TripleWithoutSpecification { site: String },

    #[snafu(display("{}: program value {} is undefined: {}", site, value, description))]
    ProgramUndefined {
        site: String,
        value: i32,
        description: String,
    },

    #[snafu(display("{}: format conversion not supported: {}", site, description))]
    FormatConversion { site: String, description: String },

    #[snafu(display("{}: a string was too long to be written: {}", site, description))]
    StringTooLong { site: String, description: String },

    #[snafu(display("{}: a track exceeded the maximum representable length", site))]
    TrackTooLong { site: String },

    #[snafu(display("{} unknown error", site))]
    Other { site: String },
}

macro_rules! site {
    () => {
        format!("{}:{}", file!(), line!())
    };
}

macro_rules! io {
    () => {
        crate::error::Io { site: site!() }
    };
}

macro_rules! invalid_file_s {
    () => {
        crate::error::InvalidFile {
            site: site!(),
            description: "[no description]",
        }
    };
    ($msg:expr) => {
        crate::error::InvalidFile {
            site: site!(),
            description: $msg,
        }
    };
    ($fmt:expr, $($arg:expr),+) => {
        crate::error::InvalidFile {
            site: site!(),
            description: format!($fmt, $($arg),+),
        }
    };
}

macro_rules! invalid_file_e {
    () => {
        invalid_file_s!().build()
    };
    ($msg:expr) => {
        invalid_file_s!($msg).build()
    };
    ($fmt:expr, $($arg:expr),+) => {
        invalid_file_s!($fmt, $($arg),+).build()
    };
}

macro_rules! invalid_file_r {
    () => {
        Err(invalid_file_e!())
    };
    ($msg:expr) => {
        Err(invalid_file_e!($msg))
    };
    ($fmt:expr, $($arg:expr),+) => {
        Err(invalid_file_e!($fmt, $($arg),+))
    };
}

macro_rules! invalid_file {
    () => {
        return invalid_file_r!();
    };
    ($msg:expr) => {
        return invalid_file_r!($msg)
    };
    ($fmt:expr, $($arg:expr),+) => {
        return invalid_file_r!($fmt, $($arg),+)
    };
}

#[test]
fn site_test() {
    let line = line!() + 1;
    let site = site!();
    assert!(site.contains("error.rs"));
    assert!(site.contains(format!("{}", line).as_str()));
}

#[test]
fn invalid_file_macros_test_no_message() {
    fn foo() -> LibResult<u64> {
        invalid_file!();
    }
    let result = foo();
    assert!(result.is_err());
    let message = format!("{}", result.err().unwrap());
    assert!(message.as_str().contains("The MIDI file is invalid"));
}

#[test]
fn invalid_file_macros_test_message() {
    fn foo() -> LibResult<u64> {
        let flerbin = String::from("flerbin");
        invalid_file!(flerbin);
    }
    let result = foo();
    assert!(result.is_err());
    let message = format!("{}", result.err().unwrap());
    assert!(message.as_str().contains("flerbin"));
}

#[test]
fn invalid_file_macros_test_fmt() {
    fn foo() -> LibResult<u64> {
        invalid_file!("hello {}, {}", "world", String::from("foo"));
    }
    let result = foo();
    assert!(result.is_err());
    let message = format!("{}", result.err().unwrap());
    assert!(message.as_str().contains("hello world, foo"));
}
