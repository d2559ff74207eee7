//! Unified error type for the livegcode-lib crate.
//!
//! [`LiveGcodeError`] covers settings I/O, validation failures at the
//! configuration boundary, and faults reported by the external collaborators
//! (command sink, activity probe). None of these ever reach the command
//! interception path; they surface from settings calls and the LED worker.

use std::fmt;

/// Unified error type for livegcode-lib operations.
#[derive(Debug)]
pub enum LiveGcodeError {
    /// Standard I/O error (settings read/write, sink writer).
    Io(std::io::Error),
    /// Configuration or update-payload validation error.
    Config(String),
    /// Color parsing error.
    Color(String),
    /// Rule pattern could not be compiled.
    Pattern(String),
    /// The command sink rejected a batch.
    Sink(String),
    /// The machine activity query failed.
    Probe(String),
}

impl fmt::Display for LiveGcodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiveGcodeError::Io(e) => write!(f, "I/O error: {e}"),
            LiveGcodeError::Config(e) => write!(f, "Config error: {e}"),
            LiveGcodeError::Color(e) => write!(f, "Color error: {e}"),
            LiveGcodeError::Pattern(e) => write!(f, "Pattern error: {e}"),
            LiveGcodeError::Sink(e) => write!(f, "Sink error: {e}"),
            LiveGcodeError::Probe(e) => write!(f, "Probe error: {e}"),
        }
    }
}

impl std::error::Error for LiveGcodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LiveGcodeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LiveGcodeError {
    fn from(e: std::io::Error) -> Self {
        LiveGcodeError::Io(e)
    }
}

/// Crate-level Result alias using [`LiveGcodeError`].
pub type Result<T> = std::result::Result<T, LiveGcodeError>;
