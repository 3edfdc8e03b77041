//! Error type of the processing API.

use std::fmt;

use crate::stream_format::{StreamFormatError, StreamKind};

/// Errors returned by [`AudioProcessor`](crate::AudioProcessor).
///
/// Every failing call leaves the processor unchanged, except
/// [`BadStreamParameter`](Self::BadStreamParameter), which reports that a
/// clamped value was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sample rate or channel count is out of range.
    InvalidFormat(StreamFormatError),
    /// A frame or output buffer has the wrong length. Counted in samples, or
    /// in bytes for the byte API.
    FrameSizeMismatch { expected: usize, actual: usize },
    /// The stream has not been given a format yet.
    NotConfigured(StreamKind),
    /// Echo cancellation is enabled but no reverse format was ever set.
    MissingReverseFormat,
    /// A stream parameter was out of range and has been clamped.
    BadStreamParameter,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat(err) => write!(f, "invalid stream format: {err}"),
            Self::FrameSizeMismatch { expected, actual } => {
                write!(f, "frame size mismatch: expected {expected}, got {actual}")
            }
            Self::NotConfigured(kind) => write!(f, "{kind} stream format not configured"),
            Self::MissingReverseFormat => {
                write!(f, "echo cancellation requires a reverse stream format")
            }
            Self::BadStreamParameter => write!(f, "stream parameter out of range, clamped"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidFormat(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StreamFormatError> for Error {
    fn from(err: StreamFormatError) -> Self {
        Self::InvalidFormat(err)
    }
}
