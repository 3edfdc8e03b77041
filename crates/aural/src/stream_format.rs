//! Stream formats: sample rate and channel count of a logical stream.

use std::fmt;
use std::num::{NonZeroU16, NonZeroU32};

/// Maximum supported sample rate in Hz.
pub const MAX_SAMPLE_RATE_HZ: u32 = 384_000;

/// Error returned when creating a [`StreamFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormatError {
    /// Sample rate is zero.
    ZeroSampleRate,
    /// Channel count is zero.
    ZeroChannels,
    /// Sample rate is above [`MAX_SAMPLE_RATE_HZ`].
    UnsupportedSampleRate { sample_rate_hz: u32 },
}

impl fmt::Display for StreamFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ZeroSampleRate => write!(f, "sample rate must be positive"),
            Self::ZeroChannels => write!(f, "channel count must be positive"),
            Self::UnsupportedSampleRate { sample_rate_hz } => write!(
                f,
                "unsupported sample rate {sample_rate_hz}; expected at most {MAX_SAMPLE_RATE_HZ}",
            ),
        }
    }
}

impl std::error::Error for StreamFormatError {}

/// The logical streams of a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Near-end (microphone) audio.
    Capture,
    /// Far-end (loudspeaker) audio used as the echo reference.
    Reverse,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capture => f.write_str("capture"),
            Self::Reverse => f.write_str("reverse"),
        }
    }
}

/// Validated sample rate and channel count of an interleaved stream.
///
/// A frame of this format holds 10 ms of audio:
/// [`num_samples()`](Self::num_samples) interleaved samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamFormat {
    sample_rate_hz: NonZeroU32,
    num_channels: NonZeroU16,
}

impl StreamFormat {
    /// Creates a stream format, rejecting zero values and rates above
    /// [`MAX_SAMPLE_RATE_HZ`].
    pub fn new(sample_rate_hz: u32, num_channels: u16) -> Result<Self, StreamFormatError> {
        let rate = NonZeroU32::new(sample_rate_hz).ok_or(StreamFormatError::ZeroSampleRate)?;
        let channels = NonZeroU16::new(num_channels).ok_or(StreamFormatError::ZeroChannels)?;
        if sample_rate_hz > MAX_SAMPLE_RATE_HZ {
            return Err(StreamFormatError::UnsupportedSampleRate { sample_rate_hz });
        }
        Ok(Self {
            sample_rate_hz: rate,
            num_channels: channels,
        })
    }

    /// The sampling rate in Hz.
    #[inline]
    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz.get()
    }

    /// The number of channels.
    #[inline]
    pub fn num_channels(&self) -> u16 {
        self.num_channels.get()
    }

    /// The number of frames per 10 ms chunk. Zero for rates below 100 Hz.
    #[inline]
    pub fn num_frames(&self) -> usize {
        self.sample_rate_hz.get() as usize / 100
    }

    /// Total number of interleaved samples per 10 ms chunk.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_channels.get() as usize * self.num_frames()
    }
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz x {}", self.sample_rate_hz, self.num_channels)
    }
}
