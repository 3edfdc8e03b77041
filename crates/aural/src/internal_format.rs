//! The working format of the effect chain.

use aural_common_audio::channel_buffer::ChannelBuffer;

use crate::config::Pipeline;
use crate::stream_format::StreamFormat;

/// Sample rates the effects run at.
pub(crate) const NATIVE_SAMPLE_RATES_HZ: [u32; 4] = [8_000, 16_000, 32_000, 48_000];

/// Reverse processing rate used until the capture stream is configured.
pub(crate) const DEFAULT_REVERSE_RATE_HZ: u32 = 16_000;

/// 10 ms of deinterleaved float-S16 audio in an [`InternalFormat`].
pub(crate) type InternalFrame = ChannelBuffer<f32>;

/// Rate and channel layout of an [`InternalFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InternalFormat {
    pub(crate) sample_rate_hz: u32,
    pub(crate) num_channels: usize,
}

impl InternalFormat {
    /// Format of the capture path for the given external formats.
    ///
    /// The rate is the native rate nearest to the lower of the two external
    /// rates, ties going up, capped at the configured maximum. Capture is
    /// mono unless multi-channel capture is enabled.
    pub(crate) fn for_capture(input: StreamFormat, output: StreamFormat, pipeline: &Pipeline) -> Self {
        let rate = input.sample_rate_hz().min(output.sample_rate_hz());
        let max_rate = pipeline.maximum_internal_processing_rate.as_hz();
        let sample_rate_hz = nearest_native_rate(rate).min(max_rate);
        let num_channels = if pipeline.multi_channel_capture {
            input.num_channels() as usize
        } else {
            1
        };
        Self {
            sample_rate_hz,
            num_channels,
        }
    }

    /// Mono reference format at the capture processing rate.
    pub(crate) fn for_reverse(capture_rate_hz: u32) -> Self {
        Self {
            sample_rate_hz: capture_rate_hz,
            num_channels: 1,
        }
    }

    pub(crate) fn num_frames(&self) -> usize {
        self.sample_rate_hz as usize / 100
    }

    pub(crate) fn new_frame(&self) -> InternalFrame {
        ChannelBuffer::new(self.num_frames(), self.num_channels)
    }
}

fn nearest_native_rate(rate: u32) -> u32 {
    let mut best = NATIVE_SAMPLE_RATES_HZ[0];
    for candidate in NATIVE_SAMPLE_RATES_HZ {
        if candidate.abs_diff(rate) <= best.abs_diff(rate) {
            best = candidate;
        }
    }
    best
}
