//! Conversion between interleaved external frames and internal frames.

use aural_common_audio::audio_converter::AudioConverter;
use aural_common_audio::audio_util::{deinterleave, interleave};
use aural_common_audio::channel_buffer::ChannelBuffer;
use aural_common_audio::channel_mixer::DownmixMethod;
use tracing::debug;

use crate::error::Error;
use crate::internal_format::{InternalFormat, InternalFrame};
use crate::stream_format::StreamFormat;

/// Resampling and channel mixing state of one stream direction.
///
/// The resampler history persists across calls and is only dropped when the
/// converter is rebuilt or [`reset`](Self::reset).
#[derive(derive_more::Debug)]
pub(crate) struct FrameConverter {
    input_format: StreamFormat,
    output_format: StreamFormat,
    internal: InternalFormat,
    #[debug(skip)]
    input: ChannelBuffer<f32>,
    #[debug(skip)]
    output: ChannelBuffer<f32>,
    #[debug(skip)]
    to_internal: AudioConverter,
    #[debug(skip)]
    from_internal: AudioConverter,
}

impl FrameConverter {
    /// Converter for frames arriving in `input_format` and leaving in
    /// `output_format`, processed in `internal`.
    pub(crate) fn new(
        input_format: StreamFormat,
        output_format: StreamFormat,
        internal: InternalFormat,
        downmix: DownmixMethod,
    ) -> Self {
        debug!(
            %input_format,
            %output_format,
            internal_rate_hz = internal.sample_rate_hz,
            internal_channels = internal.num_channels,
            "frame converter created"
        );
        let input_channels = input_format.num_channels() as usize;
        let output_channels = output_format.num_channels() as usize;
        Self {
            input_format,
            output_format,
            internal,
            input: ChannelBuffer::new(input_format.num_frames(), input_channels),
            output: ChannelBuffer::new(output_format.num_frames(), output_channels),
            to_internal: AudioConverter::new(
                input_channels,
                input_format.num_frames(),
                internal.num_channels,
                internal.num_frames(),
                downmix,
            ),
            from_internal: AudioConverter::new(
                internal.num_channels,
                internal.num_frames(),
                output_channels,
                output_format.num_frames(),
                downmix,
            ),
        }
    }

    pub(crate) fn input_format(&self) -> StreamFormat {
        self.input_format
    }

    pub(crate) fn output_format(&self) -> StreamFormat {
        self.output_format
    }

    pub(crate) fn internal_format(&self) -> InternalFormat {
        self.internal
    }

    /// Converts an interleaved frame into `internal`, mapping each sample to
    /// float-S16 with `convert`.
    pub(crate) fn to_internal<S: Copy>(
        &mut self,
        frame: &[S],
        convert: impl Fn(S) -> f32,
        internal: &mut InternalFrame,
    ) -> Result<(), Error> {
        check_len(self.input_format.num_samples(), frame.len())?;
        deinterleave(frame, &mut self.input, convert);
        self.to_internal.convert(&self.input, internal);
        Ok(())
    }

    /// Converts `internal` into an interleaved frame of the output format,
    /// mapping each float-S16 sample with `convert`.
    pub(crate) fn from_internal<D>(
        &mut self,
        internal: &InternalFrame,
        frame: &mut [D],
        convert: impl Fn(f32) -> D,
    ) -> Result<(), Error> {
        check_len(self.output_format.num_samples(), frame.len())?;
        self.from_internal.convert(internal, &mut self.output);
        interleave(&self.output, frame, convert);
        Ok(())
    }

    /// Drops the resampler history of both stages.
    pub(crate) fn reset(&mut self) {
        self.to_internal.reset();
        self.from_internal.reset();
    }
}

pub(crate) fn check_len(expected: usize, actual: usize) -> Result<(), Error> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::FrameSizeMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use aural_common_audio::audio_util::{float_s16_to_float, float_to_float_s16};
    use aural_proptest::generators::{interleave as interleave_channels, sine};

    use super::*;

    fn converter(rate_in: u32, ch_in: u16, rate_out: u32, ch_out: u16, internal_rate: u32) -> FrameConverter {
        FrameConverter::new(
            StreamFormat::new(rate_in, ch_in).unwrap(),
            StreamFormat::new(rate_out, ch_out).unwrap(),
            InternalFormat {
                sample_rate_hz: internal_rate,
                num_channels: 1,
            },
            DownmixMethod::AverageChannels,
        )
    }

    #[test]
    fn rejects_wrong_sizes() {
        let mut conv = converter(48_000, 2, 48_000, 2, 48_000);
        let mut internal = conv.internal_format().new_frame();
        assert_eq!(
            conv.to_internal(&[0.0f32; 480], float_to_float_s16, &mut internal),
            Err(Error::FrameSizeMismatch {
                expected: 960,
                actual: 480
            })
        );
        let mut out = vec![0.0f32; 959];
        assert_eq!(
            conv.from_internal(&internal, &mut out, float_s16_to_float),
            Err(Error::FrameSizeMismatch {
                expected: 960,
                actual: 959
            })
        );
    }

    #[test]
    fn stereo_is_averaged_then_duplicated() {
        let mut conv = converter(16_000, 2, 16_000, 2, 16_000);
        let mut internal = conv.internal_format().new_frame();
        let left = vec![0.5f32; 160];
        let right = vec![-0.25f32; 160];
        let frame = interleave_channels(&[left, right]);
        conv.to_internal(&frame, float_to_float_s16, &mut internal).unwrap();
        assert!(internal.channel(0).iter().all(|&v| (v - 4095.75).abs() < 1e-3));

        let mut out = vec![0.0f32; 320];
        conv.from_internal(&internal, &mut out, float_s16_to_float).unwrap();
        assert!(out.iter().all(|&v| (v - 0.125).abs() < 1e-4));
    }

    #[test]
    fn output_has_requested_size() {
        let mut conv = converter(32_000, 2, 30_000, 1, 32_000);
        let mut internal = conv.internal_format().new_frame();
        let mut out = vec![0.0f32; 300];
        for _ in 0..5 {
            conv.to_internal(&[0.1f32; 640], float_to_float_s16, &mut internal).unwrap();
            conv.from_internal(&internal, &mut out, float_s16_to_float).unwrap();
        }
        assert_eq!(out.len(), 300);
    }

    #[test]
    fn resampled_sine_has_no_boundary_clicks() {
        let mut conv = converter(48_000, 1, 16_000, 1, 16_000);
        let mut internal = conv.internal_format().new_frame();
        let signal = sine(480 * 20, 440.0, 48_000, 0.5);
        let mut out = vec![0.0f32; 160];
        let mut previous: Option<f32> = None;
        let max_step = 2.0 * PI * 440.0 / 16_000.0 * 0.5 * 1.2;
        for (i, chunk) in signal.chunks_exact(480).enumerate() {
            conv.to_internal(chunk, float_to_float_s16, &mut internal).unwrap();
            conv.from_internal(&internal, &mut out, float_s16_to_float).unwrap();
            // Skip the resampler's start-up transient.
            if i >= 2
                && let Some(prev) = previous
            {
                assert!((out[0] - prev).abs() <= max_step, "click at frame {i}");
                for pair in out.windows(2) {
                    assert!((pair[1] - pair[0]).abs() <= max_step);
                }
            }
            previous = out.last().copied();
        }
    }

    #[test]
    fn zero_length_formats_give_silence() {
        let mut conv = converter(50, 1, 16_000, 1, 8_000);
        let mut internal = conv.internal_format().new_frame();
        internal.fill(1.0);
        conv.to_internal::<f32>(&[], float_to_float_s16, &mut internal).unwrap();
        assert!(internal.as_slice().iter().all(|&v| v == 0.0));

        let mut conv = converter(16_000, 1, 50, 1, 8_000);
        let mut out: Vec<f32> = Vec::new();
        conv.from_internal(&internal, &mut out, float_s16_to_float).unwrap();
    }
}
