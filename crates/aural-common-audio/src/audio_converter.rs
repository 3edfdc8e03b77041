//! Combined rate and channel-layout conversion for fixed-size frames.
//!
//! Channel mixing runs on whichever side of the resampler has fewer
//! channels, so the resampler never does more work than necessary.

use crate::channel_buffer::ChannelBuffer;
use crate::channel_mixer::{DownmixMethod, mix_channels};
use crate::push_resampler::PushResampler;

/// Converts frames of `src_frames x src_channels` into frames of
/// `dst_frames x dst_channels`.
#[derive(Debug)]
pub struct AudioConverter {
    src_channels: usize,
    src_frames: usize,
    dst_channels: usize,
    dst_frames: usize,
    downmix: DownmixMethod,
    /// `None` when no rate change is needed.
    resampler: Option<PushResampler>,
    /// Intermediate frame between the two stages.
    scratch: ChannelBuffer<f32>,
}

impl AudioConverter {
    /// Creates a converter. A rate below 100 Hz yields zero frames per 10 ms,
    /// in which case the converter only ever writes silence.
    pub fn new(
        src_channels: usize,
        src_frames: usize,
        dst_channels: usize,
        dst_frames: usize,
        downmix: DownmixMethod,
    ) -> Self {
        let needs_resampling = src_frames != dst_frames && src_frames > 0 && dst_frames > 0;
        let resampler_channels = src_channels.min(dst_channels);
        let resampler = needs_resampling
            .then(|| PushResampler::new(src_frames, dst_frames, resampler_channels));

        // Reducing mixes before resampling, expanding mixes after.
        let scratch = if src_channels > dst_channels {
            ChannelBuffer::new(src_frames, dst_channels)
        } else {
            ChannelBuffer::new(dst_frames, src_channels)
        };

        tracing::trace!(
            src_channels,
            src_frames,
            dst_channels,
            dst_frames,
            resampling = needs_resampling,
            "audio converter created"
        );

        Self {
            src_channels,
            src_frames,
            dst_channels,
            dst_frames,
            downmix,
            resampler,
            scratch,
        }
    }

    /// Frames per channel expected on input.
    pub fn src_frames(&self) -> usize {
        self.src_frames
    }

    /// Frames per channel produced on output.
    pub fn dst_frames(&self) -> usize {
        self.dst_frames
    }

    /// Converts one frame.
    ///
    /// # Panics
    ///
    /// Panics if the buffer shapes do not match the configuration.
    pub fn convert(&mut self, src: &ChannelBuffer<f32>, dst: &mut ChannelBuffer<f32>) {
        assert_eq!(src.num_channels(), self.src_channels);
        assert_eq!(src.num_frames(), self.src_frames);
        assert_eq!(dst.num_channels(), self.dst_channels);
        assert_eq!(dst.num_frames(), self.dst_frames);

        if self.src_frames == 0 || self.dst_frames == 0 {
            dst.fill(0.0);
            return;
        }

        let Some(resampler) = self.resampler.as_mut() else {
            mix_channels(src, dst, self.downmix);
            return;
        };

        if self.src_channels == self.dst_channels {
            resampler.resample(src, dst);
        } else if self.src_channels > self.dst_channels {
            mix_channels(src, &mut self.scratch, self.downmix);
            resampler.resample(&self.scratch, dst);
        } else {
            resampler.resample(src, &mut self.scratch);
            mix_channels(&self.scratch, dst, self.downmix);
        }
    }

    /// Clears resampler history.
    pub fn reset(&mut self) {
        if let Some(resampler) = self.resampler.as_mut() {
            resampler.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_rate_only_mixes() {
        let mut converter = AudioConverter::new(2, 160, 1, 160, DownmixMethod::AverageChannels);
        let mut src = ChannelBuffer::new(160, 2);
        src.channel_mut(0).fill(2.0);
        src.channel_mut(1).fill(4.0);
        let mut dst = ChannelBuffer::new(160, 1);
        converter.convert(&src, &mut dst);
        assert!(dst.channel(0).iter().all(|&v| v == 3.0));
    }

    #[test]
    fn identical_formats_copy() {
        let mut converter = AudioConverter::new(2, 80, 2, 80, DownmixMethod::AverageChannels);
        let mut src = ChannelBuffer::new(80, 2);
        for (i, v) in src.as_mut_slice().iter_mut().enumerate() {
            *v = i as f32;
        }
        let mut dst = ChannelBuffer::new(80, 2);
        converter.convert(&src, &mut dst);
        assert_eq!(src, dst);
    }

    #[test]
    fn downsample_and_downmix() {
        let mut converter = AudioConverter::new(2, 480, 1, 160, DownmixMethod::AverageChannels);
        let mut src = ChannelBuffer::new(480, 2);
        src.channel_mut(0).fill(1000.0);
        src.channel_mut(1).fill(3000.0);
        let mut dst = ChannelBuffer::new(160, 1);
        for _ in 0..4 {
            converter.convert(&src, &mut dst);
        }
        for &v in dst.channel(0) {
            assert!((v - 2000.0).abs() < 40.0, "got {v}");
        }
    }

    #[test]
    fn upsample_and_upmix() {
        let mut converter = AudioConverter::new(1, 160, 2, 480, DownmixMethod::AverageChannels);
        let mut src = ChannelBuffer::new(160, 1);
        src.fill(500.0);
        let mut dst = ChannelBuffer::new(480, 2);
        for _ in 0..4 {
            converter.convert(&src, &mut dst);
        }
        assert_eq!(dst.channel(0), dst.channel(1));
        assert!(dst.channel(0).iter().all(|&v| (v - 500.0).abs() < 10.0));
    }

    #[test]
    fn zero_frames_write_silence() {
        let mut converter = AudioConverter::new(1, 0, 1, 160, DownmixMethod::AverageChannels);
        let src = ChannelBuffer::new(0, 1);
        let mut dst = ChannelBuffer::new(160, 1);
        dst.fill(9.0);
        converter.convert(&src, &mut dst);
        assert!(dst.as_slice().iter().all(|&v| v == 0.0));
    }
}
