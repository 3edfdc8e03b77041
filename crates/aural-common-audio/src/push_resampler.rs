//! Multi-channel push resampler.

use crate::channel_buffer::ChannelBuffer;
use crate::push_sinc_resampler::PushSincResampler;

/// Resamples every channel of a [`ChannelBuffer`] independently, one
/// [`PushSincResampler`] per channel.
#[derive(Debug)]
pub struct PushResampler {
    resamplers: Vec<PushSincResampler>,
    src_frames: usize,
    dst_frames: usize,
}

impl PushResampler {
    /// Creates a resampler for `num_channels` channels converting blocks of
    /// `src_frames` into blocks of `dst_frames`.
    pub fn new(src_frames: usize, dst_frames: usize, num_channels: usize) -> Self {
        Self {
            resamplers: (0..num_channels)
                .map(|_| PushSincResampler::new(src_frames, dst_frames))
                .collect(),
            src_frames,
            dst_frames,
        }
    }

    /// Number of channels handled.
    pub fn num_channels(&self) -> usize {
        self.resamplers.len()
    }

    /// Resamples `src` into `dst`.
    ///
    /// # Panics
    ///
    /// Panics if the buffer shapes do not match the configuration.
    pub fn resample(&mut self, src: &ChannelBuffer<f32>, dst: &mut ChannelBuffer<f32>) {
        assert_eq!(src.num_frames(), self.src_frames);
        assert_eq!(dst.num_frames(), self.dst_frames);
        assert_eq!(src.num_channels(), self.resamplers.len());
        assert_eq!(dst.num_channels(), self.resamplers.len());

        for (ch, resampler) in self.resamplers.iter_mut().enumerate() {
            resampler.resample(src.channel(ch), dst.channel_mut(ch));
        }
    }

    /// Clears the history of every channel.
    pub fn reset(&mut self) {
        self.resamplers.iter_mut().for_each(PushSincResampler::reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_are_resampled_independently() {
        let mut resampler = PushResampler::new(160, 480, 2);
        let mut src = ChannelBuffer::new(160, 2);
        src.channel_mut(0).fill(1000.0);
        let mut dst = ChannelBuffer::new(480, 2);
        for _ in 0..4 {
            resampler.resample(&src, &mut dst);
        }
        assert!(dst.channel(0).iter().all(|&v| (v - 1000.0).abs() < 20.0));
        assert!(dst.channel(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    #[should_panic]
    fn wrong_channel_count_panics() {
        let mut resampler = PushResampler::new(160, 320, 1);
        let src = ChannelBuffer::new(160, 2);
        let mut dst = ChannelBuffer::new(320, 2);
        resampler.resample(&src, &mut dst);
    }
}
