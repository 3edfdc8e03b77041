//! Deinterleaved multi-channel sample storage.
//!
//! All channels live in one contiguous allocation; channel `ch` occupies
//! `data[ch * num_frames..(ch + 1) * num_frames]`.

/// A fixed-size buffer holding `num_channels` channels of `num_frames`
/// samples each.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBuffer<T> {
    data: Vec<T>,
    num_frames: usize,
    num_channels: usize,
}

impl<T: Copy + Default> ChannelBuffer<T> {
    /// Creates a zero-initialized buffer.
    pub fn new(num_frames: usize, num_channels: usize) -> Self {
        Self {
            data: vec![T::default(); num_frames * num_channels],
            num_frames,
            num_channels,
        }
    }

    /// Number of samples per channel.
    #[inline]
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Number of channels.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Total number of samples across all channels.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Samples of channel `ch`.
    ///
    /// # Panics
    ///
    /// Panics if `ch >= num_channels()`.
    #[inline]
    pub fn channel(&self, ch: usize) -> &[T] {
        assert!(ch < self.num_channels, "channel {ch} out of range");
        &self.data[ch * self.num_frames..(ch + 1) * self.num_frames]
    }

    /// Mutable samples of channel `ch`.
    ///
    /// # Panics
    ///
    /// Panics if `ch >= num_channels()`.
    #[inline]
    pub fn channel_mut(&mut self, ch: usize) -> &mut [T] {
        assert!(ch < self.num_channels, "channel {ch} out of range");
        &mut self.data[ch * self.num_frames..(ch + 1) * self.num_frames]
    }

    /// Iterates over the channels in order.
    pub fn channels(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.num_channels).map(|ch| self.channel(ch))
    }

    /// Splits the buffer into one mutable slice per channel.
    pub fn channels_mut(&mut self) -> Vec<&mut [T]> {
        if self.num_frames == 0 {
            return (0..self.num_channels).map(|_| <&mut [T]>::default()).collect();
        }
        self.data.chunks_exact_mut(self.num_frames).collect()
    }

    /// Sets every sample to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Copies all samples from `other`.
    ///
    /// # Panics
    ///
    /// Panics if the two buffers do not have the same shape.
    pub fn copy_from(&mut self, other: &Self) {
        assert_eq!(self.num_frames, other.num_frames);
        assert_eq!(self.num_channels, other.num_channels);
        self.data.copy_from_slice(&other.data);
    }

    /// All samples, channel after channel.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// All samples, channel after channel.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_are_contiguous_blocks() {
        let mut buf = ChannelBuffer::<f32>::new(4, 3);
        for ch in 0..3 {
            buf.channel_mut(ch).fill(ch as f32);
        }
        assert_eq!(
            buf.as_slice(),
            &[0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0]
        );
        assert_eq!(buf.size(), 12);
    }

    #[test]
    fn channels_mut_yields_one_slice_per_channel() {
        let mut buf = ChannelBuffer::<i16>::new(2, 2);
        let mut channels = buf.channels_mut();
        assert_eq!(channels.len(), 2);
        channels[1][0] = 7;
        assert_eq!(buf.channel(1), &[7, 0]);
    }

    #[test]
    fn zero_frame_buffer_still_has_channels() {
        let mut buf = ChannelBuffer::<f32>::new(0, 3);
        assert_eq!(buf.channels().count(), 3);
        assert_eq!(buf.channels_mut().len(), 3);
        assert!(buf.channel(2).is_empty());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn channel_index_is_checked() {
        let buf = ChannelBuffer::<f32>::new(4, 1);
        let _ = buf.channel(1);
    }
}
