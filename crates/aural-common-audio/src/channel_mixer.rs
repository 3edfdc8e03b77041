//! Deterministic channel count conversion.
//!
//! Reducing: destination channel `j` is the mean of every source channel `i`
//! with `i % dst_channels == j`. For a mono destination that is the mean of
//! all channels, or the first channel with [`DownmixMethod::UseFirstChannel`].
//!
//! Expanding: destination channel `j` copies source channel `j % src_channels`.

use crate::channel_buffer::ChannelBuffer;

/// How to fold several channels into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownmixMethod {
    /// Average across channels.
    #[default]
    AverageChannels,
    /// Use the first channel.
    UseFirstChannel,
}

/// Mixes `src` into `dst`. Both buffers must have the same number of frames.
///
/// # Panics
///
/// Panics if the frame counts differ.
pub fn mix_channels(src: &ChannelBuffer<f32>, dst: &mut ChannelBuffer<f32>, method: DownmixMethod) {
    assert_eq!(src.num_frames(), dst.num_frames());
    let src_channels = src.num_channels();
    let dst_channels = dst.num_channels();

    if src_channels == dst_channels {
        dst.copy_from(src);
        return;
    }

    if dst_channels > src_channels {
        for ch in 0..dst_channels {
            dst.channel_mut(ch).copy_from_slice(src.channel(ch % src_channels));
        }
        return;
    }

    if dst_channels == 1 && method == DownmixMethod::UseFirstChannel {
        dst.channel_mut(0).copy_from_slice(src.channel(0));
        return;
    }

    for ch in 0..dst_channels {
        let num_sources = (src_channels - ch).div_ceil(dst_channels);
        let scale = 1.0 / num_sources as f32;
        let out = dst.channel_mut(ch);
        out.copy_from_slice(src.channel(ch));
        for s in (ch + dst_channels..src_channels).step_by(dst_channels) {
            for (o, &v) in out.iter_mut().zip(src.channel(s)) {
                *o += v;
            }
        }
        for o in out.iter_mut() {
            *o *= scale;
        }
    }
}
