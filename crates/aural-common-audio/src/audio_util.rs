//! Sample format conversions and interleaving helpers.
//!
//! Three sample representations are in use:
//! - `f32` in `[-1.0, 1.0]` ("float"),
//! - `f32` scaled to the 16-bit integer range ("float S16"), which is what the
//!   processing effects operate on,
//! - `i16`.

use crate::channel_buffer::ChannelBuffer;

/// Largest float-S16 sample value.
pub const MAX_FLOAT_S16: f32 = 32767.0;
/// Smallest float-S16 sample value.
pub const MIN_FLOAT_S16: f32 = -32768.0;

/// Converts a float sample to float-S16 scale, saturating outside `[-1, 1]`.
#[inline]
pub fn float_to_float_s16(v: f32) -> f32 {
    let v = v.clamp(-1.0, 1.0);
    if v > 0.0 { v * MAX_FLOAT_S16 } else { v * -MIN_FLOAT_S16 }
}

/// Converts a float-S16 sample back to `[-1, 1]`, saturating.
#[inline]
pub fn float_s16_to_float(v: f32) -> f32 {
    let v = v.clamp(MIN_FLOAT_S16, MAX_FLOAT_S16);
    if v > 0.0 { v / MAX_FLOAT_S16 } else { v / -MIN_FLOAT_S16 }
}

/// Rounds a float-S16 sample to `i16`, saturating.
#[inline]
pub fn float_s16_to_s16(v: f32) -> i16 {
    v.clamp(MIN_FLOAT_S16, MAX_FLOAT_S16).round() as i16
}

/// Widens an `i16` sample to float-S16.
#[inline]
pub fn s16_to_float_s16(v: i16) -> f32 {
    f32::from(v)
}

/// Splits `interleaved` into the channels of `dest`, mapping every sample
/// through `convert`.
///
/// # Panics
///
/// Panics if `interleaved.len() != dest.size()`.
pub fn deinterleave<S: Copy>(
    interleaved: &[S],
    dest: &mut ChannelBuffer<f32>,
    convert: impl Fn(S) -> f32,
) {
    assert_eq!(interleaved.len(), dest.size());
    let num_channels = dest.num_channels();
    if num_channels == 1 {
        for (d, &s) in dest.channel_mut(0).iter_mut().zip(interleaved) {
            *d = convert(s);
        }
        return;
    }
    for ch in 0..num_channels {
        let channel = dest.channel_mut(ch);
        for (i, d) in channel.iter_mut().enumerate() {
            *d = convert(interleaved[i * num_channels + ch]);
        }
    }
}

/// Weaves the channels of `src` into `interleaved`, mapping every sample
/// through `convert`.
///
/// # Panics
///
/// Panics if `interleaved.len() != src.size()`.
pub fn interleave<D>(src: &ChannelBuffer<f32>, interleaved: &mut [D], convert: impl Fn(f32) -> D) {
    assert_eq!(interleaved.len(), src.size());
    let num_channels = src.num_channels();
    for (ch, channel) in src.channels().enumerate() {
        for (i, &s) in channel.iter().enumerate() {
            interleaved[i * num_channels + ch] = convert(s);
        }
    }
}
