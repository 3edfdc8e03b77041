//! Deterministic test signals and proptest strategies.

use std::f32::consts::PI;

use proptest::collection;
use proptest::prelude::*;
use proptest::sample::select;

/// Sample rates the pipeline processes natively.
pub const NATIVE_SAMPLE_RATES_HZ: [u32; 4] = [8_000, 16_000, 32_000, 48_000];

/// Uniform white noise in `[-amplitude, amplitude]` from a xorshift32
/// generator, so the same `seed` always gives the same signal.
pub fn white_noise(len: usize, amplitude: f32, seed: u32) -> Vec<f32> {
    let mut state = if seed == 0 { 0x9E37_79B9 } else { seed };
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let unit = state as f32 / u32::MAX as f32;
            amplitude * (2.0 * unit - 1.0)
        })
        .collect()
}

/// A sine wave of `freq_hz` sampled at `sample_rate_hz`.
pub fn sine(len: usize, freq_hz: f32, sample_rate_hz: u32, amplitude: f32) -> Vec<f32> {
    let step = 2.0 * PI * freq_hz / sample_rate_hz as f32;
    (0..len)
        .map(|i| amplitude * (step * i as f32).sin())
        .collect()
}

/// Interleaves per-channel signals of equal length.
pub fn interleave(channels: &[Vec<f32>]) -> Vec<f32> {
    let frames = channels.first().map_or(0, Vec::len);
    (0..frames)
        .flat_map(|i| channels.iter().map(move |channel| channel[i]))
        .collect()
}

/// One of the native processing rates.
pub fn native_sample_rate() -> impl Strategy<Value = u32> {
    select(NATIVE_SAMPLE_RATES_HZ.to_vec())
}

/// Highest rate a stream may be configured with.
pub const MAX_SAMPLE_RATE_HZ: u32 = 384_000;

/// Any rate a stream may be configured with, from 1 Hz up to
/// [`MAX_SAMPLE_RATE_HZ`], weighted toward native and common device rates.
pub fn any_sample_rate() -> impl Strategy<Value = u32> {
    prop_oneof![
        3 => native_sample_rate(),
        1 => select(vec![11_025, 22_050, 44_100, 88_200, 96_000, 192_000, MAX_SAMPLE_RATE_HZ]),
        1 => 1u32..=3_300,
        1 => 1u32..=MAX_SAMPLE_RATE_HZ,
    ]
}

/// Channel counts from mono up to `max`.
pub fn num_channels(max: u16) -> impl Strategy<Value = u16> {
    1..=max.max(1)
}

/// Float samples in `[-1, 1]`.
pub fn float_frame(len: usize) -> impl Strategy<Value = Vec<f32>> {
    collection::vec(-1.0f32..=1.0, len)
}

/// Float-S16 samples over the full 16-bit range.
pub fn float_s16_frame(len: usize) -> impl Strategy<Value = Vec<f32>> {
    collection::vec(-32_768.0f32..=32_767.0, len)
}

/// 16-bit integer samples.
pub fn i16_frame(len: usize) -> impl Strategy<Value = Vec<i16>> {
    collection::vec(any::<i16>(), len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[test]
    fn white_noise_is_deterministic_and_bounded() {
        let a = white_noise(1000, 0.5, 42);
        let b = white_noise(1000, 0.5, 42);
        assert_eq!(a, b);
        assert!(a.iter().all(|v| v.abs() <= 0.5));
        assert_ne!(a, white_noise(1000, 0.5, 43));
        assert!(white_noise(10, 1.0, 0).iter().any(|&v| v != 0.0));
    }

    #[test]
    fn white_noise_is_roughly_zero_mean() {
        let noise = white_noise(48_000, 1.0, 7);
        let mean = noise.iter().sum::<f32>() / noise.len() as f32;
        assert!(mean.abs() < 0.02, "{mean}");
    }

    #[test]
    fn sine_starts_at_zero_and_peaks_at_amplitude() {
        let tone = sine(16, 1000.0, 16_000, 2.0);
        assert_eq!(tone[0], 0.0);
        assert!((tone[4] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn interleave_orders_frames() {
        let out = interleave(&[vec![1.0, 2.0], vec![10.0, 20.0]]);
        assert_eq!(out, [1.0, 10.0, 2.0, 20.0]);
        assert!(interleave(&[]).is_empty());
    }

    #[proptest]
    fn native_rates_are_native(#[strategy(native_sample_rate())] rate: u32) {
        assert!(NATIVE_SAMPLE_RATES_HZ.contains(&rate));
    }
}
