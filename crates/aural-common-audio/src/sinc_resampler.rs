//! Windowed-sinc resampler with a pull-style input callback.
//!
//! The kernel is a Blackman-windowed sinc sampled at
//! [`KERNEL_OFFSET_COUNT`] sub-sample offsets; output samples interpolate
//! linearly between the two nearest offset kernels. Input history is kept in
//! `input_buffer` across calls so consecutive blocks join without
//! discontinuities.
//!
//! Buffer layout (indices into `input_buffer`):
//!
//! ```text
//! |----------------|-----------------------------------------|----------------|
//! r1 = 0           r2 = KERNEL_SIZE / 2       r3             r4
//!        r0 (KERNEL_SIZE / 2 on the first load, KERNEL_SIZE afterwards)
//! ```
//!
//! `r0` receives `request_frames` new samples per callback; once the
//! convolution window passes `r4`, the tail `r3..r4 + KERNEL_SIZE / 2` is
//! copied to `r1` and the next block is requested.

use std::f64::consts::PI;

/// Number of kernel taps. Must be a multiple of 32.
pub const KERNEL_SIZE: usize = 32;
/// Number of sub-sample kernel offsets.
pub const KERNEL_OFFSET_COUNT: usize = 32;
/// Storage for all offset kernels, including the final `1.0` offset.
pub const KERNEL_STORAGE_SIZE: usize = KERNEL_SIZE * (KERNEL_OFFSET_COUNT + 1);
/// Default number of input frames requested per callback.
pub const DEFAULT_REQUEST_SIZE: usize = 512;

/// Source of input samples for [`SincResampler::resample`].
pub trait SincResamplerCallback {
    /// Writes exactly `frames` input samples into `destination[..frames]`.
    fn run(&mut self, frames: usize, destination: &mut [f32]);
}

/// Scale applied to the sinc argument: keeps the cutoff below Nyquist of the
/// lower of the two rates.
fn sinc_scale_factor(io_ratio: f64) -> f64 {
    let factor = if io_ratio > 1.0 { 1.0 / io_ratio } else { 1.0 };
    // Slightly reduce the cutoff to leave room for the transition band.
    factor * 0.9
}

/// Single-channel windowed-sinc resampler.
#[derive(derive_more::Debug)]
pub struct SincResampler {
    /// Input frames consumed per output frame.
    io_sample_rate_ratio: f64,
    /// Fractional read position into the input history.
    virtual_source_idx: f64,
    /// Whether the first block has been requested.
    buffer_primed: bool,
    request_frames: usize,
    block_size: usize,
    #[debug("{} taps", kernel_storage.len())]
    kernel_storage: Vec<f32>,
    #[debug(skip)]
    input_buffer: Vec<f32>,
    r0: usize,
    r3: usize,
    r4: usize,
}

const R1: usize = 0;
const R2: usize = KERNEL_SIZE / 2;

impl SincResampler {
    /// Creates a resampler consuming `io_sample_rate_ratio` input frames per
    /// output frame and pulling `request_frames` input frames per callback.
    ///
    /// # Panics
    ///
    /// Panics if `io_sample_rate_ratio` is not positive or `request_frames`
    /// is not larger than `KERNEL_SIZE`.
    pub fn new(io_sample_rate_ratio: f64, request_frames: usize) -> Self {
        assert!(io_sample_rate_ratio > 0.0, "resampling ratio must be positive");
        assert!(
            request_frames > KERNEL_SIZE,
            "request size {request_frames} must exceed the kernel size"
        );
        let mut resampler = Self {
            io_sample_rate_ratio,
            virtual_source_idx: 0.0,
            buffer_primed: false,
            request_frames,
            block_size: 0,
            kernel_storage: vec![0.0; KERNEL_STORAGE_SIZE],
            input_buffer: vec![0.0; request_frames + KERNEL_SIZE],
            r0: 0,
            r3: 0,
            r4: 0,
        };
        resampler.initialize_kernel();
        resampler.flush();
        resampler
    }

    /// Output frames that can be produced from the current input block
    /// without another callback.
    pub fn chunk_size(&self) -> usize {
        (self.block_size as f64 / self.io_sample_rate_ratio) as usize
    }

    /// Input frames requested per callback.
    pub fn request_frames(&self) -> usize {
        self.request_frames
    }

    /// Discards all history.
    pub fn flush(&mut self) {
        self.virtual_source_idx = 0.0;
        self.buffer_primed = false;
        self.input_buffer.fill(0.0);
        self.update_regions(false);
    }

    /// Produces `frames` output samples into `destination[..frames]`, pulling
    /// input from `source` as needed.
    pub fn resample(
        &mut self,
        frames: usize,
        destination: &mut [f32],
        source: &mut impl SincResamplerCallback,
    ) {
        debug_assert!(destination.len() >= frames);
        let mut remaining = frames;
        let mut out = 0;

        if !self.buffer_primed && remaining > 0 {
            source.run(
                self.request_frames,
                &mut self.input_buffer[self.r0..self.r0 + self.request_frames],
            );
            self.buffer_primed = true;
        }

        let ratio = self.io_sample_rate_ratio;
        while remaining > 0 {
            let steps = ((self.block_size as f64 - self.virtual_source_idx) / ratio).ceil();
            for _ in 0..steps.max(0.0) as usize {
                let source_idx = self.virtual_source_idx as usize;
                let subsample_remainder = self.virtual_source_idx - source_idx as f64;
                let virtual_offset_idx = subsample_remainder * KERNEL_OFFSET_COUNT as f64;
                let offset_idx = virtual_offset_idx as usize;
                let interpolation_factor = virtual_offset_idx - offset_idx as f64;

                let k1 = offset_idx * KERNEL_SIZE;
                let input_start = R1 + source_idx;
                destination[out] = convolve(
                    &self.input_buffer[input_start..input_start + KERNEL_SIZE],
                    &self.kernel_storage[k1..k1 + KERNEL_SIZE],
                    &self.kernel_storage[k1 + KERNEL_SIZE..k1 + 2 * KERNEL_SIZE],
                    interpolation_factor,
                );
                out += 1;
                self.virtual_source_idx += ratio;
                remaining -= 1;
                if remaining == 0 {
                    return;
                }
            }

            // Wrap back around to the start of the history.
            self.virtual_source_idx -= self.block_size as f64;
            self.input_buffer
                .copy_within(self.r3..self.r3 + KERNEL_SIZE, R1);

            if self.r0 == R2 {
                self.update_regions(true);
            }

            source.run(
                self.request_frames,
                &mut self.input_buffer[self.r0..self.r0 + self.request_frames],
            );
        }
    }

    fn update_regions(&mut self, second_load: bool) {
        self.r0 = if second_load { KERNEL_SIZE } else { KERNEL_SIZE / 2 };
        self.r3 = self.r0 + self.request_frames - KERNEL_SIZE;
        self.r4 = self.r0 + self.request_frames - KERNEL_SIZE / 2;
        self.block_size = self.r4 - R2;
    }

    fn initialize_kernel(&mut self) {
        // Blackman window parameters.
        const A0: f64 = 0.42;
        const A1: f64 = 0.5;
        const A2: f64 = 0.08;

        let scale = sinc_scale_factor(self.io_sample_rate_ratio);
        for offset_idx in 0..=KERNEL_OFFSET_COUNT {
            let subsample_offset = offset_idx as f64 / KERNEL_OFFSET_COUNT as f64;
            for i in 0..KERNEL_SIZE {
                let idx = i + offset_idx * KERNEL_SIZE;
                let pre_sinc = PI * (i as f64 - (KERNEL_SIZE / 2) as f64 - subsample_offset);
                let x = (i as f64 - subsample_offset) / KERNEL_SIZE as f64;
                let window = A0 - A1 * (2.0 * PI * x).cos() + A2 * (4.0 * PI * x).cos();
                let sinc = if pre_sinc == 0.0 {
                    scale
                } else {
                    (scale * pre_sinc).sin() / pre_sinc
                };
                self.kernel_storage[idx] = (window * sinc) as f32;
            }
        }
    }
}

/// Convolves `input` with two adjacent offset kernels and blends the results.
#[inline]
fn convolve(input: &[f32], k1: &[f32], k2: &[f32], interpolation_factor: f64) -> f32 {
    let mut sum1 = 0.0f32;
    let mut sum2 = 0.0f32;
    for ((&x, &a), &b) in input.iter().zip(k1).zip(k2) {
        sum1 += x * a;
        sum2 += x * b;
    }
    ((1.0 - interpolation_factor) * f64::from(sum1) + interpolation_factor * f64::from(sum2))
        as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(f32);
    impl SincResamplerCallback for Constant {
        fn run(&mut self, frames: usize, destination: &mut [f32]) {
            destination[..frames].fill(self.0);
        }
    }

    struct CountingSource {
        calls: usize,
    }
    impl SincResamplerCallback for CountingSource {
        fn run(&mut self, frames: usize, destination: &mut [f32]) {
            self.calls += 1;
            destination[..frames].fill(0.0);
        }
    }

    #[test]
    fn chunk_size_follows_ratio() {
        // The first block is shorter by half a kernel.
        let resampler = SincResampler::new(3.0, 496);
        assert_eq!(resampler.chunk_size(), 160);
        let resampler = SincResampler::new(0.5, 176);
        assert_eq!(resampler.chunk_size(), 320);
    }

    #[test]
    fn dc_gain_is_close_to_unity() {
        for &ratio in &[3.0, 2.0, 1.5, 0.5, 1.0 / 3.0] {
            let mut resampler = SincResampler::new(ratio, DEFAULT_REQUEST_SIZE);
            let mut source = Constant(1000.0);
            let frames = resampler.chunk_size();
            let mut out = vec![0.0f32; frames];
            for _ in 0..8 {
                resampler.resample(frames, &mut out, &mut source);
            }
            for &v in &out {
                assert!((v - 1000.0).abs() < 20.0, "ratio {ratio}: got {v}");
            }
        }
    }

    #[test]
    fn one_request_per_chunk_after_priming() {
        let mut resampler = SincResampler::new(2.0, 320);
        let mut source = CountingSource { calls: 0 };
        let mut out = vec![0.0f32; 160];
        let chunk = resampler.chunk_size();
        resampler.resample(chunk, &mut out, &mut source);
        assert_eq!(source.calls, 1);
        for _ in 0..10 {
            resampler.resample(160, &mut out, &mut source);
        }
        assert_eq!(source.calls, 11);
    }

    #[test]
    fn flush_clears_history() {
        let mut resampler = SincResampler::new(1.5, 300);
        let frames = resampler.chunk_size();
        let mut out = vec![0.0f32; frames];
        for _ in 0..4 {
            resampler.resample(frames, &mut out, &mut Constant(500.0));
        }
        resampler.flush();
        resampler.resample(frames, &mut out, &mut Constant(0.0));
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn zero_frames_requests_nothing() {
        let mut resampler = SincResampler::new(2.0, 320);
        let mut source = CountingSource { calls: 0 };
        resampler.resample(0, &mut [], &mut source);
        assert_eq!(source.calls, 0);
    }
}
