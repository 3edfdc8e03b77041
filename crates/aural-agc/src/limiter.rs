//! Peak limiter.
//!
//! Each frame is split into [`SUB_FRAMES_IN_FRAME`] sub-frames. A peak
//! envelope with exponential release gives one gain per sub-frame, and the
//! gain at every sub-frame boundary is the smaller of its two neighbours.
//! Interpolating linearly between boundaries therefore never applies more
//! than the sub-frame's own gain, which bounds every output sample by the
//! threshold.

use aural_common_audio::channel_buffer::ChannelBuffer;

use crate::common::{LIMITER_THRESHOLD_DBFS, SUB_FRAMES_IN_FRAME, dbfs_to_float_s16, ratio_to_db};

/// Envelope release time constant.
const RELEASE_TIME_MS: f32 = 60.0;

#[derive(Debug)]
pub struct Limiter {
    sample_rate_hz: u32,
    threshold: f32,
    release_factor: f32,
    envelope: f32,
    last_gain: f32,
}

impl Limiter {
    pub fn new(sample_rate_hz: u32) -> Self {
        let sub_frame_ms = 10.0 / SUB_FRAMES_IN_FRAME as f32;
        Self {
            sample_rate_hz,
            threshold: dbfs_to_float_s16(LIMITER_THRESHOLD_DBFS),
            release_factor: (-sub_frame_ms / RELEASE_TIME_MS).exp(),
            envelope: 0.0,
            last_gain: 1.0,
        }
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Largest magnitude an output sample can have.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Limits `frame` in place and returns the smallest gain applied, in dB.
    pub fn process(&mut self, frame: &mut ChannelBuffer<f32>) -> f32 {
        let num_frames = frame.num_frames();
        if num_frames == 0 {
            return 0.0;
        }

        let bounds = |k: usize| (k * num_frames / SUB_FRAMES_IN_FRAME, (k + 1) * num_frames / SUB_FRAMES_IN_FRAME);

        let mut gains = [1.0f32; SUB_FRAMES_IN_FRAME];
        for (k, gain) in gains.iter_mut().enumerate() {
            let (start, end) = bounds(k);
            let peak = frame
                .channels()
                .flat_map(|channel| &channel[start..end])
                .fold(0.0f32, |m, &v| m.max(v.abs()));
            self.envelope = peak.max(self.envelope * self.release_factor);
            if self.envelope > self.threshold {
                *gain = self.threshold / self.envelope;
            }
        }

        let mut boundaries = [1.0f32; SUB_FRAMES_IN_FRAME + 1];
        boundaries[0] = self.last_gain.min(gains[0]);
        for k in 1..SUB_FRAMES_IN_FRAME {
            boundaries[k] = gains[k - 1].min(gains[k]);
        }
        boundaries[SUB_FRAMES_IN_FRAME] = gains[SUB_FRAMES_IN_FRAME - 1];

        let min_gain = gains.iter().copied().fold(self.last_gain, f32::min);
        if min_gain >= 1.0 {
            self.last_gain = 1.0;
            return 0.0;
        }

        for ch in 0..frame.num_channels() {
            let channel = frame.channel_mut(ch);
            for k in 0..SUB_FRAMES_IN_FRAME {
                let (start, end) = bounds(k);
                let len = (end - start) as f32;
                let (from, to) = (boundaries[k], boundaries[k + 1]);
                for (i, v) in channel[start..end].iter_mut().enumerate() {
                    let gain = from + (to - from) * (i + 1) as f32 / len;
                    *v = (*v * gain).clamp(-self.threshold, self.threshold);
                }
            }
        }
        self.last_gain = gains[SUB_FRAMES_IN_FRAME - 1];
        ratio_to_db(min_gain)
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
        self.last_gain = 1.0;
    }
}
