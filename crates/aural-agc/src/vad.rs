//! Energy-based voice activity detector.
//!
//! A frame's speech probability is a sigmoid of its level above a tracked
//! noise floor. The floor follows quieter frames immediately and rises by at
//! most [`NOISE_FLOOR_RISE_DB_PER_SECOND`] otherwise, so sustained loud
//! frames keep being classified as speech for a while.

use aural_common_audio::channel_buffer::ChannelBuffer;

use crate::common::{FRAME_DURATION_MS, float_s16_to_dbfs, rms_and_peak};

/// Floor assumed before any frame has been analyzed.
pub const NOISE_FLOOR_INITIAL_DBFS: f32 = -70.0;
/// Upper bound on the noise floor rise.
pub const NOISE_FLOOR_RISE_DB_PER_SECOND: f32 = 1.0;
/// Frames quieter than this are never speech.
pub const MIN_SPEECH_LEVEL_DBFS: f32 = -60.0;
/// Level above the floor at which the probability is one half.
const SNR_MIDPOINT_DB: f32 = 6.0;
/// Sigmoid slope, in dB per natural-log odds unit.
const SNR_SLOPE_DB: f32 = 1.0;

/// Classifies 10 ms frames as speech or non-speech.
#[derive(Debug)]
pub struct VoiceActivityDetector {
    sample_rate_hz: u32,
    noise_floor_dbfs: f32,
    speech_probability: f32,
}

impl VoiceActivityDetector {
    /// Creates a detector for frames at `sample_rate_hz`.
    pub fn new(sample_rate_hz: u32) -> Self {
        Self {
            sample_rate_hz,
            noise_floor_dbfs: NOISE_FLOOR_INITIAL_DBFS,
            speech_probability: 0.0,
        }
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Analyzes one frame, all channels pooled, and returns its speech
    /// probability in `[0, 1]`.
    pub fn analyze(&mut self, frame: &ChannelBuffer<f32>) -> f32 {
        if frame.size() == 0 {
            self.speech_probability = 0.0;
            return 0.0;
        }
        let (rms, _) = rms_and_peak(frame.as_slice());
        let level_dbfs = float_s16_to_dbfs(rms);
        let snr_db = level_dbfs - self.noise_floor_dbfs;

        self.speech_probability = if level_dbfs < MIN_SPEECH_LEVEL_DBFS {
            0.0
        } else {
            1.0 / (1.0 + (-(snr_db - SNR_MIDPOINT_DB) / SNR_SLOPE_DB).exp())
        };

        let rise = NOISE_FLOOR_RISE_DB_PER_SECOND * FRAME_DURATION_MS / 1000.0;
        self.noise_floor_dbfs = if level_dbfs < self.noise_floor_dbfs {
            level_dbfs
        } else {
            (self.noise_floor_dbfs + rise).min(level_dbfs)
        };
        self.speech_probability
    }

    /// Probability returned by the latest [`analyze`](Self::analyze) call.
    pub fn speech_probability(&self) -> f32 {
        self.speech_probability
    }

    /// Current noise floor estimate in dBFS.
    pub fn noise_floor_dbfs(&self) -> f32 {
        self.noise_floor_dbfs
    }

    pub fn reset(&mut self) {
        self.noise_floor_dbfs = NOISE_FLOOR_INITIAL_DBFS;
        self.speech_probability = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aural_proptest::generators::{sine, white_noise};

    fn frame_from(samples: &[f32]) -> ChannelBuffer<f32> {
        let mut frame = ChannelBuffer::new(samples.len(), 1);
        frame.channel_mut(0).copy_from_slice(samples);
        frame
    }

    #[test]
    fn silence_is_not_speech() {
        let mut vad = VoiceActivityDetector::new(16_000);
        let frame = ChannelBuffer::new(160, 1);
        for _ in 0..10 {
            assert_eq!(vad.analyze(&frame), 0.0);
        }
    }

    #[test]
    fn tone_after_quiet_noise_is_speech() {
        let mut vad = VoiceActivityDetector::new(16_000);
        let noise = white_noise(160, 10.0, 1);
        for _ in 0..50 {
            vad.analyze(&frame_from(&noise));
        }
        assert!(vad.speech_probability() < 0.05);
        // -20 dBFS tone.
        let tone = sine(160, 440.0, 16_000, 3276.8 * 1.414);
        let p = vad.analyze(&frame_from(&tone));
        assert!(p > 0.95, "{p}");
    }

    #[test]
    fn floor_rises_slowly() {
        let mut vad = VoiceActivityDetector::new(16_000);
        let loud = sine(160, 440.0, 16_000, 10_000.0);
        for _ in 0..100 {
            vad.analyze(&frame_from(&loud));
        }
        let risen = vad.noise_floor_dbfs() - NOISE_FLOOR_INITIAL_DBFS;
        assert!((risen - NOISE_FLOOR_RISE_DB_PER_SECOND).abs() < 1e-3, "{risen}");
        assert!(vad.speech_probability() > 0.99);
    }

    #[test]
    fn empty_frames_are_not_speech() {
        let mut vad = VoiceActivityDetector::new(50);
        assert_eq!(vad.analyze(&ChannelBuffer::new(0, 1)), 0.0);
    }

    #[test]
    fn reset_restores_floor() {
        let mut vad = VoiceActivityDetector::new(8_000);
        vad.analyze(&frame_from(&[0.0; 80]));
        assert!(vad.noise_floor_dbfs() < NOISE_FLOOR_INITIAL_DBFS);
        vad.reset();
        assert_eq!(vad.noise_floor_dbfs(), NOISE_FLOOR_INITIAL_DBFS);
    }
}
