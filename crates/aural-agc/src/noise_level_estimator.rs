//! Noise floor estimator used to cap the adaptive gain.

use crate::common::{FRAME_DURATION_MS, MAX_ABS_FLOAT_S16_VALUE, VAD_CONFIDENCE_THRESHOLD};

/// Rise limit of the floor during speech, in dB per second.
const SPEECH_RISE_DB_PER_SECOND: f32 = 1.0;
/// Share of the gap closed per non-speech frame.
const NON_SPEECH_TRACKING_RATE: f32 = 0.1;
/// Smallest tracked energy, -90.3 dBFS.
const MIN_NOISE_ENERGY: f32 = 1.0;

/// Tracks the background noise energy of a float-S16 signal.
#[derive(Debug)]
pub struct NoiseLevelEstimator {
    noise_energy: f32,
    rise_factor: f32,
}

impl Default for NoiseLevelEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseLevelEstimator {
    pub fn new() -> Self {
        let rise_db = SPEECH_RISE_DB_PER_SECOND * FRAME_DURATION_MS / 1000.0;
        Self {
            noise_energy: MIN_NOISE_ENERGY,
            rise_factor: 10f32.powf(rise_db / 10.0),
        }
    }

    /// Updates the floor with the mean-square energy of one frame and
    /// returns the noise level in dBFS.
    pub fn update(&mut self, frame_energy: f32, speech_probability: f32) -> f32 {
        let frame_energy = frame_energy.max(MIN_NOISE_ENERGY);
        self.noise_energy = if frame_energy <= self.noise_energy {
            frame_energy
        } else if speech_probability < VAD_CONFIDENCE_THRESHOLD {
            self.noise_energy + NON_SPEECH_TRACKING_RATE * (frame_energy - self.noise_energy)
        } else {
            (self.noise_energy * self.rise_factor).min(frame_energy)
        };
        self.level_dbfs()
    }

    /// Noise level in dBFS.
    pub fn level_dbfs(&self) -> f32 {
        10.0 * (self.noise_energy / (MAX_ABS_FLOAT_S16_VALUE * MAX_ABS_FLOAT_S16_VALUE)).log10()
    }

    pub fn reset(&mut self) {
        self.noise_energy = MIN_NOISE_ENERGY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MIN_LEVEL_DBFS;

    #[test]
    fn starts_at_minimum_level() {
        let estimator = NoiseLevelEstimator::new();
        assert!((estimator.level_dbfs() - MIN_LEVEL_DBFS).abs() < 1e-3);
    }

    #[test]
    fn tracks_noise_between_speech() {
        let mut estimator = NoiseLevelEstimator::new();
        // -40 dBFS noise energy.
        let energy = 32768.0f32 * 32768.0 * 1e-4;
        let mut level = 0.0;
        for _ in 0..200 {
            level = estimator.update(energy, 0.0);
        }
        assert!((level + 40.0).abs() < 0.1, "{level}");
    }

    #[test]
    fn speech_raises_floor_slowly() {
        let mut estimator = NoiseLevelEstimator::new();
        for _ in 0..100 {
            estimator.update(1e8, 1.0);
        }
        assert!((estimator.level_dbfs() - MIN_LEVEL_DBFS - 1.0).abs() < 0.01);
    }
}
