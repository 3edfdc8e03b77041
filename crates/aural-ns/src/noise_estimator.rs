//! Frame-power noise floor tracker.
//!
//! The estimate drops immediately to any lower frame power, follows the
//! frame power in non-speech frames, and rises by at most
//! [`NOISE_RISE_DB_PER_SECOND`] while speech is likely.

use crate::config::{
    MIN_POWER, NOISE_RISE_DB_PER_SECOND, NOISE_TRACKING_RATE, SPEECH_PROBABILITY_THRESHOLD,
};

#[derive(Debug)]
pub(crate) struct NoiseEstimator {
    noise_power: f32,
    initialized: bool,
    /// Per-frame multiplicative rise limit.
    rise_factor: f32,
}

impl NoiseEstimator {
    pub(crate) fn new() -> Self {
        // 10 ms frames.
        let rise_db_per_frame = NOISE_RISE_DB_PER_SECOND / 100.0;
        Self {
            noise_power: MIN_POWER,
            initialized: false,
            rise_factor: 10f32.powf(rise_db_per_frame / 10.0),
        }
    }

    /// Current noise power estimate.
    pub(crate) fn noise_power(&self) -> f32 {
        self.noise_power
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Updates the estimate with the power of the latest frame.
    pub(crate) fn update(&mut self, frame_power: f32, speech_probability: f32) {
        let frame_power = frame_power.max(MIN_POWER);
        if !self.initialized {
            self.noise_power = frame_power;
            self.initialized = true;
            return;
        }

        if frame_power <= self.noise_power {
            self.noise_power = frame_power;
        } else if speech_probability < SPEECH_PROBABILITY_THRESHOLD {
            self.noise_power += NOISE_TRACKING_RATE * (frame_power - self.noise_power);
        } else {
            self.noise_power = (self.noise_power * self.rise_factor).min(frame_power);
        }
    }

    pub(crate) fn reset(&mut self) {
        self.noise_power = MIN_POWER;
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_initializes() {
        let mut est = NoiseEstimator::new();
        assert!(!est.is_initialized());
        est.update(1000.0, 1.0);
        assert!(est.is_initialized());
        assert_eq!(est.noise_power(), 1000.0);
    }

    #[test]
    fn drops_instantly() {
        let mut est = NoiseEstimator::new();
        est.update(1000.0, 0.0);
        est.update(10.0, 1.0);
        assert_eq!(est.noise_power(), 10.0);
    }

    #[test]
    fn rises_slowly_during_speech() {
        let mut est = NoiseEstimator::new();
        est.update(1000.0, 0.0);
        // One second of loud speech.
        for _ in 0..100 {
            est.update(1.0e8, 1.0);
        }
        let rise_db = 10.0 * (est.noise_power() / 1000.0).log10();
        assert!((rise_db - NOISE_RISE_DB_PER_SECOND).abs() < 0.01, "{rise_db}");
    }

    #[test]
    fn follows_noise_in_pauses() {
        let mut est = NoiseEstimator::new();
        est.update(1000.0, 0.0);
        for _ in 0..200 {
            est.update(4000.0, 0.0);
        }
        assert!((est.noise_power() - 4000.0).abs() < 1.0);
    }

    #[test]
    fn never_below_floor() {
        let mut est = NoiseEstimator::new();
        est.update(0.0, 0.0);
        assert_eq!(est.noise_power(), MIN_POWER);
        est.reset();
        assert!(!est.is_initialized());
    }
}
