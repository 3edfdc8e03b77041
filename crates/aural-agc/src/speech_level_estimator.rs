//! Speech level estimator.
//!
//! Keeps a leaky average of the RMS level of confident speech frames. A
//! preliminary estimate is updated on every speech frame and only committed
//! once [`ADJACENT_SPEECH_FRAMES_THRESHOLD`] consecutive speech frames have
//! been seen, so short bursts do not move the reported level.

use crate::common::{
    ADJACENT_SPEECH_FRAMES_THRESHOLD, FRAME_DURATION_MS, INITIAL_SPEECH_LEVEL_DBFS,
    LEVEL_ESTIMATOR_LEAK_FACTOR, LEVEL_ESTIMATOR_TIME_TO_CONFIDENCE_MS, VAD_CONFIDENCE_THRESHOLD,
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct LevelEstimatorState {
    time_to_confidence_ms: f32,
    numerator: f32,
    denominator: f32,
}

impl LevelEstimatorState {
    fn initial() -> Self {
        Self {
            time_to_confidence_ms: LEVEL_ESTIMATOR_TIME_TO_CONFIDENCE_MS,
            numerator: 0.0,
            denominator: 0.0,
        }
    }

    fn level_dbfs(&self) -> f32 {
        if self.denominator <= 0.0 {
            INITIAL_SPEECH_LEVEL_DBFS
        } else {
            self.numerator / self.denominator
        }
    }
}

/// Estimates the speech level in dBFS.
#[derive(Debug)]
pub struct SpeechLevelEstimator {
    preliminary: LevelEstimatorState,
    reliable: LevelEstimatorState,
    num_adjacent_speech_frames: u32,
    level_dbfs: f32,
}

impl Default for SpeechLevelEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechLevelEstimator {
    pub fn new() -> Self {
        Self {
            preliminary: LevelEstimatorState::initial(),
            reliable: LevelEstimatorState::initial(),
            num_adjacent_speech_frames: 0,
            level_dbfs: INITIAL_SPEECH_LEVEL_DBFS,
        }
    }

    /// Updates the estimate with one frame.
    pub fn update(&mut self, rms_dbfs: f32, speech_probability: f32) {
        if speech_probability < VAD_CONFIDENCE_THRESHOLD {
            // Not speech: roll back the uncommitted part of a short burst.
            if self.num_adjacent_speech_frames > 0 {
                self.num_adjacent_speech_frames = 0;
                self.preliminary = self.reliable;
            }
            return;
        }

        self.num_adjacent_speech_frames += 1;
        let buffer_is_full = self.preliminary.time_to_confidence_ms <= 0.0;
        if !buffer_is_full {
            self.preliminary.time_to_confidence_ms -= FRAME_DURATION_MS;
        }
        let leak_factor = if buffer_is_full {
            LEVEL_ESTIMATOR_LEAK_FACTOR
        } else {
            1.0
        };
        self.preliminary.numerator = self.preliminary.numerator * leak_factor + rms_dbfs;
        self.preliminary.denominator = self.preliminary.denominator * leak_factor + 1.0;

        if self.num_adjacent_speech_frames >= ADJACENT_SPEECH_FRAMES_THRESHOLD {
            self.reliable = self.preliminary;
            self.level_dbfs = self.reliable.level_dbfs();
        }
    }

    /// Committed speech level in dBFS.
    pub fn level_dbfs(&self) -> f32 {
        self.level_dbfs
    }

    /// Whether enough speech has been observed to trust the level.
    pub fn is_confident(&self) -> bool {
        self.reliable.time_to_confidence_ms <= 0.0
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_initial_level() {
        let estimator = SpeechLevelEstimator::new();
        assert_eq!(estimator.level_dbfs(), INITIAL_SPEECH_LEVEL_DBFS);
        assert!(!estimator.is_confident());
    }

    #[test]
    fn converges_to_speech_level() {
        let mut estimator = SpeechLevelEstimator::new();
        for _ in 0..100 {
            estimator.update(-45.0, 1.0);
        }
        assert!((estimator.level_dbfs() + 45.0).abs() < 1e-3);
        assert!(estimator.is_confident());
    }

    #[test]
    fn ignores_non_speech() {
        let mut estimator = SpeechLevelEstimator::new();
        for _ in 0..100 {
            estimator.update(-10.0, 0.5);
        }
        assert_eq!(estimator.level_dbfs(), INITIAL_SPEECH_LEVEL_DBFS);
    }

    #[test]
    fn short_bursts_are_rolled_back() {
        let mut estimator = SpeechLevelEstimator::new();
        for _ in 0..50 {
            estimator.update(-40.0, 1.0);
        }
        estimator.update(0.0, 0.0);
        for _ in 0..(ADJACENT_SPEECH_FRAMES_THRESHOLD - 1) {
            estimator.update(0.0, 1.0);
        }
        estimator.update(0.0, 0.0);
        for _ in 0..(ADJACENT_SPEECH_FRAMES_THRESHOLD + 5) {
            estimator.update(-40.0, 1.0);
        }
        assert!((estimator.level_dbfs() + 40.0).abs() < 1e-3);
    }
}
