//! Frame speech probability.
//!
//! Combines a slowly adapting prior, built from sigmoid indicators of two
//! features (the smoothed log-likelihood ratio and the zero-crossing rate),
//! with the likelihood ratio of the current frame.

/// Width of the sigmoid maps during speech.
const WIDTH_PRIOR_0: f32 = 4.0;
/// Width during pauses: wider map in the lower range.
const WIDTH_PRIOR_1: f32 = 2.0 * WIDTH_PRIOR_0;
/// Log-likelihood ratio at which the LRT indicator is one half.
const LRT_THRESHOLD: f32 = 0.5;
/// Zero-crossing rate below which frames look voiced.
const ZERO_CROSSING_THRESHOLD: f32 = 0.25;
const LRT_WEIGHTING: f32 = 0.6;
const ZERO_CROSSING_WEIGHTING: f32 = 0.4;
/// Bound on the per-frame log-likelihood ratio.
const MAX_LOG_LRT: f32 = 20.0;

#[derive(Debug)]
pub(crate) struct SpeechProbabilityEstimator {
    prior_speech_prob: f32,
    avg_log_lrt: f32,
    speech_probability: f32,
}

impl Default for SpeechProbabilityEstimator {
    fn default() -> Self {
        Self {
            prior_speech_prob: 0.5,
            avg_log_lrt: 0.0,
            speech_probability: 0.0,
        }
    }
}

impl SpeechProbabilityEstimator {
    /// Updates the probability from the posterior and prior SNR of the frame
    /// and its zero-crossing rate.
    pub(crate) fn update(&mut self, post_snr: f32, prior_snr: f32, zero_crossing_rate: f32) {
        let log_lrt = (post_snr * prior_snr / (1.0 + prior_snr) - (1.0 + prior_snr).ln())
            .clamp(-MAX_LOG_LRT, MAX_LOG_LRT);
        self.avg_log_lrt += 0.5 * (log_lrt - self.avg_log_lrt);

        let width_prior = if self.avg_log_lrt < LRT_THRESHOLD {
            WIDTH_PRIOR_1
        } else {
            WIDTH_PRIOR_0
        };
        let indicator0 = 0.5 * ((width_prior * (self.avg_log_lrt - LRT_THRESHOLD)).tanh() + 1.0);

        let width_prior = if zero_crossing_rate > ZERO_CROSSING_THRESHOLD {
            WIDTH_PRIOR_1
        } else {
            WIDTH_PRIOR_0
        };
        let indicator1 =
            0.5 * ((width_prior * (ZERO_CROSSING_THRESHOLD - zero_crossing_rate)).tanh() + 1.0);

        let ind_prior = LRT_WEIGHTING * indicator0 + ZERO_CROSSING_WEIGHTING * indicator1;
        self.prior_speech_prob += 0.1 * (ind_prior - self.prior_speech_prob);
        self.prior_speech_prob = self.prior_speech_prob.clamp(0.01, 1.0);

        let gain_prior = (1.0 - self.prior_speech_prob) / (self.prior_speech_prob + 0.0001);
        self.speech_probability = 1.0 / (1.0 + gain_prior * (-self.avg_log_lrt).exp());
    }

    #[cfg(test)]
    pub(crate) fn prior_probability(&self) -> f32 {
        self.prior_speech_prob
    }

    pub(crate) fn probability(&self) -> f32 {
        self.speech_probability
    }
}

/// Fraction of adjacent sample pairs whose signs differ.
pub(crate) fn zero_crossing_rate(frame: &[f32]) -> f32 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f32 / (frame.len() - 1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state() {
        let est = SpeechProbabilityEstimator::default();
        assert_eq!(est.prior_probability(), 0.5);
        assert_eq!(est.probability(), 0.0);
    }

    #[test]
    fn zero_crossings() {
        assert_eq!(zero_crossing_rate(&[1.0, -1.0, 1.0, -1.0, 1.0]), 1.0);
        assert_eq!(zero_crossing_rate(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(zero_crossing_rate(&[1.0]), 0.0);
    }

    #[test]
    fn noise_like_frames_give_low_probability() {
        let mut est = SpeechProbabilityEstimator::default();
        for _ in 0..100 {
            est.update(1.0, 0.02, 0.5);
        }
        assert!(est.probability() < 0.05, "{}", est.probability());
        assert!((est.prior_probability() - 0.01).abs() < 0.01);
    }

    #[test]
    fn high_snr_gives_high_probability_immediately() {
        let mut est = SpeechProbabilityEstimator::default();
        for _ in 0..100 {
            est.update(1.0, 0.02, 0.5);
        }
        est.update(1000.0, 20.0, 0.1);
        assert!(est.probability() > 0.99, "{}", est.probability());
    }

    #[test]
    fn probabilities_stay_in_range() {
        let mut est = SpeechProbabilityEstimator::default();
        for &(post, prior, zcr) in &[
            (0.0, 0.0, 0.0),
            (1e9, 1e9, 1.0),
            (1.0, 0.0, 0.3),
            (5.0, 2.0, 0.05),
        ] {
            est.update(post, prior, zcr);
            assert!((0.0..=1.0).contains(&est.probability()));
            assert!((0.01..=1.0).contains(&est.prior_probability()));
        }
    }
}
