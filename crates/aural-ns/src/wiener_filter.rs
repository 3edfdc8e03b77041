//! Decision-directed Wiener gain.

use crate::config::DECISION_DIRECTED_ALPHA;

#[derive(Debug)]
pub(crate) struct WienerFilter {
    min_gain: f32,
    prev_gain: f32,
    prev_post_snr: f32,
    prior_snr: f32,
}

impl WienerFilter {
    pub(crate) fn new(min_gain: f32) -> Self {
        Self {
            min_gain,
            prev_gain: 1.0,
            prev_post_snr: 1.0,
            prior_snr: 0.0,
        }
    }

    /// Computes the frame gain for posterior SNR `post_snr`
    /// (frame power over noise power).
    pub(crate) fn update(&mut self, post_snr: f32) -> f32 {
        self.prior_snr = DECISION_DIRECTED_ALPHA * self.prev_gain * self.prev_gain * self.prev_post_snr
            + (1.0 - DECISION_DIRECTED_ALPHA) * (post_snr - 1.0).max(0.0);
        let gain = (self.prior_snr / (1.0 + self.prior_snr)).clamp(self.min_gain, 1.0);
        self.prev_gain = gain;
        self.prev_post_snr = post_snr;
        gain
    }

    /// Prior SNR from the latest update.
    pub(crate) fn prior_snr(&self) -> f32 {
        self.prior_snr
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.min_gain);
    }
}
