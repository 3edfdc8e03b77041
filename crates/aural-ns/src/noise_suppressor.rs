//! Noise suppressor: per-channel noise tracking and Wiener gain.

use aural_common_audio::channel_buffer::ChannelBuffer;

use crate::config::{FULL_SCALE_POWER, MIN_POWER, NsConfig};
use crate::noise_estimator::NoiseEstimator;
use crate::speech_probability_estimator::{SpeechProbabilityEstimator, zero_crossing_rate};
use crate::wiener_filter::WienerFilter;

#[derive(Debug)]
struct ChannelState {
    noise: NoiseEstimator,
    speech: SpeechProbabilityEstimator,
    filter: WienerFilter,
    /// Gain reached at the end of the previous frame.
    gain: f32,
}

impl ChannelState {
    fn new(config: NsConfig) -> Self {
        Self {
            noise: NoiseEstimator::new(),
            speech: SpeechProbabilityEstimator::default(),
            filter: WienerFilter::new(config.target_level.min_gain()),
            gain: 1.0,
        }
    }

    fn process(&mut self, frame: &mut [f32]) {
        if frame.is_empty() {
            return;
        }
        let power = frame.iter().map(|&v| v * v).sum::<f32>() / frame.len() as f32;
        let post_snr = if self.noise.is_initialized() {
            power / self.noise.noise_power()
        } else {
            1.0
        };

        let target_gain = self.filter.update(post_snr);
        self.speech.update(
            post_snr,
            self.filter.prior_snr(),
            zero_crossing_rate(frame),
        );
        self.noise.update(power, self.speech.probability());

        // Ramp from the previous gain to avoid steps at frame edges.
        let step = (target_gain - self.gain) / frame.len() as f32;
        for (i, v) in frame.iter_mut().enumerate() {
            *v *= self.gain + step * (i + 1) as f32;
        }
        self.gain = target_gain;
    }
}

/// Suppresses stationary background noise in 10 ms float-S16 frames.
#[derive(Debug)]
pub struct NoiseSuppressor {
    config: NsConfig,
    sample_rate_hz: u32,
    channels: Vec<ChannelState>,
}

impl NoiseSuppressor {
    /// Creates a suppressor for `num_channels` channels at `sample_rate_hz`.
    pub fn new(config: NsConfig, sample_rate_hz: u32, num_channels: usize) -> Self {
        tracing::debug!(
            sample_rate_hz,
            num_channels,
            level = ?config.target_level,
            "noise suppressor initialized"
        );
        Self {
            config,
            sample_rate_hz,
            channels: (0..num_channels).map(|_| ChannelState::new(config)).collect(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> NsConfig {
        self.config
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Suppresses noise in place.
    ///
    /// # Panics
    ///
    /// Panics if `capture` has a different channel count than configured.
    pub fn process(&mut self, capture: &mut ChannelBuffer<f32>) {
        assert_eq!(capture.num_channels(), self.channels.len());
        for (ch, state) in self.channels.iter_mut().enumerate() {
            state.process(capture.channel_mut(ch));
        }
    }

    /// Estimated noise level averaged over channels, in dBFS.
    pub fn noise_level_dbfs(&self) -> f32 {
        if self.channels.is_empty() {
            return 10.0 * (MIN_POWER / FULL_SCALE_POWER).log10();
        }
        let sum: f32 = self
            .channels
            .iter()
            .map(|c| 10.0 * (c.noise.noise_power() / FULL_SCALE_POWER).log10())
            .sum();
        sum / self.channels.len() as f32
    }

    /// Speech probability of the latest frame, averaged over channels.
    pub fn speech_probability(&self) -> f32 {
        if self.channels.is_empty() {
            return 0.0;
        }
        self.channels
            .iter()
            .map(|c| c.speech.probability())
            .sum::<f32>()
            / self.channels.len() as f32
    }

    /// Forgets all adaptive state.
    pub fn reset(&mut self) {
        for state in &mut self.channels {
            state.noise.reset();
            state.speech = SpeechProbabilityEstimator::default();
            state.filter.reset();
            state.gain = 1.0;
        }
    }
}
