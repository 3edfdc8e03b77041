//! Echo canceller configuration.

/// Tuning parameters of the echo canceller.
///
/// The defaults suit 10 ms frames of speech at 8-48 kHz. Use
/// [`validate()`](Self::validate) to clamp all parameters to usable ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct EchoCancellerConfig {
    /// Length of the modelled echo path in milliseconds.
    pub filter_length_ms: u32,
    /// Largest render-to-capture delay that can be compensated, in
    /// milliseconds.
    pub max_delay_ms: u32,
    /// NLMS step size in `(0, 1]`.
    pub step_size: f32,
    /// Regularization added to the reference power, per filter tap, in
    /// float-S16 power units.
    pub regularization: f32,
    /// Geigel threshold: adaptation pauses when the capture peak exceeds this
    /// fraction of the render peak.
    pub double_talk_threshold: f32,
    /// Frames adaptation stays paused after double talk was last detected.
    pub double_talk_hangover_frames: u32,
    /// Render power, in dBFS, below which the reference is treated as silent
    /// and the filter does not adapt.
    pub render_silence_dbfs: f32,
}

impl Default for EchoCancellerConfig {
    fn default() -> Self {
        Self {
            filter_length_ms: 32,
            max_delay_ms: 500,
            step_size: 0.5,
            regularization: 100.0,
            double_talk_threshold: 0.5,
            double_talk_hangover_frames: 10,
            render_silence_dbfs: -60.0,
        }
    }
}

impl EchoCancellerConfig {
    /// Clamps every parameter to a usable range.
    /// Returns `true` if no changes were needed.
    pub fn validate(&mut self) -> bool {
        let mut ok = true;
        ok &= limit_u32(&mut self.filter_length_ms, 1, 500);
        ok &= limit_u32(&mut self.max_delay_ms, 0, 1000);
        ok &= limit_f32(&mut self.step_size, 0.001, 1.0);
        ok &= limit_f32(&mut self.regularization, 0.0, 1.0e6);
        ok &= limit_f32(&mut self.double_talk_threshold, 0.0, 10.0);
        ok &= limit_u32(&mut self.double_talk_hangover_frames, 0, 1000);
        ok &= limit_f32(&mut self.render_silence_dbfs, -120.0, 0.0);
        ok
    }

    /// Number of filter taps at `sample_rate_hz`.
    pub fn filter_length_samples(&self, sample_rate_hz: u32) -> usize {
        ((self.filter_length_ms as usize * sample_rate_hz as usize) / 1000).max(1)
    }

    /// Largest compensable delay in samples at `sample_rate_hz`.
    pub fn max_delay_samples(&self, sample_rate_hz: u32) -> usize {
        (self.max_delay_ms as usize * sample_rate_hz as usize) / 1000
    }
}

fn limit_f32(value: &mut f32, min: f32, max: f32) -> bool {
    // NaN compares false everywhere; treat it as out of range.
    let clamped = if value.is_nan() { min } else { value.clamp(min, max) };
    if clamped == *value {
        return true;
    }
    *value = clamped;
    false
}

fn limit_u32(value: &mut u32, min: u32, max: u32) -> bool {
    let clamped = (*value).clamp(min, max);
    if clamped == *value {
        return true;
    }
    *value = clamped;
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let mut config = EchoCancellerConfig::default();
        assert!(config.validate());
        assert_eq!(config, EchoCancellerConfig::default());
    }

    #[test]
    fn validate_clamps_out_of_range_values() {
        let mut config = EchoCancellerConfig {
            filter_length_ms: 0,
            step_size: 3.0,
            regularization: f32::NAN,
            ..Default::default()
        };
        assert!(!config.validate());
        assert_eq!(config.filter_length_ms, 1);
        assert_eq!(config.step_size, 1.0);
        assert_eq!(config.regularization, 0.0);
    }

    #[test]
    fn lengths_scale_with_rate() {
        let config = EchoCancellerConfig::default();
        assert_eq!(config.filter_length_samples(16_000), 512);
        assert_eq!(config.filter_length_samples(48_000), 1536);
        assert_eq!(config.max_delay_samples(8_000), 4000);
    }
}
