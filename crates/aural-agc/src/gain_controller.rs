//! Gain controller: adaptive digital gain, fixed digital gain and limiter.

use aural_common_audio::channel_buffer::ChannelBuffer;
use tracing::{trace, warn};

use crate::common::{FRAME_DURATION_MS, VAD_CONFIDENCE_THRESHOLD, float_s16_to_dbfs, rms_and_peak};
use crate::config::{AdaptiveDigitalConfig, GainControllerConfig};
use crate::gain_applier::GainApplier;
use crate::limiter::Limiter;
use crate::noise_level_estimator::NoiseLevelEstimator;
use crate::speech_level_estimator::SpeechLevelEstimator;
use crate::vad::VoiceActivityDetector;

/// Per-frame analysis reported by [`GainController::process`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainControlOutput {
    /// Estimated speech level of the input in dBFS.
    pub speech_level_dbfs: f32,
    /// Estimated noise level of the input in dBFS.
    pub noise_level_dbfs: f32,
    /// Speech probability of the frame.
    pub speech_probability: f32,
    /// Whether the frame was classified as speech.
    pub voice_detected: bool,
    /// Adaptive plus fixed gain applied before limiting, in dB.
    pub applied_gain_db: f32,
    /// Smallest limiter gain of the frame in dB (0 when not limiting).
    pub limiter_gain_db: f32,
}

/// Automatic gain controller for 10 ms float-S16 frames.
#[derive(Debug)]
pub struct GainController {
    config: GainControllerConfig,
    sample_rate_hz: u32,
    vad: VoiceActivityDetector,
    speech_level: SpeechLevelEstimator,
    noise_level: NoiseLevelEstimator,
    gain_applier: GainApplier,
    limiter: Limiter,
    adaptive_gain_db: f32,
}

impl GainController {
    pub fn new(config: GainControllerConfig, sample_rate_hz: u32) -> Self {
        if !config.is_valid() {
            warn!(?config, "gain controller config out of range");
        }
        let adaptive_gain_db = initial_adaptive_gain_db(&config);
        let gain_applier = GainApplier::new(adaptive_gain_db + config.fixed_digital.gain_db);
        Self {
            config,
            sample_rate_hz,
            vad: VoiceActivityDetector::new(sample_rate_hz),
            speech_level: SpeechLevelEstimator::new(),
            noise_level: NoiseLevelEstimator::new(),
            gain_applier,
            limiter: Limiter::new(sample_rate_hz),
            adaptive_gain_db,
        }
    }

    pub fn config(&self) -> &GainControllerConfig {
        &self.config
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Current adaptive gain in dB, excluding the fixed gain.
    pub fn adaptive_gain_db(&self) -> f32 {
        self.adaptive_gain_db
    }

    /// Processes one frame in place.
    pub fn process(&mut self, frame: &mut ChannelBuffer<f32>) -> GainControlOutput {
        let speech_probability = self.vad.analyze(frame);
        let voice_detected = speech_probability >= VAD_CONFIDENCE_THRESHOLD;
        let (rms, _) = rms_and_peak(frame.as_slice());
        let noise_level_dbfs = self.noise_level.update(rms * rms, speech_probability);

        if let Some(adaptive) = &self.config.adaptive_digital {
            self.speech_level.update(float_s16_to_dbfs(rms), speech_probability);
            self.adaptive_gain_db = next_adaptive_gain_db(
                adaptive,
                self.adaptive_gain_db,
                self.speech_level.level_dbfs(),
                noise_level_dbfs,
                voice_detected && self.speech_level.is_confident(),
            );
        }

        let applied_gain_db = self.adaptive_gain_db + self.config.fixed_digital.gain_db;
        self.gain_applier.apply(frame, applied_gain_db);
        let limiter_gain_db = self.limiter.process(frame);

        trace!(
            speech_probability,
            noise_level_dbfs,
            applied_gain_db,
            limiter_gain_db,
            "agc frame"
        );
        GainControlOutput {
            speech_level_dbfs: self.speech_level.level_dbfs(),
            noise_level_dbfs,
            speech_probability,
            voice_detected,
            applied_gain_db,
            limiter_gain_db,
        }
    }

    pub fn reset(&mut self) {
        self.vad.reset();
        self.speech_level.reset();
        self.noise_level.reset();
        self.limiter.reset();
        self.adaptive_gain_db = initial_adaptive_gain_db(&self.config);
        self.gain_applier =
            GainApplier::new(self.adaptive_gain_db + self.config.fixed_digital.gain_db);
    }
}

fn initial_adaptive_gain_db(config: &GainControllerConfig) -> f32 {
    config
        .adaptive_digital
        .as_ref()
        .map_or(0.0, |a| a.initial_gain_db)
}

/// Moves the adaptive gain one frame towards the gain that brings the speech
/// level to `-headroom_db` dBFS without lifting the noise above
/// `max_output_noise_level_dbfs`. The gain only increases on confident
/// speech frames.
fn next_adaptive_gain_db(
    config: &AdaptiveDigitalConfig,
    current_db: f32,
    speech_level_dbfs: f32,
    noise_level_dbfs: f32,
    increase_allowed: bool,
) -> f32 {
    let noise_cap_db = (config.max_output_noise_level_dbfs - noise_level_dbfs).max(0.0);
    let target_db = (-config.headroom_db - speech_level_dbfs)
        .clamp(0.0, config.max_gain_db)
        .min(noise_cap_db);

    let max_step_db = config.max_gain_change_db_per_second * FRAME_DURATION_MS / 1000.0;
    let mut delta_db = target_db - current_db;
    if delta_db > 0.0 && !increase_allowed {
        delta_db = 0.0;
    }
    current_db + delta_db.clamp(-max_step_db, max_step_db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FixedDigitalConfig;
    use aural_proptest::generators::sine;
    use proptest::collection::vec;
    use proptest::prelude::ProptestConfig;
    use test_strategy::proptest;

    fn adaptive_config() -> GainControllerConfig {
        GainControllerConfig {
            adaptive_digital: Some(AdaptiveDigitalConfig::default()),
            ..Default::default()
        }
    }

    fn run(controller: &mut GainController, input: &[f32], frames: usize) -> ChannelBuffer<f32> {
        let mut frame = ChannelBuffer::new(input.len(), 1);
        for _ in 0..frames {
            frame.channel_mut(0).copy_from_slice(input);
            controller.process(&mut frame);
        }
        frame
    }

    #[test]
    fn quiet_speech_is_amplified() {
        let mut controller = GainController::new(adaptive_config(), 16_000);
        // -40 dBFS RMS.
        let tone = sine(160, 300.0, 16_000, 463.4);
        run(&mut controller, &tone, 500);
        assert!(controller.adaptive_gain_db() > 25.0, "{}", controller.adaptive_gain_db());
        assert!(controller.adaptive_gain_db() <= 35.1);
    }

    #[test]
    fn gain_change_rate_is_bounded() {
        let mut controller = GainController::new(adaptive_config(), 16_000);
        let tone = sine(160, 300.0, 16_000, 463.4);
        let mut frame = ChannelBuffer::new(160, 1);
        let mut previous = controller.adaptive_gain_db();
        for _ in 0..300 {
            frame.channel_mut(0).copy_from_slice(&tone);
            let output = controller.process(&mut frame);
            assert!((output.applied_gain_db - previous).abs() <= 0.06 + 1e-4);
            previous = output.applied_gain_db;
        }
    }

    #[test]
    fn silence_does_not_raise_gain() {
        let mut controller = GainController::new(adaptive_config(), 48_000);
        let frame = run(&mut controller, &[0.0; 480], 200);
        assert_eq!(controller.adaptive_gain_db(), 15.0);
        assert!(frame.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn fixed_gain_only() {
        let config = GainControllerConfig {
            adaptive_digital: None,
            fixed_digital: FixedDigitalConfig { gain_db: 6.0 },
        };
        let mut controller = GainController::new(config, 16_000);
        let tone = sine(160, 500.0, 16_000, 1000.0);
        let frame = run(&mut controller, &tone, 3);
        let factor = 10f32.powf(6.0 / 20.0);
        for (out, inp) in frame.channel(0).iter().zip(&tone) {
            assert!((out - inp * factor).abs() < 1e-2, "{out} vs {inp}");
        }
    }

    #[test]
    fn loud_input_is_limited() {
        let config = GainControllerConfig {
            adaptive_digital: None,
            fixed_digital: FixedDigitalConfig { gain_db: 10.0 },
        };
        let mut controller = GainController::new(config, 32_000);
        let tone = sine(320, 1000.0, 32_000, 30_000.0);
        let mut frame = ChannelBuffer::new(320, 1);
        for _ in 0..10 {
            frame.channel_mut(0).copy_from_slice(&tone);
            let output = controller.process(&mut frame);
            assert!(output.limiter_gain_db < 0.0);
            let threshold = controller.limiter.threshold();
            assert!(frame.channel(0).iter().all(|v| v.abs() <= threshold));
        }
    }

    #[test]
    fn reset_restores_initial_gain() {
        let mut controller = GainController::new(adaptive_config(), 16_000);
        let tone = sine(160, 300.0, 16_000, 463.4);
        run(&mut controller, &tone, 200);
        assert!(controller.adaptive_gain_db() > 15.0);
        controller.reset();
        assert_eq!(controller.adaptive_gain_db(), 15.0);
    }

    #[proptest(ProptestConfig::with_cases(16))]
    fn output_is_bounded(
        #[strategy(vec(-32_768.0f32..32_767.0, 480 * 4))] samples: Vec<f32>,
    ) {
        let mut controller = GainController::new(adaptive_config(), 48_000);
        let mut frame = ChannelBuffer::new(480, 1);
        for chunk in samples.chunks_exact(480) {
            frame.channel_mut(0).copy_from_slice(chunk);
            controller.process(&mut frame);
            let threshold = controller.limiter.threshold();
            assert!(frame.channel(0).iter().all(|v| v.abs() <= threshold));
        }
    }
}
