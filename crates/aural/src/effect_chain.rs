//! Ordered chain of the enabled effects.

use aural_aec::{EchoCanceller, EchoCancellerMetrics};
use aural_agc::{GainControlOutput, GainController, VoiceActivityDetector};
use aural_ns::NoiseSuppressor;
use tracing::debug;

use crate::config::Config;
use crate::internal_format::{InternalFormat, InternalFrame};

/// Speech probability at which the voice detector reports voice.
const VOICE_PROBABILITY_THRESHOLD: f32 = 0.5;

/// One stage of the chain.
#[derive(Debug)]
pub(crate) enum Effect {
    EchoCanceller(EchoCanceller),
    NoiseSuppressor(NoiseSuppressor),
    GainController(GainController),
}

impl Effect {
    fn name(&self) -> &'static str {
        match self {
            Self::EchoCanceller(_) => "echo_canceller",
            Self::NoiseSuppressor(_) => "noise_suppressor",
            Self::GainController(_) => "gain_controller",
        }
    }
}

/// The enabled effects in the fixed order echo cancellation, noise
/// suppression, gain control, plus the optional voice detector that looks at
/// the processed frame.
#[derive(Debug)]
pub(crate) struct EffectChain {
    format: InternalFormat,
    effects: Vec<Effect>,
    voice_detector: Option<VoiceActivityDetector>,
    gain_output: Option<GainControlOutput>,
    voice_detected: bool,
}

impl EffectChain {
    pub(crate) fn new(config: &Config, format: InternalFormat) -> Self {
        let rate = format.sample_rate_hz;
        let channels = format.num_channels;
        let mut effects = Vec::with_capacity(3);
        if let Some(ec) = &config.echo_canceller {
            effects.push(Effect::EchoCanceller(EchoCanceller::new(
                ec.to_effect_config(),
                rate,
                channels,
            )));
        }
        if let Some(ns) = &config.noise_suppression {
            effects.push(Effect::NoiseSuppressor(NoiseSuppressor::new(
                ns.to_effect_config(),
                rate,
                channels,
            )));
        }
        if let Some(gc) = &config.gain_controller {
            effects.push(Effect::GainController(GainController::new(
                gc.to_effect_config(),
                rate,
            )));
        }
        let voice_detector = config
            .voice_detection
            .as_ref()
            .map(|_| VoiceActivityDetector::new(rate));

        debug!(
            sample_rate_hz = rate,
            num_channels = channels,
            effects = ?effects.iter().map(Effect::name).collect::<Vec<_>>(),
            voice_detection = voice_detector.is_some(),
            "effect chain initialized"
        );

        Self {
            format,
            effects,
            voice_detector,
            gain_output: None,
            voice_detected: false,
        }
    }

    pub(crate) fn format(&self) -> InternalFormat {
        self.format
    }

    /// Whether a stage consumes the reverse reference.
    pub(crate) fn needs_reference(&self) -> bool {
        self.echo_canceller().is_some()
    }

    /// Runs every stage in place on `frame`. `reference` is only read by
    /// the echo canceller.
    pub(crate) fn apply(&mut self, frame: &mut InternalFrame, reference: &[f32]) {
        for effect in &mut self.effects {
            match effect {
                Effect::EchoCanceller(ec) => ec.process(frame, reference),
                Effect::NoiseSuppressor(ns) => ns.process(frame),
                Effect::GainController(gc) => self.gain_output = Some(gc.process(frame)),
            }
        }
        if let Some(vad) = self.voice_detector.as_mut() {
            self.voice_detected = vad.analyze(frame) >= VOICE_PROBABILITY_THRESHOLD;
        }
    }

    /// Forwards the render-to-capture delay to the echo canceller. Returns
    /// the applied delay in samples.
    pub(crate) fn set_delay_samples(&mut self, delay: usize) -> Option<usize> {
        self.effects.iter_mut().find_map(|effect| match effect {
            Effect::EchoCanceller(ec) => Some(ec.set_delay_samples(delay)),
            _ => None,
        })
    }

    pub(crate) fn echo_metrics(&self) -> Option<EchoCancellerMetrics> {
        self.echo_canceller().map(EchoCanceller::metrics)
    }

    pub(crate) fn noise_level_dbfs(&self) -> Option<f32> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::NoiseSuppressor(ns) => Some(ns.noise_level_dbfs()),
            _ => None,
        })
    }

    /// Analysis of the latest frame by the gain controller.
    pub(crate) fn gain_output(&self) -> Option<GainControlOutput> {
        self.gain_output
    }

    /// Voice decision of the latest frame; `false` without voice detection.
    pub(crate) fn has_voice(&self) -> bool {
        self.voice_detected
    }

    pub(crate) fn voice_detection_enabled(&self) -> bool {
        self.voice_detector.is_some()
    }

    fn echo_canceller(&self) -> Option<&EchoCanceller> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::EchoCanceller(ec) => Some(ec),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use aural_proptest::generators::{sine, white_noise};

    use super::*;
    use crate::config::{EchoCanceller as EchoConfig, VoiceDetection};

    fn format() -> InternalFormat {
        InternalFormat {
            sample_rate_hz: 16_000,
            num_channels: 1,
        }
    }

    fn frame_from(samples: &[f32]) -> InternalFrame {
        let mut frame = format().new_frame();
        frame.channel_mut(0).copy_from_slice(samples);
        frame
    }

    #[test]
    fn empty_chain_is_identity() {
        let mut chain = EffectChain::new(&Config::default(), format());
        assert!(!chain.needs_reference());
        let input = white_noise(160, 1000.0, 1);
        let mut frame = frame_from(&input);
        chain.apply(&mut frame, &[]);
        assert_eq!(frame.channel(0), input.as_slice());
        assert!(chain.gain_output().is_none());
        assert!(chain.echo_metrics().is_none());
        assert!(chain.noise_level_dbfs().is_none());
        assert_eq!(chain.set_delay_samples(10), None);
    }

    #[test]
    fn stages_follow_fixed_order() {
        let chain = EffectChain::new(&Config::with_effects(true, true, true), format());
        let names: Vec<_> = chain.effects.iter().map(Effect::name).collect();
        assert_eq!(names, ["echo_canceller", "noise_suppressor", "gain_controller"]);
        assert!(chain.needs_reference());
    }

    #[test]
    fn gain_control_reports_analysis() {
        let mut chain = EffectChain::new(&Config::with_effects(false, false, true), format());
        let mut frame = frame_from(&sine(160, 300.0, 16_000, 3000.0));
        chain.apply(&mut frame, &[]);
        let output = chain.gain_output().unwrap();
        assert!(output.applied_gain_db >= 0.0);
    }

    #[test]
    fn delay_reaches_echo_canceller() {
        let config = Config {
            echo_canceller: Some(EchoConfig::default()),
            ..Default::default()
        };
        let mut chain = EffectChain::new(&config, format());
        assert_eq!(chain.set_delay_samples(320), Some(320));
        assert_eq!(chain.echo_metrics().unwrap().delay_samples, 320);
    }

    #[test]
    fn voice_detection_flags_speech_after_silence() {
        let config = Config {
            voice_detection: Some(VoiceDetection::default()),
            ..Default::default()
        };
        let mut chain = EffectChain::new(&config, format());
        assert!(chain.voice_detection_enabled());
        for _ in 0..20 {
            let mut frame = format().new_frame();
            chain.apply(&mut frame, &[]);
            assert!(!chain.has_voice());
        }
        let mut frame = frame_from(&sine(160, 300.0, 16_000, 5000.0));
        chain.apply(&mut frame, &[]);
        assert!(chain.has_voice());
    }
}
