//! Audio processing configuration.

use aural_aec::EchoCancellerConfig;
use aural_agc::GainControllerConfig;
pub use aural_agc::{AdaptiveDigitalConfig as AdaptiveDigital, FixedDigitalConfig as FixedDigital};
pub use aural_common_audio::channel_mixer::DownmixMethod;
use aural_ns::{NsConfig, SuppressionLevel};

/// Top-level configuration of an [`AudioProcessor`](crate::AudioProcessor).
///
/// The config is fixed for the lifetime of a processor. All effects are
/// disabled (`None`) by default; setting one to `Some(...)` enables it.
/// Effects always run in the order echo cancellation, noise suppression,
/// gain control.
///
/// # Example
///
/// ```
/// use aural::Config;
/// use aural::config::{EchoCanceller, NoiseSuppression, NoiseSuppressionLevel};
///
/// let config = Config {
///     echo_canceller: Some(EchoCanceller::default()),
///     noise_suppression: Some(NoiseSuppression {
///         level: NoiseSuppressionLevel::High,
///     }),
///     ..Default::default()
/// };
/// assert!(config.gain_controller.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Pipeline processing properties.
    pub pipeline: Pipeline,
    /// Echo canceller settings. Set to `Some(...)` to enable.
    pub echo_canceller: Option<EchoCanceller>,
    /// Noise suppression settings. Set to `Some(...)` to enable.
    pub noise_suppression: Option<NoiseSuppression>,
    /// Gain controller settings. Set to `Some(...)` to enable.
    pub gain_controller: Option<GainController>,
    /// Voice activity detection on the processed capture signal. Set to
    /// `Some(...)` to enable.
    pub voice_detection: Option<VoiceDetection>,
}

impl Config {
    /// Config with the three effects enabled at their defaults according to
    /// the flags. Gain control uses the adaptive digital controller.
    pub fn with_effects(echo_cancellation: bool, noise_suppression: bool, gain_control: bool) -> Self {
        Self {
            echo_canceller: echo_cancellation.then(EchoCanceller::default),
            noise_suppression: noise_suppression.then(NoiseSuppression::default),
            gain_controller: gain_control.then(|| GainController {
                adaptive_digital: Some(AdaptiveDigital::default()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

/// Maximum internal processing rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxProcessingRate {
    /// 32 kHz internal processing rate.
    #[default]
    Rate32kHz,
    /// 48 kHz internal processing rate.
    Rate48kHz,
}

impl MaxProcessingRate {
    /// Returns the rate in Hz.
    pub(crate) fn as_hz(self) -> u32 {
        match self {
            Self::Rate32kHz => 32_000,
            Self::Rate48kHz => 48_000,
        }
    }
}

/// Pipeline processing properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    /// Maximum allowed processing rate used internally.
    pub maximum_internal_processing_rate: MaxProcessingRate,
    /// Process every capture channel instead of a mono downmix.
    pub multi_channel_capture: bool,
    /// How to downmix multi-channel capture audio to mono.
    pub capture_downmix_method: DownmixMethod,
}

/// Echo canceller settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoCanceller {
    /// Length of the modelled echo path in milliseconds (default: 32).
    pub filter_length_ms: u32,
}

impl Default for EchoCanceller {
    fn default() -> Self {
        Self {
            filter_length_ms: 32,
        }
    }
}

impl EchoCanceller {
    pub(crate) fn to_effect_config(&self) -> EchoCancellerConfig {
        EchoCancellerConfig {
            filter_length_ms: self.filter_length_ms,
            ..Default::default()
        }
    }
}

/// Background noise suppression settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoiseSuppression {
    /// Aggressiveness level for noise suppression (default: `Moderate`).
    pub level: NoiseSuppressionLevel,
}

/// Noise suppression aggressiveness level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoiseSuppressionLevel {
    /// Low suppression (~6 dB).
    Low,
    /// Moderate suppression (~12 dB, default).
    #[default]
    Moderate,
    /// High suppression (~18 dB).
    High,
    /// Very high suppression (~21 dB).
    VeryHigh,
}

impl NoiseSuppression {
    pub(crate) fn to_effect_config(&self) -> NsConfig {
        let target_level = match self.level {
            NoiseSuppressionLevel::Low => SuppressionLevel::K6dB,
            NoiseSuppressionLevel::Moderate => SuppressionLevel::K12dB,
            NoiseSuppressionLevel::High => SuppressionLevel::K18dB,
            NoiseSuppressionLevel::VeryHigh => SuppressionLevel::K21dB,
        };
        NsConfig { target_level }
    }
}

/// Gain controller settings.
///
/// Brings the captured signal to the desired level with an adaptive digital
/// gain and a fixed digital gain, followed by a limiter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GainController {
    /// Adaptive digital controller settings. Set to `Some(...)` to enable.
    pub adaptive_digital: Option<AdaptiveDigital>,
    /// Fixed gain applied after the adaptive gain and before the limiter.
    pub fixed_digital: FixedDigital,
}

impl GainController {
    pub(crate) fn to_effect_config(&self) -> GainControllerConfig {
        GainControllerConfig {
            adaptive_digital: self.adaptive_digital.clone(),
            fixed_digital: self.fixed_digital.clone(),
        }
    }
}

/// Voice activity detection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceDetection {}
