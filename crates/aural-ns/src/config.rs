//! Noise suppressor configuration and tuning constants.

/// Smallest tracked power in float-S16 units (about -90.3 dBFS).
pub const MIN_POWER: f32 = 1.0;

/// Power of a full-scale float-S16 signal; 0 dBFS.
pub const FULL_SCALE_POWER: f32 = 32768.0 * 32768.0;

/// Weight of the previous frame in the decision-directed prior SNR.
pub(crate) const DECISION_DIRECTED_ALPHA: f32 = 0.98;

/// Rate at which the noise floor may rise during speech, in dB per second.
pub(crate) const NOISE_RISE_DB_PER_SECOND: f32 = 3.0;

/// Share of the gap to the frame power closed per non-speech frame.
pub(crate) const NOISE_TRACKING_RATE: f32 = 0.1;

/// Speech probability above which the noise floor only rises slowly.
pub(crate) const SPEECH_PROBABILITY_THRESHOLD: f32 = 0.5;

/// How aggressively noise is suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuppressionLevel {
    /// Up to 6 dB of attenuation.
    K6dB,
    /// Up to 12 dB of attenuation.
    #[default]
    K12dB,
    /// Up to 18 dB of attenuation.
    K18dB,
    /// Up to 21 dB of attenuation.
    K21dB,
}

impl SuppressionLevel {
    /// Maximum attenuation in dB.
    pub fn attenuation_db(self) -> f32 {
        match self {
            Self::K6dB => 6.0,
            Self::K12dB => 12.0,
            Self::K18dB => 18.0,
            Self::K21dB => 21.0,
        }
    }

    /// Smallest gain the suppressor applies.
    pub fn min_gain(self) -> f32 {
        match self {
            Self::K6dB => 0.5,
            Self::K12dB => 0.25,
            Self::K18dB => 0.125,
            Self::K21dB => 0.089_125,
        }
    }
}

/// Noise suppressor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NsConfig {
    /// Attenuation applied to pure noise.
    pub target_level: SuppressionLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_gain_matches_attenuation() {
        for level in [
            SuppressionLevel::K6dB,
            SuppressionLevel::K12dB,
            SuppressionLevel::K18dB,
            SuppressionLevel::K21dB,
        ] {
            let db = -20.0 * level.min_gain().log10();
            assert!(
                (db - level.attenuation_db()).abs() < 0.1,
                "{level:?}: {db} dB"
            );
        }
    }
}
