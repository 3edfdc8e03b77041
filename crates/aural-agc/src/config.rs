//! Gain controller configuration.

/// Gain controller settings.
///
/// The adaptive digital controller is enabled when
/// [`adaptive_digital`](Self::adaptive_digital) is `Some`. The fixed digital
/// gain and the limiter are always active.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GainControllerConfig {
    /// Adaptive digital controller settings. Set to `Some(...)` to enable.
    pub adaptive_digital: Option<AdaptiveDigitalConfig>,
    /// Fixed gain applied after the adaptive gain and before the limiter.
    pub fixed_digital: FixedDigitalConfig,
}

/// Adaptive digital controller settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveDigitalConfig {
    /// Headroom in dB kept between the speech level and full scale
    /// (default: 5.0).
    pub headroom_db: f32,
    /// Maximum gain in dB (default: 50.0).
    pub max_gain_db: f32,
    /// Initial gain in dB (default: 15.0).
    pub initial_gain_db: f32,
    /// Maximum gain change rate in dB/second (default: 6.0).
    pub max_gain_change_db_per_second: f32,
    /// Maximum output noise level in dBFS (default: -50.0).
    pub max_output_noise_level_dbfs: f32,
}

impl Default for AdaptiveDigitalConfig {
    fn default() -> Self {
        Self {
            headroom_db: 5.0,
            max_gain_db: 50.0,
            initial_gain_db: 15.0,
            max_gain_change_db_per_second: 6.0,
            max_output_noise_level_dbfs: -50.0,
        }
    }
}

/// Fixed digital gain settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedDigitalConfig {
    /// Fixed gain in dB (default: 0.0). A positive value turns the limiter
    /// into a compressor that first applies a fixed gain.
    pub gain_db: f32,
}

impl GainControllerConfig {
    /// Checks that all parameters are in range.
    pub fn is_valid(&self) -> bool {
        let fixed_ok = self.fixed_digital.gain_db.is_finite()
            && (0.0..=90.0).contains(&self.fixed_digital.gain_db);
        let adaptive_ok = self.adaptive_digital.as_ref().is_none_or(|a| {
            a.headroom_db >= 0.0
                && a.max_gain_db > 0.0
                && (0.0..=a.max_gain_db).contains(&a.initial_gain_db)
                && a.max_gain_change_db_per_second > 0.0
                && a.max_output_noise_level_dbfs <= 0.0
        });
        fixed_ok && adaptive_ok
    }
}
