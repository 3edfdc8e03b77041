//! Shared constants and level conversions.

/// Absolute maximum magnitude of a float-S16 sample.
pub const MAX_ABS_FLOAT_S16_VALUE: f32 = 32768.0;

/// Minimum audio level in dBFS for S16 samples (`20 * log10(1/32768)`).
pub const MIN_LEVEL_DBFS: f32 = -90.309;

/// Duration of one audio frame in milliseconds.
pub const FRAME_DURATION_MS: f32 = 10.0;
/// Number of sub-frames per frame used by the limiter.
pub const SUB_FRAMES_IN_FRAME: usize = 20;

/// Peak level the limiter never exceeds.
pub const LIMITER_THRESHOLD_DBFS: f32 = -1.0;

/// Speech probability threshold to detect speech activity.
pub const VAD_CONFIDENCE_THRESHOLD: f32 = 0.95;

/// Minimum number of adjacent speech frames having a sufficiently high speech
/// probability to reliably detect speech activity.
pub const ADJACENT_SPEECH_FRAMES_THRESHOLD: u32 = 12;

/// Milliseconds of speech to observe before the level estimate is trusted.
pub const LEVEL_ESTIMATOR_TIME_TO_CONFIDENCE_MS: f32 = 400.0;
/// Exponential decay factor for the speech level estimator.
pub const LEVEL_ESTIMATOR_LEAK_FACTOR: f32 = 1.0 - 1.0 / LEVEL_ESTIMATOR_TIME_TO_CONFIDENCE_MS;

/// Speech level assumed before any speech has been observed.
pub const INITIAL_SPEECH_LEVEL_DBFS: f32 = -30.0;

/// Converts a dB value to a linear ratio: `10^(v/20)`.
pub fn db_to_ratio(v: f32) -> f32 {
    10.0_f32.powf(v / 20.0)
}

/// Converts a linear ratio to dB, flooring at [`MIN_LEVEL_DBFS`].
pub fn ratio_to_db(v: f32) -> f32 {
    if v <= 0.0 {
        return MIN_LEVEL_DBFS;
    }
    (20.0 * v.log10()).max(MIN_LEVEL_DBFS)
}

/// Converts a dBFS value to a float-S16 linear value.
pub fn dbfs_to_float_s16(v: f32) -> f32 {
    db_to_ratio(v) * MAX_ABS_FLOAT_S16_VALUE
}

/// Converts a float-S16 linear value to dBFS.
pub fn float_s16_to_dbfs(v: f32) -> f32 {
    debug_assert!(v >= 0.0);
    if v <= 1.0 {
        return MIN_LEVEL_DBFS;
    }
    20.0 * v.log10() + MIN_LEVEL_DBFS
}

/// RMS and peak of all samples in float-S16 scale.
pub fn rms_and_peak(samples: &[f32]) -> (f32, f32) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let mut energy = 0.0f32;
    let mut peak = 0.0f32;
    for &v in samples {
        energy += v * v;
        peak = peak.max(v.abs());
    }
    ((energy / samples.len() as f32).sqrt(), peak)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_conversions() {
        assert!((float_s16_to_dbfs(32768.0)).abs() < 1e-3);
        assert_eq!(float_s16_to_dbfs(0.5), MIN_LEVEL_DBFS);
        assert!((dbfs_to_float_s16(-6.0206) - 16384.0).abs() < 1.0);
        assert!((db_to_ratio(20.0) - 10.0).abs() < 1e-4);
        assert!((ratio_to_db(0.1) + 20.0).abs() < 1e-4);
        assert_eq!(ratio_to_db(0.0), MIN_LEVEL_DBFS);
    }

    #[test]
    fn rms_and_peak_of_square_wave() {
        let (rms, peak) = rms_and_peak(&[100.0, -100.0, 100.0, -100.0]);
        assert!((rms - 100.0).abs() < 1e-4);
        assert_eq!(peak, 100.0);
        assert_eq!(rms_and_peak(&[]), (0.0, 0.0));
    }
}
