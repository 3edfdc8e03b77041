//! Echo canceller quality metrics: ERL, ERLE and double-talk state.

/// Snapshot of the echo canceller's state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EchoCancellerMetrics {
    /// Smoothed echo return loss enhancement in dB,
    /// `10 log10(P_capture / P_residual)`, averaged over frames with an
    /// active render signal.
    pub erle_db: f32,
    /// Lowest per-frame ERLE since the last reset.
    pub erle_min_db: f32,
    /// Highest per-frame ERLE since the last reset.
    pub erle_max_db: f32,
    /// Echo return loss of the modelled path in dB,
    /// `-10 log10(sum of squared coefficients)`, averaged over channels.
    pub echo_return_loss_db: f32,
    /// Whether adaptation is currently paused for double talk.
    pub double_talk: bool,
    /// Frames during which at least one filter adapted.
    pub adapted_frames: u64,
    /// Frames processed since the last reset.
    pub processed_frames: u64,
    /// Render-to-capture delay currently compensated, in samples.
    pub delay_samples: usize,
}

/// A value in dB together with its running floor and ceiling.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DbMetric {
    pub(crate) value: f32,
    pub(crate) floor_value: f32,
    pub(crate) ceil_value: f32,
}

impl DbMetric {
    pub(crate) fn new(value: f32, floor_value: f32, ceil_value: f32) -> Self {
        Self {
            value,
            floor_value,
            ceil_value,
        }
    }

    /// Moves the smoothed value towards `instant` and widens the bounds.
    pub(crate) fn update_smoothed(&mut self, instant: f32, alpha: f32) {
        self.value += alpha * (instant - self.value);
        self.floor_value = self.floor_value.min(instant);
        self.ceil_value = self.ceil_value.max(instant);
    }
}

impl Default for DbMetric {
    fn default() -> Self {
        // Floor starts high and ceiling low so the first update sets both.
        Self::new(0.0, f32::MAX, f32::MIN)
    }
}

/// Power ratio in dB with a small floor on both terms.
pub(crate) fn power_ratio_db(numerator: f32, denominator: f32) -> f32 {
    const FLOOR: f32 = 1e-3;
    10.0 * ((numerator + FLOOR) / (denominator + FLOOR)).log10()
}
