//! Audio processing statistics.

/// Statistics from the audio processing pipeline.
///
/// `None` means the statistic is unavailable, usually because the relevant
/// effect is disabled or no capture frame has been processed yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioProcessingStats {
    /// Echo return loss of the modelled echo path in dB.
    pub echo_return_loss: Option<f64>,
    /// Smoothed echo return loss enhancement in dB:
    /// `ERLE = 10 log10(P_capture / P_residual)`.
    pub echo_return_loss_enhancement: Option<f64>,
    /// Whether echo canceller adaptation is paused for double talk.
    pub double_talk: Option<bool>,
    /// Render-to-capture delay compensated by the echo canceller, in
    /// milliseconds.
    pub delay_ms: Option<i32>,
    /// Background noise level estimated by the noise suppressor, in dBFS.
    pub noise_level_dbfs: Option<f64>,
    /// Speech level estimated by the gain controller, in dBFS.
    pub speech_level_dbfs: Option<f64>,
    /// Digital gain applied by the gain controller in the latest frame, in
    /// dB.
    pub applied_gain_db: Option<f64>,
    /// Voice decision of the latest frame when voice detection is enabled.
    pub voice_detected: Option<bool>,
    /// Capture frames processed.
    pub capture_frames: u64,
    /// Reverse frames analyzed.
    pub reverse_frames: u64,
    /// Capture frames that reused an already-consumed reverse frame.
    pub reference_reuses: u64,
    /// Times in a row the current reverse frame has been reused.
    pub consecutive_reference_reuses: u32,
}
