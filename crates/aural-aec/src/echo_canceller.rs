//! Echo canceller: one NLMS filter per capture channel over a shared mono
//! render history.

use aural_common_audio::channel_buffer::ChannelBuffer;

use crate::adaptive_filter::{NlmsFilter, dot};
use crate::config::EchoCancellerConfig;
use crate::metrics::{DbMetric, EchoCancellerMetrics, power_ratio_db};
use crate::render_history::RenderHistory;

/// Full-scale float-S16 power used as the 0 dBFS reference.
const FULL_SCALE_POWER: f32 = 32768.0 * 32768.0;
/// Smoothing factor of the reported ERLE.
const ERLE_SMOOTHING: f32 = 0.1;

/// Removes the linear echo of a render reference from capture frames.
///
/// Operates on 10 ms frames at a fixed sample rate in float-S16 scale.
#[derive(derive_more::Debug)]
pub struct EchoCanceller {
    config: EchoCancellerConfig,
    sample_rate_hz: u32,
    frame_len: usize,
    history: RenderHistory,
    filters: Vec<NlmsFilter>,
    #[debug(skip)]
    residual: Vec<f32>,
    delay: usize,
    hangover: u32,
    double_talk: bool,
    render_silence_power: f32,
    erle: DbMetric,
    adapted_frames: u64,
    processed_frames: u64,
}

impl EchoCanceller {
    /// Creates an echo canceller for `num_channels` capture channels at
    /// `sample_rate_hz`. Out-of-range parameters in `config` are clamped.
    pub fn new(mut config: EchoCancellerConfig, sample_rate_hz: u32, num_channels: usize) -> Self {
        if !config.validate() {
            tracing::warn!(?config, "echo canceller config clamped to valid ranges");
        }
        let frame_len = (sample_rate_hz / 100) as usize;
        let filter_len = config.filter_length_samples(sample_rate_hz);
        let max_delay = config.max_delay_samples(sample_rate_hz);
        let filters = (0..num_channels)
            .map(|_| NlmsFilter::new(filter_len, config.step_size, config.regularization))
            .collect::<Vec<_>>();
        let render_silence_power = FULL_SCALE_POWER * 10f32.powf(config.render_silence_dbfs / 10.0);

        tracing::debug!(
            sample_rate_hz,
            num_channels,
            filter_taps = filters.first().map_or(filter_len, NlmsFilter::len),
            max_delay_samples = max_delay,
            "echo canceller initialized"
        );

        Self {
            history: RenderHistory::new(frame_len, filter_len, max_delay),
            filters,
            residual: vec![0.0; frame_len],
            sample_rate_hz,
            frame_len,
            delay: 0,
            hangover: 0,
            double_talk: false,
            render_silence_power,
            erle: DbMetric::default(),
            adapted_frames: 0,
            processed_frames: 0,
            config,
        }
    }

    /// Sample rate the canceller was created for.
    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Number of capture channels.
    pub fn num_channels(&self) -> usize {
        self.filters.len()
    }

    /// Active configuration, after clamping.
    pub fn config(&self) -> &EchoCancellerConfig {
        &self.config
    }

    /// Sets the render-to-capture delay to compensate. Values beyond the
    /// configured maximum are clamped; returns the applied delay.
    pub fn set_delay_samples(&mut self, delay: usize) -> usize {
        let applied = delay.min(self.history.max_delay());
        if applied != self.delay {
            tracing::debug!(requested = delay, applied, "echo canceller delay changed");
        }
        self.delay = applied;
        applied
    }

    /// Currently compensated delay in samples.
    pub fn delay_samples(&self) -> usize {
        self.delay
    }

    /// Removes echo of `reference` from every channel of `capture`.
    ///
    /// `reference` is the mono render frame matching `capture` in time; it is
    /// zero-padded or truncated to the frame length.
    ///
    /// # Panics
    ///
    /// Panics if `capture` does not hold one 10 ms frame per configured
    /// channel.
    pub fn process(&mut self, capture: &mut ChannelBuffer<f32>, reference: &[f32]) {
        assert_eq!(capture.num_channels(), self.filters.len());
        assert_eq!(capture.num_frames(), self.frame_len);
        self.processed_frames += 1;
        if self.frame_len == 0 {
            return;
        }

        self.history.push(reference);
        let span = self.history.span(self.delay);
        let render_peak = span.iter().fold(0.0f32, |m, &v| m.max(v.abs()));
        let render_power = dot(span, span) / span.len() as f32;
        let render_active = render_power > self.render_silence_power;

        let capture_peak = capture
            .as_slice()
            .iter()
            .fold(0.0f32, |m, &v| m.max(v.abs()));
        let double_talk_now =
            render_active && capture_peak > self.config.double_talk_threshold * render_peak;
        if double_talk_now {
            if !self.double_talk {
                tracing::trace!(capture_peak, render_peak, "double talk detected");
            }
            self.hangover = self.config.double_talk_hangover_frames;
        } else {
            self.hangover = self.hangover.saturating_sub(1);
        }
        self.double_talk = double_talk_now || self.hangover > 0;
        let adapt = render_active && !self.double_talk;

        let mut total_capture_power = 0.0f32;
        let mut total_residual_power = 0.0f32;
        for (ch, filter) in self.filters.iter_mut().enumerate() {
            let channel = capture.channel_mut(ch);
            let first = self.history.window(0, self.delay);
            let mut window_power = dot(first, first);
            let mut dropped = first[0];
            let mut capture_power = 0.0f32;
            let mut residual_power = 0.0f32;

            for (i, (&y, e)) in channel.iter().zip(self.residual.iter_mut()).enumerate() {
                let window = self.history.window(i, self.delay);
                if i > 0 {
                    let newest = window[window.len() - 1];
                    window_power = (window_power + newest * newest - dropped * dropped).max(0.0);
                    dropped = window[0];
                }
                *e = y - filter.estimate(window);
                if adapt {
                    filter.adapt(window, window_power, *e);
                }
                capture_power += y * y;
                residual_power += *e * *e;
            }

            // A diverged filter must never add energy to the capture signal.
            if residual_power <= capture_power {
                channel.copy_from_slice(&self.residual);
            } else {
                residual_power = capture_power;
            }
            total_capture_power += capture_power;
            total_residual_power += residual_power;
        }

        if adapt {
            self.adapted_frames += 1;
        }
        if render_active {
            let instant = power_ratio_db(total_capture_power, total_residual_power);
            self.erle.update_smoothed(instant, ERLE_SMOOTHING);
        }
    }

    /// Current quality metrics.
    pub fn metrics(&self) -> EchoCancellerMetrics {
        let (erle_min_db, erle_max_db) = if self.erle.floor_value <= self.erle.ceil_value {
            (self.erle.floor_value, self.erle.ceil_value)
        } else {
            (0.0, 0.0)
        };
        let echo_return_loss_db = if self.filters.is_empty() {
            0.0
        } else {
            self.filters
                .iter()
                .map(|f| -10.0 * f.energy().max(1e-10).log10())
                .sum::<f32>()
                / self.filters.len() as f32
        };
        EchoCancellerMetrics {
            erle_db: self.erle.value,
            erle_min_db,
            erle_max_db,
            echo_return_loss_db,
            double_talk: self.double_talk,
            adapted_frames: self.adapted_frames,
            processed_frames: self.processed_frames,
            delay_samples: self.delay,
        }
    }

    /// Forgets the echo path and the render history. The delay is kept.
    pub fn reset(&mut self) {
        self.history.clear();
        self.filters.iter_mut().for_each(NlmsFilter::reset);
        self.hangover = 0;
        self.double_talk = false;
        self.erle = DbMetric::default();
        self.adapted_frames = 0;
        self.processed_frames = 0;
    }
}
