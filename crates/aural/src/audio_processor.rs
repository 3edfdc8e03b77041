//! The audio processor: format negotiation, conversion and the effect chain
//! behind one frame-synchronous API.

use aural_common_audio::audio_util::{
    float_s16_to_float, float_s16_to_s16, float_to_float_s16, s16_to_float_s16,
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::effect_chain::EffectChain;
use crate::error::Error;
use crate::format_negotiator::FormatNegotiator;
use crate::frame_converter::{FrameConverter, check_len};
use crate::internal_format::{DEFAULT_REVERSE_RATE_HZ, InternalFormat, InternalFrame};
use crate::stats::AudioProcessingStats;
use crate::stream_format::{StreamFormat, StreamKind};
use crate::stream_synchronizer::StreamSynchronizer;

/// Largest render-to-capture delay accepted by
/// [`AudioProcessor::set_stream_delay_ms`].
pub const MAX_STREAM_DELAY_MS: u32 = 500;

/// Bytes per sample of the PCM16 byte API.
const BYTES_PER_SAMPLE: usize = 2;

/// Real-time processor for 10 ms frames of capture and reverse audio.
///
/// Configure the capture stream with
/// [`set_stream_format`](Self::set_stream_format) and, when echo
/// cancellation is enabled, the reverse stream with
/// [`set_reverse_stream_format`](Self::set_reverse_stream_format). Then, for
/// every 10 ms:
///
/// 1. pass the far-end frame to
///    [`analyze_reverse_stream`](Self::analyze_reverse_stream),
/// 2. pass the near-end frame to [`process_stream`](Self::process_stream).
///
/// Frames are interleaved and must hold exactly `sample_rate / 100 *
/// channels` samples. Processing allocates nothing after configuration,
/// except for the convenience method [`process`](Self::process).
///
/// # Example
///
/// ```
/// use aural::AudioProcessor;
///
/// let mut processor = AudioProcessor::new(true, true, true);
/// processor.set_stream_format(48_000, 1)?;
/// processor.set_reverse_stream_format(48_000, 2)?;
///
/// let far_end = vec![0.0f32; 960];
/// let near_end = vec![0.0f32; 480];
/// let mut output = vec![0.0f32; 480];
/// processor.analyze_reverse_stream(&far_end)?;
/// processor.process_stream(&near_end, &mut output)?;
/// # Ok::<(), aural::Error>(())
/// ```
#[derive(Debug)]
pub struct AudioProcessor {
    config: Config,
    formats: FormatNegotiator,
    capture: Option<CapturePath>,
    synchronizer: StreamSynchronizer,
    stream_delay_ms: u32,
    capture_frames: u64,
    reverse_frames: u64,
}

/// State that exists once the capture format is known.
#[derive(derive_more::Debug)]
struct CapturePath {
    converter: FrameConverter,
    chain: EffectChain,
    #[debug(skip)]
    frame: InternalFrame,
}

impl AudioProcessor {
    /// Creates a processor with the given effects enabled at their default
    /// settings.
    pub fn new(echo_cancellation: bool, noise_suppression: bool, gain_control: bool) -> Self {
        Self::with_config(Config::with_effects(
            echo_cancellation,
            noise_suppression,
            gain_control,
        ))
    }

    /// Creates a processor with an explicit configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            formats: FormatNegotiator::default(),
            capture: None,
            synchronizer: StreamSynchronizer::new(InternalFormat::for_reverse(
                DEFAULT_REVERSE_RATE_HZ,
            )),
            stream_delay_ms: 0,
            capture_frames: 0,
            reverse_frames: 0,
        }
    }

    /// Returns a builder for setting config and stream formats up front.
    pub fn builder() -> AudioProcessorBuilder {
        AudioProcessorBuilder::default()
    }

    /// The configuration the processor was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sets the capture format; the output format is the same.
    pub fn set_stream_format(&mut self, sample_rate_hz: u32, num_channels: u16) -> Result<(), Error> {
        self.set_stream_format_with_output(sample_rate_hz, num_channels, sample_rate_hz, num_channels)
    }

    /// Sets the capture input and output formats.
    ///
    /// Resets the capture-direction resampler state. The effects keep their
    /// adaptive state unless the internal processing format changes.
    pub fn set_stream_format_with_output(
        &mut self,
        sample_rate_in_hz: u32,
        num_channels_in: u16,
        sample_rate_out_hz: u32,
        num_channels_out: u16,
    ) -> Result<(), Error> {
        let (input, output) = self.formats.set_stream_format(
            sample_rate_in_hz,
            num_channels_in,
            sample_rate_out_hz,
            num_channels_out,
        )?;
        self.configure_capture(input, output);
        Ok(())
    }

    /// Sets the reverse (far-end) format. Resets the reverse resampler state
    /// and drops any pending reference frame.
    pub fn set_reverse_stream_format(&mut self, sample_rate_hz: u32, num_channels: u16) -> Result<(), Error> {
        let format = self
            .formats
            .set_reverse_stream_format(sample_rate_hz, num_channels)?;
        self.synchronizer.configure(format);
        Ok(())
    }

    /// Capture input format.
    pub fn input_format(&self) -> Option<StreamFormat> {
        self.formats.capture_in()
    }

    /// Capture output format.
    pub fn output_format(&self) -> Option<StreamFormat> {
        self.formats.capture_out()
    }

    /// Reverse input format.
    pub fn reverse_format(&self) -> Option<StreamFormat> {
        self.formats.reverse_in()
    }

    pub fn sample_rate_in(&self) -> Option<u32> {
        self.input_format().map(|f| f.sample_rate_hz())
    }

    pub fn sample_rate_out(&self) -> Option<u32> {
        self.output_format().map(|f| f.sample_rate_hz())
    }

    pub fn channel_count_in(&self) -> Option<u16> {
        self.input_format().map(|f| f.num_channels())
    }

    pub fn channel_count_out(&self) -> Option<u16> {
        self.output_format().map(|f| f.num_channels())
    }

    pub fn reverse_sample_rate_in(&self) -> Option<u32> {
        self.reverse_format().map(|f| f.sample_rate_hz())
    }

    pub fn reverse_channel_count_in(&self) -> Option<u16> {
        self.reverse_format().map(|f| f.num_channels())
    }

    /// Rate the effects run at, once the capture format is set.
    pub fn processing_sample_rate_hz(&self) -> Option<u32> {
        self.capture
            .as_ref()
            .map(|path| path.converter.internal_format().sample_rate_hz)
    }

    /// Processes one capture frame of `f32` samples in `[-1, 1]` into
    /// `output`, which must hold one frame of the output format.
    pub fn process_stream(&mut self, input: &[f32], output: &mut [f32]) -> Result<(), Error> {
        self.process_capture(input, output, float_to_float_s16, float_s16_to_float)
    }

    /// Like [`process_stream`](Self::process_stream), returning a newly
    /// allocated output frame.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>, Error> {
        let output_format = self
            .output_format()
            .ok_or(Error::NotConfigured(StreamKind::Capture))?;
        let mut output = vec![0.0; output_format.num_samples()];
        self.process_stream(input, &mut output)?;
        Ok(output)
    }

    /// Processes one capture frame of 16-bit samples.
    pub fn process_stream_i16(&mut self, input: &[i16], output: &mut [i16]) -> Result<(), Error> {
        self.process_capture(input, output, s16_to_float_s16, float_s16_to_s16)
    }

    /// Processes one capture frame of native-endian PCM16 bytes. Sizes are
    /// checked in bytes.
    pub fn process_bytes(&mut self, input: &[u8], output: &mut [u8]) -> Result<(), Error> {
        let (Some(input_format), Some(output_format)) = (self.input_format(), self.output_format())
        else {
            return Err(Error::NotConfigured(StreamKind::Capture));
        };
        check_len(input_format.num_samples() * BYTES_PER_SAMPLE, input.len())?;
        check_len(output_format.num_samples() * BYTES_PER_SAMPLE, output.len())?;
        let input: &[[u8; BYTES_PER_SAMPLE]] = bytemuck::cast_slice(input);
        let output: &mut [[u8; BYTES_PER_SAMPLE]] = bytemuck::cast_slice_mut(output);
        self.process_capture(
            input,
            output,
            |bytes| s16_to_float_s16(i16::from_ne_bytes(bytes)),
            |v| float_s16_to_s16(v).to_ne_bytes(),
        )
    }

    /// Submits one reverse frame of `f32` samples in `[-1, 1]` as the echo
    /// reference for the next capture frame.
    pub fn analyze_reverse_stream(&mut self, frame: &[f32]) -> Result<(), Error> {
        self.analyze_reverse(frame, float_to_float_s16)
    }

    /// Submits one reverse frame of 16-bit samples.
    pub fn analyze_reverse_stream_i16(&mut self, frame: &[i16]) -> Result<(), Error> {
        self.analyze_reverse(frame, s16_to_float_s16)
    }

    /// Submits one reverse frame of native-endian PCM16 bytes. The size is
    /// checked in bytes.
    pub fn analyze_reverse_bytes(&mut self, frame: &[u8]) -> Result<(), Error> {
        let format = self
            .synchronizer
            .format()
            .ok_or(Error::NotConfigured(StreamKind::Reverse))?;
        check_len(format.num_samples() * BYTES_PER_SAMPLE, frame.len())?;
        let frame: &[[u8; BYTES_PER_SAMPLE]] = bytemuck::cast_slice(frame);
        self.analyze_reverse(frame, |bytes| s16_to_float_s16(i16::from_ne_bytes(bytes)))
    }

    /// Sets the delay between a reverse frame being analyzed and its echo
    /// reaching the capture stream.
    ///
    /// Values outside `0..=500` are clamped and reported as
    /// [`Error::BadStreamParameter`]; the clamped value is still applied.
    pub fn set_stream_delay_ms(&mut self, delay_ms: i32) -> Result<(), Error> {
        let applied = delay_ms.clamp(0, MAX_STREAM_DELAY_MS as i32);
        self.stream_delay_ms = applied as u32;
        self.apply_stream_delay();
        if applied != delay_ms {
            warn!(requested = delay_ms, applied, "stream delay clamped");
            return Err(Error::BadStreamParameter);
        }
        Ok(())
    }

    /// Current render-to-capture delay in milliseconds.
    pub fn stream_delay_ms(&self) -> u32 {
        self.stream_delay_ms
    }

    /// Whether the latest processed capture frame contained voice. Always
    /// `false` when voice detection is disabled.
    pub fn has_voice(&self) -> bool {
        self.capture
            .as_ref()
            .is_some_and(|path| path.chain.has_voice())
    }

    /// Snapshot of the processing statistics.
    pub fn statistics(&self) -> AudioProcessingStats {
        let mut stats = AudioProcessingStats {
            capture_frames: self.capture_frames,
            reverse_frames: self.reverse_frames,
            reference_reuses: self.synchronizer.total_reuses(),
            consecutive_reference_reuses: self.synchronizer.consecutive_reuses(),
            ..Default::default()
        };
        let Some(path) = &self.capture else {
            return stats;
        };
        let rate = u64::from(path.chain.format().sample_rate_hz);
        if let Some(metrics) = path.chain.echo_metrics() {
            stats.echo_return_loss = Some(f64::from(metrics.echo_return_loss_db));
            stats.echo_return_loss_enhancement = Some(f64::from(metrics.erle_db));
            stats.double_talk = Some(metrics.double_talk);
            stats.delay_ms = Some((metrics.delay_samples as u64 * 1000 / rate) as i32);
        }
        stats.noise_level_dbfs = path.chain.noise_level_dbfs().map(f64::from);
        if let Some(gain) = path.chain.gain_output() {
            stats.speech_level_dbfs = Some(f64::from(gain.speech_level_dbfs));
            stats.applied_gain_db = Some(f64::from(gain.applied_gain_db));
        }
        if path.chain.voice_detection_enabled() && self.capture_frames > 0 {
            stats.voice_detected = Some(path.chain.has_voice());
        }
        stats
    }

    fn configure_capture(&mut self, input: StreamFormat, output: StreamFormat) {
        let internal = InternalFormat::for_capture(input, output, &self.config.pipeline);
        let converter = FrameConverter::new(
            input,
            output,
            internal,
            self.config.pipeline.capture_downmix_method,
        );
        match self.capture.take() {
            Some(mut path) if path.chain.format() == internal => {
                path.converter = converter;
                self.capture = Some(path);
            }
            _ => {
                debug!(
                    sample_rate_hz = internal.sample_rate_hz,
                    num_channels = internal.num_channels,
                    "capture processing format changed"
                );
                self.capture = Some(CapturePath {
                    converter,
                    chain: EffectChain::new(&self.config, internal),
                    frame: internal.new_frame(),
                });
                self.synchronizer
                    .set_internal_format(InternalFormat::for_reverse(internal.sample_rate_hz));
                self.apply_stream_delay();
            }
        }
    }

    fn apply_stream_delay(&mut self) {
        let Some(path) = self.capture.as_mut() else {
            return;
        };
        let rate = path.chain.format().sample_rate_hz as usize;
        let samples = self.stream_delay_ms as usize * rate / 1000;
        path.chain.set_delay_samples(samples);
    }

    fn process_capture<S: Copy, D>(
        &mut self,
        input: &[S],
        output: &mut [D],
        to_float_s16: impl Fn(S) -> f32,
        from_float_s16: impl Fn(f32) -> D,
    ) -> Result<(), Error> {
        let path = self
            .capture
            .as_mut()
            .ok_or(Error::NotConfigured(StreamKind::Capture))?;
        check_len(path.converter.input_format().num_samples(), input.len())?;
        check_len(path.converter.output_format().num_samples(), output.len())?;
        let needs_reference = path.chain.needs_reference();
        if needs_reference && !self.synchronizer.is_configured() {
            return Err(Error::MissingReverseFormat);
        }

        path.converter.to_internal(input, to_float_s16, &mut path.frame)?;
        let reference: &[f32] = if needs_reference {
            self.synchronizer.consume_reference()
        } else {
            &[]
        };
        path.chain.apply(&mut path.frame, reference);
        path.converter.from_internal(&path.frame, output, from_float_s16)?;
        self.capture_frames += 1;
        Ok(())
    }

    fn analyze_reverse<S: Copy>(&mut self, frame: &[S], convert: impl Fn(S) -> f32) -> Result<(), Error> {
        self.synchronizer.submit_reverse(frame, convert)?;
        self.reverse_frames += 1;
        Ok(())
    }
}

/// Builder for [`AudioProcessor`].
///
/// ```
/// use aural::{AudioProcessor, Config, StreamFormat};
/// use aural::config::NoiseSuppression;
///
/// let processor = AudioProcessor::builder()
///     .config(Config {
///         noise_suppression: Some(NoiseSuppression::default()),
///         ..Default::default()
///     })
///     .stream_format(StreamFormat::new(16_000, 1)?)
///     .build();
/// assert_eq!(processor.processing_sample_rate_hz(), Some(16_000));
/// # Ok::<(), aural::StreamFormatError>(())
/// ```
#[derive(Debug, Default)]
pub struct AudioProcessorBuilder {
    config: Config,
    stream_format: Option<StreamFormat>,
    output_format: Option<StreamFormat>,
    reverse_format: Option<StreamFormat>,
}

impl AudioProcessorBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Capture input format, also used for the output unless
    /// [`output_format`](Self::output_format) is set.
    pub fn stream_format(mut self, format: StreamFormat) -> Self {
        self.stream_format = Some(format);
        self
    }

    /// Capture output format. Ignored without a
    /// [`stream_format`](Self::stream_format).
    pub fn output_format(mut self, format: StreamFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn reverse_stream_format(mut self, format: StreamFormat) -> Self {
        self.reverse_format = Some(format);
        self
    }

    pub fn build(self) -> AudioProcessor {
        let mut processor = AudioProcessor::with_config(self.config);
        if let Some(input) = self.stream_format {
            let output = self.output_format.unwrap_or(input);
            processor.formats.store_capture(input, output);
            processor.configure_capture(input, output);
        }
        if let Some(format) = self.reverse_format {
            processor.formats.store_reverse(format);
            processor.synchronizer.configure(format);
        }
        processor
    }
}
