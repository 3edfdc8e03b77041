//! Single-slot buffer pairing reverse frames with capture frames.

use aural_common_audio::channel_mixer::DownmixMethod;
use tracing::{debug, trace};

use crate::error::Error;
use crate::frame_converter::FrameConverter;
use crate::internal_format::{InternalFormat, InternalFrame};
use crate::stream_format::{StreamFormat, StreamKind};

/// Holds the most recent reverse frame, converted to the internal reference
/// format, until the next capture frame reads it.
#[derive(derive_more::Debug)]
pub(crate) struct StreamSynchronizer {
    internal: InternalFormat,
    converter: Option<FrameConverter>,
    #[debug(skip)]
    reference: InternalFrame,
    has_reference: bool,
    consumed: bool,
    consecutive_reuses: u32,
    total_reuses: u64,
}

impl StreamSynchronizer {
    pub(crate) fn new(internal: InternalFormat) -> Self {
        Self {
            internal,
            converter: None,
            reference: internal.new_frame(),
            has_reference: false,
            consumed: false,
            consecutive_reuses: 0,
            total_reuses: 0,
        }
    }

    /// Sets the reverse input format. Resets the converter and clears the
    /// pending reference.
    pub(crate) fn configure(&mut self, format: StreamFormat) {
        self.converter = Some(FrameConverter::new(
            format,
            format,
            self.internal,
            DownmixMethod::AverageChannels,
        ));
        self.clear();
    }

    /// Changes the internal reference format, rebuilding the converter for
    /// the current reverse format.
    pub(crate) fn set_internal_format(&mut self, internal: InternalFormat) {
        if internal == self.internal {
            return;
        }
        debug!(
            sample_rate_hz = internal.sample_rate_hz,
            "reverse processing rate changed"
        );
        self.internal = internal;
        self.reference = internal.new_frame();
        if let Some(format) = self.converter.as_ref().map(FrameConverter::input_format) {
            self.configure(format);
        } else {
            self.clear();
        }
    }

    pub(crate) fn is_configured(&self) -> bool {
        self.converter.is_some()
    }

    pub(crate) fn format(&self) -> Option<StreamFormat> {
        self.converter.as_ref().map(FrameConverter::input_format)
    }

    /// Converts `frame` and stores it as the reference, replacing any
    /// previous one.
    pub(crate) fn submit_reverse<S: Copy>(
        &mut self,
        frame: &[S],
        convert: impl Fn(S) -> f32,
    ) -> Result<(), Error> {
        let converter = self
            .converter
            .as_mut()
            .ok_or(Error::NotConfigured(StreamKind::Reverse))?;
        converter.to_internal(frame, convert, &mut self.reference)?;
        self.has_reference = true;
        self.consumed = false;
        self.consecutive_reuses = 0;
        Ok(())
    }

    /// The current reference channel, or silence if nothing was submitted
    /// since the last reset. The reference stays in place for later calls.
    pub(crate) fn consume_reference(&mut self) -> &[f32] {
        if self.has_reference {
            if self.consumed {
                self.consecutive_reuses += 1;
                self.total_reuses += 1;
                trace!(
                    consecutive_reuses = self.consecutive_reuses,
                    "reusing stale reverse frame"
                );
            }
            self.consumed = true;
        }
        self.reference.channel(0)
    }

    /// Times in a row the current reference has been read again.
    pub(crate) fn consecutive_reuses(&self) -> u32 {
        self.consecutive_reuses
    }

    /// Stale reads since creation.
    pub(crate) fn total_reuses(&self) -> u64 {
        self.total_reuses
    }

    fn clear(&mut self) {
        self.reference.fill(0.0);
        self.has_reference = false;
        self.consumed = false;
        self.consecutive_reuses = 0;
        if let Some(converter) = self.converter.as_mut() {
            converter.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use aural_common_audio::audio_util::float_to_float_s16;

    use super::*;

    fn synchronizer() -> StreamSynchronizer {
        let mut sync = StreamSynchronizer::new(InternalFormat::for_reverse(16_000));
        sync.configure(StreamFormat::new(16_000, 1).unwrap());
        sync
    }

    #[test]
    fn unconfigured_submit_fails() {
        let mut sync = StreamSynchronizer::new(InternalFormat::for_reverse(16_000));
        assert_eq!(
            sync.submit_reverse(&[0.0f32; 160], float_to_float_s16),
            Err(Error::NotConfigured(StreamKind::Reverse))
        );
        assert!(!sync.is_configured());
    }

    #[test]
    fn silence_before_first_submission() {
        let mut sync = synchronizer();
        let reference = sync.consume_reference();
        assert_eq!(reference.len(), 160);
        assert!(reference.iter().all(|&v| v == 0.0));
        assert_eq!(sync.consecutive_reuses(), 0);
    }

    #[test]
    fn latest_submission_wins() {
        let mut sync = synchronizer();
        sync.submit_reverse(&[0.25f32; 160], float_to_float_s16).unwrap();
        sync.submit_reverse(&[0.5f32; 160], float_to_float_s16).unwrap();
        let expected = float_to_float_s16(0.5);
        assert!(sync.consume_reference().iter().all(|&v| v == expected));
    }

    #[test]
    fn counts_reuses() {
        let mut sync = synchronizer();
        sync.submit_reverse(&[0.5f32; 160], float_to_float_s16).unwrap();
        sync.consume_reference();
        assert_eq!(sync.consecutive_reuses(), 0);
        sync.consume_reference();
        sync.consume_reference();
        assert_eq!(sync.consecutive_reuses(), 2);
        sync.submit_reverse(&[0.5f32; 160], float_to_float_s16).unwrap();
        sync.consume_reference();
        assert_eq!(sync.consecutive_reuses(), 0);
        assert_eq!(sync.total_reuses(), 2);
    }

    #[test]
    fn reconfiguration_clears_reference() {
        let mut sync = synchronizer();
        sync.submit_reverse(&[0.5f32; 160], float_to_float_s16).unwrap();
        sync.configure(StreamFormat::new(48_000, 2).unwrap());
        assert!(sync.consume_reference().iter().all(|&v| v == 0.0));
        assert_eq!(sync.format().unwrap().sample_rate_hz(), 48_000);

        sync.submit_reverse(&[0.5f32; 960], float_to_float_s16).unwrap();
        sync.set_internal_format(InternalFormat::for_reverse(32_000));
        let reference = sync.consume_reference();
        assert_eq!(reference.len(), 320);
        assert!(reference.iter().all(|&v| v == 0.0));
    }
}
