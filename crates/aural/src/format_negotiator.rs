//! Validation and storage of the stream formats.

use tracing::debug;

use crate::error::Error;
use crate::stream_format::StreamFormat;

/// Formats of the capture input, capture output and reverse input streams.
#[derive(Debug, Default)]
pub(crate) struct FormatNegotiator {
    capture_in: Option<StreamFormat>,
    capture_out: Option<StreamFormat>,
    reverse_in: Option<StreamFormat>,
}

impl FormatNegotiator {
    /// Validates and stores the capture formats. Either both are replaced or
    /// neither is.
    pub(crate) fn set_stream_format(
        &mut self,
        rate_in: u32,
        channels_in: u16,
        rate_out: u32,
        channels_out: u16,
    ) -> Result<(StreamFormat, StreamFormat), Error> {
        let input = StreamFormat::new(rate_in, channels_in)?;
        let output = StreamFormat::new(rate_out, channels_out)?;
        self.store_capture(input, output);
        Ok((input, output))
    }

    /// Stores already validated capture formats.
    pub(crate) fn store_capture(&mut self, input: StreamFormat, output: StreamFormat) {
        debug!(%input, %output, "capture stream format set");
        self.capture_in = Some(input);
        self.capture_out = Some(output);
    }

    /// Validates and stores the reverse format.
    pub(crate) fn set_reverse_stream_format(
        &mut self,
        rate: u32,
        channels: u16,
    ) -> Result<StreamFormat, Error> {
        let format = StreamFormat::new(rate, channels)?;
        self.store_reverse(format);
        Ok(format)
    }

    pub(crate) fn store_reverse(&mut self, format: StreamFormat) {
        debug!(%format, "reverse stream format set");
        self.reverse_in = Some(format);
    }

    pub(crate) fn capture_in(&self) -> Option<StreamFormat> {
        self.capture_in
    }

    pub(crate) fn capture_out(&self) -> Option<StreamFormat> {
        self.capture_out
    }

    pub(crate) fn reverse_in(&self) -> Option<StreamFormat> {
        self.reverse_in
    }
}
