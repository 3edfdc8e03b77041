//! Real-time audio stream processing.
//!
//! [`AudioProcessor`] accepts 10 ms frames of near-end (capture) and far-end
//! (reverse) audio in any sample rate and channel layout, converts them to a
//! fixed internal format, runs the enabled effects (echo cancellation, noise
//! suppression, gain control) and converts the result to the requested
//! output format.
//!
//! # Quick Start
//!
//! ```
//! use aural::{AudioProcessor, Config};
//! use aural::config::{EchoCanceller, NoiseSuppression};
//!
//! let config = Config {
//!     echo_canceller: Some(EchoCanceller::default()),
//!     noise_suppression: Some(NoiseSuppression::default()),
//!     ..Default::default()
//! };
//! let mut processor = AudioProcessor::with_config(config);
//! processor.set_stream_format(16_000, 1)?;
//! processor.set_reverse_stream_format(16_000, 1)?;
//!
//! // For each 10 ms frame:
//! let render = vec![0.0f32; 160];
//! let capture = vec![0.0f32; 160];
//! processor.analyze_reverse_stream(&render)?;
//! let output = processor.process(&capture)?;
//! assert_eq!(output.len(), 160);
//! # Ok::<(), aural::Error>(())
//! ```

mod audio_processor;
pub mod config;
mod effect_chain;
mod error;
mod format_negotiator;
mod frame_converter;
mod internal_format;
pub mod stats;
mod stream_format;
mod stream_synchronizer;

pub use audio_processor::{AudioProcessor, AudioProcessorBuilder, MAX_STREAM_DELAY_MS};
pub use config::Config;
pub use error::Error;
pub use stats::AudioProcessingStats;
pub use stream_format::{MAX_SAMPLE_RATE_HZ, StreamFormat, StreamFormatError, StreamKind};
