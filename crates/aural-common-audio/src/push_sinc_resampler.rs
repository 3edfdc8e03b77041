//! Push-style wrapper around [`SincResampler`] for fixed-size blocks.
//!
//! Every call consumes exactly `source_frames` samples and produces exactly
//! `destination_frames` samples, with a constant delay. Blocks larger than
//! the kernel are handed to the resampler directly; smaller ones are queued
//! until a full request is available.

use std::collections::VecDeque;

use crate::sinc_resampler::{KERNEL_SIZE, SincResampler, SincResamplerCallback};

/// Resamples one channel from blocks of `source_frames` to blocks of
/// `destination_frames`.
#[derive(derive_more::Debug)]
pub struct PushSincResampler {
    resampler: SincResampler,
    source_frames: usize,
    destination_frames: usize,
    first_pass: bool,
    /// Queued input for blocks too small to fill one request.
    #[debug(skip)]
    queue: Option<VecDeque<f32>>,
}

/// Feeds the cached source block to the resampler on its single request.
struct BlockFeed<'a> {
    source: Option<&'a [f32]>,
    first_pass: &'a mut bool,
}

impl SincResamplerCallback for BlockFeed<'_> {
    fn run(&mut self, frames: usize, destination: &mut [f32]) {
        // The priming pass gets silence; its output is discarded.
        if *self.first_pass {
            destination[..frames].fill(0.0);
            *self.first_pass = false;
            return;
        }
        match self.source.take() {
            Some(source) => {
                debug_assert_eq!(source.len(), frames);
                destination[..frames].copy_from_slice(&source[..frames]);
            }
            None => {
                debug_assert!(false, "more than one input request per block");
                destination[..frames].fill(0.0);
            }
        }
    }
}

/// Serves requests from the input queue. An empty queue yields silence.
struct QueueFeed<'a> {
    queue: &'a mut VecDeque<f32>,
}

impl SincResamplerCallback for QueueFeed<'_> {
    fn run(&mut self, frames: usize, destination: &mut [f32]) {
        for sample in &mut destination[..frames] {
            *sample = self.queue.pop_front().unwrap_or(0.0);
        }
    }
}

/// Request size used when `source_frames` does not exceed the kernel: the
/// smallest multiple of the block that does.
fn queued_request_frames(source_frames: usize) -> usize {
    (KERNEL_SIZE / source_frames + 1) * source_frames
}

/// Silence queued ahead of the first block so that requests never outrun
/// the pushed input.
fn queue_prefill(request_frames: usize) -> usize {
    2 * request_frames + KERNEL_SIZE
}

impl PushSincResampler {
    /// Creates a resampler converting `source_frames` per block into
    /// `destination_frames` per block.
    ///
    /// # Panics
    ///
    /// Panics if either block size is zero.
    pub fn new(source_frames: usize, destination_frames: usize) -> Self {
        assert!(source_frames > 0 && destination_frames > 0, "empty blocks");
        let queued = source_frames <= KERNEL_SIZE;
        let request_frames = if queued {
            queued_request_frames(source_frames)
        } else {
            source_frames
        };
        let queue = queued.then(|| {
            let prefill = queue_prefill(request_frames);
            let mut queue = VecDeque::with_capacity(prefill + 2 * request_frames + source_frames);
            queue.resize(prefill, 0.0);
            queue
        });
        Self {
            resampler: SincResampler::new(
                source_frames as f64 / destination_frames as f64,
                request_frames,
            ),
            source_frames,
            destination_frames,
            first_pass: true,
            queue,
        }
    }

    /// Input block size.
    pub fn source_frames(&self) -> usize {
        self.source_frames
    }

    /// Output block size.
    pub fn destination_frames(&self) -> usize {
        self.destination_frames
    }

    /// Resamples one block. Returns the number of samples written, which is
    /// always `destination_frames`.
    ///
    /// # Panics
    ///
    /// Panics if `source` or `destination` do not have the configured sizes.
    pub fn resample(&mut self, source: &[f32], destination: &mut [f32]) -> usize {
        assert_eq!(source.len(), self.source_frames);
        assert!(destination.len() >= self.destination_frames);

        if self.source_frames == self.destination_frames {
            destination[..self.source_frames].copy_from_slice(source);
            return self.destination_frames;
        }

        if let Some(queue) = self.queue.as_mut() {
            queue.extend(source.iter().copied());
            let mut feed = QueueFeed { queue };
            self.resampler
                .resample(self.destination_frames, destination, &mut feed);
            return self.destination_frames;
        }

        let mut feed = BlockFeed {
            source: Some(source),
            first_pass: &mut self.first_pass,
        };

        // Priming with a dummy block sets the delay to half the kernel and
        // leaves exactly one input request per later call.
        if *feed.first_pass {
            let chunk = self.resampler.chunk_size();
            self.resampler.resample(chunk, destination, &mut feed);
        }

        self.resampler
            .resample(self.destination_frames, destination, &mut feed);
        self.destination_frames
    }

    /// Drops all history; the next block is primed again.
    pub fn reset(&mut self) {
        self.resampler.flush();
        self.first_pass = true;
        if let Some(queue) = self.queue.as_mut() {
            queue.clear();
            queue.resize(queue_prefill(self.resampler.request_frames()), 0.0);
        }
    }
}
