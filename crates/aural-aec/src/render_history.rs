//! Linear history of the render reference.
//!
//! Layout: the newest frame occupies the last `frame_len` samples. Older
//! samples sit in front of it, enough to cover the maximum delay plus the
//! filter length.

/// Sliding window over past render samples.
#[derive(derive_more::Debug)]
pub(crate) struct RenderHistory {
    #[debug(skip)]
    buffer: Vec<f32>,
    frame_len: usize,
    filter_len: usize,
    max_delay: usize,
}

impl RenderHistory {
    pub(crate) fn new(frame_len: usize, filter_len: usize, max_delay: usize) -> Self {
        Self {
            buffer: vec![0.0; max_delay + filter_len + frame_len],
            frame_len,
            filter_len,
            max_delay,
        }
    }

    pub(crate) fn max_delay(&self) -> usize {
        self.max_delay
    }

    /// Appends one frame, discarding the oldest samples.
    ///
    /// Short frames are zero-padded; long frames are truncated.
    pub(crate) fn push(&mut self, frame: &[f32]) {
        let len = self.buffer.len();
        self.buffer.copy_within(self.frame_len.., 0);
        let tail = &mut self.buffer[len - self.frame_len..];
        let n = frame.len().min(self.frame_len);
        tail[..n].copy_from_slice(&frame[..n]);
        tail[n..].fill(0.0);
    }

    /// The `filter_len` render samples aligned with capture sample `i` of the
    /// newest frame, oldest first, for a render-to-capture `delay`.
    #[inline]
    pub(crate) fn window(&self, i: usize, delay: usize) -> &[f32] {
        debug_assert!(i < self.frame_len);
        debug_assert!(delay <= self.max_delay);
        let newest = self.buffer.len() - self.frame_len + i - delay;
        &self.buffer[newest + 1 - self.filter_len..=newest]
    }

    /// Every sample touched by the windows of the newest frame.
    pub(crate) fn span(&self, delay: usize) -> &[f32] {
        let end = self.buffer.len() - delay;
        &self.buffer[end - self.frame_len - self.filter_len + 1..end]
    }

    pub(crate) fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}
