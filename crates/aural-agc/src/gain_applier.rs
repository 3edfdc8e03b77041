//! Applies a digital gain, interpolating from the previous frame's gain.

use aural_common_audio::channel_buffer::ChannelBuffer;

use crate::common::db_to_ratio;

#[derive(Debug)]
pub struct GainApplier {
    current_gain_factor: f32,
}

impl GainApplier {
    pub fn new(initial_gain_db: f32) -> Self {
        Self {
            current_gain_factor: db_to_ratio(initial_gain_db),
        }
    }

    /// Linear gain reached at the end of the last frame.
    pub fn gain_factor(&self) -> f32 {
        self.current_gain_factor
    }

    /// Ramps the gain linearly across `frame` from the previous gain to
    /// `gain_db`.
    pub fn apply(&mut self, frame: &mut ChannelBuffer<f32>, gain_db: f32) {
        let target = db_to_ratio(gain_db);
        let num_frames = frame.num_frames();
        if num_frames == 0 {
            self.current_gain_factor = target;
            return;
        }
        if target == self.current_gain_factor {
            if target != 1.0 {
                frame.as_mut_slice().iter_mut().for_each(|v| *v *= target);
            }
            return;
        }

        let step = (target - self.current_gain_factor) / num_frames as f32;
        for ch in 0..frame.num_channels() {
            for (i, v) in frame.channel_mut(ch).iter_mut().enumerate() {
                *v *= self.current_gain_factor + step * (i + 1) as f32;
            }
        }
        self.current_gain_factor = target;
    }
}
