//! Normalized least-mean-squares FIR filter.

/// FIR model of one echo path.
///
/// Coefficients are stored oldest-tap first so that the estimate is a plain
/// dot product with a render window in the same order.
#[derive(derive_more::Debug)]
pub(crate) struct NlmsFilter {
    #[debug("{} taps", weights.len())]
    weights: Vec<f32>,
    step_size: f32,
    regularization: f32,
}

impl NlmsFilter {
    pub(crate) fn new(len: usize, step_size: f32, regularization_per_tap: f32) -> Self {
        Self {
            weights: vec![0.0; len],
            step_size,
            regularization: regularization_per_tap * len as f32,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.weights.len()
    }

    /// Predicted echo for one capture sample.
    #[inline]
    pub(crate) fn estimate(&self, window: &[f32]) -> f32 {
        dot(&self.weights, window)
    }

    /// One NLMS step towards reducing `error`, where `window_power` is the
    /// energy of `window`.
    #[inline]
    pub(crate) fn adapt(&mut self, window: &[f32], window_power: f32, error: f32) {
        let mu = self.step_size * error / (window_power + self.regularization);
        for (w, &x) in self.weights.iter_mut().zip(window) {
            *w += mu * x;
        }
    }

    /// Sum of squared coefficients; the linear echo path gain.
    pub(crate) fn energy(&self) -> f32 {
        dot(&self.weights, &self.weights)
    }

    pub(crate) fn reset(&mut self) {
        self.weights.fill(0.0);
    }
}

#[inline]
pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(&x, &y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_product() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, -5.0, 6.0]), 12.0);
        assert_eq!(dot(&[], &[]), 0.0);
    }

    #[test]
    fn identifies_a_single_tap_path() {
        // Echo path: 0.5 * x[n - 2] with a 4-tap filter.
        let mut filter = NlmsFilter::new(4, 0.5, 0.0);
        let mut seed = 12345u32;
        let mut signal = vec![0.0f32; 4000];
        for s in &mut signal {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            *s = (seed as f32 / u32::MAX as f32) * 2.0 - 1.0;
        }
        for n in 3..signal.len() {
            let window = &signal[n - 3..=n];
            let echo = 0.5 * signal[n - 2];
            let error = echo - filter.estimate(window);
            filter.adapt(window, dot(window, window), error);
        }
        // window[2] is x[n - 1], window[1] is x[n - 2].
        assert!((filter.weights[1] - 0.5).abs() < 1e-3, "{:?}", filter.weights);
        assert!(filter.weights[0].abs() < 1e-3);
        assert!(filter.weights[2].abs() < 1e-3);
        assert!(filter.weights[3].abs() < 1e-3);
        assert!((filter.energy() - 0.25).abs() < 1e-2);
    }

    #[test]
    fn reset_zeroes_coefficients() {
        let mut filter = NlmsFilter::new(8, 1.0, 1.0);
        filter.adapt(&[1.0; 8], 8.0, 1.0);
        assert!(filter.energy() > 0.0);
        filter.reset();
        assert_eq!(filter.energy(), 0.0);
        assert_eq!(filter.len(), 8);
    }
}
