//! Sample-by-sample comparison of float buffers.

use std::fmt;

/// Summary of comparing two buffers with [`compare_f32`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonResult {
    /// Number of compared samples (the shorter length).
    pub len: usize,
    /// Samples differing by more than the tolerance, plus the length
    /// difference when the buffers are of unequal length.
    pub mismatches: usize,
    /// Largest absolute difference seen.
    pub max_abs_diff: f32,
    /// Index of the first mismatching sample.
    pub first_mismatch: Option<usize>,
}

impl ComparisonResult {
    pub fn is_match(&self) -> bool {
        self.mismatches == 0
    }
}

impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} mismatches, max abs diff {:e}",
            self.mismatches, self.len, self.max_abs_diff
        )?;
        if let Some(index) = self.first_mismatch {
            write!(f, ", first at {index}")?;
        }
        Ok(())
    }
}

/// Compares `actual` against `expected` with an absolute `tolerance`.
pub fn compare_f32(actual: &[f32], expected: &[f32], tolerance: f32) -> ComparisonResult {
    let len = actual.len().min(expected.len());
    let mut mismatches = actual.len().abs_diff(expected.len());
    let mut first_mismatch = (mismatches > 0).then_some(len);
    let mut max_abs_diff = 0.0f32;
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        let diff = (a - e).abs();
        if diff > tolerance || diff.is_nan() {
            mismatches += 1;
            first_mismatch = Some(first_mismatch.map_or(i, |first| first.min(i)));
        }
        if diff > max_abs_diff {
            max_abs_diff = diff;
        }
    }
    ComparisonResult {
        len,
        mismatches,
        max_abs_diff,
        first_mismatch,
    }
}
