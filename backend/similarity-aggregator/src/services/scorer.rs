//! Cosine similarity from incrementally maintained sums

/// Decimal places kept in emitted scores
pub const DEFAULT_SCORE_PRECISION: u32 = 5;

/// Beyond this, rounding no longer changes an f64 in [0, 1]
pub const MAX_SCORE_PRECISION: u32 = 15;

#[derive(Debug, Clone, Copy)]
pub struct SimilarityScorer {
    precision: u32,
    scale: f64,
}

impl SimilarityScorer {
    pub fn new(precision: u32) -> Self {
        let precision = precision.min(MAX_SCORE_PRECISION);
        Self {
            precision,
            scale: 10f64.powi(precision as i32),
        }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// `sum_min / (sqrt(sum_a) * sqrt(sum_b))`, rounded to the configured precision
    ///
    /// Any non-positive (or NaN) input yields 0, so an event nobody
    /// interacted with never scores against anything.
    pub fn score(&self, sum_a: f64, sum_b: f64, sum_min: f64) -> f64 {
        if !(sum_a > 0.0 && sum_b > 0.0 && sum_min > 0.0) {
            return 0.0;
        }

        let cosine = sum_min / (sum_a.sqrt() * sum_b.sqrt());
        self.round(cosine.clamp(0.0, 1.0))
    }

    fn round(&self, value: f64) -> f64 {
        (value * self.scale).round() / self.scale
    }
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(DEFAULT_SCORE_PRECISION)
    }
}
