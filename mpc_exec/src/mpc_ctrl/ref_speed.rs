//! Reference speed shaper

/// Exponentially smoothed reference speed, discounted by path-fit
/// confidence.
#[derive(Debug, Clone, Copy)]
pub struct RefSpeedShaper {
    ref_v_ms: f64,
    alpha: f64,
    smoothed_ms: f64,
}

impl RefSpeedShaper {
    /// Create a new shaper seeded with the configured reference speed.
    pub fn new(ref_v_ms: f64, alpha: f64) -> Self {
        Self {
            ref_v_ms,
            alpha,
            smoothed_ms: ref_v_ms,
        }
    }

    /// Advance the filter by one tick and return the new smoothed speed.
    pub fn update(&mut self, valid_fraction: f64) -> f64 {
        self.smoothed_ms =
            self.alpha * self.smoothed_ms + (1.0 - self.alpha) * (valid_fraction * self.ref_v_ms);

        self.smoothed_ms
    }

    pub fn value(&self) -> f64 {
        self.smoothed_ms
    }
}
