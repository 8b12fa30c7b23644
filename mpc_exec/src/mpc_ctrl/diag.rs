//! # Diagnostics sink
//!
//! Diagnostics only ever see data the tick has already computed. Sinks that
//! report `enabled() == false` are skipped before the tick's diagnostics are
//! assembled.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{DVector, Vector2};

use super::frame::VehicleFrame;
use util::maths::poly_val;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Spacing of the polynomial curve sample
///
/// Units: meters
const POLY_SAMPLE_STEP_M: f64 = 0.2;

/// Number of evaluated points in the polynomial curve sample, covering
/// x = 0.0 to 2.0.
const POLY_SAMPLE_POINTS: usize = 11;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Everything a sink may visualise for one tick, in the vehicle frame.
#[derive(Debug, Clone, Copy)]
pub struct TickDiagnostics<'a> {
    /// The tick's latency compensated vehicle frame
    pub frame: &'a VehicleFrame,

    /// The resampled points the polynomial was fitted to
    pub fit_points: &'a [Vector2<f64>],

    /// Fitted coefficients, lowest power first
    pub coeffs: &'a DVector<f64>,

    /// Optimizer predicted trajectory
    pub trajectory: &'a [Vector2<f64>],
}

/// A sink which discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

pub trait DiagSink {
    /// If false the controller will not build diagnostics for this sink.
    fn enabled(&self) -> bool {
        true
    }

    fn emit(&mut self, diag: &TickDiagnostics);
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DiagSink for NoopSink {
    fn enabled(&self) -> bool {
        false
    }

    fn emit(&mut self, _diag: &TickDiagnostics) {}
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Move vehicle frame points back into the world frame.
pub fn world_points(frame: &VehicleFrame, points: &[Vector2<f64>]) -> Vec<Vector2<f64>> {
    points.iter().map(|p| frame.to_world(p)).collect()
}

/// Sample the fitted polynomial ahead of the vehicle, in the vehicle frame.
///
/// The sample starts at the frame origin.
pub fn poly_curve_sample(coeffs: &DVector<f64>) -> Vec<Vector2<f64>> {
    let c = coeffs.as_slice();

    std::iter::once(Vector2::zeros())
        .chain((0..POLY_SAMPLE_POINTS).map(|i| {
            let x = i as f64 * POLY_SAMPLE_STEP_M;
            Vector2::new(x, poly_val(x, c))
        }))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_poly_curve_sample() {
        let coeffs = DVector::from_vec(vec![0.5, 1.0]);
        let sample = poly_curve_sample(&coeffs);

        assert_eq!(sample.len(), 12);
        assert_eq!(sample[0], Vector2::zeros());
        assert_eq!(sample[1], Vector2::new(0.0, 0.5));
        assert!((sample[11] - Vector2::new(2.0, 2.5)).norm() < 1e-12);
    }

    #[test]
    fn test_world_points() {
        let frame = VehicleFrame::new(Vector2::new(2.0, 1.0), std::f64::consts::PI);
        let world = world_points(&frame, &[Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)]);

        assert!((world[0] - Vector2::new(1.0, 1.0)).norm() < 1e-12);
        assert!((world[1] - Vector2::new(2.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_noop_disabled() {
        assert!(!NoopSink.enabled());
    }
}
