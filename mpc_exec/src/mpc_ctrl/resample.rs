//! # Path resampler
//!
//! Samples the cyclic reference path at a fixed stride, moves the samples
//! into the vehicle frame and guards the downstream fit against degenerate
//! spacing.
//!
//! Once more than `degree + 1` points have been accepted, a sample whose x
//! increment over the previous accepted point is below the threshold ends
//! sampling. The rest of the sequence is then synthesized by linear
//! extrapolation from the last two accepted points, so the output always
//! holds exactly `count` points.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use super::frame::VehicleFrame;
use util::maths::wrap_index;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct ResampleParams {
    /// Number of points to produce
    pub count: usize,

    /// Index stride between samples
    pub stride: usize,

    /// Degree of the polynomial the points will be fitted with
    pub degree: usize,

    /// Minimum x increment between accepted points
    ///
    /// Units: meters
    pub min_x_delta_m: f64,
}

/// The resampled local path in the vehicle frame.
#[derive(Debug, Clone, Serialize)]
pub struct ResampledPath {
    pub points: Vec<Vector2<f64>>,

    /// Fraction of the points that are genuine path samples, 1.0 when no
    /// degeneracy was found.
    pub valid_fraction: f64,

    /// Sample index at which degeneracy was detected
    pub degenerate_at: Option<usize>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Path indices visited by the resampler, always in `[0, len)`.
///
/// `len` must be non-zero.
pub fn resample_indices(
    start: i64,
    count: usize,
    stride: usize,
    len: usize,
) -> impl Iterator<Item = usize> {
    (0..count).map(move |i| wrap_index(start + (i * stride) as i64, len))
}

/// Resample the path starting at `start` (which may be negative or beyond
/// the path length) and transform the samples into `frame`.
///
/// An empty path gives an empty result.
pub fn resample(
    path: &[Vector2<f64>],
    start: i64,
    frame: &VehicleFrame,
    params: &ResampleParams,
) -> ResampledPath {
    let mut resampled = ResampledPath {
        points: Vec::with_capacity(params.count),
        valid_fraction: 1.0,
        degenerate_at: None,
    };

    if path.is_empty() {
        resampled.valid_fraction = 0.0;
        return resampled;
    }

    let indices = resample_indices(start, params.count, params.stride, path.len());

    for (i, idx) in indices.enumerate() {
        let point = frame.to_vehicle(&path[idx]);

        // Extrapolation needs two accepted points
        if i > params.degree.max(1) {
            let prev = resampled.points[i - 1];

            if point.x - prev.x < params.min_x_delta_m {
                extrapolate(&mut resampled, i, params.count);
                break;
            }
        }

        resampled.points.push(point);
    }

    resampled
}

/// Fill the points after a degeneracy at sample `i` by linear extrapolation.
fn extrapolate(resampled: &mut ResampledPath, i: usize, count: usize) {
    let remaining = count - i + 1;

    resampled.valid_fraction = (i + 1) as f64 / count as f64;
    resampled.degenerate_at = Some(i);

    warn!(
        "Degenerate path spacing at point {}, extrapolating {} points",
        i, remaining
    );

    let last = resampled.points[i - 1];
    let delta = (last - resampled.points[i - 2]) / remaining as f64;

    for sub_i in 1..remaining {
        resampled.points.push(last + delta * sub_i as f64);
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
