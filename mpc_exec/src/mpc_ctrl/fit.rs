//! # Polynomial fitter and error calculator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{DMatrix, DVector, Vector2};
use serde::Serialize;

// Internal
use util::maths::poly_val;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Singular values below this are treated as zero by the least squares
/// solve.
const SVD_EPS: f64 = 1e-12;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tracking errors of the vehicle relative to the fitted path.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct TrackingErrors {
    /// Cross-track error
    ///
    /// Units: meters
    pub cte_m: f64,

    /// Heading error
    ///
    /// Units: radians
    pub epsi_rad: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FitError {
    #[error("Cannot fit a degree {degree} polynomial to {points} points")]
    TooFewPoints { points: usize, degree: usize },

    #[error("The points contain non-finite values")]
    NonFinitePoints,

    #[error("Least squares solve failed: {0}")]
    SolveFailed(&'static str),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Least squares fit of a polynomial of the given degree to the points.
///
/// The returned vector holds `degree + 1` coefficients, lowest power first.
pub fn poly_fit(points: &[Vector2<f64>], degree: usize) -> Result<DVector<f64>, FitError> {
    let order = degree + 1;

    if points.len() < order {
        return Err(FitError::TooFewPoints {
            points: points.len(),
            degree,
        });
    }
    if points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
        return Err(FitError::NonFinitePoints);
    }

    // Vandermonde matrix, one row per point
    let a = DMatrix::from_fn(points.len(), order, |r, c| points[r].x.powi(c as i32));
    let b = DVector::from_iterator(points.len(), points.iter().map(|p| p.y));

    let coeffs = a.svd(true, true).solve(&b, SVD_EPS).map_err(FitError::SolveFailed)?;

    if coeffs.iter().all(|c| c.is_finite()) {
        Ok(coeffs)
    } else {
        Err(FitError::NonFinitePoints)
    }
}

impl TrackingErrors {
    /// Errors of a vehicle at the origin of the frame the polynomial was fit
    /// in. `coeffs` must hold at least two values.
    pub fn from_coeffs(coeffs: &DVector<f64>) -> Self {
        let c = coeffs.as_slice();

        Self {
            cte_m: poly_val(0.0, c),
            epsi_rad: -c.get(1).copied().unwrap_or(0.0).atan(),
        }
    }
}
