//! # Optimizer interface
//!
//! The controller treats the optimizer as a black box taking the canonical
//! state, the path polynomial and the reference speed. It returns a flat
//! sequence: `[steer_rad, speed_ms, x_0, y_0, x_1, y_1, ...]`, the pairs
//! being the predicted vehicle-frame trajectory.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{DVector, Vector2, Vector5};
use serde::Serialize;

// Internal
use super::fit::TrackingErrors;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Canonical optimizer state, `[x, y, psi, cte, epsi]` in the vehicle frame.
pub type StateVector = Vector5<f64>;

/// A parsed optimizer result.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OptimizerOutput {
    /// Steering angle demand, positive turns clockwise
    ///
    /// Units: radians
    pub steer_rad: f64,

    /// Speed demand
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Predicted trajectory in the vehicle frame
    pub trajectory: Vec<Vector2<f64>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum OptimizerError {
    #[error("The optimizer returned {0} values, at least the 2 command values are required")]
    ShortOutput(usize),

    #[error("The optimizer's predicted trajectory has an odd number of values ({0})")]
    UnpairedTrajectory(usize),

    #[error("The optimizer's command is not finite: steer = {0}, speed = {1}")]
    NonFiniteCommand(f64, f64),

    #[error("The optimizer found no solution: {0}")]
    NoSolution(String),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// An optimization based controller.
pub trait Optimizer {
    /// Compute the next command.
    ///
    /// Must return in bounded time. The output layout is described in the
    /// module documentation.
    fn solve(
        &mut self,
        state: &StateVector,
        coeffs: &DVector<f64>,
        ref_v_ms: f64,
    ) -> Result<Vec<f64>, OptimizerError>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl OptimizerOutput {
    pub fn from_raw(raw: &[f64]) -> Result<Self, OptimizerError> {
        if raw.len() < 2 {
            return Err(OptimizerError::ShortOutput(raw.len()));
        }

        let (command, traj) = raw.split_at(2);

        if traj.len() % 2 != 0 {
            return Err(OptimizerError::UnpairedTrajectory(traj.len()));
        }
        if !(command[0].is_finite() && command[1].is_finite()) {
            return Err(OptimizerError::NonFiniteCommand(command[0], command[1]));
        }

        Ok(Self {
            steer_rad: command[0],
            speed_ms: command[1],
            trajectory: traj.chunks(2).map(|p| Vector2::new(p[0], p[1])).collect(),
        })
    }
}

/// Build the canonical state for a vehicle at the origin of the fit frame.
pub fn state_vector(errors: &TrackingErrors) -> StateVector {
    StateVector::new(0.0, 0.0, 0.0, errors.cte_m, errors.epsi_rad)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_raw() {
        let out = OptimizerOutput::from_raw(&[0.1, 2.0, 0.0, 0.0, 0.5, 0.1]).unwrap();

        assert_eq!(out.steer_rad, 0.1);
        assert_eq!(out.speed_ms, 2.0);
        assert_eq!(
            out.trajectory,
            vec![Vector2::new(0.0, 0.0), Vector2::new(0.5, 0.1)]
        );

        let out = OptimizerOutput::from_raw(&[0.0, 0.0]).unwrap();
        assert!(out.trajectory.is_empty());
    }

    #[test]
    fn test_from_raw_errors() {
        assert_eq!(
            OptimizerOutput::from_raw(&[0.1]),
            Err(OptimizerError::ShortOutput(1))
        );
        assert_eq!(
            OptimizerOutput::from_raw(&[0.1, 1.0, 3.0]),
            Err(OptimizerError::UnpairedTrajectory(1))
        );
        assert!(matches!(
            OptimizerOutput::from_raw(&[std::f64::NAN, 1.0]),
            Err(OptimizerError::NonFiniteCommand(_, _))
        ));
    }

    #[test]
    fn test_state_vector() {
        let state = state_vector(&TrackingErrors {
            cte_m: 0.2,
            epsi_rad: -0.1,
        });

        assert_eq!(state, StateVector::new(0.0, 0.0, 0.0, 0.2, -0.1));
    }
}
