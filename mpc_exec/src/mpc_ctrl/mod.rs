//! # MPC control module
//!
//! Turns the latest pose, speed and reference path into one actuator
//! command per tick:
//!
//! 1. Project the pose forward by the actuation latency ([`latency`]).
//! 2. Find the closest path point and step back from it ([`locator`]).
//! 3. Resample the path ahead into the vehicle frame ([`resample`]).
//! 4. Discount the reference speed by the resample confidence ([`ref_speed`]).
//! 5. Fit a polynomial to the local path and derive the tracking errors
//!    ([`fit`]).
//! 6. Solve for the next command ([`optimizer`], [`solver`]).
//! 7. Map it to actuator units behind the go interlock ([`actuation`]).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod actuation;
pub mod aggregator;
pub mod diag;
pub mod fit;
pub mod frame;
pub mod latency;
pub mod locator;
pub mod optimizer;
mod params;
pub mod ref_speed;
pub mod resample;
pub mod solver;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use actuation::{ActuatorCommand, GoInterlock};
pub use aggregator::{MissingInputs, StateAggregator, VehicleState};
pub use diag::{DiagSink, NoopSink, TickDiagnostics};
pub use fit::FitError;
pub use frame::VehicleFrame;
pub use optimizer::{Optimizer, OptimizerError};
pub use params::*;
pub use solver::RolloutOptimizer;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during a MpcCtrl tick.
///
/// None of these are fatal. The tick's command is not published, and
/// `MpcCtrl::fallback_command` decides whether neutral goes out instead.
#[derive(Debug, thiserror::Error)]
pub enum MpcCtrlError {
    #[error("Inputs not ready ({0})")]
    InputsNotReady(MissingInputs),

    #[error("Could not find the closest point on the reference path")]
    NoClosestPoint,

    #[error("Could not fit the local path: {0}")]
    Fit(#[from] FitError),

    #[error("Optimizer failed: {0}")]
    Optimizer(#[from] OptimizerError),
}
