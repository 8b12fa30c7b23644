//! MPC controller parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the MPC controller.
///
/// These are fixed for the lifetime of the process. The first group comes
/// from the exec's positional arguments, `tuning` from `mpc_ctrl.toml`.
#[derive(Serialize, Debug, Clone)]
pub struct Params {
    /// Number of steps in the optimizer's prediction horizon
    pub steps_ahead: usize,

    /// Optimizer timestep
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// Target cruising speed
    ///
    /// Units: meters/second
    pub ref_v_ms: f64,

    /// Reference speed smoothing factor, in [0, 1]. 1 holds the seed speed
    /// forever, 0 applies the valid-fraction discount immediately.
    pub ref_v_alpha: f64,

    /// Actuation latency to compensate for
    ///
    /// Units: seconds
    pub latency_s: f64,

    /// Optimizer cost weights
    pub weights: OptimizerWeights,

    /// Degree of the polynomial fitted to the local path
    pub poly_degree: usize,

    /// Number of path points resampled for the fit
    pub num_steps_poly: usize,

    /// If true diagnostics are published each tick
    pub debug: bool,

    /// Vehicle and tuning constants
    pub tuning: TuningParams,
}

/// Cost weights passed through to the optimizer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct OptimizerWeights {
    /// Cross-track error weight
    pub cte: f64,

    /// Heading error weight
    pub epsi: f64,

    /// Speed tracking weight
    pub speed: f64,

    /// Steering magnitude weight
    pub steer: f64,

    /// Weight on the change of steering between commands
    pub consec_steer: f64,

    /// Weight on the change of speed between commands
    pub consec_speed: f64,
}

/// Vehicle and tuning constants loaded from the parameter file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TuningParams {
    /// Servo command giving straight-ahead steering.
    pub steer_center: f64,

    /// Drive wheel radius
    ///
    /// Units: meters
    pub wheel_radius_m: f64,

    /// Scale from shaft RPM to the motor controller's speed command.
    pub rpm_scale: f64,

    /// Distance between the centre of mass and the front axle, used as the
    /// wheelbase in the kinematic model.
    ///
    /// Units: meters
    pub wheelbase_proxy_m: f64,

    /// Stride between resampled path points
    pub resample_stride: usize,

    /// Number of points to step back from the closest path point before
    /// resampling, stabilises the fit.
    pub lookback_offset: usize,

    /// Minimum x increment between consecutive vehicle-frame points, below
    /// which the rest of the resampled path is extrapolated.
    ///
    /// Units: meters
    pub min_x_delta_m: f64,

    /// Steering limit of the default optimizer
    ///
    /// Units: radians
    pub max_steer_rad: f64,

    /// Speed limit of the default optimizer
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    /// Number of steering values sampled by the default optimizer
    pub num_steer_candidates: usize,

    /// Number of speed values sampled by the default optimizer
    pub num_speed_candidates: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamsError {
    #[error("The reference speed smoothing factor must be in [0, 1], got {0}")]
    AlphaOutOfRange(f64),

    #[error("The polynomial degree must be at least 1, got {0}")]
    DegreeTooLow(usize),

    #[error("The number of resampled points ({points}) must exceed the polynomial degree ({degree})")]
    TooFewPoints { points: usize, degree: usize },

    #[error("{0} must be positive and finite, got {1}")]
    NotPositive(&'static str, f64),

    #[error("{0} must be non-negative and finite, got {1}")]
    Negative(&'static str, f64),

    #[error("{0} must be finite, got {1}")]
    NotFinite(&'static str, f64),

    #[error("{0} must be at least 1")]
    ZeroCount(&'static str),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the parameters are consistent with each other and physically
    /// meaningful.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(0.0..=1.0).contains(&self.ref_v_alpha) {
            return Err(ParamsError::AlphaOutOfRange(self.ref_v_alpha));
        }
        if self.poly_degree < 1 {
            return Err(ParamsError::DegreeTooLow(self.poly_degree));
        }
        if self.num_steps_poly <= self.poly_degree {
            return Err(ParamsError::TooFewPoints {
                points: self.num_steps_poly,
                degree: self.poly_degree,
            });
        }
        if self.steps_ahead == 0 {
            return Err(ParamsError::ZeroCount("steps_ahead"));
        }

        positive("dt_s", self.dt_s)?;
        non_negative("ref_v_ms", self.ref_v_ms)?;
        non_negative("latency_s", self.latency_s)?;

        self.weights.validate()?;
        self.tuning.validate()
    }
}

impl OptimizerWeights {
    pub fn validate(&self) -> Result<(), ParamsError> {
        non_negative("cte weight", self.cte)?;
        non_negative("epsi weight", self.epsi)?;
        non_negative("speed weight", self.speed)?;
        non_negative("steer weight", self.steer)?;
        non_negative("consec_steer weight", self.consec_steer)?;
        non_negative("consec_speed weight", self.consec_speed)
    }
}

impl TuningParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !self.steer_center.is_finite() {
            return Err(ParamsError::NotFinite("steer_center", self.steer_center));
        }

        positive("wheel_radius_m", self.wheel_radius_m)?;
        positive("rpm_scale", self.rpm_scale)?;
        positive("wheelbase_proxy_m", self.wheelbase_proxy_m)?;
        positive("max_steer_rad", self.max_steer_rad)?;
        positive("max_speed_ms", self.max_speed_ms)?;
        non_negative("min_x_delta_m", self.min_x_delta_m)?;

        if self.resample_stride == 0 {
            return Err(ParamsError::ZeroCount("resample_stride"));
        }
        if self.num_steer_candidates == 0 {
            return Err(ParamsError::ZeroCount("num_steer_candidates"));
        }
        if self.num_speed_candidates == 0 {
            return Err(ParamsError::ZeroCount("num_speed_candidates"));
        }

        Ok(())
    }
}

impl Default for TuningParams {
    fn default() -> Self {
        Self {
            steer_center: 0.5304,
            wheel_radius_m: 0.05,
            rpm_scale: 10.0,
            wheelbase_proxy_m: 0.325,
            resample_stride: 1,
            lookback_offset: 2,
            min_x_delta_m: 0.01,
            max_steer_rad: 0.4189,
            max_speed_ms: 5.0,
            num_steer_candidates: 41,
            num_speed_candidates: 11,
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn positive(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ParamsError::NotPositive(name, value))
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ParamsError::Negative(name, value))
    }
}
