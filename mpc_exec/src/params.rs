//! # MPC Executable Parameters
//!
//! Positional startup arguments of the executable. These are checked before
//! anything else is initialised, so a bad invocation never opens a socket.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;
use std::str::FromStr;

use crate::mpc_ctrl::{OptimizerWeights, Params, TuningParams};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of positional arguments, excluding the executable name.
pub const NUM_ARGS: usize = 14;

/// Latencies above this are accepted but likely a misconfiguration.
///
/// Units: seconds
pub const LATENCY_WARN_THRESHOLD_S: f64 = 1.0;

pub const USAGE: &str = "Usage: mpc_exec <steps_ahead> <dt> <ref_v> <ref_v_alpha> <latency> \
    <cte_coeff> <epsi_coeff> <speed_coeff> <steer_coeff> <consec_steer_coeff> \
    <consec_speed_coeff> <poly_degree> <num_steps_poly> <debug: true|false>";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Validated startup arguments.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StartupArgs {
    pub steps_ahead: usize,
    pub dt_s: f64,
    pub ref_v_ms: f64,
    pub ref_v_alpha: f64,
    pub latency_s: f64,
    pub weights: OptimizerWeights,
    pub poly_degree: usize,
    pub num_steps_poly: usize,
    pub debug: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ArgsError {
    #[error("Expected {} arguments, found {0}", NUM_ARGS)]
    WrongCount(usize),

    #[error("Could not parse {name} from \"{value}\"")]
    ParseError { name: &'static str, value: String },

    #[error("ref_v_alpha must be between 0 and 1, got {0}")]
    AlphaOutOfRange(f64),

    #[error("debug must be \"true\" or \"false\", got \"{0}\"")]
    InvalidDebugFlag(String),

    #[error("poly_degree must be at least 1, got {0}")]
    DegreeTooLow(usize),

    #[error("num_steps_poly ({points}) must be greater than poly_degree ({degree})")]
    TooFewPoints { points: usize, degree: usize },

    #[error("steps_ahead must be at least 1")]
    ZeroHorizon,

    #[error("dt must be positive, got {0}")]
    NonPositiveDt(f64),

    #[error("latency must not be negative, got {0}")]
    NegativeLatency(f64),

    #[error("ref_v must not be negative, got {0}")]
    NegativeRefSpeed(f64),

    #[error("{0} must be finite, got {1}")]
    NotFinite(&'static str, f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StartupArgs {
    /// Parse the positional arguments, not including the executable name.
    pub fn parse(args: &[String]) -> Result<Self, ArgsError> {
        if args.len() != NUM_ARGS {
            return Err(ArgsError::WrongCount(args.len()));
        }

        let parsed = Self {
            steps_ahead: parse_arg("steps_ahead", &args[0])?,
            dt_s: parse_finite("dt", &args[1])?,
            ref_v_ms: parse_finite("ref_v", &args[2])?,
            ref_v_alpha: parse_finite("ref_v_alpha", &args[3])?,
            latency_s: parse_finite("latency", &args[4])?,
            weights: OptimizerWeights {
                cte: parse_finite("cte_coeff", &args[5])?,
                epsi: parse_finite("epsi_coeff", &args[6])?,
                speed: parse_finite("speed_coeff", &args[7])?,
                steer: parse_finite("steer_coeff", &args[8])?,
                consec_steer: parse_finite("consec_steer_coeff", &args[9])?,
                consec_speed: parse_finite("consec_speed_coeff", &args[10])?,
            },
            poly_degree: parse_arg("poly_degree", &args[11])?,
            num_steps_poly: parse_arg("num_steps_poly", &args[12])?,
            debug: match args[13].as_str() {
                "true" => true,
                "false" => false,
                other => return Err(ArgsError::InvalidDebugFlag(other.into())),
            },
        };

        if !(0.0..=1.0).contains(&parsed.ref_v_alpha) {
            return Err(ArgsError::AlphaOutOfRange(parsed.ref_v_alpha));
        }
        if parsed.poly_degree < 1 {
            return Err(ArgsError::DegreeTooLow(parsed.poly_degree));
        }
        if parsed.num_steps_poly <= parsed.poly_degree {
            return Err(ArgsError::TooFewPoints {
                points: parsed.num_steps_poly,
                degree: parsed.poly_degree,
            });
        }
        if parsed.steps_ahead == 0 {
            return Err(ArgsError::ZeroHorizon);
        }
        if parsed.dt_s <= 0.0 {
            return Err(ArgsError::NonPositiveDt(parsed.dt_s));
        }
        if parsed.latency_s < 0.0 {
            return Err(ArgsError::NegativeLatency(parsed.latency_s));
        }
        if parsed.ref_v_ms < 0.0 {
            return Err(ArgsError::NegativeRefSpeed(parsed.ref_v_ms));
        }

        Ok(parsed)
    }

    /// True if the latency is large enough to be worth warning about.
    pub fn latency_suspicious(&self) -> bool {
        self.latency_s > LATENCY_WARN_THRESHOLD_S
    }

    /// Combine with the tuning constants into the controller parameters.
    pub fn into_params(self, tuning: TuningParams) -> Params {
        Params {
            steps_ahead: self.steps_ahead,
            dt_s: self.dt_s,
            ref_v_ms: self.ref_v_ms,
            ref_v_alpha: self.ref_v_alpha,
            latency_s: self.latency_s,
            weights: self.weights,
            poly_degree: self.poly_degree,
            num_steps_poly: self.num_steps_poly,
            debug: self.debug,
            tuning,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn parse_arg<T: FromStr>(name: &'static str, value: &str) -> Result<T, ArgsError> {
    value.parse().map_err(|_| ArgsError::ParseError {
        name,
        value: value.into(),
    })
}

/// Parse a float argument, rejecting NaN and infinities.
fn parse_finite(name: &'static str, value: &str) -> Result<f64, ArgsError> {
    let parsed: f64 = parse_arg(name, value)?;

    match parsed.is_finite() {
        true => Ok(parsed),
        false => Err(ArgsError::NotFinite(name, parsed)),
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn args(overrides: &[(usize, &str)]) -> Vec<String> {
        let mut a: Vec<String> = [
            "10", "0.1", "2.0", "0.5", "0.1", "100", "100", "1", "1", "10", "1", "3", "10", "false",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        for &(i, v) in overrides {
            a[i] = v.to_string();
        }

        a
    }

    #[test]
    fn test_parse() {
        let parsed = StartupArgs::parse(&args(&[])).unwrap();

        assert_eq!(parsed.steps_ahead, 10);
        assert_eq!(parsed.dt_s, 0.1);
        assert_eq!(parsed.ref_v_alpha, 0.5);
        assert_eq!(parsed.weights.consec_steer, 10.0);
        assert_eq!(parsed.poly_degree, 3);
        assert_eq!(parsed.num_steps_poly, 10);
        assert!(!parsed.debug);
        assert!(!parsed.latency_suspicious());

        let params = parsed.into_params(TuningParams::default());
        assert!(params.validate().is_ok());

        assert!(StartupArgs::parse(&args(&[(13, "true")])).unwrap().debug);
        assert!(StartupArgs::parse(&args(&[(4, "1.5")])).unwrap().latency_suspicious());
    }

    #[test]
    fn test_usage_errors() {
        assert_eq!(
            StartupArgs::parse(&args(&[(3, "1.5")])),
            Err(ArgsError::AlphaOutOfRange(1.5))
        );
        assert_eq!(
            StartupArgs::parse(&args(&[(13, "yes")])),
            Err(ArgsError::InvalidDebugFlag("yes".into()))
        );
        assert_eq!(
            StartupArgs::parse(&args(&[(0, "ten")])),
            Err(ArgsError::ParseError {
                name: "steps_ahead",
                value: "ten".into()
            })
        );
        assert_eq!(
            StartupArgs::parse(&args(&[(11, "0")])),
            Err(ArgsError::DegreeTooLow(0))
        );
        assert_eq!(
            StartupArgs::parse(&args(&[(12, "3")])),
            Err(ArgsError::TooFewPoints {
                points: 3,
                degree: 3
            })
        );
        assert_eq!(
            StartupArgs::parse(&args(&[(4, "-0.1")])),
            Err(ArgsError::NegativeLatency(-0.1))
        );

        assert_eq!(
            StartupArgs::parse(&args(&[(2, "-1")])),
            Err(ArgsError::NegativeRefSpeed(-1.0))
        );

        let mut a = args(&[]);
        a.push("extra".into());
        assert_eq!(StartupArgs::parse(&a), Err(ArgsError::WrongCount(15)));
        assert_eq!(
            StartupArgs::parse(&a[..NUM_ARGS - 1]),
            Err(ArgsError::WrongCount(13))
        );
    }

    #[test]
    fn test_non_finite_args() {
        assert_eq!(
            StartupArgs::parse(&args(&[(2, "inf")])),
            Err(ArgsError::NotFinite("ref_v", f64::INFINITY))
        );
        assert_eq!(
            StartupArgs::parse(&args(&[(1, "-inf")])),
            Err(ArgsError::NotFinite("dt", f64::NEG_INFINITY))
        );

        // NaN never compares equal, so match on the variant
        for &(i, name) in [(5, "cte_coeff"), (3, "ref_v_alpha"), (4, "latency")].iter() {
            match StartupArgs::parse(&args(&[(i, "NaN")])) {
                Err(ArgsError::NotFinite(n, v)) => {
                    assert_eq!(n, name);
                    assert!(v.is_nan());
                }
                r => panic!("Expected NotFinite for {}, got {:?}", name, r),
            }
        }
    }
}
