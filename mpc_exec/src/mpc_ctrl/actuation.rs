//! # Actuation mapper and safety gate
//!
//! Converts the optimizer's command into servo and motor controller units.
//! The go interlock is applied last, nothing upstream can bypass it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use serde::Serialize;

// Internal
use super::{optimizer::OptimizerOutput, params::TuningParams};
use comms_if::msg::GoSignal;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Safety interlock, starts inactive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoInterlock {
    go: bool,
}

/// A command ready to publish.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ActuatorCommand {
    /// Normalised servo position in [0, 1]
    pub steering: f64,

    /// Motor controller speed command
    pub motor_rpm: f64,
}

/// Result of mapping an optimizer command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedCommand {
    pub command: ActuatorCommand,

    /// True if the steering had to be clamped
    pub steer_clamped: bool,

    /// True if the interlock forced the neutral command
    pub gated: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ActuationMapper {
    steer_center: f64,

    /// Motor command per m/s of ground speed
    rpm_per_ms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GoInterlock {
    /// Update the interlock from a received go-signal.
    pub fn apply_signal(&mut self, signal: GoSignal) {
        match signal {
            GoSignal::EmergencyStop => {
                warn!("Emergency stop!");
                self.go = false;
            }
            GoSignal::Go => {
                warn!("GO!");
                self.go = true;
            }
            GoSignal::Ignored => (),
        }
    }

    pub fn is_go(&self) -> bool {
        self.go
    }
}

impl ActuatorCommand {
    /// Straight ahead and stopped.
    pub fn neutral(steer_center: f64) -> Self {
        Self {
            steering: steer_center,
            motor_rpm: 0.0,
        }
    }
}

impl ActuationMapper {
    pub fn new(tuning: &TuningParams) -> Self {
        Self {
            steer_center: tuning.steer_center,
            rpm_per_ms: 60.0 * tuning.rpm_scale
                / (2.0 * std::f64::consts::PI * tuning.wheel_radius_m),
        }
    }

    pub fn neutral(&self) -> ActuatorCommand {
        ActuatorCommand::neutral(self.steer_center)
    }

    /// Map the optimizer command, then apply the interlock.
    pub fn map(&self, output: &OptimizerOutput, interlock: &GoInterlock) -> MappedCommand {
        let mut steer_clamped = false;

        let command = if output.steer_rad.is_finite() && output.speed_ms.is_finite() {
            let raw_steering = self.steer_center - output.steer_rad;
            let steering = raw_steering.max(0.0).min(1.0);

            if steering != raw_steering {
                warn!("Steering command {} out of range, clamped to {}", raw_steering, steering);
                steer_clamped = true;
            }

            ActuatorCommand {
                steering,
                motor_rpm: output.speed_ms * self.rpm_per_ms,
            }
        } else {
            warn!(
                "Non-finite optimizer command (steer: {}, speed: {}), using neutral",
                output.steer_rad, output.speed_ms
            );
            self.neutral()
        };

        if interlock.is_go() {
            MappedCommand {
                command,
                steer_clamped,
                gated: false,
            }
        } else {
            MappedCommand {
                command: self.neutral(),
                steer_clamped,
                gated: true,
            }
        }
    }

    /// The steering angle a published command will actually apply.
    pub fn applied_steer_rad(&self, command: &ActuatorCommand) -> f64 {
        self.steer_center - command.steering
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
