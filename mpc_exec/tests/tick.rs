//! End-to-end control tick scenarios.

use nalgebra::{DVector, Vector2};

use comms_if::msg::{Centerline, GoSignalMsg, Inbound, Point, PoseOdom, Quaternion, SpeedOdom};
use mpc_lib::mpc_ctrl::{
    frame::VehicleFrame,
    locator::{find_closest, lookback_start},
    optimizer::{OptimizerError, StateVector},
    resample::{resample, ResampleParams},
    InputData, MpcCtrl, NoopSink, Optimizer, OptimizerWeights, Params, RolloutOptimizer,
    TuningParams,
};
use util::module::State;

// ------------------------------------------------------------------------------------------------
// HELPERS
// ------------------------------------------------------------------------------------------------

/// Always demands the same command.
struct FixedOptimizer(f64, f64);

impl Optimizer for FixedOptimizer {
    fn solve(
        &mut self,
        _state: &StateVector,
        _coeffs: &DVector<f64>,
        _ref_v_ms: f64,
    ) -> Result<Vec<f64>, OptimizerError> {
        Ok(vec![self.0, self.1])
    }
}

/// Never finds a solution.
struct FailingOptimizer;

impl Optimizer for FailingOptimizer {
    fn solve(
        &mut self,
        _state: &StateVector,
        _coeffs: &DVector<f64>,
        _ref_v_ms: f64,
    ) -> Result<Vec<f64>, OptimizerError> {
        Err(OptimizerError::NoSolution(String::from("infeasible")))
    }
}

fn params() -> Params {
    Params {
        steps_ahead: 10,
        dt_s: 0.1,
        ref_v_ms: 1.0,
        ref_v_alpha: 0.5,
        latency_s: 0.0,
        weights: OptimizerWeights {
            cte: 100.0,
            epsi: 100.0,
            speed: 1.0,
            steer: 1.0,
            consec_steer: 10.0,
            consec_speed: 1.0,
        },
        poly_degree: 3,
        num_steps_poly: 10,
        debug: false,
        tuning: TuningParams {
            resample_stride: 1,
            lookback_offset: 2,
            ..TuningParams::default()
        },
    }
}

fn unit_circle(num_points: usize) -> Vec<Point> {
    (0..num_points)
        .map(|i| {
            let theta = 2.0 * std::f64::consts::PI * i as f64 / num_points as f64;
            Point {
                x: theta.cos(),
                y: theta.sin(),
            }
        })
        .collect()
}

/// Vehicle at the bottom of the unit circle, heading along +x at 1 m/s.
fn circle_inputs() -> InputData {
    let mut input = InputData::default();

    input.handle_inbound(Inbound::Centerline(Centerline {
        points: unit_circle(360),
    }));
    input.handle_inbound(Inbound::Speed(SpeedOdom { linear_x: 1.0 }));
    input.handle_inbound(Inbound::Pose(PoseOdom {
        position: Point { x: 0.0, y: -1.0 },
        orientation: Quaternion {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        },
    }));

    input
}

/// Vehicle at `position`, heading along +x at 1 m/s, following `points`.
fn path_inputs(points: Vec<Point>, position: Point) -> InputData {
    let mut input = InputData::default();

    input.handle_inbound(Inbound::Centerline(Centerline { points }));
    input.handle_inbound(Inbound::Speed(SpeedOdom { linear_x: 1.0 }));
    input.handle_inbound(Inbound::Pose(PoseOdom {
        position,
        orientation: Quaternion {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        },
    }));

    input
}

fn go_signal(input: &mut InputData, data: u16) {
    input.handle_inbound(Inbound::GoSignal(GoSignalMsg { data }));
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[test]
fn test_circle_resample() {
    let params = params();
    let path: Vec<Vector2<f64>> = unit_circle(360)
        .iter()
        .map(|p| Vector2::new(p.x, p.y))
        .collect();
    let frame = VehicleFrame::new(Vector2::new(0.0, -1.0), 0.0);

    let closest = find_closest(&path, &frame.origin_m).unwrap();
    assert_eq!(closest, 270);

    let start = lookback_start(closest, params.tuning.lookback_offset);
    assert_eq!(start, 268);

    let resampled = resample(
        &path,
        start,
        &frame,
        &ResampleParams {
            count: params.num_steps_poly,
            stride: params.tuning.resample_stride,
            degree: params.poly_degree,
            min_x_delta_m: params.tuning.min_x_delta_m,
        },
    );

    assert_eq!(resampled.points.len(), 10);
    assert_eq!(resampled.valid_fraction, 1.0);
    assert_eq!(resampled.degenerate_at, None);

    // A forward arc curving left, through the vehicle origin
    for w in resampled.points.windows(2) {
        assert!(w[1].x > w[0].x);
    }
    assert!(resampled.points[2].norm() < 1e-9);
    for p in resampled.points.iter() {
        assert!(p.y >= -1e-12);
        assert!(((p - Vector2::new(0.0, 1.0)).norm() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_circle_tick() {
    let params = params();
    let tuning = params.tuning.clone();
    let optimizer = Box::new(RolloutOptimizer::new(&params));
    let mut ctrl = MpcCtrl::new(params, optimizer, Box::new(NoopSink)).unwrap();

    let mut input = circle_inputs();
    go_signal(&mut input, 2309);

    let (output, report) = ctrl.proc(&input).unwrap();

    assert_eq!(report.closest_idx, 270);
    assert_eq!(report.valid_fraction, 1.0);
    assert!(report.cte_m.abs() < 1e-3);
    assert!(report.epsi_rad.abs() < 1e-2);
    assert!(!report.gated);

    // Within bounds, and turning left
    let cmd = output.command;
    assert!(cmd.steering >= 0.0 && cmd.steering <= 1.0);
    assert!(cmd.steering > tuning.steer_center);
    assert!(cmd.motor_rpm >= 0.0);
    let max_rpm = tuning.max_speed_ms / (2.0 * std::f64::consts::PI * tuning.wheel_radius_m)
        * 60.0
        * tuning.rpm_scale;
    assert!(cmd.motor_rpm <= max_rpm + 1e-9);

    // The applied steering feeds the next tick's latency compensation
    assert!((ctrl.last_steer_rad() - (tuning.steer_center - cmd.steering)).abs() < 1e-12);
}

#[test]
fn test_go_signal_sequence() {
    let params = params();
    let center = params.tuning.steer_center;
    let mut ctrl = MpcCtrl::new(params, Box::new(FixedOptimizer(0.1, 2.0)), Box::new(NoopSink))
        .unwrap();

    let mut input = circle_inputs();

    // Starts stopped
    let (output, _) = ctrl.proc(&input).unwrap();
    assert_eq!(output.command, ctrl.neutral());

    go_signal(&mut input, 2309);
    let (output, _) = ctrl.proc(&input).unwrap();
    assert!((output.command.steering - (center - 0.1)).abs() < 1e-12);
    assert!(output.command.motor_rpm > 0.0);

    // Emergency stop holds through ignored values
    go_signal(&mut input, 0);
    for &data in [1u16, 42, 2308, 65535].iter() {
        let (output, report) = ctrl.proc(&input).unwrap();
        assert!(report.gated);
        assert_eq!(output.command.steering, center);
        assert_eq!(output.command.motor_rpm, 0.0);

        go_signal(&mut input, data);
    }

    go_signal(&mut input, 2309);
    let (output, report) = ctrl.proc(&input).unwrap();
    assert!(!report.gated);
    assert!(output.command.motor_rpm > 0.0);
}

#[test]
fn test_ref_speed_held_with_full_confidence() {
    let params = params();
    let ref_v = params.ref_v_ms;
    let mut ctrl = MpcCtrl::new(params, Box::new(FixedOptimizer(0.0, 1.0)), Box::new(NoopSink))
        .unwrap();

    let input = circle_inputs();
    for _ in 0..5 {
        let (_, report) = ctrl.proc(&input).unwrap();
        assert!((report.ref_v_ms - ref_v).abs() < 1e-12);
    }
}

#[test]
fn test_degenerate_path_discounts_ref_speed() {
    // Advances along +x for 8 points then doubles back above the vehicle
    let points: Vec<Point> = (0..20)
        .map(|k| match k {
            k if k <= 7 => Point {
                x: 0.1 * k as f64,
                y: 0.0,
            },
            k => Point {
                x: 0.1 * (14 - k) as f64,
                y: 0.3,
            },
        })
        .collect();

    let params = params();
    let ref_v = params.ref_v_ms;
    let alpha = params.ref_v_alpha;
    let mut ctrl = MpcCtrl::new(params, Box::new(FixedOptimizer(0.0, 1.0)), Box::new(NoopSink))
        .unwrap();

    let mut input = path_inputs(points, Point { x: 0.2, y: 0.0 });
    go_signal(&mut input, 2309);

    let (_, report) = ctrl.proc(&input).unwrap();

    assert_eq!(report.closest_idx, 2);
    assert_eq!(report.degenerate_at, Some(8));
    assert!((report.valid_fraction - 0.9).abs() < 1e-12);
    assert!((report.ref_v_ms - (alpha * ref_v + (1.0 - alpha) * 0.9 * ref_v)).abs() < 1e-12);
    assert!((report.ref_v_ms - 0.95).abs() < 1e-12);

    // The discount keeps compounding while the path stays degenerate
    let (_, report) = ctrl.proc(&input).unwrap();
    assert!((report.ref_v_ms - 0.925).abs() < 1e-12);
}

#[test]
fn test_failed_tick_falls_back_to_neutral_when_stopped() {
    let mut ctrl = MpcCtrl::new(params(), Box::new(FailingOptimizer), Box::new(NoopSink)).unwrap();

    let mut input = circle_inputs();
    go_signal(&mut input, 2309);

    assert!(ctrl.proc(&input).is_err());
    assert_eq!(ctrl.fallback_command(&input.interlock), None);

    // Emergency stop: the actuators are still driven to neutral
    go_signal(&mut input, 0);
    assert!(ctrl.proc(&input).is_err());
    assert_eq!(ctrl.fallback_command(&input.interlock), Some(ctrl.neutral()));
    assert_eq!(ctrl.last_steer_rad(), 0.0);

    // Also before any go signal was received
    let idle = circle_inputs();
    assert_eq!(ctrl.fallback_command(&idle.interlock), Some(ctrl.neutral()));
}
