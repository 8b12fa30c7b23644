//! # Control Tick Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use comms_if::msg::{Centerline, GoSignalMsg, Inbound, Point, PoseOdom, Quaternion, SpeedOdom};
use mpc_lib::mpc_ctrl::{
    InputData, MpcCtrl, NoopSink, OptimizerWeights, Params, RolloutOptimizer, TuningParams,
};
use util::module::State;

fn tick_benchmark(c: &mut Criterion) {
    // ---- Build the controller ----

    let params = Params {
        steps_ahead: 10,
        dt_s: 0.1,
        ref_v_ms: 2.0,
        ref_v_alpha: 0.5,
        latency_s: 0.1,
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
        tuning: TuningParams::default(),
    };
    let optimizer = Box::new(RolloutOptimizer::new(&params));
    let mut ctrl = MpcCtrl::new(params, optimizer, Box::new(NoopSink)).unwrap();

    // ---- Build the inputs ----

    // 20 m radius track sampled every 5 cm
    let num_points = 2513;
    let points = (0..num_points)
        .map(|i| {
            let theta = 2.0 * std::f64::consts::PI * i as f64 / num_points as f64;
            Point {
                x: 20.0 * theta.cos(),
                y: 20.0 * theta.sin(),
            }
        })
        .collect();

    let mut input = InputData::default();
    input.handle_inbound(Inbound::Centerline(Centerline { points }));
    input.handle_inbound(Inbound::Speed(SpeedOdom { linear_x: 2.0 }));
    input.handle_inbound(Inbound::Pose(PoseOdom {
        position: Point { x: 0.1, y: -19.9 },
        orientation: Quaternion {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        },
    }));
    input.handle_inbound(Inbound::GoSignal(GoSignalMsg { data: 2309 }));

    // ---- Benchmark ----

    c.bench_function("mpc_ctrl tick", |b| b.iter(|| ctrl.proc(&input).unwrap()));
}

criterion_group!(benches, tick_benchmark);
criterion_main!(benches);
