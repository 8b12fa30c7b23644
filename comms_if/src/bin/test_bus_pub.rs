//! Fake sensor bus
//!
//! Publishes a circular centerline and a vehicle driving around it, then a go signal, so
//! `mpc_exec` can be run without the rest of the vehicle stack. Binds on the default
//! `sub_endpoint` port.

use comms_if::{
    msg::{
        Centerline, GoSignalMsg, Point, PoseOdom, Quaternion, SpeedOdom, Topic, GO_SIGNAL_GO,
    },
    net::{MonitoredSocket, SocketOptions},
};

const RADIUS_M: f64 = 2.0;
const NUM_POINTS: usize = 360;
const SPEED_MS: f64 = 1.0;
const PERIOD_S: f64 = 0.05;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = zmq::Context::new();

    let socket_options = SocketOptions {
        bind: true,
        block_on_first_connect: false,
        ..Default::default()
    };

    let socket = MonitoredSocket::new(&ctx, zmq::PUB, socket_options, "tcp://*:5100")?;

    println!("Sensor bus open on port 5100");

    let centerline = Centerline {
        points: (0..NUM_POINTS)
            .map(|i| {
                let theta = 2.0 * std::f64::consts::PI * i as f64 / NUM_POINTS as f64;
                Point {
                    x: RADIUS_M * theta.cos(),
                    y: RADIUS_M * theta.sin(),
                }
            })
            .collect(),
    };
    let centerline_json = serde_json::to_string(&centerline)?;

    let mut cycle: u64 = 0;

    loop {
        // Position on the circle, driving anticlockwise
        let theta = SPEED_MS / RADIUS_M * PERIOD_S * cycle as f64;
        let heading = theta + std::f64::consts::FRAC_PI_2;

        let pose = PoseOdom {
            position: Point {
                x: RADIUS_M * theta.cos(),
                y: RADIUS_M * theta.sin(),
            },
            orientation: Quaternion {
                x: 0.0,
                y: 0.0,
                z: (heading / 2.0).sin(),
                w: (heading / 2.0).cos(),
            },
        };

        // The centerline changes rarely, resend it once a second
        if cycle % 20 == 0 {
            socket.send_topic(Topic::Centerline, &centerline_json)?;
        }
        socket.send_topic(Topic::Pose, &serde_json::to_string(&pose)?)?;
        socket.send_topic(
            Topic::Speed,
            &serde_json::to_string(&SpeedOdom { linear_x: SPEED_MS })?,
        )?;

        // Go once things have settled
        if cycle == 40 {
            println!("Sending GO");
            socket.send_topic(
                Topic::GoSignal,
                &serde_json::to_string(&GoSignalMsg { data: GO_SIGNAL_GO })?,
            )?;
        }

        cycle += 1;
        std::thread::sleep(std::time::Duration::from_secs_f64(PERIOD_S));
    }
}
