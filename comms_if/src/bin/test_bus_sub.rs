//! Actuator command monitor
//!
//! Prints the commands published by `mpc_exec` on the default `pub_endpoint`.

use comms_if::{
    msg::{Float64, Topic},
    net::{split_frame, MonitoredSocket, SocketOptions},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = zmq::Context::new();

    let socket = MonitoredSocket::new(
        &ctx,
        zmq::SUB,
        SocketOptions::default(),
        "tcp://localhost:5101",
    )?;

    socket.subscribe_topic(Topic::Steering)?;
    socket.subscribe_topic(Topic::MotorSpeed)?;

    loop {
        let frame = match socket.recv_string(0)? {
            Ok(s) => s,
            Err(_) => {
                println!("Got non UTF-8 message");
                continue;
            }
        };

        match split_frame(&frame) {
            Some((topic, payload)) => match serde_json::from_str::<Float64>(payload) {
                Ok(value) => println!("{:>24}: {:.4}", topic, value.data),
                Err(e) => println!("Could not parse {} payload: {}", topic, e),
            },
            None => println!("Got message with no topic: {:?}", frame),
        }
    }
}
