//! # Bus Client
//!
//! Subscribes to the controller's inbound topics and publishes actuator
//! commands and, in debug mode, diagnostics.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use nalgebra::Vector2;
use serde::Serialize;

use comms_if::{
    msg::{Float64, Inbound, LineStrip, MsgParseError, Point, Topic, WORLD_FRAME_ID},
    net::{split_frame, zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
};

use crate::mpc_ctrl::{
    diag::{poly_curve_sample, world_points},
    ActuatorCommand, DiagSink, TickDiagnostics,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Predicted trajectory colour
const NEXT_POS_COLOR: [f32; 4] = [0.0, 0.0, 1.0, 0.5];

/// Resampled fit points colour
const CLOSEST_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.5];

/// Polynomial curve colour
const POLY_COLOR: [f32; 4] = [0.7, 0.2, 0.1, 0.5];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Sensor subscriber and actuator publisher
pub struct BusClient {
    sub: MonitoredSocket,
    publ: MonitoredSocket,
}

/// Publishes tick diagnostics as world frame line strips.
pub struct BusDiagSink {
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum BusClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not subscribe to {0:?}: {1}")]
    SubscribeError(Topic, zmq::Error),

    #[error("Could not send on {0:?}: {1}")]
    SendError(Topic, zmq::Error),

    #[error("Could not recieve a message from the bus: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the {0:?} message: {1}")]
    SerializationError(Topic, serde_json::Error),

    #[error("The bus sent a message which was not valid UTF-8")]
    NonUtf8Message,

    #[error("Recieved a message with no topic")]
    MissingTopic,

    #[error("Could not parse the message: {0}")]
    ParseError(MsgParseError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BusClient {
    /// Create a new instance of the bus client.
    ///
    /// This function will not block until the sensor bus connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, BusClientError> {
        let sub_options = SocketOptions {
            connect_timeout: 1000,
            linger: 0,
            recv_timeout: 0,
            ..Default::default()
        };

        let sub = MonitoredSocket::new(ctx, zmq::SUB, sub_options, &params.sub_endpoint)
            .map_err(BusClientError::SocketError)?;

        for &topic in Topic::INBOUND.iter() {
            sub.subscribe_topic(topic)
                .map_err(|e| BusClientError::SubscribeError(topic, e))?;
        }

        let publ = MonitoredSocket::new(ctx, zmq::PUB, pub_options(), &params.pub_endpoint)
            .map_err(BusClientError::SocketError)?;

        Ok(Self { sub, publ })
    }

    /// Check if the sensor bus is connected
    pub fn is_connected(&self) -> bool {
        self.sub.connected()
    }

    /// Recieve a single pending inbound message.
    ///
    /// Never blocks. Call in a loop until `Ok(None)` is returned to drain all pending messages.
    pub fn recv_inbound(&self) -> Result<Option<Inbound>, BusClientError> {
        let frame = match self.sub.recv_string(zmq::DONTWAIT) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => return Err(BusClientError::NonUtf8Message),
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(e) => return Err(BusClientError::RecvError(e)),
        };

        let (topic, payload) = split_frame(&frame).ok_or(BusClientError::MissingTopic)?;

        Inbound::parse(topic, payload)
            .map(Some)
            .map_err(BusClientError::ParseError)
    }

    /// Publish an actuator command, steering first.
    pub fn send_actuators(&self, cmd: &ActuatorCommand) -> Result<(), BusClientError> {
        send(&self.publ, Topic::Steering, &Float64 { data: cmd.steering })?;
        send(&self.publ, Topic::MotorSpeed, &Float64 { data: cmd.motor_rpm })
    }
}

impl BusDiagSink {
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, BusClientError> {
        let socket = MonitoredSocket::new(ctx, zmq::PUB, pub_options(), &params.diag_endpoint)
            .map_err(BusClientError::SocketError)?;

        Ok(Self { socket })
    }

    fn send_strip(&self, topic: Topic, color: [f32; 4], points: &[Vector2<f64>]) {
        let strip = LineStrip {
            frame_id: WORLD_FRAME_ID.into(),
            color,
            points: points.iter().map(|p| Point { x: p.x, y: p.y }).collect(),
        };

        if let Err(e) = send(&self.socket, topic, &strip) {
            warn!("Could not publish diagnostics: {}", e);
        }
    }
}

impl DiagSink for BusDiagSink {
    fn emit(&mut self, diag: &TickDiagnostics) {
        self.send_strip(
            Topic::DiagNextPos,
            NEXT_POS_COLOR,
            &world_points(diag.frame, diag.trajectory),
        );
        self.send_strip(
            Topic::DiagClosest,
            CLOSEST_COLOR,
            &world_points(diag.frame, diag.fit_points),
        );
        self.send_strip(
            Topic::DiagPoly,
            POLY_COLOR,
            &world_points(diag.frame, &poly_curve_sample(diag.coeffs)),
        );
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn pub_options() -> SocketOptions {
    SocketOptions {
        bind: true,
        linger: 0,
        send_timeout: 10,
        ..Default::default()
    }
}

fn send<T: Serialize>(socket: &MonitoredSocket, topic: Topic, msg: &T) -> Result<(), BusClientError> {
    let payload =
        serde_json::to_string(msg).map_err(|e| BusClientError::SerializationError(topic, e))?;

    socket
        .send_topic(topic, &payload)
        .map_err(|e| BusClientError::SendError(topic, e))
}
