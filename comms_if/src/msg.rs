//! # Bus messages
//!
//! Message shapes carried on the bus, encoded as JSON payloads, and the topics they travel on.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Go-signal value which triggers an emergency stop.
pub const GO_SIGNAL_STOP: u16 = 0;

/// Go-signal value which enables actuation.
pub const GO_SIGNAL_GO: u16 = 2309;

/// Frame ID used for world-frame diagnostics.
pub const WORLD_FRAME_ID: &str = "map";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A point on the XY plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// An orientation quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

/// Reference path, as an ordered list of world frame points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centerline {
    pub points: Vec<Point>,
}

/// Measured forward speed of the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedOdom {
    /// Units: meters/second
    pub linear_x: f64,
}

/// Localised pose of the vehicle in the world frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseOdom {
    pub position: Point,
    pub orientation: Quaternion,
}

/// Raw go-signal message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoSignalMsg {
    pub data: u16,
}

/// A single scalar command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Float64 {
    pub data: f64,
}

/// A line strip visualisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStrip {
    pub frame_id: String,

    /// RGBA, each in [0, 1]
    pub color: [f32; 4],

    pub points: Vec<Point>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Topics on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Centerline,
    Speed,
    Pose,
    GoSignal,
    Steering,
    MotorSpeed,
    DiagNextPos,
    DiagClosest,
    DiagPoly,
}

/// Meaning of a go-signal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoSignal {
    EmergencyStop,
    Go,
    Ignored,
}

/// A decoded message from one of the controller's inbound topics.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Centerline(Centerline),
    Speed(SpeedOdom),
    Pose(PoseOdom),
    GoSignal(GoSignalMsg),
}

#[derive(Debug, thiserror::Error)]
pub enum MsgParseError {
    #[error("Unknown topic \"{0}\"")]
    UnknownTopic(String),

    #[error("Topic {0:?} is not an inbound topic")]
    NotInbound(Topic),

    #[error("Could not deserialize the {0:?} payload: {1}")]
    DeserializeError(Topic, serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Topic {
    /// The topics the controller subscribes to.
    pub const INBOUND: [Topic; 4] = [
        Topic::Centerline,
        Topic::Speed,
        Topic::Pose,
        Topic::GoSignal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Centerline => "centerline",
            Topic::Speed => "odom",
            Topic::Pose => "pf/pose/odom",
            Topic::GoSignal => "signal/go",
            Topic::Steering => "commands/servo/position",
            Topic::MotorSpeed => "commands/motor/speed",
            Topic::DiagNextPos => "mpc/next_pos",
            Topic::DiagClosest => "mpc/closest",
            Topic::DiagPoly => "mpc/poly",
        }
    }

    pub fn from_str(name: &str) -> Option<Self> {
        [
            Topic::Centerline,
            Topic::Speed,
            Topic::Pose,
            Topic::GoSignal,
            Topic::Steering,
            Topic::MotorSpeed,
            Topic::DiagNextPos,
            Topic::DiagClosest,
            Topic::DiagPoly,
        ]
        .iter()
        .copied()
        .find(|t| t.as_str() == name)
    }
}

impl GoSignal {
    pub fn from_raw(value: u16) -> Self {
        match value {
            GO_SIGNAL_STOP => GoSignal::EmergencyStop,
            GO_SIGNAL_GO => GoSignal::Go,
            _ => GoSignal::Ignored,
        }
    }
}

impl Inbound {
    /// Decode a payload received on the named topic.
    pub fn parse(topic_name: &str, payload: &str) -> Result<Self, MsgParseError> {
        let topic = Topic::from_str(topic_name)
            .ok_or_else(|| MsgParseError::UnknownTopic(topic_name.into()))?;

        let de_err = |e| MsgParseError::DeserializeError(topic, e);

        match topic {
            Topic::Centerline => serde_json::from_str(payload)
                .map(Inbound::Centerline)
                .map_err(de_err),
            Topic::Speed => serde_json::from_str(payload)
                .map(Inbound::Speed)
                .map_err(de_err),
            Topic::Pose => serde_json::from_str(payload)
                .map(Inbound::Pose)
                .map_err(de_err),
            Topic::GoSignal => serde_json::from_str(payload)
                .map(Inbound::GoSignal)
                .map_err(de_err),
            t => Err(MsgParseError::NotInbound(t)),
        }
    }

    /// The topic this message was received on.
    pub fn topic(&self) -> Topic {
        match self {
            Inbound::Centerline(_) => Topic::Centerline,
            Inbound::Speed(_) => Topic::Speed,
            Inbound::Pose(_) => Topic::Pose,
            Inbound::GoSignal(_) => Topic::GoSignal,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_topic_names() {
        for t in Topic::INBOUND.iter() {
            assert_eq!(Topic::from_str(t.as_str()), Some(*t));
        }
        assert_eq!(
            Topic::from_str("commands/servo/position"),
            Some(Topic::Steering)
        );
        assert_eq!(Topic::from_str("odometry"), None);
    }

    #[test]
    fn test_go_signal() {
        assert_eq!(GoSignal::from_raw(0), GoSignal::EmergencyStop);
        assert_eq!(GoSignal::from_raw(2309), GoSignal::Go);
        assert_eq!(GoSignal::from_raw(1), GoSignal::Ignored);
        assert_eq!(GoSignal::from_raw(2308), GoSignal::Ignored);
        assert_eq!(GoSignal::from_raw(u16::MAX), GoSignal::Ignored);
    }

    #[test]
    fn test_inbound_parse() {
        let msg = Inbound::parse(
            "centerline",
            r#"{"points": [{"x": 0.0, "y": 1.0}, {"x": 2.5, "y": -1.0}]}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            Inbound::Centerline(Centerline {
                points: vec![Point { x: 0.0, y: 1.0 }, Point { x: 2.5, y: -1.0 }]
            })
        );

        let msg = Inbound::parse("signal/go", r#"{"data": 2309}"#).unwrap();
        assert_eq!(msg, Inbound::GoSignal(GoSignalMsg { data: 2309 }));
        assert_eq!(msg.topic(), Topic::GoSignal);

        let msg = Inbound::parse(
            "pf/pose/odom",
            r#"{"position": {"x": 1.0, "y": 2.0},
                "orientation": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0}}"#,
        )
        .unwrap();
        assert_eq!(msg.topic(), Topic::Pose);
    }

    #[test]
    fn test_inbound_parse_errors() {
        assert!(matches!(
            Inbound::parse("lidar", "{}"),
            Err(MsgParseError::UnknownTopic(_))
        ));
        assert!(matches!(
            Inbound::parse("commands/motor/speed", r#"{"data": 1.0}"#),
            Err(MsgParseError::NotInbound(Topic::MotorSpeed))
        ));
        assert!(matches!(
            Inbound::parse("odom", r#"{"speed": 1.0}"#),
            Err(MsgParseError::DeserializeError(Topic::Speed, _))
        ));
        // Negative values are not representable in the go-signal
        assert!(matches!(
            Inbound::parse("signal/go", r#"{"data": -1}"#),
            Err(MsgParseError::DeserializeError(Topic::GoSignal, _))
        ));
    }
}
