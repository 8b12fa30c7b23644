//! # State aggregator
//!
//! Holds the most recent value of each asynchronous input together with a
//! flag recording whether it has ever been received.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use nalgebra::Vector2;
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The latest value of an input, `None` until the first one is received.
///
/// Once set it is only ever replaced, never cleared.
#[derive(Debug, Clone)]
pub struct Latest<T> {
    value: Option<T>,
}

/// Aggregated vehicle state and reference path.
#[derive(Debug, Clone, Default)]
pub struct StateAggregator {
    /// Reference path in the world frame, treated as a closed cycle.
    path: Latest<Vec<Vector2<f64>>>,

    /// Position in the world frame
    ///
    /// Units: meters
    position_m: Latest<Vector2<f64>>,

    /// Forward speed
    ///
    /// Units: meters/second
    speed_ms: Latest<f64>,

    /// Heading, angle to the world +X axis
    ///
    /// Units: radians
    heading_rad: Latest<f64>,
}

/// The vehicle's measured state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VehicleState {
    pub position_m: Vector2<f64>,
    pub heading_rad: f64,
    pub speed_ms: f64,
}

/// A consistent view of all inputs, only available once every input has
/// been received.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub state: VehicleState,
    pub path: &'a [Vector2<f64>],
}

/// Which inputs have not been received yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissingInputs {
    pub path: bool,
    pub position: bool,
    pub speed: bool,
    pub heading: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> Default for Latest<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T> Latest<T> {
    /// Replace the stored value.
    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    /// Get the value if it has been received.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn received(&self) -> bool {
        self.value.is_some()
    }
}

impl StateAggregator {
    /// Replace the reference path wholesale.
    ///
    /// An empty path is discarded, the previous path (if any) is kept.
    pub fn ingest_path(&mut self, points: Vec<Vector2<f64>>) {
        if points.is_empty() {
            warn!("Received an empty centerline, keeping the previous one");
            return;
        }

        self.path.set(points);
    }

    pub fn ingest_position(&mut self, position_m: Vector2<f64>) {
        self.position_m.set(position_m);
    }

    pub fn ingest_speed(&mut self, speed_ms: f64) {
        self.speed_ms.set(speed_ms);
    }

    pub fn ingest_heading(&mut self, heading_rad: f64) {
        self.heading_rad.set(heading_rad);
    }

    /// True once every input has been received at least once.
    pub fn is_ready(&self) -> bool {
        self.missing().none()
    }

    pub fn missing(&self) -> MissingInputs {
        MissingInputs {
            path: !self.path.received(),
            position: !self.position_m.received(),
            speed: !self.speed_ms.received(),
            heading: !self.heading_rad.received(),
        }
    }

    /// Get a view of all inputs, or `None` if any are missing.
    pub fn snapshot(&self) -> Option<Snapshot<'_>> {
        Some(Snapshot {
            state: VehicleState {
                position_m: *self.position_m.get()?,
                heading_rad: *self.heading_rad.get()?,
                speed_ms: *self.speed_ms.get()?,
            },
            path: self.path.get()?.as_slice(),
        })
    }
}

impl MissingInputs {
    pub fn none(&self) -> bool {
        !(self.path || self.position || self.speed || self.heading)
    }
}

impl std::fmt::Display for MissingInputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pts_ok: {}, speed_ok: {}, pos_ok: {}, psi_ok: {}",
            !self.path, !self.speed, !self.position, !self.heading
        )
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_readiness() {
        let mut agg = StateAggregator::default();

        assert!(!agg.is_ready());
        assert!(agg.snapshot().is_none());
        assert_eq!(
            agg.missing(),
            MissingInputs {
                path: true,
                position: true,
                speed: true,
                heading: true
            }
        );

        agg.ingest_speed(1.5);
        agg.ingest_heading(0.25);
        assert_eq!(
            agg.missing(),
            MissingInputs {
                path: true,
                position: true,
                speed: false,
                heading: false
            }
        );

        // An empty path doesn't count
        agg.ingest_path(vec![]);
        assert!(agg.missing().path);

        agg.ingest_path(vec![Vector2::new(1.0, 0.0), Vector2::new(2.0, 0.0)]);
        agg.ingest_position(Vector2::new(0.5, -0.5));
        assert!(agg.is_ready());

        let snap = agg.snapshot().unwrap();
        assert_eq!(snap.state.position_m, Vector2::new(0.5, -0.5));
        assert_eq!(snap.state.heading_rad, 0.25);
        assert_eq!(snap.state.speed_ms, 1.5);
        assert_eq!(snap.path.len(), 2);
    }

    #[test]
    fn test_path_replaced_wholesale() {
        let mut agg = StateAggregator::default();

        agg.ingest_path(vec![Vector2::new(1.0, 0.0); 10]);
        agg.ingest_path(vec![Vector2::new(3.0, 4.0); 3]);
        agg.ingest_path(vec![]);

        assert_eq!(agg.path.get().unwrap(), &vec![Vector2::new(3.0, 4.0); 3]);
    }

    #[test]
    fn test_missing_display() {
        let missing = MissingInputs {
            path: false,
            position: true,
            speed: false,
            heading: true,
        };
        assert_eq!(
            missing.to_string(),
            "pts_ok: true, speed_ok: true, pos_ok: false, psi_ok: false"
        );
    }
}
