//! Vehicle-relative coordinate frame
//!
//! The vehicle frame has its origin at the (projected) vehicle position with
//! +X along the vehicle heading.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A 2D pose defining the vehicle frame in the world frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VehicleFrame {
    /// Position of the frame origin in the world frame
    pub origin_m: Vector2<f64>,

    /// Angle of the frame's X axis to the world X axis
    pub heading_rad: f64,

    #[serde(skip)]
    sin: f64,

    #[serde(skip)]
    cos: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VehicleFrame {
    pub fn new(origin_m: Vector2<f64>, heading_rad: f64) -> Self {
        let (sin, cos) = heading_rad.sin_cos();

        Self {
            origin_m,
            heading_rad,
            sin,
            cos,
        }
    }

    /// Transform a world frame point into the vehicle frame.
    pub fn to_vehicle(&self, point_m: &Vector2<f64>) -> Vector2<f64> {
        let dx = point_m.x - self.origin_m.x;
        let dy = point_m.y - self.origin_m.y;

        Vector2::new(
            dx * self.cos + dy * self.sin,
            -dx * self.sin + dy * self.cos,
        )
    }

    /// Transform a vehicle frame point into the world frame.
    pub fn to_world(&self, point_m: &Vector2<f64>) -> Vector2<f64> {
        Vector2::new(
            point_m.x * self.cos - point_m.y * self.sin + self.origin_m.x,
            point_m.x * self.sin + point_m.y * self.cos + self.origin_m.y,
        )
    }
}
