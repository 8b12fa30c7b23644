//! Latency compensation
//!
//! The command computed this tick only takes effect after the actuation
//! latency, so the geometry is computed from a pose extrapolated by one
//! kinematic step of that length.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{frame::VehicleFrame, VehicleState};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Project the vehicle pose by the actuation latency.
///
/// The heading is corrected by subtracting the latency-scaled heading rate
/// (`speed * steer / wheelbase`), then the position is advanced along the
/// corrected heading. Positive steering angles turn the vehicle clockwise.
pub fn compensate(
    state: &VehicleState,
    last_steer_rad: f64,
    latency_s: f64,
    wheelbase_proxy_m: f64,
) -> VehicleFrame {
    let speed_ms = state.speed_ms;
    let heading_rate_rads = speed_ms * last_steer_rad / wheelbase_proxy_m;

    let heading_rad = state.heading_rad - latency_s * heading_rate_rads;

    let mut position_m = state.position_m;
    position_m.x += latency_s * speed_ms * heading_rad.cos();
    position_m.y += latency_s * speed_ms * heading_rad.sin();

    VehicleFrame::new(position_m, heading_rad)
}
