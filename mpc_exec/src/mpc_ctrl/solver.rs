//! # Rollout optimizer
//!
//! Default [`Optimizer`] used by the exec. Every (steering, speed) pair from
//! a fixed grid is held constant over the horizon and rolled out with a
//! kinematic bicycle model. The pair with the lowest weighted cost wins, so
//! solve time depends only on the grid size and the horizon length.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{DVector, Vector2};

// Internal
use super::{
    optimizer::{Optimizer, OptimizerError, StateVector},
    params::{OptimizerWeights, Params},
};
use util::maths::{poly_deriv_val, poly_val};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RolloutOptimizer {
    steps_ahead: usize,
    dt_s: f64,
    wheelbase_proxy_m: f64,
    max_speed_ms: f64,
    weights: OptimizerWeights,

    steer_candidates: Vec<f64>,
    speed_candidates: Vec<f64>,

    /// Command chosen by the previous solve, `(steer_rad, speed_ms)`
    prev_command: Option<(f64, f64)>,
}

/// A scored candidate.
struct Rollout {
    cost: f64,
    steer_rad: f64,
    speed_ms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RolloutOptimizer {
    pub fn new(params: &Params) -> Self {
        let tuning = &params.tuning;

        Self {
            steps_ahead: params.steps_ahead,
            dt_s: params.dt_s,
            wheelbase_proxy_m: tuning.wheelbase_proxy_m,
            max_speed_ms: tuning.max_speed_ms,
            weights: params.weights,
            steer_candidates: linspace(
                -tuning.max_steer_rad,
                tuning.max_steer_rad,
                tuning.num_steer_candidates,
            ),
            speed_candidates: linspace(0.0, tuning.max_speed_ms, tuning.num_speed_candidates),
            prev_command: None,
        }
    }

    /// Roll a constant command out over the horizon, optionally recording
    /// the trajectory, and return its cost.
    fn rollout(
        &self,
        state: &StateVector,
        coeffs: &[f64],
        ref_v_ms: f64,
        steer_rad: f64,
        speed_ms: f64,
        mut traj: Option<&mut Vec<Vector2<f64>>>,
    ) -> f64 {
        let w = &self.weights;

        let mut x = state[0];
        let mut y = state[1];
        let mut psi = state[2];
        let psi_rate = speed_ms * steer_rad / self.wheelbase_proxy_m;

        let mut cost = 0.0;

        for _ in 0..self.steps_ahead {
            x += speed_ms * psi.cos() * self.dt_s;
            y += speed_ms * psi.sin() * self.dt_s;
            psi -= psi_rate * self.dt_s;

            let cte = poly_val(x, coeffs) - y;
            let epsi = psi - poly_deriv_val(x, coeffs).atan();

            cost += w.cte * cte.powi(2)
                + w.epsi * epsi.powi(2)
                + w.speed * (speed_ms - ref_v_ms).powi(2)
                + w.steer * steer_rad.powi(2);

            if let Some(ref mut t) = traj {
                t.push(Vector2::new(x, y));
            }
        }

        if let Some((prev_steer, prev_speed)) = self.prev_command {
            cost += w.consec_steer * (steer_rad - prev_steer).powi(2)
                + w.consec_speed * (speed_ms - prev_speed).powi(2);
        }

        cost
    }
}

impl Optimizer for RolloutOptimizer {
    fn solve(
        &mut self,
        state: &StateVector,
        coeffs: &DVector<f64>,
        ref_v_ms: f64,
    ) -> Result<Vec<f64>, OptimizerError> {
        let coeffs = coeffs.as_slice();

        // The reference speed itself is always a candidate
        let ref_candidate = ref_v_ms.max(0.0).min(self.max_speed_ms);
        let speeds = self
            .speed_candidates
            .iter()
            .copied()
            .chain(std::iter::once(ref_candidate));

        let mut best: Option<Rollout> = None;

        for speed_ms in speeds {
            for &steer_rad in self.steer_candidates.iter() {
                let cost = self.rollout(state, coeffs, ref_v_ms, steer_rad, speed_ms, None);

                if !cost.is_finite() {
                    continue;
                }

                if best.as_ref().map_or(true, |b| cost < b.cost) {
                    best = Some(Rollout {
                        cost,
                        steer_rad,
                        speed_ms,
                    });
                }
            }
        }

        let best = best.ok_or_else(|| {
            OptimizerError::NoSolution("no candidate had a finite cost".into())
        })?;

        let mut traj = Vec::with_capacity(self.steps_ahead);
        self.rollout(
            state,
            coeffs,
            ref_v_ms,
            best.steer_rad,
            best.speed_ms,
            Some(&mut traj),
        );

        self.prev_command = Some((best.steer_rad, best.speed_ms));

        let mut out = Vec::with_capacity(2 + 2 * traj.len());
        out.push(best.steer_rad);
        out.push(best.speed_ms);
        for p in traj {
            out.push(p.x);
            out.push(p.y);
        }

        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// `num` evenly spaced values over `[start, end]`. A single value is placed
/// at the midpoint.
fn linspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![0.5 * (start + end)],
        _ => (0..num)
            .map(|i| start + (end - start) * (i as f64) / ((num - 1) as f64))
            .collect(),
    }
}
