//! Implementations for the MpcCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use super::{
    actuation::{ActuationMapper, ActuatorCommand, GoInterlock},
    aggregator::StateAggregator,
    diag::{DiagSink, TickDiagnostics},
    fit::{poly_fit, TrackingErrors},
    latency,
    locator::{find_closest, lookback_start},
    optimizer::{state_vector, Optimizer, OptimizerOutput},
    params::{Params, ParamsError},
    ref_speed::RefSpeedShaper,
    resample::{resample, ResampleParams},
    MpcCtrlError,
};
use comms_if::msg::{GoSignal, Inbound};
use util::{
    archive::{ArchiveError, Archiver},
    maths::yaw_from_quaternion,
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// MPC control module state
pub struct MpcCtrl {
    pub(crate) params: Params,

    optimizer: Box<dyn Optimizer>,
    diag: Box<dyn DiagSink>,

    mapper: ActuationMapper,
    ref_speed: RefSpeedShaper,

    /// Steering angle applied by the last published command, used by the
    /// latency compensation.
    ///
    /// Units: radians
    last_steer_rad: f64,

    pub(crate) report: StatusReport,
    arch_report: Option<Archiver>,
}

/// Input data to MPC control.
///
/// Written only by `handle_inbound` between ticks.
#[derive(Debug, Clone, Default)]
pub struct InputData {
    pub sensors: StateAggregator,
    pub interlock: GoInterlock,
}

/// Output of one control tick.
#[derive(Debug, Clone)]
pub struct OutputData {
    /// The command to publish
    pub command: ActuatorCommand,

    /// The raw optimizer result
    pub optimizer: OptimizerOutput,
}

/// Status report for MpcCtrl processing, archived once per tick.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    pub closest_idx: usize,
    pub proj_x_m: f64,
    pub proj_y_m: f64,
    pub proj_heading_rad: f64,
    pub valid_fraction: f64,
    pub degenerate_at: Option<usize>,
    pub ref_v_ms: f64,
    pub cte_m: f64,
    pub epsi_rad: f64,
    pub opt_steer_rad: f64,
    pub opt_speed_ms: f64,
    pub steering: f64,
    pub motor_rpm: f64,
    pub steer_clamped: bool,
    pub gated: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MpcCtrl {
    /// Create a new controller with the given optimizer and diagnostics
    /// sink.
    pub fn new(
        params: Params,
        optimizer: Box<dyn Optimizer>,
        diag: Box<dyn DiagSink>,
    ) -> Result<Self, ParamsError> {
        params.validate()?;

        Ok(Self {
            mapper: ActuationMapper::new(&params.tuning),
            ref_speed: RefSpeedShaper::new(params.ref_v_ms, params.ref_v_alpha),
            last_steer_rad: 0.0,
            params,
            optimizer,
            diag,
            report: StatusReport::default(),
            arch_report: None,
        })
    }

    /// The command to publish when the controller cannot act.
    pub fn neutral(&self) -> ActuatorCommand {
        self.mapper.neutral()
    }

    /// Command to publish on a tick that produced no output.
    ///
    /// While the interlock is inactive this is always the neutral command, so a failing tick
    /// cannot leave the last go command on the actuators. Otherwise nothing is published.
    pub fn fallback_command(&mut self, interlock: &GoInterlock) -> Option<ActuatorCommand> {
        if interlock.is_go() {
            None
        } else {
            let command = self.mapper.neutral();
            self.last_steer_rad = self.mapper.applied_steer_rad(&command);
            Some(command)
        }
    }

    pub fn last_steer_rad(&self) -> f64 {
        self.last_steer_rad
    }

    pub fn ref_v_ms(&self) -> f64 {
        self.ref_speed.value()
    }
}

impl State for MpcCtrl {
    type InitData = &'static str;
    type InitError = ArchiveError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = MpcCtrlError;

    /// Initialise the MpcCtrl module.
    ///
    /// Expected init data is the archive directory name within the session.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        let path = std::path::Path::new(init_data).join("status_report.csv");
        self.arch_report = Some(Archiver::from_path(session, path)?);

        Ok(())
    }

    /// Run one control tick.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        self.report = StatusReport::default();

        let snapshot = input_data
            .sensors
            .snapshot()
            .ok_or_else(|| MpcCtrlError::InputsNotReady(input_data.sensors.missing()))?;
        let tuning = &self.params.tuning;

        // Geometry is computed from where the vehicle will be when the
        // command lands
        let frame = latency::compensate(
            &snapshot.state,
            self.last_steer_rad,
            self.params.latency_s,
            tuning.wheelbase_proxy_m,
        );

        let closest =
            find_closest(snapshot.path, &frame.origin_m).ok_or(MpcCtrlError::NoClosestPoint)?;

        let resampled = resample(
            snapshot.path,
            lookback_start(closest, tuning.lookback_offset),
            &frame,
            &ResampleParams {
                count: self.params.num_steps_poly,
                stride: tuning.resample_stride,
                degree: self.params.poly_degree,
                min_x_delta_m: tuning.min_x_delta_m,
            },
        );

        self.report.closest_idx = closest;
        self.report.proj_x_m = frame.origin_m.x;
        self.report.proj_y_m = frame.origin_m.y;
        self.report.proj_heading_rad = frame.heading_rad;
        self.report.valid_fraction = resampled.valid_fraction;
        self.report.degenerate_at = resampled.degenerate_at;

        let ref_v_ms = self.ref_speed.update(resampled.valid_fraction);
        self.report.ref_v_ms = ref_v_ms;

        let coeffs = poly_fit(&resampled.points, self.params.poly_degree)?;
        let errors = TrackingErrors::from_coeffs(&coeffs);

        trace!("Coeffs: {:?}", coeffs.as_slice());
        debug!(
            "cte: {:.4} m, epsi: {:.4} rad, psi: {:.4} rad",
            errors.cte_m, errors.epsi_rad, frame.heading_rad
        );

        self.report.cte_m = errors.cte_m;
        self.report.epsi_rad = errors.epsi_rad;

        let raw = self
            .optimizer
            .solve(&state_vector(&errors), &coeffs, ref_v_ms)?;
        let output = OptimizerOutput::from_raw(&raw)?;

        debug!(
            "Optimizer steer: {:.4} rad, speed: {:.3} m/s",
            output.steer_rad, output.speed_ms
        );

        let mapped = self.mapper.map(&output, &input_data.interlock);
        self.last_steer_rad = self.mapper.applied_steer_rad(&mapped.command);

        debug!(
            "Motor: {:.1}, GO: {}, current speed: {:.3} m/s",
            mapped.command.motor_rpm,
            input_data.interlock.is_go(),
            snapshot.state.speed_ms
        );

        self.report.opt_steer_rad = output.steer_rad;
        self.report.opt_speed_ms = output.speed_ms;
        self.report.steering = mapped.command.steering;
        self.report.motor_rpm = mapped.command.motor_rpm;
        self.report.steer_clamped = mapped.steer_clamped;
        self.report.gated = mapped.gated;

        if self.diag.enabled() {
            self.diag.emit(&TickDiagnostics {
                frame: &frame,
                fit_points: &resampled.points,
                coeffs: &coeffs,
                trajectory: &output.trajectory,
            });
        }

        if let Some(ref mut arch) = self.arch_report {
            if let Err(e) = arch.serialise(&self.report) {
                warn!("Could not archive the MpcCtrl status report: {}", e);
            }
        }

        Ok((
            OutputData {
                command: mapped.command,
                optimizer: output,
            },
            self.report,
        ))
    }
}

impl InputData {
    /// Ingest one inbound message.
    pub fn handle_inbound(&mut self, msg: Inbound) {
        match msg {
            Inbound::Centerline(c) => self
                .sensors
                .ingest_path(c.points.iter().map(|p| Vector2::new(p.x, p.y)).collect()),
            Inbound::Speed(s) => self.sensors.ingest_speed(s.linear_x),
            Inbound::Pose(p) => {
                let q = p.orientation;
                self.sensors
                    .ingest_position(Vector2::new(p.position.x, p.position.y));
                self.sensors
                    .ingest_heading(yaw_from_quaternion(q.x, q.y, q.z, q.w));
            }
            Inbound::GoSignal(g) => self.interlock.apply_signal(GoSignal::from_raw(g.data)),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
