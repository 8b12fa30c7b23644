//! Main MPC controller executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Validate the startup arguments
//!     - Initialise the session, logging, parameters and network
//!     - Main loop:
//!         - Drain all pending inbound messages into the MpcCtrl inputs
//!         - MpcCtrl processing, if every input has been received
//!         - Actuator command publishing, or neutral on a failed tick while stopped
//!     - On shutdown publish a neutral command
//!
//! Inbound messages are only ever handled between ticks, so a tick always sees a consistent set
//! of inputs.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, error, info, warn};
use std::{
    env, process,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

// Internal
use comms_if::net::{zmq, NetParams};
use mpc_lib::{
    bus_client::{BusClient, BusClientError, BusDiagSink},
    data_store::{DataStore, OVERRUN_ERROR_LIMIT},
    mpc_ctrl::{DiagSink, MpcCtrl, MpcCtrlError, NoopSink, RolloutOptimizer, TuningParams},
    params::{StartupArgs, USAGE},
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.01;

/// Upper limit on the number of inbound messages handled between two ticks.
const MAX_INBOUND_PER_CYCLE: usize = 1000;

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- STARTUP ARGUMENTS ----

    // Checked first, a bad invocation must not open any channels
    let raw_args: Vec<String> = env::args().skip(1).collect();
    let args = match StartupArgs::parse(&raw_args) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}\n{}", e, USAGE);
            process::exit(1);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    {
        let r = running.clone();
        ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))
            .wrap_err("Failed to install the shutdown handler")?;
    }

    // ---- EARLY INITIALISATION ----

    let session = Session::new("mpc_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("MPC Controller Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("Startup arguments: {:?}", args);

    if args.latency_suspicious() {
        warn!(
            "Latency of {} s is greater than 1 s, are you sure it's not in milliseconds?",
            args.latency_s
        );
    }

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;
    let tuning: TuningParams =
        util::params::load("mpc_ctrl.toml").wrap_err("Could not load MpcCtrl params")?;

    let params = args.into_params(tuning);
    params.validate().wrap_err("Invalid MpcCtrl parameters")?;
    session.save("mpc_params.json", params.clone());

    info!("Exec parameters loaded");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = zmq::Context::new();

    let bus_client =
        BusClient::new(&zmq_ctx, &net_params).wrap_err("Failed to initialise the BusClient")?;
    info!("BusClient initialised");

    let diag: Box<dyn DiagSink> = if params.debug {
        let sink = BusDiagSink::new(&zmq_ctx, &net_params)
            .wrap_err("Failed to initialise the diagnostics publisher")?;
        info!("Diagnostics publisher initialised");
        Box::new(sink)
    } else {
        Box::new(NoopSink)
    };

    info!("Network initialisation complete");

    // ---- INITIALISE MODULES ----

    let optimizer = Box::new(RolloutOptimizer::new(&params));

    let mut mpc_ctrl =
        MpcCtrl::new(params, optimizer, diag).wrap_err("Invalid MpcCtrl parameters")?;
    mpc_ctrl
        .init("mpc_ctrl", &session)
        .wrap_err("Failed to initialise MpcCtrl")?;
    info!("MpcCtrl init complete");

    let mut ds = DataStore::default();

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    while running.load(Ordering::SeqCst) {
        let cycle_start_instant = Instant::now();
        ds.cycle_start(cycle_start_instant);

        // ---- DATA INPUT ----

        match ds.record_bus_state(bus_client.is_connected()) {
            Some(true) => info!("Sensor bus connected"),
            Some(false) => warn!("Sensor bus disconnected, inputs will go stale"),
            None => (),
        }

        for _ in 0..MAX_INBOUND_PER_CYCLE {
            match bus_client.recv_inbound() {
                Ok(Some(msg)) => ds.mpc_ctrl_input.handle_inbound(msg),
                Ok(None) => break,
                Err(BusClientError::RecvError(e)) => {
                    warn!("Could not recieve from the bus: {}", e);
                    break;
                }
                Err(e) => warn!("Discarding inbound message: {}", e),
            }
        }

        // ---- CONTROL ----

        match mpc_ctrl.proc(&ds.mpc_ctrl_input) {
            Ok((output, _)) => {
                ds.record_ready(true);

                if let Err(e) = bus_client.send_actuators(&output.command) {
                    warn!("Could not publish the actuator command: {}", e);
                }
            }
            Err(e) => {
                match e {
                    MpcCtrlError::InputsNotReady(missing) => {
                        if ds.record_ready(false) {
                            info!("Waiting for inputs ({})", missing);
                        }
                        debug!("Inputs not ready: {}", missing);
                    }
                    e => {
                        ds.record_ready(true);
                        warn!("MpcCtrl processing error: {}", e);
                    }
                }

                // The interlock still holds the actuators at neutral
                if let Some(cmd) = mpc_ctrl.fallback_command(&ds.mpc_ctrl_input.interlock) {
                    if let Err(e) = bus_client.send_actuators(&cmd) {
                        warn!("Could not publish the neutral command: {}", e);
                    }
                }
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;
        debug!("Time within tick: {:.6} s", cycle_dur.as_secs_f64());

        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.record_overrun(false);
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                if ds.record_overrun(true) {
                    error!(
                        "{} consecutive cycle overruns, the optimizer cannot keep up with the \
                         cycle rate",
                        OVERRUN_ERROR_LIMIT
                    );
                }
            }
        }
    }

    // ---- SHUTDOWN ----

    info!("Shutdown requested, stopping the vehicle");

    if let Err(e) = bus_client.send_actuators(&mpc_ctrl.neutral()) {
        warn!("Could not publish the neutral command: {}", e);
    }

    info!("End of execution");

    session.exit();

    Ok(())
}
