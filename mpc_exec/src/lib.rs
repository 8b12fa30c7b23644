//! # MPC library.
//!
//! This library allows other crates in the workspace to access items defined inside the MPC
//! executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Bus client - recieves sensor data and publishes actuator commands
pub mod bus_client;

/// Global data store
pub mod data_store;

/// MPC control module - tracks the reference path
pub mod mpc_ctrl;

/// Startup arguments of the executable
pub mod params;
