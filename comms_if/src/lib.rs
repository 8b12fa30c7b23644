//! # Communications interface crate.
//!
//! Provides the message bus interfaces shared by the controller and anything
//! feeding it: message shapes, topic names and the network layer.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Message and topic definitions
pub mod msg;

/// Network module
pub mod net;
