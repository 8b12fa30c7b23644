//! # Data Store

use log::debug;
use std::time::{Duration, Instant};

use crate::mpc_ctrl;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of consecutive overruns at which the loop reports it cannot keep up.
pub const OVERRUN_ERROR_LIMIT: u64 = 100;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// Start of the previous cycle
    pub last_cycle_start: Option<Instant>,

    /// Number of cycles in a row on which the inputs were not ready
    pub num_not_ready_cycles: u64,

    /// Number of consecutive cycles which took longer than the cycle period
    pub num_consec_cycle_overruns: u64,

    /// Connection state of the sensor bus on the previous cycle
    pub bus_connected: bool,

    // MpcCtrl
    pub mpc_ctrl_input: mpc_ctrl::InputData,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Mark the start of a cycle, returning the time since the previous one.
    pub fn cycle_start(&mut self, now: Instant) -> Option<Duration> {
        let between = self.last_cycle_start.map(|last| now - last);

        if let Some(d) = between {
            debug!("Time between ticks: {:.4} s", d.as_secs_f64());
        }

        self.last_cycle_start = Some(now);
        self.num_cycles += 1;

        between
    }

    /// Record whether the controller ran this cycle. Returns true on the first cycle of a run of
    /// not-ready cycles.
    pub fn record_ready(&mut self, ready: bool) -> bool {
        if ready {
            self.num_not_ready_cycles = 0;
            false
        } else {
            self.num_not_ready_cycles += 1;
            self.num_not_ready_cycles == 1
        }
    }

    /// Record whether this cycle overran. Returns true once per run of overruns, when it reaches
    /// `OVERRUN_ERROR_LIMIT`.
    pub fn record_overrun(&mut self, overran: bool) -> bool {
        if overran {
            self.num_consec_cycle_overruns += 1;
            self.num_consec_cycle_overruns == OVERRUN_ERROR_LIMIT
        } else {
            self.num_consec_cycle_overruns = 0;
            false
        }
    }

    /// Record the bus connection state, returning the new state if it changed.
    pub fn record_bus_state(&mut self, connected: bool) -> Option<bool> {
        if connected == self.bus_connected {
            return None;
        }

        self.bus_connected = connected;
        Some(connected)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cycle_start() {
        let mut ds = DataStore::default();
        let t0 = Instant::now();

        assert_eq!(ds.cycle_start(t0), None);
        assert_eq!(
            ds.cycle_start(t0 + Duration::from_millis(10)),
            Some(Duration::from_millis(10))
        );
        assert_eq!(ds.num_cycles, 2);
    }

    #[test]
    fn test_record_ready() {
        let mut ds = DataStore::default();

        assert!(ds.record_ready(false));
        assert!(!ds.record_ready(false));
        assert!(!ds.record_ready(true));
        assert!(ds.record_ready(false));
    }

    #[test]
    fn test_record_overrun() {
        let mut ds = DataStore::default();

        for _ in 1..OVERRUN_ERROR_LIMIT {
            assert!(!ds.record_overrun(true));
        }
        assert!(ds.record_overrun(true));

        // Reported once per run
        assert!(!ds.record_overrun(true));
        assert_eq!(ds.num_consec_cycle_overruns, OVERRUN_ERROR_LIMIT + 1);

        assert!(!ds.record_overrun(false));
        assert_eq!(ds.num_consec_cycle_overruns, 0);
    }

    #[test]
    fn test_record_bus_state() {
        let mut ds = DataStore::default();

        assert_eq!(ds.record_bus_state(false), None);
        assert_eq!(ds.record_bus_state(true), Some(true));
        assert_eq!(ds.record_bus_state(true), None);
        assert_eq!(ds.record_bus_state(false), Some(false));
    }
}
