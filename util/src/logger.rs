//! # Control loop logging
//!
//! Every record is stamped with the session-relative time so that log lines
//! can be lined up against the archived tick reports, which use the same
//! clock. Records are written both to stdout and to the session log file.
//!
//! Debug and trace records also name the module they came from, since at
//! those levels the per-tick output of several stages is interleaved.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{info, Level};
use std::fmt::Display;
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoggerInitError {
    /// Filters that would hide warnings from the control loop are refused.
    #[error("The minimum log level must be INFO or more verbose, found {0}")]
    LevelTooQuiet(LevelFilter),

    #[error("Could not open the session log file: {0}")]
    LogFile(std::io::Error),

    #[error("A logger has already been installed: {0}")]
    AlreadySet(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Install the controller's logger for this session.
///
/// Can only succeed once per process.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::LevelTooQuiet(min_level));
    }

    let log_file = fern::log_file(&session.log_file_path).map_err(LoggerInitError::LogFile)?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_record(
                    session::get_elapsed_seconds(),
                    colored_tag(record.level()),
                    record.level(),
                    record.target(),
                    message
                )
            ))
        })
        .level(min_level)
        // The bus library's own debug output drowns the tick logs
        .level_for("zmq", LevelFilter::Info)
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::AlreadySet)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Build one log line. `level` decides whether the target is included,
/// `tag` is what is printed for it.
fn format_record(
    elapsed_s: f64,
    tag: impl Display,
    level: Level,
    target: &str,
    message: impl Display,
) -> String {
    if level > Level::Info {
        format!("[{:10.6} {}] {}: {}", elapsed_s, tag, target, message)
    } else {
        format!("[{:10.6} {}] {}", elapsed_s, tag, message)
    }
}

/// Three letter tag for a level.
fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info => "INF",
        Level::Warn => "WRN",
        Level::Error => "ERR",
    }
}

fn colored_tag(level: Level) -> ColoredString {
    let tag = level_tag(level);

    match level {
        Level::Trace => tag.dimmed().italic(),
        Level::Debug => tag.dimmed(),
        Level::Info => tag.normal(),
        Level::Warn => tag.yellow(),
        Level::Error => tag.red().bold(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format_record() {
        assert_eq!(
            format_record(1.5, "WRN", Level::Warn, "mpc_lib::resample", "Degenerate"),
            "[  1.500000 WRN] Degenerate"
        );
        assert_eq!(
            format_record(0.25, "DBG", Level::Debug, "mpc_lib::resample", "step"),
            "[  0.250000 DBG] mpc_lib::resample: step"
        );
    }

    #[test]
    fn test_level_tags() {
        assert_eq!(level_tag(Level::Error), "ERR");
        assert_eq!(level_tag(Level::Warn), "WRN");
        assert_eq!(level_tag(Level::Info), "INF");
        assert_eq!(level_tag(Level::Trace), "TRC");
    }
}
