//! Simulation error definitions.
//!
//! This module defines the error surface of the device model. It provides:
//! 1. **Configuration errors:** Rejected presets, inconsistent organization,
//!    or uninitialized timing parameters, raised at construction time.
//! 2. **Simulation errors:** Invalid node states and out-of-range address
//!    vectors, raised while the device is running. These are fatal to the
//!    run; nothing is retried.
//! 3. **I/O errors:** Failures while producing trace output.

use std::fmt;
use std::io;

/// Errors produced by the device model.
///
/// Configuration errors surface from `Device::new` and abort initialization.
/// State and command errors surface from simulation-time calls and terminate
/// the run; the engine never retries or silently recovers.
#[derive(Debug)]
pub enum SimError {
    /// Invalid or inconsistent configuration.
    ///
    /// Raised for unrecognized presets, a density that does not match the
    /// per-level count product, missing timing parameters, or invalid
    /// per-level counts.
    Configuration(String),

    /// A node was observed in a state that the requested operation does not
    /// accept (e.g. a data command's prerequisite queried against a bank
    /// that is neither closed nor opened).
    InvalidState(String),

    /// A command was issued with an address vector whose indices exceed the
    /// configured organization counts.
    InvalidCommand(String),

    /// Trace output could not be written.
    Io(io::Error),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            SimError::InvalidState(msg) => write!(f, "invalid state: {}", msg),
            SimError::InvalidCommand(msg) => write!(f, "invalid command: {}", msg),
            SimError::Io(e) => write!(f, "trace i/o error: {}", e),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SimError {
    fn from(e: io::Error) -> Self {
        SimError::Io(e)
    }
}
