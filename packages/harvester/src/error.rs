//! Typed errors for the harvester library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can match
//! on the terminal path they are handling.

use thiserror::Error;

use crate::driver::DriverError;

/// Errors that can end an extraction session.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Initial results never became visible after the retry ceiling.
    #[error("results did not load after {attempts} attempts: {last_error}")]
    LoadTimeout { attempts: u32, last_error: String },

    /// The session was stopped cooperatively. Not an error to the caller;
    /// the session still finalizes with whatever was accumulated.
    #[error("session cancelled")]
    Cancelled,

    /// The output sink went away (client disconnected).
    #[error("progress sink closed")]
    SinkClosed,

    /// Page driver failure during a cycle.
    #[error("page driver error: {0}")]
    Driver(#[from] DriverError),
}

impl HarvestError {
    /// True for the cooperative-stop outcome, which callers report as a
    /// normal termination rather than a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, HarvestError::Cancelled)
    }
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvestError>;
