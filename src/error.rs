//! Error types for the gesture recorder.
//!
//! All fallible library operations return [`RecorderError`]. Errors carry
//! structured context for logging and expose recovery guidance for the
//! surrounding UI.
//!
//! ## Error Categories
//!
//! - **Scheduling Errors**: draw pool smaller than the requested batch
//! - **Persistence Errors**: queue state could not be written or read
//! - **Parse Errors**: malformed YAML in config or persisted state
//! - **Socket Errors**: binding or connecting a UDP socket failed
//! - **Session Errors**: refused handshakes and invalid state transitions
//!
//! Note that transient network failures on the control channel are *not*
//! errors; they are reported as a [`ControlOutcome`](crate::control::ControlOutcome).
//!
//! ```rust
//! use gesture_recorder::RecorderError;
//!
//! let error = RecorderError::pool_too_small(3, 5);
//! assert!(!error.is_retryable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for recorder operations.
pub type Result<T, E = RecorderError> = std::result::Result<T, E>;

/// Main error type for recorder operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RecorderError {
    #[error("Gesture pool has {pool} entries but a batch needs {batch}")]
    PoolTooSmall { pool: usize, batch: usize },

    #[error("Session batch is empty")]
    EmptyBatch,

    #[error("Queue state persistence failed: {path}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Socket operation failed: {operation}")]
    Socket {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Capture server refused streaming: {reason}")]
    StreamingRefused { reason: String },

    #[error("Recording device {device} is not available")]
    DeviceUnavailable { device: String },

    #[error("Cannot {trigger} while in state {state}")]
    InvalidTransition { state: String, trigger: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },
}

impl RecorderError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            RecorderError::StreamingRefused { .. } => true,
            RecorderError::DeviceUnavailable { .. } => true,
            RecorderError::Socket { .. } => true,
            RecorderError::Timeout { .. } => true,
            RecorderError::Persistence { .. } => true,
            RecorderError::PoolTooSmall { .. } => false,
            RecorderError::EmptyBatch => false,
            RecorderError::Parse { .. } => false,
            RecorderError::InvalidTransition { .. } => false,
            RecorderError::Config { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            RecorderError::PoolTooSmall { .. } => vec![
                "Add more gesture clips to the clip directory",
                "Lower session.batch_size in the configuration",
            ],
            RecorderError::EmptyBatch => {
                vec!["Draw a batch before starting a recording session"]
            }
            RecorderError::Persistence { .. } => vec![
                "Check the queue state path is writable",
                "Ensure sufficient disk space",
            ],
            RecorderError::Parse { .. } => vec![
                "Check the YAML syntax of the file",
                "Delete the queue state file to start a fresh draw cycle",
            ],
            RecorderError::Socket { .. } => vec![
                "Check that no other process is bound to the stream port",
                "Verify the capture server address",
            ],
            RecorderError::StreamingRefused { .. } => vec![
                "Ensure the capture server is running",
                "Check the camera or glasses are connected to the server",
                "Retry starting the recording",
            ],
            RecorderError::DeviceUnavailable { .. } => vec![
                "Refresh the glasses status",
                "Switch the recording device to Camera",
            ],
            RecorderError::InvalidTransition { .. } => {
                vec!["Check the current session state before triggering"]
            }
            RecorderError::Config { .. } => vec![
                "Check the configuration values",
                "Remove the configuration file to use defaults",
            ],
            RecorderError::Timeout { .. } => vec![
                "Increase the response timeout",
                "Verify the capture server is responding",
            ],
        }
    }

    /// Helper constructor for an undersized draw pool.
    pub fn pool_too_small(pool: usize, batch: usize) -> Self {
        RecorderError::PoolTooSmall { pool, batch }
    }

    /// Helper constructor for persistence errors with path context.
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RecorderError::Persistence { path: path.into(), source }
    }

    /// Helper constructor for parse errors.
    pub fn parse(context: impl Into<String>, details: impl std::fmt::Display) -> Self {
        RecorderError::Parse { context: context.into(), details: details.to_string() }
    }

    /// Helper constructor for socket errors.
    pub fn socket(operation: impl Into<String>, source: std::io::Error) -> Self {
        RecorderError::Socket { operation: operation.into(), source }
    }

    /// Helper constructor for invalid state transitions.
    pub fn invalid_transition(state: impl std::fmt::Debug, trigger: impl Into<String>) -> Self {
        RecorderError::InvalidTransition { state: format!("{state:?}"), trigger: trigger.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        RecorderError::Config { reason: reason.into() }
    }
}

impl From<std::io::Error> for RecorderError {
    fn from(err: std::io::Error) -> Self {
        RecorderError::Socket { operation: "<unknown>".to_string(), source: err }
    }
}
