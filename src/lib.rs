//! Gesture recording client for a remote video capture server.
//!
//! The recorder walks an operator through short sessions, each recording a
//! small batch of gestures drawn from a shuffled pool. It talks to the
//! capture server over two UDP sockets:
//!
//! - **Control**: text commands with an exact-match reply and a deadline
//!   ([`control`])
//! - **Preview**: length-prefixed camera frames decoded on a background task
//!   ([`stream`])
//!
//! The draw queue and last batch are saved between runs so every gesture is
//! recorded once per cycle even across restarts ([`scheduler`]).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use gesture_recorder::{GestureRecorder, SessionState};
//!
//! #[tokio::main]
//! async fn main() -> gesture_recorder::Result<()> {
//!     let mut context = GestureRecorder::open("recorder.yaml").await?;
//!     context.refresh_glasses_status().await;
//!     context.prepare_batch()?;
//!
//!     let mut active = context.begin_recording().await?;
//!     active.session.run_countdown().await?;
//!     while !active.session.state().is_terminal() {
//!         if let Some(frame) = active.preview.poll_latest() {
//!             println!("preview frame {} ({} bytes)", frame.sequence, frame.len());
//!         }
//!         active.session.advance().await?;
//!     }
//!
//!     let state = context.end_recording(active).await;
//!     context.shutdown();
//!     assert_eq!(state, SessionState::Completed);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod control;
mod error;
pub mod scheduler;
pub mod session;
pub mod stream;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Core exports
pub use error::*;
pub use types::*;

// Main API exports
pub use config::RecorderConfig;
pub use control::{Command, ControlChannel, ControlOutcome, ControlTransport};
pub use scheduler::{GestureBatchScheduler, SessionBatch};
pub use session::{ActiveRecording, RecordingSession, SessionContext, SessionState};
pub use stream::StreamIngestionPipeline;

/// Entry point that builds a ready [`SessionContext`].
///
/// # Examples
///
/// ```rust,no_run
/// use gesture_recorder::GestureRecorder;
///
/// #[tokio::main]
/// async fn main() -> gesture_recorder::Result<()> {
///     let context = GestureRecorder::with_defaults().await?;
///     println!("{} gestures in the pool", context.scheduler().pool().len());
///     Ok(())
/// }
/// ```
pub struct GestureRecorder;

impl GestureRecorder {
    /// Load configuration from `path` and initialize the session context.
    ///
    /// A missing configuration file falls back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration file exists but is unreadable or invalid
    /// - The capture server address cannot be resolved
    /// - No local control socket can be bound
    pub async fn open<P: AsRef<std::path::Path>>(path: P) -> Result<SessionContext> {
        SessionContext::init(RecorderConfig::load(path)?).await
    }

    /// Initialize with the default configuration.
    pub async fn with_defaults() -> Result<SessionContext> {
        SessionContext::init(RecorderConfig::default()).await
    }
}
