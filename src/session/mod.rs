//! Recording sessions
//!
//! [`SessionContext`] lives for the whole application run. For each session
//! it prepares a batch, performs the streaming handshake and hands out an
//! [`ActiveRecording`]: a [`RecordingSession`] state machine plus the
//! preview [`StreamIngestionPipeline`](crate::stream::StreamIngestionPipeline).
//!
//! ```text
//! Countdown(n) --tick--> Countdown(n-1) --...--> Recording(0)
//! Recording(i) --advance--> AdvancingTo(i+1) --> Recording(i+1)
//! Recording(last) --advance--> Completed
//! Countdown(_) | Recording(0) --back--> BackToMenu
//! any --exit--> Exiting
//! ```

mod context;
mod controller;

pub use context::{ActiveRecording, SessionContext};
pub use controller::{DEFAULT_COUNTDOWN_SECS, RecordingSession, SessionState};
